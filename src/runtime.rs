// Copyright (c) 2026 kavir_m

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Green,
    Cyan,
    Amber,
    Violet,
    Crimson,
    Gray,
}
