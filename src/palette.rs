// Copyright (c) 2026 kavir_m

use crossterm::style::Color;

use crate::runtime::{ColorMode, Theme};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend toward `other`; t is clamped to [0,1].
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: lerp_u8(self.r, other.r, t),
            g: lerp_u8(self.g, other.g, t),
            b: lerp_u8(self.b, other.b, t),
        }
    }

    /// Composite over a black background at the given alpha.
    pub fn scaled(self, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        Rgb {
            r: (self.r as f32 * a).round() as u8,
            g: (self.g as f32 * a).round() as u8,
            b: (self.b as f32 * a).round() as u8,
        }
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// Colors the renderer draws with. `base`/`hover` are the rain glyph
/// endpoints, `word` the highlighted-word color, `accent` the overlay's
/// name/caret color.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub base: Rgb,
    pub hover: Rgb,
    pub word: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
}

pub fn build_palette(theme: Theme) -> Palette {
    match theme {
        Theme::Green => Palette {
            base: Rgb::new(1, 68, 33),
            hover: Rgb::new(173, 216, 230),
            word: Rgb::new(254, 187, 222),
            accent: Rgb::new(254, 187, 222),
            text: Rgb::new(200, 255, 220),
        },
        Theme::Cyan => Palette {
            base: Rgb::new(0, 55, 70),
            hover: Rgb::new(220, 245, 255),
            word: Rgb::new(130, 230, 255),
            accent: Rgb::new(130, 230, 255),
            text: Rgb::new(200, 240, 250),
        },
        Theme::Amber => Palette {
            base: Rgb::new(80, 50, 0),
            hover: Rgb::new(255, 240, 200),
            word: Rgb::new(255, 200, 90),
            accent: Rgb::new(255, 200, 90),
            text: Rgb::new(255, 230, 180),
        },
        Theme::Violet => Palette {
            base: Rgb::new(48, 16, 70),
            hover: Rgb::new(235, 220, 255),
            word: Rgb::new(200, 150, 255),
            accent: Rgb::new(200, 150, 255),
            text: Rgb::new(225, 205, 250),
        },
        Theme::Crimson => Palette {
            base: Rgb::new(70, 8, 16),
            hover: Rgb::new(255, 220, 220),
            word: Rgb::new(255, 120, 140),
            accent: Rgb::new(255, 120, 140),
            text: Rgb::new(250, 200, 200),
        },
        Theme::Gray => Palette {
            base: Rgb::new(40, 40, 40),
            hover: Rgb::new(240, 240, 240),
            word: Rgb::new(200, 200, 200),
            accent: Rgb::new(220, 220, 220),
            text: Rgb::new(210, 210, 210),
        },
    }
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cr = CUBE_LEVELS[r6 as usize];
    let cg = CUBE_LEVELS[g6 as usize];
    let cb = CUBE_LEVELS[b6 as usize];
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(r, g, b, cr, cg, cb);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = if avg < 8 {
        16
    } else if avg > 238 {
        231
    } else {
        232 + ((avg - 8) / 10)
    };
    let (gr, gg, gb) = if gray_idx == 16 {
        (0, 0, 0)
    } else if gray_idx == 231 {
        (255, 255, 255)
    } else {
        let v = 8 + 10 * (gray_idx - 232);
        (v, v, v)
    };
    let gray_dist = dist2(r, g, b, gr, gg, gb);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

/// Convert an already-composited color to the terminal's capability.
/// Near-black maps to None (background shows through), which keeps the
/// diff renderer from repainting invisible cells.
pub fn to_terminal_color(rgb: Rgb, mode: ColorMode) -> Option<Color> {
    if rgb.r < 2 && rgb.g < 2 && rgb.b < 2 {
        return None;
    }
    match mode {
        ColorMode::Mono => Some(Color::White),
        ColorMode::TrueColor => Some(Color::Rgb {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
        }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(rgb.r, rgb.g, rgb.b))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(255, 255, 255);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 2.0), b);
    }

    #[test]
    fn scaled_clamps_alpha() {
        let c = Rgb::new(100, 100, 100);
        assert_eq!(c.scaled(-1.0), Rgb::new(0, 0, 0));
        assert_eq!(c.scaled(2.0), c);
    }

    #[test]
    fn near_black_maps_to_background() {
        assert_eq!(to_terminal_color(Rgb::new(0, 1, 0), ColorMode::TrueColor), None);
        assert!(to_terminal_color(Rgb::new(0, 68, 33), ColorMode::TrueColor).is_some());
    }

    #[test]
    fn ansi256_hits_cube_corners() {
        assert_eq!(rgb_to_ansi256(255, 0, 0), 196);
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
    }
}
