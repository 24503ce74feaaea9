// Copyright (c) 2026 kavir_m

use std::char;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset(u32);

impl Charset {
    pub const NONE: Charset = Charset(0);
    pub const LETTERS: Charset = Charset(0x1);
    pub const DIGITS: Charset = Charset(0x2);
    pub const PUNCTUATION: Charset = Charset(0x4);
    pub const KATAKANA: Charset = Charset(0x8);
    pub const BINARY: Charset = Charset(0x10);
    pub const HEX: Charset = Charset(0x20);
    pub const SYMBOLS: Charset = Charset(0x40);
    pub const MINIMAL: Charset = Charset(0x80);

    // Letters + digits + punctuation: the profile-page rain alphabet.
    pub const PROFILE: Charset = Charset(0x7);
    pub const ASCII_SAFE: Charset = Charset(0x3);
    pub const MATRIX: Charset = Charset(0xB);

    pub fn contains(self, other: Charset) -> bool {
        (self.0 & other.0) != 0
    }
}

pub fn parse_user_chars(s: &str) -> Result<Vec<char>, String> {
    let out: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    if out.is_empty() {
        return Err("--chars: no usable characters given".to_string());
    }
    Ok(out)
}

pub fn charset_from_str(spec: &str, default_to_ascii: bool) -> Result<Charset, String> {
    let spec = spec.trim().to_ascii_lowercase();
    match spec.as_str() {
        "auto" => Ok(if default_to_ascii {
            Charset::ASCII_SAFE
        } else {
            Charset::PROFILE
        }),
        "profile" => Ok(Charset::PROFILE),
        "matrix" => Ok(Charset::MATRIX),
        "ascii" => Ok(Charset::ASCII_SAFE),
        "letters" => Ok(Charset::LETTERS),
        "digits" | "dec" | "decimal" => Ok(Charset::DIGITS),
        "punc" => Ok(Charset::PUNCTUATION),
        "bin" | "binary" | "01" => Ok(Charset::BINARY),
        "hex" | "hexadecimal" => Ok(Charset::HEX),
        "katakana" => Ok(Charset::KATAKANA),
        "symbols" => Ok(Charset::SYMBOLS),
        "minimal" => Ok(Charset::MINIMAL),
        "code" => Ok(Charset(
            Charset::LETTERS.0 | Charset::DIGITS.0 | Charset::PUNCTUATION.0 | Charset::SYMBOLS.0,
        )),
        _ => Err(format!(
            "unsupported charset: {} (see --list-charsets)",
            spec
        )),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

pub fn build_chars(mut charset: Charset, user_chars: &[char], default_to_ascii: bool) -> Vec<char> {
    if charset == Charset::NONE && user_chars.is_empty() {
        charset = if default_to_ascii {
            Charset::ASCII_SAFE
        } else {
            Charset::PROFILE
        };
    }

    let mut out: Vec<char> = Vec::new();

    if charset.contains(Charset::BINARY) {
        push_range(&mut out, 0x30, 0x31);
    }
    if charset.contains(Charset::HEX) {
        push_range(&mut out, 0x30, 0x39);
        push_range(&mut out, 0x41, 0x46);
    }
    if charset.contains(Charset::LETTERS) {
        push_range(&mut out, 0x41, 0x5A);
        push_range(&mut out, 0x61, 0x7A);
    }
    if charset.contains(Charset::DIGITS) {
        push_range(&mut out, 0x30, 0x39);
    }
    if charset.contains(Charset::PUNCTUATION) {
        out.extend("!@#$%&()_+=[]{}|;:<>?/~".chars());
    }
    if charset.contains(Charset::KATAKANA) {
        push_range(&mut out, 0xFF66, 0xFF9D);
    }
    if charset.contains(Charset::SYMBOLS) {
        out.extend("∞∑∫√π∆Ωµλ≈≠≤≥×÷±∂∇".chars());
    }
    if charset.contains(Charset::MINIMAL) {
        out.extend(".:-=+*·•○●◦".chars());
    }

    out.extend_from_slice(user_chars);

    if out.is_empty() {
        out.push('0');
        out.push('1');
    }

    out
}

/// Alphabet used while a character is still scrambling. Slightly wider
/// than the rain alphabet: quotes and commas read well mid-decode.
pub fn scramble_chars() -> Vec<char> {
    let mut out = build_chars(Charset::PROFILE, &[], false);
    out.extend("',.\"^*-".chars());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_auto_selects_ascii_safe_when_non_utf() {
        let cs = charset_from_str("auto", true).unwrap();
        assert_eq!(cs, Charset::ASCII_SAFE);
    }

    #[test]
    fn build_chars_binary_has_only_0_and_1() {
        let out = build_chars(Charset::BINARY, &[], true);
        assert_eq!(out, vec!['0', '1']);
    }

    #[test]
    fn user_chars_append_to_preset() {
        let out = build_chars(Charset::BINARY, &['x'], true);
        assert_eq!(out, vec!['0', '1', 'x']);
    }

    #[test]
    fn parse_user_chars_strips_whitespace() {
        assert_eq!(parse_user_chars(" ab c ").unwrap(), vec!['a', 'b', 'c']);
        assert!(parse_user_chars("   ").is_err());
    }

    #[test]
    fn scramble_alphabet_never_contains_whitespace() {
        assert!(scramble_chars().iter().all(|c| !c.is_whitespace()));
    }
}
