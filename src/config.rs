// Copyright (c) 2026 kavir_m

use std::io::IsTerminal;
use std::str::FromStr;

use clap::Parser;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  glyphfall --fps 60 --color green --charset profile --speed 1.5,12 --trail 0.65 --fade-start 0.65 --extra-fade-pct 40 --extra-fade-factor 0.5 --hover-radius 6.9 --word-interval 6 --word-speed 5.4 --word-fade 0.03 --glow-radius 6 --proximity-strength 0.8 --reveal-ms 69 --scramble-ms 25 --initial-delay-ms 200 --loop-secs 0";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("      Example:") {
            out.push_str("      \x1b[32mExample:\x1b[0m");
            out.push_str(rest);
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("  glyphfall") {
            out.push_str("  \x1b[1;34mglyphfall\x1b[0m");
            out.push_str(rest);
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("  -") {
            out.push_str("  \x1b[33m-");
            out.push_str(rest);
            out.push_str("\x1b[0m");
            out.push_str(nl);
            continue;
        }

        out.push_str(line);
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct F32Range {
    pub low: f32,
    pub high: f32,
}

impl FromStr for F32Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(',')
            .ok_or_else(|| "expected: LOW,HIGH".to_string())?;
        let low: f32 = a
            .trim()
            .parse()
            .map_err(|_| "invalid low value".to_string())?;
        let high: f32 = b
            .trim()
            .parse()
            .map_err(|_| "invalid high value".to_string())?;
        if !low.is_finite() || !high.is_finite() || low <= 0.0 || low > high {
            return Err("range must be finite, >0 and low <= high".to_string());
        }
        Ok(Self { low, high })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "glyphfall", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "GENERAL",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "reduced-motion",
        help_heading = "GENERAL",
        help = "Reduced motion: reveal text instantly, no highlighted words"
    )]
    pub reduced_motion: bool,

    #[arg(
        short = 'c',
        long = "color",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-colors)"
    )]
    pub color: String,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,8,24). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "charset",
        default_value = "profile",
        help_heading = "APPEARANCE",
        help = "Rain glyph preset (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        long = "chars",
        help_heading = "APPEARANCE",
        help = "Extra rain characters appended to the preset"
    )]
    pub chars: Option<String>,

    #[arg(
        short = 'S',
        long = "speed",
        default_value = "1.5,12",
        help_heading = "RAIN",
        help = "Fall speed range in rows/sec: LOW,HIGH (min 0.001 max 100)"
    )]
    pub speed: F32Range,

    #[arg(
        long = "trail",
        default_value_t = 0.65,
        help_heading = "RAIN",
        help = "Trail fade per frame (min 0.01 max 1)"
    )]
    pub trail: f32,

    #[arg(
        long = "fade-start",
        default_value_t = 0.65,
        help_heading = "RAIN",
        help = "Screen-height ratio where the vertical fade begins (min 0 max 1)"
    )]
    pub fade_start: f32,

    #[arg(
        long = "extra-fade-pct",
        default_value_t = 40.0,
        help_heading = "RAIN",
        help = "Share of glyphs fading harder, in percent (min 0 max 100)"
    )]
    pub extra_fade_pct: f32,

    #[arg(
        long = "extra-fade-factor",
        default_value_t = 0.5,
        help_heading = "RAIN",
        help = "How much harder those glyphs fade (min 0 max 1)"
    )]
    pub extra_fade_factor: f32,

    #[arg(
        long = "hover-radius",
        default_value_t = 6.9,
        help_heading = "RAIN",
        help = "Mouse hover highlight radius in cells (min 0 max 100)"
    )]
    pub hover_radius: f32,

    #[arg(
        long = "no-words",
        help_heading = "WORDS",
        help = "Disable highlighted falling words"
    )]
    pub no_words: bool,

    #[arg(
        short = 'w',
        long = "words",
        default_value = "cipher,signal,echo",
        help_heading = "WORDS",
        help = "Comma-separated words to highlight"
    )]
    pub words: String,

    #[arg(
        long = "word-interval",
        default_value_t = 6.0,
        help_heading = "WORDS",
        help = "Seconds between spawn attempts (min 0.1 max 3600)"
    )]
    pub word_interval: f32,

    #[arg(
        long = "word-speed",
        default_value_t = 5.4,
        help_heading = "WORDS",
        help = "Word fall speed in rows/sec (min 0.001 max 100)"
    )]
    pub word_speed: f32,

    #[arg(
        long = "word-fade",
        default_value_t = 0.03,
        help_heading = "WORDS",
        help = "Word opacity loss per second (min 0 max 10)"
    )]
    pub word_fade: f32,

    #[arg(
        long = "glow-radius",
        default_value_t = 6.0,
        help_heading = "WORDS",
        help = "Rain-clearing glow radius around words, in cells (min 0 max 100)"
    )]
    pub glow_radius: f32,

    #[arg(
        long = "proximity-strength",
        default_value_t = 0.8,
        help_heading = "WORDS",
        help = "Max rain fade at a word center (min 0 max 1)"
    )]
    pub proximity_strength: f32,

    #[arg(
        long = "no-decoder",
        help_heading = "DECODER",
        help = "Disable the scramble/reveal text animation"
    )]
    pub no_decoder: bool,

    #[arg(
        long = "reveal-ms",
        default_value_t = 69,
        help_heading = "DECODER",
        help = "Per-character reveal time in ms (min 1 max 5000)"
    )]
    pub reveal_ms: u16,

    #[arg(
        long = "scramble-ms",
        default_value_t = 25,
        help_heading = "DECODER",
        help = "Interval between glyph swaps in ms (min 1 max 5000)"
    )]
    pub scramble_ms: u16,

    #[arg(
        long = "initial-delay-ms",
        default_value_t = 200,
        help_heading = "DECODER",
        help = "Base delay before the first element starts, in ms (min 0 max 60000)"
    )]
    pub initial_delay_ms: u16,

    #[arg(
        long = "loop-secs",
        default_value_t = 0.0,
        help_heading = "DECODER",
        help = "Re-run the decode cycle every N seconds (0 disables; max 86400)"
    )]
    pub loop_secs: f32,

    #[arg(
        long = "plain-restore",
        help_heading = "DECODER",
        help = "Restore flattened text instead of styled spans on completion"
    )]
    pub plain_restore: bool,

    #[arg(
        short = 'm',
        long = "title",
        help_heading = "OVERLAY",
        help = "Title line of the profile card"
    )]
    pub title: Option<String>,

    #[arg(
        long = "aka",
        help_heading = "OVERLAY",
        help = "Comma-separated alias names, joined with a blinking separator"
    )]
    pub aka: Option<String>,

    #[arg(
        long = "line",
        help_heading = "OVERLAY",
        help = "Extra card line (repeatable)"
    )]
    pub line: Vec<String>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available charset presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "list-colors",
        help_heading = "HELP",
        help = "List available color themes and exit"
    )]
    pub list_colors: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

pub fn print_list_charsets() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE CHARSET PRESETS:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --charset.\x1b[0m");
    } else {
        println!("AVAILABLE CHARSET PRESETS:");
        println!("NOTE: Use only the VALUE (left side) with --charset.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("auto         Auto-select (ascii when non-UTF locale, otherwise profile)");
    println!("profile      Letters + digits + punctuation (the page alphabet)");
    println!("matrix       Letters + digits + katakana");
    println!("ascii        Letters + digits");
    println!("letters      Letters only");
    println!("digits       Digits only (aliases: dec, decimal)");
    println!("punc         Punctuation only");
    println!("binary       0 and 1 (aliases: bin, 01)");
    println!("hex          0-9 and A-F (alias: hexadecimal)");
    println!("katakana     Katakana");
    println!("symbols      Math/technical symbols");
    println!("minimal      Dots and simple shapes");
    println!("code         Letters + digits + punc + symbols (combo)");
}

pub fn print_list_colors() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE COLOR THEMES:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --color.\x1b[0m");
    } else {
        println!("AVAILABLE COLOR THEMES:");
        println!("NOTE: Use only the VALUE (left side) with --color.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("green        Deep green rain, pink words (the original look)");
    println!("cyan         Cold cyan rain");
    println!("amber        Warm amber rain");
    println!("violet       Violet rain");
    println!("crimson      Dark red rain");
    println!("gray         Monochrome (alias: grey)");
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  glyphfall [OPTIONS]\n\nGENERAL:\n  -f, --fps <number>\n      Target FPS (min 1 max 240).\n      Example: glyphfall --fps 30\n\n  --duration <seconds>\n      Stop after N seconds (min 0.1 max 86400).\n      Example: glyphfall --duration 10\n\n  --reduced-motion\n      Reveal text instantly and skip highlighted words.\n      Example: glyphfall --reduced-motion\n\nAPPEARANCE:\n  -c, --color <name>\n      Set theme (see --list-colors).\n      Example: glyphfall --color cyan\n\n  --colormode <0|8|24>\n      Force color mode; otherwise auto-detected from COLORTERM/TERM.\n      Example: glyphfall --colormode 24\n\n  --charset <name>\n      Rain glyph preset (see --list-charsets).\n      Example: glyphfall --charset katakana\n\n  --chars <string>\n      Extra rain characters appended to the preset.\n      Example: glyphfall --chars \"@#\"\n\nRAIN:\n  -S, --speed <low,high>\n      Fall speed range in rows/sec (min 0.001 max 100).\n      Example: glyphfall --speed 2,8\n\n  --trail <number>\n      Trail fade per frame; higher means shorter trails (min 0.01 max 1).\n      Example: glyphfall --trail 0.4\n\n  --fade-start <ratio>\n      Screen-height ratio where the vertical fade begins (min 0 max 1).\n      Example: glyphfall --fade-start 0.5\n\n  --extra-fade-pct <number>\n      Share of glyphs fading harder, in percent (min 0 max 100).\n\n  --extra-fade-factor <number>\n      How much harder those glyphs fade (min 0 max 1).\n\n  --hover-radius <cells>\n      Mouse hover highlight radius (min 0 max 100).\n      Example: glyphfall --hover-radius 10\n\nWORDS:\n  -w, --words <list>\n      Comma-separated words to highlight.\n      Example: glyphfall --words \"neo,trinity\"\n\n  --no-words\n      Disable highlighted falling words.\n\n  --word-interval <seconds>\n      Seconds between spawn attempts (min 0.1 max 3600).\n\n  --word-speed <number>\n      Word fall speed in rows/sec (min 0.001 max 100).\n\n  --word-fade <number>\n      Word opacity loss per second (min 0 max 10).\n\n  --glow-radius <cells>\n      Rain-clearing glow radius around words (min 0 max 100).\n\n  --proximity-strength <number>\n      Max rain fade at a word center (min 0 max 1).\n\nDECODER:\n  --no-decoder\n      Disable the scramble/reveal text animation.\n\n  --reveal-ms <ms>\n      Per-character reveal time (min 1 max 5000).\n\n  --scramble-ms <ms>\n      Interval between glyph swaps (min 1 max 5000).\n\n  --initial-delay-ms <ms>\n      Base delay before the first element starts (min 0 max 60000).\n\n  --loop-secs <seconds>\n      Re-run the decode cycle every N seconds (0 disables).\n      Example: glyphfall --loop-secs 60\n\n  --plain-restore\n      Restore flattened text instead of styled spans.\n\nOVERLAY:\n  -m, --title <text>\n      Title line of the profile card.\n      Example: glyphfall -m \"kavir\" --aka \"kv,kavir_m\"\n\n  --aka <list>\n      Comma-separated alias names with a blinking separator.\n\n  --line <text>\n      Extra card line; repeat for several lines.\n\nHELP:\n  --check-bitcolor\n      Print detected terminal color capability and exit.\n\n  --help\n      Show short help.\n\n  --help-detail\n      Show this detailed help.\n\n  --list-charsets\n      List available charset presets and exit.\n\n  --list-colors\n      List available color themes and exit.\n\n  -v, --version\n      Print version and exit.\n\n  -i, --info\n      Print version info and exit.\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }

    println!();
    println!("KEYS (while running):");
    println!("  q / Esc   quit");
    println!("  space     re-run the decode cycle");
    println!("  p         pause the rain");
    println!();
    print_list_charsets();
    println!();
    print_list_colors();
}

/// Comma list -> trimmed non-empty entries.
pub fn parse_word_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_range_parses_and_validates() {
        let r: F32Range = "1.5,12".parse().unwrap();
        assert_eq!(r.low, 1.5);
        assert_eq!(r.high, 12.0);
        assert!("12,1.5".parse::<F32Range>().is_err());
        assert!("0,5".parse::<F32Range>().is_err());
        assert!("nope".parse::<F32Range>().is_err());
    }

    #[test]
    fn word_list_trims_and_drops_empties() {
        assert_eq!(
            parse_word_list(" cipher, ,signal ,"),
            vec!["cipher".to_string(), "signal".to_string()]
        );
        assert!(parse_word_list("  ,").is_empty());
    }
}
