// Copyright (c) 2026 kavir_m

mod charset;
mod config;
mod debounce;
mod decoder;
mod frame;
mod overlay;
mod palette;
mod particle;
mod rain;
mod runtime;
mod terminal;
mod words;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseEventKind};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::charset::{build_chars, charset_from_str, parse_user_chars, scramble_chars};
use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, parse_word_list, print_help_detail,
    print_list_charsets, print_list_colors, Args,
};
use crate::debounce::Debounce;
use crate::decoder::{DecoderCfg, Scheduler};
use crate::frame::Frame;
use crate::overlay::Overlay;
use crate::palette::build_palette;
use crate::rain::{RainCfg, RainField};
use crate::runtime::{ColorMode, Theme};
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

const RESIZE_DEBOUNCE: Duration = Duration::from_millis(300);

fn build_info() -> &'static str {
    env!("GLYPHFALL_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_u16_range(name: &str, v: u16, min: u16, max: u16) -> u16 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn default_to_ascii() -> bool {
    let lang = env::var("LANG").unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }

    ColorMode::Color256
}

fn detect_color_mode(args: &Args) -> ColorMode {
    if let Some(m) = args.colormode {
        return match m {
            0 => ColorMode::Mono,
            8 => ColorMode::Color256,
            24 => ColorMode::TrueColor,
            _ => {
                eprintln!("invalid --colormode: {} (allowed: 0,8,24)", m);
                std::process::exit(1);
            }
        };
    }

    detect_color_mode_auto()
}

fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Mono => "mono",
    }
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "green" => Ok(Theme::Green),
        "cyan" => Ok(Theme::Cyan),
        "amber" => Ok(Theme::Amber),
        "violet" | "purple" => Ok(Theme::Violet),
        "crimson" | "red" => Ok(Theme::Crimson),
        "gray" | "grey" => Ok(Theme::Gray),
        _ => Err(format!("invalid color: {} (see --list-colors)", s)),
    }
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_charsets {
        print_list_charsets();
        return Ok(());
    }

    if args.list_colors {
        print_list_colors();
        return Ok(());
    }

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let auto = detect_color_mode_auto();
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() {
                "(unset)"
            } else {
                &colorterm
            }
        );
        println!(
            "  TERM: {}",
            if term.is_empty() { "(unset)" } else { &term }
        );
        println!("  auto_detected: {}", color_mode_label(auto));
        if args.colormode.is_some() {
            println!("  forced: {}", color_mode_label(effective));
        }
        println!("  effective: {}", color_mode_label(effective));
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let def_ascii = default_to_ascii();
    let color_mode = detect_color_mode(&args);

    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let duration_s = args.duration.map(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        if s > 0.0 {
            return require_f64_range("--duration", s, 0.1, 86400.0);
        }
        s
    });

    let theme = match parse_theme(&args.color) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let min_speed = require_f32_range("--speed low", args.speed.low, 0.001, 100.0);
    let max_speed = require_f32_range("--speed high", args.speed.high, 0.001, 100.0);
    let trail = require_f32_range("--trail", args.trail, 0.01, 1.0);
    let fade_start = require_f32_range("--fade-start", args.fade_start, 0.0, 1.0);
    let extra_fade_pct = require_f32_range("--extra-fade-pct", args.extra_fade_pct, 0.0, 100.0);
    let extra_fade_factor =
        require_f32_range("--extra-fade-factor", args.extra_fade_factor, 0.0, 1.0);
    let hover_radius = require_f32_range("--hover-radius", args.hover_radius, 0.0, 100.0);
    let word_interval = require_f32_range("--word-interval", args.word_interval, 0.1, 3600.0);
    let word_speed = require_f32_range("--word-speed", args.word_speed, 0.001, 100.0);
    let word_fade = require_f32_range("--word-fade", args.word_fade, 0.0, 10.0);
    let glow_radius = require_f32_range("--glow-radius", args.glow_radius, 0.0, 100.0);
    let proximity_strength =
        require_f32_range("--proximity-strength", args.proximity_strength, 0.0, 1.0);
    let reveal_ms = require_u16_range("--reveal-ms", args.reveal_ms, 1, 5000);
    let scramble_ms = require_u16_range("--scramble-ms", args.scramble_ms, 1, 5000);
    let initial_delay_ms = require_u16_range("--initial-delay-ms", args.initial_delay_ms, 0, 60000);
    let loop_secs = require_f32_range("--loop-secs", args.loop_secs, 0.0, 86400.0);

    let mut user_chars: Vec<char> = Vec::new();
    if let Some(spec) = &args.chars {
        match parse_user_chars(spec) {
            Ok(list) => user_chars = list,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let charset = match charset_from_str(&args.charset, def_ascii) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let chars = build_chars(charset, &user_chars, def_ascii);

    let rain_cfg = RainCfg {
        min_speed,
        max_speed,
        extra_fade_pct: extra_fade_pct / 100.0,
        extra_fade_factor,
        trail_alpha: trail,
        fade_start_ratio: fade_start,
        hover_radius,
        words_enabled: !args.no_words && !args.reduced_motion,
        word_texts: parse_word_list(&args.words),
        word_interval: Duration::from_secs_f32(word_interval),
        word_speed,
        word_fade,
        glow_radius,
        proximity_strength,
    };

    let decoder_cfg = DecoderCfg {
        enabled: !args.no_decoder,
        reveal: Duration::from_millis(reveal_ms as u64),
        scramble: Duration::from_millis(scramble_ms as u64),
        initial_delay: Duration::from_millis(initial_delay_ms as u64),
        loop_every: if loop_secs > 0.0 {
            Some(Duration::from_secs_f32(loop_secs))
        } else {
            None
        },
        preserve_spans: !args.plain_restore,
        instant: args.reduced_motion,
    };

    let aka_names = args.aka.as_deref().map(parse_word_list).unwrap_or_default();
    let mut overlay = Overlay::new(args.title.as_deref(), &aka_names, &args.line);

    let palette = build_palette(theme);
    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;

    let mut rain = RainField::new(rain_cfg, palette, color_mode, chars);
    rain.resize(w, h);
    let mut frame = Frame::new(w, h);

    let mut scheduler = Scheduler::new(decoder_cfg, scramble_chars());
    scheduler.trigger(&mut overlay, Instant::now());

    let mut resize_debounce = Debounce::new(RESIZE_DEBOUNCE);
    let mut pending_resize: Option<(u16, u16)> = None;

    let start_time = Instant::now();
    let end_time = duration_s.and_then(|s| {
        if s <= 0.0 {
            return None;
        }
        Some(start_time + Duration::from_secs_f64(s))
    });

    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let mut next_frame = Instant::now();
    let mut running = true;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                let ev = Terminal::read_event()?;
                match ev {
                    Event::Resize(nw, nh) => {
                        pending_resize = Some((nw, nh));
                        resize_debounce.trigger(Instant::now());
                    }
                    Event::Mouse(me) => {
                        if matches!(
                            me.kind,
                            MouseEventKind::Moved | MouseEventKind::Drag(_)
                        ) {
                            rain.set_pointer_target(me.column, me.row);
                        }
                    }
                    Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                        KeyCode::Esc | KeyCode::Char('q') => running = false,
                        KeyCode::Char(' ') => {
                            scheduler.trigger(&mut overlay, Instant::now());
                        }
                        KeyCode::Char('p') => rain.toggle_pause(),
                        _ => {}
                    },
                    _ => {}
                }
            }

            if !running {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }

            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        let now = Instant::now();
        if resize_debounce.fire(now) {
            if let Some((nw, nh)) = pending_resize.take() {
                rain.resize(nw, nh);
                frame = Frame::new(nw, nh);
                // The decoder restarts on a settled resize, like on load.
                scheduler.trigger(&mut overlay, now);
            }
        }

        rain.step(&mut frame, now);
        let _restored = scheduler.advance(&mut overlay, now);
        overlay.draw(&mut frame, &palette, color_mode, now);
        term.draw(&frame)?;

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    Ok(())
}
