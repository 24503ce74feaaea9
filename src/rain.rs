// Copyright (c) 2026 kavir_m

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::frame::{Cell, Frame};
use crate::palette::{to_terminal_color, Palette, Rgb};
use crate::particle::{Particle, Spawner};
use crate::runtime::ColorMode;
use crate::words::{self, HighlightWord, WORD_HEIGHT};

// Corners never go fully invisible.
const MIN_RADIAL_BRIGHTNESS: f32 = 0.001;
// Pointer glide per frame; raw mouse events are too jumpy to use directly.
const GLIDE_FACTOR: f32 = 0.2;
// Ghosts dimmer than this clear to background.
const GHOST_FLOOR: f32 = 1.0 / 255.0;
// Large event-loop stalls must not teleport the simulation.
const MAX_SIM_DELTA: Duration = Duration::from_millis(500);
// Terminal cells are roughly twice as tall as wide; horizontal deltas
// are halved so radii stay visually circular.
const ASPECT: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct RainCfg {
    pub min_speed: f32,
    pub max_speed: f32,
    pub extra_fade_pct: f32,
    pub extra_fade_factor: f32,
    pub trail_alpha: f32,
    pub fade_start_ratio: f32,
    pub hover_radius: f32,
    pub words_enabled: bool,
    pub word_texts: Vec<String>,
    pub word_interval: Duration,
    pub word_speed: f32,
    pub word_fade: f32,
    pub glow_radius: f32,
    pub proximity_strength: f32,
}

impl Default for RainCfg {
    fn default() -> Self {
        Self {
            min_speed: 1.5,
            max_speed: 12.0,
            extra_fade_pct: 0.40,
            extra_fade_factor: 0.5,
            trail_alpha: 0.65,
            fade_start_ratio: 0.65,
            hover_radius: 6.9,
            words_enabled: true,
            word_texts: Vec::new(),
            word_interval: Duration::from_secs(6),
            word_speed: 5.4,
            word_fade: 0.03,
            glow_radius: 6.0,
            proximity_strength: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Ghost {
    ch: char,
    color: Rgb,
    alpha: f32,
    bold: bool,
}

const BLANK_GHOST: Ghost = Ghost {
    ch: ' ',
    color: Rgb::new(0, 0, 0),
    alpha: 0.0,
    bold: false,
};

/// Owns the particle field, the active highlight words, the smoothed
/// pointer and the trail buffer. Everything here is private state; the
/// only outputs are cells written into the `Frame` each step.
pub struct RainField {
    cfg: RainCfg,
    palette: Palette,
    color_mode: ColorMode,

    width: u16,
    height: u16,
    half_w: f32,
    half_h: f32,
    max_dist: f32,

    spawner: Spawner,
    particles: Vec<Particle>,
    words: Vec<HighlightWord>,
    next_word_spawn: Instant,

    pointer_target: (f32, f32),
    pointer: (f32, f32),

    trail: Vec<Ghost>,

    pub paused: bool,
    pause_time: Option<Instant>,
    last_step: Option<Instant>,

    rng: StdRng,
}

impl RainField {
    pub fn new(cfg: RainCfg, palette: Palette, color_mode: ColorMode, chars: Vec<char>) -> Self {
        Self::with_rng(cfg, palette, color_mode, chars, StdRng::from_os_rng())
    }

    pub fn with_rng(
        cfg: RainCfg,
        palette: Palette,
        color_mode: ColorMode,
        chars: Vec<char>,
        rng: StdRng,
    ) -> Self {
        let spawner = Spawner::new(chars, cfg.min_speed, cfg.max_speed, cfg.extra_fade_pct);
        let mut field = Self {
            cfg,
            palette,
            color_mode,
            width: 0,
            height: 0,
            half_w: 0.0,
            half_h: 0.0,
            max_dist: 1.0,
            spawner,
            particles: Vec::new(),
            words: Vec::new(),
            next_word_spawn: Instant::now(),
            pointer_target: (0.0, 0.0),
            pointer: (0.0, 0.0),
            trail: Vec::new(),
            paused: false,
            pause_time: None,
            last_step: None,
            rng,
        };
        field.resize(80, 24);
        field
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn active_words(&self) -> usize {
        self.words.len()
    }

    pub fn set_pointer_target(&mut self, col: u16, row: u16) {
        self.pointer_target = (col as f32, row as f32);
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            self.pause_time = Some(Instant::now());
        } else if let Some(pt) = self.pause_time.take() {
            let elapsed = Instant::now().saturating_duration_since(pt);
            if let Some(ls) = self.last_step.as_mut() {
                *ls += elapsed;
            }
            self.next_word_spawn += elapsed;
        }
    }

    /// Regenerate for a new grid size: the whole particle field is
    /// rebuilt (old particles discarded), active words and trail are
    /// dropped, cached half-extents recomputed.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.half_w = self.width as f32 / 2.0;
        self.half_h = self.height as f32 / 2.0;
        let hw = self.half_w * ASPECT;
        self.max_dist = (hw * hw + self.half_h * self.half_h).sqrt().max(0.001);

        let h = self.height as f32;
        self.particles.clear();
        for col in 0..self.width {
            for row in 0..self.height {
                // Stagger starts one full screen above so the stream is
                // already continuous on the first visible frame.
                let initial_y = row as f32 - h;
                let p = self.spawner.spawn(col, initial_y, &mut self.rng);
                self.particles.push(p);
            }
        }

        self.words.clear();
        self.trail.clear();
        self.trail
            .resize(self.width as usize * self.height as usize, BLANK_GHOST);

        self.pointer = (self.half_w, self.half_h);
        self.pointer_target = self.pointer;
        self.next_word_spawn = Instant::now() + self.cfg.word_interval;
    }

    /// Radial + vertical + proximity fades, multiplied. Always in [0,1].
    pub fn composite_alpha(&self, x: f32, y: f32, extra_faded: bool) -> f32 {
        let dx = (x - self.half_w) * ASPECT;
        let dy = y - self.half_h;
        let radial =
            (1.0 - (dx * dx + dy * dy).sqrt() / self.max_dist).max(MIN_RADIAL_BRIGHTNESS);

        let h = self.height as f32;
        let fade_start = h * self.cfg.fade_start_ratio;
        let mut vertical = 1.0;
        if y > fade_start {
            vertical = (1.0 - (y - fade_start) / (h - fade_start).max(0.001)).max(0.0);
        }
        if extra_faded {
            vertical *= 1.0 - self.cfg.extra_fade_factor;
        }

        let proximity = self.proximity_factor(x, y);

        (radial * vertical * proximity).clamp(0.0, 1.0)
    }

    /// Alpha reduction near active highlight words: strongest at a word
    /// center, linear falloff to nothing at the glow radius, overlapping
    /// words take the strongest (minimum) factor.
    fn proximity_factor(&self, x: f32, y: f32) -> f32 {
        let radius = self.cfg.glow_radius;
        let mut factor: f32 = 1.0;
        for word in &self.words {
            if !word.active {
                continue;
            }
            let (wcx, wcy) = word.center();
            let dx = (x - wcx) * ASPECT;
            let dy = y - wcy;
            // Broad phase: skip words whose influence box can't reach.
            if dx.abs() >= radius + word.width as f32 * ASPECT / 2.0
                || dy.abs() >= radius + WORD_HEIGHT
            {
                continue;
            }
            let dist_sq = dx * dx + dy * dy;
            if dist_sq < radius * radius {
                let strength = (1.0 - dist_sq.sqrt() / radius) * self.cfg.proximity_strength;
                factor = factor.min(1.0 - strength);
            }
        }
        factor.max(0.0)
    }

    /// Base color blended toward the highlight color near the smoothed
    /// pointer. Color only; alpha is handled separately.
    pub fn hover_color(&self, x: f32, y: f32) -> Rgb {
        let dx = (x - self.pointer.0) * ASPECT;
        let dy = y - self.pointer.1;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist >= self.cfg.hover_radius {
            return self.palette.base;
        }
        let strength = 1.0 - dist / self.cfg.hover_radius;
        self.palette.base.lerp(self.palette.hover, strength)
    }

    /// One animation tick: decay the trail, draw+advance every particle,
    /// draw+advance words back-to-front (so inactive ones can be removed
    /// mid-iteration), then emit the composed cells into the frame.
    pub fn step(&mut self, frame: &mut Frame, now: Instant) {
        if self.paused {
            return;
        }

        let dt = match self.last_step {
            Some(last) => now
                .saturating_duration_since(last)
                .min(MAX_SIM_DELTA)
                .as_secs_f32(),
            None => 0.0,
        };
        self.last_step = Some(now);

        self.pointer.0 += (self.pointer_target.0 - self.pointer.0) * GLIDE_FACTOR;
        self.pointer.1 += (self.pointer_target.1 - self.pointer.1) * GLIDE_FACTOR;

        let keep = 1.0 - self.cfg.trail_alpha;
        for ghost in &mut self.trail {
            if ghost.alpha <= 0.0 {
                continue;
            }
            ghost.alpha *= keep;
            if ghost.alpha < GHOST_FLOOR {
                *ghost = BLANK_GHOST;
            }
        }

        if self.cfg.words_enabled && now >= self.next_word_spawn {
            if let Some(w) = words::try_spawn(
                &self.cfg.word_texts,
                &self.words,
                self.width,
                self.height as f32,
                self.cfg.word_speed,
                &mut self.rng,
            ) {
                self.words.push(w);
            }
            self.next_word_spawn = now + self.cfg.word_interval;
        }

        let h = self.height as f32;
        for i in 0..self.particles.len() {
            let (col, y, glyph, extra) = {
                let p = &self.particles[i];
                (p.column, p.y, p.glyph, p.extra_faded)
            };
            let x = col as f32;
            let alpha = self.composite_alpha(x, y, extra);
            let color = self.hover_color(x, y);
            self.stamp(col, y, glyph, color, alpha, false);
            self.spawner
                .advance(&mut self.particles[i], dt, h, &mut self.rng);
        }

        for i in (0..self.words.len()).rev() {
            let (row, opacity, col0, chars) = {
                let w = &self.words[i];
                (
                    w.y,
                    w.opacity.clamp(0.0, 1.0),
                    w.column,
                    w.text.chars().collect::<Vec<char>>(),
                )
            };
            for (k, ch) in chars.iter().enumerate() {
                self.stamp(
                    col0.saturating_add(k as u16),
                    row,
                    *ch,
                    self.palette.word,
                    opacity,
                    true,
                );
            }
            let fade = self.cfg.word_fade;
            self.words[i].update(dt, h, fade);
            if !self.words[i].active {
                self.words.remove(i);
            }
        }

        self.emit(frame);
    }

    fn stamp(&mut self, col: u16, y: f32, ch: char, color: Rgb, alpha: f32, bold: bool) {
        if col >= self.width || y < 0.0 {
            return;
        }
        let row = y.floor();
        if row < 0.0 || row >= self.height as f32 {
            return;
        }
        let idx = row as usize * self.width as usize + col as usize;
        self.trail[idx] = Ghost {
            ch,
            color,
            alpha: alpha.clamp(0.0, 1.0),
            bold,
        };
    }

    fn emit(&self, frame: &mut Frame) {
        for y in 0..self.height.min(frame.height) {
            for x in 0..self.width.min(frame.width) {
                let idx = y as usize * self.width as usize + x as usize;
                let ghost = &self.trail[idx];
                let cell = match to_terminal_color(ghost.color.scaled(ghost.alpha), self.color_mode)
                {
                    Some(fg) => Cell {
                        ch: ghost.ch,
                        fg: Some(fg),
                        bold: ghost.bold,
                    },
                    None => Cell::BLANK,
                };
                frame.set(x, y, cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::build_palette;
    use crate::runtime::Theme;

    fn field() -> RainField {
        let cfg = RainCfg {
            word_texts: vec!["echo".into()],
            ..RainCfg::default()
        };
        let mut f = RainField::with_rng(
            cfg,
            build_palette(Theme::Green),
            ColorMode::TrueColor,
            vec!['0', '1'],
            StdRng::seed_from_u64(0x5EED),
        );
        f.resize(40, 20);
        f
    }

    #[test]
    fn resize_regenerates_full_field() {
        let mut f = field();
        assert_eq!(f.particle_count(), 40 * 20);
        f.resize(10, 5);
        assert_eq!(f.particle_count(), 10 * 5);
        assert_eq!(f.active_words(), 0);
    }

    #[test]
    fn composite_alpha_stays_in_bounds_everywhere() {
        let f = field();
        for y in -30..30 {
            for x in 0..40 {
                for extra in [false, true] {
                    let a = f.composite_alpha(x as f32, y as f32, extra);
                    assert!((0.0..=1.0).contains(&a), "alpha {} out of bounds", a);
                }
            }
        }
    }

    #[test]
    fn proximity_to_a_word_reduces_alpha() {
        let mut f = field();
        let far = f.composite_alpha(20.0, 10.0, false);
        f.words.push(HighlightWord::new("echo", 18, 10.5, 0.0));
        let near = f.composite_alpha(20.0, 10.0, false);
        assert!(near < far);
    }

    #[test]
    fn hover_blend_is_base_color_outside_radius() {
        let mut f = field();
        f.pointer = (0.0, 0.0);
        let far = f.hover_color(39.0, 19.0);
        assert_eq!(far, f.palette.base);
        let near = f.hover_color(0.0, 0.0);
        assert_eq!(near, f.palette.hover);
    }

    #[test]
    fn step_emits_only_valid_channel_values() {
        let mut f = field();
        let mut frame = Frame::new(40, 20);
        let t0 = Instant::now();
        for i in 0..20 {
            f.step(&mut frame, t0 + Duration::from_millis(16 * i));
        }
        // Every cell either blank or carrying a real color; u8 channels
        // cannot overflow by construction, so drawing once is the check.
        for y in 0..20 {
            for x in 0..40 {
                let c = frame.get(x, y).unwrap();
                if c.fg.is_none() {
                    assert_eq!(c.ch, ' ');
                }
            }
        }
    }

    #[test]
    fn inactive_words_are_removed_within_one_step() {
        let mut f = field();
        let mut w = HighlightWord::new("echo", 5, 2.0, 0.0);
        w.opacity = 0.0001;
        f.words.push(w);
        let mut frame = Frame::new(40, 20);
        let t0 = Instant::now();
        f.step(&mut frame, t0);
        f.step(&mut frame, t0 + Duration::from_millis(100));
        assert_eq!(f.active_words(), 0);
    }

    #[test]
    fn paused_field_does_not_advance() {
        let mut f = field();
        let mut frame = Frame::new(40, 20);
        let t0 = Instant::now();
        f.step(&mut frame, t0);
        let before: Vec<f32> = f.particles.iter().map(|p| p.y).collect();
        f.toggle_pause();
        f.step(&mut frame, t0 + Duration::from_secs(1));
        let after: Vec<f32> = f.particles.iter().map(|p| p.y).collect();
        assert_eq!(before, after);
    }
}
