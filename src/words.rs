// Copyright (c) 2026 kavir_m

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
};

// Words occupy one row; the vertical clearance between two overlapping
// words is one full word height.
pub const WORD_HEIGHT: f32 = 1.0;
pub const COLLISION_BUFFER: f32 = WORD_HEIGHT;

/// One glowing word falling across the rain field. Spawned above the
/// viewport, fades while it falls, removed once invisible or below the
/// bottom edge.
#[derive(Clone, Debug)]
pub struct HighlightWord {
    pub text: String,
    pub column: u16,
    pub y: f32,
    pub opacity: f32,
    pub speed: f32,
    pub active: bool,
    pub width: u16,
}

impl HighlightWord {
    pub fn new(text: &str, column: u16, y: f32, speed: f32) -> Self {
        let width = text.chars().count().max(1) as u16;
        Self {
            text: text.to_string(),
            column,
            y,
            opacity: 1.0,
            speed,
            active: true,
            width,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.column as f32 + self.width as f32 / 2.0,
            self.y - WORD_HEIGHT / 2.0,
        )
    }

    pub fn update(&mut self, dt: f32, height: f32, fade_per_sec: f32) {
        if !self.active {
            return;
        }
        self.y += self.speed * dt;
        self.opacity -= fade_per_sec * dt;
        if self.opacity <= 0.0 || self.y > height + WORD_HEIGHT {
            self.active = false;
        }
    }
}

fn overlaps(col: u16, width: u16, other: &HighlightWord) -> bool {
    let start = col as f32;
    let end = start + width as f32;
    let o_start = other.column as f32;
    let o_end = o_start + other.width as f32;
    start < o_end && end > o_start
}

fn too_close_vertically(y: f32, other: &HighlightWord) -> bool {
    y < other.y + WORD_HEIGHT + COLLISION_BUFFER && y + WORD_HEIGHT + COLLISION_BUFFER > other.y
}

/// Collision-avoiding placement. Picks a random word and a start row in
/// the half screen above the viewport, then tries up to `2 * columns`
/// random columns, rejecting any placement that horizontally overlaps an
/// active word whose rows are within the buffer distance. On exhaustion
/// the spawn is skipped for this tick; the next interval tries again.
pub fn try_spawn(
    texts: &[String],
    existing: &[HighlightWord],
    columns: u16,
    height: f32,
    speed: f32,
    rng: &mut StdRng,
) -> Option<HighlightWord> {
    if texts.is_empty() || columns == 0 {
        return None;
    }

    let chance = Uniform::new(0.0f32, 1.0).expect("valid range");
    let text_idx = Uniform::new(0, texts.len()).expect("valid range");
    let col_dist = Uniform::new(0, columns).expect("valid range");

    let text = &texts[text_idx.sample(rng)];
    let width = text.chars().count().max(1) as u16;
    let start_y = -WORD_HEIGHT - chance.sample(rng) * height * 0.5;

    let max_attempts = columns as usize * 2;
    for _ in 0..max_attempts {
        let col = col_dist.sample(rng);
        let collided = existing.iter().filter(|w| w.active).any(|w| {
            overlaps(col, width, w) && too_close_vertically(start_y, w)
        });
        if !collided {
            return Some(HighlightWord::new(text, col, start_y, speed));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn texts() -> Vec<String> {
        vec!["cipher".into(), "signal".into(), "echo".into()]
    }

    #[test]
    fn opacity_strictly_decreases_until_inactive() {
        let mut w = HighlightWord::new("echo", 4, 0.0, 5.4);
        let mut last = w.opacity;
        for _ in 0..100_000 {
            w.update(0.016, 50.0, 0.03);
            if !w.active {
                break;
            }
            assert!(w.opacity < last);
            last = w.opacity;
        }
        assert!(!w.active);
    }

    #[test]
    fn word_below_bottom_edge_deactivates() {
        let mut w = HighlightWord::new("cipher", 0, 49.5, 10.0);
        w.update(1.0, 50.0, 0.0);
        assert!(!w.active);
    }

    #[test]
    fn spawned_words_never_violate_the_buffer() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut words: Vec<HighlightWord> = Vec::new();
        for _ in 0..40 {
            if let Some(w) = try_spawn(&texts(), &words, 30, 40.0, 5.4, &mut rng) {
                words.push(w);
            }
        }
        for (i, a) in words.iter().enumerate() {
            for b in words.iter().skip(i + 1) {
                if overlaps(a.column, a.width, b) {
                    let (_, ay) = a.center();
                    let (_, by) = b.center();
                    assert!(
                        (ay - by).abs() >= COLLISION_BUFFER,
                        "words {:?} and {:?} overlap within the buffer",
                        (a.column, a.y),
                        (b.column, b.y)
                    );
                }
            }
        }
    }

    #[test]
    fn crowded_field_skips_the_spawn() {
        let mut rng = StdRng::seed_from_u64(5);
        // Blanket every column at every candidate row band.
        let mut existing = Vec::new();
        for col in 0..4 {
            for band in 0..30 {
                let mut w = HighlightWord::new("xxxxxxxxxx", col, -(band as f32), 1.0);
                w.width = 10;
                existing.push(w);
            }
        }
        let spawned = try_spawn(&texts(), &existing, 4, 20.0, 5.4, &mut rng);
        assert!(spawned.is_none());
    }

    #[test]
    fn no_texts_means_no_spawn() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(try_spawn(&[], &[], 10, 20.0, 1.0, &mut rng).is_none());
    }
}
