// Copyright (c) 2026 kavir_m

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    SeedableRng,
};

use crate::overlay::{Overlay, TargetId, TargetRef};

#[derive(Clone, Debug)]
pub struct DecoderCfg {
    pub enabled: bool,
    /// Time per character until its true value locks in.
    pub reveal: Duration,
    /// Interval between glyph swaps while a character scrambles.
    pub scramble: Duration,
    /// Base delay before the first element starts; each element adds its
    /// own random stagger on top.
    pub initial_delay: Duration,
    /// Re-run the whole cycle periodically. None disables.
    pub loop_every: Option<Duration>,
    /// Restore styled spans on completion instead of flattened text.
    pub preserve_spans: bool,
    /// Reduced motion: reveal instantly, never scramble.
    pub instant: bool,
}

impl Default for DecoderCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            reveal: Duration::from_millis(69),
            scramble: Duration::from_millis(25),
            initial_delay: Duration::from_millis(200),
            loop_every: None,
            preserve_spans: true,
            instant: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CharState {
    revealed: bool,
    reveal_at: Instant,
    next_scramble: Instant,
}

#[derive(Clone, Debug)]
struct Item {
    captured_text: Vec<char>,
    captured_spans: Vec<crate::overlay::Span>,
    display: Vec<char>,
    chars: Vec<CharState>,
    revealed_count: usize,
    decoding: bool,
}

impl Item {
    fn idle(target: &TargetRef) -> Self {
        Self {
            captured_text: target.text.chars().collect(),
            captured_spans: target.spans.clone(),
            display: target.text.chars().collect(),
            chars: Vec::new(),
            revealed_count: 0,
            decoding: false,
        }
    }
}

fn finalize_item(
    cfg: &DecoderCfg,
    id: TargetId,
    item: &mut Item,
    overlay: &mut Overlay,
    now: Instant,
) {
    item.decoding = false;
    if cfg.preserve_spans {
        overlay.restore(id, &item.captured_spans);
    } else {
        let text: String = item.captured_text.iter().collect();
        overlay.set_plain(id, &text);
    }
    overlay.notify_restored(id, now);
}

/// Central frame-driven scramble/reveal scheduler. One map entry per
/// tracked target; all per-character deadlines live in the entry, so
/// cancelling a cycle is just finalizing the map — there are no timer
/// handles anywhere.
pub struct Scheduler {
    cfg: DecoderCfg,
    alphabet: Vec<char>,
    items: BTreeMap<TargetId, Item>,
    next_loop: Option<Instant>,
    rng: StdRng,
    chance: Uniform<f32>,
    glyph_idx: Uniform<usize>,
}

impl Scheduler {
    pub fn new(cfg: DecoderCfg, alphabet: Vec<char>) -> Self {
        Self::with_rng(cfg, alphabet, StdRng::from_os_rng())
    }

    pub fn with_rng(cfg: DecoderCfg, alphabet: Vec<char>, rng: StdRng) -> Self {
        let alphabet = if alphabet.is_empty() {
            vec!['0', '1']
        } else {
            alphabet
        };
        Self {
            cfg,
            glyph_idx: Uniform::new(0, alphabet.len()).expect("valid range"),
            alphabet,
            items: BTreeMap::new(),
            next_loop: None,
            rng,
            chance: Uniform::new(0.0, 1.0).expect("valid range"),
        }
    }

    pub fn tracked_ids(&self) -> Vec<TargetId> {
        self.items.keys().copied().collect()
    }

    pub fn in_flight(&self) -> usize {
        self.items.values().filter(|i| i.decoding).count()
    }

    /// Rebuild the tracked set from the current targets. A target whose
    /// ancestor is already tracked is skipped (its text animates as part
    /// of the ancestor); entries for vanished targets are evicted, and
    /// captures refresh when content changed underneath us.
    pub fn collect(&mut self, targets: &[TargetRef]) {
        let parent_of: HashMap<TargetId, Option<TargetId>> =
            targets.iter().map(|t| (t.id, t.parent)).collect();

        let mut accepted: BTreeSet<TargetId> = BTreeSet::new();
        for t in targets {
            let mut ancestor = t.parent;
            let mut covered = false;
            while let Some(pid) = ancestor {
                if accepted.contains(&pid) {
                    covered = true;
                    break;
                }
                ancestor = parent_of.get(&pid).copied().flatten();
            }
            if covered {
                continue;
            }
            accepted.insert(t.id);

            match self.items.get_mut(&t.id) {
                Some(item) => {
                    let text: Vec<char> = t.text.chars().collect();
                    if item.captured_text != text || item.captured_spans != t.spans {
                        *item = Item::idle(t);
                    }
                }
                None => {
                    self.items.insert(t.id, Item::idle(t));
                }
            }
        }

        self.items.retain(|id, _| accepted.contains(id));
    }

    /// Start (or restart) a full decode cycle. Any in-flight item is
    /// finalized first so no two schedules ever overlap on one target.
    pub fn trigger(&mut self, overlay: &mut Overlay, now: Instant) {
        if !self.cfg.enabled {
            return;
        }

        for (&id, item) in self.items.iter_mut() {
            if item.decoding {
                finalize_item(&self.cfg, id, item, overlay, now);
            }
        }

        self.collect(&overlay.targets());

        let reveal_s = self.cfg.reveal.as_secs_f32();
        let scramble_s = self.cfg.scramble.as_secs_f32();

        for (&id, item) in self.items.iter_mut() {
            let non_ws = item
                .captured_text
                .iter()
                .filter(|c| !c.is_whitespace())
                .count();

            if non_ws == 0 || self.cfg.instant {
                item.chars.clear();
                item.display = item.captured_text.clone();
                item.revealed_count = item.captured_text.len();
                finalize_item(&self.cfg, id, item, overlay, now);
                continue;
            }

            let stagger = self.chance.sample(&mut self.rng) * 5.0 * reveal_s;
            let base = now + self.cfg.initial_delay + Duration::from_secs_f32(stagger);

            item.chars.clear();
            item.display.clear();
            item.revealed_count = 0;

            let mut ordinal = 0u32;
            for &ch in &item.captured_text {
                let ws = ch.is_whitespace();
                let reveal_at = if ws {
                    base
                } else {
                    ordinal += 1;
                    base + self.cfg.reveal * ordinal
                };
                let jitter = self.chance.sample(&mut self.rng) * scramble_s;
                item.chars.push(CharState {
                    revealed: ws,
                    reveal_at,
                    next_scramble: base + Duration::from_secs_f32(jitter),
                });
                if ws {
                    item.revealed_count += 1;
                    item.display.push(ch);
                } else {
                    item.display
                        .push(self.alphabet[self.glyph_idx.sample(&mut self.rng)]);
                }
            }

            item.decoding = true;
            overlay.set_scrambled(id, item.display.iter().collect());
        }

        self.next_loop = self
            .cfg
            .loop_every
            .map(|l| now + l + self.cfg.initial_delay);
    }

    /// One frame of decode work. Returns the ids restored this tick.
    pub fn advance(&mut self, overlay: &mut Overlay, now: Instant) -> Vec<TargetId> {
        if !self.cfg.enabled {
            return Vec::new();
        }

        if self.next_loop.is_some_and(|nl| now >= nl) {
            self.trigger(overlay, now);
        }

        let mut restored = Vec::new();
        for (&id, item) in self.items.iter_mut() {
            if !item.decoding {
                continue;
            }

            let mut changed = false;
            for i in 0..item.chars.len() {
                if item.chars[i].revealed {
                    continue;
                }
                if now >= item.chars[i].next_scramble {
                    item.display[i] = self.alphabet[self.glyph_idx.sample(&mut self.rng)];
                    item.chars[i].next_scramble = now + self.cfg.scramble;
                    changed = true;
                }
                if now >= item.chars[i].reveal_at {
                    item.display[i] = item.captured_text[i];
                    item.chars[i].revealed = true;
                    item.revealed_count += 1;
                    changed = true;
                }
            }

            if changed {
                overlay.set_scrambled(id, item.display.iter().collect());
            }

            if item.revealed_count == item.captured_text.len() {
                finalize_item(&self.cfg, id, item, overlay, now);
                restored.push(id);
            }
        }

        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{Span, SpanKind};

    fn fast_cfg() -> DecoderCfg {
        DecoderCfg {
            reveal: Duration::from_millis(10),
            scramble: Duration::from_millis(5),
            initial_delay: Duration::from_millis(20),
            ..DecoderCfg::default()
        }
    }

    fn sched(cfg: DecoderCfg) -> Scheduler {
        Scheduler::with_rng(
            cfg,
            vec!['#', '@', '%', 'x'],
            StdRng::seed_from_u64(0xDEC0DE),
        )
    }

    fn card() -> Overlay {
        Overlay::new(
            Some("Hello, World!"),
            &["kv".to_string(), "kavir_m".to_string()],
            &["terminal gardener".to_string()],
        )
    }

    #[test]
    fn full_cycle_restores_exact_content() {
        let mut overlay = card();
        let originals: Vec<String> = overlay.targets().iter().map(|t| t.text.clone()).collect();
        let mut s = sched(fast_cfg());
        let t0 = Instant::now();

        s.trigger(&mut overlay, t0);
        assert_eq!(s.in_flight(), 3);

        let restored = s.advance(&mut overlay, t0 + Duration::from_secs(60));
        assert_eq!(restored.len(), 3);
        assert_eq!(s.in_flight(), 0);
        for (id, orig) in originals.iter().enumerate() {
            assert_eq!(&overlay.display_text(id).unwrap(), orig);
        }
    }

    #[test]
    fn whitespace_is_never_scrambled() {
        let mut overlay = Overlay::new(Some("a b  c"), &[], &[]);
        let mut s = sched(fast_cfg());
        let t0 = Instant::now();
        s.trigger(&mut overlay, t0);

        let ws_positions = [1usize, 3, 4];
        for step in 0..200 {
            s.advance(&mut overlay, t0 + Duration::from_millis(step * 2));
            let display: Vec<char> = overlay.display_text(0).unwrap().chars().collect();
            for &p in &ws_positions {
                assert_eq!(display[p], ' ', "whitespace scrambled at step {}", step);
            }
        }
        assert_eq!(overlay.display_text(0).unwrap(), "a b  c");
    }

    #[test]
    fn revealed_chars_are_never_rescrambled() {
        let mut overlay = Overlay::new(Some("abcdef"), &[], &[]);
        let mut s = sched(fast_cfg());
        let t0 = Instant::now();
        s.trigger(&mut overlay, t0);

        let mut locked: Vec<Option<char>> = vec![None; 6];
        for step in 0..400 {
            let now = t0 + Duration::from_millis(step);
            s.advance(&mut overlay, now);
            if let Some(item) = s.items.get(&0) {
                for (i, cs) in item.chars.iter().enumerate() {
                    if cs.revealed {
                        match locked[i] {
                            None => locked[i] = Some(item.display[i]),
                            Some(ch) => assert_eq!(item.display[i], ch),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn double_trigger_leaves_a_single_schedule_per_target() {
        let mut overlay = card();
        let originals: Vec<String> = overlay.targets().iter().map(|t| t.text.clone()).collect();
        let mut s = sched(fast_cfg());
        let t0 = Instant::now();

        s.trigger(&mut overlay, t0);
        s.trigger(&mut overlay, t0 + Duration::from_millis(1));
        assert_eq!(s.tracked_ids().len(), 3);
        assert_eq!(s.in_flight(), 3);

        s.advance(&mut overlay, t0 + Duration::from_secs(60));
        assert_eq!(s.in_flight(), 0);
        for (id, orig) in originals.iter().enumerate() {
            assert_eq!(&overlay.display_text(id).unwrap(), orig);
        }
    }

    #[test]
    fn whitespace_only_target_finalizes_immediately() {
        let mut overlay = Overlay::new(None, &[], &["   ".to_string()]);
        let mut s = sched(fast_cfg());
        s.trigger(&mut overlay, Instant::now());
        assert_eq!(s.in_flight(), 0);
        assert_eq!(overlay.display_text(0).unwrap(), "   ");
    }

    #[test]
    fn instant_mode_skips_the_scramble() {
        let mut overlay = Overlay::new(Some("plain"), &[], &[]);
        let mut s = sched(DecoderCfg {
            instant: true,
            ..fast_cfg()
        });
        s.trigger(&mut overlay, Instant::now());
        assert_eq!(s.in_flight(), 0);
        assert_eq!(overlay.display_text(0).unwrap(), "plain");
    }

    #[test]
    fn descendants_of_tracked_targets_are_skipped() {
        let span = |t: &str| Span {
            text: t.to_string(),
            kind: SpanKind::Plain,
        };
        let targets = vec![
            TargetRef {
                id: 0,
                parent: None,
                text: "outer".into(),
                spans: vec![span("outer")],
            },
            TargetRef {
                id: 1,
                parent: Some(0),
                text: "inner".into(),
                spans: vec![span("inner")],
            },
            TargetRef {
                id: 2,
                parent: Some(1),
                text: "innermost".into(),
                spans: vec![span("innermost")],
            },
            TargetRef {
                id: 3,
                parent: None,
                text: "sibling".into(),
                spans: vec![span("sibling")],
            },
        ];
        let mut s = sched(fast_cfg());
        s.collect(&targets);
        assert_eq!(s.tracked_ids(), vec![0, 3]);
    }

    #[test]
    fn vanished_targets_are_evicted() {
        let overlay = card();
        let mut s = sched(fast_cfg());
        s.collect(&overlay.targets());
        assert_eq!(s.tracked_ids().len(), 3);
        let keep: Vec<TargetRef> = overlay.targets().into_iter().take(1).collect();
        s.collect(&keep);
        assert_eq!(s.tracked_ids(), vec![0]);
    }

    #[test]
    fn loop_interval_rearms_the_cycle() {
        let mut overlay = card();
        let mut s = sched(DecoderCfg {
            loop_every: Some(Duration::from_secs(10)),
            ..fast_cfg()
        });
        let t0 = Instant::now();
        s.trigger(&mut overlay, t0);
        s.advance(&mut overlay, t0 + Duration::from_secs(5));
        assert_eq!(s.in_flight(), 0);
        // Past the loop deadline the next advance re-triggers everything.
        s.advance(&mut overlay, t0 + Duration::from_secs(11));
        assert_eq!(s.in_flight(), 3);
    }

    #[test]
    fn disabled_scheduler_is_a_no_op() {
        let mut overlay = card();
        let mut s = sched(DecoderCfg {
            enabled: false,
            ..fast_cfg()
        });
        s.trigger(&mut overlay, Instant::now());
        assert_eq!(s.in_flight(), 0);
        assert_eq!(overlay.display_text(0).unwrap(), "Hello, World!");
    }
}
