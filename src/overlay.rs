// Copyright (c) 2026 kavir_m

use std::time::{Duration, Instant};

use crate::frame::{Cell, Frame};
use crate::palette::{to_terminal_color, Palette};
use crate::runtime::ColorMode;

pub type TargetId = usize;

const CARET_PERIOD: Duration = Duration::from_millis(530);
// Finalizing replaces the line content the caret sits in; restart the
// blink phase shortly after, not instantly.
const CARET_REARM_DELAY: Duration = Duration::from_millis(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    Plain,
    Accent,
    Caret,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub text: String,
    pub kind: SpanKind,
}

impl Span {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: SpanKind::Plain,
        }
    }

    fn accent(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: SpanKind::Accent,
        }
    }

    fn caret() -> Self {
        Self {
            text: "/".to_string(),
            kind: SpanKind::Caret,
        }
    }
}

/// What the decoder sees of one overlay line: a stable id, the optional
/// enclosing target, the current plain text and the styled structure to
/// restore on completion.
#[derive(Clone, Debug)]
pub struct TargetRef {
    pub id: TargetId,
    pub parent: Option<TargetId>,
    pub text: String,
    pub spans: Vec<Span>,
}

#[derive(Clone, Debug)]
struct Line {
    spans: Vec<Span>,
    scrambled: Option<String>,
}

impl Line {
    fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// The centered profile card drawn above the rain: a title, an "aka"
/// name row with blinking separator carets, and free-form extra lines.
/// Supplies the decoder's targets and applies its scrambled display.
pub struct Overlay {
    lines: Vec<Line>,
    caret_epoch: Instant,
}

impl Overlay {
    pub fn new(title: Option<&str>, aka_names: &[String], extra: &[String]) -> Self {
        let mut lines = Vec::new();

        if let Some(t) = title {
            lines.push(Line {
                spans: vec![Span::accent(t)],
                scrambled: None,
            });
        }

        if !aka_names.is_empty() {
            let mut spans = vec![Span::plain("aka ")];
            for (i, name) in aka_names.iter().enumerate() {
                spans.push(Span::accent(name));
                if i + 1 < aka_names.len() {
                    spans.push(Span::caret());
                }
            }
            lines.push(Line {
                spans,
                scrambled: None,
            });
        }

        for text in extra {
            lines.push(Line {
                spans: vec![Span::plain(text)],
                scrambled: None,
            });
        }

        Self {
            lines,
            caret_epoch: Instant::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn targets(&self) -> Vec<TargetRef> {
        self.lines
            .iter()
            .enumerate()
            .map(|(id, line)| TargetRef {
                id,
                parent: None,
                text: line.plain_text(),
                spans: line.spans.clone(),
            })
            .collect()
    }

    /// Current visible text: the scramble override while a decode is in
    /// flight, the styled spans' text otherwise.
    pub fn display_text(&self, id: TargetId) -> Option<String> {
        self.lines
            .get(id)
            .map(|l| l.scrambled.clone().unwrap_or_else(|| l.plain_text()))
    }

    pub fn set_scrambled(&mut self, id: TargetId, text: String) {
        if let Some(line) = self.lines.get_mut(id) {
            line.scrambled = Some(text);
        }
    }

    /// Structure-preserving restore: write the captured spans back
    /// exactly and drop the scramble override.
    pub fn restore(&mut self, id: TargetId, spans: &[Span]) {
        if let Some(line) = self.lines.get_mut(id) {
            line.spans = spans.to_vec();
            line.scrambled = None;
        }
    }

    /// Plain-text restore: collapses the line to one unstyled span.
    pub fn set_plain(&mut self, id: TargetId, text: &str) {
        if let Some(line) = self.lines.get_mut(id) {
            line.spans = vec![Span::plain(text)];
            line.scrambled = None;
        }
    }

    /// Content-replaced signal from the decoder. A line that carries a
    /// caret gets its blink phase re-armed.
    pub fn notify_restored(&mut self, id: TargetId, now: Instant) {
        let has_caret = self
            .lines
            .get(id)
            .is_some_and(|l| l.spans.iter().any(|s| s.kind == SpanKind::Caret));
        if has_caret {
            self.caret_epoch = now + CARET_REARM_DELAY;
        }
    }

    fn caret_visible(&self, now: Instant) -> bool {
        if now < self.caret_epoch {
            return true;
        }
        let phase = now.saturating_duration_since(self.caret_epoch).as_millis()
            / CARET_PERIOD.as_millis().max(1);
        phase % 2 == 0
    }

    pub fn draw(&self, frame: &mut Frame, palette: &Palette, mode: ColorMode, now: Instant) {
        if self.lines.is_empty() {
            return;
        }

        let text_fg = to_terminal_color(palette.text, mode);
        let accent_fg = to_terminal_color(palette.accent, mode);
        let caret_on = self.caret_visible(now);

        let block_h = self.lines.len() as u16;
        let top = frame.height.saturating_sub(block_h) / 2;

        for (i, line) in self.lines.iter().enumerate() {
            let y = top + i as u16;
            if y >= frame.height {
                break;
            }

            match &line.scrambled {
                Some(text) => {
                    let w = text.chars().count() as u16;
                    let mut x = frame.width.saturating_sub(w) / 2;
                    for ch in text.chars() {
                        frame.set(
                            x,
                            y,
                            Cell {
                                ch,
                                fg: text_fg,
                                bold: false,
                            },
                        );
                        x = x.saturating_add(1);
                    }
                }
                None => {
                    let w = line.plain_text().chars().count() as u16;
                    let mut x = frame.width.saturating_sub(w) / 2;
                    for span in &line.spans {
                        let (fg, bold) = match span.kind {
                            SpanKind::Plain => (text_fg, false),
                            SpanKind::Accent => (accent_fg, true),
                            SpanKind::Caret => (accent_fg, true),
                        };
                        for ch in span.text.chars() {
                            let ch = if span.kind == SpanKind::Caret && !caret_on {
                                ' '
                            } else {
                                ch
                            };
                            frame.set(x, y, Cell { ch, fg, bold });
                            x = x.saturating_add(1);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> Overlay {
        Overlay::new(
            Some("kavir"),
            &["kv".to_string(), "kavir_m".to_string()],
            &["terminal gardener".to_string()],
        )
    }

    #[test]
    fn targets_expose_concatenated_text() {
        let o = overlay();
        let t = o.targets();
        assert_eq!(t.len(), 3);
        assert_eq!(t[0].text, "kavir");
        assert_eq!(t[1].text, "aka kv/kavir_m");
        assert_eq!(t[2].text, "terminal gardener");
    }

    #[test]
    fn restore_brings_back_exact_spans() {
        let mut o = overlay();
        let snapshot = o.targets()[1].spans.clone();
        o.set_scrambled(1, "xxxxxxx".into());
        assert_eq!(o.display_text(1).unwrap(), "xxxxxxx");
        o.restore(1, &snapshot);
        assert_eq!(o.display_text(1).unwrap(), "aka kv/kavir_m");
        assert_eq!(o.targets()[1].spans, snapshot);
    }

    #[test]
    fn caret_blinks_with_period() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.caret_epoch = t0;
        assert!(o.caret_visible(t0));
        assert!(!o.caret_visible(t0 + Duration::from_millis(600)));
        assert!(o.caret_visible(t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn restore_notification_rearms_caret_only_for_caret_lines() {
        let mut o = overlay();
        let old_epoch = o.caret_epoch;
        let now = old_epoch + Duration::from_secs(5);
        o.notify_restored(0, now);
        assert_eq!(o.caret_epoch, old_epoch);
        o.notify_restored(1, now);
        assert_eq!(o.caret_epoch, now + CARET_REARM_DELAY);
    }

    #[test]
    fn draw_centers_the_block() {
        let o = Overlay::new(Some("ab"), &[], &[]);
        let mut frame = Frame::new(10, 5);
        o.draw(&mut frame, &crate::palette::build_palette(crate::runtime::Theme::Green), ColorMode::TrueColor, Instant::now());
        assert_eq!(frame.get(4, 2).unwrap().ch, 'a');
        assert_eq!(frame.get(5, 2).unwrap().ch, 'b');
    }
}
