// Copyright (c) 2026 kavir_m

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::Frame;

/// Raw-mode terminal with mouse capture, writing frames as diffs against
/// what is currently on screen. The background is uniformly black, so
/// cells only carry a foreground.
pub struct Terminal {
    stdout: Stdout,
    last: Option<Frame>,
    run_buf: String,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            out.execute(event::EnableMouseCapture)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(SetBackgroundColor(Color::Black))?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last: None,
            run_buf: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        let full = match &self.last {
            Some(l) => l.width != frame.width || l.height != frame.height,
            None => true,
        };
        // ResetColor at the end of the previous draw dropped the
        // background; re-assert it before painting anything.
        self.stdout.queue(SetBackgroundColor(Color::Black))?;
        if full {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last = Some(Frame::new(frame.width, frame.height));
        }

        let last = self.last.as_mut().expect("set above");
        let width = frame.width as usize;
        let mut cur_fg: Option<Color> = None;
        let mut cur_bold = false;
        let mut cur_pos: Option<(u16, u16)> = None;

        for y in 0..frame.height {
            let mut x: usize = 0;
            while x < width {
                let idx = y as usize * width + x;
                let cell = frame.cell_at_index(idx);
                if !full && last.cell_at_index(idx) == cell {
                    x += 1;
                    continue;
                }

                // Extend the run while attributes match and cells differ
                // (or a full redraw is in progress).
                self.run_buf.clear();
                self.run_buf.push(cell.ch);
                last.set(x as u16, y, cell);
                let run_start = x as u16;
                let mut run_len: u16 = 1;
                let mut j = x + 1;
                while j < width {
                    let nidx = y as usize * width + j;
                    let next = frame.cell_at_index(nidx);
                    if !full && last.cell_at_index(nidx) == next {
                        break;
                    }
                    if next.fg != cell.fg || next.bold != cell.bold {
                        break;
                    }
                    self.run_buf.push(next.ch);
                    last.set(j as u16, y, next);
                    run_len = run_len.saturating_add(1);
                    j += 1;
                }

                if cur_pos != Some((run_start, y)) {
                    self.stdout.queue(cursor::MoveTo(run_start, y))?;
                }
                if cell.fg != cur_fg {
                    match cell.fg {
                        Some(fg) => self.stdout.queue(SetForegroundColor(fg))?,
                        None => self.stdout.queue(SetForegroundColor(Color::Reset))?,
                    };
                    cur_fg = cell.fg;
                }
                if cell.bold != cur_bold {
                    self.stdout.queue(SetAttribute(if cell.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    }))?;
                    cur_bold = cell.bold;
                }
                self.stdout.queue(Print(self.run_buf.as_str()))?;

                let next_x = run_start.saturating_add(run_len);
                cur_pos = if next_x < frame.width {
                    Some((next_x, y))
                } else {
                    None
                };
                x = j;
            }
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
