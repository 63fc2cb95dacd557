//! Terminal output for the game view.
//!
//! [`TerminalRenderer`] owns the terminal while a session runs: raw mode, the
//! alternate screen, and key release and focus reporting. Each frame it only
//! rewrites the cells that differ from the frame it drew last. The first
//! frame, and any frame after a resize or [`TerminalRenderer::invalidate`],
//! is drawn whole.

use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        DisableFocusChange, EnableFocusChange, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal, QueueableCommand,
};

use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};

pub struct TerminalRenderer {
    stdout: io::Stdout,
    /// Frame currently on screen; `None` forces a full redraw.
    shown: Option<FrameBuffer>,
    out: Vec<u8>,
    release_events: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            shown: None,
            out: Vec::with_capacity(64 * 1024),
            release_events: false,
        }
    }

    /// Take over the terminal.
    ///
    /// Key release reporting is requested when the terminal supports it; the
    /// input layer falls back to its release timeout otherwise.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        self.release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);

        self.out.clear();
        queue_enter(&mut self.out, self.release_events)?;
        self.flush().context("enter alternate screen")?;
        self.shown = None;
        Ok(())
    }

    /// Whether the terminal agreed to send key release events.
    pub fn reports_key_releases(&self) -> bool {
        self.release_events
    }

    pub fn exit(&mut self) -> Result<()> {
        self.out.clear();
        queue_exit(&mut self.out, self.release_events)?;
        self.flush().context("leave alternate screen")?;
        terminal::disable_raw_mode().context("disable raw mode")?;
        Ok(())
    }

    /// Redraw everything on the next frame, e.g. after a resize.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    /// Draw `fb` and hand back the previous frame's buffer in its place, so
    /// the caller renders into it next without cloning.
    pub fn draw_swap(&mut self, fb: &mut FrameBuffer) -> Result<()> {
        let shown = self.shown.take();

        self.out.clear();
        match &shown {
            Some(prev) if prev.width() == fb.width() && prev.height() == fb.height() => {
                encode_diff_into(prev, fb, &mut self.out)?
            }
            _ => encode_full_into(fb, &mut self.out)?,
        }
        self.flush().context("draw frame")?;

        let mut back = shown.unwrap_or_else(|| FrameBuffer::new(fb.width(), fb.height()));
        back.resize(fb.width(), fb.height());
        std::mem::swap(&mut back, fb);
        self.shown = Some(back);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.write_all(&self.out)?;
        self.stdout.flush()
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Focus changes are reported so the input layer can drop held keys when the
/// window loses focus.
fn queue_enter(out: &mut Vec<u8>, release_events: bool) -> io::Result<()> {
    out.queue(terminal::EnterAlternateScreen)?
        .queue(cursor::Hide)?
        .queue(terminal::DisableLineWrap)?
        .queue(EnableFocusChange)?;
    if release_events {
        out.queue(PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES))?;
    }
    Ok(())
}

fn queue_exit(out: &mut Vec<u8>, release_events: bool) -> io::Result<()> {
    if release_events {
        out.queue(PopKeyboardEnhancementFlags)?;
    }
    out.queue(DisableFocusChange)?
        .queue(ResetColor)?
        .queue(SetAttribute(Attribute::Reset))?
        .queue(terminal::EnableLineWrap)?
        .queue(cursor::Show)?
        .queue(terminal::LeaveAlternateScreen)?;
    Ok(())
}

/// Encode a whole frame into `out`, row by row.
pub fn encode_full_into(fb: &FrameBuffer, out: &mut Vec<u8>) -> Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let mut pen = Pen::new(out);
    for y in 0..fb.height() {
        pen.move_to(0, y)?;
        for &cell in fb.row(y) {
            pen.cell(cell)?;
        }
    }
    pen.finish()?;
    Ok(())
}

/// Encode only the runs of cells that differ between two same-sized frames.
pub fn encode_diff_into(prev: &FrameBuffer, next: &FrameBuffer, out: &mut Vec<u8>) -> Result<()> {
    let mut pen = Pen::new(out);
    for y in 0..next.height() {
        let row = next.row(y);
        for (start, len) in changed_runs(prev.row(y), row) {
            pen.move_to(start as u16, y)?;
            for &cell in &row[start..start + len] {
                pen.cell(cell)?;
            }
        }
    }
    pen.finish()?;
    Ok(())
}

/// `(start, len)` of every run where the rows differ.
fn changed_runs<'a>(prev: &'a [Cell], next: &'a [Cell]) -> impl Iterator<Item = (usize, usize)> + 'a {
    let n = prev.len().min(next.len());
    let mut x = 0;
    std::iter::from_fn(move || {
        while x < n && prev[x] == next[x] {
            x += 1;
        }
        if x == n {
            return None;
        }
        let start = x;
        while x < n && prev[x] != next[x] {
            x += 1;
        }
        Some((start, x - start))
    })
}

/// Writes cells, sending style escapes only when the style changes.
struct Pen<'a> {
    out: &'a mut Vec<u8>,
    style: Option<CellStyle>,
}

impl<'a> Pen<'a> {
    fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out, style: None }
    }

    fn move_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.out.queue(cursor::MoveTo(x, y))?;
        Ok(())
    }

    fn cell(&mut self, cell: Cell) -> io::Result<()> {
        if self.style != Some(cell.style) {
            let style = cell.style;
            self.out
                .queue(SetAttribute(Attribute::Reset))?
                .queue(SetForegroundColor(color(style.fg)))?
                .queue(SetBackgroundColor(color(style.bg)))?;
            if style.bold {
                self.out.queue(SetAttribute(Attribute::Bold))?;
            }
            if style.dim {
                self.out.queue(SetAttribute(Attribute::Dim))?;
            }
            self.style = Some(style);
        }
        self.out.queue(Print(cell.ch))?;
        Ok(())
    }

    fn finish(self) -> io::Result<()> {
        self.out.queue(ResetColor)?.queue(SetAttribute(Attribute::Reset))?;
        Ok(())
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn session_turns_focus_reporting_on_and_off() {
        let mut enter = Vec::new();
        queue_enter(&mut enter, false).unwrap();
        assert!(text(&enter).contains("\x1b[?1004h"));

        let mut exit = Vec::new();
        queue_exit(&mut exit, false).unwrap();
        assert!(text(&exit).contains("\x1b[?1004l"));
    }

    #[test]
    fn full_frame_writes_every_row() {
        let mut fb = FrameBuffer::new(2, 2);
        let style = CellStyle::default();
        fb.put_str(0, 0, "AB", style);
        fb.put_str(0, 1, "CD", style);

        let mut out = Vec::new();
        encode_full_into(&fb, &mut out).unwrap();
        let text = text(&out);
        assert!(text.contains("AB"));
        assert!(text.contains("CD"));
        assert!(!text.contains("\r\n"));
    }

    #[test]
    fn identical_frames_write_no_cells() {
        let fb = FrameBuffer::new(4, 2);
        let mut out = Vec::new();
        encode_diff_into(&fb, &fb, &mut out).unwrap();
        assert!(!text(&out).contains(' '));
    }

    #[test]
    fn diff_writes_only_the_changed_run() {
        let style = CellStyle::default();
        let prev = FrameBuffer::new(6, 1);
        let mut next = prev.clone();
        next.put_str(1, 0, "XYZ", style);

        let mut out = Vec::new();
        encode_diff_into(&prev, &next, &mut out).unwrap();
        let text = text(&out);
        assert!(text.contains("XYZ"));
        assert!(!text.contains(' '));
    }

    #[test]
    fn runs_are_split_by_unchanged_cells() {
        let style = CellStyle::default();
        let prev = FrameBuffer::new(8, 1);
        let mut next = prev.clone();
        next.put_str(1, 0, "ab", style);
        next.put_char(5, 0, 'c', style);
        next.put_char(7, 0, 'd', style);

        let runs: Vec<_> = changed_runs(prev.row(0), next.row(0)).collect();
        assert_eq!(runs, vec![(1, 2), (5, 1), (7, 1)]);
    }

    #[test]
    fn style_escapes_are_not_repeated_within_a_run() {
        let bold = CellStyle {
            bold: true,
            ..CellStyle::default()
        };
        let mut fb = FrameBuffer::new(3, 1);
        fb.put_str(0, 0, "abc", bold);

        let mut once = Vec::new();
        let mut pen = Pen::new(&mut once);
        pen.cell(Cell { ch: 'a', style: bold }).unwrap();
        let one_escape = once.len();

        let mut out = Vec::new();
        let mut pen = Pen::new(&mut out);
        for &cell in fb.row(0) {
            pen.cell(cell).unwrap();
        }
        assert_eq!(out.len(), one_escape + 2);
    }
}
