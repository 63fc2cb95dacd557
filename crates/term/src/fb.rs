//! Character framebuffer the game view draws into.
//!
//! Every write is clipped to the buffer, so the view can lay panels out
//! without checking the terminal size first. Numbers and timers have their
//! own writers that do not allocate.

use crate::types::FPS;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Rgb,
    pub bg: Rgb,
    pub bold: bool,
    pub dim: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            fg: Rgb::new(220, 220, 220),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: CellStyle::default(),
        }
    }
}

/// Row-major grid of styled cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Change the size, reusing the allocation when it is large enough.
    /// Cell contents are unspecified afterwards; callers redraw everything.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (self.width, self.height) != (width, height) {
            self.width = width;
            self.height = height;
            self.cells.resize(width as usize * height as usize, Cell::default());
        }
    }

    fn offset(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    #[cfg(test)]
    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.offset(x, y).map(|i| self.cells[i])
    }

    /// One full row, empty when `y` is out of range.
    pub fn row(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let w = self.width as usize;
        let start = y as usize * w;
        &self.cells[start..start + w]
    }

    pub fn clear(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    pub fn put_char(&mut self, x: u16, y: u16, ch: char, style: CellStyle) {
        if let Some(i) = self.offset(x, y) {
            self.cells[i] = Cell { ch, style };
        }
    }

    pub fn put_str(&mut self, x: u16, y: u16, s: &str, style: CellStyle) {
        for (i, ch) in s.chars().enumerate() {
            let Some(cx) = u16::try_from(i).ok().and_then(|i| x.checked_add(i)) else {
                break;
            };
            if cx >= self.width {
                break;
            }
            self.put_char(cx, y, ch, style);
        }
    }

    /// Write a decimal number; returns how many columns it took.
    pub fn put_num(&mut self, x: u16, y: u16, value: impl Into<u64>, style: CellStyle) -> u16 {
        let mut v = value.into();
        let mut digits = [b'0'; 20];
        let mut len = 0;
        while len == 0 || v > 0 {
            digits[digits.len() - 1 - len] = b'0' + (v % 10) as u8;
            v /= 10;
            len += 1;
        }
        for (i, &d) in digits[digits.len() - len..].iter().enumerate() {
            self.put_char(x.saturating_add(i as u16), y, d as char, style);
        }
        len as u16
    }

    /// Write a frame count as `mm:ss:cc`, matching
    /// [`crate::types::format_frames`].
    pub fn put_frames(&mut self, x: u16, y: u16, frames: u64, style: CellStyle) {
        let fps = FPS as u64;
        let fields = [(frames / (fps * 60)).min(99), (frames / fps) % 60, (frames % fps) * 100 / fps];
        for (i, field) in fields.into_iter().enumerate() {
            let cx = x.saturating_add(i as u16 * 3);
            if i > 0 {
                self.put_char(cx - 1, y, ':', style);
            }
            self.put_char(cx, y, (b'0' + (field / 10) as u8) as char, style);
            self.put_char(cx.saturating_add(1), y, (b'0' + (field % 10) as u8) as char, style);
        }
    }

    pub fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, ch: char, style: CellStyle) {
        for dy in 0..h {
            for dx in 0..w {
                self.put_char(x.saturating_add(dx), y.saturating_add(dy), ch, style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::format_frames;

    fn row_text(fb: &FrameBuffer, y: u16) -> String {
        fb.row(y).iter().map(|c| c.ch).collect()
    }

    #[test]
    fn numbers_and_timer() {
        let mut fb = FrameBuffer::new(12, 2);
        let style = CellStyle::default();
        assert_eq!(fb.put_num(0, 0, 1_234_500u64, style), 7);
        assert_eq!(fb.put_num(8, 0, 0u32, style), 1);
        assert_eq!(row_text(&fb, 0), "1234500 0   ");

        fb.put_frames(0, 1, 60 * 75 + 30, style);
        assert_eq!(row_text(&fb, 1).trim_end(), format_frames(60 * 75 + 30));
    }

    #[test]
    fn writes_are_clipped() {
        let mut fb = FrameBuffer::new(3, 1);
        fb.put_str(1, 0, "abcdef", CellStyle::default());
        fb.put_char(5, 5, 'x', CellStyle::default());
        fb.put_num(2, 0, 987u32, CellStyle::default());
        assert_eq!(row_text(&fb, 0), " a9");
        assert!(fb.row(1).is_empty());
    }

    #[test]
    fn shrinking_keeps_the_allocation() {
        let mut fb = FrameBuffer::new(10, 10);
        let cap = fb.cells.capacity();
        fb.resize(5, 5);
        assert_eq!(fb.row(4).len(), 5);
        assert_eq!(fb.cells.len(), 25);
        assert_eq!(fb.cells.capacity(), cap);
    }
}
