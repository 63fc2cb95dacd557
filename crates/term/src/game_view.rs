//! GameView: maps a `core::SessionSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::{get_shape, PlayerSnapshot, SessionSnapshot};
use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};
use crate::types::{
    MedalKind, MedalTier, PieceKind, PlayPhase, Rotation, CELL_BRACKETS, CELL_GHOST, CELL_MONO,
};

/// Width of the text panel next to each board.
const PANEL_W: u16 = 12;
/// Columns between two players' areas.
const PLAYER_GAP: u16 = 3;

const BOARD_BG: Rgb = Rgb::new(30, 30, 40);

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

/// A lightweight terminal renderer for one or more players.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 helps compensate for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
            anchor_y: AnchorY::Center,
        }
    }
}

/// Screen rectangle of one player's board frame.
#[derive(Debug, Clone, Copy)]
struct BoardRect {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            anchor_y: AnchorY::Center,
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    /// Render the session into an existing framebuffer.
    ///
    /// This is the allocation-free hot path. Callers can reuse a framebuffer
    /// across frames and only resize when the terminal size changes.
    pub fn render_into(&self, snap: &SessionSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(Cell::default());

        let total_w: u16 = snap
            .players
            .iter()
            .map(|p| self.frame_size(p).0 + 2 + PANEL_W)
            .sum::<u16>()
            + PLAYER_GAP * (snap.players.len().saturating_sub(1) as u16);
        let mut x = viewport.width.saturating_sub(total_w) / 2;

        for player in &snap.players {
            let (w, h) = self.frame_size(player);
            let y = match self.anchor_y {
                AnchorY::Center => viewport.height.saturating_sub(h) / 2,
                AnchorY::Top => 0,
            };
            let rect = BoardRect { x, y, w, h };

            self.draw_board(fb, player, rect);
            self.draw_side_panel(fb, player, snap, viewport, rect);

            if snap.paused {
                self.draw_overlay_text(fb, rect, "PAUSED");
            } else if player.phase == PlayPhase::GameOver {
                self.draw_overlay_text(fb, rect, "GAME OVER");
            } else if player.phase == PlayPhase::Finished {
                self.draw_overlay_text(fb, rect, "COMPLETE");
            }

            x = x.saturating_add(w + 2 + PANEL_W + PLAYER_GAP);
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &SessionSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    fn frame_size(&self, player: &PlayerSnapshot) -> (u16, u16) {
        (
            player.width as u16 * self.cell_w + 2,
            player.height as u16 * self.cell_h + 2,
        )
    }

    fn draw_board(&self, fb: &mut FrameBuffer, player: &PlayerSnapshot, rect: BoardRect) {
        let inner_w = rect.w - 2;
        let inner_h = rect.h - 2;
        let bg = CellStyle {
            fg: Rgb::new(80, 80, 90),
            bg: BOARD_BG,
            bold: false,
            dim: false,
        };
        fb.fill_rect(rect.x + 1, rect.y + 1, inner_w, inner_h, ' ', bg);

        let border = CellStyle {
            fg: if player.lock_flash {
                Rgb::new(255, 255, 255)
            } else {
                Rgb::new(200, 200, 200)
            },
            bg: Rgb::new(0, 0, 0),
            bold: player.lock_flash,
            dim: false,
        };
        self.draw_border(fb, rect, border);

        for y in 0..player.height {
            for x in 0..player.width {
                let value = player.coded_cell(x as i8, y as i8);
                self.draw_coded_cell(fb, rect, x as u16, y as u16, value);
            }
        }
    }

    fn draw_coded_cell(&self, fb: &mut FrameBuffer, rect: BoardRect, x: u16, y: u16, value: i32) {
        if value == CELL_MONO {
            let style = CellStyle {
                fg: Rgb::new(130, 130, 130),
                bg: BOARD_BG,
                bold: false,
                dim: false,
            };
            self.fill_cell_rect(fb, rect, x, y, '█', style);
            return;
        }

        let Some(kind) = PieceKind::from_cell_id(value) else {
            let style = CellStyle {
                fg: Rgb::new(90, 90, 100),
                bg: BOARD_BG,
                bold: false,
                dim: true,
            };
            self.fill_cell_rect(fb, rect, x, y, '·', style);
            return;
        };

        let fg = piece_color(kind);
        if value & CELL_GHOST != 0 {
            let style = CellStyle {
                fg,
                bg: BOARD_BG,
                bold: false,
                dim: true,
            };
            self.fill_cell_rect(fb, rect, x, y, '░', style);
        } else if value & CELL_BRACKETS != 0 && self.cell_w >= 2 {
            let style = CellStyle {
                fg,
                bg: BOARD_BG,
                bold: true,
                dim: false,
            };
            let px = rect.x + 1 + x * self.cell_w;
            let py = rect.y + 1 + y * self.cell_h;
            for dy in 0..self.cell_h {
                fb.put_char(px, py + dy, '[', style);
                fb.fill_rect(px + 1, py + dy, self.cell_w - 2, 1, '█', style);
                fb.put_char(px + self.cell_w - 1, py + dy, ']', style);
            }
        } else {
            let style = CellStyle {
                fg,
                bg: BOARD_BG,
                bold: true,
                dim: false,
            };
            self.fill_cell_rect(fb, rect, x, y, '█', style);
        }
    }

    fn draw_border(&self, fb: &mut FrameBuffer, rect: BoardRect, style: CellStyle) {
        let BoardRect { x, y, w, h } = rect;
        if w < 2 || h < 2 {
            return;
        }

        fb.put_char(x, y, '┌', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);

        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }
    }

    fn fill_cell_rect(&self, fb: &mut FrameBuffer, rect: BoardRect, cell_x: u16, cell_y: u16, ch: char, style: CellStyle) {
        let px = rect.x + 1 + cell_x * self.cell_w;
        let py = rect.y + 1 + cell_y * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        player: &PlayerSnapshot,
        snap: &SessionSnapshot,
        viewport: Viewport,
        rect: BoardRect,
    ) {
        let panel_x = rect.x.saturating_add(rect.w).saturating_add(2);
        if panel_x.saturating_add(PANEL_W) > viewport.width {
            return;
        }

        let label = CellStyle {
            fg: Rgb::new(220, 220, 220),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        let value = CellStyle {
            fg: Rgb::new(200, 200, 200),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: false,
        };
        let dim = CellStyle { dim: true, ..value };

        let mut y = rect.y;
        if snap.players.len() > 1 {
            fb.put_num(panel_x, y, player.index as u32 + 1, label);
            fb.put_char(panel_x + 1, y, 'P', label);
            if player.index == snap.focused_player {
                fb.put_char(panel_x + 3, y, '*', value);
            }
            y = y.saturating_add(2);
        }

        fb.put_str(panel_x, y, "NEXT", label);
        y = y.saturating_add(1);
        if let Some(&next) = player.previews.first() {
            self.draw_mini_piece(fb, panel_x, y, next);
        }
        let mut lx = panel_x + 9;
        for kind in player.previews.iter().skip(1) {
            fb.put_char(lx, y, piece_letter(*kind), CellStyle { fg: piece_color(*kind), ..value });
            lx += 1;
        }
        y = y.saturating_add(3);

        let hold_label = CellStyle { dim: player.hold_flash, ..label };
        fb.put_str(panel_x, y, "HOLD", hold_label);
        match player.hold {
            Some(kind) => fb.put_char(panel_x + 5, y, piece_letter(kind), CellStyle { fg: piece_color(kind), ..value }),
            None => fb.put_char(panel_x + 5, y, '-', dim),
        }
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "GRADE", label);
        y = y.saturating_add(1);
        let grade = CellStyle {
            bold: true,
            fg: if player.mroll_unlocked {
                Rgb::new(255, 215, 0)
            } else {
                value.fg
            },
            ..value
        };
        fb.put_str(panel_x, y, player.grade.as_str(), grade);
        if player.grade_points > 0 {
            fb.put_num(panel_x + 4, y, player.grade_points, dim);
        }
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "SCORE", label);
        y = y.saturating_add(1);
        fb.put_num(panel_x, y, player.score, value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "LEVEL", label);
        y = y.saturating_add(1);
        fb.put_num(panel_x, y, player.level, value);
        y = y.saturating_add(1);
        fb.put_num(panel_x, y, player.level_target, dim);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "TIME", label);
        y = y.saturating_add(1);
        fb.put_frames(panel_x, y, player.timer, value);
        y = y.saturating_add(2);

        if player.medals.iter().any(|(_, m)| m.tier != MedalTier::None) {
            fb.put_str(panel_x, y, "MEDALS", label);
            y = y.saturating_add(1);
            let mut mx = panel_x;
            for kind in MedalKind::ALL {
                let tier = player.medals.tier(kind);
                if tier == MedalTier::None {
                    continue;
                }
                if mx + 2 > panel_x + PANEL_W {
                    mx = panel_x;
                    y = y.saturating_add(1);
                }
                fb.put_str(mx, y, kind.as_str(), CellStyle { fg: tier_color(tier), bold: true, ..value });
                mx += 3;
            }
        }
    }

    fn draw_mini_piece(&self, fb: &mut FrameBuffer, x: u16, y: u16, kind: PieceKind) {
        let style = CellStyle {
            fg: piece_color(kind),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        for (dx, dy) in get_shape(kind, Rotation::North) {
            // North shapes occupy rows 1-2 of their 4x4 box.
            let row = (dy - 1).max(0) as u16;
            fb.fill_rect(x + dx as u16 * 2, y + row, 2, 1, '█', style);
        }
    }

    fn draw_overlay_text(&self, fb: &mut FrameBuffer, rect: BoardRect, text: &str) {
        let mid_y = rect.y.saturating_add(rect.h / 2);
        let text_w = text.chars().count() as u16;
        let x = rect.x.saturating_add(rect.w.saturating_sub(text_w) / 2);
        let style = CellStyle {
            fg: Rgb::new(255, 255, 255),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        fb.put_str(x, mid_y, text, style);
    }
}

/// Arcade colors: red I, green Z, purple S, blue J, orange L, yellow O, cyan T.
fn piece_color(kind: PieceKind) -> Rgb {
    match kind {
        PieceKind::I => Rgb::new(220, 70, 70),
        PieceKind::Z => Rgb::new(90, 200, 90),
        PieceKind::S => Rgb::new(190, 90, 210),
        PieceKind::J => Rgb::new(80, 120, 230),
        PieceKind::L => Rgb::new(255, 150, 40),
        PieceKind::O => Rgb::new(240, 220, 80),
        PieceKind::T => Rgb::new(80, 210, 220),
    }
}

fn piece_letter(kind: PieceKind) -> char {
    match kind {
        PieceKind::I => 'I',
        PieceKind::Z => 'Z',
        PieceKind::S => 'S',
        PieceKind::J => 'J',
        PieceKind::L => 'L',
        PieceKind::O => 'O',
        PieceKind::T => 'T',
    }
}

fn tier_color(tier: MedalTier) -> Rgb {
    match tier {
        MedalTier::None => Rgb::new(90, 90, 100),
        MedalTier::Bronze => Rgb::new(205, 127, 50),
        MedalTier::Silver => Rgb::new(192, 192, 192),
        MedalTier::Gold => Rgb::new(255, 215, 0),
        MedalTier::Platinum => Rgb::new(180, 240, 255),
    }
}
