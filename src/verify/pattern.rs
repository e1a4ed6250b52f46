//! The test pattern a terminal is asked to display.
//!
//! Eight rows; each row is a marker stripe of xterm color `196 + row`
//! (6 cells), a blank cell, a block of palette color `row` (28 cells),
//! a blank cell and a block of palette color `8 + row` (28 cells).
//! The marker colors lie outside the 16 color palette so rows stay
//! distinguishable when two palette entries are equal.

use lazy_static::lazy_static;
use rgb::RGB8;

use super::{Screenshot, ROWS};
use crate::{Color, Scheme};

/// xterm color of the marker of row 0.
pub const MARKER_BASE: u8 = 196;
pub const MARKER_CELLS: u32 = 6;
pub const BLOCK_CELLS: u32 = 28;
const GAP_CELLS: u32 = 1;

lazy_static! {
    /// xterm colors 16 to 255: the 6×6×6 color cube, then 24 grays.
    static ref XTERM_EXTENDED: Vec<Color> = {
        const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
        let mut v = Vec::with_capacity(240);
        for r in LEVELS {
            for g in LEVELS {
                for b in LEVELS { v.push(RGB8::new(r, g, b)) }
            }
        }
        for i in 0 .. 24 {
            let l = 8 + 10 * i;
            v.push(RGB8::new(l, l, l))
        }
        v
    };
}

/// Color of the xterm-256 index `index`.  Indices below 16 are taken
/// from `palette`.
pub fn xterm256(index: u8, palette: &[Color; 16]) -> Color {
    match index {
        0 ..= 15 => palette[index as usize],
        i => XTERM_EXTENDED[i as usize - 16],
    }
}

/// Escape sequences printing the test pattern, as a terminal should
/// receive them (cursor hidden, screen cleared, one line per row).
pub fn ansi_test_pattern() -> String {
    let blank = |n: u32| " ".repeat(n as usize);
    let mut s = String::from("\x1b[?25l\x1b[H\x1b[2J");
    for row in 0 .. ROWS as u32 {
        s += &format!("\x1b[48;5;{}m{}\x1b[0m", MARKER_BASE as u32 + row,
                      blank(MARKER_CELLS));
        s += &blank(GAP_CELLS);
        s += &format!("\x1b[48;5;{row}m{}\x1b[0m", blank(BLOCK_CELLS));
        s += &blank(GAP_CELLS);
        s += &format!("\x1b[48;5;{}m{}\x1b[0m\n", 8 + row, blank(BLOCK_CELLS));
    }
    s
}

/// Where and how large [`paint_test_pattern`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternLayout {
    /// Top left corner, in pixels.
    pub x: u32,
    pub y: u32,
    /// Size of a terminal cell, in pixels.
    pub cell_width: u32,
    pub cell_height: u32,
    /// Whether to draw the row markers.
    pub markers: bool,
}

impl PatternLayout {
    /// Pattern at (`x`, `y`) with 8×16 cells.
    pub fn at(x: u32, y: u32) -> Self {
        PatternLayout { x, y, cell_width: 8, cell_height: 16, markers: true }
    }

    pub fn cell(mut self, width: u32, height: u32) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    pub fn without_markers(mut self) -> Self {
        self.markers = false;
        self
    }

    /// Left edge of the left block, in pixels.
    pub fn left_block_x(&self) -> u32 {
        self.x + (MARKER_CELLS + GAP_CELLS) * self.cell_width
    }

    /// Left edge of the right block, in pixels.
    pub fn right_block_x(&self) -> u32 {
        self.left_block_x() + (BLOCK_CELLS + GAP_CELLS) * self.cell_width
    }

    pub fn block_width(&self) -> u32 { BLOCK_CELLS * self.cell_width }
}

/// Draw the test pattern of `scheme` onto `shot`, the way a terminal
/// using `scheme` would.  Blank cells are left untouched.
pub fn paint_test_pattern(shot: &mut Screenshot, scheme: &Scheme,
                          layout: &PatternLayout) {
    let (cw, ch) = (layout.cell_width, layout.cell_height);
    for row in 0 .. ROWS {
        let y = layout.y + row as u32 * ch;
        if layout.markers {
            let marker = xterm256(MARKER_BASE + row as u8, &scheme.palette);
            shot.fill_rect(layout.x, y, MARKER_CELLS * cw, ch, marker);
        }
        shot.fill_rect(layout.left_block_x(), y, layout.block_width(), ch,
                       scheme.palette[row]);
        shot.fill_rect(layout.right_block_x(), y, layout.block_width(), ch,
                       scheme.palette[8 + row]);
    }
}

/// A `width`×`height` screenshot of a terminal showing the test
/// pattern of `scheme` on its background.
pub fn render_test_pattern(width: u32, height: u32, scheme: &Scheme,
                           layout: &PatternLayout) -> Screenshot {
    let mut shot = Screenshot::filled(width, height, scheme.background);
    paint_test_pattern(&mut shot, scheme, layout);
    shot
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xterm_cube_and_grays() {
        let palette = [RGB8::new(1, 2, 3); 16];
        assert_eq!(xterm256(7, &palette), RGB8::new(1, 2, 3));
        assert_eq!(xterm256(16, &palette), RGB8::new(0, 0, 0));
        assert_eq!(xterm256(196, &palette), RGB8::new(255, 0, 0));
        assert_eq!(xterm256(203, &palette), RGB8::new(255, 95, 95));
        assert_eq!(xterm256(231, &palette), RGB8::new(255, 255, 255));
        assert_eq!(xterm256(232, &palette), RGB8::new(8, 8, 8));
        assert_eq!(xterm256(255, &palette), RGB8::new(238, 238, 238));
    }

    #[test]
    fn markers_are_distinct() {
        let palette = [RGB8::default(); 16];
        let markers: Vec<_> = (0 .. ROWS as u8)
            .map(|r| xterm256(MARKER_BASE + r, &palette)).collect();
        for (i, a) in markers.iter().enumerate() {
            assert!(markers[i + 1 ..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn ansi_pattern_has_one_line_per_row() {
        let s = ansi_test_pattern();
        assert_eq!(s.lines().count(), ROWS);
        assert!(s.contains("\x1b[48;5;196m      \x1b[0m"));
        assert!(s.contains("\x1b[48;5;15m"));
        assert!(!s.contains("\x1b[48;5;204m"));
    }

    #[test]
    fn layout_geometry() {
        let l = PatternLayout::at(10, 20).cell(9, 18);
        assert_eq!(l.left_block_x(), 10 + 7 * 9);
        assert_eq!(l.right_block_x(), 10 + 36 * 9);
        assert_eq!(l.block_width(), 28 * 9);
        assert!(!l.without_markers().markers);
    }
}
