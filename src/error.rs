use std::fmt;

use thiserror::Error;

use crate::{to_hex8, Color};

/// Which block of a test grid row a color was sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Palette index `row`.
    Left,
    /// Palette index `8 + row`.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Side::Left => "left", Side::Right => "right" })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("expected #RRGGBB or #RRRRGGGGBBBB, got {0:?}")]
    InvalidColorFormat(String),

    #[error("palette: expected 16 colors, got {0}")]
    PaletteLength(usize),

    #[error("profile has no `{0}` key")]
    MissingKey(&'static str),

    /// The screenshot holds no recognizable test grid.
    #[error("could not locate block grid: {0}")]
    LayoutNotFound(String),

    /// The grid was found but a block is out of tolerance.
    #[error("row {row} {side} mismatch got={} exp={} (maxdiff={distance})",
            hex(.observed), hex(.expected))]
    ColorMismatch {
        row: usize,
        side: Side,
        observed: Color,
        expected: Color,
        distance: u8,
    },

    #[error("cannot decode screenshot: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hex(c: &Color) -> String { to_hex8(*c) }

impl Error {
    /// Whether this failure concerns one screenshot only.  Such errors
    /// are collected by a batch, never propagated.
    pub fn is_render_failure(&self) -> bool {
        matches!(self, Error::LayoutNotFound(_) | Error::ColorMismatch { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
