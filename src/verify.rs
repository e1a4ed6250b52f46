//! Screenshot based render verification.
//!
//! A terminal configured with a scheme is asked to display the test
//! pattern (see [`ansi_test_pattern`]) and a screenshot is taken by an
//! external tool.  [`verify`] then finds the pattern in the screenshot,
//! without knowing where the terminal window is, and checks that each
//! block shows the expected palette color.

use std::collections::HashMap;
use std::fmt;

use rgb::RGB8;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{chan_diff, par_map, to_hex8, Color, Error, Result, Scheme, Side};

mod pattern;
pub use pattern::{ansi_test_pattern, paint_test_pattern, render_test_pattern,
                  xterm256, PatternLayout, BLOCK_CELLS, MARKER_BASE,
                  MARKER_CELLS};

/// Number of rows of the test pattern.
pub const ROWS: usize = 8;

/// Row heights below this are not trusted.
const MIN_ROW_HEIGHT: u32 = 8;

/// A decoded RGB screenshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screenshot {
    width: u32,
    height: u32,
    pixels: Vec<Color>, // row major, `width * height` long
}

impl Screenshot {
    /// A screenshot of a single color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let pixels = vec![color; width as usize * height as usize];
        Screenshot { width, height, pixels }
    }

    /// Wrap row major `pixels`; `None` unless there are exactly
    /// `width * height` of them.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>)
                       -> Option<Self> {
        if pixels.len() != width as usize * height as usize { return None }
        Some(Screenshot { width, height, pixels })
    }

    /// Decode an image file (PNG) held in `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?.into_rgb8();
        let (width, height) = img.dimensions();
        let pixels = img.pixels().map(|p| RGB8::new(p.0[0], p.0[1], p.0[2]))
            .collect();
        Ok(Screenshot { width, height, pixels })
    }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    /// Color at (`x`, `y`).  Panics outside the screenshot.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        assert!(x < self.width && y < self.height,
                "pixel ({x}, {y}) outside {}×{}", self.width, self.height);
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    fn row(&self, y: u32) -> &[Color] {
        let w = self.width as usize;
        &self.pixels[y as usize * w .. (y as usize + 1) * w]
    }

    /// Paint a rectangle, clipped to the screenshot.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32,
                     color: Color) {
        let x1 = x.saturating_add(width).min(self.width);
        let y1 = y.saturating_add(height).min(self.height);
        for yy in y.min(y1) .. y1 {
            let start = yy as usize * self.width as usize;
            self.pixels[start + x.min(x1) as usize .. start + x1 as usize]
                .fill(color);
        }
    }
}

/// Tunables of the verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    tolerance: u8,
    sample_width: u32,
    sample_height: u32,
    scan_start: u32,
    scan_end: u32,
    min_run: u32,
    marker_search: u32,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            tolerance: 6,
            sample_width: 6,
            sample_height: 6,
            // Skip the title bar and menus of the terminal window.
            scan_start: 40,
            scan_end: 320,
            min_run: 30,
            marker_search: 120,
        }
    }
}

impl VerifyOptions {
    pub fn new() -> Self { Self::default() }

    /// Read options from JSON; missing fields keep their default.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Largest accepted per channel difference, both to tell the
    /// background apart and to accept a block color.
    pub fn tolerance(mut self, max_chan_diff: u8) -> Self {
        self.tolerance = max_chan_diff;
        self
    }

    /// Size of the box averaged at each block center.
    pub fn sample_box(mut self, width: u32, height: u32) -> Self {
        self.sample_width = width;
        self.sample_height = height;
        self
    }

    /// Scanlines searched for the pattern: `start .. end`.
    pub fn scan_rows(mut self, start: u32, end: u32) -> Self {
        self.scan_start = start;
        self.scan_end = end;
        self
    }

    /// Shortest horizontal run counted as a marker or a block.
    pub fn min_run(mut self, pixels: u32) -> Self {
        self.min_run = pixels;
        self
    }

    /// How far left of the left block the marker is searched.
    pub fn marker_search(mut self, pixels: u32) -> Self {
        self.marker_search = pixels;
        self
    }
}

/// Position of the test pattern in a screenshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScreenshotGrid {
    /// Left edge of the marker stripes.
    pub origin_x: u32,
    /// Top of row 0.
    pub origin_y: u32,
    pub row_height: u32,
    pub left_block_x: u32,
    pub left_block_width: u32,
    pub right_block_x: u32,
}

impl ScreenshotGrid {
    /// Vertical center of `row`.
    pub fn row_center(&self, row: usize) -> u32 {
        self.origin_y + row as u32 * self.row_height + self.row_height / 2
    }

    /// Horizontal center of the left block.
    pub fn left_center(&self) -> u32 {
        self.left_block_x + self.left_block_width / 2
    }

    /// Horizontal center of the right block.  Both blocks have the
    /// same width.
    pub fn right_center(&self) -> u32 {
        self.right_block_x + self.left_block_width / 2
    }
}

/// A maximal horizontal run of one color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    x: u32,
    width: u32,
}

/// Runs of scanline `y` that are far enough from `bg` and wide enough.
fn foreground_runs(shot: &Screenshot, y: u32, bg: Color,
                   opts: &VerifyOptions) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut x = 0;
    for run in shot.row(y).chunk_by(|a, b| a == b) {
        let width = run.len() as u32;
        if chan_diff(run[0], bg) > opts.tolerance && width >= opts.min_run {
            runs.push(Run { x, width });
        }
        x += width;
    }
    runs
}

/// Most frequent color of `shot`, counted on every 4th pixel of every
/// 4th row.  `None` for an empty screenshot.
pub fn dominant_color(shot: &Screenshot) -> Option<Color> {
    let step = if shot.width >= 4 && shot.height >= 4 { 4 } else { 1 };
    let mut counts: HashMap<Color, usize> = HashMap::new();
    for y in (0 .. shot.height).step_by(step) {
        for x in (0 .. shot.width).step_by(step) {
            *counts.entry(shot.pixel(x, y)).or_default() += 1;
        }
    }
    // Ties go to the smallest color so the result does not depend on
    // the hash map order.
    counts.into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(c, _)| c)
}

/// The background to measure against: `declared` unless the
/// screenshot is dominated by a color more than `tolerance` away from
/// it (color management of the renderer).
pub fn effective_background(shot: &Screenshot, declared: Color,
                            tolerance: u8) -> Color {
    match dominant_color(shot) {
        Some(dom) if chan_diff(dom, declared) > tolerance => {
            warn!(declared = %to_hex8(declared), dominant = %to_hex8(dom),
                  "screenshot background differs from the scheme, \
                   using the dominant color");
            dom
        }
        _ => declared,
    }
}

/// Locate the test pattern in `shot`, `bg` being the terminal
/// background.
///
/// The topmost scanline (in the scanned range) holding a marker and
/// two blocks is used; the rows above it are then recovered by
/// following the marker stripes upwards.
pub fn detect_grid(shot: &Screenshot, bg: Color, opts: &VerifyOptions)
                   -> Result<ScreenshotGrid> {
    let is_fg = |c: Color| chan_diff(c, bg) > opts.tolerance;
    let y_end = shot.height.min(opts.scan_end);
    let candidate = (opts.scan_start .. y_end).find_map(|y| {
        let runs = foreground_runs(shot, y, bg, opts);
        if runs.len() < 3 { return None }
        // runs[0] is the marker.
        let left = runs[1];
        let right = runs[2 ..].iter().find(|r| r.x > left.x + left.width)?;
        Some((y, left, right.x))
    });
    let Some((y0, left, right_block_x)) = candidate else {
        return Err(Error::LayoutNotFound(
            "no scanline with a marker and two color blocks".into()))
    };
    debug!(y = y0, left_x = left.x, left_width = left.width,
           right_x = right_block_x, "candidate grid row");

    let mx = (left.x.saturating_sub(opts.marker_search) .. left.x)
        .find(|&x| is_fg(shot.pixel(x, y0)))
        .ok_or_else(|| Error::LayoutNotFound(
            format!("no marker stripe left of x={}", left.x)))?;
    let mc = shot.pixel(mx, y0);
    let mut top = y0;
    while top > 0 && shot.pixel(mx, top - 1) == mc { top -= 1 }
    let mut bottom = y0;
    while bottom < shot.height && shot.pixel(mx, bottom) == mc { bottom += 1 }
    let row_height = (bottom - top).max(MIN_ROW_HEIGHT);

    // Climb through the markers of the rows above, up to row 0.
    while top > 1 && is_fg(shot.pixel(mx, top - 1)) {
        let c = shot.pixel(mx, top - 1);
        let mut seg_top = top - 1;
        while seg_top > 0 && shot.pixel(mx, seg_top - 1) == c { seg_top -= 1 }
        top = seg_top;
    }

    let grid = ScreenshotGrid {
        origin_x: mx, origin_y: top, row_height,
        left_block_x: left.x, left_block_width: left.width, right_block_x,
    };
    debug!(?grid, "grid detected");
    Ok(grid)
}

/// Mean color of the `width`×`height` box centered on (`x`, `y`),
/// clipped to the screenshot; `None` if nothing is left.
pub fn sample_box(shot: &Screenshot, x: u32, y: u32, width: u32, height: u32)
                  -> Option<Color> {
    let xs = x.saturating_sub(width / 2) .. (x + width / 2 + 1).min(shot.width);
    let ys = y.saturating_sub(height / 2) .. (y + height / 2 + 1).min(shot.height);
    let n = xs.len() * ys.len();
    if n == 0 { return None }
    let mut sum = [0u64; 3];
    for yy in ys {
        for xx in xs.clone() {
            let c = shot.pixel(xx, yy);
            sum[0] += c.r as u64;
            sum[1] += c.g as u64;
            sum[2] += c.b as u64;
        }
    }
    let mean = |s: u64| (s as f64 / n as f64).round_ties_even() as u8;
    Some(RGB8::new(mean(sum[0]), mean(sum[1]), mean(sum[2])))
}

/// Check that `shot` displays the palette of `scheme`.
///
/// Rows are checked top to bottom, left block before right block; the
/// first block out of tolerance is reported as
/// [`Error::ColorMismatch`].  [`Error::LayoutNotFound`] is returned
/// when no grid is found.
pub fn verify(shot: &Screenshot, scheme: &Scheme, opts: &VerifyOptions)
              -> Result<ScreenshotGrid> {
    let bg = effective_background(shot, scheme.background, opts.tolerance);
    let grid = detect_grid(shot, bg, opts)?;
    for row in 0 .. ROWS {
        let y = grid.row_center(row);
        for (side, x, expected) in [
            (Side::Left, grid.left_center(), scheme.palette[row]),
            (Side::Right, grid.right_center(), scheme.palette[8 + row])] {
            let observed = sample_box(shot, x, y, opts.sample_width,
                                      opts.sample_height)
                .ok_or_else(|| Error::LayoutNotFound(
                    format!("row {row} lies outside the screenshot")))?;
            let distance = chan_diff(observed, expected);
            if distance > opts.tolerance {
                return Err(Error::ColorMismatch { row, side, observed,
                                                  expected, distance })
            }
        }
    }
    Ok(grid)
}

/// Verify each (screenshot, scheme) pair, in parallel.  Results are in
/// input order.
pub fn verify_all(jobs: &[(Screenshot, Scheme)], opts: &VerifyOptions)
                  -> Vec<Result<ScreenshotGrid>> {
    par_map(jobs, |(shot, scheme)| verify(shot, scheme, opts))
}

/// Failures collected over many schemes.  Recording a failure never
/// stops the batch.
#[derive(Debug)]
pub struct VerifyBatch<Id> {
    tested: usize,
    failures: Vec<(Id, Error)>,
}

impl<Id> Default for VerifyBatch<Id> {
    fn default() -> Self { VerifyBatch { tested: 0, failures: Vec::new() } }
}

impl<Id: fmt::Display> VerifyBatch<Id> {
    pub fn new() -> Self { Self::default() }

    /// Record the outcome of verifying the scheme `id`.
    pub fn record(&mut self, id: Id, outcome: Result<ScreenshotGrid>) {
        self.tested += 1;
        match outcome {
            Ok(grid) => debug!(%id, ?grid, "render verified"),
            Err(e) => {
                if e.is_render_failure() {
                    warn!(%id, error = %e, "render mismatch");
                } else {
                    error!(%id, error = %e, "render check failed");
                }
                self.failures.push((id, e));
            }
        }
    }

    pub fn tested(&self) -> usize { self.tested }

    pub fn failures(&self) -> &[(Id, Error)] { &self.failures }

    /// Whether every recorded scheme passed.
    pub fn is_pass(&self) -> bool { self.failures.is_empty() }

    /// Number of failures where no grid was found at all.
    pub fn layout_failures(&self) -> usize {
        self.failures.iter()
            .filter(|(_, e)| matches!(e, Error::LayoutNotFound(_))).count()
    }

    /// Human readable report; at most 50 failures are listed.
    pub fn summary(&self) -> String {
        const MAX_LISTED: usize = 50;
        if self.is_pass() {
            info!(tested = self.tested, "render verification passed");
            return format!("OK: render-verified {} scheme(s)", self.tested)
        }
        info!(tested = self.tested, failed = self.failures.len(),
              "render verification failed");
        let mut s = format!("FAIL: {}/{} issues", self.failures.len(),
                            self.tested);
        for (id, e) in self.failures.iter().take(MAX_LISTED) {
            s += &format!("\n- {id}: {e}");
        }
        if self.failures.len() > MAX_LISTED {
            s += &format!("\n... and {} more", self.failures.len() - MAX_LISTED);
        }
        s
    }
}
