//! Color semantics and render verification for terminal color schemes.
//!
//! - Color model: [`normalize`], [`luminance`], [`contrast_ratio`],
//!   [`to_hsv`], [`chan_diff`]
//! - [`fingerprint()`](fingerprint::fingerprint) and [`DedupTable`]
//! - [`Vibe`] names and tags
//! - [`score()`](score::score) and [`ScoreRow`]
//! - [`verify()`](verify::verify) of a captured [`Screenshot`]
//!
//! Every computation takes a [`Scheme`]: a background, a foreground and
//! the 16 ANSI colors in their usual order (0–7 “normal”, 8–15
//! “bright”).  Colors enter as `#RRGGBB` or `#RRRRGGGGBBBB` strings and
//! are brought down to 8 bits per channel before any metric is
//! computed.

use rgb::{RGB8, RGB16};

mod error;
pub mod fingerprint;
pub mod index;
pub mod profile;
pub mod score;
pub mod verify;
pub mod vibe;

pub use error::{Error, Result, Side};
pub use fingerprint::{fingerprint, DedupReport, DedupTable, Fingerprint};
pub use index::CorpusIndex;
pub use profile::Profile;
pub use score::{score, ScoreKey, ScoreReport, ScoreRow};
pub use verify::{verify, Screenshot, ScreenshotGrid, VerifyBatch, VerifyOptions};
pub use vibe::{vibe, BackgroundKind, Vibe};

/// A 24-bit sRGB color.  This is the only representation metrics
/// are computed on.
pub type Color = RGB8;

/// Colors that can be brought down to the canonical 8-bit form.
pub trait ToColor {
    /// Return the 8-bit per channel color.
    fn to_color(&self) -> Color;
}

impl ToColor for RGB8 {
    #[inline]
    fn to_color(&self) -> Color { *self }
}

impl ToColor for RGB16 {
    /// Keep the high byte of each channel.  No rounding: existing
    /// fingerprints were computed from truncated values.
    #[inline]
    fn to_color(&self) -> Color {
        RGB8 { r: (self.r >> 8) as u8, g: (self.g >> 8) as u8,
               b: (self.b >> 8) as u8 }
    }
}

/// Parse `#RRGGBB` or `#RRRRGGGGBBBB` (case insensitive, `#` and `0x`
/// prefixes optional, surrounding whitespace ignored).
///
/// # Example
///
/// ```
/// use scheme_swatch::normalize;
/// let c = normalize("#1E1E1E1E2E2E")?;
/// assert_eq!(c, normalize("1e1e2e")?);
/// # Ok::<(), scheme_swatch::Error>(())
/// ```
pub fn normalize(raw: &str) -> Result<Color> {
    let invalid = || Error::InvalidColorFormat(raw.to_string());
    let s = raw.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) { return Err(invalid()) }
    match s.len() {
        6 => {
            let c = |i: usize| u8::from_str_radix(&s[i .. i + 2], 16);
            Ok(RGB8 { r: c(0).map_err(|_| invalid())?,
                      g: c(2).map_err(|_| invalid())?,
                      b: c(4).map_err(|_| invalid())? })
        }
        12 => {
            let c = |i: usize| u16::from_str_radix(&s[i .. i + 4], 16);
            let rgb = RGB16 { r: c(0).map_err(|_| invalid())?,
                              g: c(4).map_err(|_| invalid())?,
                              b: c(8).map_err(|_| invalid())? };
            Ok(rgb.to_color())
        }
        _ => Err(invalid()),
    }
}

/// Return the canonical `#rrggbb` spelling of `raw`.
pub fn canonical_hex(raw: &str) -> Result<String> {
    normalize(raw).map(to_hex8)
}

/// `#rrggbb`, lowercase.
pub fn to_hex8(c: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
}

/// `#RRRRGGGGBBBB`, uppercase, each byte repeated (the form MATE
/// Terminal profiles store).
pub fn to_hex16(c: Color) -> String {
    format!("#{r:02X}{r:02X}{g:02X}{g:02X}{b:02X}{b:02X}",
            r = c.r, g = c.g, b = c.b)
}

/// Relative luminance in \[0, 1\] of a gamma encoded sRGB color.
pub fn luminance(c: Color) -> f64 {
    fn linear(x: u8) -> f64 {
        let x = x as f64 / 255.;
        if x <= 0.04045 { x / 12.92 } else { ((x + 0.055) / 1.055).powf(2.4) }
    }
    0.2126 * linear(c.r) + 0.7152 * linear(c.g) + 0.0722 * linear(c.b)
}

/// Contrast ratio of two luminances, in \[1, 21\].  Symmetric.
pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
    let (hi, lo) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    (hi + 0.05) / (lo + 0.05)
}

/// Largest absolute difference over the three channels.
#[inline]
pub fn chan_diff(a: Color, b: Color) -> u8 {
    a.r.abs_diff(b.r).max(a.g.abs_diff(b.g)).max(a.b.abs_diff(b.b))
}

/// A color in the HSV model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    /// Hue in degrees, in \[0, 360\).  Zero for grays.
    pub hue: f64,
    /// Saturation in \[0, 1\].
    pub saturation: f64,
    /// Value in \[0, 1\].
    pub value: f64,
}

/// Convert `c` to HSV.
pub fn to_hsv(c: Color) -> Hsv {
    let (r, g, b) = (c.r as f64 / 255., c.g as f64 / 255., c.b as f64 / 255.);
    let mx = r.max(g).max(b);
    let mn = r.min(g).min(b);
    let d = mx - mn;
    let hue = {
        if d == 0. { 0. }
        else if mx == r { (60. * ((g - b) / d) + 360.).rem_euclid(360.) }
        else if mx == g { (60. * ((b - r) / d) + 120.).rem_euclid(360.) }
        else { (60. * ((r - g) / d) + 240.).rem_euclid(360.) }
    };
    let saturation = if mx == 0. { 0. } else { d / mx };
    Hsv { hue, saturation, value: mx }
}

impl Hsv {
    /// Back to 8-bit RGB, rounding each channel to the nearest integer.
    pub fn to_rgb(&self) -> Color {
        let c = self.value * self.saturation;
        let h = self.hue.rem_euclid(360.) / 60.;
        let x = c * (1. - (h.rem_euclid(2.) - 1.).abs());
        let (r, g, b) = {
            if h < 1. { (c, x, 0.) }
            else if h < 2. { (x, c, 0.) }
            else if h < 3. { (0., c, x) }
            else if h < 4. { (0., x, c) }
            else if h < 5. { (x, 0., c) }
            else { (c, 0., x) }
        };
        let m = self.value - c;
        let q = |v: f64| ((v + m) * 255.).round().clamp(0., 255.) as u8;
        RGB8 { r: q(r), g: q(g), b: q(b) }
    }
}

/// A terminal color scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Scheme {
    pub background: Color,
    pub foreground: Color,
    /// ANSI colors: black, red, green, yellow, blue, magenta, cyan,
    /// white, then their bright variants.
    pub palette: [Color; 16],
}

impl Scheme {
    pub fn new(background: Color, foreground: Color, palette: [Color; 16])
               -> Self {
        Scheme { background, foreground, palette }
    }

    /// Build a scheme from color strings, normalizing each of them.
    /// Fails unless `palette` holds exactly 16 colors.
    pub fn parse<S: AsRef<str>>(background: &str, foreground: &str,
                                palette: &[S]) -> Result<Self> {
        if palette.len() != 16 { return Err(Error::PaletteLength(palette.len())) }
        let mut colors = [RGB8::default(); 16];
        for (c, raw) in colors.iter_mut().zip(palette) {
            *c = normalize(raw.as_ref())?;
        }
        Ok(Scheme { background: normalize(background)?,
                    foreground: normalize(foreground)?,
                    palette: colors })
    }

    /// Background, foreground, then the palette in order.
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        [self.background, self.foreground].into_iter()
            .chain(self.palette.iter().copied())
    }

    /// Contrast ratio between the foreground and the background.
    pub fn contrast(&self) -> f64 {
        contrast_ratio(luminance(self.background), luminance(self.foreground))
    }
}

/// Map `f` over `items` on scoped threads.  The output is in input
/// order whatever the completion order.
pub(crate) fn par_map<T, U, F>(items: &[T], f: F) -> Vec<U>
where T: Sync, U: Send, F: Fn(&T) -> U + Sync {
    const MIN_CHUNK: usize = 64;
    let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
    if workers == 1 || items.len() <= MIN_CHUNK {
        return items.iter().map(&f).collect()
    }
    let chunk = items.len().div_ceil(workers).max(MIN_CHUNK);
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = items.chunks(chunk)
            .map(|c| s.spawn(move || c.iter().map(f).collect::<Vec<_>>()))
            .collect();
        handles.into_iter()
            .flat_map(|h| h.join()
                      .unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}
