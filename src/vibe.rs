//! Descriptive names and tags (“vibes”) for schemes.
//!
//! A [`Vibe`] is a pure function of a [`Scheme`].  The thresholds and
//! tables below are frozen: changing any of them renames existing
//! profiles.

use crate::{contrast_ratio, luminance, to_hsv, Color, Hsv, Scheme};

mod ty;
pub use ty::{BackgroundKind, ContrastBand, HueFamily, Mood, Temperature,
             Vividness};

/// Backgrounds darker than this luminance are dark.
pub const DARK_THRESHOLD: f64 = 0.35;

/// Palette slots searched for the accent color, in tie-break order:
/// bright blue, bright cyan, blue, cyan, bright red, bright magenta,
/// bright green, bright yellow.
pub const ACCENT_CANDIDATES: [usize; 8] = [12, 14, 4, 6, 9, 13, 10, 11];

/// Upper bound (exclusive) of each hue bucket, in degrees.  Hues at
/// or above the last bound wrap around to crimson.
const HUE_FAMILIES: [(f64, HueFamily); 9] = [
    (20., HueFamily::Crimson),
    (55., HueFamily::Amber),
    (95., HueFamily::Lime),
    (145., HueFamily::Jade),
    (195., HueFamily::Cyan),
    (225., HueFamily::Azure),
    (265., HueFamily::Indigo),
    (305., HueFamily::Orchid),
    (340., HueFamily::Rose),
];

/// Label of a scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vibe {
    /// “{mood} {hue family}”, e.g. “Nocturne Azure”.
    pub name: String,
    pub background_kind: BackgroundKind,
    pub contrast: ContrastBand,
    pub vividness: Vividness,
    pub temperature: Temperature,
    pub hue_family: HueFamily,
    pub mood: Mood,
}

impl Vibe {
    /// Tags in their fixed order: lightness, contrast band,
    /// vividness, temperature.
    pub fn tags(&self) -> [&'static str; 4] {
        [self.background_kind.as_str(), self.contrast.as_str(),
         self.vividness.as_str(), self.temperature.as_str()]
    }
}

impl BackgroundKind {
    pub fn of_luminance(l: f64) -> Self {
        if l < DARK_THRESHOLD { BackgroundKind::Dark } else { BackgroundKind::Light }
    }
}

impl ContrastBand {
    pub fn of_ratio(ratio: f64) -> Self {
        if ratio >= 7. { ContrastBand::High }
        else if ratio >= 4.5 { ContrastBand::Medium }
        else { ContrastBand::Low }
    }
}

impl Vividness {
    pub fn of(saturation: f64, bg: BackgroundKind) -> Self {
        if saturation >= 0.65 { Vividness::Vivid }
        else if saturation >= 0.40 && bg == BackgroundKind::Light { Vividness::Pastel }
        else { Vividness::Muted }
    }
}

impl Temperature {
    pub fn of_hue(hue: f64) -> Self {
        if hue < 70. || hue >= 290. { Temperature::Warm }
        else if (160. ..= 260.).contains(&hue) { Temperature::Cool }
        else { Temperature::Neutral }
    }
}

impl HueFamily {
    pub fn of_hue(hue: f64) -> Self {
        HUE_FAMILIES.iter().find(|(bound, _)| hue < *bound)
            .map_or(HueFamily::Crimson, |&(_, f)| f)
    }
}

impl Mood {
    pub fn of(bg: BackgroundKind, value: f64) -> Self {
        match (bg, value < 0.8) {
            (BackgroundKind::Dark, true) => Mood::Nocturne,
            (BackgroundKind::Dark, false) => Mood::Neon,
            (BackgroundKind::Light, true) => Mood::Dawn,
            (BackgroundKind::Light, false) => Mood::Daylight,
        }
    }
}

/// The most saturated of the accent candidates present in `palette`
/// (the whole palette if none is).  The first one wins on ties.
pub fn accent(palette: &[Color]) -> Option<Color> {
    let candidates: Vec<Color> = ACCENT_CANDIDATES.iter()
        .filter_map(|&i| palette.get(i).copied()).collect();
    let candidates = if candidates.is_empty() { palette } else { &candidates };
    let mut best = *candidates.first()?;
    let mut best_s = -1.;
    for &c in candidates {
        let s = to_hsv(c).saturation;
        if s > best_s { best = c; best_s = s; }
    }
    Some(best)
}

/// Compute the vibe of `scheme`.
///
/// # Example
///
/// ```
/// use scheme_swatch::{vibe, Scheme};
/// let mut palette = ["#45475a"; 16];
/// palette[12] = "#89b4fa";
/// let s = Scheme::parse("#1e1e2e", "#cdd6f4", &palette)?;
/// let v = vibe(&s);
/// assert_eq!(v.tags()[0], "Dark");
/// assert_eq!(v.tags()[3], "Cool");
/// # Ok::<(), scheme_swatch::Error>(())
/// ```
pub fn vibe(scheme: &Scheme) -> Vibe {
    let bg_l = luminance(scheme.background);
    let fg_l = luminance(scheme.foreground);
    let background_kind = BackgroundKind::of_luminance(bg_l);
    // A 16-entry palette always has candidates.
    let accent = accent(&scheme.palette).unwrap_or(scheme.foreground);
    let Hsv { hue, saturation, value } = to_hsv(accent);
    let hue_family = HueFamily::of_hue(hue);
    let mood = Mood::of(background_kind, value);
    Vibe {
        name: format!("{mood} {hue_family}"),
        background_kind,
        contrast: ContrastBand::of_ratio(contrast_ratio(bg_l, fg_l)),
        vividness: Vividness::of(saturation, background_kind),
        temperature: Temperature::of_hue(hue),
        hue_family,
        mood,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;

    fn c(s: &str) -> Color { normalize(s).unwrap() }

    fn scheme(bg: &str, fg: &str, accents: &[(usize, &str)]) -> Scheme {
        let mut palette = ["#808080"; 16];
        for &(i, a) in accents { palette[i] = a; }
        Scheme::parse(bg, fg, &palette).unwrap()
    }

    #[test]
    fn catppuccin_mocha_is_dark_and_cool() {
        let s = scheme("#1e1e2e", "#cdd6f4", &[(12, "#89b4fa")]);
        let v = vibe(&s);
        assert_eq!(v.background_kind, BackgroundKind::Dark);
        // #89b4fa: hue ≈ 217°, saturation ≈ 0.45, value ≈ 0.98.
        assert_eq!(v.tags(), ["Dark", "HighC", "Muted", "Cool"]);
        assert_eq!(v.name, "Neon Azure");
        assert_eq!(vibe(&s), v);
    }

    #[test]
    fn black_and_white_is_high_contrast() {
        let s = scheme("#000000", "#ffffff", &[]);
        let v = vibe(&s);
        assert_eq!(v.contrast, ContrastBand::High);
        // All-gray palette: achromatic accent, hue 0.
        assert_eq!(v.tags(), ["Dark", "HighC", "Muted", "Warm"]);
        assert_eq!(v.hue_family, HueFamily::Crimson);
    }

    #[test]
    fn pastel_needs_a_light_background() {
        // Saturation 0.5.
        let dark = scheme("#101010", "#d0d0d0", &[(12, "#8080ff")]);
        assert_eq!(vibe(&dark).vividness, Vividness::Muted);
        let light = scheme("#fafafa", "#303030", &[(12, "#8080ff")]);
        assert_eq!(vibe(&light).vividness, Vividness::Pastel);
        assert_eq!(vibe(&light).background_kind, BackgroundKind::Light);
        // Saturation 0.70 on a dark background.
        let vivid = scheme("#101010", "#d0d0d0", &[(12, "#4d4dff")]);
        assert!((to_hsv(c("#4d4dff")).saturation - 0.698).abs() < 0.01);
        assert_eq!(vibe(&vivid).vividness, Vividness::Vivid);
    }

    #[test]
    fn accent_prefers_candidates_in_order() {
        // Equal saturation at 12 and 14: 12 comes first.
        let s = scheme("#000000", "#ffffff", &[(12, "#0000ff"), (14, "#00ffff")]);
        assert_eq!(accent(&s.palette), Some(c("#0000ff")));
        // Red at index 1 is not a candidate, even if more saturated.
        let s = scheme("#000000", "#ffffff", &[(1, "#ff0000"), (4, "#4040c0")]);
        assert_eq!(accent(&s.palette), Some(c("#4040c0")));
        // Later candidate wins when strictly more saturated.
        let s = scheme("#000000", "#ffffff", &[(12, "#8080ff"), (11, "#ffff00")]);
        assert_eq!(accent(&s.palette), Some(c("#ffff00")));
    }

    #[test]
    fn accent_falls_back_to_whole_palette() {
        let short = [c("#202020"), c("#ff0000"), c("#00ff00")];
        assert_eq!(accent(&short), Some(c("#ff0000")));
        assert_eq!(accent(&[]), None);
    }

    #[test]
    fn hue_family_bounds() {
        let cases = [(0., HueFamily::Crimson), (19.9, HueFamily::Crimson),
                     (20., HueFamily::Amber), (55., HueFamily::Lime),
                     (95., HueFamily::Jade), (145., HueFamily::Cyan),
                     (195., HueFamily::Azure), (225., HueFamily::Indigo),
                     (265., HueFamily::Orchid), (305., HueFamily::Rose),
                     (339.9, HueFamily::Rose), (340., HueFamily::Crimson),
                     (359.9, HueFamily::Crimson)];
        for (h, f) in cases { assert_eq!(HueFamily::of_hue(h), f, "hue {h}"); }
    }

    #[test]
    fn temperature_bounds() {
        use Temperature::*;
        for (h, t) in [(0., Warm), (69.9, Warm), (70., Neutral), (159.9, Neutral),
                       (160., Cool), (260., Cool), (260.1, Neutral),
                       (289.9, Neutral), (290., Warm)] {
            assert_eq!(Temperature::of_hue(h), t, "hue {h}");
        }
    }

    #[test]
    fn contrast_bands() {
        assert_eq!(ContrastBand::of_ratio(7.), ContrastBand::High);
        assert_eq!(ContrastBand::of_ratio(6.99), ContrastBand::Medium);
        assert_eq!(ContrastBand::of_ratio(4.5), ContrastBand::Medium);
        assert_eq!(ContrastBand::of_ratio(4.49), ContrastBand::Low);
    }

    #[test]
    fn moods() {
        let light = scheme("#ffffff", "#000000", &[(12, "#0000aa")]);
        assert_eq!(vibe(&light).name, "Dawn Indigo");
        let light = scheme("#ffffff", "#000000", &[(12, "#ff8000")]);
        assert_eq!(vibe(&light).name, "Daylight Amber");
        let dark = scheme("#000000", "#ffffff", &[(12, "#00aa00")]);
        assert_eq!(vibe(&dark).name, "Nocturne Jade");
    }

    #[test]
    fn dark_threshold() {
        assert_eq!(BackgroundKind::of_luminance(0.3499), BackgroundKind::Dark);
        assert_eq!(BackgroundKind::of_luminance(0.35), BackgroundKind::Light);
    }
}
