use std::fmt;

/// Whether a scheme is meant to be read on a dark or a light background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum BackgroundKind {
    Dark,
    Light,
}

/// Foreground/background contrast band (WCAG AAA and AA breakpoints).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContrastBand {
    /// Ratio ≥ 7.
    High,
    /// Ratio ≥ 4.5.
    Medium,
    Low,
}

/// How saturated the accent color is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vividness {
    Vivid,
    /// Only on light backgrounds.
    Pastel,
    Muted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Temperature {
    Warm,
    Cool,
    Neutral,
}

/// Name of the accent hue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HueFamily {
    Crimson,
    Amber,
    Lime,
    Jade,
    Cyan,
    Azure,
    Indigo,
    Orchid,
    Rose,
}

/// Adjective of a vibe name, from the background kind and the
/// brightness of the accent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mood {
    Nocturne,
    Neon,
    Dawn,
    Daylight,
}

impl BackgroundKind {
    pub fn as_str(self) -> &'static str {
        match self { BackgroundKind::Dark => "Dark", BackgroundKind::Light => "Light" }
    }
}

impl ContrastBand {
    pub fn as_str(self) -> &'static str {
        match self {
            ContrastBand::High => "HighC",
            ContrastBand::Medium => "MedC",
            ContrastBand::Low => "LowC",
        }
    }
}

impl Vividness {
    pub fn as_str(self) -> &'static str {
        match self {
            Vividness::Vivid => "Vivid",
            Vividness::Pastel => "Pastel",
            Vividness::Muted => "Muted",
        }
    }
}

impl Temperature {
    pub fn as_str(self) -> &'static str {
        match self {
            Temperature::Warm => "Warm",
            Temperature::Cool => "Cool",
            Temperature::Neutral => "Neutral",
        }
    }
}

impl HueFamily {
    pub fn as_str(self) -> &'static str {
        use HueFamily::*;
        match self {
            Crimson => "Crimson", Amber => "Amber", Lime => "Lime",
            Jade => "Jade", Cyan => "Cyan", Azure => "Azure",
            Indigo => "Indigo", Orchid => "Orchid", Rose => "Rose",
        }
    }
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Nocturne => "Nocturne",
            Mood::Neon => "Neon",
            Mood::Dawn => "Dawn",
            Mood::Daylight => "Daylight",
        }
    }
}

macro_rules! display_as_str {
    ($($t: ty),*) => {
        $( impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        } )*
    }
}
display_as_str!(BackgroundKind, ContrastBand, Vividness, Temperature,
                HueFamily, Mood);
