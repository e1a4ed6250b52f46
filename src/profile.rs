//! MATE Terminal profiles as dconf text.
//!
//! A profile is the key file block `dconf dump` prints for one
//! profile directory:
//!
//! ```text
//! [/]
//! visible-name='GOG Neon Azure — Dark·HighC·Muted·Cool — Catppuccin Mocha'
//! use-theme-colors=false
//! foreground-color='#CDCDD6D6F4F4'
//! …
//! palette='#45454747…:…'
//! ```

use std::path::PathBuf;

use tracing::debug;

use crate::{to_hex16, to_hex8, Error, Result, Scheme, Vibe};

/// Type codes derived from the profile id prefix.
const ID_PREFIXES: [(&str, &str); 7] = [
    ("gogh-", "GOG"), ("kty-", "KTY"), ("ala-", "ALA"), ("b16-", "B16"),
    ("b24-", "B24"), ("wzt-", "WZT"), ("kon-", "KON")];

/// A named scheme read from, or written to, a dconf block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Profile directory name, e.g. `gogh-catppuccin-mocha`.
    pub id: String,
    pub visible_name: String,
    pub scheme: Scheme,
    /// File the profile was read from, if any.
    pub path: Option<PathBuf>,
}

/// A departure of a dconf block from the form [`to_dconf`] writes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Issue {
    #[error("missing leading [/]")]
    MissingHeader,
    #[error("missing visible-name")]
    MissingVisibleName,
    #[error("use-theme-colors must be false (got {})", repr(.0))]
    ThemeColors(Option<String>),
    #[error("{key} must be 16-bit quoted hex (got {})", repr(.got))]
    NotHex16 { key: &'static str, got: Option<String> },
    #[error("{key} must be 8-bit quoted hex (got {})", repr(.got))]
    NotHex8 { key: &'static str, got: Option<String> },
    #[error("missing palette")]
    MissingPalette,
    #[error("palette must contain 16 colors (got {0})")]
    PaletteLength(usize),
    #[error("palette color not 16-bit hex: '{0}'")]
    PaletteEntry(String),
}

fn repr(v: &Option<String>) -> String {
    v.as_ref().map_or_else(|| "nothing".to_string(), |s| format!("'{s}'"))
}

/// Single quote `s` for dconf, escaping backslashes and quotes.
pub fn dconf_quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Inverse of [`dconf_quote`].  Values that are not quoted are
/// returned as they are.
fn dconf_unquote(s: &str) -> String {
    let Some(inner) = s.strip_prefix('\'').and_then(|s| s.strip_suffix('\''))
    else { return s.to_string() };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

/// `key=value` lines of a dconf block, values untouched.  Section
/// headers, blank lines and lines without `=` are skipped.
fn key_values(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.lines()
        .filter(|l| !l.is_empty() && !l.starts_with('['))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
}

/// Whether `s` is `#` followed by `digits` hex digits, all uppercase
/// or all lowercase.
fn is_hex(s: &str, digits: usize, upper: bool) -> bool {
    s.strip_prefix('#').is_some_and(|h| {
        h.len() == digits && h.bytes().all(|b| {
            b.is_ascii_digit() || if upper { (b'A' ..= b'F').contains(&b) }
                                  else { (b'a' ..= b'f').contains(&b) }
        })
    })
}

fn quoted(v: &str) -> Option<&str> {
    v.strip_prefix('\'').and_then(|v| v.strip_suffix('\''))
}

/// Check that `text` is a profile block in the exact form [`to_dconf`]
/// writes: leading `[/]`, a visible name, `use-theme-colors=false`,
/// quoted `#RRRRGGGGBBBB` uppercase foreground and background, quoted
/// `#rrggbb` lowercase cursor, and a quoted palette of 16 uppercase
/// 16-bit colors.  An empty result means the block is valid.
pub fn validate(text: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    if !text.starts_with("[/]\n") && text.trim() != "[/]" {
        issues.push(Issue::MissingHeader)
    }
    let mut get = std::collections::HashMap::new();
    for (k, v) in key_values(text) { get.insert(k, v); }
    let value = |k: &str| get.get(k).map(|v| v.to_string());

    if !get.contains_key("visible-name") { issues.push(Issue::MissingVisibleName) }
    if get.get("use-theme-colors") != Some(&"false") {
        issues.push(Issue::ThemeColors(value("use-theme-colors")))
    }
    for key in ["foreground-color", "background-color"] {
        if !get.get(key).and_then(|v| quoted(v)).is_some_and(|v| is_hex(v, 12, true)) {
            issues.push(Issue::NotHex16 { key, got: value(key) })
        }
    }
    let key = "cursor-color";
    if !get.get(key).and_then(|v| quoted(v)).is_some_and(|v| is_hex(v, 6, false)) {
        issues.push(Issue::NotHex8 { key, got: value(key) })
    }
    match get.get("palette") {
        None => issues.push(Issue::MissingPalette),
        Some(p) => {
            let parts: Vec<&str> = quoted(p).map_or(Vec::new(), |p| p.split(':').collect());
            if parts.len() != 16 {
                issues.push(Issue::PaletteLength(parts.len()))
            } else if let Some(bad) = parts.iter().find(|c| !is_hex(c, 12, true)) {
                issues.push(Issue::PaletteEntry(bad.to_string()))
            }
        }
    }
    issues
}

/// The name shown in the terminal's profile menu:
/// `"{TYPE} {vibe name} — {tag}·{tag}·{tag}·{tag} — {original}"`.
/// Existing profiles are matched on this exact form.
pub fn visible_name(type_code: &str, vibe: &Vibe, original: &str) -> String {
    format!("{} {} — {} — {}", type_code.to_uppercase(), vibe.name,
            vibe.tags().join("·"), original)
}

/// The dconf block of a profile showing `scheme` under `visible_name`.
/// The cursor color is the foreground, written with 8 bits per channel.
pub fn to_dconf(visible_name: &str, scheme: &Scheme) -> String {
    let fg16 = to_hex16(scheme.foreground);
    let palette: Vec<String> = scheme.palette.iter().map(|&c| to_hex16(c))
        .collect();
    [
        "[/]".to_string(),
        format!("visible-name={}", dconf_quote(visible_name)),
        "use-theme-colors=false".to_string(),
        format!("foreground-color={}", dconf_quote(&fg16)),
        format!("background-color={}", dconf_quote(&to_hex16(scheme.background))),
        "bold-color-same-as-fg=true".to_string(),
        format!("bold-color={}", dconf_quote(&fg16)),
        format!("cursor-color={}", dconf_quote(&to_hex8(scheme.foreground))),
        format!("palette={}", dconf_quote(&palette.join(":"))),
        String::new(),
    ].join("\n")
}

impl Profile {
    /// Read the profile `id` from its dconf block.
    ///
    /// Section headers, blank lines and lines without `=` are skipped.
    /// The visible name defaults to `id`.
    pub fn parse(id: &str, text: &str) -> Result<Profile> {
        let mut visible_name = None;
        let (mut bg, mut fg, mut palette) = (None, None, None);
        for (k, v) in key_values(text) {
            let v = dconf_unquote(v);
            match k {
                "visible-name" => visible_name = Some(v),
                "background-color" => bg = Some(v),
                "foreground-color" => fg = Some(v),
                "palette" => palette = Some(v),
                _ => (),
            }
        }
        let bg = bg.ok_or(Error::MissingKey("background-color"))?;
        let fg = fg.ok_or(Error::MissingKey("foreground-color"))?;
        let palette = palette.ok_or(Error::MissingKey("palette"))?;
        let palette: Vec<&str> = palette.split(':').collect();
        let scheme = Scheme::parse(&bg, &fg, &palette)?;
        debug!(id, "profile parsed");
        Ok(Profile { id: id.to_string(),
                     visible_name: visible_name.unwrap_or_else(|| id.to_string()),
                     scheme, path: None })
    }

    /// Record the file the profile comes from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Source type of the profile: the three letter prefix of its
    /// visible name if it has one, else a code derived from the id
    /// (`UNK` when nothing matches).
    pub fn type_code(&self) -> String {
        let v = self.visible_name.trim();
        let mut chars = v.chars();
        let head: String = chars.by_ref().take(3).collect();
        if head.chars().count() == 3 && head.chars().all(char::is_alphabetic)
            && chars.next() == Some(' ') {
            return head.to_uppercase()
        }
        if let Some((_, code)) = ID_PREFIXES.iter()
            .find(|(p, _)| self.id.starts_with(p)) {
            return code.to_string()
        }
        if self.id.eq_ignore_ascii_case("atom") { "MSW".into() } else { "UNK".into() }
    }

    /// The dconf block of this profile.
    pub fn to_dconf(&self) -> String { to_dconf(&self.visible_name, &self.scheme) }
}
