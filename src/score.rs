//! Comparative scores of schemes.
//!
//! Scores only rank schemes against each other; nothing is classified
//! or rejected from them.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::info;

use crate::{chan_diff, par_map, to_hsv, Profile, Scheme};

/// Palette indices of the normal and bright red, green, yellow and
/// blue.
pub const CORE_HUES: [usize; 8] = [1, 2, 3, 4, 9, 10, 11, 12];

/// Scores of one scheme.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreRow {
    /// Foreground/background contrast ratio.
    pub contrast_ratio: f64,
    /// Mean [`chan_diff`] over the 28 pairs of [`CORE_HUES`] colors.
    /// Higher means better separated primary hues.
    pub palette_core_spread: f64,
    /// HSV saturation of the background.  Lower is usually preferred.
    pub background_saturation: f64,
}

/// Score `scheme`.
pub fn score(scheme: &Scheme) -> ScoreRow {
    let core = CORE_HUES.map(|i| scheme.palette[i]);
    let mut total = 0u32;
    let mut pairs = 0u32;
    for (i, &a) in core.iter().enumerate() {
        for &b in &core[i + 1 ..] {
            total += chan_diff(a, b) as u32;
            pairs += 1;
        }
    }
    ScoreRow {
        contrast_ratio: scheme.contrast(),
        palette_core_spread: total as f64 / pairs as f64,
        background_saturation: to_hsv(scheme.background).saturation,
    }
}

/// A score row together with the profile it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredScheme {
    pub profile_id: String,
    pub visible_name: String,
    #[serde(flatten)]
    pub score: ScoreRow,
}

/// Scores of a corpus, serialized as `{"count": n, "rows": [...]}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreReport {
    pub count: usize,
    pub rows: Vec<ScoredScheme>,
}

impl ScoreReport {
    /// Pretty printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Sort the rows by `key`, see [`rank`].
    pub fn rank(&mut self, key: ScoreKey) { rank(&mut self.rows, key) }
}

/// Score every profile, in parallel.  Rows are in input order.
pub fn score_corpus(profiles: &[Profile]) -> ScoreReport {
    let rows: Vec<ScoredScheme> = par_map(profiles, |p| ScoredScheme {
        profile_id: p.id.clone(),
        visible_name: p.visible_name.clone(),
        score: score(&p.scheme),
    });
    info!(count = rows.len(), "corpus scored");
    ScoreReport { count: rows.len(), rows }
}

/// Ranking criterion, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreKey {
    /// Highest contrast first.
    Contrast,
    /// Highest core spread first.
    Spread,
    /// Least saturated background first.
    BackgroundSaturation,
}

impl ScoreKey {
    fn compare(self, a: &ScoreRow, b: &ScoreRow) -> Ordering {
        match self {
            ScoreKey::Contrast => b.contrast_ratio.total_cmp(&a.contrast_ratio),
            ScoreKey::Spread =>
                b.palette_core_spread.total_cmp(&a.palette_core_spread),
            ScoreKey::BackgroundSaturation =>
                a.background_saturation.total_cmp(&b.background_saturation),
        }
    }
}

/// Sort `rows` best first according to `key`.  The sort is stable:
/// equal rows keep their corpus order.
pub fn rank(rows: &mut [ScoredScheme], key: ScoreKey) {
    rows.sort_by(|a, b| key.compare(&a.score, &b.score))
}
