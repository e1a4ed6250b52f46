//! Cross-corpus index: one entry per profile with its vibe and
//! fingerprint, plus tag statistics and duplicate groups.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::info;

use crate::fingerprint::{dedup, DedupTable};
use crate::{par_map, to_hex8, vibe, Fingerprint, Profile};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexEntry {
    pub profile_id: String,
    #[serde(rename = "type")]
    pub type_code: String,
    pub visible_name: String,
    pub vibe_name: String,
    pub vibe_tags: [&'static str; 4],
    /// `#rrggbb`
    pub background: String,
    pub foreground: String,
    pub palette: Vec<String>,
    pub fingerprint: Fingerprint,
    /// File the profile was read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Index of a corpus of profiles.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorpusIndex {
    pub count: usize,
    /// Number of profiles per type code.
    pub types: BTreeMap<String, usize>,
    /// Number of profiles carrying each vibe tag.
    pub tag_counts: BTreeMap<&'static str, usize>,
    /// Fingerprints shared by several profiles, largest groups first.
    /// Serialized as a JSON object keeping that order.
    #[serde(serialize_with = "ordered_map")]
    pub duplicate_fingerprints: Vec<(Fingerprint, Vec<String>)>,
    pub entries: Vec<IndexEntry>,
}

fn ordered_map<S>(groups: &[(Fingerprint, Vec<String>)], s: S)
                  -> Result<S::Ok, S::Error>
where S: Serializer {
    s.collect_map(groups.iter().map(|(fp, ids)| (fp, ids)))
}

/// `(key, count)` pairs, most common first, then by key.
fn most_common<K: Ord + Clone>(counts: &BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut v: Vec<_> = counts.iter().map(|(k, &n)| (k.clone(), n)).collect();
    v.sort_by(|a, b| b.1.cmp(&a.1));
    v
}

impl CorpusIndex {
    /// Index `profiles`, in their order.  Vibes and fingerprints are
    /// computed in parallel.
    pub fn build(profiles: &[Profile]) -> CorpusIndex {
        let vibes = par_map(profiles, |p| vibe(&p.scheme));
        let corpus: Vec<(String, _)> = profiles.iter()
            .map(|p| (p.id.clone(), p.scheme)).collect();
        let report = dedup(&mut DedupTable::new(), &corpus);

        let mut types: BTreeMap<String, usize> = BTreeMap::new();
        let mut tag_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let entries: Vec<IndexEntry> = profiles.iter().zip(vibes)
            .zip(&report.entries)
            .map(|((p, v), d)| {
                let type_code = p.type_code();
                *types.entry(type_code.clone()).or_default() += 1;
                for t in v.tags() { *tag_counts.entry(t).or_default() += 1; }
                IndexEntry {
                    profile_id: p.id.clone(),
                    type_code,
                    visible_name: p.visible_name.clone(),
                    vibe_tags: v.tags(),
                    vibe_name: v.name,
                    background: to_hex8(p.scheme.background),
                    foreground: to_hex8(p.scheme.foreground),
                    palette: p.scheme.palette.iter().map(|&c| to_hex8(c)).collect(),
                    fingerprint: d.fingerprint,
                    path: p.path.as_ref().map(|f| f.display().to_string()),
                }
            })
            .collect();
        info!(count = entries.len(), duplicates = report.groups.len(),
              "corpus indexed");
        CorpusIndex { count: entries.len(), types, tag_counts,
                      duplicate_fingerprints: report.groups, entries }
    }

    /// Pretty printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Short statistics page in Markdown.
    pub fn to_markdown(&self) -> String {
        let mut s = String::from("# mateswatch stats\n\n");
        s += &format!("- Profiles indexed: **{}**\n", self.count);
        s += &format!("- Duplicate fingerprints: **{}**\n\n",
                      self.duplicate_fingerprints.len());
        s += "## By type\n\n";
        for (t, n) in most_common(&self.types) { s += &format!("- {t}: {n}\n") }
        s += "\n## Vibe tags (global)\n\n";
        for (t, n) in most_common(&self.tag_counts) { s += &format!("- {t}: {n}\n") }
        s
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Scheme};

    fn profile(id: &str, name: &str, bg: Color) -> Profile {
        let mut palette = [Color::new(0x80, 0x80, 0x80); 16];
        palette[12] = Color::new(0x89, 0xb4, 0xfa);
        Profile { id: id.into(), visible_name: name.into(),
                  scheme: Scheme::new(bg, Color::new(0xcd, 0xd6, 0xf4), palette),
                  path: None }
    }

    fn corpus() -> Vec<Profile> {
        let dark = Color::new(0x1e, 0x1e, 0x2e);
        let black = Color::new(0, 0, 0);
        vec![profile("gogh-mocha", "Mocha", dark),
             profile("kty-night", "Night", black),
             profile("ala-mocha", "Mocha", dark),
             profile("b16-mocha", "Mocha", dark),
             profile("kon-night", "KON Night", black),
             profile("solo", "Solo", Color::new(0xfa, 0xfa, 0xfa))]
    }

    #[test]
    fn entries_and_counts() {
        let idx = CorpusIndex::build(&corpus());
        assert_eq!(idx.count, 6);
        let e = &idx.entries[0];
        assert_eq!((e.profile_id.as_str(), e.type_code.as_str()), ("gogh-mocha", "GOG"));
        assert_eq!(e.background, "#1e1e2e");
        assert_eq!(e.palette.len(), 16);
        assert_eq!(e.vibe_tags[0], "Dark");
        assert_eq!(e.fingerprint, idx.entries[2].fingerprint);
        assert_eq!(idx.types["KON"], 1);
        assert_eq!(idx.types["UNK"], 1);
        assert_eq!(idx.tag_counts["Dark"], 5);
        assert_eq!(idx.tag_counts["Light"], 1);
    }

    #[test]
    fn duplicate_groups_largest_first() {
        let idx = CorpusIndex::build(&corpus());
        let groups: Vec<_> = idx.duplicate_fingerprints.iter()
            .map(|(_, ids)| ids.clone()).collect();
        assert_eq!(groups, [vec!["gogh-mocha", "ala-mocha", "b16-mocha"],
                            vec!["kty-night", "kon-night"]]);
    }

    #[test]
    fn json_keeps_group_order() {
        let idx = CorpusIndex::build(&corpus());
        let json = idx.to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["count"], 6);
        assert_eq!(v["entries"][1]["type"], "KTY");
        assert_eq!(v["entries"][0]["fingerprint"].as_str().unwrap().len(), 40);
        let first = idx.duplicate_fingerprints[0].0.to_string();
        let second = idx.duplicate_fingerprints[1].0.to_string();
        assert!(json.find(&first).unwrap() < json.find(&second).unwrap());
        assert_eq!(v["duplicate_fingerprints"][&first].as_array().unwrap().len(), 3);
    }

    #[test]
    fn entry_paths() {
        let mut profiles = corpus();
        profiles[0] = profiles[0].clone().with_path("schemes/gogh/gogh-mocha.dconf");
        let idx = CorpusIndex::build(&profiles);
        assert_eq!(idx.entries[0].path.as_deref(), Some("schemes/gogh/gogh-mocha.dconf"));
        let v: serde_json::Value = serde_json::from_str(&idx.to_json().unwrap()).unwrap();
        assert_eq!(v["entries"][0]["path"], "schemes/gogh/gogh-mocha.dconf");
        assert!(v["entries"][1].get("path").is_none());
    }

    #[test]
    fn markdown_stats() {
        let md = CorpusIndex::build(&corpus()).to_markdown();
        assert!(md.starts_with("# mateswatch stats\n\n- Profiles indexed: **6**\n"));
        assert!(md.contains("- Duplicate fingerprints: **2**\n"));
        assert!(md.contains("## Vibe tags (global)\n\n- Cool: 6\n"));
    }
}
