//! Content fingerprints of schemes.
//!
//! Two schemes with the same colors have the same [`Fingerprint`],
//! whatever their names, their origin, or whether their colors were
//! written with 8 or 16 bits per channel.  A [`DedupTable`] maps each
//! fingerprint to the first scheme seen with it.

use std::collections::hash_map::{Entry, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};

use crate::{par_map, to_hex16, Scheme};

/// SHA-1 digest of the canonical text of a scheme.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 20] { &self.0 }

    /// The first `n` hex digits (at most 40).
    pub fn short(&self, n: usize) -> String {
        let mut s = self.to_string();
        s.truncate(n);
        s
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 { write!(f, "{b:02x}")?; }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Text hashed for a scheme: background, foreground and the 16
/// palette colors, each as `#RRRRGGGGBBBB`, one per line, no final
/// newline.
fn canonical_text(scheme: &Scheme) -> String {
    scheme.colors().map(to_hex16).collect::<Vec<_>>().join("\n")
}

/// Fingerprint of `scheme`.
pub fn fingerprint(scheme: &Scheme) -> Fingerprint {
    let mut h = Sha1::new();
    h.update(canonical_text(scheme).as_bytes());
    let mut out = [0; 20];
    out.copy_from_slice(&h.finalize());
    Fingerprint(out)
}

/// Fingerprints of all `schemes`, computed in parallel, in input order.
pub fn fingerprint_all(schemes: &[Scheme]) -> Vec<Fingerprint> {
    par_map(schemes, fingerprint)
}

/// First-seen table of fingerprints.
///
/// It lives for one batch: create it, feed it with [`dedup`] (possibly
/// several times, e.g. one corpus after another) and drop it.
#[derive(Debug, Clone)]
pub struct DedupTable<Id> {
    first_seen: HashMap<Fingerprint, Id>,
}

impl<Id> Default for DedupTable<Id> {
    fn default() -> Self { DedupTable { first_seen: HashMap::new() } }
}

impl<Id: Clone> DedupTable<Id> {
    pub fn new() -> Self { Self::default() }

    /// Record `id` under `fp` unless `fp` was seen before, in which
    /// case the id it was first seen with is returned.
    pub fn observe(&mut self, id: Id, fp: Fingerprint) -> Option<Id> {
        match self.first_seen.entry(fp) {
            Entry::Occupied(e) => Some(e.get().clone()),
            Entry::Vacant(e) => { e.insert(id); None }
        }
    }

    /// The id `fp` was first seen with.
    pub fn first_seen(&self, fp: &Fingerprint) -> Option<&Id> {
        self.first_seen.get(fp)
    }

    pub fn len(&self) -> usize { self.first_seen.len() }

    pub fn is_empty(&self) -> bool { self.first_seen.is_empty() }
}

/// Outcome of deduplicating one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupEntry<Id> {
    pub id: Id,
    pub fingerprint: Fingerprint,
    /// The first entry with the same fingerprint, if any.
    pub duplicate_of: Option<Id>,
}

/// Result of [`dedup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupReport<Id> {
    /// One item per input entry, in input order.
    pub entries: Vec<DedupEntry<Id>>,
    /// Fingerprints shared by several entries of the batch, with
    /// their ids in input order.  Larger groups come first; groups of
    /// equal size keep the order of their first member.
    pub groups: Vec<(Fingerprint, Vec<Id>)>,
}

impl<Id> DedupReport<Id> {
    /// Number of entries that duplicate an earlier one.
    pub fn duplicates(&self) -> usize {
        self.entries.iter().filter(|e| e.duplicate_of.is_some()).count()
    }
}

/// Deduplicate `corpus` against `table`.
///
/// Fingerprints are computed in parallel but “duplicate of” links are
/// assigned in corpus order, so the same corpus always gives the same
/// report.
pub fn dedup<Id>(table: &mut DedupTable<Id>, corpus: &[(Id, Scheme)])
                 -> DedupReport<Id>
where Id: Clone + Sync {
    let fps = par_map(corpus, |(_, s)| fingerprint(s));
    let mut groups: Vec<(Fingerprint, Vec<Id>)> = Vec::new();
    let mut group_of: HashMap<Fingerprint, usize> = HashMap::new();
    let entries = corpus.iter().zip(fps)
        .map(|((id, _), fp)| {
            let g = *group_of.entry(fp).or_insert_with(|| {
                groups.push((fp, Vec::new()));
                groups.len() - 1 });
            groups[g].1.push(id.clone());
            DedupEntry { id: id.clone(), fingerprint: fp,
                         duplicate_of: table.observe(id.clone(), fp) }
        })
        .collect();
    groups.retain(|(_, ids)| ids.len() > 1);
    // Stable: equal sizes stay in order of first appearance.
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    DedupReport { entries, groups }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize, Color};
    use proptest::prelude::*;

    const PALETTE: [&str; 16] = [
        "#45475a", "#f38ba8", "#a6e3a1", "#f9e2af", "#89b4fa", "#f5c2e7",
        "#94e2d5", "#bac2de", "#585b70", "#f38ba8", "#a6e3a1", "#f9e2af",
        "#89b4fa", "#f5c2e7", "#94e2d5", "#a6adc8"];

    fn mocha() -> Scheme {
        Scheme::parse("#1e1e2e", "#cdd6f4", &PALETTE).unwrap()
    }

    #[test]
    fn canonical_text_layout() {
        let t = canonical_text(&mocha());
        let lines: Vec<_> = t.lines().collect();
        assert_eq!(lines.len(), 18);
        assert_eq!(lines[0], "#1E1E1E1E2E2E");
        assert_eq!(lines[1], "#CDCDD6D6F4F4");
        assert_eq!(lines[6], "#8989B4B4FAFA");
        assert!(!t.ends_with('\n'));
    }

    #[test]
    fn digest_is_sha1_hex() {
        let fp = fingerprint(&mocha());
        let s = fp.to_string();
        assert_eq!(s.len(), 40);
        assert!(s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert_eq!(fp.short(8), s[.. 8]);
        assert_eq!(serde_json::to_string(&fp).unwrap(), format!("\"{s}\""));
    }

    #[test]
    fn sha1_of_known_text() {
        // Digest of the empty string; checks the hex rendering.
        let mut h = Sha1::new();
        h.update(b"");
        let mut out = [0; 20];
        out.copy_from_slice(&h.finalize());
        assert_eq!(Fingerprint(out).to_string(),
                   "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn sixteen_bit_background_fingerprints_identically() {
        let wide: Vec<String> = PALETTE.iter()
            .map(|c| crate::to_hex16(normalize(c).unwrap())).collect();
        let a = mocha();
        let b = Scheme::parse("#1E1E1E1E2E2E", "#CDCDD6D6F4F4", &wide).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn any_color_change_changes_the_fingerprint() {
        let a = mocha();
        let mut b = a;
        b.palette[15].b ^= 1;
        assert_ne!(fingerprint(&a), fingerprint(&b));
        let mut c = a;
        std::mem::swap(&mut c.background, &mut c.foreground);
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn first_seen_wins() {
        let a = mocha();
        let mut b = a;
        b.background = Color::new(0, 0, 0);
        let corpus = vec![("gogh-mocha", a), ("kty-other", b),
                          ("ala-mocha", a), ("b16-mocha", a),
                          ("kty-other-copy", b)];
        let mut table = DedupTable::new();
        let report = dedup(&mut table, &corpus);
        let dups: Vec<_> = report.entries.iter().map(|e| e.duplicate_of).collect();
        assert_eq!(dups, [None, None, Some("gogh-mocha"), Some("gogh-mocha"),
                          Some("kty-other")]);
        assert_eq!(report.duplicates(), 3);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].1, ["gogh-mocha", "ala-mocha", "b16-mocha"]);
        assert_eq!(report.groups[1].1, ["kty-other", "kty-other-copy"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn table_carries_over_batches() {
        let a = mocha();
        let mut table = DedupTable::new();
        dedup(&mut table, &[(1, a)]);
        let report = dedup(&mut table, &[(2, a)]);
        assert_eq!(report.entries[0].duplicate_of, Some(1));
        // Groups only cover the current batch.
        assert!(report.groups.is_empty());
        assert_eq!(table.first_seen(&fingerprint(&a)), Some(&1));
    }

    #[test]
    fn parallel_dedup_matches_sequential_order() {
        let mut corpus = Vec::new();
        for i in 0 .. 500u32 {
            let mut s = mocha();
            s.background = Color::new((i % 7) as u8, 0, 0);
            corpus.push((i, s));
        }
        let report = dedup(&mut DedupTable::new(), &corpus);
        for e in &report.entries {
            let expected = if e.id < 7 { None } else { Some(e.id % 7) };
            assert_eq!(e.duplicate_of, expected);
        }
        let schemes: Vec<_> = corpus.iter().map(|(_, s)| *s).collect();
        let fps = fingerprint_all(&schemes);
        assert!(report.entries.iter().zip(&fps).all(|(e, fp)| e.fingerprint == *fp));
    }

    proptest! {
        #[test]
        fn encoding_width_does_not_matter(raw in any::<[[u8; 3]; 18]>()) {
            let hex8: Vec<String> = raw.iter()
                .map(|[r, g, b]| format!("#{r:02x}{g:02x}{b:02x}")).collect();
            let hex16: Vec<String> = raw.iter()
                .map(|[r, g, b]| format!("#{r:02X}{r:02X}{g:02X}{g:02X}{b:02X}{b:02X}"))
                .collect();
            let a = Scheme::parse(&hex8[0], &hex8[1], &hex8[2 ..]).unwrap();
            let b = Scheme::parse(&hex16[0], &hex16[1], &hex16[2 ..]).unwrap();
            prop_assert_eq!(fingerprint(&a), fingerprint(&b));
        }
    }
}
