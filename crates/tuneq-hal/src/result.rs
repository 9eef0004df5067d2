//! Measurement count distributions.
//!
//! Bitstring ordering: the rightmost bit corresponds to the
//! lowest-indexed classical bit (OpenQASM 3 convention). For example,
//! the string `"01"` means bit 0 read `1` and bit 1 read `0`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Measurement counts from circuit execution.
///
/// Maps bitstrings to occurrence counts. A bitstring may be present with a
/// count of zero; corrected distributions list every basis state this way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from an iterator of (bitstring, count) pairs.
    /// Duplicate bitstrings are accumulated (summed), consistent with `insert()`.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Turn a probability distribution into integer counts summing exactly to
    /// `shots`.
    ///
    /// Each entry receives `floor(p * shots)`; the leftover shots go one
    /// each to the entries with the largest fractional parts, earlier entries
    /// first on ties. Probabilities are expected to be non-negative and to sum
    /// to one; negative or non-finite entries are treated as zero. Every key
    /// from the input appears in the output, including those that receive
    /// zero shots.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_distribution(
        probabilities: impl IntoIterator<Item = (impl Into<String>, f64)>,
        shots: u64,
    ) -> Self {
        let entries: Vec<(String, f64)> = probabilities
            .into_iter()
            .map(|(k, p)| (k.into(), if p.is_finite() && p > 0.0 { p } else { 0.0 }))
            .collect();

        let total = shots as f64;
        let mut floors: Vec<u64> = Vec::with_capacity(entries.len());
        let mut remainders: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (idx, (_, p)) in entries.iter().enumerate() {
            let scaled = p * total;
            let floor = scaled.floor();
            floors.push((floor as u64).min(shots));
            remainders.push((idx, scaled - floor));
        }

        let assigned: u64 = floors.iter().sum();
        let mut leftover = shots.saturating_sub(assigned);

        // Stable sort keeps lower indices first among equal remainders.
        remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let mut cursor = remainders.iter().cycle();
        while leftover > 0 && !entries.is_empty() {
            if let Some(&(idx, _)) = cursor.next() {
                floors[idx] += 1;
                leftover -= 1;
            }
        }

        let mut counts = Self::new();
        for ((key, _), count) in entries.into_iter().zip(floors) {
            counts.insert(key, count);
        }
        counts
    }

    /// Insert a count for a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        let key = bitstring.into();
        *self.counts.entry(key).or_default() += count;
    }

    /// Get the count for a bitstring.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Get the total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get the most frequent bitstring.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.counts.iter().max_by_key(|&(_, count)| count)
    }

    /// Get probabilities for each bitstring.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        let total = self.total_shots() as f64;
        if total == 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total))
            .collect()
    }

    /// Get sorted counts (by count descending, then bitstring ascending).
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Width shared by every bitstring key, if the keys agree.
    ///
    /// Returns `None` for empty counts or mixed-width keys.
    pub fn bitstring_width(&self) -> Option<usize> {
        let mut widths = self.counts.keys().map(String::len);
        let first = widths.next()?;
        widths.all(|w| w == first).then_some(first)
    }

    /// Get the number of unique bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, value) in iter {
            counts.insert(key, value);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_basic() {
        let mut counts = Counts::new();
        counts.insert("00", 500);
        counts.insert("11", 500);

        assert_eq!(counts.get("00"), 500);
        assert_eq!(counts.get("11"), 500);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total_shots(), 1000);
    }

    #[test]
    fn test_insert_accumulates() {
        let counts = Counts::from_pairs([("0", 3), ("0", 4), ("1", 1)]);
        assert_eq!(counts.get("0"), 7);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_counts_probabilities() {
        let counts = Counts::from_pairs([("00", 300), ("01", 200), ("10", 300), ("11", 200)]);

        let probs = counts.probabilities();
        assert!((probs["00"] - 0.3).abs() < 1e-10);
        assert!((probs["01"] - 0.2).abs() < 1e-10);
    }

    #[test]
    fn test_sorted_breaks_ties_by_key() {
        let counts = Counts::from_pairs([("11", 5), ("00", 5), ("01", 9)]);
        let sorted: Vec<_> = counts.sorted().into_iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(sorted, vec!["01", "00", "11"]);
    }

    #[test]
    fn test_bitstring_width() {
        assert_eq!(Counts::new().bitstring_width(), None);
        assert_eq!(Counts::from_pairs([("010", 1), ("111", 2)]).bitstring_width(), Some(3));
        assert_eq!(Counts::from_pairs([("01", 1), ("111", 2)]).bitstring_width(), None);
    }

    #[test]
    fn test_from_distribution_exact_total() {
        let counts = Counts::from_distribution([("0", 1.0 / 3.0), ("1", 2.0 / 3.0)], 100);
        assert_eq!(counts.total_shots(), 100);
        assert_eq!(counts.get("0"), 33);
        assert_eq!(counts.get("1"), 67);
    }

    #[test]
    fn test_from_distribution_ties_go_to_lower_index() {
        let counts = Counts::from_distribution(
            [("00", 0.25), ("01", 0.25), ("10", 0.25), ("11", 0.25)],
            6,
        );
        assert_eq!(counts.total_shots(), 6);
        assert_eq!(counts.get("00"), 2);
        assert_eq!(counts.get("01"), 2);
        assert_eq!(counts.get("10"), 1);
        assert_eq!(counts.get("11"), 1);
    }

    #[test]
    fn test_from_distribution_keeps_zero_entries() {
        let counts = Counts::from_distribution([("0", 1.0), ("1", 0.0)], 1000);
        assert_eq!(counts.get("0"), 1000);
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().any(|(k, &v)| k == "1" && v == 0));
    }

    #[test]
    fn test_from_distribution_ignores_negative_mass() {
        let counts = Counts::from_distribution([("0", 1.2), ("1", -0.2)], 10);
        assert_eq!(counts.get("0"), 10);
        assert_eq!(counts.get("1"), 0);
    }

    #[test]
    fn test_serde_transparent() {
        let counts = Counts::from_pairs([("1", 7)]);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"1":7}"#);
        let back: Counts = serde_json::from_str(r#"{"0": 3, "1": 7}"#).unwrap();
        assert_eq!(back.total_shots(), 10);
    }
}
