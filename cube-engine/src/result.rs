//! FILENAME: cube-engine/src/result.rs
//! PURPOSE: The value returned by every cube query.
//! CONTEXT: A `CubeResult` maps dimension-value keys to per-measure
//! aggregates. Keys are either real combinations present in the fact table
//! or margin substitutions carrying the reserved ALL pseudo-value. Entries
//! iterate in a deterministic lexicographic order so exports and tests are
//! reproducible; margins sort after the real values they summarize.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::CacheValue;
use crate::definition::MeasureSpec;

/// A finalized aggregate. `None` is the explicit "no value" sentinel, e.g.
/// a mean over zero contributing rows.
pub type AggValue = Option<f64>;

/// One component of a dimension key: a concrete value or the ALL margin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyPart {
    /// A value actually present in the fact table (Empty is the valid
    /// "unknown" bucket).
    Value(CacheValue),
    /// The reserved pseudo-value substituted for a dimension in a margin
    /// bucket. Sorts after every real value.
    All,
}

impl KeyPart {
    pub fn is_all(&self) -> bool {
        matches!(self, KeyPart::All)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Value(v) => write!(f, "{}", v.display_value()),
            KeyPart::All => write!(f, "ALL"),
        }
    }
}

/// Tuple of key parts, one per active dimension of the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionKey {
    pub parts: Vec<KeyPart>,
}

impl DimensionKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        DimensionKey { parts }
    }

    /// True if any component is the ALL pseudo-value.
    pub fn is_margin(&self) -> bool {
        self.parts.iter().any(KeyPart::is_all)
    }

    /// True if every component is the ALL pseudo-value.
    pub fn is_grand_total(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(KeyPart::is_all)
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        write!(f, "({})", labels.join(", "))
    }
}

/// One result row: key plus aggregates aligned with the measure specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeEntry {
    pub key: DimensionKey,
    pub values: Vec<AggValue>,
}

/// The full set of aggregates for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeResult {
    /// Names of the active grouping columns, one per key slot.
    dimensions: Vec<String>,
    /// The measure/aggregation pairs, in per-entry value order.
    measures: Vec<MeasureSpec>,
    /// Entries sorted lexicographically by key.
    entries: Vec<CubeEntry>,
}

impl CubeResult {
    pub(crate) fn new(
        dimensions: Vec<String>,
        measures: Vec<MeasureSpec>,
        entries: impl IntoIterator<Item = (DimensionKey, Vec<AggValue>)>,
    ) -> Self {
        let mut entries: Vec<CubeEntry> = entries
            .into_iter()
            .map(|(key, values)| CubeEntry { key, values })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        CubeResult {
            dimensions,
            measures,
            entries,
        }
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn measures(&self) -> &[MeasureSpec] {
        &self.measures
    }

    /// Number of buckets, margins included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deterministic iteration over (key, aggregates) pairs.
    pub fn iter(&self) -> impl Iterator<Item = &CubeEntry> {
        self.entries.iter()
    }

    /// Entries for real dimension combinations only.
    pub fn buckets(&self) -> impl Iterator<Item = &CubeEntry> {
        self.entries.iter().filter(|e| !e.key.is_margin())
    }

    /// Margin entries only.
    pub fn margins(&self) -> impl Iterator<Item = &CubeEntry> {
        self.entries.iter().filter(|e| e.key.is_margin())
    }

    /// Looks up the aggregates for an exact key.
    pub fn get(&self, key: &DimensionKey) -> Option<&[AggValue]> {
        self.entries
            .binary_search_by(|e| e.key.cmp(key))
            .ok()
            .map(|i| self.entries[i].values.as_slice())
    }

    /// Looks up one aggregate by key and measure spec.
    pub fn value(&self, key: &DimensionKey, spec: &MeasureSpec) -> Option<AggValue> {
        let column = self.measures.iter().position(|m| m == spec)?;
        self.get(key).map(|values| values[column])
    }

    /// The grand-total entry, if margins were requested.
    pub fn grand_total(&self) -> Option<&CubeEntry> {
        self.entries.iter().find(|e| e.key.is_grand_total())
    }
}
