//! FILENAME: cube-engine/src/aggregate.rs
//! PURPOSE: The aggregator — buckets rows and computes per-measure
//! aggregates, including margin buckets.
//! CONTEXT: Every operation reduces to one or more calls into this module.
//! A single scan partitions the filtered records by the active grouping
//! columns and feeds accumulators; margins run additional scans over the
//! same raw records with dimensions collapsed, so a margin never depends on
//! intermediate per-bucket results (means stay weighted, identity fills
//! can't leak in).

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::cache::{CacheRecord, CacheValue, CubeCache, GroupKey, ValueId};
use crate::definition::{AggregationType, MarginMode, MeasureSpec};
use crate::result::{AggValue, CubeResult, DimensionKey, KeyPart};

/// Source of one grouping-key slot.
#[derive(Debug, Clone)]
pub(crate) enum GroupColumn {
    /// Group by the interned values of a schema column.
    Column(usize),
    /// Every row maps to this fixed pseudo-value (roll-up TOTAL level).
    Constant(CacheValue),
}

/// A measure spec resolved to its schema position.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSpec {
    pub spec: MeasureSpec,
    pub column: usize,
}

/// ANDed membership predicates over interned ids. An empty id list in a
/// clause matches nothing (the filtered value does not occur in the table),
/// which yields a valid zero-bucket result.
#[derive(Debug, Clone, Default)]
pub(crate) struct RowFilter {
    clauses: Vec<(usize, Vec<ValueId>)>,
}

impl RowFilter {
    pub fn none() -> Self {
        RowFilter::default()
    }

    pub fn push(&mut self, column: usize, ids: Vec<ValueId>) {
        self.clauses.push((column, ids));
    }

    fn matches(&self, record: &CacheRecord) -> bool {
        self.clauses
            .iter()
            .all(|(column, ids)| ids.contains(&record.value_at(*column)))
    }
}

/// Accumulator for one (bucket, measure) pair. `count` sees every bucket
/// row; the numeric statistics see only numeric cells.
#[derive(Debug, Clone, Default)]
pub struct MeasureAccumulator {
    sum: f64,
    count: u64,
    numeric_count: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl MeasureAccumulator {
    pub fn new() -> Self {
        MeasureAccumulator::default()
    }

    /// Feeds one numeric cell.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.numeric_count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Feeds one missing or non-numeric cell: visible to `count` only.
    pub fn add_non_numeric(&mut self) {
        self.count += 1;
    }

    /// Merges a disjoint subset's partial aggregate into this one.
    pub fn merge(&mut self, other: &MeasureAccumulator) {
        self.sum += other.sum;
        self.count += other.count;
        self.numeric_count += other.numeric_count;
        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
    }

    /// Finalizes the accumulator under one aggregation function. A mean
    /// over zero contributing rows is `None`, never 0 or NaN; a sum over
    /// an empty bucket is the algebraic identity 0.
    pub fn compute(&self, aggregation: AggregationType) -> AggValue {
        match aggregation {
            AggregationType::Sum => Some(self.sum),
            AggregationType::Count => Some(self.count as f64),
            AggregationType::Mean => {
                if self.numeric_count > 0 {
                    Some(self.sum / self.numeric_count as f64)
                } else {
                    None
                }
            }
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
        }
    }
}

/// Partitions filtered records by the grouping columns and accumulates
/// every measure. One pass over the records.
pub(crate) fn scan(
    cache: &CubeCache,
    group: &[GroupColumn],
    specs: &[ResolvedSpec],
    filter: &RowFilter,
) -> FxHashMap<GroupKey, Vec<MeasureAccumulator>> {
    let mut buckets: FxHashMap<GroupKey, Vec<MeasureAccumulator>> = FxHashMap::default();

    for record in cache.records() {
        if !filter.matches(record) {
            continue;
        }

        let mut key: SmallVec<[ValueId; 8]> = SmallVec::with_capacity(group.len());
        for col in group {
            key.push(match col {
                GroupColumn::Column(c) => record.value_at(*c),
                GroupColumn::Constant(_) => 0,
            });
        }

        let accumulators = buckets
            .entry(GroupKey::new(key))
            .or_insert_with(|| vec![MeasureAccumulator::new(); specs.len()]);

        for (acc, spec) in accumulators.iter_mut().zip(specs) {
            let value = cache
                .field(spec.column)
                .and_then(|f| f.get_value(record.value_at(spec.column)));
            match value {
                Some(CacheValue::Number(n)) => acc.add_number(n.as_f64()),
                _ => acc.add_non_numeric(),
            }
        }
    }

    buckets
}

/// Materializes a bucket key into a result key, with `KeyPart::All` at the
/// collapsed slots. `kept` maps each surviving scan slot back to its
/// position in the full grouping.
pub(crate) fn materialize_key(
    cache: &CubeCache,
    group: &[GroupColumn],
    kept: &[usize],
    key: &GroupKey,
    total_slots: usize,
) -> DimensionKey {
    let mut parts = vec![KeyPart::All; total_slots];
    for (scan_slot, &full_slot) in kept.iter().enumerate() {
        let part = match &group[scan_slot] {
            GroupColumn::Column(c) => {
                let value = cache
                    .field(*c)
                    .and_then(|f| f.get_value(key.values[scan_slot]))
                    .cloned()
                    .unwrap_or(CacheValue::Empty);
                KeyPart::Value(value)
            }
            GroupColumn::Constant(v) => KeyPart::Value(v.clone()),
        };
        parts[full_slot] = part;
    }
    DimensionKey::new(parts)
}

pub(crate) fn finalize(accumulators: &[MeasureAccumulator], specs: &[ResolvedSpec]) -> Vec<AggValue> {
    accumulators
        .iter()
        .zip(specs)
        .map(|(acc, spec)| acc.compute(spec.spec.aggregation))
        .collect()
}

/// Runs one scan with only the `kept` slots of `group` active and writes
/// the resulting (possibly margin) entries into `out`.
fn scan_into(
    out: &mut BTreeMap<DimensionKey, Vec<AggValue>>,
    cache: &CubeCache,
    group: &[GroupColumn],
    kept: &[usize],
    specs: &[ResolvedSpec],
    filter: &RowFilter,
) {
    let sub_group: Vec<GroupColumn> = kept.iter().map(|&i| group[i].clone()).collect();
    let buckets = scan(cache, &sub_group, specs, filter);
    for (key, accumulators) in &buckets {
        let dim_key = materialize_key(cache, &sub_group, kept, key, group.len());
        out.insert(dim_key, finalize(accumulators, specs));
    }
}

/// The aggregator's entry point: full buckets plus the requested margins,
/// all computed from the raw (filtered) records. Returns a fresh
/// `CubeResult`; an empty input yields a zero-bucket result.
pub(crate) fn aggregate(
    cache: &CubeCache,
    group: &[(String, GroupColumn)],
    specs: &[ResolvedSpec],
    filter: &RowFilter,
    margins: MarginMode,
) -> CubeResult {
    let names: Vec<String> = group.iter().map(|(name, _)| name.clone()).collect();
    let columns: Vec<GroupColumn> = group.iter().map(|(_, col)| col.clone()).collect();
    let all_slots: Vec<usize> = (0..columns.len()).collect();

    let mut entries: BTreeMap<DimensionKey, Vec<AggValue>> = BTreeMap::new();
    scan_into(&mut entries, cache, &columns, &all_slots, specs, filter);
    let bucket_count = entries.len();

    // With no active dimensions the single bucket already is the total;
    // there is no dimension left to substitute.
    if !columns.is_empty() {
        match margins {
            MarginMode::None => {}
            MarginMode::GrandTotal => {
                scan_into(&mut entries, cache, &columns, &[], specs, filter);
            }
            MarginMode::Full => {
                for collapse in 0..columns.len() {
                    let kept: Vec<usize> =
                        (0..columns.len()).filter(|&i| i != collapse).collect();
                    scan_into(&mut entries, cache, &columns, &kept, specs, filter);
                }
                scan_into(&mut entries, cache, &columns, &[], specs, filter);
            }
        }
    }

    tracing::debug!(
        dimensions = names.len(),
        buckets = bucket_count,
        margins = entries.len() - bucket_count,
        "aggregation complete"
    );

    CubeResult::new(names, specs.iter().map(|s| s.spec.clone()).collect(), entries)
}
