//! FILENAME: cube-engine/src/cache.rs
//! PURPOSE: Interned columnar representation of one fact table.
//! CONTEXT: Built once per analysis session. Each unique column value is
//! stored once and referenced by a compact id, so grouping keys are cheap
//! integer tuples and repeated dimension labels cost one allocation total.
//! The cache is immutable after `build`; every query reads it without
//! locking.

use fact_model::{FactTable, FactValue};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A reference to an interned value within a field's unique value store.
pub type ValueId = u32;

/// Represents a missing value ("unknown" bucket) in the cache.
pub const VALUE_ID_EMPTY: ValueId = u32::MAX;

/// Wrapper around f64 that implements Eq, Hash and Ord for use in keys.
/// NaN values are treated as equal to each other and sort last.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match self.0.partial_cmp(&other.0) {
            Some(ord) => ord,
            None => match (self.0.is_nan(), other.0.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => Ordering::Equal,
            },
        }
    }
}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A normalized, hashable representation of a fact value. Used as keys in
/// the unique value store and in result dimension keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CacheValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl CacheValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CacheValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Display representation, matching `FactValue::display_value`.
    pub fn display_value(&self) -> String {
        FactValue::from(self).display_value()
    }
}

impl From<&FactValue> for CacheValue {
    fn from(value: &FactValue) -> Self {
        match value {
            FactValue::Empty => CacheValue::Empty,
            FactValue::Number(n) => CacheValue::Number(OrderedFloat(*n)),
            FactValue::Text(s) => CacheValue::Text(s.clone()),
            FactValue::Boolean(b) => CacheValue::Boolean(*b),
        }
    }
}

impl From<&CacheValue> for FactValue {
    fn from(value: &CacheValue) -> Self {
        match value {
            CacheValue::Empty => FactValue::Empty,
            CacheValue::Number(n) => FactValue::Number(n.as_f64()),
            CacheValue::Text(s) => FactValue::Text(s.clone()),
            CacheValue::Boolean(b) => FactValue::Boolean(*b),
        }
    }
}

/// Cache for a single column: unique values with O(1) lookup by id.
#[derive(Debug, Clone)]
pub struct FieldCache {
    /// Column name from the schema.
    pub name: String,

    /// Map from value to its unique id (for deduplication during build).
    value_to_id: FxHashMap<CacheValue, ValueId>,

    /// Ordered list of unique values (indexed by ValueId).
    id_to_value: Vec<CacheValue>,

    /// Count of non-numeric, non-empty values seen during build.
    non_numeric: usize,
}

impl FieldCache {
    fn new(name: String) -> Self {
        FieldCache {
            name,
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
            non_numeric: 0,
        }
    }

    /// Interns a value and returns its id. Empty maps to the reserved
    /// missing-value id without occupying a store slot.
    fn intern(&mut self, value: CacheValue) -> ValueId {
        if let CacheValue::Empty = value {
            return VALUE_ID_EMPTY;
        }
        if !matches!(value, CacheValue::Number(_)) {
            // Tracked per occurrence so measure validation sees every row.
            self.non_numeric += 1;
        }
        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }
        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        id
    }

    /// Gets the value for a given id.
    pub fn get_value(&self, id: ValueId) -> Option<&CacheValue> {
        if id == VALUE_ID_EMPTY {
            return Some(&CacheValue::Empty);
        }
        self.id_to_value.get(id as usize)
    }

    /// Looks up the id of an already-interned value. A value never seen in
    /// this column has no id, which filters match against zero rows.
    pub fn lookup(&self, value: &CacheValue) -> Option<ValueId> {
        if let CacheValue::Empty = value {
            return Some(VALUE_ID_EMPTY);
        }
        self.value_to_id.get(value).copied()
    }

    /// Returns the number of unique values (excluding empty).
    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// Whether every non-empty value in this column is numeric.
    pub fn is_numeric(&self) -> bool {
        self.non_numeric == 0
    }
}

/// A single fact row stored as interned value ids.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    /// ValueIds for each column, in schema order.
    pub values: Vec<ValueId>,
}

impl CacheRecord {
    pub fn value_at(&self, column: usize) -> ValueId {
        self.values.get(column).copied().unwrap_or(VALUE_ID_EMPTY)
    }
}

/// A grouping key: one interned id per active grouping column.
/// `VALUE_ID_ALL` marks a margin slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub values: SmallVec<[ValueId; 8]>,
}

impl GroupKey {
    pub fn new(values: SmallVec<[ValueId; 8]>) -> Self {
        GroupKey { values }
    }
}

/// The interned, immutable representation of one fact table.
#[derive(Debug, Clone)]
pub struct CubeCache {
    fields: Vec<FieldCache>,
    records: Vec<CacheRecord>,
}

impl CubeCache {
    /// Builds the cache from a sealed fact table. O(rows × columns).
    pub fn build(table: &FactTable) -> Self {
        let mut fields: Vec<FieldCache> = table
            .schema()
            .column_names()
            .map(|name| FieldCache::new(name.to_string()))
            .collect();

        let mut records = Vec::with_capacity(table.row_count());
        for row in table.rows() {
            let mut values = Vec::with_capacity(fields.len());
            for (col, value) in row.iter().enumerate() {
                values.push(fields[col].intern(CacheValue::from(value)));
            }
            records.push(CacheRecord { values });
        }

        tracing::debug!(
            rows = records.len(),
            columns = fields.len(),
            "cube cache built"
        );

        CubeCache { fields, records }
    }

    pub fn field(&self, column: usize) -> Option<&FieldCache> {
        self.fields.get(column)
    }

    pub fn fields(&self) -> &[FieldCache] {
        &self.fields
    }

    pub fn records(&self) -> &[CacheRecord] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
