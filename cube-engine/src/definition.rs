//! FILENAME: cube-engine/src/definition.rs
//! PURPOSE: Query-side configuration — the serializable description of what
//! to aggregate.
//! CONTEXT: These types describe a cube query: which aggregation functions
//! to apply to which measures, which filters to AND together for dice, how
//! a hierarchy is levelled for roll-up, and which margin buckets to
//! materialize. They are plain data, designed to be stored or sent over a
//! wire by reporting collaborators.

use fact_model::FactValue;
use serde::{Deserialize, Serialize};

/// Supported aggregation functions for measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    Mean,
    Count,
    Min,
    Max,
}

impl AggregationType {
    /// The value a missing bucket contributes when a grid is filled:
    /// the algebraic identity for sum/count, no value for the rest.
    pub fn identity(self) -> Option<f64> {
        match self {
            AggregationType::Sum | AggregationType::Count => Some(0.0),
            AggregationType::Mean | AggregationType::Min | AggregationType::Max => None,
        }
    }
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

/// One measure paired with one aggregation function. A query may carry the
/// same measure several times under different functions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub measure: String,
    pub aggregation: AggregationType,
}

impl MeasureSpec {
    pub fn new(measure: impl Into<String>, aggregation: AggregationType) -> Self {
        MeasureSpec {
            measure: measure.into(),
            aggregation,
        }
    }
}

/// Predicate for one dimension in a dice request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiceSelection {
    /// Keep rows whose dimension value equals this value.
    Equals(FactValue),
    /// Keep rows whose dimension value is a member of this set.
    In(Vec<FactValue>),
}

impl DiceSelection {
    pub fn values(&self) -> &[FactValue] {
        match self {
            DiceSelection::Equals(v) => std::slice::from_ref(v),
            DiceSelection::In(vs) => vs.as_slice(),
        }
    }
}

/// One ANDed dice predicate: dimension plus selected value(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceFilter {
    pub dimension: String,
    pub selection: DiceSelection,
}

impl DiceFilter {
    pub fn equals(dimension: impl Into<String>, value: impl Into<FactValue>) -> Self {
        DiceFilter {
            dimension: dimension.into(),
            selection: DiceSelection::Equals(value.into()),
        }
    }

    pub fn any_of(
        dimension: impl Into<String>,
        values: impl IntoIterator<Item = FactValue>,
    ) -> Self {
        DiceFilter {
            dimension: dimension.into(),
            selection: DiceSelection::In(values.into_iter().collect()),
        }
    }
}

/// One level of a roll-up hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HierarchyLevel {
    /// Coarsen the hierarchy dimension to the values of this column.
    Column(String),
    /// Collapse every row into a single `TOTAL` pseudo-value.
    Total,
}

/// An ordered list of levels for one dimension, most to least granular,
/// optionally ending at `Total`. Used only by roll-up / drill-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// The dimension being coarsened.
    pub dimension: String,
    pub levels: Vec<HierarchyLevel>,
}

impl Hierarchy {
    pub fn new(
        dimension: impl Into<String>,
        levels: impl IntoIterator<Item = HierarchyLevel>,
    ) -> Self {
        Hierarchy {
            dimension: dimension.into(),
            levels: levels.into_iter().collect(),
        }
    }
}

/// Which margin buckets to add to an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MarginMode {
    /// Real combinations only.
    None,
    /// Add the grand-total bucket (every dimension replaced by ALL).
    #[default]
    GrandTotal,
    /// Add one margin per single dimension plus the grand total.
    Full,
}
