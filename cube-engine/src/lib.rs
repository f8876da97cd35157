//! FILENAME: cube-engine/src/lib.rs
//! PURPOSE: Multidimensional cube engine for project portfolio reporting.
//! CONTEXT: This crate takes a denormalized fact table (built by
//! `fact-model`) and answers multidimensional aggregation queries: slice,
//! dice, roll-up, drill-down and pivot, with margin/total buckets and
//! hierarchy semantics. It depends on `fact-model` only for the shared
//! tabular types.
//!
//! Layers:
//! - `catalog`: which columns are dimensions vs measures (WHAT the table means)
//! - `definition`: serializable query configuration (WHAT to compute)
//! - `cache`: interned internal representation (HOW we store)
//! - `aggregate` + `result`: bucketing and margins (HOW we compute)
//! - `operations` + `pivot`: the five OLAP operations (HOW we answer)
//! - `session`: the per-table handle tying it together

pub mod error;
pub mod definition;
pub mod catalog;
pub mod cache;
pub mod result;
pub mod aggregate;
pub mod operations;
pub mod pivot;
pub mod session;

pub use error::{CubeError, Result};
pub use definition::{
    AggregationType, DiceFilter, DiceSelection, Hierarchy, HierarchyLevel, MarginMode,
    MeasureSpec,
};
pub use catalog::{Catalog, MeasureDecl, ResolvedCatalog};
pub use cache::{CacheValue, CubeCache, OrderedFloat};
pub use result::{AggValue, CubeEntry, CubeResult, DimensionKey, KeyPart};
pub use operations::{dice, drill_down, pivot, roll_up, slice, TOTAL_LEVEL_LABEL};
pub use pivot::PivotTable;
pub use session::{CubeSession, SessionInfo};
