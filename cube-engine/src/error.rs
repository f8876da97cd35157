//! FILENAME: cube-engine/src/error.rs
//! PURPOSE: Error taxonomy for the cube engine.
//! CONTEXT: Structural errors (unknown names, non-numeric measures) surface
//! immediately with the offending name. Legitimately empty results are NOT
//! errors — they come back as zero-bucket `CubeResult`s — and missing data
//! inside a bucket is handled by the aggregation's no-value semantics.

use thiserror::Error;

/// All errors the cube engine can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CubeError {
    /// A name was used as a dimension but the catalog knows no such
    /// dimension.
    #[error("unknown dimension '{name}'")]
    UnknownDimension { name: String },

    /// A name was used as a measure but the catalog knows no such measure.
    #[error("unknown measure '{name}'")]
    UnknownMeasure { name: String },

    /// A hierarchy level or drill-down target names a column absent from
    /// the fact-table schema.
    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    /// The same dimension appears twice in one request (e.g. on both pivot
    /// axes).
    #[error("dimension '{name}' used more than once")]
    DuplicateDimension { name: String },

    /// A declared measure column contains non-numeric values.
    #[error("measure '{name}' contains non-numeric values")]
    NonNumericMeasure { name: String },

    /// A catalog was constructed with a repeated column name.
    #[error("column '{name}' declared more than once in the catalog")]
    DuplicateCatalogEntry { name: String },
}

pub type Result<T> = std::result::Result<T, CubeError>;
