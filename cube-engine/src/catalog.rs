//! FILENAME: cube-engine/src/catalog.rs
//! PURPOSE: Declares which columns are dimensions vs measures, and the
//! default aggregation per measure.
//! CONTEXT: The catalog is static metadata, independent of any particular
//! table instance. `resolve` binds it to a concrete schema, failing with
//! the offending name when a declared column is absent. Default
//! aggregations come from an explicit name→function table validated at
//! catalog construction — never from runtime substring matching.

use fact_model::{project::columns, Schema};
use serde::{Deserialize, Serialize};

use crate::definition::{AggregationType, MeasureSpec};
use crate::error::{CubeError, Result};

/// Default aggregation for every measure of the project-portfolio fact
/// table. Monetary amounts and deviations sum; rates, percentages and
/// productivity average; identifiers count.
const PROJECT_MEASURE_DEFAULTS: [(&str, AggregationType); 9] = [
    (columns::BUDGET, AggregationType::Sum),
    (columns::REAL_COST, AggregationType::Sum),
    (columns::BUDGET_DEVIATION, AggregationType::Sum),
    (columns::AVERAGE_PRODUCTIVITY, AggregationType::Mean),
    (columns::TEST_SUCCESS_RATE, AggregationType::Mean),
    (columns::PERCENT_LATE_TASKS, AggregationType::Mean),
    (columns::PERCENT_LATE_MILESTONES, AggregationType::Mean),
    (columns::ERROR_RATE, AggregationType::Mean),
    (columns::PENALTY_AMOUNT, AggregationType::Sum),
];

/// One measure declaration: column name plus default aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureDecl {
    pub name: String,
    pub default_aggregation: AggregationType,
}

/// Static description of a fact-table layout: which columns group, which
/// aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    dimensions: Vec<String>,
    measures: Vec<MeasureDecl>,
}

impl Catalog {
    /// Builds a catalog, rejecting names declared twice (within or across
    /// the dimension and measure lists).
    pub fn new<S: Into<String>>(
        dimensions: impl IntoIterator<Item = S>,
        measures: impl IntoIterator<Item = (S, AggregationType)>,
    ) -> Result<Self> {
        let dimensions: Vec<String> = dimensions.into_iter().map(Into::into).collect();
        let measures: Vec<MeasureDecl> = measures
            .into_iter()
            .map(|(name, default_aggregation)| MeasureDecl {
                name: name.into(),
                default_aggregation,
            })
            .collect();

        let mut seen: Vec<&str> = Vec::new();
        for name in dimensions
            .iter()
            .map(String::as_str)
            .chain(measures.iter().map(|m| m.name.as_str()))
        {
            if seen.contains(&name) {
                return Err(CubeError::DuplicateCatalogEntry {
                    name: name.to_string(),
                });
            }
            seen.push(name);
        }

        Ok(Catalog {
            dimensions,
            measures,
        })
    }

    /// The catalog for the denormalized project fact table produced by
    /// `fact_model::project`: the eight analysis dimensions and nine KPI
    /// measures with their standard default aggregations.
    pub fn project_portfolio() -> Self {
        // Both name lists are static and disjoint.
        Catalog::new(
            columns::DIMENSIONS,
            PROJECT_MEASURE_DEFAULTS.iter().map(|&(name, agg)| (name, agg)),
        )
        .expect("project portfolio catalog is statically valid")
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn measures(&self) -> &[MeasureDecl] {
        &self.measures
    }

    /// Binds the catalog to a concrete schema. Every declared column must
    /// exist; the offending name is reported otherwise.
    pub fn resolve(&self, schema: &Schema) -> Result<ResolvedCatalog> {
        let mut dimensions = Vec::with_capacity(self.dimensions.len());
        for name in &self.dimensions {
            let column = schema
                .column_id(name)
                .ok_or_else(|| CubeError::UnknownColumn { name: name.clone() })?;
            dimensions.push(ResolvedColumn {
                name: name.clone(),
                column,
            });
        }

        let mut measures = Vec::with_capacity(self.measures.len());
        for decl in &self.measures {
            let column = schema
                .column_id(&decl.name)
                .ok_or_else(|| CubeError::UnknownColumn {
                    name: decl.name.clone(),
                })?;
            measures.push(ResolvedMeasure {
                name: decl.name.clone(),
                column,
                default_aggregation: decl.default_aggregation,
            });
        }

        Ok(ResolvedCatalog {
            dimensions,
            measures,
        })
    }
}

/// A dimension bound to its schema position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub name: String,
    pub column: usize,
}

/// A measure bound to its schema position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMeasure {
    pub name: String,
    pub column: usize,
    pub default_aggregation: AggregationType,
}

/// A catalog bound to one schema: name lookups resolved to positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCatalog {
    dimensions: Vec<ResolvedColumn>,
    measures: Vec<ResolvedMeasure>,
}

impl ResolvedCatalog {
    pub fn dimensions(&self) -> &[ResolvedColumn] {
        &self.dimensions
    }

    pub fn measures(&self) -> &[ResolvedMeasure] {
        &self.measures
    }

    /// Schema position of a dimension, or `UnknownDimension`.
    pub fn dimension(&self, name: &str) -> Result<&ResolvedColumn> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CubeError::UnknownDimension {
                name: name.to_string(),
            })
    }

    /// Declared measure by name, or `UnknownMeasure`.
    pub fn measure(&self, name: &str) -> Result<&ResolvedMeasure> {
        self.measures
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| CubeError::UnknownMeasure {
                name: name.to_string(),
            })
    }

    pub fn is_measure(&self, name: &str) -> bool {
        self.measures.iter().any(|m| m.name == name)
    }

    /// One `MeasureSpec` per measure under its default aggregation.
    pub fn default_specs(&self) -> Vec<MeasureSpec> {
        self.measures
            .iter()
            .map(|m| MeasureSpec::new(m.name.clone(), m.default_aggregation))
            .collect()
    }
}
