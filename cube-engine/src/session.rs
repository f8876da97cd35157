//! FILENAME: cube-engine/src/session.rs
//! PURPOSE: The per-analysis session handle owning one immutable cube.
//! CONTEXT: A session binds a sealed fact table to a catalog: it resolves
//! names, interns the table once, and validates that every declared
//! measure column is numeric. All queries go through the session by shared
//! reference — the engine keeps no process-wide state, and a session can
//! be queried from several threads at once.

use fact_model::{FactTable, FactValue};
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, GroupColumn, ResolvedSpec, RowFilter};
use crate::cache::CubeCache;
use crate::catalog::{Catalog, ResolvedCatalog};
use crate::definition::{AggregationType, DiceFilter, Hierarchy, MarginMode, MeasureSpec};
use crate::error::{CubeError, Result};
use crate::operations;
use crate::pivot::PivotTable;
use crate::result::CubeResult;

/// One analysis session over one immutable fact table.
#[derive(Debug, Clone)]
pub struct CubeSession {
    cache: CubeCache,
    catalog: ResolvedCatalog,
}

/// Summary of a session's working set for reporting collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub rows: usize,
    /// Distinct non-empty value count per dimension.
    pub dimensions: Vec<(String, usize)>,
    pub measures: Vec<(String, AggregationType)>,
}

impl CubeSession {
    /// Resolves the catalog against the table's schema, interns the table
    /// and validates that every declared measure column is numeric.
    pub fn new(table: &FactTable, catalog: &Catalog) -> Result<Self> {
        let resolved = catalog.resolve(table.schema())?;
        let cache = CubeCache::build(table);

        for measure in resolved.measures() {
            let numeric = cache
                .field(measure.column)
                .map_or(true, |f| f.is_numeric());
            if !numeric {
                return Err(CubeError::NonNumericMeasure {
                    name: measure.name.clone(),
                });
            }
        }

        tracing::debug!(
            rows = cache.record_count(),
            dimensions = resolved.dimensions().len(),
            measures = resolved.measures().len(),
            "cube session ready"
        );

        Ok(CubeSession {
            cache,
            catalog: resolved,
        })
    }

    pub fn catalog(&self) -> &ResolvedCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &CubeCache {
        &self.cache
    }

    /// Every measure under its catalog default aggregation.
    pub fn default_specs(&self) -> Vec<MeasureSpec> {
        self.catalog.default_specs()
    }

    /// Plain aggregation over the named active dimensions, no filtering.
    pub fn aggregate(
        &self,
        dimensions: &[&str],
        specs: &[MeasureSpec],
        margins: MarginMode,
    ) -> Result<CubeResult> {
        let mut group: Vec<(String, GroupColumn)> = Vec::with_capacity(dimensions.len());
        for name in dimensions {
            if group.iter().any(|(n, _)| n == name) {
                return Err(CubeError::DuplicateDimension {
                    name: name.to_string(),
                });
            }
            let dim = self.catalog.dimension(name)?;
            group.push((dim.name.clone(), GroupColumn::Column(dim.column)));
        }

        let resolved: Vec<ResolvedSpec> = specs
            .iter()
            .map(|spec| {
                let measure = self.catalog.measure(&spec.measure)?;
                Ok(ResolvedSpec {
                    spec: spec.clone(),
                    column: measure.column,
                })
            })
            .collect::<Result<_>>()?;

        Ok(aggregate(
            &self.cache,
            &group,
            &resolved,
            &RowFilter::none(),
            margins,
        ))
    }

    pub fn slice(
        &self,
        dimension: &str,
        value: &FactValue,
        specs: &[MeasureSpec],
        margins: MarginMode,
    ) -> Result<CubeResult> {
        operations::slice(&self.cache, &self.catalog, dimension, value, specs, margins)
    }

    pub fn dice(
        &self,
        filters: &[DiceFilter],
        specs: &[MeasureSpec],
        margins: MarginMode,
    ) -> Result<CubeResult> {
        operations::dice(&self.cache, &self.catalog, filters, specs, margins)
    }

    pub fn roll_up(
        &self,
        hierarchy: &Hierarchy,
        specs: &[MeasureSpec],
        margins: MarginMode,
    ) -> Result<Vec<CubeResult>> {
        operations::roll_up(&self.cache, &self.catalog, hierarchy, specs, margins)
    }

    pub fn drill_down(
        &self,
        dimension: &str,
        parent_value: &FactValue,
        child_dimension: &str,
        specs: &[MeasureSpec],
        margins: MarginMode,
    ) -> Result<CubeResult> {
        operations::drill_down(
            &self.cache,
            &self.catalog,
            dimension,
            parent_value,
            child_dimension,
            specs,
            margins,
        )
    }

    pub fn pivot(
        &self,
        row_dimensions: &[&str],
        col_dimensions: &[&str],
        spec: &MeasureSpec,
    ) -> Result<PivotTable> {
        operations::pivot(&self.cache, &self.catalog, row_dimensions, col_dimensions, spec)
    }

    /// Working-set summary: row count, dimension cardinalities, measures.
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            rows: self.cache.record_count(),
            dimensions: self
                .catalog
                .dimensions()
                .iter()
                .map(|d| {
                    let distinct = self
                        .cache
                        .field(d.column)
                        .map_or(0, |f| f.unique_count());
                    (d.name.clone(), distinct)
                })
                .collect(),
            measures: self
                .catalog
                .measures()
                .iter()
                .map(|m| (m.name.clone(), m.default_aggregation))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fact_model::{FactTableBuilder, Schema};

    fn small_catalog() -> Catalog {
        Catalog::new(
            ["status"],
            [("budget", AggregationType::Sum)],
        )
        .unwrap()
    }

    #[test]
    fn test_non_numeric_measure_rejected_at_build() {
        let schema = Schema::new(["status", "budget"]).unwrap();
        let mut builder = FactTableBuilder::new(schema);
        builder
            .push_row(vec!["Closed".into(), "not a number".into()])
            .unwrap();
        let table = builder.build();

        let err = CubeSession::new(&table, &small_catalog()).unwrap_err();
        assert_eq!(
            err,
            CubeError::NonNumericMeasure {
                name: "budget".to_string()
            }
        );
    }

    #[test]
    fn test_session_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CubeSession>();
    }

    #[test]
    fn test_info_reports_cardinalities() {
        let schema = Schema::new(["status", "budget"]).unwrap();
        let mut builder = FactTableBuilder::new(schema);
        builder.push_row(vec!["Closed".into(), 100.0.into()]).unwrap();
        builder.push_row(vec!["Closed".into(), 200.0.into()]).unwrap();
        builder.push_row(vec!["Cancelled".into(), 50.0.into()]).unwrap();
        let table = builder.build();

        let session = CubeSession::new(&table, &small_catalog()).unwrap();
        let info = session.info();
        assert_eq!(info.rows, 3);
        assert_eq!(info.dimensions, vec![("status".to_string(), 2)]);
        assert_eq!(
            info.measures,
            vec![("budget".to_string(), AggregationType::Sum)]
        );
    }

    #[test]
    fn test_duplicate_aggregate_dimension_rejected() {
        let schema = Schema::new(["status", "budget"]).unwrap();
        let table = FactTableBuilder::new(schema).build();
        let session = CubeSession::new(&table, &small_catalog()).unwrap();
        let specs = session.default_specs();
        let err = session
            .aggregate(&["status", "status"], &specs, MarginMode::None)
            .unwrap_err();
        assert_eq!(
            err,
            CubeError::DuplicateDimension {
                name: "status".to_string()
            }
        );
    }
}
