//! FILENAME: cube-engine/src/operations.rs
//! PURPOSE: The operation dispatcher — slice, dice, roll-up, drill-down and
//! pivot expressed through the aggregator.
//! CONTEXT: Stateless. Each function is a pure transform of (cache,
//! resolved catalog, arguments): it validates names against the catalog,
//! compiles filters to interned ids, picks the active grouping columns and
//! hands off to `aggregate`. Unknown names fail fast with the offending
//! name; filters that match nothing return valid zero-bucket results.

use fact_model::FactValue;

use crate::aggregate::{aggregate, GroupColumn, ResolvedSpec, RowFilter};
use crate::cache::{CacheValue, CubeCache, ValueId};
use crate::catalog::ResolvedCatalog;
use crate::definition::{DiceFilter, Hierarchy, HierarchyLevel, MarginMode, MeasureSpec};
use crate::error::{CubeError, Result};
use crate::pivot::PivotTable;
use crate::result::CubeResult;

/// The label of the synthetic roll-up level that collapses everything.
pub const TOTAL_LEVEL_LABEL: &str = "TOTAL";

fn resolve_specs(catalog: &ResolvedCatalog, specs: &[MeasureSpec]) -> Result<Vec<ResolvedSpec>> {
    specs
        .iter()
        .map(|spec| {
            let measure = catalog.measure(&spec.measure)?;
            Ok(ResolvedSpec {
                spec: spec.clone(),
                column: measure.column,
            })
        })
        .collect()
}

/// Interned ids of the given values in one column. Values never seen in
/// the column simply contribute no id, so the clause matches no rows.
fn lookup_ids(cache: &CubeCache, column: usize, values: &[FactValue]) -> Vec<ValueId> {
    let field = match cache.field(column) {
        Some(f) => f,
        None => return Vec::new(),
    };
    values
        .iter()
        .filter_map(|v| field.lookup(&CacheValue::from(v)))
        .collect()
}

/// Grouping columns for all catalog dimensions except the named ones.
fn group_without(catalog: &ResolvedCatalog, excluded: &[&str]) -> Vec<(String, GroupColumn)> {
    catalog
        .dimensions()
        .iter()
        .filter(|d| !excluded.contains(&d.name.as_str()))
        .map(|d| (d.name.clone(), GroupColumn::Column(d.column)))
        .collect()
}

/// SLICE: keep rows where `dimension == value`, drop that dimension from
/// the active set, aggregate the rest. A value that never occurs yields a
/// zero-bucket result.
pub fn slice(
    cache: &CubeCache,
    catalog: &ResolvedCatalog,
    dimension: &str,
    value: &FactValue,
    specs: &[MeasureSpec],
    margins: MarginMode,
) -> Result<CubeResult> {
    let dim = catalog.dimension(dimension)?;
    let resolved = resolve_specs(catalog, specs)?;

    let mut filter = RowFilter::none();
    filter.push(dim.column, lookup_ids(cache, dim.column, std::slice::from_ref(value)));

    let group = group_without(catalog, &[dimension]);
    tracing::debug!(dimension, "slice");
    Ok(aggregate(cache, &group, &resolved, &filter, margins))
}

/// DICE: AND together equality/membership predicates over several
/// dimensions; the remaining catalog dimensions stay active. An empty
/// intersection is a zero-bucket result, not an error.
pub fn dice(
    cache: &CubeCache,
    catalog: &ResolvedCatalog,
    filters: &[DiceFilter],
    specs: &[MeasureSpec],
    margins: MarginMode,
) -> Result<CubeResult> {
    let resolved = resolve_specs(catalog, specs)?;

    let mut row_filter = RowFilter::none();
    let mut filtered: Vec<&str> = Vec::with_capacity(filters.len());
    for filter in filters {
        let dim = catalog.dimension(&filter.dimension)?;
        row_filter.push(
            dim.column,
            lookup_ids(cache, dim.column, filter.selection.values()),
        );
        filtered.push(filter.dimension.as_str());
    }

    let group = group_without(catalog, &filtered);
    tracing::debug!(filters = filters.len(), "dice");
    Ok(aggregate(cache, &group, &resolved, &row_filter, margins))
}

/// ROLL-UP: one aggregation per hierarchy level, most to least granular.
/// Each level coarsens the hierarchy dimension's key to that level's
/// values (the `Total` level collapses every row to one pseudo-value)
/// while the other active dimensions stay unchanged. Levels are computed
/// independently from the raw records, so any level can be retried or
/// consumed on its own. An unknown level column fails fast.
pub fn roll_up(
    cache: &CubeCache,
    catalog: &ResolvedCatalog,
    hierarchy: &Hierarchy,
    specs: &[MeasureSpec],
    margins: MarginMode,
) -> Result<Vec<CubeResult>> {
    let dim = catalog.dimension(&hierarchy.dimension)?;
    let resolved = resolve_specs(catalog, specs)?;

    let mut results = Vec::with_capacity(hierarchy.levels.len());
    for level in &hierarchy.levels {
        let slot = match level {
            HierarchyLevel::Column(name) => {
                let column = cache
                    .fields()
                    .iter()
                    .position(|f| f.name == *name)
                    .ok_or_else(|| CubeError::UnknownColumn { name: name.clone() })?;
                (name.clone(), GroupColumn::Column(column))
            }
            HierarchyLevel::Total => (
                hierarchy.dimension.clone(),
                GroupColumn::Constant(CacheValue::Text(TOTAL_LEVEL_LABEL.to_string())),
            ),
        };

        // The coarsened slot keeps the dimension's position in the key.
        let group: Vec<(String, GroupColumn)> = catalog
            .dimensions()
            .iter()
            .map(|d| {
                if d.name == dim.name {
                    slot.clone()
                } else {
                    (d.name.clone(), GroupColumn::Column(d.column))
                }
            })
            .collect();

        results.push(aggregate(cache, &group, &resolved, &RowFilter::none(), margins));
    }

    tracing::debug!(
        dimension = hierarchy.dimension.as_str(),
        levels = results.len(),
        "roll-up"
    );
    Ok(results)
}

/// DRILL-DOWN: keep rows where `dimension == parent_value` (no match gives
/// an empty result, not an error) and aggregate by the remaining active
/// dimensions plus `child_dimension`. Between adjacent hierarchy levels
/// this is the formal inverse of roll-up.
pub fn drill_down(
    cache: &CubeCache,
    catalog: &ResolvedCatalog,
    dimension: &str,
    parent_value: &FactValue,
    child_dimension: &str,
    specs: &[MeasureSpec],
    margins: MarginMode,
) -> Result<CubeResult> {
    let dim = catalog.dimension(dimension)?;
    let resolved = resolve_specs(catalog, specs)?;

    // The child must be a discrete column: a declared measure can't group.
    if catalog.is_measure(child_dimension) {
        return Err(CubeError::UnknownDimension {
            name: child_dimension.to_string(),
        });
    }
    let child_column = cache
        .fields()
        .iter()
        .position(|f| f.name == child_dimension)
        .ok_or_else(|| CubeError::UnknownColumn {
            name: child_dimension.to_string(),
        })?;

    let mut filter = RowFilter::none();
    filter.push(
        dim.column,
        lookup_ids(cache, dim.column, std::slice::from_ref(parent_value)),
    );

    let mut group = group_without(catalog, &[dimension]);
    if !group.iter().any(|(name, _)| name == child_dimension) {
        group.push((
            child_dimension.to_string(),
            GroupColumn::Column(child_column),
        ));
    }

    tracing::debug!(dimension, child = child_dimension, "drill-down");
    Ok(aggregate(cache, &group, &resolved, &filter, margins))
}

/// PIVOT: aggregate over the union of row and column dimensions and
/// reshape into a two-axis table. See `PivotTable` for the fill and
/// margin rules.
pub fn pivot(
    cache: &CubeCache,
    catalog: &ResolvedCatalog,
    row_dimensions: &[&str],
    col_dimensions: &[&str],
    spec: &MeasureSpec,
) -> Result<PivotTable> {
    PivotTable::build(cache, catalog, row_dimensions, col_dimensions, spec)
}
