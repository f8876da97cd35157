//! FILENAME: cube-engine/src/pivot.rs
//! PURPOSE: The two-axis reshape of an aggregation — rows × columns with
//! margins.
//! CONTEXT: A pivot aggregates over rowDims ∪ colDims and lays the buckets
//! out as a grid. Cross-combinations absent from the data are filled with
//! the aggregation identity (0 for sum/count, no value otherwise). The
//! row/column/corner margins are computed from the raw records directly —
//! never by summing the filled grid — so identity fill can never perturb
//! them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::aggregate::{finalize, materialize_key, scan, GroupColumn, ResolvedSpec, RowFilter};
use crate::cache::{CubeCache, GroupKey, ValueId};
use crate::catalog::ResolvedCatalog;
use crate::definition::MeasureSpec;
use crate::error::{CubeError, Result};
use crate::result::{AggValue, DimensionKey};

/// An aggregated result reshaped into a 2D table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub row_dimensions: Vec<String>,
    pub col_dimensions: Vec<String>,
    pub spec: MeasureSpec,

    /// Row axis combinations, lexicographically ordered.
    pub row_keys: Vec<DimensionKey>,
    /// Column axis combinations, lexicographically ordered.
    pub col_keys: Vec<DimensionKey>,

    /// Cell values, row-major: `cells[r][c]` belongs to
    /// `(row_keys[r], col_keys[c])`. Missing combinations hold the
    /// aggregation identity.
    pub cells: Vec<Vec<AggValue>>,

    /// Margin per row (the row's aggregate across all columns).
    pub row_margins: Vec<AggValue>,
    /// Margin per column (the column's aggregate across all rows).
    pub col_margins: Vec<AggValue>,
    /// The corner margin: the aggregate over every filtered row.
    pub grand_total: AggValue,
}

/// One materialized axis: bucket keys paired with their margin aggregates,
/// sorted by display key.
fn build_axis(
    cache: &CubeCache,
    group: &[GroupColumn],
    spec: &ResolvedSpec,
) -> Vec<(GroupKey, DimensionKey, AggValue)> {
    let kept: Vec<usize> = (0..group.len()).collect();
    let buckets = scan(cache, group, std::slice::from_ref(spec), &RowFilter::none());
    let mut axis: Vec<(GroupKey, DimensionKey, AggValue)> = buckets
        .into_iter()
        .map(|(key, accumulators)| {
            let dim_key = materialize_key(cache, group, &kept, &key, group.len());
            let margin = finalize(&accumulators, std::slice::from_ref(spec))[0];
            (key, dim_key, margin)
        })
        .collect();
    axis.sort_by(|a, b| a.1.cmp(&b.1));
    axis
}

impl PivotTable {
    pub(crate) fn build(
        cache: &CubeCache,
        catalog: &ResolvedCatalog,
        row_dimensions: &[&str],
        col_dimensions: &[&str],
        spec: &MeasureSpec,
    ) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::new();
        for name in row_dimensions.iter().chain(col_dimensions.iter()) {
            if seen.contains(name) {
                return Err(CubeError::DuplicateDimension {
                    name: name.to_string(),
                });
            }
            seen.push(name);
        }

        let row_group: Vec<GroupColumn> = row_dimensions
            .iter()
            .map(|name| Ok(GroupColumn::Column(catalog.dimension(name)?.column)))
            .collect::<Result<_>>()?;
        let col_group: Vec<GroupColumn> = col_dimensions
            .iter()
            .map(|name| Ok(GroupColumn::Column(catalog.dimension(name)?.column)))
            .collect::<Result<_>>()?;

        let measure = catalog.measure(&spec.measure)?;
        let resolved = ResolvedSpec {
            spec: spec.clone(),
            column: measure.column,
        };
        let identity = spec.aggregation.identity();

        // Full cross-tabulation buckets over rowDims ∪ colDims.
        let full_group: Vec<GroupColumn> = row_group
            .iter()
            .chain(col_group.iter())
            .cloned()
            .collect();
        let full = scan(
            cache,
            &full_group,
            std::slice::from_ref(&resolved),
            &RowFilter::none(),
        );

        // Axes and margins come from their own raw scans.
        let rows = build_axis(cache, &row_group, &resolved);
        let cols = build_axis(cache, &col_group, &resolved);
        let grand = scan(cache, &[], std::slice::from_ref(&resolved), &RowFilter::none());

        let mut cells = Vec::with_capacity(rows.len());
        for (row_key, _, _) in &rows {
            let mut row_cells = Vec::with_capacity(cols.len());
            for (col_key, _, _) in &cols {
                let mut combined: SmallVec<[ValueId; 8]> =
                    SmallVec::with_capacity(row_key.values.len() + col_key.values.len());
                combined.extend_from_slice(&row_key.values);
                combined.extend_from_slice(&col_key.values);
                let value = full
                    .get(&GroupKey::new(combined))
                    .map(|accs| finalize(accs, std::slice::from_ref(&resolved))[0])
                    .unwrap_or(identity);
                row_cells.push(value);
            }
            cells.push(row_cells);
        }

        let grand_total = grand
            .get(&GroupKey::new(SmallVec::new()))
            .map(|accs| finalize(accs, std::slice::from_ref(&resolved))[0])
            .unwrap_or(identity);

        tracing::debug!(
            rows = rows.len(),
            cols = cols.len(),
            measure = spec.measure.as_str(),
            "pivot"
        );

        Ok(PivotTable {
            row_dimensions: row_dimensions.iter().map(|s| s.to_string()).collect(),
            col_dimensions: col_dimensions.iter().map(|s| s.to_string()).collect(),
            spec: spec.clone(),
            row_keys: rows.iter().map(|(_, k, _)| k.clone()).collect(),
            col_keys: cols.iter().map(|(_, k, _)| k.clone()).collect(),
            cells,
            row_margins: rows.iter().map(|(_, _, m)| *m).collect(),
            col_margins: cols.iter().map(|(_, _, m)| *m).collect(),
            grand_total,
        })
    }

    /// The cell for `(row_keys[row], col_keys[col])`.
    pub fn cell(&self, row: usize, col: usize) -> AggValue {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .flatten()
    }

    pub fn row_count(&self) -> usize {
        self.row_keys.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_keys.len()
    }
}
