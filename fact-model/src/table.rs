//! FILENAME: fact-model/src/table.rs
//! PURPOSE: The immutable fact table — one row per analyzed entity.
//! CONTEXT: This file defines `FactTable`, the container handed to the cube
//! engine, and `FactTableBuilder`, the only way to construct one. A sealed
//! table never changes; row order is irrelevant for aggregation and only
//! matters for reproducing source rows in drill-through listings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{ColumnId, Schema};
use crate::value::FactValue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("row has {got} values, schema has {expected} columns")]
    ArityMismatch { expected: usize, got: usize },
}

/// An immutable, ordered sequence of rows sharing one schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactTable {
    schema: Schema,
    rows: Vec<Vec<FactValue>>,
}

impl FactTable {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The values of one row, in schema column order.
    pub fn row(&self, index: usize) -> Option<&[FactValue]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[FactValue]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Single cell access by row index and column position.
    pub fn value(&self, row: usize, column: ColumnId) -> Option<&FactValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// Accumulates rows against a fixed schema, then seals into a `FactTable`.
#[derive(Debug)]
pub struct FactTableBuilder {
    schema: Schema,
    rows: Vec<Vec<FactValue>>,
}

impl FactTableBuilder {
    pub fn new(schema: Schema) -> Self {
        FactTableBuilder {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.rows.reserve(additional);
    }

    /// Appends one row. The row must match the schema arity exactly.
    pub fn push_row(&mut self, row: Vec<FactValue>) -> Result<(), TableError> {
        if row.len() != self.schema.len() {
            return Err(TableError::ArityMismatch {
                expected: self.schema.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Seals the builder into an immutable table.
    pub fn build(self) -> FactTable {
        FactTable {
            schema: self.schema,
            rows: self.rows,
        }
    }
}
