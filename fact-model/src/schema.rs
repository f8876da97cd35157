//! FILENAME: fact-model/src/schema.rs
//! PURPOSE: Describes the fixed column layout shared by all rows of a table.
//! CONTEXT: A `Schema` is an ordered list of uniquely named columns. Rows
//! are stored positionally; the schema is the single place where names are
//! translated to positions. The cube engine's catalog layers dimension /
//! measure roles on top of these names — the schema itself is role-agnostic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a column within a schema (0-based).
pub type ColumnId = usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

/// Ordered, uniquely named columns of a fact table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Builds a schema from column names, rejecting duplicates.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, SchemaError> {
        let mut columns: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if columns.iter().any(|c| c == &name) {
                return Err(SchemaError::DuplicateColumn(name));
            }
            columns.push(name);
        }
        Ok(Schema { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a named column, or `None` if absent.
    pub fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a named column, with the offending name on failure.
    pub fn require(&self, name: &str) -> Result<ColumnId, SchemaError> {
        self.column_id(name)
            .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))
    }

    pub fn column_name(&self, id: ColumnId) -> Option<&str> {
        self.columns.get(id).map(|s| s.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|s| s.as_str())
    }
}
