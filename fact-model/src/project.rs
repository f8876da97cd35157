//! FILENAME: fact-model/src/project.rs
//! PURPOSE: The fact-table-builder stage for project portfolio analysis.
//! CONTEXT: Warehouse extraction delivers one raw record per completed or
//! cancelled project. This module derives the analytic dimension columns
//! (status label, budget/productivity/quality categories, deviation type,
//! start period) and lays records out as fact rows, so the cube engine
//! stays schema-agnostic and testable with synthetic data.

use serde::{Deserialize, Serialize};

use crate::schema::Schema;
use crate::table::{FactTable, FactTableBuilder, TableError};
use crate::value::FactValue;

/// Column names of the denormalized project fact table.
pub mod columns {
    pub const CLIENT_CODE: &str = "client_code";
    pub const STATUS: &str = "status";
    pub const START_YEAR: &str = "start_year";
    pub const START_PERIOD: &str = "start_period";
    pub const BUDGET_CATEGORY: &str = "budget_category";
    pub const DEVIATION_TYPE: &str = "deviation_type";
    pub const PRODUCTIVITY_CATEGORY: &str = "productivity_category";
    pub const QUALITY_CATEGORY: &str = "quality_category";

    pub const BUDGET: &str = "budget";
    pub const REAL_COST: &str = "real_cost";
    pub const BUDGET_DEVIATION: &str = "budget_deviation";
    pub const AVERAGE_PRODUCTIVITY: &str = "average_productivity";
    pub const TEST_SUCCESS_RATE: &str = "test_success_rate";
    pub const PERCENT_LATE_TASKS: &str = "percent_late_tasks";
    pub const PERCENT_LATE_MILESTONES: &str = "percent_late_milestones";
    pub const ERROR_RATE: &str = "error_rate";
    pub const PENALTY_AMOUNT: &str = "penalty_amount";

    pub const DIMENSIONS: [&str; 8] = [
        CLIENT_CODE,
        STATUS,
        START_YEAR,
        START_PERIOD,
        BUDGET_CATEGORY,
        DEVIATION_TYPE,
        PRODUCTIVITY_CATEGORY,
        QUALITY_CATEGORY,
    ];

    pub const MEASURES: [&str; 9] = [
        BUDGET,
        REAL_COST,
        BUDGET_DEVIATION,
        AVERAGE_PRODUCTIVITY,
        TEST_SUCCESS_RATE,
        PERCENT_LATE_TASKS,
        PERCENT_LATE_MILESTONES,
        ERROR_RATE,
        PENALTY_AMOUNT,
    ];
}

/// One raw project record as extracted from the warehouse views.
/// Optional fields reflect left-joined sources that may carry no data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub client_code: Option<String>,
    pub cancelled: bool,
    pub start_year: i32,
    /// 1-based calendar month of the project start.
    pub start_month: u32,
    pub budget: f64,
    pub real_cost: f64,
    /// budget - real_cost: negative means the project ran over budget.
    pub budget_deviation: f64,
    pub average_productivity: Option<f64>,
    /// Fraction in [0, 1].
    pub test_success_rate: Option<f64>,
    pub percent_late_tasks: Option<f64>,
    pub percent_late_milestones: Option<f64>,
    pub error_rate: Option<f64>,
    pub penalty_amount: Option<f64>,
}

/// Bin edges for the derived category dimensions. A value in `(edge[i-1],
/// edge[i]]` falls into bin `i`; values at or below zero or above the last
/// edge fall outside every bin and yield an empty category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRules {
    /// Upper edges of the Small / Medium / Large budget bins; anything
    /// above the last edge is Mega.
    pub budget_edges: [f64; 3],
    /// Upper edges of the Low / Medium / High productivity bins; above the
    /// last edge is Very High.
    pub productivity_edges: [f64; 3],
    /// Upper edges of the Low / Medium / High quality bins on the test
    /// success rate; above the last edge (up to 1.0) is Excellent.
    pub quality_edges: [f64; 3],
}

impl Default for CategoryRules {
    fn default() -> Self {
        CategoryRules {
            budget_edges: [50_000.0, 100_000.0, 200_000.0],
            productivity_edges: [200.0, 400.0, 600.0],
            quality_edges: [0.70, 0.85, 0.95],
        }
    }
}

const BUDGET_LABELS: [&str; 4] = ["Small", "Medium", "Large", "Mega"];
const PRODUCTIVITY_LABELS: [&str; 4] = ["Low", "Medium", "High", "Very High"];
const QUALITY_LABELS: [&str; 4] = ["Low", "Medium", "High", "Excellent"];

/// Half-open binning over `(0, e0] (e0, e1] (e1, e2] (e2, cap]`.
/// Returns the bin index, or `None` when the value is out of range.
fn bin_index(value: f64, edges: &[f64; 3], cap: f64) -> Option<usize> {
    if !value.is_finite() || value <= 0.0 || value > cap {
        return None;
    }
    for (i, edge) in edges.iter().enumerate() {
        if value <= *edge {
            return Some(i);
        }
    }
    Some(edges.len())
}

fn category(value: Option<f64>, edges: &[f64; 3], cap: f64, labels: &[&str; 4]) -> FactValue {
    match value.and_then(|v| bin_index(v, edges, cap)) {
        Some(i) => FactValue::Text(labels[i].to_string()),
        None => FactValue::Empty,
    }
}

fn opt_number(value: Option<f64>) -> FactValue {
    match value {
        Some(n) => FactValue::Number(n),
        None => FactValue::Empty,
    }
}

impl ProjectRecord {
    pub fn status_label(&self) -> &'static str {
        if self.cancelled { "Cancelled" } else { "Closed" }
    }

    /// Quarter label of the project start, e.g. "2023-Q2".
    pub fn start_period(&self) -> String {
        let quarter = (self.start_month.clamp(1, 12) - 1) / 3 + 1;
        format!("{}-Q{}", self.start_year, quarter)
    }

    pub fn deviation_type(&self) -> &'static str {
        if self.budget_deviation < 0.0 {
            "Over Budget"
        } else if self.budget_deviation > 0.0 {
            "Under Budget"
        } else {
            "On Budget"
        }
    }

    /// Lays the record out as a fact row in `project_schema()` column order.
    fn to_row(&self, rules: &CategoryRules) -> Vec<FactValue> {
        vec![
            match &self.client_code {
                Some(code) => FactValue::Text(code.clone()),
                None => FactValue::Empty,
            },
            FactValue::Text(self.status_label().to_string()),
            FactValue::Number(self.start_year as f64),
            FactValue::Text(self.start_period()),
            category(Some(self.budget), &rules.budget_edges, f64::INFINITY, &BUDGET_LABELS),
            FactValue::Text(self.deviation_type().to_string()),
            category(
                self.average_productivity,
                &rules.productivity_edges,
                f64::INFINITY,
                &PRODUCTIVITY_LABELS,
            ),
            category(self.test_success_rate, &rules.quality_edges, 1.0, &QUALITY_LABELS),
            FactValue::Number(self.budget),
            FactValue::Number(self.real_cost),
            FactValue::Number(self.budget_deviation),
            opt_number(self.average_productivity),
            opt_number(self.test_success_rate),
            opt_number(self.percent_late_tasks),
            opt_number(self.percent_late_milestones),
            opt_number(self.error_rate),
            opt_number(self.penalty_amount),
        ]
    }
}

/// The fixed schema of the project fact table: dimensions then measures.
pub fn project_schema() -> Schema {
    let names = columns::DIMENSIONS
        .iter()
        .chain(columns::MEASURES.iter())
        .copied();
    // Static name lists above cannot collide.
    Schema::new(names).expect("project schema column names are unique")
}

/// Builds the denormalized fact table for a batch of project records.
pub fn build_project_facts(
    records: &[ProjectRecord],
    rules: &CategoryRules,
) -> Result<FactTable, TableError> {
    let mut builder = FactTableBuilder::new(project_schema());
    builder.reserve(records.len());
    for record in records {
        builder.push_row(record.to_row(rules))?;
    }
    Ok(builder.build())
}
