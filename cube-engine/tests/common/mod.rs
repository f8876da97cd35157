//! FILENAME: tests/common/mod.rs
//! Shared fixtures for cube-engine integration tests.

#![allow(dead_code)]

use cube_engine::{AggregationType, Catalog, CubeSession};
use fact_model::{build_project_facts, CategoryRules, FactTable, ProjectRecord};

/// One raw project record with the fields the tests care about spelled
/// out; the remaining KPI measures are filled with plausible values.
pub fn record(
    client: &str,
    cancelled: bool,
    year: i32,
    month: u32,
    budget: f64,
    real_cost: f64,
    productivity: Option<f64>,
    test_rate: Option<f64>,
) -> ProjectRecord {
    ProjectRecord {
        client_code: Some(client.to_string()),
        cancelled,
        start_year: year,
        start_month: month,
        budget,
        real_cost,
        budget_deviation: budget - real_cost,
        average_productivity: productivity,
        test_success_rate: test_rate,
        percent_late_tasks: Some(10.0),
        percent_late_milestones: Some(5.0),
        error_rate: Some(0.1),
        penalty_amount: None,
    }
}

/// Ten projects across three clients, two years and both statuses.
/// Budget categories cover Small through Mega; the (Mega, Cancelled)
/// combination is deliberately absent so pivots have a hole to fill.
pub fn project_records() -> Vec<ProjectRecord> {
    vec![
        record("CL-A", false, 2023, 2, 40_000.0, 35_000.0, Some(150.0), Some(0.95)),
        record("CL-A", false, 2023, 5, 80_000.0, 90_000.0, Some(300.0), Some(0.90)),
        record("CL-A", true, 2023, 8, 150_000.0, 180_000.0, None, None),
        record("CL-B", false, 2023, 11, 60_000.0, 60_000.0, Some(450.0), Some(0.85)),
        record("CL-B", false, 2024, 1, 120_000.0, 100_000.0, Some(500.0), Some(0.80)),
        record("CL-B", true, 2024, 4, 30_000.0, 45_000.0, None, None),
        record("CL-C", false, 2024, 7, 250_000.0, 240_000.0, Some(700.0), Some(0.97)),
        record("CL-C", false, 2024, 10, 90_000.0, 95_000.0, Some(380.0), Some(0.70)),
        record("CL-C", true, 2023, 3, 70_000.0, 20_000.0, Some(220.0), Some(0.60)),
        record("CL-A", false, 2024, 6, 180_000.0, 160_000.0, Some(650.0), Some(0.88)),
    ]
}

pub fn project_table() -> FactTable {
    build_project_facts(&project_records(), &CategoryRules::default())
        .expect("fixture records match the project schema")
}

pub fn project_session() -> CubeSession {
    CubeSession::new(&project_table(), &Catalog::project_portfolio())
        .expect("fixture table satisfies the portfolio catalog")
}

/// The worked example from the engine documentation: one `status`
/// dimension, one `budget` measure, five rows.
pub fn status_budget_session() -> CubeSession {
    use fact_model::{FactTableBuilder, Schema};

    let schema = Schema::new(["status", "budget"]).unwrap();
    let mut builder = FactTableBuilder::new(schema);
    for (status, budget) in [
        ("Closed", 100.0),
        ("Closed", 200.0),
        ("Cancelled", 50.0),
        ("Closed", 300.0),
        ("Cancelled", 150.0),
    ] {
        builder.push_row(vec![status.into(), budget.into()]).unwrap();
    }
    let table = builder.build();

    let catalog = Catalog::new(["status"], [("budget", AggregationType::Sum)]).unwrap();
    CubeSession::new(&table, &catalog).unwrap()
}
