//! FILENAME: tests/test_properties.rs
//! Semantic properties of the aggregator: partition associativity, margin
//! correctness, roll-up/drill-down inversion, pivot margin independence
//! and determinism.

mod common;

use common::{project_records, project_session};
use cube_engine::{
    AggregationType, CacheValue, Catalog, CubeSession, DiceFilter, DimensionKey, Hierarchy,
    HierarchyLevel, KeyPart, MarginMode, MeasureSpec, OrderedFloat,
};
use fact_model::{build_project_facts, CategoryRules, FactTableBuilder, FactValue, Schema};

fn portfolio_session(records: &[fact_model::ProjectRecord]) -> CubeSession {
    let table = build_project_facts(records, &CategoryRules::default()).unwrap();
    CubeSession::new(&table, &Catalog::project_portfolio()).unwrap()
}

/// A session over (status, period, year, budget) rows, with status and
/// period as the cube dimensions and year available as a roll-up level.
fn period_session() -> CubeSession {
    let schema = Schema::new(["status", "period", "year", "budget"]).unwrap();
    let mut builder = FactTableBuilder::new(schema);
    for (status, period, year, budget) in [
        ("Closed", "2023-Q1", 2023.0, 100.0),
        ("Closed", "2023-Q2", 2023.0, 200.0),
        ("Closed", "2024-Q1", 2024.0, 300.0),
        ("Cancelled", "2023-Q2", 2023.0, 50.0),
        ("Cancelled", "2024-Q2", 2024.0, 150.0),
    ] {
        builder
            .push_row(vec![status.into(), period.into(), year.into(), budget.into()])
            .unwrap();
    }
    let catalog = Catalog::new(
        ["status", "period"],
        [("budget", AggregationType::Sum)],
    )
    .unwrap();
    CubeSession::new(&builder.build(), &catalog).unwrap()
}

#[test]
fn test_sum_and_count_associative_over_any_partition() {
    let records = project_records();
    let whole = portfolio_session(&records);
    let left = portfolio_session(&records[..5]);
    let right = portfolio_session(&records[5..]);

    let specs = [
        MeasureSpec::new("budget", AggregationType::Sum),
        MeasureSpec::new("budget", AggregationType::Count),
    ];
    let dims = ["status", "budget_category"];
    let whole_result = whole.aggregate(&dims, &specs, MarginMode::None).unwrap();
    let left_result = left.aggregate(&dims, &specs, MarginMode::None).unwrap();
    let right_result = right.aggregate(&dims, &specs, MarginMode::None).unwrap();

    assert!(!whole_result.is_empty());
    for entry in whole_result.iter() {
        let part_sum: f64 = [&left_result, &right_result]
            .iter()
            .filter_map(|r| r.get(&entry.key))
            .map(|values| values[0].unwrap_or(0.0))
            .sum();
        let part_count: f64 = [&left_result, &right_result]
            .iter()
            .filter_map(|r| r.get(&entry.key))
            .map(|values| values[1].unwrap_or(0.0))
            .sum();
        assert_eq!(entry.values[0], Some(part_sum));
        assert_eq!(entry.values[1], Some(part_count));
    }
}

#[test]
fn test_mean_recombines_from_sums_and_counts() {
    let records = project_records();
    let whole = portfolio_session(&records);
    let left = portfolio_session(&records[..5]);
    let right = portfolio_session(&records[5..]);

    // budget has no missing cells, so count equals the numeric count.
    let specs = [
        MeasureSpec::new("budget", AggregationType::Sum),
        MeasureSpec::new("budget", AggregationType::Count),
        MeasureSpec::new("budget", AggregationType::Mean),
    ];
    let dims = ["status"];
    let whole_result = whole.aggregate(&dims, &specs, MarginMode::None).unwrap();
    let left_result = left.aggregate(&dims, &specs, MarginMode::None).unwrap();
    let right_result = right.aggregate(&dims, &specs, MarginMode::None).unwrap();

    for entry in whole_result.iter() {
        let mut sum = 0.0;
        let mut count = 0.0;
        for part in [&left_result, &right_result] {
            if let Some(values) = part.get(&entry.key) {
                sum += values[0].unwrap_or(0.0);
                count += values[1].unwrap_or(0.0);
            }
        }
        let recombined = sum / count;
        let whole_mean = entry.values[2].unwrap();
        assert!((whole_mean - recombined).abs() < 1e-9);
    }
}

#[test]
fn test_grand_total_margin_matches_whole_table_aggregation() {
    let session = project_session();
    let specs = [
        MeasureSpec::new("budget", AggregationType::Sum),
        MeasureSpec::new("test_success_rate", AggregationType::Mean),
        MeasureSpec::new("budget", AggregationType::Count),
        MeasureSpec::new("budget", AggregationType::Min),
        MeasureSpec::new("budget", AggregationType::Max),
    ];

    let whole = session.aggregate(&[], &specs, MarginMode::None).unwrap();
    let whole_values = &whole.iter().next().unwrap().values;

    for dims in [
        vec!["status"],
        vec!["status", "budget_category"],
        vec!["client_code", "start_year", "quality_category"],
    ] {
        let result = session
            .aggregate(&dims, &specs, MarginMode::GrandTotal)
            .unwrap();
        let grand = result.grand_total().unwrap();
        assert_eq!(&grand.values, whole_values, "dims: {:?}", dims);
    }
}

#[test]
fn test_roll_up_coarser_level_equals_reaggregated_finer_level() {
    let session = period_session();
    let hierarchy = Hierarchy::new(
        "period",
        [
            HierarchyLevel::Column("period".to_string()),
            HierarchyLevel::Column("year".to_string()),
            HierarchyLevel::Total,
        ],
    );
    let specs = [MeasureSpec::new("budget", AggregationType::Sum)];
    let levels = session
        .roll_up(&hierarchy, &specs, MarginMode::None)
        .unwrap();

    // Re-aggregate the finest level by mapping each period to its year.
    let mut regrouped: Vec<(DimensionKey, f64)> = Vec::new();
    for entry in levels[0].iter() {
        let period = match &entry.key.parts[1] {
            KeyPart::Value(CacheValue::Text(p)) => p.clone(),
            other => panic!("unexpected period part {:?}", other),
        };
        let year: f64 = period[..4].parse().unwrap();
        let coarse_key = DimensionKey::new(vec![
            entry.key.parts[0].clone(),
            KeyPart::Value(CacheValue::Number(OrderedFloat(year))),
        ]);
        match regrouped.iter_mut().find(|(k, _)| *k == coarse_key) {
            Some((_, total)) => *total += entry.values[0].unwrap(),
            None => regrouped.push((coarse_key, entry.values[0].unwrap())),
        }
    }

    assert_eq!(levels[1].len(), regrouped.len());
    for (key, total) in &regrouped {
        assert_eq!(levels[1].get(key), Some(&[Some(*total)][..]));
    }

    // The terminal level collapses the period slot per remaining group.
    let closed_total = DimensionKey::new(vec![
        KeyPart::Value(CacheValue::Text("Closed".to_string())),
        KeyPart::Value(CacheValue::Text("TOTAL".to_string())),
    ]);
    assert_eq!(levels[2].get(&closed_total), Some(&[Some(600.0)][..]));
}

#[test]
fn test_drill_down_inverts_roll_up_between_adjacent_levels() {
    let session = period_session();
    let specs = [
        MeasureSpec::new("budget", AggregationType::Sum),
        MeasureSpec::new("budget", AggregationType::Count),
    ];

    // Parent bucket at the coarse level.
    let by_period = session
        .aggregate(&["period"], &specs, MarginMode::None)
        .unwrap();
    let parent_key = DimensionKey::new(vec![KeyPart::Value(CacheValue::Text(
        "2023-Q2".to_string(),
    ))]);
    let parent_values = by_period.get(&parent_key).unwrap().to_vec();

    // Drill into the parent, then roll the children back up: the margin
    // over the drilled buckets must reproduce the parent bucket exactly.
    let drilled = session
        .drill_down(
            "period",
            &FactValue::from("2023-Q2"),
            "status",
            &specs,
            MarginMode::GrandTotal,
        )
        .unwrap();
    assert_eq!(drilled.grand_total().unwrap().values, parent_values);

    // Both statuses contributed to 2023-Q2.
    assert_eq!(drilled.buckets().count(), 2);
}

#[test]
fn test_pivot_margins_independent_of_identity_fill() {
    let session = project_session();
    let spec = MeasureSpec::new("test_success_rate", AggregationType::Mean);
    let table = session
        .pivot(&["budget_category"], &["status"], &spec)
        .unwrap();

    // The (Mega, Cancelled) hole is filled with the mean identity.
    let mega_row = table
        .row_keys
        .iter()
        .position(|k| k.to_string() == "(Mega)")
        .unwrap();
    let cancelled_col = table
        .col_keys
        .iter()
        .position(|k| k.to_string() == "(Cancelled)")
        .unwrap();
    assert_eq!(table.cells[mega_row][cancelled_col], None);

    // Margins must equal direct raw-bucket aggregation of each axis.
    let specs = std::slice::from_ref(&spec);
    let by_category = session
        .aggregate(&["budget_category"], specs, MarginMode::None)
        .unwrap();
    for (key, margin) in table.row_keys.iter().zip(&table.row_margins) {
        assert_eq!(by_category.get(key).unwrap()[0], *margin);
    }

    let by_status = session
        .aggregate(&["status"], specs, MarginMode::None)
        .unwrap();
    for (key, margin) in table.col_keys.iter().zip(&table.col_margins) {
        assert_eq!(by_status.get(key).unwrap()[0], *margin);
    }

    let whole = session.aggregate(&[], specs, MarginMode::None).unwrap();
    assert_eq!(whole.iter().next().unwrap().values[0], table.grand_total);
}

#[test]
fn test_operations_are_deterministic() {
    let session = project_session();
    let specs = session.default_specs();

    let slice_a = session
        .slice("status", &FactValue::from("Closed"), &specs, MarginMode::Full)
        .unwrap();
    let slice_b = session
        .slice("status", &FactValue::from("Closed"), &specs, MarginMode::Full)
        .unwrap();
    assert_eq!(slice_a, slice_b);

    let filters = [DiceFilter::any_of(
        "budget_category",
        vec![FactValue::from("Large"), FactValue::from("Mega")],
    )];
    let dice_a = session
        .dice(&filters, &specs, MarginMode::GrandTotal)
        .unwrap();
    let dice_b = session
        .dice(&filters, &specs, MarginMode::GrandTotal)
        .unwrap();
    assert_eq!(dice_a, dice_b);

    let pivot_spec = MeasureSpec::new("budget", AggregationType::Sum);
    let pivot_a = session
        .pivot(&["client_code"], &["status"], &pivot_spec)
        .unwrap();
    let pivot_b = session
        .pivot(&["client_code"], &["status"], &pivot_spec)
        .unwrap();
    assert_eq!(pivot_a, pivot_b);
}
