//! Tests for RecordValidator

use rstest::rstest;
use serde_json::json;

use orgtree::domain::{ColumnMapping, EmployeeRecord, RecordValidator, ValidationRules};
use orgtree::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn rec(id: &str, name: &str, manager: Option<&str>) -> EmployeeRecord {
    let record = EmployeeRecord::new(id, name);
    match manager {
        Some(m) => record.with_manager(m),
        None => record,
    }
}

fn validator() -> RecordValidator {
    RecordValidator::new(ValidationRules::default())
}

#[test]
fn given_clean_batch_when_validating_then_no_errors_or_warnings() {
    // Arrange
    let records = vec![
        rec("1", "Alice", None),
        rec("2", "Bob", Some("1")),
        rec("3", "Cara", Some("1")),
    ];

    // Act
    let report = validator().validate(&records);

    // Assert
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.valid_rows, 3);
    assert_eq!(report.stats.total_employees, 3);
    assert_eq!(report.stats.unique_managers, 1);
    assert_eq!(report.stats.hierarchy_levels, 2);
    assert_eq!(report.stats.average_team_size, 2.0);
    assert!(report.can_finalize());
}

#[test]
fn given_duplicate_ids_when_validating_then_one_error_names_second_row() {
    // Arrange
    let records = vec![rec("1", "Root", None), rec("5", "First", Some("1")), rec("5", "Second", Some("1"))];

    // Act
    let report = validator().validate(&records);

    // Assert
    assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
    assert!(report.errors[0].contains("Row 3"));
    assert!(report.errors[0].contains("duplicate employee ID '5'"));
    assert!(report.errors[0].contains("first seen at row 2"));
    assert_eq!(report.stats.total_employees, 2);
    assert!(report.is_blocking());
}

#[test]
fn given_whitespace_variant_of_id_when_validating_then_counts_as_duplicate() {
    let records = vec![rec("7", "A", None), rec(" 7 ", "B", None)];

    let report = validator().validate(&records);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Row 2"));
}

#[test]
fn given_missing_id_and_name_when_validating_then_two_errors_and_not_valid() {
    // Arrange
    let records = vec![rec("1", "Alice", None), EmployeeRecord::default()];

    // Act
    let report = validator().validate(&records);

    // Assert
    assert_eq!(report.errors.len(), 2, "{:?}", report.errors);
    assert!(report.errors[0].contains("Row 2: missing employee ID"));
    assert!(report.errors[1].contains("Row 2: missing employee name"));
    assert_eq!(report.valid_rows, 1);
}

#[test]
fn given_blank_name_when_validating_then_missing_name_error() {
    let records = vec![rec("1", "   ", None)];

    let report = validator().validate(&records);

    assert_eq!(report.errors, vec!["Row 1: missing employee name".to_string()]);
    assert_eq!(report.valid_rows, 0);
}

#[test]
fn given_self_managed_employee_when_validating_then_blocking_error() {
    let records = vec![rec("1", "Alice", Some("1"))];

    let report = validator().validate(&records);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("cannot report to themselves"));
    // a self reference is not an orphaned manager
    assert!(report.warnings.is_empty());
}

#[rstest]
#[case(json!("abc"), true)]
#[case(json!(-1), true)]
#[case(json!(2.5), true)]
#[case(json!("1.5"), false)]
#[case(json!(0), false)]
#[case(json!(2), false)]
fn given_fte_value_when_validating_then_warns_only_when_invalid(
    #[case] fte: serde_json::Value,
    #[case] expect_warning: bool,
) {
    // Arrange
    let rows = json!([{"id": "1", "name": "Alice", "fte": fte}]);

    // Act
    let report = validator().validate_value(&rows, &ColumnMapping::default());

    // Assert
    assert!(report.errors.is_empty());
    assert_eq!(
        report.warnings.iter().any(|w| w.contains("Invalid FTE")),
        expect_warning,
        "{:?}",
        report.warnings
    );
    assert!(report.can_finalize());
}

#[test]
fn given_many_orphaned_managers_when_validating_then_single_aggregated_warning() {
    // Arrange
    let mut records = vec![rec("root", "Root", None)];
    for i in 1..=7 {
        records.push(rec(&format!("e{}", i), "Someone", Some(&format!("m{}", i))));
    }

    // Act
    let report = validator().validate(&records);

    // Assert
    assert_eq!(report.warnings.len(), 1, "{:?}", report.warnings);
    let warning = &report.warnings[0];
    assert!(warning.contains("7 manager ID(s)"));
    assert!(warning.contains("m1, m2, m3, m4, m5"));
    assert!(!warning.contains("m6"));
    assert!(warning.contains("and 2 more"));
    assert_eq!(report.stats.orphaned_managers, 7);
    assert!(report.can_finalize());
}

#[test]
fn given_orphan_preview_rule_when_validating_then_lists_that_many() {
    let rules = ValidationRules {
        orphan_preview: 1,
        ..ValidationRules::default()
    };
    let records = vec![rec("1", "A", Some("x")), rec("2", "B", Some("y"))];

    let report = RecordValidator::new(rules).validate(&records);

    assert!(report.warnings[0].contains(": x and 1 more"));
}

#[test]
fn given_manager_chain_when_validating_then_counts_levels() {
    let records = vec![
        rec("1", "A", None),
        rec("2", "B", Some("1")),
        rec("3", "C", Some("2")),
        rec("4", "D", Some("3")),
        rec("5", "E", Some("1")),
    ];

    let report = validator().validate(&records);

    assert_eq!(report.stats.hierarchy_levels, 4);
}

#[test]
fn given_only_a_cycle_when_validating_then_levels_zero_and_terminates() {
    let records = vec![rec("a", "A", Some("b")), rec("b", "B", Some("a"))];

    let report = validator().validate(&records);

    assert_eq!(report.stats.hierarchy_levels, 0);
    assert!(report.errors.is_empty());
}

#[test]
fn given_uneven_teams_when_validating_then_average_rounded_to_one_decimal() {
    // 1 has two reports, 2 has one, 4 has none
    let records = vec![
        rec("1", "A", None),
        rec("2", "B", Some("1")),
        rec("3", "C", Some("1")),
        rec("4", "D", Some("2")),
    ];

    let report = validator().validate(&records);

    assert_eq!(report.stats.average_team_size, 1.5);
    assert_eq!(report.stats.unique_managers, 2);
}

#[test]
fn given_no_managers_when_validating_then_average_team_size_zero() {
    let records = vec![rec("1", "A", None), rec("2", "B", None)];

    let report = validator().validate(&records);

    assert_eq!(report.stats.average_team_size, 0.0);
}

#[test]
fn given_non_array_input_when_validating_then_single_error_and_zero_stats() {
    // Act
    let report = validator().validate_value(&json!({"id": 1}), &ColumnMapping::default());

    // Assert
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("expected an array"));
    assert_eq!(report.total_rows, 0);
    assert_eq!(report.valid_rows, 0);
    assert_eq!(report.stats.total_employees, 0);
    assert!(report.is_blocking());
}

#[test]
fn given_non_object_rows_when_validating_then_reported_as_missing_fields() {
    let report = validator().validate_value(&json!([42, "x"]), &ColumnMapping::default());

    assert_eq!(report.total_rows, 2);
    assert_eq!(report.errors.len(), 4);
}
