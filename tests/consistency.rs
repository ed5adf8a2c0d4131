mod common;

use common::{NAN, handle, i, ints, s, texts};
use csv_audit::consistency::{
    ConsistencySpec, consistency_check, consistency_report, discrete_distance,
};
use csv_audit::dataset::TableHandle;
use csv_audit::error::AuditError;

fn t1() -> TableHandle {
    handle(
        "t1",
        vec![
            ("A", ints(&[1, 2, 3, 1, 4, 5])),
            ("B", texts(&["a", "b", "c", "a", "d", "e"])),
            ("C", texts(&["X", "Y", "Z", "X", "V", "W"])),
            ("D", texts(&["alfa", "beta", "gamma", "alfa", "delta", "epsilon"])),
            ("E", ints(&[11, 22, 33, 11, 44, 55])),
        ],
    )
}

fn t2() -> TableHandle {
    handle(
        "t2",
        vec![
            ("A", ints(&[1, 2, 4, 1, 5, 4])),
            ("B", texts(&["a", "b", "d", "a", "e", "d"])),
            ("C", texts(&["X", "Y", "V", "X", "W", "V"])),
            ("D", texts(&["alfa", "beta", "delta", "alfa", "epsilon", "delta"])),
            ("E", ints(&[11, 22, 44, 11, 55, 44])),
        ],
    )
}

fn t3() -> TableHandle {
    handle(
        "t3",
        vec![
            ("A", ints(&[1, 2, 4, 1, 5, 4])),
            ("B", vec![s("a"), NAN, s("c"), s("f"), s("d"), s("e")]),
            ("C", texts(&["X", "Y", "Z", "T", "V", "W"])),
            ("D", texts(&["alfa", "theta", "gamma", "alfa", "delta", "epsilon"])),
            ("E", ints(&[11, 22, 33, 11, 44, 55])),
        ],
    )
}

fn t4() -> TableHandle {
    handle(
        "t4",
        vec![
            ("A", ints(&[1, 2, 4, 1, 5, 4])),
            ("B", vec![s("a"), NAN, NAN, s("f"), s("d"), s("e")]),
            ("C", texts(&["X", "Y", "Z", "T", "V", "W"])),
            ("D", texts(&["alfa", "theta", "gamma", "alfa", "delta", "epsilon"])),
            ("E", ints(&[11, 22, 33, 11, 44, 55])),
        ],
    )
}

#[test]
fn identical_sources_agree() {
    let spec = ConsistencySpec::new("A", "A", &["B", "C", "D", "E"], &["B", "C", "D", "E"]);
    assert_eq!(consistency_check(&t1(), &t2(), &spec).unwrap(), vec![0, 0, 0, 0]);
    let spec = ConsistencySpec::new("B", "B", &["D", "C"], &["D", "C"]);
    assert_eq!(consistency_check(&t1(), &t2(), &spec).unwrap(), vec![0, 0]);
}

#[test]
fn counts_mismatches_per_dependent_column() {
    let spec = ConsistencySpec::new("A", "A", &["B", "C"], &["B", "C"]);
    assert_eq!(consistency_check(&t1(), &t3(), &spec).unwrap(), vec![5, 4]);
}

#[test]
fn text_identifiers_join_tables() {
    let spec = ConsistencySpec::new("D", "D", &["E", "C"], &["E", "C"]);
    assert_eq!(consistency_check(&t1(), &t4(), &spec).unwrap(), vec![0, 1]);
}

#[test]
fn two_missing_cells_are_consistent() {
    let spec = ConsistencySpec::new("C", "C", &["B"], &["B"]);
    assert_eq!(consistency_check(&t3(), &t4(), &spec).unwrap(), vec![1]);
}

#[test]
fn report_tracks_matched_rows() {
    let spec = ConsistencySpec::new("A", "A", &["B", "C"], &["B", "C"]);
    let report = consistency_report(&t1(), &t3(), &spec).unwrap();
    assert_eq!(report.compared_rows, 6);
    assert_eq!(report.matched_rows, 6);
    assert_eq!(
        report.percentages(),
        vec![("B".to_string(), 83.33), ("C".to_string(), 66.67)]
    );
}

#[test]
fn percentages_use_matched_rows_only() {
    let a = handle("a", vec![("id", ints(&[1])), ("v", texts(&["x"]))]);
    let b = handle(
        "b",
        vec![("id", ints(&[1, 2, 3, 4])), ("v", texts(&["y", "q", "r", "s"]))],
    );
    let spec = ConsistencySpec::new("id", "id", &["v"], &["v"]);
    let report = consistency_report(&a, &b, &spec).unwrap();
    assert_eq!(report.matched_rows, 1);
    assert_eq!(report.compared_rows, 4);
    assert_eq!(report.percentages(), vec![("v".to_string(), 100.0)]);
}

#[test]
fn no_matched_rows_means_zero_percent() {
    let a = handle("a", vec![("id", ints(&[1])), ("v", texts(&["x"]))]);
    let b = handle("b", vec![("id", ints(&[2])), ("v", texts(&["y"]))]);
    let spec = ConsistencySpec::new("id", "id", &["v"], &["v"]);
    let report = consistency_report(&a, &b, &spec).unwrap();
    assert_eq!(report.matched_rows, 0);
    assert_eq!(report.mismatches, vec![("v".to_string(), 0)]);
    assert_eq!(report.percentages(), vec![("v".to_string(), 0.0)]);
}

#[test]
fn sparse_identifier_column_is_rejected() {
    let left = handle("left", vec![("id", vec![i(1), NAN]), ("v", texts(&["a", "b"]))]);
    let spec = ConsistencySpec::new("id", "A", &["v"], &["B"]);
    let err = consistency_check(&left, &t1(), &spec).unwrap_err();
    match err {
        AuditError::InsufficientKeyCoverage {
            left_null_percent,
            right_null_percent,
            ..
        } => {
            assert_eq!(left_null_percent, 50.0);
            assert_eq!(right_null_percent, 0.0);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn a_lenient_threshold_lets_sparse_keys_through() {
    let left = handle("left", vec![("id", vec![i(1), NAN]), ("v", texts(&["A", "b"]))]);
    let right = handle("right", vec![("id", ints(&[1])), ("v", texts(&["a"]))]);
    let spec = ConsistencySpec::new("id", "id", &["v"], &["v"]).with_threshold(0.6);
    assert_eq!(consistency_check(&left, &right, &spec).unwrap(), vec![0]);
}

#[test]
fn dependent_lists_must_pair_up() {
    let spec = ConsistencySpec::new("A", "A", &["B", "C"], &["B"]);
    let err = consistency_check(&t1(), &t2(), &spec).unwrap_err();
    assert_eq!(
        err,
        AuditError::SchemaMismatch {
            table: "t1".to_string(),
            column: "C".to_string()
        }
    );
}

#[test]
fn absent_columns_are_schema_mismatches() {
    let spec = ConsistencySpec::new("A", "A", &["Q"], &["B"]);
    assert!(matches!(
        consistency_check(&t1(), &t2(), &spec),
        Err(AuditError::SchemaMismatch { .. })
    ));
}

#[test]
fn discrete_distance_is_loose_on_case_and_numeric_kind() {
    assert_eq!(discrete_distance(&s("Rosario"), &s("ROSARIO")), 0);
    assert_eq!(discrete_distance(&i(3), &common::f(3.0)), 0);
    assert_eq!(discrete_distance(&NAN, &NAN), 0);
    assert_eq!(discrete_distance(&NAN, &s("x")), 1);
}
