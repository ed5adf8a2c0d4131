mod common;

use common::{NAN, cols, handle, i, ints, s, texts};
use csv_audit::dataset::TableHandle;
use csv_audit::dependency::{candidate_dependencies, column_preserves_uniqueness};
use csv_audit::error::AuditError;
use csv_audit::select;

fn operators() -> TableHandle {
    handle(
        "operators",
        vec![
            ("razon_social", texts(&["Alfa SA", "Alfa SA", "Beta SRL", "Gamma"])),
            ("establecimiento", texts(&["norte", "sur", "norte", "norte"])),
            ("provincia", texts(&["Salta", "Salta", "Jujuy", "Salta"])),
            ("rubro", texts(&["miel", "miel", "yerba", "miel"])),
            ("certificadora", vec![i(1), i(2), i(1), NAN]),
        ],
    )
}

#[test]
fn distinct_projection_keeps_first_seen_order() {
    let projected = select::distinct_projection(&operators(), &cols(&["provincia", "rubro"])).unwrap();
    assert_eq!(projected.headers(), ["provincia", "rubro"]);
    assert_eq!(
        projected.rows(),
        &[vec![s("Salta"), s("miel")], vec![s("Jujuy"), s("yerba")]]
    );
}

#[test]
fn distinct_values_of_a_column() {
    let values = select::distinct_values(&operators(), "certificadora").unwrap();
    assert_eq!(values, vec![i(1), i(2), NAN]);
}

#[test]
fn tuples_work_on_bare_tables() {
    let handle = operators();
    let projected = select::tuples(&handle.table, &cols(&["rubro"]), None).unwrap();
    assert_eq!(projected.row_count(), 4);
    assert_eq!(projected.headers(), ["rubro"]);
}

#[test]
fn with_columns_builds_a_projected_handle() {
    let base = operators();
    let narrowed = TableHandle::with_columns("narrow", &base.table, &cols(&["rubro"])).unwrap();
    assert_eq!(narrowed.name, "narrow");
    assert_eq!(narrowed.table.column_count(), 1);
}

#[test]
fn dependent_columns_keep_the_distinct_count() {
    let table = operators();
    let key = cols(&["razon_social", "establecimiento"]);
    assert!(column_preserves_uniqueness(&table, &key, "rubro").unwrap());
    assert!(column_preserves_uniqueness(&table, &cols(&["razon_social"]), "provincia").unwrap());
    assert!(!column_preserves_uniqueness(&table, &cols(&["rubro"]), "establecimiento").unwrap());
}

#[test]
fn candidates_exclude_the_determining_columns() {
    let table = operators();
    let found = candidate_dependencies(&table, &cols(&["razon_social"])).unwrap();
    assert_eq!(found, vec!["provincia".to_string(), "rubro".to_string()]);
    let found = candidate_dependencies(&table, &cols(&["provincia"])).unwrap();
    assert_eq!(found, vec!["rubro".to_string()]);
}

#[test]
fn an_empty_determining_set_is_rejected() {
    let table = handle("t", vec![("a", ints(&[1]))]);
    assert!(matches!(
        column_preserves_uniqueness(&table, &[], "a"),
        Err(AuditError::InputContractViolation { .. })
    ));
}
