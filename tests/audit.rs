mod common;

use std::fs;

use common::{NAN, TestWorkspace, column_values, i, s};
use csv_audit::audit::{self, Workspace};
use csv_audit::data::Value;
use csv_audit::io_utils::{self, ReadOptions};
use csv_audit::plan::AuditPlan;

const T1: &str = "\
A,B,C,D,E
1,a,X,alfa,11
2,b,Y,beta,22
3,c,Z,gamma,33
1,a,X,alfa,11
4,d,V,delta,44
5,e,W,epsilon,55
";

const T3: &str = "\
A;B;C;D;E
1;a;X;alfa;11
2;;Y;theta;22
4;c;Z;gamma;33
1;f;T;alfa;11
5;d;V;delta;44
4;e;W;epsilon;55
";

fn write_plan(workspace: &TestWorkspace, body: &str) -> AuditPlan {
    workspace.write("t1.csv", T1);
    workspace.write("t3.csv", T3);
    let path = workspace.write("plan.yaml", body);
    AuditPlan::load(&path).expect("load plan")
}

#[test]
fn read_table_infers_types_and_missing_cells() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("t3.csv", T3);
    let options = ReadOptions::new(Some(b';'), None).unwrap();
    let table = io_utils::read_table(&path, &options).unwrap();
    assert_eq!(table.headers(), ["A", "B", "C", "D", "E"]);
    assert_eq!(table.rows()[0][0], i(1));
    assert_eq!(table.rows()[1][1], NAN);
    assert_eq!(table.rows()[3][1], s("f"));
}

#[test]
fn latin1_input_round_trips() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("latin.csv", b"provincia,anio\nC\xf3rdoba,2021\nNeuqu\xe9n,NC\n");
    let options = ReadOptions::new(None, Some("windows-1252")).unwrap();
    let table = io_utils::read_table(&path, &options).unwrap();
    assert_eq!(table.rows()[0][0], s("Córdoba"));
    assert_eq!(table.rows()[1][1], s("NC"));
    assert_eq!(table.rows()[0][1], s("2021"));

    let out = workspace.path().join("out.csv");
    io_utils::write_table(&out, &table, None, options.encoding).unwrap();
    let bytes = fs::read(&out).unwrap();
    assert!(bytes.windows(7).any(|w| w == b"C\xf3rdoba"));
    let again = io_utils::read_table(&out, &options).unwrap();
    assert_eq!(again, table);
}

#[test]
fn plan_runs_checks_and_reports_each_one() {
    let workspace = TestWorkspace::new();
    let plan = write_plan(
        &workspace,
        r#"
tables:
  - name: t1
    path: t1.csv
  - name: t3
    path: t3.csv
    delimiter: ";"
checks:
  - kind: duplicates
    table: t1
  - kind: consistency
    left: { table: t1, id: A, columns: [B, C] }
    right: { table: t3, id: A, columns: [B, C] }
  - kind: coverage
    base: t1
    other: t3
    join:
      - key: A
        alternatives: [A]
  - kind: range
    table: t1
    column: E
    max: 40
  - kind: types
    table: t3
    columns: [B]
"#,
    );
    let reports = audit::execute(&plan).unwrap();
    assert_eq!(reports.len(), 5);
    assert_eq!(reports[0].rows[0][1], "16.67");
    assert_eq!(reports[1].rows[0], vec!["B", "5", "83.33"]);
    assert_eq!(reports[1].rows[1], vec!["C", "4", "66.67"]);
    assert_eq!(reports[2].rows[0][0], "20");
    assert_eq!(reports[3].rows[0][3], "33.33");
    assert_eq!(reports[4].rows[0], vec!["B", "str", "83.33"]);
}

#[test]
fn failing_checks_are_reported_without_aborting() {
    let workspace = TestWorkspace::new();
    let plan = write_plan(
        &workspace,
        r#"
tables:
  - name: t1
    path: t1.csv
checks:
  - kind: nulls
    table: t1
    columns: [missing]
  - kind: cardinality
    table: t1
    left: A
    right: E
"#,
    );
    let reports = audit::execute(&plan).unwrap();
    assert_eq!(reports[0].headers, vec!["error"]);
    assert!(reports[0].rows[0][0].contains("missing"));
    assert_eq!(reports[1].rows[0][2], "0");
}

#[test]
fn corrections_are_written_to_the_output_directory() {
    let workspace = TestWorkspace::new();
    let plan = write_plan(
        &workspace,
        r#"
output_dir: corrected
tables:
  - name: t1
    path: t1.csv
    renames: { A: Codigo Operador }
    snake_case_headers: true
corrections:
  - kind: dedupe
  - kind: assign_ids
    table: t1
    columns: [b, d]
"#,
    );
    let reports = audit::execute(&plan).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].rows[0][0], "t1");

    let written = workspace.path().join("corrected").join("t1.csv");
    let table = io_utils::read_table(&written, &ReadOptions::default()).unwrap();
    assert_eq!(table.headers(), ["codigo_operador", "b", "c", "d", "e", "id_b_d"]);
    assert_eq!(table.row_count(), 5);
    let handle = csv_audit::dataset::TableHandle::new("t1", table);
    assert_eq!(
        column_values(&handle, "id_b_d"),
        (0..5).map(|v| Some(Value::Integer(v))).collect::<Vec<_>>()
    );
}

#[test]
fn workspace_lookup_by_name() {
    let workspace = TestWorkspace::new();
    let plan = write_plan(
        &workspace,
        "tables:\n  - name: t1\n    path: t1.csv\n",
    );
    let loaded = Workspace::load(&plan).unwrap();
    assert_eq!(loaded.get("t1").unwrap().table.row_count(), 6);
    assert!(loaded.get("t9").is_err());
}

#[test]
fn init_plan_can_be_loaded_back() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("starter.yaml");
    AuditPlan::example().save(&path).unwrap();
    let plan = AuditPlan::load(&path).unwrap();
    assert_eq!(plan.tables[0].name, "operators");
    assert_eq!(plan.tables[0].path, workspace.path().join("operators.csv"));
}

#[test]
fn corrected_tables_keep_their_delimiter() {
    let workspace = TestWorkspace::new();
    workspace.write("t2.tsv", "A\tB\n1\tx\n1\tx\n2\ty\n");
    let plan = write_plan(
        &workspace,
        r#"
output_dir: corrected
tables:
  - name: t3
    path: t3.csv
    delimiter: ";"
  - name: t2
    path: t2.tsv
corrections:
  - kind: dedupe
"#,
    );
    audit::execute(&plan).unwrap();

    let written = workspace.path().join("corrected").join("t3.csv");
    let contents = fs::read_to_string(&written).unwrap();
    assert!(contents.starts_with("\"A\";\"B\";\"C\";\"D\";\"E\""));
    let semicolons = ReadOptions::new(Some(b';'), None).unwrap();
    let table = io_utils::read_table(&written, &semicolons).unwrap();
    assert_eq!(table.headers(), ["A", "B", "C", "D", "E"]);
    assert_eq!(table.row_count(), 6);

    let tabs = fs::read_to_string(workspace.path().join("corrected").join("t2.csv")).unwrap();
    assert_eq!(tabs, "\"A\"\t\"B\"\n\"1\"\t\"x\"\n\"2\"\t\"y\"\n");
}
