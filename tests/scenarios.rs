//! End-to-end scenarios: YAML description in, ordered DDL out.

use pgmirror::depend;
use pgmirror::diff::{compute_diff, planner::plan_changes};
use pgmirror::model::{
    Column, Database, Grant, PrimaryKey, Schema, Sequence, SequenceOwner, Table,
};
use pgmirror::pg::sqlgen::generate_sql;
use pgmirror::yaml::load::database_from_str;

fn plan_sql(current: &Database, desired_yaml: &str) -> Vec<String> {
    let mut current = current.clone();
    depend::link(&mut current);
    let mut desired = database_from_str(desired_yaml).expect("valid YAML");
    depend::link(&mut desired);
    let ops = compute_diff(&current, &desired).expect("diff succeeds");
    let plan = plan_changes(ops, &current, &desired);
    generate_sql(&plan)
}

fn db_with_table(table: Table) -> Database {
    let mut db = Database::new();
    db.schemas.insert(
        "public".into(),
        Schema {
            name: "public".into(),
            ..Default::default()
        },
    );
    db.tables.insert(table.qualified(), table);
    db
}

#[test]
fn empty_to_one_table_with_primary_key() {
    let sql = plan_sql(
        &Database::new(),
        "schema public:
  table t1:
    columns:
    - c1:
        not_null: true
        type: integer
    primary_key:
      t1_pkey:
        columns:
        - c1
",
    );
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE t1 (c1 integer NOT NULL);",
            "ALTER TABLE t1 ADD CONSTRAINT t1_pkey PRIMARY KEY (c1);",
        ]
    );
}

#[test]
fn cross_schema_foreign_key_orders_schema_tables_keys_fk() {
    let sql = plan_sql(
        &Database::new(),
        "schema public:
  table t1:
    columns:
    - c1:
        not_null: true
        type: integer
    - c2:
        type: smallint
    primary_key:
      t1_pkey:
        columns:
        - c1
    foreign_keys:
      t1_c2_fkey:
        columns:
        - c2
        references:
          schema: s1
          table: t2
          columns:
          - c21
        on_delete: restrict
        on_update: set null
schema s1:
  table t2:
    columns:
    - c21:
        not_null: true
        type: smallint
    primary_key:
      t2_pkey:
        columns:
        - c21
",
    );

    let pos = |needle: &str| {
        sql.iter()
            .position(|s| s.contains(needle))
            .unwrap_or_else(|| panic!("missing {needle} in {sql:#?}"))
    };

    let create_schema = pos("CREATE SCHEMA s1;");
    let create_t1 = pos("CREATE TABLE t1 ");
    let create_t2 = pos("CREATE TABLE s1.t2 ");
    let pk_t1 = pos("ADD CONSTRAINT t1_pkey PRIMARY KEY (c1)");
    let pk_t2 = pos("ADD CONSTRAINT t2_pkey PRIMARY KEY (c21)");
    let fk = pos("ADD CONSTRAINT t1_c2_fkey FOREIGN KEY (c2) REFERENCES s1.t2 (c21)");

    assert!(create_schema < create_t2, "schema before its table");
    assert!(create_t1 < fk && create_t2 < fk, "FK after both tables");
    assert!(pk_t2 < fk, "FK after the referenced key");
    assert!(pk_t1 < fk);
    assert!(sql[fk].contains("ON UPDATE SET NULL"));
    assert!(sql[fk].contains("ON DELETE RESTRICT"));
}

#[test]
fn add_one_column() {
    let mut table = Table {
        schema: "public".into(),
        name: "t".into(),
        ..Default::default()
    };
    table.columns.push(Column::new("c1", "integer"));
    let current = db_with_table(table);

    let sql = plan_sql(
        &current,
        "schema public:
  table t:
    columns:
    - c1:
        type: integer
    - c2:
        type: text
",
    );
    assert_eq!(sql, vec!["ALTER TABLE t ADD COLUMN c2 text;"]);
}

#[test]
fn drop_serial_column_leaves_sequence_to_cascade() {
    let mut table = Table {
        schema: "public".into(),
        name: "t".into(),
        ..Default::default()
    };
    table.columns.push(Column {
        name: "c1".into(),
        data_type: "integer".into(),
        not_null: true,
        default: Some("nextval('t_c1_seq'::regclass)".into()),
        ..Default::default()
    });
    let mut current = db_with_table(table);
    current.sequences.insert(
        "public.t_c1_seq".into(),
        Sequence {
            schema: "public".into(),
            name: "t_c1_seq".into(),
            owned_by: Some(SequenceOwner {
                table_schema: "public".into(),
                table_name: "t".into(),
                column_name: "c1".into(),
            }),
            ..Default::default()
        },
    );

    let sql = plan_sql(
        &current,
        "schema public:
  table t:
",
    );
    assert_eq!(sql, vec!["ALTER TABLE t DROP COLUMN c1;"]);
}

#[test]
fn new_grant_emits_one_grant_statement() {
    let table = Table {
        schema: "public".into(),
        name: "t1".into(),
        ..Default::default()
    };
    let current = db_with_table(table);

    let sql = plan_sql(
        &current,
        "schema public:
  table t1:
    privileges:
    - alice:
      - select
",
    );
    assert_eq!(sql, vec!["GRANT SELECT ON TABLE t1 TO alice;"]);
}

#[test]
fn rename_directive_emits_a_single_rename() {
    let table = Table {
        schema: "public".into(),
        name: "t1".into(),
        ..Default::default()
    };
    let current = db_with_table(table);

    let sql = plan_sql(
        &current,
        "schema public:
  table t2:
    oldname: t1
",
    );
    assert_eq!(sql, vec!["ALTER TABLE t1 RENAME TO t2;"]);
}

#[test]
fn rename_is_one_shot_and_never_extracted() {
    let desired = database_from_str(
        "schema public:
  table t2:
    oldname: t1
",
    )
    .unwrap();
    let emitted = pgmirror::yaml::database_to_string(&desired);
    assert!(!emitted.contains("oldname"), "{emitted}");
}

#[test]
fn drop_first_policy_around_a_column_type_change() {
    let mut table = Table {
        schema: "public".into(),
        name: "t".into(),
        ..Default::default()
    };
    table.columns.push(Column::new("c", "integer"));
    table.indexes.push(pgmirror::model::Index {
        name: "ix".into(),
        columns: vec!["c".into()],
        ..Default::default()
    });
    let current = db_with_table(table);

    let sql = plan_sql(
        &current,
        "schema public:
  table t:
    columns:
    - c:
        type: text
    indexes:
      ix:
        columns:
        - c
",
    );
    assert_eq!(
        sql,
        vec![
            "DROP INDEX ix;",
            "ALTER TABLE t ALTER COLUMN c TYPE text USING c::text;",
            "CREATE INDEX ix ON t (c);",
        ]
    );
}

#[test]
fn same_description_twice_is_idempotent() {
    let yaml = "schema public:
  table t1:
    columns:
    - c1:
        not_null: true
        type: integer
    primary_key:
      t1_pkey:
        columns:
        - c1
";
    let mut model = database_from_str(yaml).unwrap();
    depend::link(&mut model);
    let ops = compute_diff(&model, &model).unwrap();
    assert!(ops.is_empty(), "{ops:?}");
}

#[test]
fn grants_and_privilege_sets_use_set_difference() {
    let mut table = Table {
        schema: "public".into(),
        name: "t1".into(),
        ..Default::default()
    };
    table.privileges.push(Grant {
        grantee: "alice".into(),
        privileges: vec!["select".into()],
    });
    table.privileges.push(Grant {
        grantee: "bob".into(),
        privileges: vec!["select".into(), "insert".into()],
    });
    let current = db_with_table(table);

    // alice keeps select, bob loses insert, carol appears.
    let sql = plan_sql(
        &current,
        "schema public:
  table t1:
    privileges:
    - alice:
      - select
    - bob:
      - select
    - carol:
      - update
",
    );
    assert_eq!(sql.len(), 2);
    assert!(sql.contains(&"REVOKE INSERT ON TABLE t1 FROM bob;".to_string()));
    assert!(sql.contains(&"GRANT UPDATE ON TABLE t1 TO carol;".to_string()));
}

#[test]
fn pk_change_drops_before_readding() {
    let mut table = Table {
        schema: "public".into(),
        name: "t".into(),
        ..Default::default()
    };
    table.columns.push(Column::new("a", "integer"));
    table.columns.push(Column::new("b", "integer"));
    table.primary_key = Some(PrimaryKey {
        name: "t_pkey".into(),
        columns: vec!["a".into()],
        description: None,
    });
    let current = db_with_table(table);

    let sql = plan_sql(
        &current,
        "schema public:
  table t:
    columns:
    - a:
        type: integer
    - b:
        type: integer
    primary_key:
      t_pkey:
        columns:
        - b
",
    );
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE t DROP CONSTRAINT t_pkey;",
            "ALTER TABLE t ADD CONSTRAINT t_pkey PRIMARY KEY (b);",
        ]
    );
}
