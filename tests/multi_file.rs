//! Multiple-files layout: split, re-read, and stale-file cleanup.

use pgmirror::model::{Column, Database, PrimaryKey, Schema, Table};
use pgmirror::yaml::files::{read_tree, write_tree};

fn sample_db() -> Database {
    let mut db = Database::new();
    db.schemas.insert(
        "public".into(),
        Schema {
            name: "public".into(),
            owner: Some("postgres".into()),
            ..Default::default()
        },
    );
    let mut films = Table {
        schema: "public".into(),
        name: "films".into(),
        ..Default::default()
    };
    films.columns.push(Column {
        name: "id".into(),
        data_type: "integer".into(),
        not_null: true,
        ..Default::default()
    });
    films.primary_key = Some(PrimaryKey {
        name: "films_pkey".into(),
        columns: vec!["id".into()],
        description: None,
    });
    db.tables.insert(films.qualified(), films);

    let mut people = Table {
        schema: "public".into(),
        name: "people".into(),
        ..Default::default()
    };
    people.columns.push(Column::new("name", "text"));
    db.tables.insert(people.qualified(), people);

    db.extensions.insert(
        "pgcrypto".into(),
        pgmirror::model::Extension {
            name: "pgcrypto".into(),
            ..Default::default()
        },
    );
    db
}

#[test]
fn tree_layout_matches_the_documented_shape() {
    let dir = tempfile::tempdir().unwrap();
    let db = sample_db();
    let written = write_tree(&db, dir.path(), "moviesdb").unwrap();

    assert!(dir.path().join("database.moviesdb.yaml").exists());
    assert!(dir.path().join("schema.public.yaml").exists());
    assert!(dir.path().join("schema.public/table.films.yaml").exists());
    assert!(dir.path().join("schema.public/table.people.yaml").exists());
    assert!(dir.path().join("extension.pgcrypto.yaml").exists());
    assert_eq!(written.len(), 4);
}

#[test]
fn tree_round_trips_through_read() {
    let dir = tempfile::tempdir().unwrap();
    let db = sample_db();
    write_tree(&db, dir.path(), "moviesdb").unwrap();

    let mut reread = read_tree(dir.path()).unwrap();
    let mut original = db.clone();
    pgmirror::depend::link(&mut original);
    pgmirror::depend::link(&mut reread);

    let ops = pgmirror::diff::compute_diff(&original, &reread).unwrap();
    assert!(ops.is_empty(), "{ops:#?}");
    assert!(reread.tables.contains_key("public.films"));
    assert!(reread.extensions.contains_key("pgcrypto"));
}

#[test]
fn stale_files_are_deleted_on_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = sample_db();
    write_tree(&db, dir.path(), "moviesdb").unwrap();
    let stale = dir.path().join("schema.public/table.people.yaml");
    assert!(stale.exists());

    db.tables.remove("public.people");
    write_tree(&db, dir.path(), "moviesdb").unwrap();
    assert!(!stale.exists(), "stale file should have been removed");
    assert!(dir.path().join("schema.public/table.films.yaml").exists());
}

#[test]
fn unrelated_files_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let db = sample_db();
    write_tree(&db, dir.path(), "moviesdb").unwrap();

    let keep = dir.path().join("README.txt");
    std::fs::write(&keep, "not ours").unwrap();
    write_tree(&db, dir.path(), "moviesdb").unwrap();
    assert!(keep.exists());
}
