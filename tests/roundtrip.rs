//! Round-trip and determinism laws for the YAML mapping.

use pgmirror::depend;
use pgmirror::diff::compute_diff;
use pgmirror::model::*;
use pgmirror::yaml::{database_to_string, load::database_from_str};

/// A model exercising most kinds: schemas, enum, domain, table with
/// constraints and indexes, owned sequence, view, function, trigger.
fn rich_model() -> Database {
    let mut db = Database::new();
    db.schemas.insert(
        "public".into(),
        Schema {
            name: "public".into(),
            owner: Some("postgres".into()),
            privileges: vec![
                Grant {
                    grantee: "PUBLIC".into(),
                    privileges: vec!["all".into()],
                },
                Grant {
                    grantee: "postgres".into(),
                    privileges: vec!["all".into()],
                },
            ],
            ..Default::default()
        },
    );
    db.schemas.insert(
        "s1".into(),
        Schema {
            name: "s1".into(),
            owner: Some("postgres".into()),
            ..Default::default()
        },
    );

    db.types.insert(
        "public.mood".into(),
        TypeDef {
            schema: "public".into(),
            name: "mood".into(),
            body: TypeBody::Enum {
                values: vec!["sad".into(), "ok".into(), "happy".into()],
            },
            owner: Some("postgres".into()),
            description: Some("how the reviewer felt".into()),
            privileges: vec![],
            oldname: None,
            oid: None,
        },
    );

    db.domains.insert(
        "public.posint".into(),
        Domain {
            schema: "public".into(),
            name: "posint".into(),
            base_type: "integer".into(),
            not_null: false,
            check_constraints: vec![CheckConstraint {
                name: "posint_check".into(),
                expression: "(VALUE > 0)".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    );

    let mut films = Table {
        schema: "public".into(),
        name: "films".into(),
        owner: Some("postgres".into()),
        description: Some("every film we know about".into()),
        ..Default::default()
    };
    films.columns.push(Column {
        name: "id".into(),
        data_type: "integer".into(),
        not_null: true,
        default: Some("nextval('films_id_seq'::regclass)".into()),
        ..Default::default()
    });
    films.columns.push(Column {
        name: "title".into(),
        data_type: "text".into(),
        not_null: true,
        description: Some("original release title".into()),
        ..Default::default()
    });
    films.columns.push(Column {
        name: "feeling".into(),
        data_type: "mood".into(),
        ..Default::default()
    });
    films.primary_key = Some(PrimaryKey {
        name: "films_pkey".into(),
        columns: vec!["id".into()],
        description: None,
    });
    films.check_constraints.push(CheckConstraint {
        name: "films_title_check".into(),
        expression: "(length(title) > 0)".into(),
        columns: vec!["title".into()],
        description: None,
    });
    films.indexes.push(Index {
        name: "films_title_idx".into(),
        columns: vec!["title".into()],
        unique: true,
        ..Default::default()
    });
    films.privileges.push(Grant {
        grantee: "alice".into(),
        privileges: vec!["select".into()],
    });
    db.tables.insert(films.qualified(), films);

    let mut reviews = Table {
        schema: "s1".into(),
        name: "reviews".into(),
        ..Default::default()
    };
    reviews.columns.push(Column {
        name: "film_id".into(),
        data_type: "integer".into(),
        not_null: true,
        ..Default::default()
    });
    reviews.foreign_keys.push(ForeignKey {
        name: "reviews_film_id_fkey".into(),
        columns: vec!["film_id".into()],
        ref_schema: "public".into(),
        ref_table: "films".into(),
        ref_columns: vec!["id".into()],
        on_update: ReferentialAction::NoAction,
        on_delete: ReferentialAction::Cascade,
        deferrable: false,
        initially_deferred: false,
        description: None,
    });
    db.tables.insert(reviews.qualified(), reviews);

    db.sequences.insert(
        "public.films_id_seq".into(),
        Sequence {
            schema: "public".into(),
            name: "films_id_seq".into(),
            start: Some(1),
            increment: Some(1),
            cache: Some(1),
            owned_by: Some(SequenceOwner {
                table_schema: "public".into(),
                table_name: "films".into(),
                column_name: "id".into(),
            }),
            ..Default::default()
        },
    );

    db.functions.insert(
        "public.film_count()".into(),
        Function {
            schema: "public".into(),
            name: "film_count".into(),
            arguments: String::new(),
            argtypes: String::new(),
            returns: "bigint".into(),
            language: "sql".into(),
            source: "SELECT count(*)\nFROM films".into(),
            volatility: Volatility::Stable,
            ..Default::default()
        },
    );

    db.views.insert(
        "public.long_films".into(),
        View {
            schema: "public".into(),
            name: "long_films".into(),
            definition: "SELECT id, title\n  FROM films\n WHERE length(title) > 20".into(),
            depends_on: vec!["public.films".into()],
            ..Default::default()
        },
    );

    db.triggers.insert(
        "public.films.films_audit".into(),
        Trigger {
            name: "films_audit".into(),
            target_schema: "public".into(),
            target_name: "films".into(),
            timing: TriggerTiming::Before,
            events: vec![TriggerEvent::Insert, TriggerEvent::Update],
            update_columns: vec![],
            for_each_row: true,
            when_clause: None,
            function_schema: "public".into(),
            function_name: "film_count".into(),
            function_args: vec![],
            description: None,
        },
    );

    db
}

#[test]
fn emission_is_byte_identical_across_runs() {
    let db = rich_model();
    let one = database_to_string(&db);
    let two = database_to_string(&db);
    assert_eq!(one, two);
}

#[test]
fn parse_of_emit_diffs_to_nothing() {
    let mut original = rich_model();
    depend::link(&mut original);

    let text = database_to_string(&original);
    let mut parsed = database_from_str(&text).expect("own output parses");
    depend::link(&mut parsed);

    let forward = compute_diff(&original, &parsed).unwrap();
    assert!(forward.is_empty(), "forward diff: {forward:#?}");
    let backward = compute_diff(&parsed, &original).unwrap();
    assert!(backward.is_empty(), "backward diff: {backward:#?}");
}

#[test]
fn parse_of_emit_is_stable_on_reemission() {
    let original = rich_model();
    let first = database_to_string(&original);
    let parsed = database_from_str(&first).unwrap();
    let second = database_to_string(&parsed);
    assert_eq!(first, second);
}

#[test]
fn multiline_fields_have_no_trailing_whitespace() {
    let mut db = rich_model();
    db.functions.get_mut("public.film_count()").unwrap().source =
        "SELECT count(*)   \nFROM films\t\n".into();
    let text = database_to_string(&db);
    for line in text.lines() {
        assert_eq!(line, line.trim_end(), "trailing whitespace in {line:?}");
    }
}

#[test]
fn fingerprint_tracks_model_content() {
    let db = rich_model();
    let mut changed = db.clone();
    assert_eq!(db.fingerprint(), changed.fingerprint());
    changed
        .tables
        .get_mut("public.films")
        .unwrap()
        .columns
        .push(Column::new("extra", "text"));
    assert_ne!(db.fingerprint(), changed.fingerprint());
}
