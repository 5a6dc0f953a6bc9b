//! Dependency linking.
//!
//! Walks a loaded model once and records `A -> B` edges meaning "A
//! requires B to exist". The planner consumes these to order creates and
//! drops. Reference text comes from column types, constraint targets,
//! recorded `depends_on` lists, and the structural fields of each kind;
//! nothing re-parses SQL.

use crate::model::{Database, ObjectKind, ObjectRef};
use regex::Regex;

/// Resolves references into edges on `db.depends`. Idempotent; cycles
/// (mutual FKs, functions and types) are recorded as-is and tolerated.
pub fn link(db: &mut Database) {
    let mut edges: Vec<(ObjectRef, ObjectRef)> = Vec::new();
    let nextval = Regex::new(r"nextval\('([^']+)'").expect("static pattern");

    for (key, table) in &db.tables {
        let table_ref = ObjectRef::new(ObjectKind::Table, key.clone());
        if db.schemas.contains_key(&table.schema) {
            edges.push((
                table_ref.clone(),
                ObjectRef::new(ObjectKind::Schema, table.schema.clone()),
            ));
        }
        for column in &table.columns {
            if let Some(type_ref) = resolve_type(db, &table.schema, &column.data_type) {
                edges.push((table_ref.clone(), type_ref));
            }
            if let Some(default) = &column.default {
                if let Some(captures) = nextval.captures(default) {
                    let seq_name = captures.get(1).expect("one group").as_str();
                    if let Some(seq_ref) = resolve_sequence(db, &table.schema, seq_name) {
                        edges.push((table_ref.clone(), seq_ref));
                    }
                }
            }
            if let Some(collation) = &column.collation {
                if let Some(coll_ref) =
                    resolve_in(db, &table.schema, collation, ObjectKind::Collation)
                {
                    edges.push((table_ref.clone(), coll_ref));
                }
            }
        }
        for fk in &table.foreign_keys {
            let referenced = fk.referenced();
            if db.tables.contains_key(&referenced) {
                edges.push((
                    table_ref.clone(),
                    ObjectRef::new(ObjectKind::Table, referenced),
                ));
            }
        }
        if let Some(parent) = &table.partition_of {
            if db.tables.contains_key(parent) {
                edges.push((
                    table_ref.clone(),
                    ObjectRef::new(ObjectKind::Table, parent.clone()),
                ));
            }
        }
        for parent in &table.inherits {
            if db.tables.contains_key(parent) {
                edges.push((
                    table_ref.clone(),
                    ObjectRef::new(ObjectKind::Table, parent.clone()),
                ));
            }
        }
    }

    for (key, view) in &db.views {
        let view_ref = ObjectRef::new(ObjectKind::View, key.clone());
        if db.schemas.contains_key(&view.schema) {
            edges.push((
                view_ref.clone(),
                ObjectRef::new(ObjectKind::Schema, view.schema.clone()),
            ));
        }
        for name in &view.depends_on {
            if let Some(target) = resolve_any(db, &view.schema, name) {
                edges.push((view_ref.clone(), target));
            }
        }
    }

    for (key, seq) in &db.sequences {
        if db.schemas.contains_key(&seq.schema) {
            edges.push((
                ObjectRef::new(ObjectKind::Sequence, key.clone()),
                ObjectRef::new(ObjectKind::Schema, seq.schema.clone()),
            ));
        }
    }

    for (key, function) in &db.functions {
        let function_ref = ObjectRef::new(ObjectKind::Function, key.clone());
        if db.schemas.contains_key(&function.schema) {
            edges.push((
                function_ref.clone(),
                ObjectRef::new(ObjectKind::Schema, function.schema.clone()),
            ));
        }
        if db.languages.contains_key(&function.language) {
            edges.push((
                function_ref.clone(),
                ObjectRef::new(ObjectKind::Language, function.language.clone()),
            ));
        }
        if let Some(type_ref) = resolve_type(db, &function.schema, &function.returns) {
            edges.push((function_ref.clone(), type_ref));
        }
        for arg in function.argtypes.split(", ").filter(|a| !a.is_empty()) {
            if let Some(type_ref) = resolve_type(db, &function.schema, arg) {
                edges.push((function_ref.clone(), type_ref));
            }
        }
        for name in &function.depends_on {
            if let Some(target) = resolve_any(db, &function.schema, name) {
                edges.push((function_ref.clone(), target));
            }
        }
    }

    for (key, aggregate) in &db.aggregates {
        let aggregate_ref = ObjectRef::new(ObjectKind::Aggregate, key.clone());
        for func in [Some(&aggregate.sfunc), aggregate.finalfunc.as_ref(), aggregate.combinefunc.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Some(target) = resolve_function(db, &aggregate.schema, func) {
                edges.push((aggregate_ref.clone(), target));
            }
        }
        if let Some(type_ref) = resolve_type(db, &aggregate.schema, &aggregate.stype) {
            edges.push((aggregate_ref.clone(), type_ref));
        }
    }

    for (key, operator) in &db.operators {
        let operator_ref = ObjectRef::new(ObjectKind::Operator, key.clone());
        if let Some(target) = resolve_function(db, &operator.schema, &operator.procedure) {
            edges.push((operator_ref.clone(), target));
        }
        for operand in [operator.leftarg.as_ref(), operator.rightarg.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Some(type_ref) = resolve_type(db, &operator.schema, operand) {
                edges.push((operator_ref.clone(), type_ref));
            }
        }
    }

    for (key, oc) in &db.operator_classes {
        let oc_ref = ObjectRef::new(ObjectKind::OperatorClass, key.clone());
        if let Some(family) = &oc.family {
            let family_key = format!("{}.{} using {}", oc.schema, family, oc.index_method);
            if db.operator_families.contains_key(&family_key) {
                edges.push((
                    oc_ref.clone(),
                    ObjectRef::new(ObjectKind::OperatorFamily, family_key),
                ));
            }
        }
        if let Some(type_ref) = resolve_type(db, &oc.schema, &oc.for_type) {
            edges.push((oc_ref.clone(), type_ref));
        }
    }

    for (key, domain) in &db.domains {
        let domain_ref = ObjectRef::new(ObjectKind::Domain, key.clone());
        if db.schemas.contains_key(&domain.schema) {
            edges.push((
                domain_ref.clone(),
                ObjectRef::new(ObjectKind::Schema, domain.schema.clone()),
            ));
        }
        if let Some(type_ref) = resolve_type(db, &domain.schema, &domain.base_type) {
            edges.push((domain_ref.clone(), type_ref));
        }
    }

    for (key, t) in &db.types {
        if db.schemas.contains_key(&t.schema) {
            edges.push((
                ObjectRef::new(ObjectKind::Type, key.clone()),
                ObjectRef::new(ObjectKind::Schema, t.schema.clone()),
            ));
        }
    }

    for (key, trigger) in &db.triggers {
        let trigger_ref = ObjectRef::new(ObjectKind::Trigger, key.clone());
        if let Some(target) = resolve_relation(db, &trigger.target()) {
            edges.push((trigger_ref.clone(), target));
        }
        let call = crate::model::qualified_name(&trigger.function_schema, &trigger.function_name);
        if let Some(target) = resolve_function(db, &trigger.target_schema, &call) {
            edges.push((trigger_ref.clone(), target));
        }
    }

    for (key, rule) in &db.rules {
        if let Some(target) = resolve_relation(db, &rule.target()) {
            edges.push((ObjectRef::new(ObjectKind::Rule, key.clone()), target));
        }
    }

    for (key, cast) in &db.casts {
        let cast_ref = ObjectRef::new(ObjectKind::Cast, key.clone());
        for side in [&cast.source, &cast.target] {
            if let Some(type_ref) = resolve_type(db, "public", side) {
                edges.push((cast_ref.clone(), type_ref));
            }
        }
        if let Some(function) = &cast.function {
            if let Some(target) = resolve_function(db, "public", function) {
                edges.push((cast_ref.clone(), target));
            }
        }
    }

    for (key, conv) in &db.conversions {
        if let Some(target) = resolve_function(db, &conv.schema, &conv.function) {
            edges.push((ObjectRef::new(ObjectKind::Conversion, key.clone()), target));
        }
    }

    for (key, ft) in &db.foreign_tables {
        let ft_ref = ObjectRef::new(ObjectKind::ForeignTable, key.clone());
        if db.servers.contains_key(&ft.server) {
            edges.push((
                ft_ref.clone(),
                ObjectRef::new(ObjectKind::ForeignServer, ft.server.clone()),
            ));
        }
        if db.schemas.contains_key(&ft.schema) {
            edges.push((
                ft_ref,
                ObjectRef::new(ObjectKind::Schema, ft.schema.clone()),
            ));
        }
    }

    for (key, server) in &db.servers {
        if db.fdws.contains_key(&server.wrapper) {
            edges.push((
                ObjectRef::new(ObjectKind::ForeignServer, key.clone()),
                ObjectRef::new(ObjectKind::ForeignDataWrapper, server.wrapper.clone()),
            ));
        }
    }

    for (key, um) in &db.user_mappings {
        if db.servers.contains_key(&um.server) {
            edges.push((
                ObjectRef::new(ObjectKind::UserMapping, key.clone()),
                ObjectRef::new(ObjectKind::ForeignServer, um.server.clone()),
            ));
        }
    }

    for (key, config) in &db.ts_configs {
        let parser_key = qualify(&config.schema, &config.parser);
        if db.ts_parsers.contains_key(&parser_key) {
            edges.push((
                ObjectRef::new(ObjectKind::TsConfig, key.clone()),
                ObjectRef::new(ObjectKind::TsParser, parser_key),
            ));
        }
    }

    for (key, dict) in &db.ts_dictionaries {
        let template_key = qualify(&dict.schema, &dict.template);
        if db.ts_templates.contains_key(&template_key) {
            edges.push((
                ObjectRef::new(ObjectKind::TsDictionary, key.clone()),
                ObjectRef::new(ObjectKind::TsTemplate, template_key),
            ));
        }
    }

    for (from, to) in edges {
        db.add_edge(from, to);
    }
}

fn qualify(schema_ctx: &str, name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        crate::model::qualified_name(schema_ctx, name)
    }
}

/// Strips array and modifier suffixes: `mood[]`, `varchar(63)`.
fn base_type_name(name: &str) -> &str {
    let name = name.trim();
    let name = name.strip_suffix("[]").unwrap_or(name);
    match name.find('(') {
        Some(open) => name[..open].trim_end(),
        None => name,
    }
}

fn resolve_type(db: &Database, schema_ctx: &str, name: &str) -> Option<ObjectRef> {
    let base = base_type_name(name);
    for candidate in [qualify(schema_ctx, base), qualify("public", base)] {
        if db.types.contains_key(&candidate) {
            return Some(ObjectRef::new(ObjectKind::Type, candidate));
        }
        if db.domains.contains_key(&candidate) {
            return Some(ObjectRef::new(ObjectKind::Domain, candidate));
        }
    }
    None
}

fn resolve_sequence(db: &Database, schema_ctx: &str, name: &str) -> Option<ObjectRef> {
    for candidate in [qualify(schema_ctx, name), qualify("public", name)] {
        if db.sequences.contains_key(&candidate) {
            return Some(ObjectRef::new(ObjectKind::Sequence, candidate));
        }
    }
    None
}

fn resolve_in(
    db: &Database,
    schema_ctx: &str,
    name: &str,
    kind: ObjectKind,
) -> Option<ObjectRef> {
    let candidate = qualify(schema_ctx, name);
    let found = match kind {
        ObjectKind::Collation => db.collations.contains_key(&candidate),
        _ => false,
    };
    found.then(|| ObjectRef::new(kind, candidate))
}

fn resolve_relation(db: &Database, qualified: &str) -> Option<ObjectRef> {
    if db.tables.contains_key(qualified) {
        return Some(ObjectRef::new(ObjectKind::Table, qualified.to_string()));
    }
    if db.views.contains_key(qualified) {
        return Some(ObjectRef::new(ObjectKind::View, qualified.to_string()));
    }
    if db.foreign_tables.contains_key(qualified) {
        return Some(ObjectRef::new(
            ObjectKind::ForeignTable,
            qualified.to_string(),
        ));
    }
    None
}

/// Functions may be referenced with or without an argument list; a bare
/// name matches any overload in the named (or context) schema.
fn resolve_function(db: &Database, schema_ctx: &str, text: &str) -> Option<ObjectRef> {
    let call = text.trim().trim_end_matches(';');
    if call.contains('(') {
        let key = qualify(schema_ctx, call);
        if db.functions.contains_key(&key) {
            return Some(ObjectRef::new(ObjectKind::Function, key));
        }
    }
    let bare = call.split('(').next().unwrap_or(call);
    let (schema, name) = match bare.split_once('.') {
        Some((s, n)) => (s.to_string(), n.to_string()),
        None => (schema_ctx.to_string(), bare.to_string()),
    };
    db.functions
        .iter()
        .find(|(_, f)| f.schema == schema && f.name == name)
        .map(|(key, _)| ObjectRef::new(ObjectKind::Function, key.clone()))
        .or_else(|| {
            if schema == *schema_ctx && schema_ctx != "public" {
                db.functions
                    .iter()
                    .find(|(_, f)| f.schema == "public" && f.name == name)
                    .map(|(key, _)| ObjectRef::new(ObjectKind::Function, key.clone()))
            } else {
                None
            }
        })
}

/// Resolves a `depends_on` entry: relation, sequence, type, or function.
fn resolve_any(db: &Database, schema_ctx: &str, name: &str) -> Option<ObjectRef> {
    let qualified = qualify(schema_ctx, name);
    resolve_relation(db, &qualified)
        .or_else(|| resolve_sequence(db, schema_ctx, name))
        .or_else(|| resolve_type(db, schema_ctx, name))
        .or_else(|| resolve_function(db, schema_ctx, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, ForeignKey, ReferentialAction, Schema, Table, TypeBody, TypeDef};

    fn table(schema: &str, name: &str) -> Table {
        Table {
            schema: schema.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn fk_produces_table_edge() {
        let mut db = Database::new();
        let mut t1 = table("public", "t1");
        t1.foreign_keys.push(ForeignKey {
            name: "t1_fk".into(),
            columns: vec!["c2".into()],
            ref_schema: "s1".into(),
            ref_table: "t2".into(),
            ref_columns: vec!["c21".into()],
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::NoAction,
            deferrable: false,
            initially_deferred: false,
            description: None,
        });
        db.tables.insert("public.t1".into(), t1);
        db.tables.insert("s1.t2".into(), table("s1", "t2"));
        link(&mut db);

        let from = ObjectRef::new(ObjectKind::Table, "public.t1");
        let deps = db.depends_of(&from).unwrap();
        assert!(deps.contains(&ObjectRef::new(ObjectKind::Table, "s1.t2")));
    }

    #[test]
    fn column_type_links_to_enum() {
        let mut db = Database::new();
        db.types.insert(
            "public.mood".into(),
            TypeDef {
                schema: "public".into(),
                name: "mood".into(),
                body: TypeBody::Enum {
                    values: vec!["ok".into()],
                },
                owner: None,
                description: None,
                privileges: vec![],
                oldname: None,
                oid: None,
            },
        );
        let mut t = table("public", "t1");
        t.columns.push(Column::new("m", "mood"));
        db.tables.insert("public.t1".into(), t);
        link(&mut db);

        let from = ObjectRef::new(ObjectKind::Table, "public.t1");
        assert!(db
            .depends_of(&from)
            .unwrap()
            .contains(&ObjectRef::new(ObjectKind::Type, "public.mood")));
    }

    #[test]
    fn array_and_modifier_suffixes_resolve() {
        assert_eq!(base_type_name("mood[]"), "mood");
        assert_eq!(base_type_name("character varying(63)"), "character varying");
    }

    #[test]
    fn table_links_to_its_schema() {
        let mut db = Database::new();
        db.schemas.insert(
            "s1".into(),
            Schema {
                name: "s1".into(),
                ..Default::default()
            },
        );
        db.tables.insert("s1.t2".into(), table("s1", "t2"));
        link(&mut db);
        let from = ObjectRef::new(ObjectKind::Table, "s1.t2");
        assert!(db
            .depends_of(&from)
            .unwrap()
            .contains(&ObjectRef::new(ObjectKind::Schema, "s1")));
    }

    #[test]
    fn mutual_fk_cycle_is_tolerated() {
        let mut db = Database::new();
        let mut t1 = table("public", "t1");
        t1.foreign_keys.push(ForeignKey {
            name: "t1_fk".into(),
            columns: vec!["a".into()],
            ref_schema: "public".into(),
            ref_table: "t2".into(),
            ref_columns: vec!["b".into()],
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::NoAction,
            deferrable: false,
            initially_deferred: false,
            description: None,
        });
        let mut t2 = table("public", "t2");
        t2.foreign_keys.push(ForeignKey {
            name: "t2_fk".into(),
            columns: vec!["b".into()],
            ref_schema: "public".into(),
            ref_table: "t1".into(),
            ref_columns: vec!["a".into()],
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::NoAction,
            deferrable: false,
            initially_deferred: false,
            description: None,
        });
        db.tables.insert("public.t1".into(), t1);
        db.tables.insert("public.t2".into(), t2);
        link(&mut db);

        let t1_ref = ObjectRef::new(ObjectKind::Table, "public.t1");
        let t2_ref = ObjectRef::new(ObjectKind::Table, "public.t2");
        assert!(db.depends_of(&t1_ref).unwrap().contains(&t2_ref));
        assert!(db.depends_of(&t2_ref).unwrap().contains(&t1_ref));
    }
}
