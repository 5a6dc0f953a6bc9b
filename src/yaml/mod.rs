//! Model to YAML mapping.
//!
//! The emitted tree is fully deterministic: top-level keys are sorted,
//! every child collection except table columns is sorted, and multi-line
//! text fields are stripped of trailing whitespace so the YAML library can
//! render them in literal block style. `oldname` is a one-shot input
//! directive and is never written back out.

pub mod files;
pub mod load;

use crate::model::{
    Cast, Collation, Column, Conversion, Database, Domain, EventTrigger, ForeignDataWrapper,
    ForeignServer, ForeignTable, Function, Grant, Index, Language, Rule, Schema, Sequence, Table,
    Trigger, TsConfig, TsDictionary, TsParser, TsTemplate, TypeBody, TypeDef, UserMapping, View,
};
use crate::util::strip_trailing_space;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

fn s(v: &str) -> Value {
    Value::String(v.to_string())
}

fn text_block(v: &str) -> Value {
    Value::String(strip_trailing_space(v))
}

fn insert(map: &mut Mapping, key: &str, value: Value) {
    map.insert(s(key), value);
}

fn insert_opt_str(map: &mut Mapping, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        insert(map, key, s(v));
    }
}

fn insert_opt_text(map: &mut Mapping, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        insert(map, key, text_block(v));
    }
}

fn insert_opt_i64(map: &mut Mapping, key: &str, value: Option<i64>) {
    if let Some(v) = value {
        insert(map, key, Value::Number(v.into()));
    }
}

fn insert_true(map: &mut Mapping, key: &str, value: bool) {
    if value {
        insert(map, key, Value::Bool(true));
    }
}

fn string_list(values: &[String]) -> Value {
    Value::Sequence(values.iter().map(|v| s(v)).collect())
}

/// `privileges: [ { postgres: [ all ] }, { PUBLIC: [ all ] } ]`
fn grants_value(grants: &[Grant]) -> Value {
    let mut sorted: Vec<&Grant> = grants.iter().collect();
    sorted.sort();
    Value::Sequence(
        sorted
            .into_iter()
            .map(|g| {
                let mut entry = Mapping::new();
                entry.insert(s(&g.grantee), string_list(&g.privileges));
                Value::Mapping(entry)
            })
            .collect(),
    )
}

fn insert_grants(map: &mut Mapping, grants: &[Grant]) {
    if !grants.is_empty() {
        insert(map, "privileges", grants_value(grants));
    }
}

/// Serializes a model to the canonical YAML string.
pub fn database_to_string(db: &Database) -> String {
    serde_yaml::to_string(&database_to_value(db)).expect("model maps to YAML")
}

/// Builds the full mapping: non-schema objects and schemas at top level,
/// schema-bound objects nested, table children nested one level deeper.
pub fn database_to_value(db: &Database) -> Value {
    let mut top: BTreeMap<String, Value> = BTreeMap::new();

    for ext in db.extensions.values() {
        let mut map = Mapping::new();
        insert_opt_str(&mut map, "schema", &ext.schema);
        insert_opt_str(&mut map, "version", &ext.version);
        insert_opt_text(&mut map, "description", &ext.description);
        top.insert(format!("extension {}", ext.name), Value::Mapping(map));
    }
    for lang in db.languages.values() {
        top.insert(format!("language {}", lang.name), language_value(lang));
    }
    for cast in db.casts.values() {
        top.insert(format!("cast {}", cast.key()), cast_value(cast));
    }
    for et in db.event_triggers.values() {
        top.insert(format!("event trigger {}", et.name), event_trigger_value(et));
    }
    for fdw in db.fdws.values() {
        top.insert(format!("foreign data wrapper {}", fdw.name), fdw_value(fdw));
    }
    for server in db.servers.values() {
        top.insert(format!("server {}", server.name), server_value(server));
    }
    for um in db.user_mappings.values() {
        top.insert(format!("user mapping {}", um.key()), user_mapping_value(um));
    }
    for schema in db.schemas.values() {
        top.insert(format!("schema {}", schema.name), schema_value(db, schema));
    }

    let mut root = Mapping::new();
    for (key, value) in top {
        root.insert(Value::String(key), value);
    }
    Value::Mapping(root)
}

fn schema_value(db: &Database, schema: &Schema) -> Value {
    let mut map = Mapping::new();
    insert_opt_str(&mut map, "owner", &schema.owner);
    insert_opt_text(&mut map, "description", &schema.description);
    insert_grants(&mut map, &schema.privileges);

    let mut children: BTreeMap<String, Value> = BTreeMap::new();
    let in_schema = |object_schema: &str| object_schema == schema.name;

    for coll in db.collations.values().filter(|c| in_schema(&c.schema)) {
        children.insert(format!("collation {}", coll.name), collation_value(coll));
    }
    for conv in db.conversions.values().filter(|c| in_schema(&c.schema)) {
        children.insert(format!("conversion {}", conv.name), conversion_value(conv));
    }
    for t in db.types.values().filter(|t| in_schema(&t.schema)) {
        children.insert(format!("type {}", t.name), type_value(t));
    }
    for d in db.domains.values().filter(|d| in_schema(&d.schema)) {
        children.insert(format!("domain {}", d.name), domain_value(d));
    }
    for seq in db
        .sequences
        .values()
        .filter(|q| in_schema(&q.schema) && q.owned_by.is_none())
    {
        children.insert(format!("sequence {}", seq.name), sequence_value(seq, false));
    }
    for f in db.functions.values().filter(|f| in_schema(&f.schema)) {
        children.insert(format!("function {}", f.signature()), function_value(f));
    }
    for a in db.aggregates.values().filter(|a| in_schema(&a.schema)) {
        children.insert(format!("aggregate {}", a.signature()), aggregate_value(a));
    }
    for o in db.operators.values().filter(|o| in_schema(&o.schema)) {
        let left = o.leftarg.as_deref().unwrap_or("NONE");
        let right = o.rightarg.as_deref().unwrap_or("NONE");
        children.insert(
            format!("operator {}({}, {})", o.name, left, right),
            operator_value(o),
        );
    }
    for oc in db.operator_classes.values().filter(|c| in_schema(&c.schema)) {
        children.insert(
            format!("operator class {} using {}", oc.name, oc.index_method),
            operator_class_value(oc),
        );
    }
    for of in db
        .operator_families
        .values()
        .filter(|f| in_schema(&f.schema))
    {
        let mut map = Mapping::new();
        insert_opt_str(&mut map, "owner", &of.owner);
        insert_opt_text(&mut map, "description", &of.description);
        children.insert(
            format!("operator family {} using {}", of.name, of.index_method),
            Value::Mapping(map),
        );
    }
    for table in db.tables.values().filter(|t| in_schema(&t.schema)) {
        children.insert(format!("table {}", table.name), table_value(db, table));
    }
    for view in db.views.values().filter(|v| in_schema(&v.schema)) {
        let kind = if view.materialized {
            "materialized view"
        } else {
            "view"
        };
        children.insert(format!("{kind} {}", view.name), view_value(db, view));
    }
    for ft in db.foreign_tables.values().filter(|f| in_schema(&f.schema)) {
        children.insert(format!("foreign table {}", ft.name), foreign_table_value(ft));
    }
    for p in db.ts_parsers.values().filter(|p| in_schema(&p.schema)) {
        children.insert(format!("text search parser {}", p.name), ts_parser_value(p));
    }
    for d in db.ts_dictionaries.values().filter(|d| in_schema(&d.schema)) {
        children.insert(
            format!("text search dictionary {}", d.name),
            ts_dictionary_value(d),
        );
    }
    for t in db.ts_templates.values().filter(|t| in_schema(&t.schema)) {
        children.insert(
            format!("text search template {}", t.name),
            ts_template_value(t),
        );
    }
    for c in db.ts_configs.values().filter(|c| in_schema(&c.schema)) {
        children.insert(
            format!("text search configuration {}", c.name),
            ts_config_value(c),
        );
    }

    for (key, value) in children {
        map.insert(Value::String(key), value);
    }
    Value::Mapping(map)
}

pub(crate) fn column_value(column: &Column) -> Value {
    let mut attrs = Mapping::new();
    insert_opt_str(&mut attrs, "collation", &column.collation);
    insert_opt_str(&mut attrs, "default", &column.default);
    insert_opt_text(&mut attrs, "description", &column.description);
    if let Some(identity) = &column.identity {
        insert(&mut attrs, "identity", s(identity.as_word()));
    }
    insert_true(&mut attrs, "not_null", column.not_null);
    insert_grants(&mut attrs, &column.privileges);
    if let Some(statistics) = column.statistics {
        insert(&mut attrs, "statistics", Value::Number(statistics.into()));
    }
    insert_opt_str(&mut attrs, "storage", &column.storage);
    insert(&mut attrs, "type", s(&column.data_type));

    let mut entry = Mapping::new();
    entry.insert(s(&column.name), Value::Mapping(attrs));
    Value::Mapping(entry)
}

fn table_value(db: &Database, table: &Table) -> Value {
    let mut map = Mapping::new();

    // Catalog column order is preserved; everything else is sorted.
    insert(
        &mut map,
        "columns",
        Value::Sequence(table.columns.iter().map(column_value).collect()),
    );

    if let Some(pk) = &table.primary_key {
        let mut attrs = Mapping::new();
        insert(&mut attrs, "columns", string_list(&pk.columns));
        insert_opt_text(&mut attrs, "description", &pk.description);
        let mut entry = Mapping::new();
        entry.insert(s(&pk.name), Value::Mapping(attrs));
        insert(&mut map, "primary_key", Value::Mapping(entry));
    }

    if !table.unique_constraints.is_empty() {
        let mut entries = Mapping::new();
        let mut sorted = table.unique_constraints.clone();
        sorted.sort();
        for uc in &sorted {
            let mut attrs = Mapping::new();
            insert(&mut attrs, "columns", string_list(&uc.columns));
            insert_opt_text(&mut attrs, "description", &uc.description);
            entries.insert(s(&uc.name), Value::Mapping(attrs));
        }
        insert(&mut map, "unique_constraints", Value::Mapping(entries));
    }

    if !table.check_constraints.is_empty() {
        let mut entries = Mapping::new();
        let mut sorted = table.check_constraints.clone();
        sorted.sort();
        for cc in &sorted {
            entries.insert(s(&cc.name), check_constraint_value(cc));
        }
        insert(&mut map, "check_constraints", Value::Mapping(entries));
    }

    if !table.foreign_keys.is_empty() {
        let mut entries = Mapping::new();
        let mut sorted = table.foreign_keys.clone();
        sorted.sort();
        for fk in &sorted {
            let mut attrs = Mapping::new();
            insert(&mut attrs, "columns", string_list(&fk.columns));
            let mut references = Mapping::new();
            insert(&mut references, "schema", s(&fk.ref_schema));
            insert(&mut references, "table", s(&fk.ref_table));
            insert(&mut references, "columns", string_list(&fk.ref_columns));
            insert(&mut attrs, "references", Value::Mapping(references));
            if fk.on_update != crate::model::ReferentialAction::NoAction {
                insert(&mut attrs, "on_update", s(fk.on_update.as_word()));
            }
            if fk.on_delete != crate::model::ReferentialAction::NoAction {
                insert(&mut attrs, "on_delete", s(fk.on_delete.as_word()));
            }
            insert_true(&mut attrs, "deferrable", fk.deferrable);
            insert_true(&mut attrs, "initially_deferred", fk.initially_deferred);
            insert_opt_text(&mut attrs, "description", &fk.description);
            entries.insert(s(&fk.name), Value::Mapping(attrs));
        }
        insert(&mut map, "foreign_keys", Value::Mapping(entries));
    }

    if !table.indexes.is_empty() {
        let mut entries = Mapping::new();
        let mut sorted = table.indexes.clone();
        sorted.sort();
        for index in &sorted {
            entries.insert(s(&index.name), index_value(index));
        }
        insert(&mut map, "indexes", Value::Mapping(entries));
    }

    let triggers: BTreeMap<&String, &Trigger> = db
        .triggers
        .iter()
        .filter(|(_, t)| t.target_schema == table.schema && t.target_name == table.name)
        .map(|(k, t)| (k, t))
        .collect();
    if !triggers.is_empty() {
        let mut entries = Mapping::new();
        for trigger in triggers.values() {
            entries.insert(s(&trigger.name), trigger_value(trigger));
        }
        insert(&mut map, "triggers", Value::Mapping(entries));
    }

    let rules: BTreeMap<&String, &Rule> = db
        .rules
        .iter()
        .filter(|(_, r)| r.target_schema == table.schema && r.target_name == table.name)
        .map(|(k, r)| (k, r))
        .collect();
    if !rules.is_empty() {
        let mut entries = Mapping::new();
        for rule in rules.values() {
            entries.insert(s(&rule.name), rule_value(rule));
        }
        insert(&mut map, "rules", Value::Mapping(entries));
    }

    // Sequences owned by a column of this table live under the table.
    let owned: Vec<&Sequence> = db
        .sequences
        .values()
        .filter(|q| {
            q.owned_by.as_ref().is_some_and(|o| {
                o.table_schema == table.schema && o.table_name == table.name
            })
        })
        .collect();
    if !owned.is_empty() {
        let mut entries = Mapping::new();
        for seq in owned {
            entries.insert(s(&seq.name), sequence_value(seq, true));
        }
        insert(&mut map, "sequences", Value::Mapping(entries));
    }

    if !table.inherits.is_empty() {
        insert(&mut map, "inherits", string_list(&table.inherits));
    }
    insert_opt_str(&mut map, "partition_by", &table.partition_by);
    insert_opt_str(&mut map, "partition_of", &table.partition_of);
    insert_opt_str(&mut map, "partition_bound", &table.partition_bound);
    if !table.options.is_empty() {
        insert(&mut map, "options", string_list(&table.options));
    }
    insert_opt_str(&mut map, "tablespace", &table.tablespace);
    insert_true(&mut map, "unlogged", table.unlogged);
    insert_opt_str(&mut map, "owner", &table.owner);
    insert_opt_text(&mut map, "description", &table.description);
    insert_grants(&mut map, &table.privileges);
    Value::Mapping(map)
}

fn check_constraint_value(cc: &crate::model::CheckConstraint) -> Value {
    let mut attrs = Mapping::new();
    if !cc.columns.is_empty() {
        insert(&mut attrs, "columns", string_list(&cc.columns));
    }
    insert(&mut attrs, "expression", s(&cc.expression));
    insert_opt_text(&mut attrs, "description", &cc.description);
    Value::Mapping(attrs)
}

fn index_value(index: &Index) -> Value {
    let mut attrs = Mapping::new();
    if !index.columns.is_empty() {
        insert(&mut attrs, "columns", string_list(&index.columns));
    }
    insert_opt_str(&mut attrs, "definition", &index.definition);
    insert_true(&mut attrs, "unique", index.unique);
    if index.method != crate::model::IndexMethod::BTree {
        insert(&mut attrs, "access_method", s(index.method.as_sql()));
    }
    insert_opt_str(&mut attrs, "predicate", &index.predicate);
    insert_opt_str(&mut attrs, "tablespace", &index.tablespace);
    insert_opt_text(&mut attrs, "description", &index.description);
    Value::Mapping(attrs)
}

fn trigger_value(trigger: &Trigger) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "timing", s(trigger.timing.as_word()));
    insert(
        &mut attrs,
        "events",
        Value::Sequence(
            trigger
                .events
                .iter()
                .map(|e| s(e.as_word()))
                .collect(),
        ),
    );
    if !trigger.update_columns.is_empty() {
        insert(&mut attrs, "columns", string_list(&trigger.update_columns));
    }
    insert(
        &mut attrs,
        "level",
        s(if trigger.for_each_row { "row" } else { "statement" }),
    );
    insert_opt_str(&mut attrs, "condition", &trigger.when_clause);
    let mut procedure = format!(
        "{}.{}",
        trigger.function_schema, trigger.function_name
    );
    if trigger.function_schema == "public" {
        procedure = trigger.function_name.clone();
    }
    if !trigger.function_args.is_empty() {
        procedure.push_str(&format!("({})", trigger.function_args.join(", ")));
    }
    insert(&mut attrs, "procedure", s(&procedure));
    insert_opt_text(&mut attrs, "description", &trigger.description);
    Value::Mapping(attrs)
}

fn rule_value(rule: &Rule) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "event", s(rule.event.as_word()));
    insert_true(&mut attrs, "instead", rule.instead);
    insert_opt_str(&mut attrs, "condition", &rule.condition);
    insert(&mut attrs, "actions", text_block(&rule.actions));
    insert_opt_text(&mut attrs, "description", &rule.description);
    Value::Mapping(attrs)
}

fn sequence_value(seq: &Sequence, owned: bool) -> Value {
    let mut attrs = Mapping::new();
    insert_opt_i64(&mut attrs, "cache", seq.cache);
    insert_true(&mut attrs, "cycle", seq.cycle);
    insert_opt_str(&mut attrs, "data_type", &seq.data_type);
    insert_opt_i64(&mut attrs, "increment", seq.increment);
    insert_opt_i64(&mut attrs, "max_value", seq.max_value);
    insert_opt_i64(&mut attrs, "min_value", seq.min_value);
    if owned {
        if let Some(owner) = &seq.owned_by {
            insert(&mut attrs, "owner_column", s(&owner.column_name));
        }
    }
    insert_opt_i64(&mut attrs, "start", seq.start);
    insert_opt_str(&mut attrs, "owner", &seq.owner);
    insert_opt_text(&mut attrs, "description", &seq.description);
    insert_grants(&mut attrs, &seq.privileges);
    Value::Mapping(attrs)
}

fn function_value(f: &Function) -> Value {
    let mut attrs = Mapping::new();
    if f.arguments != f.argtypes {
        insert(&mut attrs, "arguments", s(&f.arguments));
    }
    insert(&mut attrs, "returns", s(&f.returns));
    insert(&mut attrs, "language", s(&f.language));
    insert(&mut attrs, "source", text_block(&f.source));
    if f.volatility != crate::model::Volatility::Volatile {
        insert(&mut attrs, "volatility", s(f.volatility.as_word()));
    }
    insert_true(&mut attrs, "strict", f.strict);
    insert_true(&mut attrs, "security_definer", f.security_definer);
    insert_true(&mut attrs, "leakproof", f.leakproof);
    if !f.depends_on.is_empty() {
        insert(&mut attrs, "depends_on", string_list(&f.depends_on));
    }
    insert_opt_str(&mut attrs, "owner", &f.owner);
    insert_opt_text(&mut attrs, "description", &f.description);
    insert_grants(&mut attrs, &f.privileges);
    Value::Mapping(attrs)
}

fn aggregate_value(a: &crate::model::Aggregate) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "sfunc", s(&a.sfunc));
    insert(&mut attrs, "stype", s(&a.stype));
    insert_opt_str(&mut attrs, "finalfunc", &a.finalfunc);
    insert_opt_str(&mut attrs, "combinefunc", &a.combinefunc);
    insert_opt_str(&mut attrs, "initcond", &a.initcond);
    insert_opt_str(&mut attrs, "sortop", &a.sortop);
    insert_opt_str(&mut attrs, "owner", &a.owner);
    insert_opt_text(&mut attrs, "description", &a.description);
    Value::Mapping(attrs)
}

fn operator_value(o: &crate::model::Operator) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "procedure", s(&o.procedure));
    insert_opt_str(&mut attrs, "commutator", &o.commutator);
    insert_opt_str(&mut attrs, "negator", &o.negator);
    insert_opt_str(&mut attrs, "restrict", &o.restrict);
    insert_opt_str(&mut attrs, "join", &o.join);
    insert_true(&mut attrs, "hashes", o.hashes);
    insert_true(&mut attrs, "merges", o.merges);
    insert_opt_str(&mut attrs, "owner", &o.owner);
    insert_opt_text(&mut attrs, "description", &o.description);
    Value::Mapping(attrs)
}

fn operator_class_value(oc: &crate::model::OperatorClass) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "type", s(&oc.for_type));
    insert_true(&mut attrs, "default", oc.default);
    insert_opt_str(&mut attrs, "family", &oc.family);
    if !oc.operators.is_empty() {
        let mut entries = Mapping::new();
        for (strategy, operator) in &oc.operators {
            entries.insert(Value::Number((*strategy as i64).into()), s(operator));
        }
        insert(&mut attrs, "operators", Value::Mapping(entries));
    }
    if !oc.functions.is_empty() {
        let mut entries = Mapping::new();
        for (support, function) in &oc.functions {
            entries.insert(Value::Number((*support as i64).into()), s(function));
        }
        insert(&mut attrs, "functions", Value::Mapping(entries));
    }
    insert_opt_str(&mut attrs, "storage", &oc.storage);
    insert_opt_str(&mut attrs, "owner", &oc.owner);
    insert_opt_text(&mut attrs, "description", &oc.description);
    Value::Mapping(attrs)
}

fn view_value(db: &Database, view: &View) -> Value {
    let mut attrs = Mapping::new();
    if !view.columns.is_empty() {
        insert(&mut attrs, "columns", string_list(&view.columns));
    }
    insert(&mut attrs, "definition", text_block(&view.definition));
    if view.materialized && !view.with_data {
        insert(&mut attrs, "with_data", Value::Bool(false));
    }
    if !view.depends_on.is_empty() {
        insert(&mut attrs, "depends_on", string_list(&view.depends_on));
    }
    insert_opt_str(&mut attrs, "owner", &view.owner);
    insert_opt_text(&mut attrs, "description", &view.description);
    insert_grants(&mut attrs, &view.privileges);

    let triggers: BTreeMap<&String, &Trigger> = db
        .triggers
        .iter()
        .filter(|(_, t)| t.target_schema == view.schema && t.target_name == view.name)
        .map(|(k, t)| (k, t))
        .collect();
    if !triggers.is_empty() {
        let mut entries = Mapping::new();
        for trigger in triggers.values() {
            entries.insert(s(&trigger.name), trigger_value(trigger));
        }
        insert(&mut attrs, "triggers", Value::Mapping(entries));
    }
    Value::Mapping(attrs)
}

fn type_value(t: &TypeDef) -> Value {
    let mut attrs = Mapping::new();
    match &t.body {
        TypeBody::Enum { values } => {
            insert(&mut attrs, "labels", string_list(values));
        }
        TypeBody::Composite { attributes } => {
            let columns: Vec<Value> = attributes
                .iter()
                .map(|a| {
                    let mut inner = Mapping::new();
                    insert_opt_str(&mut inner, "collation", &a.collation);
                    insert(&mut inner, "type", s(&a.data_type));
                    let mut entry = Mapping::new();
                    entry.insert(s(&a.name), Value::Mapping(inner));
                    Value::Mapping(entry)
                })
                .collect();
            insert(&mut attrs, "attributes", Value::Sequence(columns));
        }
        TypeBody::Range {
            subtype,
            subtype_opclass,
            collation,
            canonical,
            subtype_diff,
        } => {
            insert(&mut attrs, "subtype", s(subtype));
            insert_opt_str(&mut attrs, "subtype_opclass", subtype_opclass);
            insert_opt_str(&mut attrs, "collation", collation);
            insert_opt_str(&mut attrs, "canonical", canonical);
            insert_opt_str(&mut attrs, "subtype_diff", subtype_diff);
        }
        TypeBody::Base {
            input,
            output,
            receive,
            send,
            internallength,
            alignment,
            storage,
            category,
            preferred,
            delimiter,
            element,
        } => {
            insert(&mut attrs, "input", s(input));
            insert(&mut attrs, "output", s(output));
            insert_opt_str(&mut attrs, "receive", receive);
            insert_opt_str(&mut attrs, "send", send);
            insert_opt_str(&mut attrs, "internallength", internallength);
            insert_opt_str(&mut attrs, "alignment", alignment);
            insert_opt_str(&mut attrs, "storage", storage);
            insert_opt_str(&mut attrs, "category", category);
            insert_true(&mut attrs, "preferred", *preferred);
            insert_opt_str(&mut attrs, "delimiter", delimiter);
            insert_opt_str(&mut attrs, "element", element);
        }
    }
    insert_opt_str(&mut attrs, "owner", &t.owner);
    insert_opt_text(&mut attrs, "description", &t.description);
    insert_grants(&mut attrs, &t.privileges);
    Value::Mapping(attrs)
}

fn domain_value(d: &Domain) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "type", s(&d.base_type));
    insert_true(&mut attrs, "not_null", d.not_null);
    insert_opt_str(&mut attrs, "default", &d.default);
    insert_opt_str(&mut attrs, "collation", &d.collation);
    if !d.check_constraints.is_empty() {
        let mut entries = Mapping::new();
        let mut sorted = d.check_constraints.clone();
        sorted.sort();
        for cc in &sorted {
            entries.insert(s(&cc.name), check_constraint_value(cc));
        }
        insert(&mut attrs, "check_constraints", Value::Mapping(entries));
    }
    insert_opt_str(&mut attrs, "owner", &d.owner);
    insert_opt_text(&mut attrs, "description", &d.description);
    insert_grants(&mut attrs, &d.privileges);
    Value::Mapping(attrs)
}

fn collation_value(c: &Collation) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "lc_collate", s(&c.lc_collate));
    insert(&mut attrs, "lc_ctype", s(&c.lc_ctype));
    insert_opt_str(&mut attrs, "provider", &c.provider);
    if !c.deterministic {
        insert(&mut attrs, "deterministic", Value::Bool(false));
    }
    insert_opt_str(&mut attrs, "owner", &c.owner);
    insert_opt_text(&mut attrs, "description", &c.description);
    Value::Mapping(attrs)
}

fn conversion_value(c: &Conversion) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "source_encoding", s(&c.source_encoding));
    insert(&mut attrs, "dest_encoding", s(&c.dest_encoding));
    insert(&mut attrs, "function", s(&c.function));
    insert_true(&mut attrs, "default", c.default);
    insert_opt_str(&mut attrs, "owner", &c.owner);
    insert_opt_text(&mut attrs, "description", &c.description);
    Value::Mapping(attrs)
}

fn language_value(lang: &Language) -> Value {
    let mut attrs = Mapping::new();
    insert_true(&mut attrs, "trusted", lang.trusted);
    insert_opt_str(&mut attrs, "owner", &lang.owner);
    insert_opt_text(&mut attrs, "description", &lang.description);
    insert_grants(&mut attrs, &lang.privileges);
    Value::Mapping(attrs)
}

fn cast_value(cast: &Cast) -> Value {
    let mut attrs = Mapping::new();
    insert_opt_str(&mut attrs, "function", &cast.function);
    insert(&mut attrs, "context", s(cast.context.as_word()));
    let method = match cast.method {
        crate::model::CastMethod::Function => "function",
        crate::model::CastMethod::Inout => "inout",
        crate::model::CastMethod::Binary => "binary",
    };
    insert(&mut attrs, "method", s(method));
    insert_opt_text(&mut attrs, "description", &cast.description);
    Value::Mapping(attrs)
}

fn event_trigger_value(et: &EventTrigger) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "event", s(&et.event));
    if !et.tags.is_empty() {
        insert(&mut attrs, "tags", string_list(&et.tags));
    }
    insert(&mut attrs, "procedure", s(&et.procedure));
    insert_true(&mut attrs, "enabled", et.enabled);
    insert_opt_str(&mut attrs, "owner", &et.owner);
    insert_opt_text(&mut attrs, "description", &et.description);
    Value::Mapping(attrs)
}

fn fdw_value(fdw: &ForeignDataWrapper) -> Value {
    let mut attrs = Mapping::new();
    insert_opt_str(&mut attrs, "handler", &fdw.handler);
    insert_opt_str(&mut attrs, "validator", &fdw.validator);
    if !fdw.options.is_empty() {
        insert(&mut attrs, "options", string_list(&fdw.options));
    }
    insert_opt_str(&mut attrs, "owner", &fdw.owner);
    insert_opt_text(&mut attrs, "description", &fdw.description);
    insert_grants(&mut attrs, &fdw.privileges);
    Value::Mapping(attrs)
}

fn server_value(server: &ForeignServer) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "wrapper", s(&server.wrapper));
    insert_opt_str(&mut attrs, "type", &server.server_type);
    insert_opt_str(&mut attrs, "version", &server.version);
    if !server.options.is_empty() {
        insert(&mut attrs, "options", string_list(&server.options));
    }
    insert_opt_str(&mut attrs, "owner", &server.owner);
    insert_opt_text(&mut attrs, "description", &server.description);
    insert_grants(&mut attrs, &server.privileges);
    Value::Mapping(attrs)
}

fn user_mapping_value(um: &UserMapping) -> Value {
    let mut attrs = Mapping::new();
    if !um.options.is_empty() {
        insert(&mut attrs, "options", string_list(&um.options));
    }
    Value::Mapping(attrs)
}

fn foreign_table_value(ft: &ForeignTable) -> Value {
    let mut attrs = Mapping::new();
    insert(
        &mut attrs,
        "columns",
        Value::Sequence(ft.columns.iter().map(column_value).collect()),
    );
    insert(&mut attrs, "server", s(&ft.server));
    if !ft.options.is_empty() {
        insert(&mut attrs, "options", string_list(&ft.options));
    }
    insert_opt_str(&mut attrs, "owner", &ft.owner);
    insert_opt_text(&mut attrs, "description", &ft.description);
    insert_grants(&mut attrs, &ft.privileges);
    Value::Mapping(attrs)
}

fn ts_parser_value(p: &TsParser) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "start", s(&p.start));
    insert(&mut attrs, "gettoken", s(&p.gettoken));
    insert(&mut attrs, "end", s(&p.end));
    insert(&mut attrs, "lextypes", s(&p.lextypes));
    insert_opt_str(&mut attrs, "headline", &p.headline);
    insert_opt_text(&mut attrs, "description", &p.description);
    Value::Mapping(attrs)
}

fn ts_dictionary_value(d: &TsDictionary) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "template", s(&d.template));
    insert_opt_str(&mut attrs, "options", &d.options);
    insert_opt_str(&mut attrs, "owner", &d.owner);
    insert_opt_text(&mut attrs, "description", &d.description);
    Value::Mapping(attrs)
}

fn ts_template_value(t: &TsTemplate) -> Value {
    let mut attrs = Mapping::new();
    insert_opt_str(&mut attrs, "init", &t.init);
    insert(&mut attrs, "lexize", s(&t.lexize));
    insert_opt_text(&mut attrs, "description", &t.description);
    Value::Mapping(attrs)
}

fn ts_config_value(c: &TsConfig) -> Value {
    let mut attrs = Mapping::new();
    insert(&mut attrs, "parser", s(&c.parser));
    insert_opt_str(&mut attrs, "owner", &c.owner);
    insert_opt_text(&mut attrs, "description", &c.description);
    Value::Mapping(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PrimaryKey, SequenceOwner};

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
        let mut table = Table {
            schema: "public".into(),
            name: "t1".into(),
            ..Default::default()
        };
        table.columns.push(Column {
            name: "c1".into(),
            data_type: "integer".into(),
            not_null: true,
            ..Default::default()
        });
        table.columns.push(Column::new("c2", "smallint"));
        table.primary_key = Some(PrimaryKey {
            name: "t1_pkey".into(),
            columns: vec!["c1".into()],
            description: None,
        });
        db.tables.insert("public.t1".into(), table);
        db
    }

    #[test]
    fn emission_is_deterministic() {
        let db = sample_db();
        assert_eq!(database_to_string(&db), database_to_string(&db));
    }

    #[test]
    fn keys_combine_kind_and_identifier() {
        let yaml = database_to_string(&sample_db());
        assert!(yaml.contains("schema public:"), "{yaml}");
        assert!(yaml.contains("table t1:"), "{yaml}");
        assert!(yaml.contains("t1_pkey:"), "{yaml}");
    }

    #[test]
    fn column_order_is_preserved() {
        let yaml = database_to_string(&sample_db());
        let c1 = yaml.find("c1:").unwrap();
        let c2 = yaml.find("c2:").unwrap();
        assert!(c1 < c2);
    }

    #[test]
    fn oldname_is_never_emitted() {
        let mut db = sample_db();
        db.tables.get_mut("public.t1").unwrap().oldname = Some("t_old".into());
        let yaml = database_to_string(&db);
        assert!(!yaml.contains("oldname"), "{yaml}");
    }

    #[test]
    fn owned_sequence_nests_under_table() {
        let mut db = sample_db();
        db.sequences.insert(
            "public.t1_c1_seq".into(),
            Sequence {
                schema: "public".into(),
                name: "t1_c1_seq".into(),
                owned_by: Some(SequenceOwner {
                    table_schema: "public".into(),
                    table_name: "t1".into(),
                    column_name: "c1".into(),
                }),
                ..Default::default()
            },
        );
        let yaml = database_to_string(&db);
        assert!(yaml.contains("t1_c1_seq:"), "{yaml}");
        assert!(yaml.contains("owner_column: c1"), "{yaml}");
        assert!(!yaml.contains("sequence t1_c1_seq"), "{yaml}");
    }

    #[test]
    fn privileges_render_as_grantee_lists() {
        let mut db = sample_db();
        db.tables.get_mut("public.t1").unwrap().privileges = vec![
            Grant {
                grantee: "postgres".into(),
                privileges: vec!["all".into()],
            },
            Grant {
                grantee: "alice".into(),
                privileges: vec!["select".into()],
            },
        ];
        let yaml = database_to_string(&db);
        let alice = yaml.find("alice:").unwrap();
        let postgres = yaml.find("postgres:").unwrap();
        assert!(alice < postgres, "grantees sorted: {yaml}");
    }
}
