//! YAML to model parsing.
//!
//! Mirrors the emitter in `yaml`. Unknown attributes and type mismatches
//! abort with the offending object key and attribute named, before any DDL
//! is generated. Dependency edges are left for the linker.

use crate::model::{
    Cast, CastContext, CastMethod, CheckConstraint, Collation, Column,
    CompositeAttribute, Conversion, Database, Domain, EventTrigger, ForeignDataWrapper,
    ForeignKey, ForeignServer, ForeignTable, Function, Grant, Identity, Index, IndexMethod,
    Language, Operator, OperatorClass, OperatorFamily, PrimaryKey, ReferentialAction, Rule,
    RuleEvent, Schema, Sequence, SequenceOwner, Table, Trigger, TriggerEvent, TriggerTiming,
    TsConfig, TsDictionary, TsParser, TsTemplate, TypeBody, TypeDef, UniqueConstraint,
    UserMapping, View, Volatility,
};
use crate::util::{Result, SchemaError};
use serde_yaml::{Mapping, Value};

fn err(object: &str, message: impl Into<String>) -> SchemaError {
    SchemaError::yaml(object, message)
}

/// Parses a YAML document into a model.
pub fn database_from_str(text: &str) -> Result<Database> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|e| err("document", e.to_string()))?;
    database_from_value(&value)
}

pub fn database_from_value(value: &Value) -> Result<Database> {
    let mut db = Database::new();
    let root = as_mapping(value, "document")?;
    for (key, entry) in root {
        let key = key
            .as_str()
            .ok_or_else(|| err("document", "top-level keys must be strings"))?;
        merge_top_level(&mut db, key, entry)?;
    }
    Ok(db)
}

/// Parses one top-level `<kind> <identifier>` entry into the model.
/// Multiple-files mode calls this once per file section.
pub fn merge_top_level(db: &mut Database, key: &str, entry: &Value) -> Result<()> {
    let (kind, ident) = split_kind(key).ok_or_else(|| {
        err(key, "expected '<kind> <identifier>' (e.g. 'schema public')")
    })?;
    match kind {
        "schema" => parse_schema(db, &ident, entry),
        "extension" => {
            let ext = parse_extension(&ident, entry)?;
            db.extensions.insert(ident, ext);
            Ok(())
        }
        "language" => {
            let lang = parse_language(&ident, entry)?;
            db.languages.insert(ident, lang);
            Ok(())
        }
        "cast" => {
            let cast = parse_cast(&ident, entry)?;
            db.casts.insert(cast.key(), cast);
            Ok(())
        }
        "event trigger" => {
            let et = parse_event_trigger(&ident, entry)?;
            db.event_triggers.insert(ident, et);
            Ok(())
        }
        "foreign data wrapper" => {
            let fdw = parse_fdw(&ident, entry)?;
            db.fdws.insert(ident, fdw);
            Ok(())
        }
        "server" => {
            let server = parse_server(&ident, entry)?;
            db.servers.insert(ident, server);
            Ok(())
        }
        "user mapping" => {
            let um = parse_user_mapping(&ident, entry)?;
            db.user_mappings.insert(um.key(), um);
            Ok(())
        }
        other => Err(err(key, format!("unexpected top-level kind '{other}'"))),
    }
}

/// Multiple-files mode: parses one `<kind> <identifier>` entry that the
/// file layout scopes to a schema.
pub fn merge_schema_entry(
    db: &mut Database,
    schema: &str,
    key: &str,
    entry: &Value,
) -> Result<()> {
    let (kind, ident) = split_kind(key).ok_or_else(|| {
        err(key, "expected '<kind> <identifier>' (e.g. 'table films')")
    })?;
    parse_schema_child(db, schema, kind, &ident, entry)
}

/// Longest prefixes first so `operator class` wins over `operator`.
pub(crate) const KIND_WORDS: &[&str] = &[
    "text search configuration",
    "text search dictionary",
    "text search template",
    "text search parser",
    "foreign data wrapper",
    "materialized view",
    "operator family",
    "operator class",
    "foreign table",
    "event trigger",
    "user mapping",
    "aggregate",
    "collation",
    "conversion",
    "extension",
    "sequence",
    "function",
    "language",
    "operator",
    "trigger",
    "domain",
    "schema",
    "server",
    "table",
    "cast",
    "rule",
    "type",
    "view",
];

pub(crate) fn split_kind(key: &str) -> Option<(&'static str, String)> {
    for word in KIND_WORDS {
        if let Some(rest) = key.strip_prefix(word) {
            if let Some(ident) = rest.strip_prefix(' ') {
                if !ident.is_empty() {
                    return Some((word, ident.to_string()));
                }
            }
        }
    }
    None
}

// --- value access helpers ------------------------------------------------

fn empty_mapping() -> &'static Mapping {
    static EMPTY: std::sync::OnceLock<Mapping> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Mapping::new)
}

fn as_mapping<'a>(value: &'a Value, object: &str) -> Result<&'a Mapping> {
    match value {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(empty_mapping()),
        _ => Err(err(object, "expected a mapping")),
    }
}

fn attr_str(value: &Value, object: &str, attr: &str) -> Result<String> {
    value
        .as_str()
        .map(|v| v.to_string())
        .ok_or_else(|| err(object, format!("attribute '{attr}' must be a string")))
}

fn attr_bool(value: &Value, object: &str, attr: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| err(object, format!("attribute '{attr}' must be a boolean")))
}

fn attr_i64(value: &Value, object: &str, attr: &str) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| err(object, format!("attribute '{attr}' must be an integer")))
}

fn attr_str_list(value: &Value, object: &str, attr: &str) -> Result<Vec<String>> {
    let seq = value
        .as_sequence()
        .ok_or_else(|| err(object, format!("attribute '{attr}' must be a list")))?;
    seq.iter()
        .map(|v| attr_str(v, object, attr))
        .collect()
}

fn parse_grants(value: &Value, object: &str) -> Result<Vec<Grant>> {
    let seq = value
        .as_sequence()
        .ok_or_else(|| err(object, "privileges must be a list"))?;
    let mut grants = Vec::new();
    for item in seq {
        let map = as_mapping(item, object)?;
        for (grantee, privs) in map {
            let grantee = attr_str(grantee, object, "privileges")?;
            let privileges = attr_str_list(privs, object, "privileges")?;
            grants.push(Grant {
                grantee,
                privileges,
            });
        }
    }
    Ok(grants)
}

// --- per-kind parsers ----------------------------------------------------

fn parse_schema(db: &mut Database, name: &str, entry: &Value) -> Result<()> {
    let object = format!("schema {name}");
    let map = as_mapping(entry, &object)?;
    let mut schema = Schema {
        name: name.to_string(),
        ..Default::default()
    };

    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "owner" => schema.owner = Some(attr_str(value, &object, key)?),
            "description" => schema.description = Some(attr_str(value, &object, key)?),
            "privileges" => schema.privileges = parse_grants(value, &object)?,
            "oldname" => schema.oldname = Some(attr_str(value, &object, key)?),
            nested => {
                let (kind, ident) = split_kind(nested)
                    .ok_or_else(|| err(&object, format!("unknown attribute '{nested}'")))?;
                parse_schema_child(db, name, kind, &ident, value)?;
            }
        }
    }

    db.schemas.insert(name.to_string(), schema);
    Ok(())
}

fn parse_schema_child(
    db: &mut Database,
    schema: &str,
    kind: &str,
    ident: &str,
    value: &Value,
) -> Result<()> {
    match kind {
        "table" => {
            let table = parse_table(db, schema, ident, value)?;
            db.tables.insert(table.qualified(), table);
            Ok(())
        }
        "view" | "materialized view" => {
            let view = parse_view(db, schema, ident, value, kind == "materialized view")?;
            db.views.insert(view.qualified(), view);
            Ok(())
        }
        "sequence" => {
            let seq = parse_sequence(schema, ident, value, None)?;
            db.sequences.insert(seq.qualified(), seq);
            Ok(())
        }
        "function" => {
            let f = parse_function(schema, ident, value)?;
            db.functions.insert(f.key(), f);
            Ok(())
        }
        "aggregate" => {
            let a = parse_aggregate(schema, ident, value)?;
            db.aggregates.insert(a.key(), a);
            Ok(())
        }
        "operator" => {
            let o = parse_operator(schema, ident, value)?;
            db.operators.insert(o.key(), o);
            Ok(())
        }
        "operator class" => {
            let oc = parse_operator_class(schema, ident, value)?;
            db.operator_classes.insert(oc.key(), oc);
            Ok(())
        }
        "operator family" => {
            let of = parse_operator_family(schema, ident, value)?;
            db.operator_families.insert(of.key(), of);
            Ok(())
        }
        "type" => {
            let t = parse_type(schema, ident, value)?;
            db.types.insert(t.qualified(), t);
            Ok(())
        }
        "domain" => {
            let d = parse_domain(schema, ident, value)?;
            db.domains.insert(d.qualified(), d);
            Ok(())
        }
        "collation" => {
            let c = parse_collation(schema, ident, value)?;
            db.collations.insert(c.qualified(), c);
            Ok(())
        }
        "conversion" => {
            let c = parse_conversion(schema, ident, value)?;
            db.conversions.insert(c.qualified(), c);
            Ok(())
        }
        "foreign table" => {
            let ft = parse_foreign_table(schema, ident, value)?;
            db.foreign_tables.insert(ft.qualified(), ft);
            Ok(())
        }
        "text search parser" => {
            let p = parse_ts_parser(schema, ident, value)?;
            db.ts_parsers.insert(p.qualified(), p);
            Ok(())
        }
        "text search dictionary" => {
            let d = parse_ts_dictionary(schema, ident, value)?;
            db.ts_dictionaries.insert(d.qualified(), d);
            Ok(())
        }
        "text search template" => {
            let t = parse_ts_template(schema, ident, value)?;
            db.ts_templates.insert(t.qualified(), t);
            Ok(())
        }
        "text search configuration" => {
            let c = parse_ts_config(schema, ident, value)?;
            db.ts_configs.insert(c.qualified(), c);
            Ok(())
        }
        other => Err(err(
            &format!("schema {schema}"),
            format!("unexpected object kind '{other} {ident}'"),
        )),
    }
}

fn parse_extension(name: &str, entry: &Value) -> Result<crate::model::Extension> {
    let object = format!("extension {name}");
    let map = as_mapping(entry, &object)?;
    let mut ext = crate::model::Extension {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "schema" => ext.schema = Some(attr_str(value, &object, key)?),
            "version" => ext.version = Some(attr_str(value, &object, key)?),
            "description" => ext.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(ext)
}

fn parse_language(name: &str, entry: &Value) -> Result<Language> {
    let object = format!("language {name}");
    let map = as_mapping(entry, &object)?;
    let mut lang = Language {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "trusted" => lang.trusted = attr_bool(value, &object, key)?,
            "owner" => lang.owner = Some(attr_str(value, &object, key)?),
            "description" => lang.description = Some(attr_str(value, &object, key)?),
            "privileges" => lang.privileges = parse_grants(value, &object)?,
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(lang)
}

/// Cast identifiers look like `(text AS integer)`.
fn parse_cast(ident: &str, entry: &Value) -> Result<Cast> {
    let object = format!("cast {ident}");
    let inner = ident
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| err(&object, "cast identifier must look like '(source AS target)'"))?;
    let (source, target) = inner
        .split_once(" AS ")
        .ok_or_else(|| err(&object, "cast identifier must look like '(source AS target)'"))?;

    let map = as_mapping(entry, &object)?;
    let mut cast = Cast {
        source: source.trim().to_string(),
        target: target.trim().to_string(),
        ..Default::default()
    };
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "function" => cast.function = Some(attr_str(value, &object, key)?),
            "context" => {
                let word = attr_str(value, &object, key)?;
                cast.context = CastContext::parse(&word)
                    .ok_or_else(|| err(&object, format!("bad cast context '{word}'")))?;
            }
            "method" => {
                let word = attr_str(value, &object, key)?;
                cast.method = match word.as_str() {
                    "function" => CastMethod::Function,
                    "inout" => CastMethod::Inout,
                    "binary" => CastMethod::Binary,
                    other => return Err(err(&object, format!("bad cast method '{other}'"))),
                };
            }
            "description" => cast.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(cast)
}

fn parse_event_trigger(name: &str, entry: &Value) -> Result<EventTrigger> {
    let object = format!("event trigger {name}");
    let map = as_mapping(entry, &object)?;
    let mut et = EventTrigger {
        name: name.to_string(),
        enabled: true,
        ..Default::default()
    };
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "event" => et.event = attr_str(value, &object, key)?,
            "tags" => et.tags = attr_str_list(value, &object, key)?,
            "procedure" => et.procedure = attr_str(value, &object, key)?,
            "enabled" => et.enabled = attr_bool(value, &object, key)?,
            "owner" => et.owner = Some(attr_str(value, &object, key)?),
            "description" => et.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(et)
}

fn parse_fdw(name: &str, entry: &Value) -> Result<ForeignDataWrapper> {
    let object = format!("foreign data wrapper {name}");
    let map = as_mapping(entry, &object)?;
    let mut fdw = ForeignDataWrapper {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "handler" => fdw.handler = Some(attr_str(value, &object, key)?),
            "validator" => fdw.validator = Some(attr_str(value, &object, key)?),
            "options" => fdw.options = attr_str_list(value, &object, key)?,
            "owner" => fdw.owner = Some(attr_str(value, &object, key)?),
            "description" => fdw.description = Some(attr_str(value, &object, key)?),
            "privileges" => fdw.privileges = parse_grants(value, &object)?,
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(fdw)
}

fn parse_server(name: &str, entry: &Value) -> Result<ForeignServer> {
    let object = format!("server {name}");
    let map = as_mapping(entry, &object)?;
    let mut server = ForeignServer {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "wrapper" => server.wrapper = attr_str(value, &object, key)?,
            "type" => server.server_type = Some(attr_str(value, &object, key)?),
            "version" => server.version = Some(attr_str(value, &object, key)?),
            "options" => server.options = attr_str_list(value, &object, key)?,
            "owner" => server.owner = Some(attr_str(value, &object, key)?),
            "description" => server.description = Some(attr_str(value, &object, key)?),
            "privileges" => server.privileges = parse_grants(value, &object)?,
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(server)
}

/// User mapping identifiers look like `alice@files`.
fn parse_user_mapping(ident: &str, entry: &Value) -> Result<UserMapping> {
    let object = format!("user mapping {ident}");
    let (user, server) = ident
        .split_once('@')
        .ok_or_else(|| err(&object, "identifier must look like 'user@server'"))?;
    let map = as_mapping(entry, &object)?;
    let mut um = UserMapping {
        user: user.to_string(),
        server: server.to_string(),
        ..Default::default()
    };
    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "options" => um.options = attr_str_list(value, &object, key)?,
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(um)
}

fn parse_column(entry: &Value, object: &str) -> Result<Column> {
    let outer = as_mapping(entry, object)?;
    if outer.len() != 1 {
        return Err(err(object, "each column entry must have exactly one key"));
    }
    let (name, attrs) = outer.iter().next().expect("len checked");
    let name = attr_str(name, object, "columns")?;
    let object = format!("{object} column {name}");
    let mut column = Column {
        name,
        ..Default::default()
    };
    for (key, value) in as_mapping(attrs, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "type" => column.data_type = attr_str(value, &object, key)?,
            "not_null" => column.not_null = attr_bool(value, &object, key)?,
            "default" => column.default = Some(attr_str(value, &object, key)?),
            "collation" => column.collation = Some(attr_str(value, &object, key)?),
            "identity" => {
                let word = attr_str(value, &object, key)?;
                column.identity = Some(
                    Identity::parse(&word)
                        .ok_or_else(|| err(&object, format!("bad identity '{word}'")))?,
                );
            }
            "statistics" => column.statistics = Some(attr_i64(value, &object, key)? as i32),
            "storage" => column.storage = Some(attr_str(value, &object, key)?),
            "description" => column.description = Some(attr_str(value, &object, key)?),
            "privileges" => column.privileges = parse_grants(value, &object)?,
            "oldname" => column.oldname = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if column.data_type.is_empty() {
        return Err(err(&object, "missing 'type'"));
    }
    Ok(column)
}

fn parse_check_constraint(name: &str, entry: &Value, object: &str) -> Result<CheckConstraint> {
    let object = format!("{object} check constraint {name}");
    let mut cc = CheckConstraint {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "columns" => cc.columns = attr_str_list(value, &object, key)?,
            "expression" => cc.expression = attr_str(value, &object, key)?,
            "description" => cc.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if cc.expression.is_empty() {
        return Err(err(&object, "missing 'expression'"));
    }
    Ok(cc)
}

fn parse_table(db: &mut Database, schema: &str, name: &str, entry: &Value) -> Result<Table> {
    let object = format!("table {schema}.{name}");
    let map = as_mapping(entry, &object)?;
    let mut table = Table {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };

    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "columns" => {
                let seq = value
                    .as_sequence()
                    .ok_or_else(|| err(&object, "'columns' must be a list"))?;
                for item in seq {
                    table.columns.push(parse_column(item, &object)?);
                }
            }
            "primary_key" => {
                let entries = as_mapping(value, &object)?;
                if entries.len() != 1 {
                    return Err(err(&object, "'primary_key' must have exactly one entry"));
                }
                let (pk_name, attrs) = entries.iter().next().expect("len checked");
                let pk_name = attr_str(pk_name, &object, key)?;
                let mut pk = PrimaryKey {
                    name: pk_name,
                    ..Default::default()
                };
                for (attr, v) in as_mapping(attrs, &object)? {
                    let attr = attr
                        .as_str()
                        .ok_or_else(|| err(&object, "keys must be strings"))?;
                    match attr {
                        "columns" => pk.columns = attr_str_list(v, &object, attr)?,
                        "description" => pk.description = Some(attr_str(v, &object, attr)?),
                        other => {
                            return Err(err(&object, format!("unknown attribute '{other}'")))
                        }
                    }
                }
                table.primary_key = Some(pk);
            }
            "unique_constraints" => {
                for (uc_name, attrs) in as_mapping(value, &object)? {
                    let uc_name = attr_str(uc_name, &object, key)?;
                    let mut uc = UniqueConstraint {
                        name: uc_name,
                        ..Default::default()
                    };
                    for (attr, v) in as_mapping(attrs, &object)? {
                        let attr = attr
                            .as_str()
                            .ok_or_else(|| err(&object, "keys must be strings"))?;
                        match attr {
                            "columns" => uc.columns = attr_str_list(v, &object, attr)?,
                            "description" => uc.description = Some(attr_str(v, &object, attr)?),
                            other => {
                                return Err(err(&object, format!("unknown attribute '{other}'")))
                            }
                        }
                    }
                    table.unique_constraints.push(uc);
                }
            }
            "check_constraints" => {
                for (cc_name, attrs) in as_mapping(value, &object)? {
                    let cc_name = attr_str(cc_name, &object, key)?;
                    table
                        .check_constraints
                        .push(parse_check_constraint(&cc_name, attrs, &object)?);
                }
            }
            "foreign_keys" => {
                for (fk_name, attrs) in as_mapping(value, &object)? {
                    let fk_name = attr_str(fk_name, &object, key)?;
                    table.foreign_keys.push(parse_foreign_key(
                        &fk_name, attrs, &object,
                    )?);
                }
            }
            "indexes" => {
                for (ix_name, attrs) in as_mapping(value, &object)? {
                    let ix_name = attr_str(ix_name, &object, key)?;
                    table.indexes.push(parse_index(&ix_name, attrs, &object)?);
                }
            }
            "triggers" => {
                for (trg_name, attrs) in as_mapping(value, &object)? {
                    let trg_name = attr_str(trg_name, &object, key)?;
                    let trigger = parse_trigger(schema, name, &trg_name, attrs)?;
                    db.triggers.insert(trigger.key(), trigger);
                }
            }
            "rules" => {
                for (rule_name, attrs) in as_mapping(value, &object)? {
                    let rule_name = attr_str(rule_name, &object, key)?;
                    let rule = parse_rule(schema, name, &rule_name, attrs)?;
                    db.rules.insert(rule.key(), rule);
                }
            }
            "sequences" => {
                for (seq_name, attrs) in as_mapping(value, &object)? {
                    let seq_name = attr_str(seq_name, &object, key)?;
                    let seq = parse_sequence(schema, &seq_name, attrs, Some((schema, name)))?;
                    db.sequences.insert(seq.qualified(), seq);
                }
            }
            "inherits" => table.inherits = attr_str_list(value, &object, key)?,
            "partition_by" => table.partition_by = Some(attr_str(value, &object, key)?),
            "partition_of" => table.partition_of = Some(attr_str(value, &object, key)?),
            "partition_bound" => table.partition_bound = Some(attr_str(value, &object, key)?),
            "options" => table.options = attr_str_list(value, &object, key)?,
            "tablespace" => table.tablespace = Some(attr_str(value, &object, key)?),
            "unlogged" => table.unlogged = attr_bool(value, &object, key)?,
            "owner" => table.owner = Some(attr_str(value, &object, key)?),
            "description" => table.description = Some(attr_str(value, &object, key)?),
            "privileges" => table.privileges = parse_grants(value, &object)?,
            "oldname" => table.oldname = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(table)
}

fn parse_foreign_key(name: &str, entry: &Value, object: &str) -> Result<ForeignKey> {
    let object = format!("{object} foreign key {name}");
    let mut fk = ForeignKey {
        name: name.to_string(),
        columns: Vec::new(),
        ref_schema: "public".to_string(),
        ref_table: String::new(),
        ref_columns: Vec::new(),
        on_update: ReferentialAction::NoAction,
        on_delete: ReferentialAction::NoAction,
        deferrable: false,
        initially_deferred: false,
        description: None,
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "columns" => fk.columns = attr_str_list(value, &object, key)?,
            "references" => {
                for (attr, v) in as_mapping(value, &object)? {
                    let attr = attr
                        .as_str()
                        .ok_or_else(|| err(&object, "keys must be strings"))?;
                    match attr {
                        "schema" => fk.ref_schema = attr_str(v, &object, attr)?,
                        "table" => fk.ref_table = attr_str(v, &object, attr)?,
                        "columns" => fk.ref_columns = attr_str_list(v, &object, attr)?,
                        other => {
                            return Err(err(&object, format!("unknown attribute '{other}'")))
                        }
                    }
                }
            }
            "on_update" => {
                let word = attr_str(value, &object, key)?;
                fk.on_update = ReferentialAction::parse(&word)
                    .ok_or_else(|| err(&object, format!("bad on_update '{word}'")))?;
            }
            "on_delete" => {
                let word = attr_str(value, &object, key)?;
                fk.on_delete = ReferentialAction::parse(&word)
                    .ok_or_else(|| err(&object, format!("bad on_delete '{word}'")))?;
            }
            "deferrable" => fk.deferrable = attr_bool(value, &object, key)?,
            "initially_deferred" => fk.initially_deferred = attr_bool(value, &object, key)?,
            "description" => fk.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if fk.ref_table.is_empty() {
        return Err(err(&object, "missing 'references.table'"));
    }
    Ok(fk)
}

fn parse_index(name: &str, entry: &Value, object: &str) -> Result<Index> {
    let object = format!("{object} index {name}");
    let mut index = Index {
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "columns" => index.columns = attr_str_list(value, &object, key)?,
            "definition" => index.definition = Some(attr_str(value, &object, key)?),
            "unique" => index.unique = attr_bool(value, &object, key)?,
            "access_method" => {
                let word = attr_str(value, &object, key)?;
                index.method = IndexMethod::parse(&word)
                    .ok_or_else(|| err(&object, format!("bad access_method '{word}'")))?;
            }
            "predicate" => index.predicate = Some(attr_str(value, &object, key)?),
            "tablespace" => index.tablespace = Some(attr_str(value, &object, key)?),
            "description" => index.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if index.columns.is_empty() && index.definition.is_none() {
        return Err(err(&object, "an index needs 'columns' or 'definition'"));
    }
    Ok(index)
}

fn parse_trigger(schema: &str, target: &str, name: &str, entry: &Value) -> Result<Trigger> {
    let object = format!("trigger {schema}.{target}.{name}");
    let mut trigger = Trigger {
        name: name.to_string(),
        target_schema: schema.to_string(),
        target_name: target.to_string(),
        timing: TriggerTiming::Before,
        events: Vec::new(),
        update_columns: Vec::new(),
        for_each_row: false,
        when_clause: None,
        function_schema: "public".to_string(),
        function_name: String::new(),
        function_args: Vec::new(),
        description: None,
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "timing" => {
                let word = attr_str(value, &object, key)?;
                trigger.timing = TriggerTiming::parse(&word)
                    .ok_or_else(|| err(&object, format!("bad timing '{word}'")))?;
            }
            "events" => {
                for word in attr_str_list(value, &object, key)? {
                    trigger.events.push(
                        TriggerEvent::parse(&word)
                            .ok_or_else(|| err(&object, format!("bad event '{word}'")))?,
                    );
                }
            }
            "columns" => trigger.update_columns = attr_str_list(value, &object, key)?,
            "level" => {
                let word = attr_str(value, &object, key)?;
                trigger.for_each_row = match word.as_str() {
                    "row" => true,
                    "statement" => false,
                    other => return Err(err(&object, format!("bad level '{other}'"))),
                };
            }
            "condition" => trigger.when_clause = Some(attr_str(value, &object, key)?),
            "procedure" => {
                let procedure = attr_str(value, &object, key)?;
                let (call, args) = match procedure.split_once('(') {
                    Some((call, rest)) => {
                        let args = rest.trim_end_matches(')');
                        let args = if args.is_empty() {
                            Vec::new()
                        } else {
                            args.split(", ").map(|a| a.to_string()).collect()
                        };
                        (call.to_string(), args)
                    }
                    None => (procedure, Vec::new()),
                };
                let (fn_schema, fn_name) = qualified_pair(&call);
                trigger.function_schema = fn_schema;
                trigger.function_name = fn_name;
                trigger.function_args = args;
            }
            "description" => trigger.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if trigger.events.is_empty() {
        return Err(err(&object, "missing 'events'"));
    }
    if trigger.function_name.is_empty() {
        return Err(err(&object, "missing 'procedure'"));
    }
    Ok(trigger)
}

fn qualified_pair(name: &str) -> (String, String) {
    let (schema, bare) = crate::model::parse_qualified_name(name);
    (schema, bare)
}

fn parse_rule(schema: &str, target: &str, name: &str, entry: &Value) -> Result<Rule> {
    let object = format!("rule {schema}.{target}.{name}");
    let mut rule = Rule {
        name: name.to_string(),
        target_schema: schema.to_string(),
        target_name: target.to_string(),
        event: RuleEvent::Select,
        instead: false,
        condition: None,
        actions: String::new(),
        description: None,
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "event" => {
                let word = attr_str(value, &object, key)?;
                rule.event = RuleEvent::parse(&word)
                    .ok_or_else(|| err(&object, format!("bad event '{word}'")))?;
            }
            "instead" => rule.instead = attr_bool(value, &object, key)?,
            "condition" => rule.condition = Some(attr_str(value, &object, key)?),
            "actions" => rule.actions = attr_str(value, &object, key)?,
            "description" => rule.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if rule.actions.is_empty() {
        return Err(err(&object, "missing 'actions'"));
    }
    Ok(rule)
}

fn parse_sequence(
    schema: &str,
    name: &str,
    entry: &Value,
    owning_table: Option<(&str, &str)>,
) -> Result<Sequence> {
    let object = format!("sequence {schema}.{name}");
    let mut seq = Sequence {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "cache" => seq.cache = Some(attr_i64(value, &object, key)?),
            "cycle" => seq.cycle = attr_bool(value, &object, key)?,
            "data_type" => seq.data_type = Some(attr_str(value, &object, key)?),
            "increment" => seq.increment = Some(attr_i64(value, &object, key)?),
            "max_value" => seq.max_value = Some(attr_i64(value, &object, key)?),
            "min_value" => seq.min_value = Some(attr_i64(value, &object, key)?),
            "start" => seq.start = Some(attr_i64(value, &object, key)?),
            "owner_column" => {
                let column = attr_str(value, &object, key)?;
                let (table_schema, table_name) = owning_table.ok_or_else(|| {
                    err(&object, "'owner_column' is only valid under a table")
                })?;
                seq.owned_by = Some(SequenceOwner {
                    table_schema: table_schema.to_string(),
                    table_name: table_name.to_string(),
                    column_name: column,
                });
            }
            "owner" => seq.owner = Some(attr_str(value, &object, key)?),
            "description" => seq.description = Some(attr_str(value, &object, key)?),
            "privileges" => seq.privileges = parse_grants(value, &object)?,
            "oldname" => seq.oldname = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(seq)
}

/// Function identifiers look like `foo(integer, text)`.
fn parse_signature(ident: &str, object: &str) -> Result<(String, String)> {
    let open = ident
        .find('(')
        .ok_or_else(|| err(object, "identifier must include an argument type list"))?;
    let name = ident[..open].to_string();
    let args = ident[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| err(object, "unbalanced parentheses in identifier"))?
        .to_string();
    Ok((name, args))
}

fn parse_function(schema: &str, ident: &str, entry: &Value) -> Result<Function> {
    let object = format!("function {schema}.{ident}");
    let (name, argtypes) = parse_signature(ident, &object)?;
    let mut f = Function {
        schema: schema.to_string(),
        name,
        arguments: argtypes.clone(),
        argtypes,
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "arguments" => f.arguments = attr_str(value, &object, key)?,
            "returns" => f.returns = attr_str(value, &object, key)?,
            "language" => f.language = attr_str(value, &object, key)?,
            "source" => f.source = attr_str(value, &object, key)?,
            "volatility" => {
                let word = attr_str(value, &object, key)?;
                f.volatility = Volatility::parse(&word)
                    .ok_or_else(|| err(&object, format!("bad volatility '{word}'")))?;
            }
            "strict" => f.strict = attr_bool(value, &object, key)?,
            "security_definer" => f.security_definer = attr_bool(value, &object, key)?,
            "leakproof" => f.leakproof = attr_bool(value, &object, key)?,
            "depends_on" => f.depends_on = attr_str_list(value, &object, key)?,
            "owner" => f.owner = Some(attr_str(value, &object, key)?),
            "description" => f.description = Some(attr_str(value, &object, key)?),
            "privileges" => f.privileges = parse_grants(value, &object)?,
            "oldname" => f.oldname = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if f.returns.is_empty() {
        return Err(err(&object, "missing 'returns'"));
    }
    if f.language.is_empty() {
        return Err(err(&object, "missing 'language'"));
    }
    Ok(f)
}

fn parse_aggregate(schema: &str, ident: &str, entry: &Value) -> Result<crate::model::Aggregate> {
    let object = format!("aggregate {schema}.{ident}");
    let (name, argtypes) = parse_signature(ident, &object)?;
    let mut a = crate::model::Aggregate {
        schema: schema.to_string(),
        name,
        argtypes,
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "sfunc" => a.sfunc = attr_str(value, &object, key)?,
            "stype" => a.stype = attr_str(value, &object, key)?,
            "finalfunc" => a.finalfunc = Some(attr_str(value, &object, key)?),
            "combinefunc" => a.combinefunc = Some(attr_str(value, &object, key)?),
            "initcond" => a.initcond = Some(attr_str(value, &object, key)?),
            "sortop" => a.sortop = Some(attr_str(value, &object, key)?),
            "owner" => a.owner = Some(attr_str(value, &object, key)?),
            "description" => a.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if a.sfunc.is_empty() || a.stype.is_empty() {
        return Err(err(&object, "an aggregate needs 'sfunc' and 'stype'"));
    }
    Ok(a)
}

fn parse_operator(schema: &str, ident: &str, entry: &Value) -> Result<Operator> {
    let object = format!("operator {schema}.{ident}");
    let (name, args) = parse_signature(ident, &object)?;
    let mut parts = args.splitn(2, ", ");
    let leftarg = parts.next().unwrap_or("NONE").to_string();
    let rightarg = parts.next().unwrap_or("NONE").to_string();
    let mut o = Operator {
        schema: schema.to_string(),
        name,
        leftarg: (leftarg != "NONE").then_some(leftarg),
        rightarg: (rightarg != "NONE").then_some(rightarg),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "procedure" => o.procedure = attr_str(value, &object, key)?,
            "commutator" => o.commutator = Some(attr_str(value, &object, key)?),
            "negator" => o.negator = Some(attr_str(value, &object, key)?),
            "restrict" => o.restrict = Some(attr_str(value, &object, key)?),
            "join" => o.join = Some(attr_str(value, &object, key)?),
            "hashes" => o.hashes = attr_bool(value, &object, key)?,
            "merges" => o.merges = attr_bool(value, &object, key)?,
            "owner" => o.owner = Some(attr_str(value, &object, key)?),
            "description" => o.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if o.procedure.is_empty() {
        return Err(err(&object, "missing 'procedure'"));
    }
    Ok(o)
}

/// Operator class / family identifiers look like `int4_ops using btree`.
fn parse_using(ident: &str, object: &str) -> Result<(String, String)> {
    ident
        .split_once(" using ")
        .map(|(n, m)| (n.to_string(), m.to_string()))
        .ok_or_else(|| err(object, "identifier must look like '<name> using <method>'"))
}

fn parse_operator_class(schema: &str, ident: &str, entry: &Value) -> Result<OperatorClass> {
    let object = format!("operator class {schema}.{ident}");
    let (name, index_method) = parse_using(ident, &object)?;
    let mut oc = OperatorClass {
        schema: schema.to_string(),
        name,
        index_method,
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "type" => oc.for_type = attr_str(value, &object, key)?,
            "default" => oc.default = attr_bool(value, &object, key)?,
            "family" => oc.family = Some(attr_str(value, &object, key)?),
            "operators" => {
                for (strategy, operator) in as_mapping(value, &object)? {
                    let strategy = strategy
                        .as_i64()
                        .ok_or_else(|| err(&object, "operator strategies must be integers"))?;
                    oc.operators
                        .insert(strategy as i16, attr_str(operator, &object, key)?);
                }
            }
            "functions" => {
                for (support, function) in as_mapping(value, &object)? {
                    let support = support
                        .as_i64()
                        .ok_or_else(|| err(&object, "function supports must be integers"))?;
                    oc.functions
                        .insert(support as i16, attr_str(function, &object, key)?);
                }
            }
            "storage" => oc.storage = Some(attr_str(value, &object, key)?),
            "owner" => oc.owner = Some(attr_str(value, &object, key)?),
            "description" => oc.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if oc.for_type.is_empty() {
        return Err(err(&object, "missing 'type'"));
    }
    Ok(oc)
}

fn parse_operator_family(schema: &str, ident: &str, entry: &Value) -> Result<OperatorFamily> {
    let object = format!("operator family {schema}.{ident}");
    let (name, index_method) = parse_using(ident, &object)?;
    let mut of = OperatorFamily {
        schema: schema.to_string(),
        name,
        index_method,
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "owner" => of.owner = Some(attr_str(value, &object, key)?),
            "description" => of.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(of)
}

fn parse_type(schema: &str, name: &str, entry: &Value) -> Result<TypeDef> {
    let object = format!("type {schema}.{name}");
    let map = as_mapping(entry, &object)?;

    let mut owner = None;
    let mut description = None;
    let mut privileges = Vec::new();
    let mut oldname = None;
    let mut labels: Option<Vec<String>> = None;
    let mut attributes: Option<Vec<CompositeAttribute>> = None;
    let mut range: Mapping = Mapping::new();
    let mut base: Mapping = Mapping::new();

    for (key, value) in map {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "labels" => labels = Some(attr_str_list(value, &object, key)?),
            "attributes" => {
                let seq = value
                    .as_sequence()
                    .ok_or_else(|| err(&object, "'attributes' must be a list"))?;
                let mut attrs = Vec::new();
                for item in seq {
                    let outer = as_mapping(item, &object)?;
                    if outer.len() != 1 {
                        return Err(err(&object, "each attribute entry must have one key"));
                    }
                    let (attr_name, inner) = outer.iter().next().expect("len checked");
                    let attr_name = attr_str(attr_name, &object, key)?;
                    let mut attribute = CompositeAttribute {
                        name: attr_name,
                        ..Default::default()
                    };
                    for (k, v) in as_mapping(inner, &object)? {
                        let k = k
                            .as_str()
                            .ok_or_else(|| err(&object, "keys must be strings"))?;
                        match k {
                            "type" => attribute.data_type = attr_str(v, &object, k)?,
                            "collation" => attribute.collation = Some(attr_str(v, &object, k)?),
                            other => {
                                return Err(err(&object, format!("unknown attribute '{other}'")))
                            }
                        }
                    }
                    attrs.push(attribute);
                }
                attributes = Some(attrs);
            }
            "subtype" | "subtype_opclass" | "canonical" | "subtype_diff" => {
                range.insert(Value::String(key.to_string()), value.clone());
            }
            "input" | "output" | "receive" | "send" | "internallength" | "alignment"
            | "storage" | "category" | "preferred" | "delimiter" | "element" => {
                base.insert(Value::String(key.to_string()), value.clone());
            }
            "collation" => {
                range.insert(Value::String("collation".to_string()), value.clone());
            }
            "owner" => owner = Some(attr_str(value, &object, key)?),
            "description" => description = Some(attr_str(value, &object, key)?),
            "privileges" => privileges = parse_grants(value, &object)?,
            "oldname" => oldname = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }

    let body = if let Some(values) = labels {
        TypeBody::Enum { values }
    } else if let Some(attributes) = attributes {
        TypeBody::Composite { attributes }
    } else if range.get(&Value::String("subtype".into())).is_some() {
        let get = |k: &str| {
            range
                .get(&Value::String(k.to_string()))
                .and_then(|v| v.as_str())
                .map(|v| v.to_string())
        };
        TypeBody::Range {
            subtype: get("subtype").expect("checked above"),
            subtype_opclass: get("subtype_opclass"),
            collation: get("collation"),
            canonical: get("canonical"),
            subtype_diff: get("subtype_diff"),
        }
    } else if base.get(&Value::String("input".into())).is_some() {
        let get = |k: &str| {
            base.get(&Value::String(k.to_string()))
                .and_then(|v| v.as_str())
                .map(|v| v.to_string())
        };
        TypeBody::Base {
            input: get("input").expect("checked above"),
            output: get("output")
                .ok_or_else(|| err(&object, "a base type needs 'output'"))?,
            receive: get("receive"),
            send: get("send"),
            internallength: get("internallength"),
            alignment: get("alignment"),
            storage: get("storage"),
            category: get("category"),
            preferred: base
                .get(&Value::String("preferred".into()))
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            delimiter: get("delimiter"),
            element: get("element"),
        }
    } else {
        return Err(err(
            &object,
            "a type needs 'labels', 'attributes', 'subtype', or 'input'/'output'",
        ));
    };

    Ok(TypeDef {
        schema: schema.to_string(),
        name: name.to_string(),
        body,
        owner,
        description,
        privileges,
        oldname,
        oid: None,
    })
}

fn parse_domain(schema: &str, name: &str, entry: &Value) -> Result<Domain> {
    let object = format!("domain {schema}.{name}");
    let mut d = Domain {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "type" => d.base_type = attr_str(value, &object, key)?,
            "not_null" => d.not_null = attr_bool(value, &object, key)?,
            "default" => d.default = Some(attr_str(value, &object, key)?),
            "collation" => d.collation = Some(attr_str(value, &object, key)?),
            "check_constraints" => {
                for (cc_name, attrs) in as_mapping(value, &object)? {
                    let cc_name = attr_str(cc_name, &object, key)?;
                    d.check_constraints
                        .push(parse_check_constraint(&cc_name, attrs, &object)?);
                }
            }
            "owner" => d.owner = Some(attr_str(value, &object, key)?),
            "description" => d.description = Some(attr_str(value, &object, key)?),
            "privileges" => d.privileges = parse_grants(value, &object)?,
            "oldname" => d.oldname = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if d.base_type.is_empty() {
        return Err(err(&object, "missing 'type'"));
    }
    Ok(d)
}

fn parse_collation(schema: &str, name: &str, entry: &Value) -> Result<Collation> {
    let object = format!("collation {schema}.{name}");
    let mut c = Collation {
        schema: schema.to_string(),
        name: name.to_string(),
        deterministic: true,
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "lc_collate" => c.lc_collate = attr_str(value, &object, key)?,
            "lc_ctype" => c.lc_ctype = attr_str(value, &object, key)?,
            "provider" => c.provider = Some(attr_str(value, &object, key)?),
            "deterministic" => c.deterministic = attr_bool(value, &object, key)?,
            "owner" => c.owner = Some(attr_str(value, &object, key)?),
            "description" => c.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(c)
}

fn parse_conversion(schema: &str, name: &str, entry: &Value) -> Result<Conversion> {
    let object = format!("conversion {schema}.{name}");
    let mut c = Conversion {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "source_encoding" => c.source_encoding = attr_str(value, &object, key)?,
            "dest_encoding" => c.dest_encoding = attr_str(value, &object, key)?,
            "function" => c.function = attr_str(value, &object, key)?,
            "default" => c.default = attr_bool(value, &object, key)?,
            "owner" => c.owner = Some(attr_str(value, &object, key)?),
            "description" => c.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(c)
}

fn parse_view(
    db: &mut Database,
    schema: &str,
    name: &str,
    entry: &Value,
    materialized: bool,
) -> Result<View> {
    let object = format!("view {schema}.{name}");
    let mut view = View {
        schema: schema.to_string(),
        name: name.to_string(),
        materialized,
        with_data: materialized,
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "definition" => view.definition = attr_str(value, &object, key)?,
            "columns" => view.columns = attr_str_list(value, &object, key)?,
            "with_data" => view.with_data = attr_bool(value, &object, key)?,
            "depends_on" => view.depends_on = attr_str_list(value, &object, key)?,
            "triggers" => {
                for (trg_name, attrs) in as_mapping(value, &object)? {
                    let trg_name = attr_str(trg_name, &object, key)?;
                    let trigger = parse_trigger(schema, name, &trg_name, attrs)?;
                    db.triggers.insert(trigger.key(), trigger);
                }
            }
            "owner" => view.owner = Some(attr_str(value, &object, key)?),
            "description" => view.description = Some(attr_str(value, &object, key)?),
            "privileges" => view.privileges = parse_grants(value, &object)?,
            "oldname" => view.oldname = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if view.definition.is_empty() {
        return Err(err(&object, "missing 'definition'"));
    }
    Ok(view)
}

fn parse_foreign_table(schema: &str, name: &str, entry: &Value) -> Result<ForeignTable> {
    let object = format!("foreign table {schema}.{name}");
    let mut ft = ForeignTable {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "columns" => {
                let seq = value
                    .as_sequence()
                    .ok_or_else(|| err(&object, "'columns' must be a list"))?;
                for item in seq {
                    ft.columns.push(parse_column(item, &object)?);
                }
            }
            "server" => ft.server = attr_str(value, &object, key)?,
            "options" => ft.options = attr_str_list(value, &object, key)?,
            "owner" => ft.owner = Some(attr_str(value, &object, key)?),
            "description" => ft.description = Some(attr_str(value, &object, key)?),
            "privileges" => ft.privileges = parse_grants(value, &object)?,
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    if ft.server.is_empty() {
        return Err(err(&object, "missing 'server'"));
    }
    Ok(ft)
}

fn parse_ts_parser(schema: &str, name: &str, entry: &Value) -> Result<TsParser> {
    let object = format!("text search parser {schema}.{name}");
    let mut p = TsParser {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "start" => p.start = attr_str(value, &object, key)?,
            "gettoken" => p.gettoken = attr_str(value, &object, key)?,
            "end" => p.end = attr_str(value, &object, key)?,
            "lextypes" => p.lextypes = attr_str(value, &object, key)?,
            "headline" => p.headline = Some(attr_str(value, &object, key)?),
            "description" => p.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(p)
}

fn parse_ts_dictionary(schema: &str, name: &str, entry: &Value) -> Result<TsDictionary> {
    let object = format!("text search dictionary {schema}.{name}");
    let mut d = TsDictionary {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "template" => d.template = attr_str(value, &object, key)?,
            "options" => d.options = Some(attr_str(value, &object, key)?),
            "owner" => d.owner = Some(attr_str(value, &object, key)?),
            "description" => d.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(d)
}

fn parse_ts_template(schema: &str, name: &str, entry: &Value) -> Result<TsTemplate> {
    let object = format!("text search template {schema}.{name}");
    let mut t = TsTemplate {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "init" => t.init = Some(attr_str(value, &object, key)?),
            "lexize" => t.lexize = attr_str(value, &object, key)?,
            "description" => t.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(t)
}

fn parse_ts_config(schema: &str, name: &str, entry: &Value) -> Result<TsConfig> {
    let object = format!("text search configuration {schema}.{name}");
    let mut c = TsConfig {
        schema: schema.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    for (key, value) in as_mapping(entry, &object)? {
        let key = key
            .as_str()
            .ok_or_else(|| err(&object, "keys must be strings"))?;
        match key {
            "parser" => c.parser = attr_str(value, &object, key)?,
            "owner" => c.owner = Some(attr_str(value, &object, key)?),
            "description" => c.description = Some(attr_str(value, &object, key)?),
            other => return Err(err(&object, format!("unknown attribute '{other}'"))),
        }
    }
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
schema public:
  owner: postgres
  privileges:
  - postgres:
    - all
  - PUBLIC:
    - all
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
    check_constraints:
      t1_c2_check:
        columns:
        - c2
        expression: (c2 > 123)
schema s1:
  table t2:
    columns:
    - c21:
        not_null: true
        type: integer
    primary_key:
      t2_pkey:
        columns:
        - c21
"#;

    #[test]
    fn parses_the_reference_shape() {
        let db = database_from_str(SAMPLE).unwrap();
        assert_eq!(db.schemas.len(), 2);
        let t1 = &db.tables["public.t1"];
        assert_eq!(t1.columns.len(), 2);
        assert!(t1.columns[0].not_null);
        assert_eq!(t1.columns[1].data_type, "smallint");
        assert_eq!(t1.primary_key.as_ref().unwrap().columns, vec!["c1"]);
        let fk = &t1.foreign_keys[0];
        assert_eq!(fk.ref_schema, "s1");
        assert_eq!(fk.on_update, ReferentialAction::SetNull);
        assert_eq!(fk.on_delete, ReferentialAction::Restrict);
        assert_eq!(db.schemas["public"].privileges.len(), 2);
    }

    #[test]
    fn column_order_follows_the_document() {
        let db = database_from_str(SAMPLE).unwrap();
        let names = db.tables["public.t1"].column_names();
        assert_eq!(names, vec!["c1", "c2"]);
    }

    #[test]
    fn unknown_attribute_is_pinpointed() {
        let text = "schema public:\n  table t1:\n    columns:\n    - c1:\n        type: integer\n    sparkle: true\n";
        let error = database_from_str(text).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("table public.t1"), "{message}");
        assert!(message.contains("sparkle"), "{message}");
    }

    #[test]
    fn bad_kind_prefix_is_rejected() {
        let error = database_from_str("widget w1:\n  size: 3\n").unwrap_err();
        assert!(error.to_string().contains("widget w1"), "{error}");
    }

    #[test]
    fn function_signature_key_parses() {
        let text = "schema public:\n  function add(integer, integer):\n    returns: integer\n    language: sql\n    source: SELECT $1 + $2\n";
        let db = database_from_str(text).unwrap();
        let f = &db.functions["public.add(integer, integer)"];
        assert_eq!(f.name, "add");
        assert_eq!(f.argtypes, "integer, integer");
    }

    #[test]
    fn owned_sequence_under_table_gets_owner() {
        let text = "schema public:\n  table t1:\n    columns:\n    - c1:\n        type: integer\n    sequences:\n      t1_c1_seq:\n        owner_column: c1\n        start: 1\n";
        let db = database_from_str(text).unwrap();
        let seq = &db.sequences["public.t1_c1_seq"];
        let owner = seq.owned_by.as_ref().unwrap();
        assert_eq!(owner.table_name, "t1");
        assert_eq!(owner.column_name, "c1");
    }

    #[test]
    fn oldname_round_trips_into_the_model_only() {
        let text = "schema public:\n  table t2:\n    oldname: t1\n    columns:\n    - c1:\n        type: integer\n";
        let db = database_from_str(text).unwrap();
        assert_eq!(db.tables["public.t2"].oldname.as_deref(), Some("t1"));
        let emitted = crate::yaml::database_to_string(&db);
        assert!(!emitted.contains("oldname"));
    }
}
