//! DDL rendering.
//!
//! Turns an ordered change plan into SQL statement strings. Objects in the
//! `public` schema are written unqualified; everything else is
//! schema-qualified. Identifiers are quoted only when they need it.

use crate::diff::{
    ChangeOp, ColumnChanges, CompositeChanges, DbObject, DomainChanges, EnumValuePosition,
    SequenceChanges, SqlTarget, TableChanges,
};
use crate::model::{
    Aggregate, Cast, CastMethod, CheckConstraint, Collation, Column, Conversion, Domain,
    EventTrigger, ForeignDataWrapper, ForeignKey, ForeignServer, ForeignTable, Function, Index,
    Language, ObjectKind, Operator, OperatorClass, OperatorFamily, PrimaryKey, Rule, Sequence,
    Table, Trigger, TsConfig, TsDictionary, TsParser, TsTemplate, TypeBody, TypeDef,
    UniqueConstraint, UserMapping, View,
};

/// Renders every change record of a plan, preserving order.
pub fn generate_sql(ops: &[ChangeOp]) -> Vec<String> {
    ops.iter().flat_map(generate_op_sql).collect()
}

const RESERVED_WORDS: &[&str] = &[
    "all", "and", "any", "array", "as", "asc", "both", "case", "cast", "check", "collate",
    "column", "constraint", "create", "current_date", "current_time", "default", "desc",
    "distinct", "do", "else", "end", "except", "for", "foreign", "from", "grant", "group",
    "having", "in", "initially", "intersect", "into", "leading", "limit", "not", "null", "off",
    "offset", "on", "only", "or", "order", "primary", "references", "select", "table", "then",
    "to", "trailing", "union", "unique", "user", "using", "when", "where", "with",
];

/// Quotes an identifier only when required: mixed case, non-identifier
/// characters, or a reserved word.
pub fn quote_ident(ident: &str) -> String {
    let plain = !ident.is_empty()
        && ident
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase() || c == '_')
            .unwrap_or(false)
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !RESERVED_WORDS.contains(&ident);
    if plain {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// Qualified identifier; objects in `public` stay unqualified.
pub fn quote_qualified(schema: &str, name: &str) -> String {
    if schema == "public" {
        quote_ident(name)
    } else {
        format!("{}.{}", quote_ident(schema), quote_ident(name))
    }
}

fn quote_qualified_key(key: &str) -> String {
    let (schema, name) = crate::model::parse_qualified_name(key);
    quote_qualified(&schema, &name)
}

pub fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

fn format_column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_op_sql(op: &ChangeOp) -> Vec<String> {
    match op {
        ChangeOp::Create(obj) => generate_create(obj),
        ChangeOp::Drop(obj) => vec![generate_drop(obj)],
        ChangeOp::Rename { object, old_name } => vec![generate_rename(object, old_name)],
        ChangeOp::RenameColumn {
            table,
            old_name,
            new_name,
        } => vec![format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            quote_qualified_key(table),
            quote_ident(old_name),
            quote_ident(new_name)
        )],
        ChangeOp::AddColumn { table, column } => vec![format!(
            "ALTER TABLE {} ADD COLUMN {};",
            quote_qualified_key(table),
            format_column(column)
        )],
        ChangeOp::DropColumn { table, column } => vec![format!(
            "ALTER TABLE {} DROP COLUMN {};",
            quote_qualified_key(table),
            quote_ident(column)
        )],
        ChangeOp::AlterColumn {
            table,
            column,
            changes,
        } => generate_alter_column(table, column, changes),
        ChangeOp::AddPrimaryKey { table, primary_key } => {
            vec![generate_add_primary_key(table, primary_key)]
        }
        ChangeOp::AddUniqueConstraint { table, constraint } => {
            vec![generate_add_unique(table, constraint)]
        }
        ChangeOp::AddCheckConstraint { table, constraint } => {
            vec![generate_add_check(table, constraint)]
        }
        ChangeOp::AddForeignKey { table, foreign_key } => {
            vec![generate_add_foreign_key(table, foreign_key)]
        }
        ChangeOp::DropConstraint { table, name } => vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            quote_qualified_key(table),
            quote_ident(name)
        )],
        ChangeOp::AddIndex { table, index } => vec![generate_create_index(table, index)],
        ChangeOp::DropIndex { schema, name } => vec![format!(
            "DROP INDEX {};",
            quote_qualified(schema, name)
        )],
        ChangeOp::AlterTableSet { table, changes } => generate_alter_table_set(table, changes),
        ChangeOp::AlterSequence { name, changes } => generate_alter_sequence(name, changes),
        ChangeOp::AlterDomain { name, changes } => generate_alter_domain(name, changes),
        ChangeOp::AddEnumValue {
            type_name,
            value,
            position,
        } => vec![generate_add_enum_value(type_name, value, position)],
        ChangeOp::AlterCompositeType { name, changes } => {
            generate_alter_composite(name, changes)
        }
        ChangeOp::ReplaceFunction(func) => vec![generate_create_function(func, true)],
        ChangeOp::ReplaceView(view) => vec![generate_create_view(view, true)],
        ChangeOp::RefreshMatView { name } => vec![format!(
            "REFRESH MATERIALIZED VIEW {};",
            quote_qualified_key(name)
        )],
        ChangeOp::AlterOwner { target, new_owner } => {
            let (kind_word, ident) = target_sql(target);
            vec![format!(
                "ALTER {kind_word} {ident} OWNER TO {};",
                quote_ident(new_owner)
            )]
        }
        ChangeOp::Comment { target, text } => {
            let (kind_word, ident) = target_sql(target);
            let value = match text {
                Some(t) => format!("'{}'", escape_string(t)),
                None => "NULL".to_string(),
            };
            vec![format!("COMMENT ON {kind_word} {ident} IS {value};")]
        }
        ChangeOp::Grant {
            target,
            grantee,
            privileges,
            grantable,
        } => vec![generate_grant(target, grantee, privileges, *grantable)],
        ChangeOp::Revoke {
            target,
            grantee,
            privileges,
        } => vec![generate_revoke(target, grantee, privileges)],
    }
}

// --- create --------------------------------------------------------------

fn generate_create(obj: &DbObject) -> Vec<String> {
    match obj {
        DbObject::Schema(s) => vec![format!("CREATE SCHEMA {};", quote_ident(&s.name))],
        DbObject::Extension(e) => {
            let mut sql = format!("CREATE EXTENSION {}", quote_ident(&e.name));
            if let Some(schema) = &e.schema {
                sql.push_str(&format!(" SCHEMA {}", quote_ident(schema)));
            }
            if let Some(version) = &e.version {
                sql.push_str(&format!(" VERSION '{}'", escape_string(version)));
            }
            sql.push(';');
            vec![sql]
        }
        DbObject::Language(l) => vec![generate_create_language(l)],
        DbObject::Cast(c) => vec![generate_create_cast(c)],
        DbObject::Collation(c) => vec![generate_create_collation(c)],
        DbObject::Conversion(c) => vec![generate_create_conversion(c)],
        DbObject::EventTrigger(et) => vec![generate_create_event_trigger(et)],
        DbObject::ForeignDataWrapper(f) => vec![generate_create_fdw(f)],
        DbObject::ForeignServer(s) => vec![generate_create_server(s)],
        DbObject::UserMapping(um) => vec![generate_create_user_mapping(um)],
        DbObject::ForeignTable(ft) => vec![generate_create_foreign_table(ft)],
        DbObject::Table(t) => vec![generate_create_table(t)],
        DbObject::View(v) => vec![generate_create_view(v, false)],
        DbObject::Sequence(s) => vec![generate_create_sequence(s)],
        DbObject::Function(f) => vec![generate_create_function(f, false)],
        DbObject::Aggregate(a) => vec![generate_create_aggregate(a)],
        DbObject::Operator(o) => vec![generate_create_operator(o)],
        DbObject::OperatorClass(oc) => vec![generate_create_operator_class(oc)],
        DbObject::OperatorFamily(of) => vec![generate_create_operator_family(of)],
        DbObject::Type(t) => vec![generate_create_type(t)],
        DbObject::Domain(d) => vec![generate_create_domain(d)],
        DbObject::Trigger(t) => vec![generate_create_trigger(t)],
        DbObject::Rule(r) => vec![generate_create_rule(r)],
        DbObject::TsParser(p) => vec![generate_create_ts_parser(p)],
        DbObject::TsDictionary(d) => vec![generate_create_ts_dictionary(d)],
        DbObject::TsTemplate(t) => vec![generate_create_ts_template(t)],
        DbObject::TsConfig(c) => vec![generate_create_ts_config(c)],
    }
}

pub fn format_column(column: &Column) -> String {
    let mut sql = format!("{} {}", quote_ident(&column.name), column.data_type);
    if let Some(collation) = &column.collation {
        sql.push_str(&format!(" COLLATE {}", quote_qualified_key(collation)));
    }
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(&format!(" DEFAULT {default}"));
    }
    if let Some(identity) = &column.identity {
        sql.push_str(&format!(" {}", identity.as_sql()));
    }
    sql
}

fn generate_create_table(table: &Table) -> String {
    let rendered = quote_qualified(&table.schema, &table.name);
    let keyword = if table.unlogged {
        "CREATE UNLOGGED TABLE"
    } else {
        "CREATE TABLE"
    };

    if let Some(parent) = &table.partition_of {
        let bound = table
            .partition_bound
            .as_deref()
            .unwrap_or("DEFAULT")
            .to_string();
        return format!(
            "{keyword} {rendered} PARTITION OF {} {bound};",
            quote_qualified_key(parent)
        );
    }

    let columns = table
        .columns
        .iter()
        .filter(|c| !c.inherited)
        .map(format_column)
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("{keyword} {rendered} ({columns})");
    if !table.inherits.is_empty() {
        sql.push_str(&format!(
            " INHERITS ({})",
            table
                .inherits
                .iter()
                .map(|p| quote_qualified_key(p))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if let Some(partition_by) = &table.partition_by {
        sql.push_str(&format!(" PARTITION BY {partition_by}"));
    }
    if !table.options.is_empty() {
        sql.push_str(&format!(" WITH ({})", table.options.join(", ")));
    }
    if let Some(tablespace) = &table.tablespace {
        sql.push_str(&format!(" TABLESPACE {}", quote_ident(tablespace)));
    }
    sql.push(';');
    sql
}

fn generate_create_view(view: &View, replace: bool) -> String {
    let rendered = quote_qualified(&view.schema, &view.name);
    let definition = view.definition.trim_end().trim_end_matches(';');
    if view.materialized {
        let data = if view.with_data { "" } else { " WITH NO DATA" };
        format!("CREATE MATERIALIZED VIEW {rendered} AS {definition}{data};")
    } else {
        let keyword = if replace {
            "CREATE OR REPLACE VIEW"
        } else {
            "CREATE VIEW"
        };
        let columns = if view.columns.is_empty() {
            String::new()
        } else {
            format!(" ({})", format_column_list(&view.columns))
        };
        format!("{keyword} {rendered}{columns} AS {definition};")
    }
}

fn generate_create_sequence(seq: &Sequence) -> String {
    let mut sql = format!(
        "CREATE SEQUENCE {}",
        quote_qualified(&seq.schema, &seq.name)
    );
    if let Some(data_type) = &seq.data_type {
        sql.push_str(&format!(" AS {data_type}"));
    }
    if let Some(increment) = seq.increment {
        sql.push_str(&format!(" INCREMENT BY {increment}"));
    }
    if let Some(min_value) = seq.min_value {
        sql.push_str(&format!(" MINVALUE {min_value}"));
    }
    if let Some(max_value) = seq.max_value {
        sql.push_str(&format!(" MAXVALUE {max_value}"));
    }
    if let Some(start) = seq.start {
        sql.push_str(&format!(" START WITH {start}"));
    }
    if let Some(cache) = seq.cache {
        sql.push_str(&format!(" CACHE {cache}"));
    }
    if seq.cycle {
        sql.push_str(" CYCLE");
    }
    sql.push(';');
    sql
}

fn generate_create_function(func: &Function, replace: bool) -> String {
    let keyword = if replace {
        "CREATE OR REPLACE FUNCTION"
    } else {
        "CREATE FUNCTION"
    };
    let mut sql = format!(
        "{keyword} {}({}) RETURNS {} LANGUAGE {}",
        quote_qualified(&func.schema, &func.name),
        func.arguments,
        func.returns,
        quote_ident(&func.language)
    );
    if func.volatility != crate::model::Volatility::Volatile {
        sql.push_str(&format!(" {}", func.volatility.as_sql()));
    }
    if func.strict {
        sql.push_str(" STRICT");
    }
    if func.security_definer {
        sql.push_str(" SECURITY DEFINER");
    }
    if func.leakproof {
        sql.push_str(" LEAKPROOF");
    }
    let source = func.source.trim_matches('\n');
    sql.push_str(&format!("\nAS $function$\n{source}\n$function$;"));
    sql
}

fn generate_create_aggregate(agg: &Aggregate) -> String {
    let mut parts = vec![
        format!("SFUNC = {}", agg.sfunc),
        format!("STYPE = {}", agg.stype),
    ];
    if let Some(finalfunc) = &agg.finalfunc {
        parts.push(format!("FINALFUNC = {finalfunc}"));
    }
    if let Some(combinefunc) = &agg.combinefunc {
        parts.push(format!("COMBINEFUNC = {combinefunc}"));
    }
    if let Some(initcond) = &agg.initcond {
        parts.push(format!("INITCOND = '{}'", escape_string(initcond)));
    }
    if let Some(sortop) = &agg.sortop {
        parts.push(format!("SORTOP = {sortop}"));
    }
    format!(
        "CREATE AGGREGATE {}({}) ({});",
        quote_qualified(&agg.schema, &agg.name),
        agg.argtypes,
        parts.join(", ")
    )
}

fn generate_create_operator(op: &Operator) -> String {
    let mut parts = vec![format!("PROCEDURE = {}", op.procedure)];
    if let Some(leftarg) = &op.leftarg {
        parts.push(format!("LEFTARG = {leftarg}"));
    }
    if let Some(rightarg) = &op.rightarg {
        parts.push(format!("RIGHTARG = {rightarg}"));
    }
    if let Some(commutator) = &op.commutator {
        parts.push(format!("COMMUTATOR = {commutator}"));
    }
    if let Some(negator) = &op.negator {
        parts.push(format!("NEGATOR = {negator}"));
    }
    if let Some(restrict) = &op.restrict {
        parts.push(format!("RESTRICT = {restrict}"));
    }
    if let Some(join) = &op.join {
        parts.push(format!("JOIN = {join}"));
    }
    if op.hashes {
        parts.push("HASHES".to_string());
    }
    if op.merges {
        parts.push("MERGES".to_string());
    }
    let name = if op.schema == "public" {
        op.name.clone()
    } else {
        format!("{}.{}", quote_ident(&op.schema), op.name)
    };
    format!("CREATE OPERATOR {name} ({});", parts.join(", "))
}

fn generate_create_operator_class(oc: &OperatorClass) -> String {
    let mut items: Vec<String> = Vec::new();
    for (strategy, operator) in &oc.operators {
        items.push(format!("OPERATOR {strategy} {operator}"));
    }
    for (support, function) in &oc.functions {
        items.push(format!("FUNCTION {support} {function}"));
    }
    if let Some(storage) = &oc.storage {
        items.push(format!("STORAGE {storage}"));
    }
    let default = if oc.default { "DEFAULT " } else { "" };
    let family = oc
        .family
        .as_ref()
        .map(|f| format!(" FAMILY {}", quote_qualified_key(f)))
        .unwrap_or_default();
    format!(
        "CREATE OPERATOR CLASS {} {default}FOR TYPE {} USING {}{family} AS {};",
        quote_qualified(&oc.schema, &oc.name),
        oc.for_type,
        oc.index_method,
        items.join(", ")
    )
}

fn generate_create_operator_family(of: &OperatorFamily) -> String {
    format!(
        "CREATE OPERATOR FAMILY {} USING {};",
        quote_qualified(&of.schema, &of.name),
        of.index_method
    )
}

fn generate_create_type(t: &TypeDef) -> String {
    let rendered = quote_qualified(&t.schema, &t.name);
    match &t.body {
        TypeBody::Enum { values } => format!(
            "CREATE TYPE {rendered} AS ENUM ({});",
            values
                .iter()
                .map(|v| format!("'{}'", escape_string(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        TypeBody::Composite { attributes } => format!(
            "CREATE TYPE {rendered} AS ({});",
            attributes
                .iter()
                .map(|a| {
                    let mut attr = format!("{} {}", quote_ident(&a.name), a.data_type);
                    if let Some(collation) = &a.collation {
                        attr.push_str(&format!(" COLLATE {}", quote_qualified_key(collation)));
                    }
                    attr
                })
                .collect::<Vec<_>>()
                .join(", ")
        ),
        TypeBody::Range {
            subtype,
            subtype_opclass,
            collation,
            canonical,
            subtype_diff,
        } => {
            let mut parts = vec![format!("SUBTYPE = {subtype}")];
            if let Some(opclass) = subtype_opclass {
                parts.push(format!("SUBTYPE_OPCLASS = {opclass}"));
            }
            if let Some(collation) = collation {
                parts.push(format!("COLLATION = {collation}"));
            }
            if let Some(canonical) = canonical {
                parts.push(format!("CANONICAL = {canonical}"));
            }
            if let Some(diff) = subtype_diff {
                parts.push(format!("SUBTYPE_DIFF = {diff}"));
            }
            format!("CREATE TYPE {rendered} AS RANGE ({});", parts.join(", "))
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
            let mut parts = vec![format!("INPUT = {input}"), format!("OUTPUT = {output}")];
            if let Some(receive) = receive {
                parts.push(format!("RECEIVE = {receive}"));
            }
            if let Some(send) = send {
                parts.push(format!("SEND = {send}"));
            }
            if let Some(len) = internallength {
                parts.push(format!("INTERNALLENGTH = {len}"));
            }
            if let Some(alignment) = alignment {
                parts.push(format!("ALIGNMENT = {alignment}"));
            }
            if let Some(storage) = storage {
                parts.push(format!("STORAGE = {storage}"));
            }
            if let Some(category) = category {
                parts.push(format!("CATEGORY = '{}'", escape_string(category)));
            }
            if *preferred {
                parts.push("PREFERRED = true".to_string());
            }
            if let Some(delimiter) = delimiter {
                parts.push(format!("DELIMITER = '{}'", escape_string(delimiter)));
            }
            if let Some(element) = element {
                parts.push(format!("ELEMENT = {element}"));
            }
            format!("CREATE TYPE {rendered} ({});", parts.join(", "))
        }
    }
}

fn generate_create_domain(d: &Domain) -> String {
    let mut sql = format!(
        "CREATE DOMAIN {} AS {}",
        quote_qualified(&d.schema, &d.name),
        d.base_type
    );
    if let Some(collation) = &d.collation {
        sql.push_str(&format!(" COLLATE {}", quote_qualified_key(collation)));
    }
    if let Some(default) = &d.default {
        sql.push_str(&format!(" DEFAULT {default}"));
    }
    if d.not_null {
        sql.push_str(" NOT NULL");
    }
    for check in &d.check_constraints {
        sql.push_str(&format!(
            " CONSTRAINT {} CHECK ({})",
            quote_ident(&check.name),
            check.expression.trim_start_matches('(').trim_end_matches(')')
        ));
    }
    sql.push(';');
    sql
}

fn generate_create_trigger(trigger: &Trigger) -> String {
    let events = trigger
        .events
        .iter()
        .map(|e| {
            if *e == crate::model::TriggerEvent::Update && !trigger.update_columns.is_empty() {
                format!("UPDATE OF {}", format_column_list(&trigger.update_columns))
            } else {
                e.as_sql().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    let level = if trigger.for_each_row {
        "FOR EACH ROW"
    } else {
        "FOR EACH STATEMENT"
    };
    let when = trigger
        .when_clause
        .as_ref()
        .map(|w| format!(" WHEN ({w})"))
        .unwrap_or_default();
    let args = trigger
        .function_args
        .iter()
        .map(|a| format!("'{}'", escape_string(a)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TRIGGER {} {} {events} ON {} {level}{when} EXECUTE FUNCTION {}({args});",
        quote_ident(&trigger.name),
        trigger.timing.as_sql(),
        quote_qualified(&trigger.target_schema, &trigger.target_name),
        quote_qualified(&trigger.function_schema, &trigger.function_name)
    )
}

fn generate_create_rule(rule: &Rule) -> String {
    let condition = rule
        .condition
        .as_ref()
        .map(|c| format!(" WHERE {c}"))
        .unwrap_or_default();
    let instead = if rule.instead { "INSTEAD " } else { "" };
    format!(
        "CREATE RULE {} AS ON {} TO {}{condition} DO {instead}{};",
        quote_ident(&rule.name),
        rule.event.as_sql(),
        quote_qualified(&rule.target_schema, &rule.target_name),
        rule.actions
    )
}

fn generate_create_language(lang: &Language) -> String {
    let trusted = if lang.trusted { "TRUSTED " } else { "" };
    format!("CREATE {trusted}LANGUAGE {};", quote_ident(&lang.name))
}

fn generate_create_cast(cast: &Cast) -> String {
    let method = match cast.method {
        CastMethod::Function => format!(
            "WITH FUNCTION {}",
            cast.function.as_deref().unwrap_or_default()
        ),
        CastMethod::Inout => "WITH INOUT".to_string(),
        CastMethod::Binary => "WITHOUT FUNCTION".to_string(),
    };
    let context = match cast.context {
        crate::model::CastContext::Explicit => "",
        crate::model::CastContext::Assignment => " AS ASSIGNMENT",
        crate::model::CastContext::Implicit => " AS IMPLICIT",
    };
    format!(
        "CREATE CAST ({} AS {}) {method}{context};",
        cast.source, cast.target
    )
}

fn generate_create_collation(coll: &Collation) -> String {
    let mut parts = vec![
        format!("LC_COLLATE = '{}'", escape_string(&coll.lc_collate)),
        format!("LC_CTYPE = '{}'", escape_string(&coll.lc_ctype)),
    ];
    if let Some(provider) = &coll.provider {
        parts.push(format!("PROVIDER = {provider}"));
    }
    if !coll.deterministic {
        parts.push("DETERMINISTIC = false".to_string());
    }
    format!(
        "CREATE COLLATION {} ({});",
        quote_qualified(&coll.schema, &coll.name),
        parts.join(", ")
    )
}

fn generate_create_conversion(conv: &Conversion) -> String {
    let default = if conv.default { "DEFAULT " } else { "" };
    format!(
        "CREATE {default}CONVERSION {} FOR '{}' TO '{}' FROM {};",
        quote_qualified(&conv.schema, &conv.name),
        escape_string(&conv.source_encoding),
        escape_string(&conv.dest_encoding),
        conv.function
    )
}

fn generate_create_event_trigger(et: &EventTrigger) -> String {
    let tags = if et.tags.is_empty() {
        String::new()
    } else {
        format!(
            " WHEN TAG IN ({})",
            et.tags
                .iter()
                .map(|t| format!("'{}'", escape_string(t)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    };
    format!(
        "CREATE EVENT TRIGGER {} ON {}{tags} EXECUTE FUNCTION {}();",
        quote_ident(&et.name),
        et.event,
        et.procedure
    )
}

fn format_options(options: &[String]) -> String {
    options
        .iter()
        .map(|opt| match opt.split_once('=') {
            Some((name, value)) => format!("{name} '{}'", escape_string(value)),
            None => opt.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_create_fdw(fdw: &ForeignDataWrapper) -> String {
    let mut sql = format!("CREATE FOREIGN DATA WRAPPER {}", quote_ident(&fdw.name));
    if let Some(handler) = &fdw.handler {
        sql.push_str(&format!(" HANDLER {handler}"));
    }
    if let Some(validator) = &fdw.validator {
        sql.push_str(&format!(" VALIDATOR {validator}"));
    }
    if !fdw.options.is_empty() {
        sql.push_str(&format!(" OPTIONS ({})", format_options(&fdw.options)));
    }
    sql.push(';');
    sql
}

fn generate_create_server(server: &ForeignServer) -> String {
    let mut sql = format!("CREATE SERVER {}", quote_ident(&server.name));
    if let Some(server_type) = &server.server_type {
        sql.push_str(&format!(" TYPE '{}'", escape_string(server_type)));
    }
    if let Some(version) = &server.version {
        sql.push_str(&format!(" VERSION '{}'", escape_string(version)));
    }
    sql.push_str(&format!(
        " FOREIGN DATA WRAPPER {}",
        quote_ident(&server.wrapper)
    ));
    if !server.options.is_empty() {
        sql.push_str(&format!(" OPTIONS ({})", format_options(&server.options)));
    }
    sql.push(';');
    sql
}

fn generate_create_user_mapping(um: &UserMapping) -> String {
    let user = if um.user == "PUBLIC" {
        "PUBLIC".to_string()
    } else {
        quote_ident(&um.user)
    };
    let mut sql = format!(
        "CREATE USER MAPPING FOR {user} SERVER {}",
        quote_ident(&um.server)
    );
    if !um.options.is_empty() {
        sql.push_str(&format!(" OPTIONS ({})", format_options(&um.options)));
    }
    sql.push(';');
    sql
}

fn generate_create_foreign_table(ft: &ForeignTable) -> String {
    let columns = ft
        .columns
        .iter()
        .map(format_column)
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "CREATE FOREIGN TABLE {} ({columns}) SERVER {}",
        quote_qualified(&ft.schema, &ft.name),
        quote_ident(&ft.server)
    );
    if !ft.options.is_empty() {
        sql.push_str(&format!(" OPTIONS ({})", format_options(&ft.options)));
    }
    sql.push(';');
    sql
}

fn generate_create_ts_parser(p: &TsParser) -> String {
    let mut parts = vec![
        format!("START = {}", p.start),
        format!("GETTOKEN = {}", p.gettoken),
        format!("END = {}", p.end),
        format!("LEXTYPES = {}", p.lextypes),
    ];
    if let Some(headline) = &p.headline {
        parts.push(format!("HEADLINE = {headline}"));
    }
    format!(
        "CREATE TEXT SEARCH PARSER {} ({});",
        quote_qualified(&p.schema, &p.name),
        parts.join(", ")
    )
}

fn generate_create_ts_dictionary(d: &TsDictionary) -> String {
    let mut parts = vec![format!("TEMPLATE = {}", d.template)];
    if let Some(options) = &d.options {
        parts.push(options.clone());
    }
    format!(
        "CREATE TEXT SEARCH DICTIONARY {} ({});",
        quote_qualified(&d.schema, &d.name),
        parts.join(", ")
    )
}

fn generate_create_ts_template(t: &TsTemplate) -> String {
    let mut parts = Vec::new();
    if let Some(init) = &t.init {
        parts.push(format!("INIT = {init}"));
    }
    parts.push(format!("LEXIZE = {}", t.lexize));
    format!(
        "CREATE TEXT SEARCH TEMPLATE {} ({});",
        quote_qualified(&t.schema, &t.name),
        parts.join(", ")
    )
}

fn generate_create_ts_config(c: &TsConfig) -> String {
    format!(
        "CREATE TEXT SEARCH CONFIGURATION {} (PARSER = {});",
        quote_qualified(&c.schema, &c.name),
        c.parser
    )
}

// --- drop ----------------------------------------------------------------

fn generate_drop(obj: &DbObject) -> String {
    match obj {
        DbObject::Schema(s) => format!("DROP SCHEMA {};", quote_ident(&s.name)),
        DbObject::Extension(e) => format!("DROP EXTENSION {};", quote_ident(&e.name)),
        DbObject::Language(l) => format!("DROP LANGUAGE {};", quote_ident(&l.name)),
        DbObject::Cast(c) => format!("DROP CAST ({} AS {});", c.source, c.target),
        DbObject::Collation(c) => {
            format!("DROP COLLATION {};", quote_qualified(&c.schema, &c.name))
        }
        DbObject::Conversion(c) => {
            format!("DROP CONVERSION {};", quote_qualified(&c.schema, &c.name))
        }
        DbObject::EventTrigger(et) => format!("DROP EVENT TRIGGER {};", quote_ident(&et.name)),
        DbObject::ForeignDataWrapper(f) => {
            format!("DROP FOREIGN DATA WRAPPER {};", quote_ident(&f.name))
        }
        DbObject::ForeignServer(s) => format!("DROP SERVER {};", quote_ident(&s.name)),
        DbObject::UserMapping(um) => format!(
            "DROP USER MAPPING FOR {} SERVER {};",
            quote_ident(&um.user),
            quote_ident(&um.server)
        ),
        DbObject::ForeignTable(ft) => format!(
            "DROP FOREIGN TABLE {};",
            quote_qualified(&ft.schema, &ft.name)
        ),
        DbObject::Table(t) => format!("DROP TABLE {};", quote_qualified(&t.schema, &t.name)),
        DbObject::View(v) => {
            let keyword = if v.materialized {
                "MATERIALIZED VIEW"
            } else {
                "VIEW"
            };
            format!("DROP {keyword} {};", quote_qualified(&v.schema, &v.name))
        }
        DbObject::Sequence(s) => {
            format!("DROP SEQUENCE {};", quote_qualified(&s.schema, &s.name))
        }
        DbObject::Function(f) => format!(
            "DROP FUNCTION {}({});",
            quote_qualified(&f.schema, &f.name),
            f.argtypes
        ),
        DbObject::Aggregate(a) => format!(
            "DROP AGGREGATE {}({});",
            quote_qualified(&a.schema, &a.name),
            a.argtypes
        ),
        DbObject::Operator(o) => format!(
            "DROP OPERATOR {} ({}, {});",
            if o.schema == "public" {
                o.name.clone()
            } else {
                format!("{}.{}", quote_ident(&o.schema), o.name)
            },
            o.leftarg.as_deref().unwrap_or("NONE"),
            o.rightarg.as_deref().unwrap_or("NONE")
        ),
        DbObject::OperatorClass(oc) => format!(
            "DROP OPERATOR CLASS {} USING {};",
            quote_qualified(&oc.schema, &oc.name),
            oc.index_method
        ),
        DbObject::OperatorFamily(of) => format!(
            "DROP OPERATOR FAMILY {} USING {};",
            quote_qualified(&of.schema, &of.name),
            of.index_method
        ),
        DbObject::Type(t) => format!("DROP TYPE {};", quote_qualified(&t.schema, &t.name)),
        DbObject::Domain(d) => format!("DROP DOMAIN {};", quote_qualified(&d.schema, &d.name)),
        DbObject::Trigger(t) => format!(
            "DROP TRIGGER {} ON {};",
            quote_ident(&t.name),
            quote_qualified(&t.target_schema, &t.target_name)
        ),
        DbObject::Rule(r) => format!(
            "DROP RULE {} ON {};",
            quote_ident(&r.name),
            quote_qualified(&r.target_schema, &r.target_name)
        ),
        DbObject::TsParser(p) => format!(
            "DROP TEXT SEARCH PARSER {};",
            quote_qualified(&p.schema, &p.name)
        ),
        DbObject::TsDictionary(d) => format!(
            "DROP TEXT SEARCH DICTIONARY {};",
            quote_qualified(&d.schema, &d.name)
        ),
        DbObject::TsTemplate(t) => format!(
            "DROP TEXT SEARCH TEMPLATE {};",
            quote_qualified(&t.schema, &t.name)
        ),
        DbObject::TsConfig(c) => format!(
            "DROP TEXT SEARCH CONFIGURATION {};",
            quote_qualified(&c.schema, &c.name)
        ),
    }
}

// --- rename --------------------------------------------------------------

fn generate_rename(object: &DbObject, old_name: &str) -> String {
    match object {
        DbObject::Schema(s) => format!(
            "ALTER SCHEMA {} RENAME TO {};",
            quote_ident(old_name),
            quote_ident(&s.name)
        ),
        DbObject::Table(t) => format!(
            "ALTER TABLE {} RENAME TO {};",
            quote_qualified(&t.schema, old_name),
            quote_ident(&t.name)
        ),
        DbObject::View(v) => {
            let keyword = if v.materialized {
                "MATERIALIZED VIEW"
            } else {
                "VIEW"
            };
            format!(
                "ALTER {keyword} {} RENAME TO {};",
                quote_qualified(&v.schema, old_name),
                quote_ident(&v.name)
            )
        }
        DbObject::Sequence(s) => format!(
            "ALTER SEQUENCE {} RENAME TO {};",
            quote_qualified(&s.schema, old_name),
            quote_ident(&s.name)
        ),
        DbObject::Function(f) => format!(
            "ALTER FUNCTION {}({}) RENAME TO {};",
            quote_qualified(&f.schema, old_name),
            f.argtypes,
            quote_ident(&f.name)
        ),
        DbObject::Type(t) => format!(
            "ALTER TYPE {} RENAME TO {};",
            quote_qualified(&t.schema, old_name),
            quote_ident(&t.name)
        ),
        DbObject::Domain(d) => format!(
            "ALTER DOMAIN {} RENAME TO {};",
            quote_qualified(&d.schema, old_name),
            quote_ident(&d.name)
        ),
        other => format!(
            "-- rename of {} {} not supported;",
            other.kind(),
            quote_ident(old_name)
        ),
    }
}

// --- alters --------------------------------------------------------------

fn generate_alter_column(table: &str, column: &str, changes: &ColumnChanges) -> Vec<String> {
    let rendered_table = quote_qualified_key(table);
    let rendered_column = quote_ident(column);
    let mut statements = Vec::new();

    if let Some(data_type) = &changes.data_type {
        let collate = changes
            .collation
            .as_ref()
            .and_then(|c| c.as_ref())
            .map(|c| format!(" COLLATE {}", quote_qualified_key(c)))
            .unwrap_or_default();
        statements.push(format!(
            "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} TYPE {data_type}{collate} USING {rendered_column}::{data_type};"
        ));
    }
    if let Some(not_null) = changes.not_null {
        let action = if not_null { "SET" } else { "DROP" };
        statements.push(format!(
            "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} {action} NOT NULL;"
        ));
    }
    if let Some(default) = &changes.default {
        match default {
            Some(expr) => statements.push(format!(
                "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} SET DEFAULT {expr};"
            )),
            None => statements.push(format!(
                "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} DROP DEFAULT;"
            )),
        }
    }
    if let Some(identity) = &changes.identity {
        match identity {
            Some(id) => statements.push(format!(
                "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} ADD {};",
                id.as_sql()
            )),
            None => statements.push(format!(
                "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} DROP IDENTITY;"
            )),
        }
    }
    if let Some(statistics) = &changes.statistics {
        let value = statistics.unwrap_or(-1);
        statements.push(format!(
            "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} SET STATISTICS {value};"
        ));
    }
    if let Some(Some(storage)) = &changes.storage {
        statements.push(format!(
            "ALTER TABLE {rendered_table} ALTER COLUMN {rendered_column} SET STORAGE {};",
            storage.to_uppercase()
        ));
    }
    statements
}

fn generate_add_primary_key(table: &str, pk: &PrimaryKey) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({});",
        quote_qualified_key(table),
        quote_ident(&pk.name),
        format_column_list(&pk.columns)
    )
}

fn generate_add_unique(table: &str, uc: &UniqueConstraint) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({});",
        quote_qualified_key(table),
        quote_ident(&uc.name),
        format_column_list(&uc.columns)
    )
}

fn generate_add_check(table: &str, cc: &CheckConstraint) -> String {
    let expression = cc.expression.trim();
    let wrapped = if expression.starts_with('(') && expression.ends_with(')') {
        expression.to_string()
    } else {
        format!("({expression})")
    };
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} CHECK {wrapped};",
        quote_qualified_key(table),
        quote_ident(&cc.name)
    )
}

fn generate_add_foreign_key(table: &str, fk: &ForeignKey) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        quote_qualified_key(table),
        quote_ident(&fk.name),
        format_column_list(&fk.columns),
        quote_qualified(&fk.ref_schema, &fk.ref_table),
        format_column_list(&fk.ref_columns)
    );
    if fk.on_update != crate::model::ReferentialAction::NoAction {
        sql.push_str(&format!(" ON UPDATE {}", fk.on_update.as_sql()));
    }
    if fk.on_delete != crate::model::ReferentialAction::NoAction {
        sql.push_str(&format!(" ON DELETE {}", fk.on_delete.as_sql()));
    }
    if fk.deferrable {
        sql.push_str(" DEFERRABLE");
        if fk.initially_deferred {
            sql.push_str(" INITIALLY DEFERRED");
        }
    }
    sql.push(';');
    sql
}

fn generate_create_index(table: &str, index: &Index) -> String {
    if let Some(definition) = &index.definition {
        let trimmed = definition.trim_end_matches(';');
        return format!("{trimmed};");
    }
    let unique = if index.unique { "UNIQUE " } else { "" };
    let method = if index.method == crate::model::IndexMethod::BTree {
        String::new()
    } else {
        format!(" USING {}", index.method.as_sql())
    };
    let mut sql = format!(
        "CREATE {unique}INDEX {} ON {}{method} ({})",
        quote_ident(&index.name),
        quote_qualified_key(table),
        format_column_list(&index.columns)
    );
    if let Some(predicate) = &index.predicate {
        sql.push_str(&format!(" WHERE {predicate}"));
    }
    if let Some(tablespace) = &index.tablespace {
        sql.push_str(&format!(" TABLESPACE {}", quote_ident(tablespace)));
    }
    sql.push(';');
    sql
}

fn generate_alter_table_set(table: &str, changes: &TableChanges) -> Vec<String> {
    let rendered = quote_qualified_key(table);
    let mut statements = Vec::new();
    if let Some(Some(tablespace)) = &changes.tablespace {
        statements.push(format!(
            "ALTER TABLE {rendered} SET TABLESPACE {};",
            quote_ident(tablespace)
        ));
    }
    if !changes.options_set.is_empty() {
        statements.push(format!(
            "ALTER TABLE {rendered} SET ({});",
            changes.options_set.join(", ")
        ));
    }
    if !changes.options_reset.is_empty() {
        statements.push(format!(
            "ALTER TABLE {rendered} RESET ({});",
            changes.options_reset.join(", ")
        ));
    }
    statements
}

fn generate_alter_sequence(name: &str, changes: &SequenceChanges) -> Vec<String> {
    let rendered = quote_qualified_key(name);
    let mut clauses = Vec::new();
    if let Some(data_type) = &changes.data_type {
        clauses.push(format!("AS {data_type}"));
    }
    if let Some(increment) = changes.increment {
        clauses.push(format!("INCREMENT BY {increment}"));
    }
    if let Some(min_value) = &changes.min_value {
        match min_value {
            Some(v) => clauses.push(format!("MINVALUE {v}")),
            None => clauses.push("NO MINVALUE".to_string()),
        }
    }
    if let Some(max_value) = &changes.max_value {
        match max_value {
            Some(v) => clauses.push(format!("MAXVALUE {v}")),
            None => clauses.push("NO MAXVALUE".to_string()),
        }
    }
    if let Some(restart) = changes.restart {
        clauses.push(format!("RESTART WITH {restart}"));
    }
    if let Some(cache) = changes.cache {
        clauses.push(format!("CACHE {cache}"));
    }
    if let Some(cycle) = changes.cycle {
        clauses.push(if cycle { "CYCLE" } else { "NO CYCLE" }.to_string());
    }
    if let Some(owned_by) = &changes.owned_by {
        match owned_by {
            Some(owner) => clauses.push(format!(
                "OWNED BY {}.{}",
                quote_qualified(&owner.table_schema, &owner.table_name),
                quote_ident(&owner.column_name)
            )),
            None => clauses.push("OWNED BY NONE".to_string()),
        }
    }
    if clauses.is_empty() {
        Vec::new()
    } else {
        vec![format!("ALTER SEQUENCE {rendered} {};", clauses.join(" "))]
    }
}

fn generate_alter_domain(name: &str, changes: &DomainChanges) -> Vec<String> {
    let rendered = quote_qualified_key(name);
    let mut statements = Vec::new();
    if let Some(default) = &changes.default {
        match default {
            Some(expr) => statements.push(format!("ALTER DOMAIN {rendered} SET DEFAULT {expr};")),
            None => statements.push(format!("ALTER DOMAIN {rendered} DROP DEFAULT;")),
        }
    }
    if let Some(not_null) = changes.not_null {
        let action = if not_null { "SET" } else { "DROP" };
        statements.push(format!("ALTER DOMAIN {rendered} {action} NOT NULL;"));
    }
    for name in &changes.drop_checks {
        statements.push(format!(
            "ALTER DOMAIN {rendered} DROP CONSTRAINT {};",
            quote_ident(name)
        ));
    }
    for check in &changes.add_checks {
        statements.push(format!(
            "ALTER DOMAIN {rendered} ADD CONSTRAINT {} CHECK ({});",
            quote_ident(&check.name),
            check.expression.trim_start_matches('(').trim_end_matches(')')
        ));
    }
    statements
}

fn generate_add_enum_value(
    type_name: &str,
    value: &str,
    position: &Option<EnumValuePosition>,
) -> String {
    let mut sql = format!(
        "ALTER TYPE {} ADD VALUE '{}'",
        quote_qualified_key(type_name),
        escape_string(value)
    );
    match position {
        Some(EnumValuePosition::Before(v)) => {
            sql.push_str(&format!(" BEFORE '{}'", escape_string(v)));
        }
        Some(EnumValuePosition::After(v)) => {
            sql.push_str(&format!(" AFTER '{}'", escape_string(v)));
        }
        None => {}
    }
    sql.push(';');
    sql
}

fn generate_alter_composite(name: &str, changes: &CompositeChanges) -> Vec<String> {
    let rendered = quote_qualified_key(name);
    let mut statements = Vec::new();
    for attr_name in &changes.drop {
        statements.push(format!(
            "ALTER TYPE {rendered} DROP ATTRIBUTE {};",
            quote_ident(attr_name)
        ));
    }
    for (attr_name, data_type) in &changes.retype {
        statements.push(format!(
            "ALTER TYPE {rendered} ALTER ATTRIBUTE {} SET DATA TYPE {data_type};",
            quote_ident(attr_name)
        ));
    }
    for attr in &changes.add {
        statements.push(format!(
            "ALTER TYPE {rendered} ADD ATTRIBUTE {} {};",
            quote_ident(&attr.name),
            attr.data_type
        ));
    }
    statements
}

// --- targets, grants, comments ------------------------------------------

/// Kind word and identifier for COMMENT ON / ALTER ... OWNER TO.
fn target_sql(target: &SqlTarget) -> (String, String) {
    match target {
        SqlTarget::Schema { name } => ("SCHEMA".to_string(), quote_ident(name)),
        SqlTarget::Object { kind, schema, name } => {
            let word = match kind {
                ObjectKind::Table => "TABLE",
                ObjectKind::View => "VIEW",
                ObjectKind::MaterializedView => "MATERIALIZED VIEW",
                ObjectKind::Sequence => "SEQUENCE",
                ObjectKind::Type => "TYPE",
                ObjectKind::Domain => "DOMAIN",
                ObjectKind::Collation => "COLLATION",
                ObjectKind::Conversion => "CONVERSION",
                ObjectKind::ForeignTable => "FOREIGN TABLE",
                ObjectKind::TsParser => "TEXT SEARCH PARSER",
                ObjectKind::TsDictionary => "TEXT SEARCH DICTIONARY",
                ObjectKind::TsTemplate => "TEXT SEARCH TEMPLATE",
                ObjectKind::TsConfig => "TEXT SEARCH CONFIGURATION",
                other => {
                    debug_assert!(false, "unexpected schema-qualified target {other}");
                    "TABLE"
                }
            };
            (word.to_string(), quote_qualified(schema, name))
        }
        SqlTarget::Column {
            schema,
            table,
            column,
        } => (
            "COLUMN".to_string(),
            format!("{}.{}", quote_qualified(schema, table), quote_ident(column)),
        ),
        SqlTarget::Routine {
            kind,
            schema,
            name,
            args,
        } => {
            let word = match kind {
                ObjectKind::Aggregate => "AGGREGATE",
                ObjectKind::Operator => "OPERATOR",
                _ => "FUNCTION",
            };
            let ident = if *kind == ObjectKind::Operator {
                format!(
                    "{} ({args})",
                    if schema == "public" {
                        name.clone()
                    } else {
                        format!("{}.{name}", quote_ident(schema))
                    }
                )
            } else {
                format!("{}({args})", quote_qualified(schema, name))
            };
            (word.to_string(), ident)
        }
        SqlTarget::Constraint {
            schema,
            table,
            name,
        } => (
            "CONSTRAINT".to_string(),
            format!("{} ON {}", quote_ident(name), quote_qualified(schema, table)),
        ),
        SqlTarget::OnRelation {
            kind,
            schema,
            table,
            name,
        } => {
            let word = if *kind == ObjectKind::Rule {
                "RULE"
            } else {
                "TRIGGER"
            };
            (
                word.to_string(),
                format!("{} ON {}", quote_ident(name), quote_qualified(schema, table)),
            )
        }
        SqlTarget::Global { kind, name } => {
            let word = match kind {
                ObjectKind::Language => "LANGUAGE",
                ObjectKind::Extension => "EXTENSION",
                ObjectKind::EventTrigger => "EVENT TRIGGER",
                ObjectKind::ForeignDataWrapper => "FOREIGN DATA WRAPPER",
                ObjectKind::ForeignServer => "SERVER",
                other => {
                    debug_assert!(false, "unexpected global target {other}");
                    "EXTENSION"
                }
            };
            (word.to_string(), quote_ident(name))
        }
        SqlTarget::Cast { source, target } => {
            ("CAST".to_string(), format!("({source} AS {target})"))
        }
    }
}

/// Kind word and identifier used in GRANT / REVOKE `ON` clauses. Views
/// take the TABLE form; a column grant attaches the column list to each
/// privilege.
fn grant_target_sql(target: &SqlTarget) -> (String, String, Option<String>) {
    match target {
        SqlTarget::Column {
            schema,
            table,
            column,
        } => (
            "TABLE".to_string(),
            quote_qualified(schema, table),
            Some(quote_ident(column)),
        ),
        SqlTarget::Object { kind, schema, name } => {
            let word = match kind {
                ObjectKind::Sequence => "SEQUENCE",
                ObjectKind::Type => "TYPE",
                ObjectKind::Domain => "DOMAIN",
                ObjectKind::ForeignTable => "FOREIGN TABLE",
                _ => "TABLE",
            };
            (word.to_string(), quote_qualified(schema, name), None)
        }
        SqlTarget::Routine { schema, name, args, .. } => (
            "FUNCTION".to_string(),
            format!("{}({args})", quote_qualified(schema, name)),
            None,
        ),
        SqlTarget::Schema { name } => ("SCHEMA".to_string(), quote_ident(name), None),
        SqlTarget::Global { kind, name } => {
            let word = match kind {
                ObjectKind::Language => "LANGUAGE",
                ObjectKind::ForeignDataWrapper => "FOREIGN DATA WRAPPER",
                ObjectKind::ForeignServer => "FOREIGN SERVER",
                _ => "TABLE",
            };
            (word.to_string(), quote_ident(name), None)
        }
        other => {
            let (word, ident) = target_sql(other);
            (word, ident, None)
        }
    }
}

fn format_grantee(grantee: &str) -> String {
    if grantee.eq_ignore_ascii_case("public") {
        "PUBLIC".to_string()
    } else {
        quote_ident(grantee)
    }
}

fn format_privileges(privileges: &[String], column: &Option<String>) -> String {
    privileges
        .iter()
        .map(|p| {
            let word = p.to_uppercase();
            match column {
                Some(col) => format!("{word} ({col})"),
                None => word,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_grant(
    target: &SqlTarget,
    grantee: &str,
    privileges: &[String],
    grantable: bool,
) -> String {
    let (kind_word, ident, column) = grant_target_sql(target);
    let option = if grantable { " WITH GRANT OPTION" } else { "" };
    format!(
        "GRANT {} ON {kind_word} {ident} TO {}{option};",
        format_privileges(privileges, &column),
        format_grantee(grantee)
    )
}

fn generate_revoke(target: &SqlTarget, grantee: &str, privileges: &[String]) -> String {
    let (kind_word, ident, column) = grant_target_sql(target);
    format!(
        "REVOKE {} ON {kind_word} {ident} FROM {};",
        format_privileges(privileges, &column),
        format_grantee(grantee)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, IndexMethod, ReferentialAction};

    #[test]
    fn quote_ident_only_when_needed() {
        assert_eq!(quote_ident("films"), "films");
        assert_eq!(quote_ident("Films"), "\"Films\"");
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("with space"), "\"with space\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn public_objects_stay_unqualified() {
        assert_eq!(quote_qualified("public", "t1"), "t1");
        assert_eq!(quote_qualified("s1", "t2"), "s1.t2");
    }

    #[test]
    fn create_table_lists_columns_only() {
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
        assert_eq!(
            generate_create_table(&table),
            "CREATE TABLE t1 (c1 integer NOT NULL, c2 smallint);"
        );
    }

    #[test]
    fn add_primary_key_names_constraint() {
        let pk = PrimaryKey {
            name: "t1_pkey".into(),
            columns: vec!["c1".into()],
            description: None,
        };
        assert_eq!(
            generate_add_primary_key("public.t1", &pk),
            "ALTER TABLE t1 ADD CONSTRAINT t1_pkey PRIMARY KEY (c1);"
        );
    }

    #[test]
    fn foreign_key_renders_actions() {
        let fk = ForeignKey {
            name: "t1_c2_fkey".into(),
            columns: vec!["c2".into()],
            ref_schema: "s1".into(),
            ref_table: "t2".into(),
            ref_columns: vec!["c21".into()],
            on_update: ReferentialAction::SetNull,
            on_delete: ReferentialAction::Restrict,
            deferrable: false,
            initially_deferred: false,
            description: None,
        };
        assert_eq!(
            generate_add_foreign_key("public.t1", &fk),
            "ALTER TABLE t1 ADD CONSTRAINT t1_c2_fkey FOREIGN KEY (c2) REFERENCES s1.t2 (c21) ON UPDATE SET NULL ON DELETE RESTRICT;"
        );
    }

    #[test]
    fn alter_column_type_uses_using_cast() {
        let changes = ColumnChanges {
            data_type: Some("text".into()),
            ..Default::default()
        };
        assert_eq!(
            generate_alter_column("public.t", "c", &changes),
            vec!["ALTER TABLE t ALTER COLUMN c TYPE text USING c::text;"]
        );
    }

    #[test]
    fn alter_column_not_null_and_default() {
        let changes = ColumnChanges {
            not_null: Some(false),
            default: Some(Some("0".into())),
            ..Default::default()
        };
        assert_eq!(
            generate_alter_column("public.t", "c", &changes),
            vec![
                "ALTER TABLE t ALTER COLUMN c DROP NOT NULL;",
                "ALTER TABLE t ALTER COLUMN c SET DEFAULT 0;"
            ]
        );
    }

    #[test]
    fn identity_column_renders_generated_clause() {
        let column = Column {
            name: "id".into(),
            data_type: "integer".into(),
            not_null: true,
            identity: Some(Identity::Always),
            ..Default::default()
        };
        assert_eq!(
            format_column(&column),
            "id integer NOT NULL GENERATED ALWAYS AS IDENTITY"
        );
    }

    #[test]
    fn index_definition_text_wins() {
        let index = Index {
            name: "ix_expr".into(),
            definition: Some(
                "CREATE INDEX ix_expr ON t USING btree (lower(name), id)".into(),
            ),
            ..Default::default()
        };
        assert_eq!(
            generate_create_index("public.t", &index),
            "CREATE INDEX ix_expr ON t USING btree (lower(name), id);"
        );
    }

    #[test]
    fn plain_index_renders_from_structure() {
        let index = Index {
            name: "ix".into(),
            columns: vec!["c".into()],
            unique: false,
            method: IndexMethod::BTree,
            ..Default::default()
        };
        assert_eq!(
            generate_create_index("public.t", &index),
            "CREATE INDEX ix ON t (c);"
        );
    }

    #[test]
    fn grant_single_privilege() {
        let target = SqlTarget::Object {
            kind: ObjectKind::Table,
            schema: "public".into(),
            name: "t1".into(),
        };
        assert_eq!(
            generate_grant(&target, "alice", &["select".into()], false),
            "GRANT SELECT ON TABLE t1 TO alice;"
        );
        assert_eq!(
            generate_grant(&target, "PUBLIC", &["all".into()], false),
            "GRANT ALL ON TABLE t1 TO PUBLIC;"
        );
    }

    #[test]
    fn comment_and_clear_comment() {
        let target = SqlTarget::Object {
            kind: ObjectKind::Table,
            schema: "public".into(),
            name: "t1".into(),
        };
        let set = generate_op_sql(&ChangeOp::Comment {
            target: target.clone(),
            text: Some("it's a table".into()),
        });
        assert_eq!(set, vec!["COMMENT ON TABLE t1 IS 'it''s a table';"]);
        let clear = generate_op_sql(&ChangeOp::Comment { target, text: None });
        assert_eq!(clear, vec!["COMMENT ON TABLE t1 IS NULL;"]);
    }

    #[test]
    fn comment_on_trigger_uses_on_form() {
        let op = ChangeOp::Comment {
            target: SqlTarget::OnRelation {
                kind: ObjectKind::Trigger,
                schema: "public".into(),
                table: "films".into(),
                name: "audit".into(),
            },
            text: Some("watches".into()),
        };
        assert_eq!(
            generate_op_sql(&op),
            vec!["COMMENT ON TRIGGER audit ON films IS 'watches';"]
        );
    }

    #[test]
    fn rename_table_statement() {
        let table = Table {
            schema: "public".into(),
            name: "t2".into(),
            ..Default::default()
        };
        assert_eq!(
            generate_rename(&DbObject::Table(table), "t1"),
            "ALTER TABLE t1 RENAME TO t2;"
        );
    }

    #[test]
    fn create_materialized_view_without_data() {
        let view = View {
            schema: "public".into(),
            name: "mv".into(),
            definition: "SELECT 1".into(),
            materialized: true,
            with_data: false,
            ..Default::default()
        };
        assert_eq!(
            generate_create_view(&view, false),
            "CREATE MATERIALIZED VIEW mv AS SELECT 1 WITH NO DATA;"
        );
    }

    #[test]
    fn alter_sequence_owned_by() {
        let changes = SequenceChanges {
            owned_by: Some(Some(crate::model::SequenceOwner {
                table_schema: "public".into(),
                table_name: "t1".into(),
                column_name: "c1".into(),
            })),
            ..Default::default()
        };
        assert_eq!(
            generate_alter_sequence("public.t1_c1_seq", &changes),
            vec!["ALTER SEQUENCE t1_c1_seq OWNED BY t1.c1;"]
        );
    }
}
