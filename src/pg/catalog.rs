//! Catalog reader.
//!
//! One parameterized query per object kind, executed serially on the
//! session pool, materialized into model records. Queries pick
//! version-appropriate variants from the server's `server_version_num`
//! (9.4 through 15 are supported). System schemas and extension-owned
//! objects are excluded; the extension records themselves are kept.

use crate::model::*;
use crate::pg::connection::PgConnection;
use crate::util::{Result, SchemaError};
use sqlx::postgres::types::Oid;
use sqlx::Row;
use std::collections::BTreeMap;
use tracing::warn;

/// `WHERE` fragment excluding system schemas.
const USER_SCHEMAS: &str = "n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast') \
     AND n.nspname NOT LIKE 'pg_temp_%' AND n.nspname NOT LIKE 'pg_toast_temp_%'";

/// `WHERE` fragment excluding objects that belong to an extension.
fn not_extension_member(oid_expr: &str) -> String {
    format!(
        "NOT EXISTS (SELECT 1 FROM pg_depend ed WHERE ed.objid = {oid_expr} \
         AND ed.deptype = 'e')"
    )
}

/// ACL expression usable in SELECT lists: text array of aclitem strings.
fn acl_expr(column: &str) -> String {
    format!("ARRAY(SELECT unnest(COALESCE({column}, '{{}}'::aclitem[]))::text)")
}

fn db_err(context: &str) -> impl FnOnce(sqlx::Error) -> SchemaError + '_ {
    move |e| SchemaError::Connection(format!("reading {context}: {e}"))
}

/// Reads the complete user-visible model from the session's database.
pub async fn read_database(conn: &PgConnection) -> Result<Database> {
    let mut db = Database::new();

    db.schemas = read_schemas(conn).await?;
    db.extensions = read_extensions(conn).await?;
    db.languages = read_languages(conn).await?;
    db.collations = read_collations(conn).await?;
    db.types = read_types(conn).await?;
    db.domains = read_domains(conn).await?;
    db.sequences = read_sequences(conn).await?;
    db.tables = read_tables(conn).await?;
    db.fdws = read_fdws(conn).await?;
    db.servers = read_servers(conn).await?;
    db.user_mappings = read_user_mappings(conn).await?;
    db.foreign_tables = read_foreign_tables(conn).await?;
    read_columns(conn, &mut db).await?;
    read_constraints(conn, &mut db).await?;
    read_indexes(conn, &mut db).await?;
    db.views = read_views(conn).await?;
    db.functions = read_functions(conn).await?;
    db.aggregates = read_aggregates(conn).await?;
    db.operators = read_operators(conn).await?;
    db.operator_families = read_operator_families(conn).await?;
    db.operator_classes = read_operator_classes(conn).await?;
    db.triggers = read_triggers(conn).await?;
    db.rules = read_rules(conn).await?;
    db.casts = read_casts(conn).await?;
    db.conversions = read_conversions(conn).await?;
    db.event_triggers = read_event_triggers(conn).await?;
    db.ts_parsers = read_ts_parsers(conn).await?;
    db.ts_dictionaries = read_ts_dictionaries(conn).await?;
    db.ts_templates = read_ts_templates(conn).await?;
    db.ts_configs = read_ts_configs(conn).await?;
    read_descriptions(conn, &mut db).await?;

    Ok(db)
}

/// Decodes `grantee=privs/grantor` aclitem strings. `all_letters` is the
/// full privilege letter set for the object kind; a grantee holding all
/// of them collapses to `all`.
pub fn decode_acl(items: &[String], all_letters: &str) -> Vec<Grant> {
    let letter_word = |c: char| match c {
        'r' => Some("select"),
        'w' => Some("update"),
        'a' => Some("insert"),
        'd' => Some("delete"),
        'D' => Some("truncate"),
        'x' => Some("references"),
        't' => Some("trigger"),
        'X' => Some("execute"),
        'U' => Some("usage"),
        'C' => Some("create"),
        'c' => Some("connect"),
        'T' => Some("temporary"),
        _ => None,
    };

    let mut grants = Vec::new();
    for item in items {
        let Some((grantee_part, rest)) = item.split_once('=') else {
            continue;
        };
        let privs_part = rest.split('/').next().unwrap_or(rest);
        let grantee = if grantee_part.is_empty() {
            "PUBLIC".to_string()
        } else {
            grantee_part.trim_matches('"').to_string()
        };

        let mut letters = String::new();
        let mut privileges = Vec::new();
        let mut chars = privs_part.chars().peekable();
        while let Some(c) = chars.next() {
            let grantable = chars.peek() == Some(&'*');
            if grantable {
                chars.next();
            }
            if let Some(word) = letter_word(c) {
                letters.push(c);
                privileges.push(if grantable {
                    format!("{word}*")
                } else {
                    word.to_string()
                });
            }
        }
        let plain = !privileges.iter().any(|p| p.ends_with('*'));
        if plain && !all_letters.is_empty() && letters.len() == all_letters.len() {
            let full = all_letters.chars().all(|c| letters.contains(c));
            if full {
                privileges = vec!["all".to_string()];
            }
        }
        if !privileges.is_empty() {
            grants.push(Grant {
                grantee,
                privileges,
            });
        }
    }
    grants
}

async fn read_schemas(conn: &PgConnection) -> Result<BTreeMap<String, Schema>> {
    let sql = format!(
        "SELECT n.nspname AS name, r.rolname AS owner, {} AS privileges
         FROM pg_namespace n JOIN pg_roles r ON n.nspowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname",
        acl_expr("n.nspacl"),
        not_extension_member("n.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("schemas"))?;

    let mut schemas = BTreeMap::new();
    for row in rows {
        let name: String = row.get("name");
        let acl: Vec<String> = row.get("privileges");
        schemas.insert(
            name.clone(),
            Schema {
                name,
                owner: Some(row.get("owner")),
                privileges: decode_acl(&acl, "UC"),
                ..Default::default()
            },
        );
    }
    Ok(schemas)
}

async fn read_extensions(conn: &PgConnection) -> Result<BTreeMap<String, Extension>> {
    let rows = sqlx::query(
        "SELECT e.extname AS name, e.extversion AS version, n.nspname AS schema, e.oid
         FROM pg_extension e JOIN pg_namespace n ON e.extnamespace = n.oid
         WHERE e.extname != 'plpgsql'
         ORDER BY e.extname",
    )
    .fetch_all(conn.pool())
    .await
    .map_err(db_err("extensions"))?;

    let mut extensions = BTreeMap::new();
    for row in rows {
        let name: String = row.get("name");
        let schema: String = row.get("schema");
        extensions.insert(
            name.clone(),
            Extension {
                name,
                schema: (schema != "public").then_some(schema),
                version: row.get("version"),
                description: None,
                oid: Some(row.get::<Oid, _>("oid").0),
            },
        );
    }
    Ok(extensions)
}

async fn read_languages(conn: &PgConnection) -> Result<BTreeMap<String, Language>> {
    let sql = format!(
        "SELECT l.lanname AS name, l.lanpltrusted AS trusted, r.rolname AS owner,
                {} AS privileges, l.oid
         FROM pg_language l JOIN pg_roles r ON l.lanowner = r.oid
         WHERE l.lanispl AND l.lanname != 'plpgsql' AND {}
         ORDER BY l.lanname",
        acl_expr("l.lanacl"),
        not_extension_member("l.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("languages"))?;

    let mut languages = BTreeMap::new();
    for row in rows {
        let name: String = row.get("name");
        let acl: Vec<String> = row.get("privileges");
        languages.insert(
            name.clone(),
            Language {
                name,
                trusted: row.get("trusted"),
                owner: Some(row.get("owner")),
                privileges: decode_acl(&acl, "U"),
                description: None,
                oid: Some(row.get::<Oid, _>("oid").0),
            },
        );
    }
    Ok(languages)
}

async fn read_collations(conn: &PgConnection) -> Result<BTreeMap<String, Collation>> {
    let provider = if conn.version_num() >= 100000 {
        "CASE c.collprovider WHEN 'i' THEN 'icu' WHEN 'c' THEN 'libc' ELSE NULL END"
    } else {
        "NULL::text"
    };
    let deterministic = if conn.version_num() >= 120000 {
        "c.collisdeterministic"
    } else {
        "true"
    };
    let sql = format!(
        "SELECT n.nspname AS schema, c.collname AS name, c.collcollate AS lc_collate,
                c.collctype AS lc_ctype, {provider} AS provider,
                {deterministic} AS deterministic, r.rolname AS owner, c.oid
         FROM pg_collation c
         JOIN pg_namespace n ON c.collnamespace = n.oid
         JOIN pg_roles r ON c.collowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, c.collname",
        not_extension_member("c.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("collations"))?;

    let mut collations = BTreeMap::new();
    for row in rows {
        let schema: String = row.get("schema");
        let name: String = row.get("name");
        let coll = Collation {
            schema: schema.clone(),
            name: name.clone(),
            lc_collate: row.get("lc_collate"),
            lc_ctype: row.get("lc_ctype"),
            provider: row.get("provider"),
            deterministic: row.get("deterministic"),
            owner: Some(row.get("owner")),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        collations.insert(coll.qualified(), coll);
    }
    Ok(collations)
}

async fn read_types(conn: &PgConnection) -> Result<BTreeMap<String, TypeDef>> {
    let mut types = BTreeMap::new();

    // Enums.
    let sql = format!(
        "SELECT n.nspname AS schema, t.typname AS name, r.rolname AS owner, t.oid,
                array_agg(e.enumlabel ORDER BY e.enumsortorder) AS labels,
                {} AS privileges
         FROM pg_type t
         JOIN pg_enum e ON t.oid = e.enumtypid
         JOIN pg_namespace n ON t.typnamespace = n.oid
         JOIN pg_roles r ON t.typowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         GROUP BY n.nspname, t.typname, r.rolname, t.oid, t.typacl
         ORDER BY n.nspname, t.typname",
        acl_expr("t.typacl"),
        not_extension_member("t.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("enum types"))?;
    for row in rows {
        let acl: Vec<String> = row.get("privileges");
        let t = TypeDef {
            schema: row.get("schema"),
            name: row.get("name"),
            body: TypeBody::Enum {
                values: row.get("labels"),
            },
            owner: Some(row.get("owner")),
            description: None,
            privileges: decode_acl(&acl, "U"),
            oldname: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        types.insert(t.qualified(), t);
    }

    // Composites (free-standing, relkind 'c').
    let sql = format!(
        "SELECT n.nspname AS schema, t.typname AS name, r.rolname AS owner, t.oid,
                array_agg(a.attname ORDER BY a.attnum) AS attnames,
                array_agg(format_type(a.atttypid, a.atttypmod) ORDER BY a.attnum) AS atttypes
         FROM pg_type t
         JOIN pg_class c ON t.typrelid = c.oid AND c.relkind = 'c'
         JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum > 0 AND NOT a.attisdropped
         JOIN pg_namespace n ON t.typnamespace = n.oid
         JOIN pg_roles r ON t.typowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         GROUP BY n.nspname, t.typname, r.rolname, t.oid
         ORDER BY n.nspname, t.typname",
        not_extension_member("t.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("composite types"))?;
    for row in rows {
        let names: Vec<String> = row.get("attnames");
        let typenames: Vec<String> = row.get("atttypes");
        let attributes = names
            .into_iter()
            .zip(typenames)
            .map(|(name, data_type)| CompositeAttribute {
                name,
                data_type,
                collation: None,
            })
            .collect();
        let t = TypeDef {
            schema: row.get("schema"),
            name: row.get("name"),
            body: TypeBody::Composite { attributes },
            owner: Some(row.get("owner")),
            description: None,
            privileges: Vec::new(),
            oldname: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        types.insert(t.qualified(), t);
    }

    // Ranges.
    let sql = format!(
        "SELECT n.nspname AS schema, t.typname AS name, r.rolname AS owner, t.oid,
                format_type(rg.rngsubtype, NULL) AS subtype,
                CASE WHEN rg.rngcanonical != 0 THEN rg.rngcanonical::regproc::text END AS canonical,
                CASE WHEN rg.rngsubdiff != 0 THEN rg.rngsubdiff::regproc::text END AS subtype_diff
         FROM pg_range rg
         JOIN pg_type t ON rg.rngtypid = t.oid
         JOIN pg_namespace n ON t.typnamespace = n.oid
         JOIN pg_roles r ON t.typowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, t.typname",
        not_extension_member("t.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("range types"))?;
    for row in rows {
        let t = TypeDef {
            schema: row.get("schema"),
            name: row.get("name"),
            body: TypeBody::Range {
                subtype: row.get("subtype"),
                subtype_opclass: None,
                collation: None,
                canonical: row.get("canonical"),
                subtype_diff: row.get("subtype_diff"),
            },
            owner: Some(row.get("owner")),
            description: None,
            privileges: Vec::new(),
            oldname: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        types.insert(t.qualified(), t);
    }

    // Base types (user-defined scalar types).
    let sql = format!(
        "SELECT n.nspname AS schema, t.typname AS name, r.rolname AS owner, t.oid,
                t.typinput::regproc::text AS input, t.typoutput::regproc::text AS output,
                CASE WHEN t.typreceive != 0 THEN t.typreceive::regproc::text END AS receive,
                CASE WHEN t.typsend != 0 THEN t.typsend::regproc::text END AS send,
                t.typlen AS internallength,
                CASE t.typalign WHEN 'c' THEN 'char' WHEN 's' THEN 'int2'
                     WHEN 'i' THEN 'int4' WHEN 'd' THEN 'double' END AS alignment,
                CASE t.typstorage WHEN 'p' THEN 'plain' WHEN 'e' THEN 'external'
                     WHEN 'm' THEN 'main' WHEN 'x' THEN 'extended' END AS storage,
                t.typcategory::text AS category, t.typispreferred AS preferred,
                t.typdelim::text AS delimiter
         FROM pg_type t
         JOIN pg_namespace n ON t.typnamespace = n.oid
         JOIN pg_roles r ON t.typowner = r.oid
         WHERE t.typtype = 'b' AND t.typelem = 0 AND t.typinput != 0
           AND NOT EXISTS (SELECT 1 FROM pg_class pc WHERE pc.oid = t.typrelid)
           AND {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, t.typname",
        not_extension_member("t.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("base types"))?;
    for row in rows {
        let internallength: i16 = row.get("internallength");
        let t = TypeDef {
            schema: row.get("schema"),
            name: row.get("name"),
            body: TypeBody::Base {
                input: row.get("input"),
                output: row.get("output"),
                receive: row.get("receive"),
                send: row.get("send"),
                internallength: Some(if internallength < 0 {
                    "variable".to_string()
                } else {
                    internallength.to_string()
                }),
                alignment: row.get("alignment"),
                storage: row.get("storage"),
                category: row.get("category"),
                preferred: row.get("preferred"),
                delimiter: row.get("delimiter"),
                element: None,
            },
            owner: Some(row.get("owner")),
            description: None,
            privileges: Vec::new(),
            oldname: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        types.insert(t.qualified(), t);
    }

    Ok(types)
}

async fn read_domains(conn: &PgConnection) -> Result<BTreeMap<String, Domain>> {
    let sql = format!(
        "SELECT n.nspname AS schema, t.typname AS name,
                format_type(t.typbasetype, t.typtypmod) AS base_type,
                t.typnotnull AS not_null,
                pg_get_expr(t.typdefaultbin, 0) AS default_expr,
                r.rolname AS owner, t.oid
         FROM pg_type t
         JOIN pg_namespace n ON t.typnamespace = n.oid
         JOIN pg_roles r ON t.typowner = r.oid
         WHERE t.typtype = 'd' AND {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, t.typname",
        not_extension_member("t.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("domains"))?;

    let mut domains = BTreeMap::new();
    for row in rows {
        let d = Domain {
            schema: row.get("schema"),
            name: row.get("name"),
            base_type: row.get("base_type"),
            not_null: row.get("not_null"),
            default: row.get("default_expr"),
            owner: Some(row.get("owner")),
            oid: Some(row.get::<Oid, _>("oid").0),
            ..Default::default()
        };
        domains.insert(d.qualified(), d);
    }

    // Domain check constraints.
    let rows = sqlx::query(
        "SELECT n.nspname AS schema, t.typname AS domain_name, c.conname AS name,
                pg_get_constraintdef(c.oid) AS definition
         FROM pg_constraint c
         JOIN pg_type t ON c.contypid = t.oid
         JOIN pg_namespace n ON t.typnamespace = n.oid
         WHERE c.contype = 'c'
         ORDER BY n.nspname, t.typname, c.conname",
    )
    .fetch_all(conn.pool())
    .await
    .map_err(db_err("domain constraints"))?;
    for row in rows {
        let schema: String = row.get("schema");
        let domain_name: String = row.get("domain_name");
        let key = qualified_name(&schema, &domain_name);
        let Some(domain) = domains.get_mut(&key) else {
            continue;
        };
        let definition: Option<String> = row.get("definition");
        let Some(definition) = definition else {
            warn!(domain = %key, "catalog returned NULL constraint definition; skipped");
            continue;
        };
        let expression = definition
            .strip_prefix("CHECK ")
            .unwrap_or(&definition)
            .to_string();
        domain.check_constraints.push(CheckConstraint {
            name: row.get("name"),
            expression,
            ..Default::default()
        });
    }

    Ok(domains)
}

async fn read_sequences(conn: &PgConnection) -> Result<BTreeMap<String, Sequence>> {
    let mut sequences = BTreeMap::new();
    if conn.version_num() >= 100000 {
        let sql = format!(
            "SELECT n.nspname AS schema, c.relname AS name, r.rolname AS owner, c.oid,
                    format_type(s.seqtypid, NULL) AS data_type,
                    s.seqstart, s.seqincrement, s.seqmin, s.seqmax, s.seqcache, s.seqcycle,
                    {} AS privileges,
                    ot.relname AS owner_table, onsp.nspname AS owner_schema, oa.attname AS owner_column
             FROM pg_sequence s
             JOIN pg_class c ON s.seqrelid = c.oid
             JOIN pg_namespace n ON c.relnamespace = n.oid
             JOIN pg_roles r ON c.relowner = r.oid
             LEFT JOIN pg_depend dep ON dep.objid = c.oid AND dep.deptype = 'a'
                  AND dep.classid = 'pg_class'::regclass
             LEFT JOIN pg_class ot ON dep.refobjid = ot.oid
             LEFT JOIN pg_namespace onsp ON ot.relnamespace = onsp.oid
             LEFT JOIN pg_attribute oa ON oa.attrelid = ot.oid AND oa.attnum = dep.refobjsubid
             WHERE {USER_SCHEMAS} AND {}
               AND NOT EXISTS (SELECT 1 FROM pg_depend idep
                               WHERE idep.objid = c.oid AND idep.deptype = 'i')
             ORDER BY n.nspname, c.relname",
            acl_expr("c.relacl"),
            not_extension_member("c.oid")
        );
        let rows = sqlx::query(&sql)
            .fetch_all(conn.pool())
            .await
            .map_err(db_err("sequences"))?;
        for row in rows {
            let acl: Vec<String> = row.get("privileges");
            let owner_table: Option<String> = row.get("owner_table");
            let data_type: String = row.get("data_type");
            let seq = Sequence {
                schema: row.get("schema"),
                name: row.get("name"),
                data_type: (data_type != "bigint").then_some(data_type),
                start: Some(row.get("seqstart")),
                increment: Some(row.get("seqincrement")),
                min_value: Some(row.get("seqmin")),
                max_value: Some(row.get("seqmax")),
                cache: Some(row.get("seqcache")),
                cycle: row.get("seqcycle"),
                owned_by: owner_table.map(|table_name| SequenceOwner {
                    table_schema: row.get("owner_schema"),
                    table_name,
                    column_name: row.get("owner_column"),
                }),
                owner: Some(row.get("owner")),
                privileges: decode_acl(&acl, "rwU"),
                oid: Some(row.get::<Oid, _>("oid").0),
                ..Default::default()
            };
            sequences.insert(seq.qualified(), seq);
        }
    } else {
        // Pre-10 keeps sequence parameters in the sequence relation
        // itself, one SELECT per sequence.
        let sql = format!(
            "SELECT n.nspname AS schema, c.relname AS name, r.rolname AS owner, c.oid,
                    {} AS privileges,
                    ot.relname AS owner_table, onsp.nspname AS owner_schema, oa.attname AS owner_column
             FROM pg_class c
             JOIN pg_namespace n ON c.relnamespace = n.oid
             JOIN pg_roles r ON c.relowner = r.oid
             LEFT JOIN pg_depend dep ON dep.objid = c.oid AND dep.deptype = 'a'
                  AND dep.classid = 'pg_class'::regclass
             LEFT JOIN pg_class ot ON dep.refobjid = ot.oid
             LEFT JOIN pg_namespace onsp ON ot.relnamespace = onsp.oid
             LEFT JOIN pg_attribute oa ON oa.attrelid = ot.oid AND oa.attnum = dep.refobjsubid
             WHERE c.relkind = 'S' AND {USER_SCHEMAS} AND {}
             ORDER BY n.nspname, c.relname",
            acl_expr("c.relacl"),
            not_extension_member("c.oid")
        );
        let rows = sqlx::query(&sql)
            .fetch_all(conn.pool())
            .await
            .map_err(db_err("sequences"))?;
        for row in rows {
            let schema: String = row.get("schema");
            let name: String = row.get("name");
            let acl: Vec<String> = row.get("privileges");
            let owner_table: Option<String> = row.get("owner_table");
            let params_sql = format!(
                "SELECT start_value, increment_by, min_value, max_value, cache_value, is_cycled
                 FROM {}",
                crate::pg::sqlgen::quote_qualified(&schema, &name)
            );
            let params = sqlx::query(&params_sql)
                .fetch_one(conn.pool())
                .await
                .map_err(db_err("sequence parameters"))?;
            let seq = Sequence {
                schema: schema.clone(),
                name: name.clone(),
                data_type: None,
                start: Some(params.get("start_value")),
                increment: Some(params.get("increment_by")),
                min_value: Some(params.get("min_value")),
                max_value: Some(params.get("max_value")),
                cache: Some(params.get("cache_value")),
                cycle: params.get("is_cycled"),
                owned_by: owner_table.map(|table_name| SequenceOwner {
                    table_schema: row.get("owner_schema"),
                    table_name,
                    column_name: row.get("owner_column"),
                }),
                owner: Some(row.get("owner")),
                privileges: decode_acl(&acl, "rwU"),
                oid: Some(row.get::<Oid, _>("oid").0),
                ..Default::default()
            };
            sequences.insert(seq.qualified(), seq);
        }
    }
    Ok(sequences)
}

async fn read_tables(conn: &PgConnection) -> Result<BTreeMap<String, Table>> {
    let (relkinds, partition_cols) = if conn.version_num() >= 100000 {
        (
            "('r', 'p')",
            "pg_get_partkeydef(c.oid) AS partition_by,
             CASE WHEN c.relispartition THEN pg_get_expr(c.relpartbound, c.oid) END AS partition_bound,
             CASE WHEN c.relispartition THEN
                  (SELECT pn.nspname || '.' || pc.relname
                   FROM pg_inherits i
                   JOIN pg_class pc ON i.inhparent = pc.oid
                   JOIN pg_namespace pn ON pc.relnamespace = pn.oid
                   WHERE i.inhrelid = c.oid LIMIT 1) END AS partition_of",
        )
    } else {
        (
            "('r')",
            "NULL::text AS partition_by, NULL::text AS partition_bound, NULL::text AS partition_of",
        )
    };
    let sql = format!(
        "SELECT n.nspname AS schema, c.relname AS name, r.rolname AS owner, c.oid,
                c.relpersistence = 'u' AS unlogged,
                ts.spcname AS tablespace,
                c.reloptions::text[] AS options,
                {} AS privileges,
                {partition_cols},
                ARRAY(SELECT pn.nspname || '.' || pc.relname
                      FROM pg_inherits i
                      JOIN pg_class pc ON i.inhparent = pc.oid
                      JOIN pg_namespace pn ON pc.relnamespace = pn.oid
                      WHERE i.inhrelid = c.oid
                      ORDER BY i.inhseqno) AS inherits
         FROM pg_class c
         JOIN pg_namespace n ON c.relnamespace = n.oid
         JOIN pg_roles r ON c.relowner = r.oid
         LEFT JOIN pg_tablespace ts ON c.reltablespace = ts.oid
         WHERE c.relkind IN {relkinds} AND {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, c.relname",
        acl_expr("c.relacl"),
        not_extension_member("c.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("tables"))?;

    let mut tables = BTreeMap::new();
    for row in rows {
        let acl: Vec<String> = row.get("privileges");
        let inherits: Vec<String> = row.get("inherits");
        let partition_of: Option<String> = row.get("partition_of");
        let options: Option<Vec<String>> = row.get("options");
        let table = Table {
            schema: row.get("schema"),
            name: row.get("name"),
            owner: Some(row.get("owner")),
            unlogged: row.get("unlogged"),
            tablespace: row.get("tablespace"),
            options: options.unwrap_or_default(),
            privileges: decode_acl(&acl, "arwdDxt"),
            partition_by: row.get("partition_by"),
            partition_bound: row.get("partition_bound"),
            partition_of: partition_of.clone(),
            // Partition children repeat the parent in pg_inherits.
            inherits: if partition_of.is_some() {
                Vec::new()
            } else {
                inherits
            },
            oid: Some(row.get::<Oid, _>("oid").0),
            ..Default::default()
        };
        tables.insert(table.qualified(), table);
    }
    Ok(tables)
}

async fn read_columns(conn: &PgConnection, db: &mut Database) -> Result<()> {
    let identity = if conn.version_num() >= 100000 {
        "a.attidentity::text"
    } else {
        "''::text"
    };
    let sql = format!(
        "SELECT n.nspname AS schema, c.relname AS table_name, a.attname AS name,
                format_type(a.atttypid, a.atttypmod) AS data_type,
                a.attnotnull AS not_null,
                pg_get_expr(ad.adbin, ad.adrelid) AS default_expr,
                CASE WHEN a.attcollation != t.typcollation THEN
                     (SELECT cn.nspname || '.' || co.collname
                      FROM pg_collation co JOIN pg_namespace cn ON co.collnamespace = cn.oid
                      WHERE co.oid = a.attcollation) END AS collation,
                {identity} AS identity,
                CASE WHEN a.attstattarget >= 0 THEN a.attstattarget END AS statistics,
                CASE WHEN a.attstorage != t.typstorage THEN
                     CASE a.attstorage WHEN 'p' THEN 'plain' WHEN 'e' THEN 'external'
                          WHEN 'm' THEN 'main' WHEN 'x' THEN 'extended' END END AS storage,
                a.attinhcount > 0 AS inherited,
                {} AS privileges
         FROM pg_attribute a
         JOIN pg_class c ON a.attrelid = c.oid
         JOIN pg_namespace n ON c.relnamespace = n.oid
         JOIN pg_type t ON a.atttypid = t.oid
         LEFT JOIN pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
         WHERE c.relkind IN ('r', 'p', 'f') AND a.attnum > 0 AND NOT a.attisdropped
           AND {USER_SCHEMAS}
         ORDER BY n.nspname, c.relname, a.attnum",
        acl_expr("a.attacl")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("columns"))?;

    for row in rows {
        let schema: String = row.get("schema");
        let table_name: String = row.get("table_name");
        let key = qualified_name(&schema, &table_name);
        let acl: Vec<String> = row.get("privileges");
        let identity: String = row.get("identity");
        let default_expr: Option<String> = row.get("default_expr");
        let is_identity = !identity.is_empty();
        let column = Column {
            name: row.get("name"),
            data_type: row.get("data_type"),
            not_null: row.get("not_null"),
            // Identity columns carry an internal sequence, not a default.
            default: if is_identity { None } else { default_expr },
            collation: row.get("collation"),
            identity: Identity::parse(&identity),
            statistics: row.get("statistics"),
            storage: row.get("storage"),
            privileges: decode_acl(&acl, "arwx"),
            inherited: row.get("inherited"),
            ..Default::default()
        };
        if let Some(table) = db.tables.get_mut(&key) {
            table.columns.push(column);
        } else if let Some(ft) = db.foreign_tables.get_mut(&key) {
            ft.columns.push(column);
        }
    }
    Ok(())
}

async fn read_constraints(conn: &PgConnection, db: &mut Database) -> Result<()> {
    let sql = "SELECT n.nspname AS schema, c.relname AS table_name, con.conname AS name,
                con.contype::text AS contype,
                ARRAY(SELECT a.attname FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
                      JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
                      ORDER BY k.ord) AS columns,
                fn.nspname AS ref_schema, fc.relname AS ref_table,
                ARRAY(SELECT a.attname FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
                      JOIN pg_attribute a ON a.attrelid = fc.oid AND a.attnum = k.attnum
                      ORDER BY k.ord) AS ref_columns,
                con.confupdtype::text AS on_update, con.confdeltype::text AS on_delete,
                con.condeferrable AS deferrable, con.condeferred AS initially_deferred,
                pg_get_constraintdef(con.oid) AS definition
         FROM pg_constraint con
         JOIN pg_class c ON con.conrelid = c.oid
         JOIN pg_namespace n ON c.relnamespace = n.oid
         LEFT JOIN pg_class fc ON con.confrelid = fc.oid
         LEFT JOIN pg_namespace fn ON fc.relnamespace = fn.oid
         WHERE con.contype IN ('p', 'u', 'c', 'f')
           AND n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
         ORDER BY n.nspname, c.relname, con.conname";
    let rows = sqlx::query(sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("constraints"))?;

    for row in rows {
        let schema: String = row.get("schema");
        let table_name: String = row.get("table_name");
        let key = qualified_name(&schema, &table_name);
        let Some(table) = db.tables.get_mut(&key) else {
            continue;
        };
        let contype: String = row.get("contype");
        let name: String = row.get("name");
        let columns: Vec<String> = row.get("columns");
        match contype.as_str() {
            "p" => {
                table.primary_key = Some(PrimaryKey {
                    name,
                    columns,
                    description: None,
                });
            }
            "u" => table.unique_constraints.push(UniqueConstraint {
                name,
                columns,
                description: None,
            }),
            "c" => {
                let definition: Option<String> = row.get("definition");
                let Some(definition) = definition else {
                    warn!(constraint = %name, table = %key,
                          "catalog returned NULL constraint definition; skipped");
                    continue;
                };
                let expression = definition
                    .strip_prefix("CHECK ")
                    .unwrap_or(&definition)
                    .to_string();
                table.check_constraints.push(CheckConstraint {
                    name,
                    expression,
                    columns,
                    description: None,
                });
            }
            "f" => {
                let action = |code: String| match code.as_str() {
                    "r" => ReferentialAction::Restrict,
                    "c" => ReferentialAction::Cascade,
                    "n" => ReferentialAction::SetNull,
                    "d" => ReferentialAction::SetDefault,
                    _ => ReferentialAction::NoAction,
                };
                table.foreign_keys.push(ForeignKey {
                    name,
                    columns,
                    ref_schema: row.get("ref_schema"),
                    ref_table: row.get("ref_table"),
                    ref_columns: row.get("ref_columns"),
                    on_update: action(row.get("on_update")),
                    on_delete: action(row.get("on_delete")),
                    deferrable: row.get("deferrable"),
                    initially_deferred: row.get("initially_deferred"),
                    description: None,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

async fn read_indexes(conn: &PgConnection, db: &mut Database) -> Result<()> {
    let sql = "SELECT n.nspname AS schema, c.relname AS table_name, ic.relname AS name,
                i.indisunique AS unique, am.amname AS method,
                pg_get_expr(i.indpred, i.indrelid) AS predicate,
                ts.spcname AS tablespace,
                pg_get_indexdef(i.indexrelid) AS definition,
                i.indexprs IS NOT NULL AS has_expressions,
                ARRAY(SELECT a.attname FROM unnest(i.indkey) WITH ORDINALITY AS k(attnum, ord)
                      JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
                      WHERE k.attnum > 0 ORDER BY k.ord) AS columns
         FROM pg_index i
         JOIN pg_class ic ON i.indexrelid = ic.oid
         JOIN pg_class c ON i.indrelid = c.oid
         JOIN pg_namespace n ON c.relnamespace = n.oid
         JOIN pg_am am ON ic.relam = am.oid
         LEFT JOIN pg_tablespace ts ON ic.reltablespace = ts.oid
         WHERE NOT i.indisprimary
           AND NOT EXISTS (SELECT 1 FROM pg_constraint con WHERE con.conindid = i.indexrelid)
           AND n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
         ORDER BY n.nspname, c.relname, ic.relname";
    let rows = sqlx::query(sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("indexes"))?;

    for row in rows {
        let schema: String = row.get("schema");
        let table_name: String = row.get("table_name");
        let key = qualified_name(&schema, &table_name);
        let Some(table) = db.tables.get_mut(&key) else {
            continue;
        };
        let name: String = row.get("name");
        let definition: Option<String> = row.get("definition");
        let Some(definition) = definition else {
            warn!(index = %name, table = %key,
                  "catalog returned NULL index definition; skipped");
            continue;
        };
        let has_expressions: bool = row.get("has_expressions");
        let method: String = row.get("method");
        table.indexes.push(Index {
            name,
            columns: if has_expressions {
                Vec::new()
            } else {
                row.get("columns")
            },
            // Expression indexes keep the catalog text verbatim; plain
            // ones re-assemble from structure.
            definition: has_expressions.then_some(definition),
            unique: row.get("unique"),
            method: IndexMethod::parse(&method).unwrap_or_default(),
            predicate: row.get("predicate"),
            tablespace: row.get("tablespace"),
            description: None,
        });
    }
    Ok(())
}

async fn read_views(conn: &PgConnection) -> Result<BTreeMap<String, View>> {
    let sql = format!(
        "SELECT n.nspname AS schema, c.relname AS name, r.rolname AS owner, c.oid,
                c.relkind = 'm' AS materialized,
                c.relkind != 'm' OR c.relispopulated AS with_data,
                pg_get_viewdef(c.oid) AS definition,
                {} AS privileges,
                ARRAY(SELECT DISTINCT dn.nspname || '.' || dc.relname
                      FROM pg_rewrite rw
                      JOIN pg_depend dep ON dep.objid = rw.oid AND dep.deptype = 'n'
                      JOIN pg_class dc ON dep.refclassid = 'pg_class'::regclass
                           AND dep.refobjid = dc.oid
                      JOIN pg_namespace dn ON dc.relnamespace = dn.oid
                      WHERE rw.ev_class = c.oid AND dep.refobjid != c.oid
                        AND dn.nspname NOT IN ('pg_catalog', 'information_schema')
                      ORDER BY 1) AS depends_on
         FROM pg_class c
         JOIN pg_namespace n ON c.relnamespace = n.oid
         JOIN pg_roles r ON c.relowner = r.oid
         WHERE c.relkind IN ('v', 'm') AND {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, c.relname",
        acl_expr("c.relacl"),
        not_extension_member("c.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("views"))?;

    let mut views = BTreeMap::new();
    for row in rows {
        let acl: Vec<String> = row.get("privileges");
        let definition: Option<String> = row.get("definition");
        let name: String = row.get("name");
        let Some(definition) = definition else {
            warn!(view = %name, "catalog returned NULL view definition; skipped");
            continue;
        };
        let view = View {
            schema: row.get("schema"),
            name,
            definition: definition.trim().trim_end_matches(';').to_string(),
            materialized: row.get("materialized"),
            with_data: row.get("with_data"),
            owner: Some(row.get("owner")),
            privileges: decode_acl(&acl, "arwdDxt"),
            depends_on: row.get("depends_on"),
            oid: Some(row.get::<Oid, _>("oid").0),
            ..Default::default()
        };
        views.insert(view.qualified(), view);
    }
    Ok(views)
}

async fn read_functions(conn: &PgConnection) -> Result<BTreeMap<String, Function>> {
    let not_aggregate = if conn.version_num() >= 110000 {
        "p.prokind = 'f'"
    } else {
        "NOT p.proisagg AND NOT p.proiswindow"
    };
    let sql = format!(
        "SELECT n.nspname AS schema, p.proname AS name, r.rolname AS owner, p.oid,
                pg_get_function_arguments(p.oid) AS arguments,
                pg_get_function_identity_arguments(p.oid) AS argtypes,
                pg_get_function_result(p.oid) AS returns,
                l.lanname AS language, p.prosrc AS source,
                p.provolatile::text AS volatility,
                p.prosecdef AS security_definer, p.proisstrict AS strict,
                p.proleakproof AS leakproof,
                {} AS privileges
         FROM pg_proc p
         JOIN pg_namespace n ON p.pronamespace = n.oid
         JOIN pg_roles r ON p.proowner = r.oid
         JOIN pg_language l ON p.prolang = l.oid
         WHERE {not_aggregate} AND l.lanname != 'internal' AND l.lanname != 'c'
           AND {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, p.proname",
        acl_expr("p.proacl"),
        not_extension_member("p.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("functions"))?;

    let mut functions = BTreeMap::new();
    for row in rows {
        let acl: Vec<String> = row.get("privileges");
        let volatility: String = row.get("volatility");
        let source: Option<String> = row.get("source");
        let name: String = row.get("name");
        let Some(source) = source else {
            warn!(function = %name, "catalog returned NULL function source; skipped");
            continue;
        };
        let f = Function {
            schema: row.get("schema"),
            name,
            arguments: row.get("arguments"),
            argtypes: row.get("argtypes"),
            returns: row.get("returns"),
            language: row.get("language"),
            source,
            volatility: Volatility::parse(&volatility).unwrap_or_default(),
            security_definer: row.get("security_definer"),
            strict: row.get("strict"),
            leakproof: row.get("leakproof"),
            owner: Some(row.get("owner")),
            privileges: decode_acl(&acl, "X"),
            oid: Some(row.get::<Oid, _>("oid").0),
            ..Default::default()
        };
        functions.insert(f.key(), f);
    }
    Ok(functions)
}

async fn read_aggregates(conn: &PgConnection) -> Result<BTreeMap<String, Aggregate>> {
    let is_aggregate = if conn.version_num() >= 110000 {
        "p.prokind = 'a'"
    } else {
        "p.proisagg"
    };
    let sql = format!(
        "SELECT n.nspname AS schema, p.proname AS name, r.rolname AS owner, p.oid,
                pg_get_function_identity_arguments(p.oid) AS argtypes,
                a.aggtransfn::regproc::text AS sfunc,
                format_type(a.aggtranstype, NULL) AS stype,
                CASE WHEN a.aggfinalfn != 0 THEN a.aggfinalfn::regproc::text END AS finalfunc,
                CASE WHEN a.aggcombinefn != 0 THEN a.aggcombinefn::regproc::text END AS combinefunc,
                a.agginitval AS initcond,
                CASE WHEN a.aggsortop != 0 THEN a.aggsortop::regoperator::text END AS sortop
         FROM pg_proc p
         JOIN pg_aggregate a ON a.aggfnoid = p.oid
         JOIN pg_namespace n ON p.pronamespace = n.oid
         JOIN pg_roles r ON p.proowner = r.oid
         WHERE {is_aggregate} AND {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, p.proname",
        not_extension_member("p.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("aggregates"))?;

    let mut aggregates = BTreeMap::new();
    for row in rows {
        let a = Aggregate {
            schema: row.get("schema"),
            name: row.get("name"),
            argtypes: row.get("argtypes"),
            sfunc: row.get("sfunc"),
            stype: row.get("stype"),
            finalfunc: row.get("finalfunc"),
            combinefunc: row.get("combinefunc"),
            initcond: row.get("initcond"),
            sortop: row.get("sortop"),
            owner: Some(row.get("owner")),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        aggregates.insert(a.key(), a);
    }
    Ok(aggregates)
}

async fn read_operators(conn: &PgConnection) -> Result<BTreeMap<String, Operator>> {
    let sql = format!(
        "SELECT n.nspname AS schema, o.oprname AS name, r.rolname AS owner, o.oid,
                CASE WHEN o.oprleft != 0 THEN format_type(o.oprleft, NULL) END AS leftarg,
                CASE WHEN o.oprright != 0 THEN format_type(o.oprright, NULL) END AS rightarg,
                o.oprcode::regproc::text AS procedure,
                CASE WHEN o.oprcom != 0 THEN o.oprcom::regoperator::text END AS commutator,
                CASE WHEN o.oprnegate != 0 THEN o.oprnegate::regoperator::text END AS negator,
                CASE WHEN o.oprrest != 0 THEN o.oprrest::regproc::text END AS restrict,
                CASE WHEN o.oprjoin != 0 THEN o.oprjoin::regproc::text END AS join,
                o.oprcanhash AS hashes, o.oprcanmerge AS merges
         FROM pg_operator o
         JOIN pg_namespace n ON o.oprnamespace = n.oid
         JOIN pg_roles r ON o.oprowner = r.oid
         WHERE o.oprcode != 0 AND {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, o.oprname",
        not_extension_member("o.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("operators"))?;

    let mut operators = BTreeMap::new();
    for row in rows {
        let o = Operator {
            schema: row.get("schema"),
            name: row.get("name"),
            leftarg: row.get("leftarg"),
            rightarg: row.get("rightarg"),
            procedure: row.get("procedure"),
            commutator: row.get("commutator"),
            negator: row.get("negator"),
            restrict: row.get("restrict"),
            join: row.get("join"),
            hashes: row.get("hashes"),
            merges: row.get("merges"),
            owner: Some(row.get("owner")),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        operators.insert(o.key(), o);
    }
    Ok(operators)
}

async fn read_operator_families(conn: &PgConnection) -> Result<BTreeMap<String, OperatorFamily>> {
    let sql = format!(
        "SELECT n.nspname AS schema, f.opfname AS name, am.amname AS method,
                r.rolname AS owner, f.oid
         FROM pg_opfamily f
         JOIN pg_namespace n ON f.opfnamespace = n.oid
         JOIN pg_am am ON f.opfmethod = am.oid
         JOIN pg_roles r ON f.opfowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, f.opfname",
        not_extension_member("f.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("operator families"))?;

    let mut families = BTreeMap::new();
    for row in rows {
        let of = OperatorFamily {
            schema: row.get("schema"),
            name: row.get("name"),
            index_method: row.get("method"),
            owner: Some(row.get("owner")),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        families.insert(of.key(), of);
    }
    Ok(families)
}

async fn read_operator_classes(conn: &PgConnection) -> Result<BTreeMap<String, OperatorClass>> {
    let sql = format!(
        "SELECT n.nspname AS schema, oc.opcname AS name, am.amname AS method,
                format_type(oc.opcintype, NULL) AS for_type, oc.opcdefault AS is_default,
                fn.nspname || '.' || f.opfname AS family,
                CASE WHEN oc.opckeytype != 0 THEN format_type(oc.opckeytype, NULL) END AS storage,
                r.rolname AS owner, oc.oid
         FROM pg_opclass oc
         JOIN pg_namespace n ON oc.opcnamespace = n.oid
         JOIN pg_am am ON oc.opcmethod = am.oid
         JOIN pg_opfamily f ON oc.opcfamily = f.oid
         JOIN pg_namespace fn ON f.opfnamespace = fn.oid
         JOIN pg_roles r ON oc.opcowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, oc.opcname",
        not_extension_member("oc.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("operator classes"))?;

    let mut classes = BTreeMap::new();
    for row in rows {
        let family: String = row.get("family");
        let name: String = row.get("name");
        let mut oc = OperatorClass {
            schema: row.get("schema"),
            name: name.clone(),
            index_method: row.get("method"),
            for_type: row.get("for_type"),
            default: row.get("is_default"),
            storage: row.get("storage"),
            owner: Some(row.get("owner")),
            oid: Some(row.get::<Oid, _>("oid").0),
            ..Default::default()
        };
        // The implicitly created same-named family is not re-declared.
        let implied_family = format!("{}.{}", oc.schema, oc.name);
        if family != implied_family {
            let (_, family_name) = crate::model::parse_qualified_name(&family);
            oc.family = Some(family_name);
        }

        let amop = sqlx::query(
            "SELECT ao.amopstrategy AS strategy, ao.amopopr::regoperator::text AS operator
             FROM pg_amop ao
             JOIN pg_opclass oc ON ao.amopfamily = oc.opcfamily
             WHERE oc.oid = $1
             ORDER BY ao.amopstrategy",
        )
        .bind(sqlx::postgres::types::Oid(oc.oid.unwrap_or_default()))
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("operator class operators"))?;
        for op_row in amop {
            let strategy: i16 = op_row.get("strategy");
            oc.operators.insert(strategy, op_row.get("operator"));
        }
        let amproc = sqlx::query(
            "SELECT ap.amprocnum AS support, ap.amproc::regproc::text AS function
             FROM pg_amproc ap
             JOIN pg_opclass oc ON ap.amprocfamily = oc.opcfamily
             WHERE oc.oid = $1
             ORDER BY ap.amprocnum",
        )
        .bind(sqlx::postgres::types::Oid(oc.oid.unwrap_or_default()))
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("operator class functions"))?;
        for proc_row in amproc {
            let support: i16 = proc_row.get("support");
            oc.functions.insert(support, proc_row.get("function"));
        }

        classes.insert(oc.key(), oc);
    }
    Ok(classes)
}

async fn read_triggers(conn: &PgConnection) -> Result<BTreeMap<String, Trigger>> {
    let sql = "SELECT n.nspname AS schema, c.relname AS table_name, t.tgname AS name,
                t.tgtype, t.tgnargs, encode(t.tgargs, 'escape') AS args,
                fn.nspname AS function_schema, p.proname AS function_name,
                pg_get_expr(t.tgqual, t.tgrelid) AS when_clause,
                ARRAY(SELECT a.attname FROM unnest(t.tgattr) WITH ORDINALITY AS k(attnum, ord)
                      JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
                      ORDER BY k.ord) AS update_columns
         FROM pg_trigger t
         JOIN pg_class c ON t.tgrelid = c.oid
         JOIN pg_namespace n ON c.relnamespace = n.oid
         JOIN pg_proc p ON t.tgfoid = p.oid
         JOIN pg_namespace fn ON p.pronamespace = fn.oid
         WHERE NOT t.tgisinternal
           AND n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
         ORDER BY n.nspname, c.relname, t.tgname";
    let rows = sqlx::query(sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("triggers"))?;

    let mut triggers = BTreeMap::new();
    for row in rows {
        let tgtype: i16 = row.get("tgtype");
        let timing = if tgtype & 64 != 0 {
            TriggerTiming::InsteadOf
        } else if tgtype & 2 != 0 {
            TriggerTiming::Before
        } else {
            TriggerTiming::After
        };
        let mut events = Vec::new();
        if tgtype & 4 != 0 {
            events.push(TriggerEvent::Insert);
        }
        if tgtype & 8 != 0 {
            events.push(TriggerEvent::Delete);
        }
        if tgtype & 16 != 0 {
            events.push(TriggerEvent::Update);
        }
        if tgtype & 32 != 0 {
            events.push(TriggerEvent::Truncate);
        }
        let args: Option<String> = row.get("args");
        let function_args = match args {
            Some(ref a) if !a.is_empty() => a
                .split("\\000")
                .filter(|p| !p.is_empty())
                .map(|p| p.to_string())
                .collect(),
            _ => Vec::new(),
        };
        let trigger = Trigger {
            name: row.get("name"),
            target_schema: row.get("schema"),
            target_name: row.get("table_name"),
            timing,
            events,
            update_columns: row.get("update_columns"),
            for_each_row: tgtype & 1 != 0,
            when_clause: row.get("when_clause"),
            function_schema: row.get("function_schema"),
            function_name: row.get("function_name"),
            function_args,
            description: None,
        };
        triggers.insert(trigger.key(), trigger);
    }
    Ok(triggers)
}

async fn read_rules(conn: &PgConnection) -> Result<BTreeMap<String, Rule>> {
    let sql = "SELECT n.nspname AS schema, c.relname AS table_name, rw.rulename AS name,
                rw.ev_type::text AS ev_type, rw.is_instead,
                pg_get_ruledef(rw.oid) AS definition
         FROM pg_rewrite rw
         JOIN pg_class c ON rw.ev_class = c.oid
         JOIN pg_namespace n ON c.relnamespace = n.oid
         WHERE rw.rulename != '_RETURN'
           AND n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
         ORDER BY n.nspname, c.relname, rw.rulename";
    let rows = sqlx::query(sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("rules"))?;

    let mut rules = BTreeMap::new();
    for row in rows {
        let name: String = row.get("name");
        let definition: Option<String> = row.get("definition");
        let Some(definition) = definition else {
            warn!(rule = %name, "catalog returned NULL rule definition; skipped");
            continue;
        };
        let ev_type: String = row.get("ev_type");
        let event = match ev_type.as_str() {
            "1" => RuleEvent::Select,
            "2" => RuleEvent::Update,
            "3" => RuleEvent::Insert,
            _ => RuleEvent::Delete,
        };
        let (condition, actions) = split_rule_definition(&definition);
        let rule = Rule {
            name,
            target_schema: row.get("schema"),
            target_name: row.get("table_name"),
            event,
            instead: row.get("is_instead"),
            condition,
            actions,
            description: None,
        };
        rules.insert(rule.key(), rule);
    }
    Ok(rules)
}

/// Extracts the WHERE condition and the DO actions out of a
/// `pg_get_ruledef` string.
fn split_rule_definition(definition: &str) -> (Option<String>, String) {
    let text = definition.trim().trim_end_matches(';');
    let do_pos = text.find(" DO ").map(|p| p + 4);
    let Some(do_pos) = do_pos else {
        return (None, text.to_string());
    };
    let head = &text[..do_pos - 4];
    let mut actions = text[do_pos..].trim().to_string();
    for prefix in ["INSTEAD ", "ALSO "] {
        if let Some(rest) = actions.strip_prefix(prefix) {
            actions = rest.trim().to_string();
        }
    }
    let condition = head
        .find(" WHERE ")
        .map(|p| head[p + 7..].trim().to_string());
    (condition, actions)
}

async fn read_casts(conn: &PgConnection) -> Result<BTreeMap<String, Cast>> {
    let sql = format!(
        "SELECT format_type(c.castsource, NULL) AS source,
                format_type(c.casttarget, NULL) AS target,
                CASE WHEN c.castfunc != 0 THEN c.castfunc::regprocedure::text END AS function,
                c.castcontext::text AS context, c.castmethod::text AS method, c.oid
         FROM pg_cast c
         JOIN pg_type st ON c.castsource = st.oid
         JOIN pg_type tt ON c.casttarget = tt.oid
         JOIN pg_namespace sn ON st.typnamespace = sn.oid
         JOIN pg_namespace tn ON tt.typnamespace = tn.oid
         WHERE (sn.nspname NOT IN ('pg_catalog', 'information_schema')
                OR tn.nspname NOT IN ('pg_catalog', 'information_schema'))
           AND {}
         ORDER BY 1, 2",
        not_extension_member("c.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("casts"))?;

    let mut casts = BTreeMap::new();
    for row in rows {
        let context: String = row.get("context");
        let method: String = row.get("method");
        let cast = Cast {
            source: row.get("source"),
            target: row.get("target"),
            function: row.get("function"),
            context: match context.as_str() {
                "a" => CastContext::Assignment,
                "i" => CastContext::Implicit,
                _ => CastContext::Explicit,
            },
            method: match method.as_str() {
                "b" => CastMethod::Binary,
                "i" => CastMethod::Inout,
                _ => CastMethod::Function,
            },
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        casts.insert(cast.key(), cast);
    }
    Ok(casts)
}

async fn read_conversions(conn: &PgConnection) -> Result<BTreeMap<String, Conversion>> {
    let sql = format!(
        "SELECT n.nspname AS schema, c.conname AS name,
                pg_encoding_to_char(c.conforencoding) AS source_encoding,
                pg_encoding_to_char(c.contoencoding) AS dest_encoding,
                c.conproc::regproc::text AS function, c.condefault AS is_default,
                r.rolname AS owner, c.oid
         FROM pg_conversion c
         JOIN pg_namespace n ON c.connamespace = n.oid
         JOIN pg_roles r ON c.conowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, c.conname",
        not_extension_member("c.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("conversions"))?;

    let mut conversions = BTreeMap::new();
    for row in rows {
        let c = Conversion {
            schema: row.get("schema"),
            name: row.get("name"),
            source_encoding: row.get("source_encoding"),
            dest_encoding: row.get("dest_encoding"),
            function: row.get("function"),
            default: row.get("is_default"),
            owner: Some(row.get("owner")),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        conversions.insert(c.qualified(), c);
    }
    Ok(conversions)
}

async fn read_event_triggers(conn: &PgConnection) -> Result<BTreeMap<String, EventTrigger>> {
    let sql = format!(
        "SELECT e.evtname AS name, e.evtevent AS event, e.evtenabled::text AS enabled,
                e.evttags::text[] AS tags, e.evtfoid::regproc::text AS procedure,
                r.rolname AS owner, e.oid
         FROM pg_event_trigger e
         JOIN pg_roles r ON e.evtowner = r.oid
         WHERE {}
         ORDER BY e.evtname",
        not_extension_member("e.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("event triggers"))?;

    let mut event_triggers = BTreeMap::new();
    for row in rows {
        let enabled: String = row.get("enabled");
        let tags: Option<Vec<String>> = row.get("tags");
        let name: String = row.get("name");
        event_triggers.insert(
            name.clone(),
            EventTrigger {
                name,
                event: row.get("event"),
                tags: tags.unwrap_or_default(),
                procedure: row.get("procedure"),
                enabled: enabled != "D",
                owner: Some(row.get("owner")),
                description: None,
                oid: Some(row.get::<Oid, _>("oid").0),
            },
        );
    }
    Ok(event_triggers)
}

async fn read_fdws(conn: &PgConnection) -> Result<BTreeMap<String, ForeignDataWrapper>> {
    let sql = format!(
        "SELECT w.fdwname AS name,
                CASE WHEN w.fdwhandler != 0 THEN w.fdwhandler::regproc::text END AS handler,
                CASE WHEN w.fdwvalidator != 0 THEN w.fdwvalidator::regproc::text END AS validator,
                COALESCE(w.fdwoptions, '{{}}'::text[]) AS options,
                {} AS privileges, r.rolname AS owner, w.oid
         FROM pg_foreign_data_wrapper w
         JOIN pg_roles r ON w.fdwowner = r.oid
         WHERE {}
         ORDER BY w.fdwname",
        acl_expr("w.fdwacl"),
        not_extension_member("w.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("foreign data wrappers"))?;

    let mut fdws = BTreeMap::new();
    for row in rows {
        let acl: Vec<String> = row.get("privileges");
        let name: String = row.get("name");
        fdws.insert(
            name.clone(),
            ForeignDataWrapper {
                name,
                handler: row.get("handler"),
                validator: row.get("validator"),
                options: row.get("options"),
                owner: Some(row.get("owner")),
                privileges: decode_acl(&acl, "U"),
                description: None,
                oid: Some(row.get::<Oid, _>("oid").0),
            },
        );
    }
    Ok(fdws)
}

async fn read_servers(conn: &PgConnection) -> Result<BTreeMap<String, ForeignServer>> {
    let sql = format!(
        "SELECT s.srvname AS name, w.fdwname AS wrapper, s.srvtype AS server_type,
                s.srvversion AS version, COALESCE(s.srvoptions, '{{}}'::text[]) AS options,
                {} AS privileges, r.rolname AS owner, s.oid
         FROM pg_foreign_server s
         JOIN pg_foreign_data_wrapper w ON s.srvfdw = w.oid
         JOIN pg_roles r ON s.srvowner = r.oid
         WHERE {}
         ORDER BY s.srvname",
        acl_expr("s.srvacl"),
        not_extension_member("s.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("foreign servers"))?;

    let mut servers = BTreeMap::new();
    for row in rows {
        let acl: Vec<String> = row.get("privileges");
        let name: String = row.get("name");
        servers.insert(
            name.clone(),
            ForeignServer {
                name,
                wrapper: row.get("wrapper"),
                server_type: row.get("server_type"),
                version: row.get("version"),
                options: row.get("options"),
                owner: Some(row.get("owner")),
                privileges: decode_acl(&acl, "U"),
                description: None,
                oid: Some(row.get::<Oid, _>("oid").0),
            },
        );
    }
    Ok(servers)
}

async fn read_user_mappings(conn: &PgConnection) -> Result<BTreeMap<String, UserMapping>> {
    let rows = sqlx::query(
        "SELECT COALESCE(r.rolname, 'PUBLIC') AS role_name, s.srvname AS server,
                COALESCE(u.umoptions, '{}'::text[]) AS options, u.oid
         FROM pg_user_mapping u
         JOIN pg_foreign_server s ON u.umserver = s.oid
         LEFT JOIN pg_roles r ON u.umuser = r.oid
         ORDER BY 1, 2",
    )
    .fetch_all(conn.pool())
    .await
    .map_err(db_err("user mappings"))?;

    let mut mappings = BTreeMap::new();
    for row in rows {
        let um = UserMapping {
            user: row.get("role_name"),
            server: row.get("server"),
            options: row.get("options"),
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        mappings.insert(um.key(), um);
    }
    Ok(mappings)
}

async fn read_foreign_tables(conn: &PgConnection) -> Result<BTreeMap<String, ForeignTable>> {
    let sql = format!(
        "SELECT n.nspname AS schema, c.relname AS name, s.srvname AS server,
                COALESCE(ft.ftoptions, '{{}}'::text[]) AS options,
                {} AS privileges, r.rolname AS owner, c.oid
         FROM pg_foreign_table ft
         JOIN pg_class c ON ft.ftrelid = c.oid
         JOIN pg_namespace n ON c.relnamespace = n.oid
         JOIN pg_foreign_server s ON ft.ftserver = s.oid
         JOIN pg_roles r ON c.relowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, c.relname",
        acl_expr("c.relacl"),
        not_extension_member("c.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("foreign tables"))?;

    let mut foreign_tables = BTreeMap::new();
    for row in rows {
        let acl: Vec<String> = row.get("privileges");
        let ft = ForeignTable {
            schema: row.get("schema"),
            name: row.get("name"),
            server: row.get("server"),
            options: row.get("options"),
            owner: Some(row.get("owner")),
            privileges: decode_acl(&acl, "arwdDxt"),
            oid: Some(row.get::<Oid, _>("oid").0),
            ..Default::default()
        };
        foreign_tables.insert(ft.qualified(), ft);
    }
    Ok(foreign_tables)
}

async fn read_ts_parsers(conn: &PgConnection) -> Result<BTreeMap<String, TsParser>> {
    let sql = format!(
        "SELECT n.nspname AS schema, p.prsname AS name,
                p.prsstart::regproc::text AS start, p.prstoken::regproc::text AS gettoken,
                p.prsend::regproc::text AS end, p.prslextype::regproc::text AS lextypes,
                CASE WHEN p.prsheadline != 0 THEN p.prsheadline::regproc::text END AS headline,
                p.oid
         FROM pg_ts_parser p
         JOIN pg_namespace n ON p.prsnamespace = n.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, p.prsname",
        not_extension_member("p.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("text search parsers"))?;

    let mut parsers = BTreeMap::new();
    for row in rows {
        let p = TsParser {
            schema: row.get("schema"),
            name: row.get("name"),
            start: row.get("start"),
            gettoken: row.get("gettoken"),
            end: row.get("end"),
            lextypes: row.get("lextypes"),
            headline: row.get("headline"),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        parsers.insert(p.qualified(), p);
    }
    Ok(parsers)
}

async fn read_ts_dictionaries(conn: &PgConnection) -> Result<BTreeMap<String, TsDictionary>> {
    let sql = format!(
        "SELECT n.nspname AS schema, d.dictname AS name,
                tn.nspname || '.' || t.tmplname AS template,
                d.dictinitoption AS options, r.rolname AS owner, d.oid
         FROM pg_ts_dict d
         JOIN pg_namespace n ON d.dictnamespace = n.oid
         JOIN pg_ts_template t ON d.dicttemplate = t.oid
         JOIN pg_namespace tn ON t.tmplnamespace = tn.oid
         JOIN pg_roles r ON d.dictowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, d.dictname",
        not_extension_member("d.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("text search dictionaries"))?;

    let mut dictionaries = BTreeMap::new();
    for row in rows {
        let template: String = row.get("template");
        let d = TsDictionary {
            schema: row.get("schema"),
            name: row.get("name"),
            template: template
                .strip_prefix("pg_catalog.")
                .unwrap_or(&template)
                .to_string(),
            options: row.get("options"),
            owner: Some(row.get("owner")),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        dictionaries.insert(d.qualified(), d);
    }
    Ok(dictionaries)
}

async fn read_ts_templates(conn: &PgConnection) -> Result<BTreeMap<String, TsTemplate>> {
    let sql = format!(
        "SELECT n.nspname AS schema, t.tmplname AS name,
                CASE WHEN t.tmplinit != 0 THEN t.tmplinit::regproc::text END AS init,
                t.tmpllexize::regproc::text AS lexize, t.oid
         FROM pg_ts_template t
         JOIN pg_namespace n ON t.tmplnamespace = n.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, t.tmplname",
        not_extension_member("t.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("text search templates"))?;

    let mut templates = BTreeMap::new();
    for row in rows {
        let t = TsTemplate {
            schema: row.get("schema"),
            name: row.get("name"),
            init: row.get("init"),
            lexize: row.get("lexize"),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        templates.insert(t.qualified(), t);
    }
    Ok(templates)
}

async fn read_ts_configs(conn: &PgConnection) -> Result<BTreeMap<String, TsConfig>> {
    let sql = format!(
        "SELECT n.nspname AS schema, c.cfgname AS name,
                pn.nspname || '.' || p.prsname AS parser, r.rolname AS owner, c.oid
         FROM pg_ts_config c
         JOIN pg_namespace n ON c.cfgnamespace = n.oid
         JOIN pg_ts_parser p ON c.cfgparser = p.oid
         JOIN pg_namespace pn ON p.prsnamespace = pn.oid
         JOIN pg_roles r ON c.cfgowner = r.oid
         WHERE {USER_SCHEMAS} AND {}
         ORDER BY n.nspname, c.cfgname",
        not_extension_member("c.oid")
    );
    let rows = sqlx::query(&sql)
        .fetch_all(conn.pool())
        .await
        .map_err(db_err("text search configurations"))?;

    let mut configs = BTreeMap::new();
    for row in rows {
        let parser: String = row.get("parser");
        let c = TsConfig {
            schema: row.get("schema"),
            name: row.get("name"),
            parser: parser
                .strip_prefix("pg_catalog.")
                .unwrap_or(&parser)
                .to_string(),
            owner: Some(row.get("owner")),
            description: None,
            oid: Some(row.get::<Oid, _>("oid").0),
        };
        configs.insert(c.qualified(), c);
    }
    Ok(configs)
}

/// Comments for every kind in one pass over `pg_description`, attached by
/// classoid + oid.
async fn read_descriptions(conn: &PgConnection, db: &mut Database) -> Result<()> {
    let rows = sqlx::query(
        "SELECT d.classoid::regclass::text AS catalog, d.objoid, d.objsubid, d.description
         FROM pg_description d
         WHERE d.description IS NOT NULL",
    )
    .fetch_all(conn.pool())
    .await
    .map_err(db_err("descriptions"))?;

    use std::collections::HashMap;
    let mut by_oid: HashMap<(String, u32, i32), String> = HashMap::new();
    for row in rows {
        let catalog: String = row.get("catalog");
        let oid = row.get::<Oid, _>("objoid").0;
        let subid: i32 = row.get("objsubid");
        by_oid.insert((catalog, oid, subid), row.get("description"));
    }
    let lookup = |catalog: &str, oid: Option<u32>, subid: i32| -> Option<String> {
        oid.and_then(|o| by_oid.get(&(catalog.to_string(), o, subid)).cloned())
    };

    for schema in db.schemas.values_mut() {
        schema.description = lookup("pg_namespace", schema.oid, 0);
    }
    for ext in db.extensions.values_mut() {
        ext.description = lookup("pg_extension", ext.oid, 0);
    }
    for lang in db.languages.values_mut() {
        lang.description = lookup("pg_language", lang.oid, 0);
    }
    for table in db.tables.values_mut() {
        table.description = lookup("pg_class", table.oid, 0);
        for (position, column) in table.columns.iter_mut().enumerate() {
            column.description = lookup("pg_class", table.oid, position as i32 + 1);
        }
    }
    for view in db.views.values_mut() {
        view.description = lookup("pg_class", view.oid, 0);
    }
    for seq in db.sequences.values_mut() {
        seq.description = lookup("pg_class", seq.oid, 0);
    }
    for function in db.functions.values_mut() {
        function.description = lookup("pg_proc", function.oid, 0);
    }
    for aggregate in db.aggregates.values_mut() {
        aggregate.description = lookup("pg_proc", aggregate.oid, 0);
    }
    for t in db.types.values_mut() {
        t.description = lookup("pg_type", t.oid, 0);
    }
    for d in db.domains.values_mut() {
        d.description = lookup("pg_type", d.oid, 0);
    }
    for o in db.operators.values_mut() {
        o.description = lookup("pg_operator", o.oid, 0);
    }
    for c in db.casts.values_mut() {
        c.description = lookup("pg_cast", c.oid, 0);
    }
    for c in db.conversions.values_mut() {
        c.description = lookup("pg_conversion", c.oid, 0);
    }
    for c in db.collations.values_mut() {
        c.description = lookup("pg_collation", c.oid, 0);
    }
    for et in db.event_triggers.values_mut() {
        et.description = lookup("pg_event_trigger", et.oid, 0);
    }
    for f in db.fdws.values_mut() {
        f.description = lookup("pg_foreign_data_wrapper", f.oid, 0);
    }
    for s in db.servers.values_mut() {
        s.description = lookup("pg_foreign_server", s.oid, 0);
    }
    for ft in db.foreign_tables.values_mut() {
        ft.description = lookup("pg_class", ft.oid, 0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acl_decoding_collapses_full_sets() {
        let items = vec![
            "postgres=arwdDxt/postgres".to_string(),
            "alice=r/postgres".to_string(),
            "=r/postgres".to_string(),
        ];
        let grants = decode_acl(&items, "arwdDxt");
        assert_eq!(grants.len(), 3);
        assert_eq!(grants[0].grantee, "postgres");
        assert_eq!(grants[0].privileges, vec!["all"]);
        assert_eq!(grants[1].grantee, "alice");
        assert_eq!(grants[1].privileges, vec!["select"]);
        assert_eq!(grants[2].grantee, "PUBLIC");
    }

    #[test]
    fn acl_decoding_keeps_grant_option_marker() {
        let grants = decode_acl(&["bob=r*w/postgres".to_string()], "arwdDxt");
        assert_eq!(grants[0].privileges, vec!["select*", "update"]);
    }

    #[test]
    fn rule_definition_splits_condition_and_actions() {
        let (condition, actions) = split_rule_definition(
            "CREATE RULE notify_me AS ON UPDATE TO t1 DO NOTIFY t1_updated;",
        );
        assert_eq!(condition, None);
        assert_eq!(actions, "NOTIFY t1_updated");

        let (condition, actions) = split_rule_definition(
            "CREATE RULE r1 AS ON UPDATE TO t1 WHERE (old.c1 > 0) DO INSTEAD NOTHING;",
        );
        assert_eq!(condition.as_deref(), Some("(old.c1 > 0)"));
        assert_eq!(actions, "NOTHING");
    }
}
