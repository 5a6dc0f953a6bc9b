//! Audit-column augmentation.
//!
//! Rewrites a desired model by injecting predefined columns, a trigger,
//! and a trigger function into tables named by an augmentation
//! specification. Prototype names and bodies are parameterized with
//! `{{placeholder}}` tokens substituted in a single left-to-right pass.
//! The result is an ordinary model; the standard diff path runs on it
//! unchanged.

use crate::model::{
    qualified_name, Column, Database, Function, Trigger, TriggerEvent, TriggerTiming, Volatility,
};
use crate::util::{Result, SchemaError};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// A prototype column recognized by the templates.
struct ColumnPrototype {
    name: &'static str,
    data_type: &'static str,
    not_null: bool,
    default: Option<&'static str>,
}

const COLUMN_PROTOTYPES: &[ColumnPrototype] = &[
    ColumnPrototype {
        name: "created_by_user",
        data_type: "character varying(63)",
        not_null: true,
        default: None,
    },
    ColumnPrototype {
        name: "created_by_ip_addr",
        data_type: "inet",
        not_null: true,
        default: None,
    },
    ColumnPrototype {
        name: "created_date",
        data_type: "date",
        not_null: true,
        default: Some("('now'::text)::date"),
    },
    ColumnPrototype {
        name: "created_timestamp",
        data_type: "timestamp with time zone",
        not_null: true,
        default: None,
    },
    ColumnPrototype {
        name: "modified_by_ip_addr",
        data_type: "inet",
        not_null: true,
        default: None,
    },
    ColumnPrototype {
        name: "modified_by_user",
        data_type: "character varying(63)",
        not_null: true,
        default: None,
    },
    ColumnPrototype {
        name: "modified_timestamp",
        data_type: "timestamp with time zone",
        not_null: true,
        default: None,
    },
];

/// Named audit-column templates: which prototype columns each adds, and
/// whether the default audit trigger rides along.
struct AuditTemplate {
    name: &'static str,
    columns: &'static [&'static str],
    with_trigger: bool,
}

const AUDIT_TEMPLATES: &[AuditTemplate] = &[
    AuditTemplate {
        name: "default",
        columns: &["modified_by_user", "modified_timestamp"],
        with_trigger: true,
    },
    AuditTemplate {
        name: "modified_only",
        columns: &["modified_by_user", "modified_timestamp"],
        with_trigger: false,
    },
    AuditTemplate {
        name: "created_date_only",
        columns: &["created_date"],
        with_trigger: false,
    },
    AuditTemplate {
        name: "full",
        columns: &[
            "created_by_user",
            "created_date",
            "created_timestamp",
            "modified_by_user",
            "modified_timestamp",
        ],
        with_trigger: true,
    },
];

const AUDIT_FUNCTION_NAME: &str = "audit_default";
const AUDIT_TRIGGER_NAME: &str = "{{table_name}}_audit_default";
const AUDIT_FUNCTION_SOURCE: &str = "BEGIN
    NEW.{{modified_by_user}} = CURRENT_USER;
    NEW.{{modified_timestamp}} = CURRENT_TIMESTAMP;
    RETURN NEW;
END ";

/// Single left-to-right pass: each `{{token}}` is replaced once and the
/// replacement text is not rescanned.
fn substitute(template: &str, replacements: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let token = &after[..close];
                match replacements.get(token) {
                    Some(replacement) => out.push_str(replacement),
                    None => {
                        out.push_str("{{");
                        out.push_str(token);
                        out.push_str("}}");
                    }
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Applies an augmentation specification to a model in place.
///
/// The specification mirrors the model shape:
///
/// ```yaml
/// schema public:
///   table t1:
///     audit_columns: default
/// ```
pub fn augment_database(db: &mut Database, spec: &Value) -> Result<()> {
    let root = spec
        .as_mapping()
        .ok_or_else(|| SchemaError::yaml("augment spec", "expected a mapping"))?;

    for (key, entry) in root {
        let key = key
            .as_str()
            .ok_or_else(|| SchemaError::yaml("augment spec", "keys must be strings"))?;
        if key == "augmenter" {
            // Template overrides are accepted but only the named built-in
            // templates are currently honored.
            continue;
        }
        let Some(schema_name) = key.strip_prefix("schema ") else {
            return Err(SchemaError::yaml(key, "expected 'schema <name>'"));
        };
        let schema_map = entry
            .as_mapping()
            .ok_or_else(|| SchemaError::yaml(key, "expected a mapping"))?;
        for (table_key, table_spec) in schema_map {
            let table_key = table_key
                .as_str()
                .ok_or_else(|| SchemaError::yaml(key, "keys must be strings"))?;
            let Some(table_name) = table_key.strip_prefix("table ") else {
                return Err(SchemaError::yaml(table_key, "expected 'table <name>'"));
            };
            augment_table(db, schema_name, table_name, table_spec)?;
        }
    }
    Ok(())
}

fn augment_table(
    db: &mut Database,
    schema: &str,
    table_name: &str,
    spec: &Value,
) -> Result<()> {
    let object = format!("table {schema}.{table_name}");
    let spec_map = spec
        .as_mapping()
        .ok_or_else(|| SchemaError::yaml(&object, "expected a mapping"))?;

    for (key, value) in spec_map {
        let key = key
            .as_str()
            .ok_or_else(|| SchemaError::yaml(&object, "keys must be strings"))?;
        match key {
            "audit_columns" => {
                let template_name = value.as_str().ok_or_else(|| {
                    SchemaError::yaml(&object, "'audit_columns' must name a template")
                })?;
                let template = AUDIT_TEMPLATES
                    .iter()
                    .find(|t| t.name == template_name)
                    .ok_or_else(|| {
                        SchemaError::yaml(
                            &object,
                            format!("unknown audit_columns template '{template_name}'"),
                        )
                    })?;
                apply_audit_template(db, schema, table_name, template, &object)?;
            }
            other => {
                return Err(SchemaError::yaml(
                    &object,
                    format!("unknown augmentation '{other}'"),
                ))
            }
        }
    }
    Ok(())
}

fn apply_audit_template(
    db: &mut Database,
    schema: &str,
    table_name: &str,
    template: &AuditTemplate,
    object: &str,
) -> Result<()> {
    let table_key = qualified_name(schema, table_name);
    let table = db
        .tables
        .get_mut(&table_key)
        .ok_or_else(|| SchemaError::yaml(object, "table is not in the model"))?;

    for column_name in template.columns {
        let prototype = COLUMN_PROTOTYPES
            .iter()
            .find(|p| p.name == *column_name)
            .expect("templates only name known prototypes");
        match table.columns.iter_mut().find(|c| c.name == *column_name) {
            Some(existing) => {
                existing.data_type = prototype.data_type.to_string();
                existing.not_null = prototype.not_null;
                existing.default = prototype.default.map(|d| d.to_string());
            }
            None => table.columns.push(Column {
                name: prototype.name.to_string(),
                data_type: prototype.data_type.to_string(),
                not_null: prototype.not_null,
                default: prototype.default.map(|d| d.to_string()),
                ..Default::default()
            }),
        }
    }

    if template.with_trigger {
        let mut replacements: BTreeMap<&str, String> = BTreeMap::new();
        replacements.insert("table_name", table_name.to_string());
        replacements.insert("modified_by_user", "modified_by_user".to_string());
        replacements.insert("modified_timestamp", "modified_timestamp".to_string());

        let trigger_name = substitute(AUDIT_TRIGGER_NAME, &replacements);
        let trigger = Trigger {
            name: trigger_name,
            target_schema: schema.to_string(),
            target_name: table_name.to_string(),
            timing: TriggerTiming::Before,
            events: vec![TriggerEvent::Insert, TriggerEvent::Update],
            update_columns: Vec::new(),
            for_each_row: true,
            when_clause: None,
            function_schema: schema.to_string(),
            function_name: AUDIT_FUNCTION_NAME.to_string(),
            function_args: Vec::new(),
            description: None,
        };
        db.triggers.insert(trigger.key(), trigger);

        let function_key = qualified_name(schema, &format!("{AUDIT_FUNCTION_NAME}()"));
        if !db.functions.contains_key(&function_key) {
            let function = Function {
                schema: schema.to_string(),
                name: AUDIT_FUNCTION_NAME.to_string(),
                arguments: String::new(),
                argtypes: String::new(),
                returns: "trigger".to_string(),
                language: "plpgsql".to_string(),
                source: substitute(AUDIT_FUNCTION_SOURCE, &replacements),
                volatility: Volatility::Volatile,
                security_definer: true,
                description: Some(
                    "Maintains modified_by_user and modified_timestamp audit columns."
                        .to_string(),
                ),
                ..Default::default()
            };
            db.functions.insert(function_key, function);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Schema, Table};

    fn model_with_table() -> Database {
        let mut db = Database::new();
        db.schemas.insert(
            "public".into(),
            Schema {
                name: "public".into(),
                ..Default::default()
            },
        );
        let mut table = Table {
            schema: "public".into(),
            name: "t1".into(),
            ..Default::default()
        };
        table.columns.push(Column::new("c1", "integer"));
        db.tables.insert("public.t1".into(), table);
        db
    }

    fn spec(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn default_template_adds_columns_trigger_and_function() {
        let mut db = model_with_table();
        augment_database(&mut db, &spec("schema public:\n  table t1:\n    audit_columns: default\n"))
            .unwrap();

        let table = &db.tables["public.t1"];
        let names = table.column_names();
        assert!(names.contains(&"modified_by_user"));
        assert!(names.contains(&"modified_timestamp"));
        assert!(db.triggers.contains_key("public.t1.t1_audit_default"));
        let f = &db.functions["public.audit_default()"];
        assert_eq!(f.returns, "trigger");
        assert!(f.source.contains("NEW.modified_by_user"));
        assert!(f.security_definer);
    }

    #[test]
    fn created_date_only_adds_one_column_without_trigger() {
        let mut db = model_with_table();
        augment_database(
            &mut db,
            &spec("schema public:\n  table t1:\n    audit_columns: created_date_only\n"),
        )
        .unwrap();

        let table = &db.tables["public.t1"];
        let created = table.column("created_date").unwrap();
        assert_eq!(created.data_type, "date");
        assert_eq!(created.default.as_deref(), Some("('now'::text)::date"));
        assert!(db.triggers.is_empty());
        assert!(db.functions.is_empty());
    }

    #[test]
    fn existing_column_is_retyped_not_duplicated() {
        let mut db = model_with_table();
        db.tables
            .get_mut("public.t1")
            .unwrap()
            .columns
            .push(Column::new("modified_by_user", "text"));
        augment_database(
            &mut db,
            &spec("schema public:\n  table t1:\n    audit_columns: modified_only\n"),
        )
        .unwrap();

        let table = &db.tables["public.t1"];
        let matches: Vec<_> = table
            .columns
            .iter()
            .filter(|c| c.name == "modified_by_user")
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].data_type, "character varying(63)");
        assert!(matches[0].not_null);
    }

    #[test]
    fn unknown_template_is_an_error() {
        let mut db = model_with_table();
        let error = augment_database(
            &mut db,
            &spec("schema public:\n  table t1:\n    audit_columns: nonsense\n"),
        )
        .unwrap_err();
        assert!(error.to_string().contains("nonsense"));
    }

    #[test]
    fn substitution_is_single_pass_left_to_right() {
        let mut replacements = BTreeMap::new();
        replacements.insert("a", "{{b}}".to_string());
        replacements.insert("b", "never".to_string());
        assert_eq!(substitute("x {{a}} y {{b}}", &replacements), "x {{b}} y never");
        assert_eq!(substitute("{{missing}}", &BTreeMap::new()), "{{missing}}");
    }
}
