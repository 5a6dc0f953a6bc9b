//! Object filtering for extraction and diff input.
//!
//! `-n`/`-N` select or exclude schemas, `-t`/`-T` select or exclude
//! tables. Objects bound to a filtered-out schema or table (triggers,
//! rules, owned sequences) are dropped along with it.

use crate::model::Database;

#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub schemas: Vec<String>,
    pub exclude_schemas: Vec<String>,
    pub tables: Vec<String>,
    pub exclude_tables: Vec<String>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.exclude_schemas.is_empty()
            && self.tables.is_empty()
            && self.exclude_tables.is_empty()
    }

    fn keep_schema(&self, name: &str) -> bool {
        if self.exclude_schemas.iter().any(|s| s == name) {
            return false;
        }
        self.schemas.is_empty() || self.schemas.iter().any(|s| s == name)
    }

    fn keep_table(&self, schema: &str, name: &str) -> bool {
        if !self.keep_schema(schema) {
            return false;
        }
        if self.exclude_tables.iter().any(|t| t == name) {
            return false;
        }
        self.tables.is_empty() || self.tables.iter().any(|t| t == name)
    }
}

/// Returns a copy of the model restricted to the filter. With table
/// filters active, non-table objects of kept schemas survive only when no
/// `-t` list was given (matching the extraction tools' behavior).
pub fn filter_database(db: &Database, filter: &Filter) -> Database {
    if filter.is_empty() {
        return db.clone();
    }
    let mut out = db.clone();
    let keep_schema = |name: &str| filter.keep_schema(name);
    let table_only = !filter.tables.is_empty();

    out.schemas.retain(|name, _| keep_schema(name));
    out.tables
        .retain(|_, t| filter.keep_table(&t.schema, &t.name));
    out.foreign_tables
        .retain(|_, t| filter.keep_table(&t.schema, &t.name));

    out.views
        .retain(|_, v| keep_schema(&v.schema) && !table_only);
    out.sequences.retain(|_, s| {
        if let Some(owner) = &s.owned_by {
            filter.keep_table(&owner.table_schema, &owner.table_name)
        } else {
            keep_schema(&s.schema) && !table_only
        }
    });
    out.functions
        .retain(|_, f| keep_schema(&f.schema) && !table_only);
    out.aggregates
        .retain(|_, a| keep_schema(&a.schema) && !table_only);
    out.operators
        .retain(|_, o| keep_schema(&o.schema) && !table_only);
    out.operator_classes
        .retain(|_, o| keep_schema(&o.schema) && !table_only);
    out.operator_families
        .retain(|_, o| keep_schema(&o.schema) && !table_only);
    out.types
        .retain(|_, t| keep_schema(&t.schema) && !table_only);
    out.domains
        .retain(|_, d| keep_schema(&d.schema) && !table_only);
    out.collations
        .retain(|_, c| keep_schema(&c.schema) && !table_only);
    out.conversions
        .retain(|_, c| keep_schema(&c.schema) && !table_only);
    out.ts_parsers
        .retain(|_, p| keep_schema(&p.schema) && !table_only);
    out.ts_dictionaries
        .retain(|_, d| keep_schema(&d.schema) && !table_only);
    out.ts_templates
        .retain(|_, t| keep_schema(&t.schema) && !table_only);
    out.ts_configs
        .retain(|_, c| keep_schema(&c.schema) && !table_only);

    out.triggers
        .retain(|_, t| filter.keep_table(&t.target_schema, &t.target_name));
    out.rules
        .retain(|_, r| filter.keep_table(&r.target_schema, &r.target_name));

    // Edges pointing at filtered-out objects go too.
    let mut live: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    live.extend(out.schemas.keys().cloned());
    live.extend(out.tables.keys().cloned());
    live.extend(out.foreign_tables.keys().cloned());
    live.extend(out.views.keys().cloned());
    live.extend(out.sequences.keys().cloned());
    live.extend(out.functions.keys().cloned());
    live.extend(out.aggregates.keys().cloned());
    live.extend(out.operators.keys().cloned());
    live.extend(out.operator_classes.keys().cloned());
    live.extend(out.operator_families.keys().cloned());
    live.extend(out.types.keys().cloned());
    live.extend(out.domains.keys().cloned());
    live.extend(out.collations.keys().cloned());
    live.extend(out.conversions.keys().cloned());
    live.extend(out.triggers.keys().cloned());
    live.extend(out.rules.keys().cloned());
    live.extend(out.ts_parsers.keys().cloned());
    live.extend(out.ts_dictionaries.keys().cloned());
    live.extend(out.ts_templates.keys().cloned());
    live.extend(out.ts_configs.keys().cloned());
    live.extend(out.extensions.keys().cloned());
    live.extend(out.languages.keys().cloned());
    live.extend(out.casts.keys().cloned());
    live.extend(out.event_triggers.keys().cloned());
    live.extend(out.fdws.keys().cloned());
    live.extend(out.servers.keys().cloned());
    live.extend(out.user_mappings.keys().cloned());

    out.depends.retain(|from, _| live.contains(&from.key));
    for targets in out.depends.values_mut() {
        targets.retain(|to| live.contains(&to.key));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Schema, Table};

    fn db_with(schemas: &[&str], tables: &[(&str, &str)]) -> Database {
        let mut db = Database::new();
        for s in schemas {
            db.schemas.insert(
                s.to_string(),
                Schema {
                    name: s.to_string(),
                    ..Default::default()
                },
            );
        }
        for (schema, name) in tables {
            let t = Table {
                schema: schema.to_string(),
                name: name.to_string(),
                ..Default::default()
            };
            db.tables.insert(t.qualified(), t);
        }
        db
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let db = db_with(&["public", "s1"], &[("public", "t1")]);
        let out = filter_database(&db, &Filter::default());
        assert_eq!(out.schemas.len(), 2);
        assert_eq!(out.tables.len(), 1);
    }

    #[test]
    fn schema_selection_drops_other_schemas() {
        let db = db_with(&["public", "s1"], &[("public", "t1"), ("s1", "t2")]);
        let filter = Filter {
            schemas: vec!["s1".into()],
            ..Default::default()
        };
        let out = filter_database(&db, &filter);
        assert!(out.schemas.contains_key("s1"));
        assert!(!out.schemas.contains_key("public"));
        assert!(out.tables.contains_key("s1.t2"));
        assert!(!out.tables.contains_key("public.t1"));
    }

    #[test]
    fn table_exclusion_is_by_name() {
        let db = db_with(&["public"], &[("public", "t1"), ("public", "t2")]);
        let filter = Filter {
            exclude_tables: vec!["t1".into()],
            ..Default::default()
        };
        let out = filter_database(&db, &filter);
        assert!(!out.tables.contains_key("public.t1"));
        assert!(out.tables.contains_key("public.t2"));
    }

    #[test]
    fn table_selection_keeps_only_named_tables() {
        let db = db_with(&["public"], &[("public", "t1"), ("public", "t2")]);
        let filter = Filter {
            tables: vec!["t2".into()],
            ..Default::default()
        };
        let out = filter_database(&db, &filter);
        assert_eq!(out.tables.len(), 1);
        assert!(out.tables.contains_key("public.t2"));
    }
}
