//! Typed schema model.
//!
//! Every user-visible catalog object kind has a record type here. The
//! [`Database`] container holds one map per kind, keyed by the object's
//! external key (schema-qualified where applicable). Those keys double as
//! YAML map identifiers and as pairing keys during diff.

pub mod callable;
pub mod foreign;
pub mod operator;
pub mod relation;
pub mod textsearch;
pub mod types;

pub use callable::{Aggregate, Cast, CastContext, CastMethod, EventTrigger, Function, Language, Volatility};
pub use foreign::{ForeignDataWrapper, ForeignServer, ForeignTable, UserMapping};
pub use operator::{Operator, OperatorClass, OperatorFamily};
pub use relation::{
    CheckConstraint, Column, ForeignKey, Identity, Index, IndexMethod, PrimaryKey,
    ReferentialAction, Rule, RuleEvent, Sequence, SequenceOwner, Table, Trigger, TriggerEvent,
    TriggerTiming, UniqueConstraint, View,
};
pub use textsearch::{TsConfig, TsDictionary, TsParser, TsTemplate};
pub use types::{Collation, CompositeAttribute, Conversion, Domain, TypeBody, TypeDef};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An access privilege grant. Privilege tokens are lower-case words
/// (`select`, `insert`, `all`, ...); a trailing `*` marks the grant option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Grant {
    pub grantee: String,
    pub privileges: Vec<String>,
}

/// A named schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Schema {
    pub name: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    pub oldname: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Extension {
    pub name: String,
    pub schema: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

/// Object kind tags. `Display` yields the word(s) used in YAML map keys,
/// e.g. `table`, `event trigger`, `text search configuration`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Schema,
    Extension,
    Language,
    Cast,
    Collation,
    Conversion,
    EventTrigger,
    ForeignDataWrapper,
    ForeignServer,
    UserMapping,
    ForeignTable,
    Table,
    Column,
    View,
    MaterializedView,
    Sequence,
    Function,
    Aggregate,
    Operator,
    OperatorClass,
    OperatorFamily,
    Type,
    Domain,
    Trigger,
    Rule,
    TsParser,
    TsDictionary,
    TsTemplate,
    TsConfig,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self {
            ObjectKind::Schema => "schema",
            ObjectKind::Extension => "extension",
            ObjectKind::Language => "language",
            ObjectKind::Cast => "cast",
            ObjectKind::Collation => "collation",
            ObjectKind::Conversion => "conversion",
            ObjectKind::EventTrigger => "event trigger",
            ObjectKind::ForeignDataWrapper => "foreign data wrapper",
            ObjectKind::ForeignServer => "server",
            ObjectKind::UserMapping => "user mapping",
            ObjectKind::ForeignTable => "foreign table",
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::View => "view",
            ObjectKind::MaterializedView => "materialized view",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Function => "function",
            ObjectKind::Aggregate => "aggregate",
            ObjectKind::Operator => "operator",
            ObjectKind::OperatorClass => "operator class",
            ObjectKind::OperatorFamily => "operator family",
            ObjectKind::Type => "type",
            ObjectKind::Domain => "domain",
            ObjectKind::Trigger => "trigger",
            ObjectKind::Rule => "rule",
            ObjectKind::TsParser => "text search parser",
            ObjectKind::TsDictionary => "text search dictionary",
            ObjectKind::TsTemplate => "text search template",
            ObjectKind::TsConfig => "text search configuration",
        };
        f.write_str(word)
    }
}

/// A reference to an object in a model: kind plus external key.
/// Dependency edges are pairs of these.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub key: String,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, key: impl Into<String>) -> Self {
        ObjectRef {
            kind,
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.key)
    }
}

/// The complete in-memory representation of a database schema.
///
/// Maps are keyed by external key. Dependency edges (`depends`) are filled
/// in by the linker after loading; `A -> {B}` means A requires B to exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Database {
    pub schemas: BTreeMap<String, Schema>,
    pub extensions: BTreeMap<String, Extension>,
    pub languages: BTreeMap<String, Language>,
    pub casts: BTreeMap<String, Cast>,
    pub collations: BTreeMap<String, Collation>,
    pub conversions: BTreeMap<String, Conversion>,
    pub event_triggers: BTreeMap<String, EventTrigger>,
    pub fdws: BTreeMap<String, ForeignDataWrapper>,
    pub servers: BTreeMap<String, ForeignServer>,
    pub user_mappings: BTreeMap<String, UserMapping>,
    pub foreign_tables: BTreeMap<String, ForeignTable>,
    pub tables: BTreeMap<String, Table>,
    pub views: BTreeMap<String, View>,
    pub sequences: BTreeMap<String, Sequence>,
    pub functions: BTreeMap<String, Function>,
    pub aggregates: BTreeMap<String, Aggregate>,
    pub operators: BTreeMap<String, Operator>,
    pub operator_classes: BTreeMap<String, OperatorClass>,
    pub operator_families: BTreeMap<String, OperatorFamily>,
    pub types: BTreeMap<String, TypeDef>,
    pub domains: BTreeMap<String, Domain>,
    pub triggers: BTreeMap<String, Trigger>,
    pub rules: BTreeMap<String, Rule>,
    pub ts_parsers: BTreeMap<String, TsParser>,
    pub ts_dictionaries: BTreeMap<String, TsDictionary>,
    pub ts_templates: BTreeMap<String, TsTemplate>,
    pub ts_configs: BTreeMap<String, TsConfig>,
    #[serde(skip)]
    pub depends: BTreeMap<ObjectRef, BTreeSet<ObjectRef>>,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    /// Records a dependency edge `from -> to` ("from requires to").
    pub fn add_edge(&mut self, from: ObjectRef, to: ObjectRef) {
        if from != to {
            self.depends.entry(from).or_default().insert(to);
        }
    }

    pub fn depends_of(&self, r: &ObjectRef) -> Option<&BTreeSet<ObjectRef>> {
        self.depends.get(r)
    }

    /// Looks up which kind, if any, holds an object under `key`.
    /// Used to validate `oldname` directives.
    pub fn kind_of_key(&self, key: &str) -> Option<ObjectKind> {
        macro_rules! probe {
            ($map:ident, $kind:expr) => {
                if self.$map.contains_key(key) {
                    return Some($kind);
                }
            };
        }
        probe!(schemas, ObjectKind::Schema);
        probe!(extensions, ObjectKind::Extension);
        probe!(languages, ObjectKind::Language);
        probe!(casts, ObjectKind::Cast);
        probe!(collations, ObjectKind::Collation);
        probe!(conversions, ObjectKind::Conversion);
        probe!(event_triggers, ObjectKind::EventTrigger);
        probe!(fdws, ObjectKind::ForeignDataWrapper);
        probe!(servers, ObjectKind::ForeignServer);
        probe!(user_mappings, ObjectKind::UserMapping);
        probe!(foreign_tables, ObjectKind::ForeignTable);
        probe!(tables, ObjectKind::Table);
        if let Some(v) = self.views.get(key) {
            return Some(if v.materialized {
                ObjectKind::MaterializedView
            } else {
                ObjectKind::View
            });
        }
        probe!(sequences, ObjectKind::Sequence);
        probe!(functions, ObjectKind::Function);
        probe!(aggregates, ObjectKind::Aggregate);
        probe!(operators, ObjectKind::Operator);
        probe!(operator_classes, ObjectKind::OperatorClass);
        probe!(operator_families, ObjectKind::OperatorFamily);
        probe!(types, ObjectKind::Type);
        probe!(domains, ObjectKind::Domain);
        probe!(triggers, ObjectKind::Trigger);
        probe!(rules, ObjectKind::Rule);
        probe!(ts_parsers, ObjectKind::TsParser);
        probe!(ts_dictionaries, ObjectKind::TsDictionary);
        probe!(ts_templates, ObjectKind::TsTemplate);
        probe!(ts_configs, ObjectKind::TsConfig);
        None
    }

    /// Deterministic digest over the canonical JSON form of the model.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let json = serde_json::to_string(self).expect("model must serialize");
        let hash = Sha256::digest(json.as_bytes());
        hex::encode(hash)
    }
}

/// Creates a qualified name from schema and object name.
/// Used as map keys for schema-aware lookups.
pub fn qualified_name(schema: &str, name: &str) -> String {
    format!("{schema}.{name}")
}

/// Parses a qualified name into a (schema, name) tuple.
/// Defaults to "public" when there is no dot separator.
pub fn parse_qualified_name(qname: &str) -> (String, String) {
    match qname.split_once('.') {
        Some((schema, name)) => (schema.to_string(), name.to_string()),
        None => ("public".to_string(), qname.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_round_trip() {
        assert_eq!(qualified_name("public", "films"), "public.films");
        assert_eq!(
            parse_qualified_name("s1.t2"),
            ("s1".to_string(), "t2".to_string())
        );
        assert_eq!(
            parse_qualified_name("films"),
            ("public".to_string(), "films".to_string())
        );
    }

    #[test]
    fn object_kind_display_matches_yaml_keys() {
        assert_eq!(ObjectKind::Table.to_string(), "table");
        assert_eq!(ObjectKind::EventTrigger.to_string(), "event trigger");
        assert_eq!(
            ObjectKind::TsConfig.to_string(),
            "text search configuration"
        );
        assert_eq!(ObjectKind::MaterializedView.to_string(), "materialized view");
    }

    #[test]
    fn same_model_produces_same_fingerprint() {
        let db1 = Database::new();
        let db2 = Database::new();
        assert_eq!(db1.fingerprint(), db2.fingerprint());

        let mut db3 = Database::new();
        db3.schemas.insert(
            "s1".to_string(),
            Schema {
                name: "s1".to_string(),
                ..Default::default()
            },
        );
        assert_ne!(db1.fingerprint(), db3.fingerprint());
    }

    #[test]
    fn edges_are_deduplicated_and_never_self_referential() {
        let mut db = Database::new();
        let t = ObjectRef::new(ObjectKind::Table, "public.t1");
        let s = ObjectRef::new(ObjectKind::Schema, "public");
        db.add_edge(t.clone(), s.clone());
        db.add_edge(t.clone(), s.clone());
        db.add_edge(t.clone(), t.clone());
        assert_eq!(db.depends_of(&t).unwrap().len(), 1);
    }
}
