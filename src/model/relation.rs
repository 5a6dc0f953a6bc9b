//! Relations and their children: tables, columns, constraints, indexes,
//! views, sequences, triggers, and rewrite rules.

use super::{qualified_name, Grant};
use crate::util::expressions_equal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Table {
    pub schema: String,
    pub name: String,
    /// Catalog order is significant and preserved.
    pub columns: Vec<Column>,
    pub primary_key: Option<PrimaryKey>,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub check_constraints: Vec<CheckConstraint>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<Index>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    pub tablespace: Option<String>,
    /// Storage parameters, each rendered as `name=value`.
    pub options: Vec<String>,
    pub unlogged: bool,
    pub inherits: Vec<String>,
    /// `pg_get_partkeydef` text for a partitioned parent.
    pub partition_by: Option<String>,
    /// Parent qualified name and bound expression for a partition child.
    pub partition_of: Option<String>,
    pub partition_bound: Option<String>,
    pub oldname: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Table {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub collation: Option<String>,
    pub identity: Option<Identity>,
    pub statistics: Option<i32>,
    pub storage: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    pub oldname: Option<String>,
    /// Inherited columns are reported by the catalog but not re-emitted on
    /// partition children.
    #[serde(skip)]
    pub inherited: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Identity {
    Always,
    ByDefault,
}

impl Identity {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Identity::Always => "GENERATED ALWAYS AS IDENTITY",
            Identity::ByDefault => "GENERATED BY DEFAULT AS IDENTITY",
        }
    }

    pub fn as_word(&self) -> &'static str {
        match self {
            Identity::Always => "always",
            Identity::ByDefault => "by default",
        }
    }

    pub fn parse(word: &str) -> Option<Identity> {
        match word {
            "always" | "a" => Some(Identity::Always),
            "by default" | "d" => Some(Identity::ByDefault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PrimaryKey {
    pub name: String,
    pub columns: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct UniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CheckConstraint {
    pub name: String,
    pub expression: String,
    pub columns: Vec<String>,
    pub description: Option<String>,
}

impl CheckConstraint {
    pub fn semantically_equals(&self, other: &CheckConstraint) -> bool {
        self.name == other.name && expressions_equal(&self.expression, &other.expression)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub description: Option<String>,
}

impl ForeignKey {
    pub fn referenced(&self) -> String {
        qualified_name(&self.ref_schema, &self.ref_table)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }

    pub fn as_word(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "no action",
            ReferentialAction::Restrict => "restrict",
            ReferentialAction::Cascade => "cascade",
            ReferentialAction::SetNull => "set null",
            ReferentialAction::SetDefault => "set default",
        }
    }

    pub fn parse(word: &str) -> Option<ReferentialAction> {
        match word {
            "no action" | "a" => Some(ReferentialAction::NoAction),
            "restrict" | "r" => Some(ReferentialAction::Restrict),
            "cascade" | "c" => Some(ReferentialAction::Cascade),
            "set null" | "n" => Some(ReferentialAction::SetNull),
            "set default" | "d" => Some(ReferentialAction::SetDefault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Index {
    pub name: String,
    /// Key columns when the index is plain. An index mixing expressions and
    /// columns keeps the full `pg_get_indexdef` text in `definition` and
    /// that text wins on emission.
    pub columns: Vec<String>,
    pub definition: Option<String>,
    pub unique: bool,
    pub method: IndexMethod,
    pub predicate: Option<String>,
    pub tablespace: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum IndexMethod {
    #[default]
    BTree,
    Hash,
    Gin,
    Gist,
    SpGist,
    Brin,
}

impl IndexMethod {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IndexMethod::BTree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Gin => "gin",
            IndexMethod::Gist => "gist",
            IndexMethod::SpGist => "spgist",
            IndexMethod::Brin => "brin",
        }
    }

    pub fn parse(word: &str) -> Option<IndexMethod> {
        match word {
            "btree" => Some(IndexMethod::BTree),
            "hash" => Some(IndexMethod::Hash),
            "gin" => Some(IndexMethod::Gin),
            "gist" => Some(IndexMethod::Gist),
            "spgist" => Some(IndexMethod::SpGist),
            "brin" => Some(IndexMethod::Brin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct View {
    pub schema: String,
    pub name: String,
    pub definition: String,
    pub materialized: bool,
    /// Materialized views only: populated with data on creation.
    pub with_data: bool,
    pub columns: Vec<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    /// Qualified names of relations and functions the definition uses,
    /// resolved into graph edges by the linker.
    pub depends_on: Vec<String>,
    pub oldname: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl View {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }

    pub fn semantically_equals(&self, other: &View) -> bool {
        self.schema == other.schema
            && self.name == other.name
            && self.materialized == other.materialized
            && expressions_equal(&self.definition, &other.definition)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct SequenceOwner {
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Sequence {
    pub schema: String,
    pub name: String,
    pub data_type: Option<String>,
    pub start: Option<i64>,
    pub increment: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub cache: Option<i64>,
    pub cycle: bool,
    pub owned_by: Option<SequenceOwner>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    pub oldname: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Sequence {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::After => "AFTER",
            TriggerTiming::InsteadOf => "INSTEAD OF",
        }
    }

    pub fn as_word(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "before",
            TriggerTiming::After => "after",
            TriggerTiming::InsteadOf => "instead of",
        }
    }

    pub fn parse(word: &str) -> Option<TriggerTiming> {
        match word {
            "before" => Some(TriggerTiming::Before),
            "after" => Some(TriggerTiming::After),
            "instead of" => Some(TriggerTiming::InsteadOf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
    Truncate,
}

impl TriggerEvent {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
            TriggerEvent::Truncate => "TRUNCATE",
        }
    }

    pub fn as_word(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "insert",
            TriggerEvent::Update => "update",
            TriggerEvent::Delete => "delete",
            TriggerEvent::Truncate => "truncate",
        }
    }

    pub fn parse(word: &str) -> Option<TriggerEvent> {
        match word {
            "insert" => Some(TriggerEvent::Insert),
            "update" => Some(TriggerEvent::Update),
            "delete" => Some(TriggerEvent::Delete),
            "truncate" => Some(TriggerEvent::Truncate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Trigger {
    pub name: String,
    pub target_schema: String,
    pub target_name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub update_columns: Vec<String>,
    pub for_each_row: bool,
    pub when_clause: Option<String>,
    pub function_schema: String,
    pub function_name: String,
    pub function_args: Vec<String>,
    pub description: Option<String>,
}

impl Trigger {
    /// Triggers are keyed by `schema.table.name`.
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.target_schema, self.target_name, self.name)
    }

    pub fn target(&self) -> String {
        qualified_name(&self.target_schema, &self.target_name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleEvent {
    Select,
    Insert,
    Update,
    Delete,
}

impl RuleEvent {
    pub fn as_sql(&self) -> &'static str {
        match self {
            RuleEvent::Select => "SELECT",
            RuleEvent::Insert => "INSERT",
            RuleEvent::Update => "UPDATE",
            RuleEvent::Delete => "DELETE",
        }
    }

    pub fn as_word(&self) -> &'static str {
        match self {
            RuleEvent::Select => "select",
            RuleEvent::Insert => "insert",
            RuleEvent::Update => "update",
            RuleEvent::Delete => "delete",
        }
    }

    pub fn parse(word: &str) -> Option<RuleEvent> {
        match word {
            "select" => Some(RuleEvent::Select),
            "insert" => Some(RuleEvent::Insert),
            "update" => Some(RuleEvent::Update),
            "delete" => Some(RuleEvent::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rule {
    pub name: String,
    pub target_schema: String,
    pub target_name: String,
    pub event: RuleEvent,
    pub instead: bool,
    pub condition: Option<String>,
    pub actions: String,
    pub description: Option<String>,
}

impl Rule {
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.target_schema, self.target_name, self.name)
    }

    pub fn target(&self) -> String {
        qualified_name(&self.target_schema, &self.target_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_column_lookup_is_by_name() {
        let mut t = Table {
            schema: "public".into(),
            name: "t1".into(),
            ..Default::default()
        };
        t.columns.push(Column::new("c1", "integer"));
        t.columns.push(Column::new("c2", "text"));
        assert_eq!(t.column("c2").unwrap().data_type, "text");
        assert!(t.column("c3").is_none());
        assert_eq!(t.column_names(), vec!["c1", "c2"]);
    }

    #[test]
    fn check_constraint_equality_ignores_whitespace() {
        let a = CheckConstraint {
            name: "t1_c2_check".into(),
            expression: "(c2 > 123)".into(),
            ..Default::default()
        };
        let b = CheckConstraint {
            name: "t1_c2_check".into(),
            expression: "( c2  >  123 )".into(),
            ..Default::default()
        };
        assert!(a.semantically_equals(&b));
    }

    #[test]
    fn referential_action_words_round_trip() {
        for action in [
            ReferentialAction::NoAction,
            ReferentialAction::Restrict,
            ReferentialAction::Cascade,
            ReferentialAction::SetNull,
            ReferentialAction::SetDefault,
        ] {
            assert_eq!(ReferentialAction::parse(action.as_word()), Some(action));
        }
    }

    #[test]
    fn trigger_key_includes_target() {
        let trg = Trigger {
            name: "audit".into(),
            target_schema: "public".into(),
            target_name: "films".into(),
            timing: TriggerTiming::Before,
            events: vec![TriggerEvent::Update],
            update_columns: vec![],
            for_each_row: true,
            when_clause: None,
            function_schema: "public".into(),
            function_name: "audit_fn".into(),
            function_args: vec![],
            description: None,
        };
        assert_eq!(trg.key(), "public.films.audit");
    }
}
