//! User-defined types: enums, composites, ranges, base types, domains,
//! collations and encoding conversions.

use super::{qualified_name, CheckConstraint, Grant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeDef {
    pub schema: String,
    pub name: String,
    pub body: TypeBody,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    pub oldname: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl TypeDef {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

/// One variant per `pg_type.typtype` the model covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TypeBody {
    Enum {
        values: Vec<String>,
    },
    Composite {
        attributes: Vec<CompositeAttribute>,
    },
    Range {
        subtype: String,
        subtype_opclass: Option<String>,
        collation: Option<String>,
        canonical: Option<String>,
        subtype_diff: Option<String>,
    },
    Base {
        input: String,
        output: String,
        receive: Option<String>,
        send: Option<String>,
        internallength: Option<String>,
        alignment: Option<String>,
        storage: Option<String>,
        category: Option<String>,
        preferred: bool,
        delimiter: Option<String>,
        element: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CompositeAttribute {
    pub name: String,
    pub data_type: String,
    pub collation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Domain {
    pub schema: String,
    pub name: String,
    pub base_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub check_constraints: Vec<CheckConstraint>,
    pub collation: Option<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    pub oldname: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Domain {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Collation {
    pub schema: String,
    pub name: String,
    pub lc_collate: String,
    pub lc_ctype: String,
    pub provider: Option<String>,
    pub deterministic: bool,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Collation {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Conversion {
    pub schema: String,
    pub name: String,
    pub source_encoding: String,
    pub dest_encoding: String,
    pub function: String,
    pub default: bool,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Conversion {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_type_holds_ordered_labels() {
        let t = TypeDef {
            schema: "public".into(),
            name: "mood".into(),
            body: TypeBody::Enum {
                values: vec!["sad".into(), "ok".into(), "happy".into()],
            },
            owner: None,
            description: None,
            privileges: vec![],
            oldname: None,
            oid: None,
        };
        assert_eq!(t.qualified(), "public.mood");
        match &t.body {
            TypeBody::Enum { values } => assert_eq!(values[1], "ok"),
            _ => panic!("expected enum body"),
        }
    }

    #[test]
    fn domain_carries_check_constraints() {
        let d = Domain {
            schema: "public".into(),
            name: "posint".into(),
            base_type: "integer".into(),
            check_constraints: vec![CheckConstraint {
                name: "posint_check".into(),
                expression: "(VALUE > 0)".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(d.check_constraints.len(), 1);
        assert_eq!(d.qualified(), "public.posint");
    }
}
