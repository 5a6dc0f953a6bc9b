//! Operators and their index-support catalogs.

use super::qualified_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Operator {
    pub schema: String,
    pub name: String,
    pub leftarg: Option<String>,
    pub rightarg: Option<String>,
    pub procedure: String,
    pub commutator: Option<String>,
    pub negator: Option<String>,
    pub restrict: Option<String>,
    pub join: Option<String>,
    pub hashes: bool,
    pub merges: bool,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Operator {
    /// Operators are keyed `schema.name(left, right)`; a missing operand
    /// side is written `NONE`.
    pub fn key(&self) -> String {
        let left = self.leftarg.as_deref().unwrap_or("NONE");
        let right = self.rightarg.as_deref().unwrap_or("NONE");
        qualified_name(&self.schema, &format!("{}({}, {})", self.name, left, right))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OperatorClass {
    pub schema: String,
    pub name: String,
    pub index_method: String,
    pub for_type: String,
    pub default: bool,
    pub family: Option<String>,
    /// Strategy number to operator name.
    pub operators: BTreeMap<i16, String>,
    /// Support number to function signature.
    pub functions: BTreeMap<i16, String>,
    pub storage: Option<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl OperatorClass {
    /// Keyed `schema.name using method`.
    pub fn key(&self) -> String {
        qualified_name(
            &self.schema,
            &format!("{} using {}", self.name, self.index_method),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OperatorFamily {
    pub schema: String,
    pub name: String,
    pub index_method: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl OperatorFamily {
    pub fn key(&self) -> String {
        qualified_name(
            &self.schema,
            &format!("{} using {}", self.name, self.index_method),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_key_marks_missing_operand() {
        let op = Operator {
            schema: "public".into(),
            name: "!".into(),
            leftarg: Some("bigint".into()),
            rightarg: None,
            procedure: "factorial".into(),
            ..Default::default()
        };
        assert_eq!(op.key(), "public.!(bigint, NONE)");
    }

    #[test]
    fn operator_class_key_includes_method() {
        let oc = OperatorClass {
            schema: "public".into(),
            name: "int4_ops".into(),
            index_method: "btree".into(),
            for_type: "integer".into(),
            ..Default::default()
        };
        assert_eq!(oc.key(), "public.int4_ops using btree");
    }
}
