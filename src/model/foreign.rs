//! Foreign-data objects: wrappers, servers, user mappings and foreign
//! tables.

use super::{qualified_name, Column, Grant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ForeignDataWrapper {
    pub name: String,
    pub handler: Option<String>,
    pub validator: Option<String>,
    /// Options rendered as `name=value`.
    pub options: Vec<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ForeignServer {
    pub name: String,
    pub wrapper: String,
    pub server_type: Option<String>,
    pub version: Option<String>,
    pub options: Vec<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserMapping {
    pub user: String,
    pub server: String,
    pub options: Vec<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl UserMapping {
    /// Keyed `user@server` since neither part is unique by itself.
    pub fn key(&self) -> String {
        format!("{}@{}", self.user, self.server)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ForeignTable {
    pub schema: String,
    pub name: String,
    pub server: String,
    pub columns: Vec<Column>,
    pub options: Vec<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl ForeignTable {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_mapping_key_combines_user_and_server() {
        let um = UserMapping {
            user: "alice".into(),
            server: "files".into(),
            options: vec![],
            oid: None,
        };
        assert_eq!(um.key(), "alice@files");
    }
}
