//! Full-text search objects.

use super::qualified_name;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TsParser {
    pub schema: String,
    pub name: String,
    pub start: String,
    pub gettoken: String,
    pub end: String,
    pub lextypes: String,
    pub headline: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl TsParser {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TsDictionary {
    pub schema: String,
    pub name: String,
    pub template: String,
    pub options: Option<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl TsDictionary {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TsTemplate {
    pub schema: String,
    pub name: String,
    pub init: Option<String>,
    pub lexize: String,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl TsTemplate {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TsConfig {
    pub schema: String,
    pub name: String,
    pub parser: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl TsConfig {
    pub fn qualified(&self) -> String {
        qualified_name(&self.schema, &self.name)
    }
}
