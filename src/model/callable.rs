//! Callable and executable objects: functions, aggregates, procedural
//! languages, casts, and event triggers.

use super::{qualified_name, Grant};
use crate::util::expressions_equal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Function {
    pub schema: String,
    pub name: String,
    /// Printable argument list, e.g. `a integer, b text DEFAULT 'x'`.
    pub arguments: String,
    /// Identity argument type list, e.g. `integer, text`. Part of the key.
    pub argtypes: String,
    pub returns: String,
    pub language: String,
    pub source: String,
    pub volatility: Volatility,
    pub security_definer: bool,
    pub strict: bool,
    pub leakproof: bool,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    pub depends_on: Vec<String>,
    pub oldname: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Function {
    /// `name(argtypes)`, the unqualified signature.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.argtypes)
    }

    /// `schema.name(argtypes)`, the external key.
    pub fn key(&self) -> String {
        qualified_name(&self.schema, &self.signature())
    }

    /// Compares two functions ignoring whitespace differences in source.
    pub fn semantically_equals(&self, other: &Function) -> bool {
        self.schema == other.schema
            && self.name == other.name
            && self.argtypes == other.argtypes
            && self.returns == other.returns
            && self.language == other.language
            && self.volatility == other.volatility
            && self.security_definer == other.security_definer
            && self.strict == other.strict
            && self.leakproof == other.leakproof
            && normalize_body(&self.source) == normalize_body(&other.source)
    }
}

fn normalize_body(body: &str) -> String {
    strip_dollar_quotes(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips dollar-quote delimiters from a function body.
/// Handles both `$$...$$` and `$tag$...$tag$` formats.
fn strip_dollar_quotes(body: &str) -> String {
    let trimmed = body.trim();
    if !trimmed.starts_with('$') {
        return body.to_string();
    }
    if let Some(tag_end) = trimmed[1..].find('$') {
        let tag = &trimmed[..=tag_end + 1];
        if let Some(content) = trimmed.strip_prefix(tag) {
            if let Some(inner) = content.strip_suffix(tag) {
                return inner.to_string();
            }
        }
    }
    body.to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Volatility {
    Immutable,
    Stable,
    #[default]
    Volatile,
}

impl Volatility {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Volatility::Immutable => "IMMUTABLE",
            Volatility::Stable => "STABLE",
            Volatility::Volatile => "VOLATILE",
        }
    }

    pub fn as_word(&self) -> &'static str {
        match self {
            Volatility::Immutable => "immutable",
            Volatility::Stable => "stable",
            Volatility::Volatile => "volatile",
        }
    }

    pub fn parse(word: &str) -> Option<Volatility> {
        match word {
            "immutable" | "i" => Some(Volatility::Immutable),
            "stable" | "s" => Some(Volatility::Stable),
            "volatile" | "v" => Some(Volatility::Volatile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Aggregate {
    pub schema: String,
    pub name: String,
    pub argtypes: String,
    pub sfunc: String,
    pub stype: String,
    pub finalfunc: Option<String>,
    pub combinefunc: Option<String>,
    pub initcond: Option<String>,
    pub sortop: Option<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Aggregate {
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.argtypes)
    }

    pub fn key(&self) -> String {
        qualified_name(&self.schema, &self.signature())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Language {
    pub name: String,
    pub trusted: bool,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub privileges: Vec<Grant>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CastContext {
    #[default]
    Explicit,
    Assignment,
    Implicit,
}

impl CastContext {
    pub fn as_word(&self) -> &'static str {
        match self {
            CastContext::Explicit => "explicit",
            CastContext::Assignment => "assignment",
            CastContext::Implicit => "implicit",
        }
    }

    pub fn parse(word: &str) -> Option<CastContext> {
        match word {
            "explicit" | "e" => Some(CastContext::Explicit),
            "assignment" | "a" => Some(CastContext::Assignment),
            "implicit" | "i" => Some(CastContext::Implicit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CastMethod {
    #[default]
    Function,
    Inout,
    Binary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Cast {
    pub source: String,
    pub target: String,
    pub function: Option<String>,
    pub context: CastContext,
    pub method: CastMethod,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

impl Cast {
    /// Casts are keyed `(source AS target)`.
    pub fn key(&self) -> String {
        format!("({} AS {})", self.source, self.target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventTrigger {
    pub name: String,
    pub event: String,
    pub tags: Vec<String>,
    pub procedure: String,
    pub enabled: bool,
    pub owner: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub oid: Option<u32>,
}

/// Compares optional expressions such as aggregate initial conditions.
pub fn optional_exprs_equal(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => expressions_equal(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_key_includes_arg_types() {
        let f = Function {
            schema: "public".into(),
            name: "foo".into(),
            arguments: "a integer, b text".into(),
            argtypes: "integer, text".into(),
            ..Default::default()
        };
        assert_eq!(f.signature(), "foo(integer, text)");
        assert_eq!(f.key(), "public.foo(integer, text)");
    }

    #[test]
    fn strip_dollar_quotes_variants() {
        assert_eq!(strip_dollar_quotes("$$BEGIN END;$$"), "BEGIN END;");
        assert_eq!(strip_dollar_quotes("$fn$SELECT 1$fn$"), "SELECT 1");
        assert_eq!(strip_dollar_quotes("BEGIN END;"), "BEGIN END;");
    }

    #[test]
    fn semantic_equality_ignores_source_whitespace() {
        let mut a = Function {
            schema: "public".into(),
            name: "f".into(),
            returns: "integer".into(),
            language: "sql".into(),
            source: "SELECT 1 + 1".into(),
            ..Default::default()
        };
        let mut b = a.clone();
        b.source = "$$SELECT\n  1 + 1$$".into();
        assert!(a.semantically_equals(&b));
        a.volatility = Volatility::Immutable;
        assert!(!a.semantically_equals(&b));
    }

    #[test]
    fn cast_key_format() {
        let c = Cast {
            source: "text".into(),
            target: "integer".into(),
            ..Default::default()
        };
        assert_eq!(c.key(), "(text AS integer)");
    }
}
