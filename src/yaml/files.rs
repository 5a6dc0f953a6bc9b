//! Multiple-files persistence layout.
//!
//! The tree splits the single YAML document into one file per object:
//!
//! - `database.<dbname>.yaml` - index of every file written in the last
//!   run, used to detect and delete stale files,
//! - `<objtype>.<name>.yaml` - non-schema top-level objects,
//! - `schema.<name>.yaml` - schema-level attributes,
//! - `schema.<name>/<objtype>.<name>.yaml` - one file per schema-bound
//!   object.
//!
//! Filenames are lower-cased with non-alphanumerics folded to `_` and
//! truncated; colliding objects are concatenated into the same file, and
//! functions sharing a base name share one file regardless of signature.

use super::load;
use crate::model::Database;
use crate::util::{Result, SchemaError};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MAX_IDENT_LEN_VAR: &str = "PGMIRROR_MAX_IDENT_LEN";
const DEFAULT_MAX_IDENT_LEN: usize = 32;
const HARD_MAX_IDENT_LEN: usize = 63;

/// Filename length limit for munged identifiers.
pub fn max_ident_len() -> usize {
    std::env::var(MAX_IDENT_LEN_VAR)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .map(|v| v.clamp(1, HARD_MAX_IDENT_LEN))
        .unwrap_or(DEFAULT_MAX_IDENT_LEN)
}

/// Lower-case, fold non-alphanumerics (except `_`) to `_`, truncate.
fn munge(ident: &str, max_len: usize) -> String {
    let mut out: String = ident
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    out.truncate(max_len);
    out
}

/// Functions drop their signature so overloads share one file.
fn file_stem(kind: &str, ident: &str, max_len: usize) -> String {
    let base = match ident.find('(') {
        Some(open) if kind == "function" || kind == "aggregate" || kind == "operator" => {
            &ident[..open]
        }
        _ => ident,
    };
    format!("{}.{}", munge(kind, max_len), munge(base, max_len))
}

fn split_key(key: &str) -> (String, String) {
    // Top-level keys were produced by the emitter, so the kind word list
    // in the loader always matches; fall back to the first word.
    for word in load::KIND_WORDS {
        if let Some(rest) = key.strip_prefix(word) {
            if let Some(ident) = rest.strip_prefix(' ') {
                return (word.to_string(), ident.to_string());
            }
        }
    }
    match key.split_once(' ') {
        Some((kind, ident)) => (kind.to_string(), ident.to_string()),
        None => (key.to_string(), String::new()),
    }
}

/// Splits a model into the file tree under `root`, writes every file, and
/// refreshes the index, deleting files the previous run wrote that this
/// run did not.
pub fn write_tree(db: &Database, root: &Path, dbname: &str) -> Result<Vec<PathBuf>> {
    let max_len = max_ident_len();
    let value = super::database_to_value(db);
    let Value::Mapping(top) = value else {
        unreachable!("database_to_value always yields a mapping");
    };

    // Relative path -> accumulated sections (collisions concatenate).
    let mut contents: BTreeMap<PathBuf, Mapping> = BTreeMap::new();

    for (key, entry) in top {
        let key_text = key.as_str().expect("emitter writes string keys").to_string();
        let (kind, ident) = split_key(&key_text);
        if kind == "schema" {
            let schema_dir = PathBuf::from(format!("schema.{}", munge(&ident, max_len)));
            let mut schema_attrs = Mapping::new();
            let Value::Mapping(entry) = entry else {
                continue;
            };
            for (child_key, child_value) in entry {
                let child_text = child_key.as_str().expect("string keys").to_string();
                match load::split_kind(&child_text) {
                    Some((child_kind, child_ident)) => {
                        let stem = file_stem(child_kind, &child_ident, max_len);
                        let path = schema_dir.join(format!("{stem}.yaml"));
                        contents
                            .entry(path)
                            .or_default()
                            .insert(Value::String(child_text), child_value);
                    }
                    None => {
                        schema_attrs.insert(Value::String(child_text), child_value);
                    }
                }
            }
            let schema_file = PathBuf::from(format!("schema.{}.yaml", munge(&ident, max_len)));
            contents
                .entry(schema_file)
                .or_default()
                .insert(key, Value::Mapping(schema_attrs));
        } else {
            let stem = file_stem(&kind, &ident, max_len);
            let path = PathBuf::from(format!("{stem}.yaml"));
            contents.entry(path).or_default().insert(key, entry);
        }
    }

    std::fs::create_dir_all(root)?;

    let mut written: Vec<PathBuf> = Vec::new();
    for (rel_path, mapping) in &contents {
        let full = root.join(rel_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_yaml::to_string(&Value::Mapping(mapping.clone()))
            .map_err(|e| SchemaError::Io(e.to_string()))?;
        std::fs::write(&full, text)?;
        written.push(rel_path.clone());
    }

    // Stale files from the previous run are removed via the old index.
    let index_path = root.join(format!("database.{dbname}.yaml"));
    if let Ok(old) = std::fs::read_to_string(&index_path) {
        if let Ok(Value::Mapping(old_map)) = serde_yaml::from_str::<Value>(&old) {
            if let Some(Value::Sequence(old_files)) = old_map.get(&Value::String("files".into())) {
                for old_file in old_files {
                    if let Some(rel) = old_file.as_str() {
                        let rel = PathBuf::from(rel);
                        if !written.contains(&rel) {
                            let _ = std::fs::remove_file(root.join(&rel));
                        }
                    }
                }
            }
        }
    }

    let mut index = Mapping::new();
    index.insert(
        Value::String("files".to_string()),
        Value::Sequence(
            written
                .iter()
                .map(|p| Value::String(p.to_string_lossy().into_owned()))
                .collect(),
        ),
    );
    let index_text = serde_yaml::to_string(&Value::Mapping(index))
        .map_err(|e| SchemaError::Io(e.to_string()))?;
    std::fs::write(&index_path, index_text)?;

    Ok(written)
}

/// Loads a model back from a file tree produced by [`write_tree`].
pub fn read_tree(root: &Path) -> Result<Database> {
    let mut db = Database::new();

    // Root-level files first: schemas and non-schema top-level objects.
    // Directory names are munged, so remember which real schema each
    // directory belongs to.
    let mut dir_to_schema: BTreeMap<String, String> = BTreeMap::new();

    let pattern = root.join("*.yaml");
    let pattern = pattern.to_string_lossy().into_owned();
    for entry in glob::glob(&pattern).map_err(|e| SchemaError::Io(e.to_string()))? {
        let path = entry.map_err(|e| SchemaError::Io(e.to_string()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_name.starts_with("database.") {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        let value: Value = serde_yaml::from_str(&text)
            .map_err(|e| SchemaError::yaml(file_name.clone(), e.to_string()))?;
        let Value::Mapping(map) = value else {
            return Err(SchemaError::yaml(file_name, "expected a mapping"));
        };
        for (key, entry_value) in &map {
            let key_text = key
                .as_str()
                .ok_or_else(|| SchemaError::yaml(file_name.clone(), "keys must be strings"))?;
            load::merge_top_level(&mut db, key_text, entry_value)?;
            if let Some(schema_name) = key_text.strip_prefix("schema ") {
                let max_len = max_ident_len();
                dir_to_schema.insert(
                    format!("schema.{}", munge(schema_name, max_len)),
                    schema_name.to_string(),
                );
            }
        }
    }

    // Then each schema directory.
    let pattern = root.join("schema.*/*.yaml");
    let pattern = pattern.to_string_lossy().into_owned();
    for entry in glob::glob(&pattern).map_err(|e| SchemaError::Io(e.to_string()))? {
        let path = entry.map_err(|e| SchemaError::Io(e.to_string()))?;
        let dir_name = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let schema_name = dir_to_schema.get(&dir_name).cloned().ok_or_else(|| {
            SchemaError::yaml(
                dir_name.clone(),
                "directory has no matching schema.<name>.yaml file",
            )
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = std::fs::read_to_string(&path)?;
        let value: Value = serde_yaml::from_str(&text)
            .map_err(|e| SchemaError::yaml(file_name.clone(), e.to_string()))?;
        let Value::Mapping(map) = value else {
            return Err(SchemaError::yaml(file_name, "expected a mapping"));
        };
        for (key, entry_value) in &map {
            let key_text = key
                .as_str()
                .ok_or_else(|| SchemaError::yaml(file_name.clone(), "keys must be strings"))?;
            load::merge_schema_entry(&mut db, &schema_name, key_text, entry_value)?;
        }
    }

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn munge_folds_and_truncates() {
        assert_eq!(munge("Films & Reviews", 32), "films___reviews");
        assert_eq!(munge("café", 32), "caf_");
        assert_eq!(munge("a_very_long_identifier_name", 10), "a_very_lon");
    }

    #[test]
    fn function_files_drop_signatures() {
        assert_eq!(file_stem("function", "foo(integer, text)", 32), "function.foo");
        assert_eq!(file_stem("function", "foo(bigint)", 32), "function.foo");
        assert_eq!(file_stem("table", "films", 32), "table.films");
    }

    #[test]
    fn kind_words_with_spaces_munge_into_filenames() {
        assert_eq!(
            file_stem("foreign data wrapper", "files", 32),
            "foreign_data_wrapper.files"
        );
    }
}
