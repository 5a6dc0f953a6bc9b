//! Configuration loading.
//!
//! Settings merge bottom-up: built-in defaults, then the system config
//! (`PGMIRROR_SYS_CONFIG`), the user config (`PGMIRROR_USER_CONFIG` or
//! `$HOME/.config/pgmirror/config.yaml`), the repository config (under
//! `-r`), and finally an explicit `-c` file. `PGMIRROR_CONFIG_FILE`
//! overrides the default config filename. Unknown top-level sections are
//! a configuration error.

use crate::util::{Result, SchemaError};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_VAR: &str = "PGMIRROR_CONFIG_FILE";
pub const SYS_CONFIG_VAR: &str = "PGMIRROR_SYS_CONFIG";
pub const USER_CONFIG_VAR: &str = "PGMIRROR_USER_CONFIG";

const SECTIONS: &[&str] = &["augmenter", "database", "files"];

#[derive(Debug, Clone, Default)]
pub struct Config {
    merged: Mapping,
}

fn config_file_name() -> String {
    std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| "config.yaml".to_string())
}

impl Config {
    /// Loads and merges every applicable config layer.
    pub fn load(repo: Option<&Path>, explicit: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();

        if let Ok(sys_dir) = std::env::var(SYS_CONFIG_VAR) {
            config.merge_file(&PathBuf::from(sys_dir).join(config_file_name()), false)?;
        }
        let user_path = match std::env::var(USER_CONFIG_VAR) {
            Ok(dir) => Some(PathBuf::from(dir).join(config_file_name())),
            Err(_) => std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("pgmirror")
                    .join(config_file_name())
            }),
        };
        if let Some(path) = user_path {
            config.merge_file(&path, false)?;
        }
        if let Some(repo) = repo {
            config.merge_file(&repo.join(config_file_name()), false)?;
        }
        if let Some(path) = explicit {
            config.merge_file(path, true)?;
        }
        Ok(config)
    }

    /// Merges one file over the current state. Missing files are skipped
    /// unless `required` (an explicit `-c` path must exist).
    fn merge_file(&mut self, path: &Path, required: bool) -> Result<()> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) if !required => return Ok(()),
            Err(e) => {
                return Err(SchemaError::Config(format!(
                    "cannot read config file {}: {e}",
                    path.display()
                )))
            }
        };
        let value: Value = serde_yaml::from_str(&text).map_err(|e| {
            SchemaError::Config(format!("bad config file {}: {e}", path.display()))
        })?;
        let Value::Mapping(map) = value else {
            return Err(SchemaError::Config(format!(
                "config file {} must be a mapping",
                path.display()
            )));
        };
        for (key, entry) in map {
            let Some(key_text) = key.as_str() else {
                return Err(SchemaError::Config("config keys must be strings".into()));
            };
            if !SECTIONS.contains(&key_text) {
                return Err(SchemaError::Config(format!(
                    "unknown config section '{key_text}' in {}",
                    path.display()
                )));
            }
            merge_value(&mut self.merged, Value::String(key_text.to_string()), entry);
        }
        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.merged.get(&Value::String(name.to_string()))
    }

    /// `files.path`: default root for multiple-files mode.
    pub fn files_path(&self) -> Option<PathBuf> {
        self.section("files")
            .and_then(|f| f.get("path"))
            .and_then(|p| p.as_str())
            .map(PathBuf::from)
    }
}

/// Mappings merge recursively; scalars and lists replace.
fn merge_value(target: &mut Mapping, key: Value, value: Value) {
    match value {
        Value::Mapping(incoming) => {
            if let Some(Value::Mapping(existing)) = target.get_mut(&key) {
                for (k, v) in incoming {
                    merge_value(existing, k, v);
                }
                return;
            }
            target.insert(key, Value::Mapping(incoming));
        }
        other => {
            target.insert(key, other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_merge_overrides_scalars_and_keeps_siblings() {
        let mut base = Mapping::new();
        let lower: Value =
            serde_yaml::from_str("files:\n  path: /a\n  keep: yes\n").unwrap();
        let upper: Value = serde_yaml::from_str("files:\n  path: /b\n").unwrap();
        if let Value::Mapping(m) = lower {
            for (k, v) in m {
                merge_value(&mut base, k, v);
            }
        }
        if let Value::Mapping(m) = upper {
            for (k, v) in m {
                merge_value(&mut base, k, v);
            }
        }
        let files = base.get(&Value::String("files".into())).unwrap();
        assert_eq!(files.get("path").unwrap().as_str(), Some("/b"));
        assert_eq!(files.get("keep").unwrap().as_bool(), Some(true));
    }
}
