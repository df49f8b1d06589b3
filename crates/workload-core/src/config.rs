use std::{fs, path::Path, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use workload_schema::PROJECT_DATA_KEY;
use workload_store::{FileSlots, MemorySlots, SlotStorage, SqliteSlots};

pub const CONFIG_FILE: &str = "workload.yaml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
    Memory,
    /// No persistent storage: state lives only in memory.
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory (file) or database file (sqlite). Relative paths are
    /// resolved against the config root.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_store_key() -> String {
    PROJECT_DATA_KEY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_store_key")]
    pub store_key: String,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            store_key: default_store_key(),
        }
    }
}

impl WorkloadConfig {
    /// Where the configured backend keeps its data, if anywhere.
    pub fn storage_path(&self, root: &Path) -> Option<PathBuf> {
        let configured = self.storage.path.as_deref().map(PathBuf::from);
        let path = match self.storage.backend {
            StorageBackend::File => configured.unwrap_or_else(|| PathBuf::from("data")),
            StorageBackend::Sqlite => {
                configured.unwrap_or_else(|| PathBuf::from("data").join("workload.db"))
            }
            StorageBackend::Memory | StorageBackend::None => return None,
        };
        Some(if path.is_absolute() {
            path
        } else {
            root.join(path)
        })
    }

    /// Open the configured slot backend. `None` means no persistent storage.
    pub fn open_slots(&self, root: &Path) -> Result<Option<Arc<dyn SlotStorage>>> {
        let slots: Arc<dyn SlotStorage> = match self.storage.backend {
            StorageBackend::None => return Ok(None),
            StorageBackend::Memory => Arc::new(MemorySlots::new()),
            StorageBackend::File => {
                let dir = self
                    .storage_path(root)
                    .ok_or_else(|| anyhow!("file backend has no path"))?;
                Arc::new(FileSlots::new(dir))
            }
            StorageBackend::Sqlite => {
                let db = self
                    .storage_path(root)
                    .ok_or_else(|| anyhow!("sqlite backend has no path"))?;
                let slots = SqliteSlots::open(&db)
                    .with_context(|| format!("failed to open slot database: {}", db.display()))?;
                Arc::new(slots)
            }
        };
        Ok(Some(slots))
    }
}

/// Expand `${VAR}` placeholders from the environment. Unset variables
/// expand to nothing; an unterminated `${` is kept as written.
pub fn expand_env_placeholders(raw: &str) -> String {
    let mut expanded = String::with_capacity(raw.len());
    let mut pieces = raw.split("${");
    if let Some(head) = pieces.next() {
        expanded.push_str(head);
    }

    for piece in pieces {
        match piece.split_once('}') {
            Some((name, tail)) => {
                if let Ok(value) = std::env::var(name) {
                    expanded.push_str(&value);
                }
                expanded.push_str(tail);
            }
            None => {
                expanded.push_str("${");
                expanded.push_str(piece);
            }
        }
    }

    expanded
}

/// Load `workload.yaml` from `config_dir`; a missing file means defaults.
pub fn load_config(config_dir: &Path) -> Result<WorkloadConfig> {
    let path = config_dir.join(CONFIG_FILE);
    let mut config = if path.exists() {
        read_workload_config(&path)?
    } else {
        WorkloadConfig::default()
    };

    if let Some(raw) = &config.storage.path {
        config.storage.path = Some(expand_env_placeholders(raw));
    }

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &WorkloadConfig) -> Result<()> {
    if config.store_key.trim().is_empty() {
        return Err(anyhow!("store_key must not be empty"));
    }

    match config.storage.backend {
        StorageBackend::Memory | StorageBackend::None if config.storage.path.is_some() => {
            return Err(anyhow!(
                "storage.path is not used by the {:?} backend",
                config.storage.backend
            ));
        }
        _ => {}
    }

    Ok(())
}

fn read_workload_config(path: &Path) -> Result<WorkloadConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read workload config: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("invalid workload config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path()).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.store_key, PROJECT_DATA_KEY);
        assert_eq!(
            config.storage_path(Path::new("/srv/workload")),
            Some(PathBuf::from("/srv/workload/data"))
        );
    }

    #[test]
    fn parses_sqlite_backend_with_env_path() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("WORKLOAD_TEST_DB_DIR", "/var/lib/workload");
        fs::write(
            dir.path().join(CONFIG_FILE),
            "storage:\n  backend: sqlite\n  path: ${WORKLOAD_TEST_DB_DIR}/slots.db\nstore_key: team_a\n",
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.store_key, "team_a");
        assert_eq!(
            config.storage_path(Path::new("/ignored")),
            Some(PathBuf::from("/var/lib/workload/slots.db"))
        );
    }

    #[test]
    fn rejects_empty_store_key() {
        let config = WorkloadConfig {
            store_key: "  ".into(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_path_on_memory_backend() {
        let config = WorkloadConfig {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                path: Some("data".into()),
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_path_on_none_backend() {
        let config = WorkloadConfig {
            storage: StorageConfig {
                backend: StorageBackend::None,
                path: Some("data".into()),
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("None"));
    }

    #[test]
    fn rejects_path_in_yaml_for_none_backend() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "storage:\n  backend: none\n  path: data\n",
        )
        .unwrap();
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn unparsable_yaml_names_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "storage: [not, a, map\n").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(err.to_string().contains("invalid workload config"));
    }

    #[test]
    fn none_backend_opens_no_slots() {
        let config = WorkloadConfig {
            storage: StorageConfig {
                backend: StorageBackend::None,
                path: None,
            },
            ..Default::default()
        };
        assert!(config.open_slots(Path::new("/tmp")).unwrap().is_none());
    }

    #[test]
    fn resolves_env_placeholders() {
        std::env::set_var("WORKLOAD_TEST_HOME", "/home/me");
        assert_eq!(
            expand_env_placeholders("${WORKLOAD_TEST_HOME}/.workload"),
            "/home/me/.workload"
        );
        assert_eq!(expand_env_placeholders("plain"), "plain");
        assert_eq!(expand_env_placeholders("${UNCLOSED"), "${UNCLOSED");
        assert_eq!(
            expand_env_placeholders("a/${WORKLOAD_TEST_UNSET_VAR}/b"),
            "a//b"
        );
    }
}
