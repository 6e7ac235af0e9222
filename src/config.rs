//! Project configuration (`repograph.toml`)
//!
//! Every field is optional; CLI flags take precedence over the file, and
//! built-in defaults cover the rest.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepographConfig {
    pub database: Option<String>,
    pub repository: Option<String>,
    pub chunk_size: Option<usize>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("repograph.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".repograph").join("repograph.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RepographConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RepographConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RepographConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repograph.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repograph.toml");

        let config = RepographConfig {
            database: Some(".repograph/repograph.db".to_string()),
            repository: Some("my-app".to_string()),
            chunk_size: Some(100),
        };
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.repository.as_deref(), Some("my-app"));
        assert_eq!(loaded.chunk_size, Some(100));

        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();
    }
}
