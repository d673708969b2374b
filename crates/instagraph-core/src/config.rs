//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to InstaGraph data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Embedded graph history database (`data/instagraph.db`).
    pub sqlite_db: PathBuf,
    /// Static UI assets (`static/`).
    pub static_dir: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the root if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;

        let sqlite_db = std::env::var("INSTAGRAPH_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| root.join("instagraph.db"));

        Ok(Self {
            sqlite_db,
            static_dir: PathBuf::from("static"),
            root,
        })
    }
}

/// Top-level process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstaGraphConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Billing plan (`USER_PLAN`). `free` enables the `Retry-After` hint.
    pub user_plan: Option<String>,
}

impl InstaGraphConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            user_plan: std::env::var("USER_PLAN").ok(),
        })
    }

    /// Override the port (CLI flag wins over `PORT`).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn is_free_plan(&self) -> bool {
        self.user_plan.as_deref() == Some("free")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/data");
        let paths = DataPaths::new(&root).unwrap();
        assert!(root.exists());
        assert_eq!(paths.root, root);
    }

    #[test]
    fn test_free_plan() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = InstaGraphConfig::from_env(dir.path()).unwrap().with_port(9000);
        assert_eq!(config.port, 9000);

        config.user_plan = Some("free".into());
        assert!(config.is_free_plan());
        config.user_plan = Some("pro".into());
        assert!(!config.is_free_plan());
    }
}
