use std::path::PathBuf;

use cricstore::config::StorageConfig;

pub const DEFAULT_SOURCE_DIR: &str = "./data/ipl_json";
pub const DEFAULT_STORE_PATH: &str = "./cricstore";

/// Settings for one import run.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub source_dir: PathBuf,
    pub storage: StorageConfig,
    /// Ignore the once-a-day and unchanged-file-count checks.
    pub force: bool,
}

impl EtlConfig {
    pub fn new(source_dir: impl Into<PathBuf>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            storage: StorageConfig::new(base_path),
            force: false,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_DIR, DEFAULT_STORE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_paths_follow_base_path() {
        let config = EtlConfig::new("/data/json", "/var/cric").with_force(true);
        assert!(config.force);
        assert_eq!(config.storage.graph_path, PathBuf::from("/var/cric/graph.sqlite"));
        assert_eq!(EtlConfig::default().source_dir, PathBuf::from(DEFAULT_SOURCE_DIR));
    }
}
