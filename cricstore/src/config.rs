use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
pub struct StorageConfig {
    pub base_path: PathBuf,
    pub graph_path: PathBuf,
    pub catalog_path: PathBuf,
    /// Append-only log of input field paths outside the known schema.
    pub unmapped_log_path: PathBuf,
    /// Append-only log of matches that failed to import.
    pub error_log_path: PathBuf,
}

impl StorageConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            graph_path: base_path.join("graph.sqlite"),
            catalog_path: base_path.join("catalog.sqlite"),
            unmapped_log_path: base_path.join("skipped_json_fields.txt"),
            error_log_path: base_path.join("import_errors.log"),
            base_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_derived_from_base() {
        let config = StorageConfig::new("/tmp/cric");
        assert_eq!(config.graph_path, PathBuf::from("/tmp/cric/graph.sqlite"));
        assert_eq!(config.catalog_path, PathBuf::from("/tmp/cric/catalog.sqlite"));
        assert!(config.error_log_path.starts_with(&config.base_path));
    }
}
