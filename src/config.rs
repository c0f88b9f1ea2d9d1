//! Configuration supplied by the surrounding calculation engine
//!
//! A table family is named by a base path such as `data/qx_cso`; the index
//! and data files sit beside it with the configured extensions.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TableError};

/// Oldest age any table may plausibly carry
pub const DEFAULT_METHUSELAH: i32 = 969;

/// Default extension of the fixed-width index file
pub const DEFAULT_INDEX_EXTENSION: &str = "ndx";

/// Default extension of the tagged-record data file
pub const DEFAULT_DATA_EXTENSION: &str = "dat";

fn default_methuselah() -> i32 {
    DEFAULT_METHUSELAH
}

fn default_index_extension() -> String {
    DEFAULT_INDEX_EXTENSION.to_string()
}

fn default_data_extension() -> String {
    DEFAULT_DATA_EXTENSION.to_string()
}

/// Knobs for locating and validating tables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableConfig {
    /// Upper bound for every age field read from a data file
    #[serde(default = "default_methuselah")]
    pub methuselah: i32,

    /// Extension substituted into the base path to find the index file
    #[serde(default = "default_index_extension")]
    pub index_extension: String,

    /// Extension substituted into the base path to find the data file
    #[serde(default = "default_data_extension")]
    pub data_extension: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            methuselah: DEFAULT_METHUSELAH,
            index_extension: default_index_extension(),
            data_extension: default_data_extension(),
        }
    }
}

impl TableConfig {
    /// Load configuration from a JSON file; omitted fields take their defaults
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| TableError::ConfigFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let config: TableConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| TableError::ConfigFile {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        if config.methuselah < 0 {
            return Err(TableError::ConfigFile {
                path: path.to_path_buf(),
                detail: format!("methuselah must not be negative, got {}", config.methuselah),
            });
        }
        Ok(config)
    }

    /// Path of the index file for a table family
    pub fn index_path(&self, base: &Path) -> PathBuf {
        base.with_extension(&self.index_extension)
    }

    /// Path of the data file for a table family
    pub fn data_path(&self, base: &Path) -> PathBuf {
        base.with_extension(&self.data_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_paths() {
        let config = TableConfig::default();
        let base = Path::new("tables/qx_cso");

        assert_eq!(config.index_path(base), PathBuf::from("tables/qx_cso.ndx"));
        assert_eq!(config.data_path(base), PathBuf::from("tables/qx_cso.dat"));
        assert_eq!(config.methuselah, 969);
    }

    #[test]
    fn test_existing_extension_is_replaced() {
        let config = TableConfig::default();
        let base = Path::new("qx_ins.dat");

        assert_eq!(config.index_path(base), PathBuf::from("qx_ins.ndx"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.json");
        let mut file = File::create(&path).unwrap();
        write!(file, r#"{{ "methuselah": 120 }}"#).unwrap();

        let config = TableConfig::from_json_path(&path).unwrap();
        assert_eq!(config.methuselah, 120);
        assert_eq!(config.index_extension, "ndx");
        assert_eq!(config.data_extension, "dat");
    }

    #[test]
    fn test_bad_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = TableConfig::from_json_path(&path).unwrap_err();
        assert!(matches!(err, TableError::ConfigFile { .. }));
    }

    #[test]
    fn test_negative_methuselah_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.json");
        std::fs::write(&path, r#"{ "methuselah": -1 }"#).unwrap();

        assert!(TableConfig::from_json_path(&path).is_err());
    }
}
