//! Run configuration.
//!
//! Everything the loader needs is carried in [`LoaderConfig`]; nothing below
//! `main` reads the environment on its own.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{LoadError, Result};

pub const URI_VAR: &str = "MONGODB_URI";
pub const DEFAULT_ENV_FILE: &str = "../server/.env";
pub const DEFAULT_CSV_PATH: &str = "../Web Framework Project/public/data.csv";
pub const DEFAULT_DATABASE: &str = "WebFrameworkProject";
pub const DEFAULT_COLLECTION: &str = "customers";

/// Columns forced to a numeric type before insert.
pub const NUMERIC_COLUMNS: [&str; 2] = ["visit_days", "total_payment_may"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    /// `delete_many({})` then `insert_many`; the collection may be observed empty in between.
    #[default]
    DeleteThenInsert,
    /// Insert into `<collection>_staging` and rename it over the target.
    Staged,
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub mongodb_uri: String,
    pub database: String,
    pub collection: String,
    pub csv_path: PathBuf,
    pub numeric_columns: Vec<String>,
    pub replace_mode: ReplaceMode,
}

impl LoaderConfig {
    /// Build a config with the fixed defaults around an already-known URI.
    pub fn new(mongodb_uri: impl Into<String>) -> Self {
        Self {
            mongodb_uri: mongodb_uri.into(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            numeric_columns: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
            replace_mode: ReplaceMode::default(),
        }
    }

    /// Resolve the connection string and build a config.
    ///
    /// `process_value` is the current value of `MONGODB_URI` in the process
    /// environment; it wins over the dotenv file, which is only consulted
    /// when the variable is unset or empty.
    pub fn resolve(env_file: &Path, process_value: Option<String>) -> Result<Self> {
        let uri = match process_value.filter(|v| !v.trim().is_empty()) {
            Some(v) => {
                debug!("{} taken from process environment", URI_VAR);
                Some(v)
            }
            None => read_env_file(env_file, URI_VAR),
        };

        match uri {
            Some(uri) => Ok(Self::new(uri)),
            None => Err(LoadError::Configuration {
                env_file: env_file.to_path_buf(),
            }),
        }
    }

    pub fn with_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = path.into();
        self
    }

    pub fn with_target(mut self, database: impl Into<String>, collection: impl Into<String>) -> Self {
        self.database = database.into();
        self.collection = collection.into();
        self
    }

    pub fn with_replace_mode(mut self, mode: ReplaceMode) -> Self {
        self.replace_mode = mode;
        self
    }

    pub fn staging_collection(&self) -> String {
        format!("{}_staging", self.collection)
    }
}

/// Look up `key` in a dotenv file without touching the process environment.
/// A missing or unreadable file yields `None`.
fn read_env_file(path: &Path, key: &str) -> Option<String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "no dotenv file");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read dotenv file");
            return None;
        }
    };

    let mut found = None;
    for item in iter {
        match item {
            Ok((k, v)) if k == key => found = Some(v),
            Ok(_) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping malformed dotenv line");
            }
        }
    }
    found.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn env_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_uri_from_env_file() {
        let f = env_file("PORT=5000\nMONGODB_URI=mongodb://db.local:27017\n");
        let cfg = LoaderConfig::resolve(f.path(), None).unwrap();
        assert_eq!(cfg.mongodb_uri, "mongodb://db.local:27017");
        assert_eq!(cfg.database, "WebFrameworkProject");
        assert_eq!(cfg.collection, "customers");
        assert_eq!(cfg.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert_eq!(cfg.numeric_columns, vec!["visit_days", "total_payment_may"]);
        assert_eq!(cfg.replace_mode, ReplaceMode::DeleteThenInsert);
    }

    #[test]
    fn test_process_env_wins_over_file() {
        let f = env_file("MONGODB_URI=mongodb://from-file\n");
        let cfg = LoaderConfig::resolve(f.path(), Some("mongodb://from-env".into())).unwrap();
        assert_eq!(cfg.mongodb_uri, "mongodb://from-env");
    }

    #[test]
    fn test_empty_process_value_falls_back_to_file() {
        let f = env_file("MONGODB_URI=mongodb://from-file\n");
        let cfg = LoaderConfig::resolve(f.path(), Some("  ".into())).unwrap();
        assert_eq!(cfg.mongodb_uri, "mongodb://from-file");
    }

    #[test]
    fn test_missing_uri_is_configuration_error() {
        let f = env_file("PORT=5000\nMONGODB_URI=\n");
        let err = LoaderConfig::resolve(f.path(), None).unwrap_err();
        assert!(matches!(err, LoadError::Configuration { .. }));
    }

    #[test]
    fn test_missing_env_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let err = LoaderConfig::resolve(&dir.path().join(".env"), None).unwrap_err();
        match err {
            LoadError::Configuration { env_file } => assert!(env_file.ends_with(".env")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_builders() {
        let cfg = LoaderConfig::new("mongodb://x")
            .with_csv_path("in.csv")
            .with_target("db", "people")
            .with_replace_mode(ReplaceMode::Staged);
        assert_eq!(cfg.csv_path, PathBuf::from("in.csv"));
        assert_eq!(cfg.database, "db");
        assert_eq!(cfg.staging_collection(), "people_staging");
        assert_eq!(cfg.replace_mode, ReplaceMode::Staged);
    }
}
