//! Centralized configuration for the DDR core.
//!
//! Constant groups follow the layout of the collection repositories on disk.
//! Runtime settings that vary per installation (the access-file naming
//! convention) are carried by [`AccessConvention`].

use crate::error::{DdrError, Result};
use std::time::Duration;

/// Names of the files and directories that make up the repository layout.
pub struct FilenameConfig;

impl FilenameConfig {
    pub const REPOSITORY_JSON: &'static str = "repository.json";
    pub const ORGANIZATION_JSON: &'static str = "organization.json";
    pub const COLLECTION_JSON: &'static str = "collection.json";
    pub const ENTITY_JSON: &'static str = "entity.json";
    pub const CHANGELOG: &'static str = "changelog";
    pub const CONTROL: &'static str = "control";
    pub const FILES_DIR: &'static str = "files";
    pub const GITIGNORE: &'static str = ".gitignore";
    pub const GIT_DIR: &'static str = ".git";
    pub const ANNEX_DIR: &'static str = "annex";
}

/// Inventory (store manifest) configuration.
pub struct InventoryConfig;

impl InventoryConfig {
    pub const MANIFEST_EXTENSION: &'static str = "json";
    pub const BACKUP_ON_SAVE: bool = false;
    pub const ANNEX_UUID_KEY: &'static str = "annex.uuid";
}

/// Tier reconciliation configuration.
pub struct ReconcileConfig;

impl ReconcileConfig {
    /// Concurrent fetch/release operations per collection.
    pub const DEFAULT_CONCURRENCY: usize = 4;
    /// Upper bound on a single fetch or release.
    pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(3600);
}

/// Naming convention for access derivatives (e.g. `...-master-a1b2c3-a.jpg`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConvention {
    append: String,
    extension: String,
}

impl AccessConvention {
    pub const DEFAULT_APPEND: &'static str = "-a";
    pub const DEFAULT_EXTENSION: &'static str = ".jpg";

    /// Build a convention from installation settings.
    ///
    /// Both parts are required; an empty value means the setting was never
    /// provided.
    pub fn new(append: impl Into<String>, extension: impl Into<String>) -> Result<Self> {
        let append = append.into();
        let extension = extension.into();
        if append.is_empty() {
            return Err(DdrError::ConfigurationMissing {
                key: "access_file_append".to_string(),
            });
        }
        if extension.is_empty() {
            return Err(DdrError::ConfigurationMissing {
                key: "access_file_extension".to_string(),
            });
        }
        Ok(Self { append, extension })
    }

    pub fn append(&self) -> &str {
        &self.append
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Full filename suffix, e.g. `-a.jpg`.
    pub fn suffix(&self) -> String {
        format!("{}{}", self.append, self.extension)
    }

    /// Whether the path names an access file (ends with the full suffix).
    pub fn is_access_file(&self, path: &str) -> bool {
        path.ends_with(&self.suffix())
    }

    /// Whether a filename stem, with its extension dropped, carries the
    /// access marker. Used when the extension of the derivative is unknown.
    pub fn stem_is_access(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        let stem = match name.rfind('.') {
            Some(pos) if pos > 0 => &name[..pos],
            _ => name,
        };
        stem.ends_with(&self.append)
    }
}

impl Default for AccessConvention {
    fn default() -> Self {
        Self {
            append: Self::DEFAULT_APPEND.to_string(),
            extension: Self::DEFAULT_EXTENSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_convention_suffix() {
        let access = AccessConvention::default();
        assert_eq!(access.suffix(), "-a.jpg");
        assert!(access.is_access_file("files/ddr-test-1-2/files/ddr-test-1-2-master-abc-a.jpg"));
        assert!(!access.is_access_file("files/ddr-test-1-2/files/ddr-test-1-2-master-abc.tif"));
    }

    #[test]
    fn test_stem_is_access() {
        let access = AccessConvention::default();
        assert!(access.stem_is_access("ddr-test-1-2-master-abc-a.png"));
        assert!(access.stem_is_access("dir/ddr-test-1-2-master-abc-a"));
        assert!(!access.stem_is_access("ddr-test-1-2-master-abc.jpg"));
    }

    #[test]
    fn test_missing_settings() {
        let err = AccessConvention::new("", ".jpg").unwrap_err();
        assert!(matches!(err, DdrError::ConfigurationMissing { ref key } if key == "access_file_append"));
        let err = AccessConvention::new("-a", "").unwrap_err();
        assert!(matches!(err, DdrError::ConfigurationMissing { ref key } if key == "access_file_extension"));
        assert!(AccessConvention::new("-acc", ".png").is_ok());
    }

    #[test]
    fn test_timeouts_are_reasonable() {
        assert!(ReconcileConfig::DEFAULT_ACTION_TIMEOUT > Duration::ZERO);
        assert!(ReconcileConfig::DEFAULT_CONCURRENCY > 0);
    }
}
