//! Store manifests: one physical medium and the collections it carries.

use super::validate::{validate_store, Validation};
use crate::config::{AccessConvention, InventoryConfig};
use crate::error::{DdrError, Result};
use crate::metadata::{atomic_read_json, atomic_write_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Replication policy declared for a collection or entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    /// Metadata only; no content is materialized.
    Meta,
    /// Only access derivatives are materialized.
    Access,
    Master,
    All,
    /// Anything else found in a manifest. Never acted on.
    Unrecognized(String),
}

impl Level {
    pub fn parse(s: &str) -> Self {
        match s {
            "meta" | "metadata" => Level::Meta,
            "access" => Level::Access,
            "master" => Level::Master,
            "all" => Level::All,
            other => Level::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Level::Meta => "meta",
            Level::Access => "access",
            Level::Master => "master",
            Level::All => "all",
            Level::Unrecognized(s) => s,
        }
    }

    /// Whether `file` should be materialized under this level.
    ///
    /// `None` for an unrecognized level.
    pub fn wants_present(&self, file: &str, access: &AccessConvention) -> Option<bool> {
        match self {
            Level::Meta => Some(false),
            Level::Master | Level::All => Some(true),
            Level::Access => Some(access.is_access_file(file)),
            Level::Unrecognized(_) => None,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Unrecognized(String::new())
    }
}

impl From<String> for Level {
    fn from(s: String) -> Self {
        Level::parse(&s)
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an effective level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// The collection-wide default; the entity has no override.
    Collection,
    /// An explicit per-entity override.
    Entity,
}

/// Per-entity level override inside a collection entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityOverride {
    #[serde(default)]
    pub eid: String,
    #[serde(default)]
    pub level: Level,
}

/// One collection carried by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntityOverride>,
    /// Working directory on the medium, resolved by [`Store::load`].
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl CollectionEntry {
    pub fn new(uuid: impl Into<String>, cid: impl Into<String>, level: Level) -> Self {
        Self {
            uuid: uuid.into(),
            cid: cid.into(),
            level,
            entities: Vec::new(),
            path: None,
        }
    }

    /// Effective level for an entity: its override if present, else the
    /// collection level.
    pub fn level_for(&self, eid: &str) -> (&Level, LevelSource) {
        match self.entities.iter().find(|e| e.eid == eid) {
            Some(entity) => (&entity.level, LevelSource::Entity),
            None => (&self.level, LevelSource::Collection),
        }
    }
}

/// Manifest describing one storage medium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub purchase_date: String,
    #[serde(default)]
    pub collections: Vec<CollectionEntry>,
    /// Manifest file this store was loaded from.
    #[serde(skip)]
    pub path: Option<PathBuf>,
    /// Root directory of the medium.
    #[serde(skip)]
    pub store_base: Option<PathBuf>,
}

impl Store {
    pub fn new(
        repo: impl Into<String>,
        org: impl Into<String>,
        label: impl Into<String>,
        location: impl Into<String>,
        purchase_date: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            org: org.into(),
            label: label.into(),
            location: location.into(),
            purchase_date: purchase_date.into(),
            collections: Vec::new(),
            path: None,
            store_base: None,
        }
    }

    /// Read a manifest and resolve each collection's working directory.
    ///
    /// The medium root is the manifest's grandparent directory; each
    /// collection lives at `<root>/<cid>`.
    pub fn load(path: &Path) -> Result<Self> {
        let data: Value = atomic_read_json(path)?.ok_or_else(|| {
            DdrError::io_with_path(
                std::io::Error::new(std::io::ErrorKind::NotFound, "manifest not found"),
                path,
            )
        })?;
        Self::from_value(data, path)
    }

    pub(crate) fn from_value(data: Value, path: &Path) -> Result<Self> {
        let mut store: Store = serde_json::from_value(data).map_err(|e| DdrError::Json {
            message: format!("Invalid store manifest {}", path.display()),
            source: Some(e),
        })?;
        store.set_path(path);
        debug!(
            "Loaded store {} ({} collections)",
            store.label,
            store.collections.len()
        );
        Ok(store)
    }

    fn set_path(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
        self.store_base = path.parent().and_then(Path::parent).map(Path::to_path_buf);
        if let Some(base) = &self.store_base {
            for collection in &mut self.collections {
                collection.path = Some(base.join(&collection.cid));
            }
        }
    }

    /// Write the manifest atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write_json(path, self, InventoryConfig::BACKUP_ON_SAVE)
    }

    /// Manifest filename for this store, `<label>.json`.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.label, InventoryConfig::MANIFEST_EXTENSION)
    }

    /// Find a collection entry by uuid or collection id.
    pub fn collection(&self, key: &str) -> Option<&CollectionEntry> {
        self.collections
            .iter()
            .find(|c| c.uuid == key || c.cid == key)
    }

    /// Validate a manifest on disk.
    pub fn file_is_valid(path: &Path) -> Validation {
        if !path.exists() {
            return Validation::Faults(vec!["File does not exist.".to_string()]);
        }
        let parsed = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());
        match parsed {
            Some(data) => validate_store(&data),
            None => Validation::Faults(vec!["Not a valid JSON file.".to_string()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn manifest() -> Value {
        json!({
            "repo": "ddr",
            "org": "testing",
            "label": "WD5000BMV-2",
            "location": "Densho HQ",
            "purchase_date": "2013-09-01",
            "collections": [
                {"uuid": "43935", "cid": "ddr-testing-123", "level": "meta"},
                {
                    "uuid": "64393",
                    "cid": "ddr-testing-124",
                    "level": "access",
                    "entities": [{"eid": "ddr-testing-124-1", "level": "all"}]
                }
            ]
        })
    }

    fn write_manifest(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join("ddr-testing");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("WD5000BMV-2.json");
        std::fs::write(&path, serde_json::to_string_pretty(&manifest()).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("meta"), Level::Meta);
        assert_eq!(Level::parse("metadata"), Level::Meta);
        assert_eq!(Level::parse("all"), Level::All);
        assert_eq!(Level::parse("mastr"), Level::Unrecognized("mastr".into()));
        assert_eq!(Level::parse("mastr").to_string(), "mastr");
    }

    #[test]
    fn test_wants_present() {
        let access = AccessConvention::default();
        let master = "files/ddr-t-1-2/files/ddr-t-1-2-master-abc.tif";
        let derivative = "files/ddr-t-1-2/files/ddr-t-1-2-master-abc-a.jpg";
        assert_eq!(Level::Meta.wants_present(derivative, &access), Some(false));
        assert_eq!(Level::All.wants_present(master, &access), Some(true));
        assert_eq!(Level::Access.wants_present(master, &access), Some(false));
        assert_eq!(Level::Access.wants_present(derivative, &access), Some(true));
        assert_eq!(Level::default().wants_present(master, &access), None);
    }

    #[test]
    fn test_load_resolves_collection_paths() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(&temp);
        let store = Store::load(&path).unwrap();

        assert_eq!(store.label, "WD5000BMV-2");
        assert_eq!(store.store_base.as_deref(), Some(temp.path()));
        assert_eq!(
            store.collections[0].path.as_deref(),
            Some(temp.path().join("ddr-testing-123").as_path())
        );
        assert_eq!(store.collections[1].entities[0].level, Level::All);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Store::load(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, DdrError::Io { .. }));
    }

    #[test]
    fn test_level_for_falls_back_to_collection() {
        let temp = TempDir::new().unwrap();
        let store = Store::load(&write_manifest(&temp)).unwrap();
        let entry = store.collection("ddr-testing-124").unwrap();

        assert_eq!(entry.level_for("ddr-testing-124-1"), (&Level::All, LevelSource::Entity));
        assert_eq!(
            entry.level_for("ddr-testing-124-2"),
            (&Level::Access, LevelSource::Collection)
        );
    }

    #[test]
    fn test_collection_lookup_by_uuid_or_cid() {
        let temp = TempDir::new().unwrap();
        let store = Store::load(&write_manifest(&temp)).unwrap();
        assert_eq!(store.collection("43935").unwrap().cid, "ddr-testing-123");
        assert_eq!(store.collection("ddr-testing-124").unwrap().uuid, "64393");
        assert!(store.collection("ddr-testing-999").is_none());
    }

    #[test]
    fn test_save_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = Store::load(&write_manifest(&temp)).unwrap();
        assert_eq!(store.filename(), "WD5000BMV-2.json");

        let out = temp.path().join(store.filename());
        store.save(&out).unwrap();
        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(saved, manifest());
    }

    #[test]
    fn test_file_is_valid() {
        let temp = TempDir::new().unwrap();
        assert!(Store::file_is_valid(&write_manifest(&temp)).is_valid());
        assert_eq!(
            Store::file_is_valid(&temp.path().join("missing.json")).faults(),
            &["File does not exist.".to_string()]
        );
        let garbage = temp.path().join("garbage.json");
        std::fs::write(&garbage, "{not json").unwrap();
        assert_eq!(
            Store::file_is_valid(&garbage).faults(),
            &["Not a valid JSON file.".to_string()]
        );
    }
}
