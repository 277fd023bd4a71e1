//! Discover collections on a medium and guess what level each is kept at.

use super::store::{CollectionEntry, Level};
use crate::backend::ContentStore;
use crate::config::{AccessConvention, FilenameConfig};
use crate::error::{DdrError, Result};
use crate::util::natural_cmp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of inspecting which files a collection has materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuessedLevel {
    #[serde(rename = "metadata")]
    Metadata,
    #[serde(rename = "access")]
    Access,
    #[serde(rename = "master")]
    Master,
    #[serde(rename = "unknown")]
    Unknown,
    /// The content store could not be queried.
    #[serde(rename = "error: annex")]
    AnnexError,
}

impl GuessedLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuessedLevel::Metadata => "metadata",
            GuessedLevel::Access => "access",
            GuessedLevel::Master => "master",
            GuessedLevel::Unknown => "unknown",
            GuessedLevel::AnnexError => "error: annex",
        }
    }
}

impl std::fmt::Display for GuessedLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a collection from the list of materialized files.
pub trait LevelClassifier: Send + Sync {
    fn classify(&self, present: &[String]) -> GuessedLevel;
}

/// Classifies by the access-derivative filename marker.
///
/// Extensions of derivatives vary, so only the stem is inspected.
#[derive(Debug, Clone, Default)]
pub struct SuffixClassifier {
    access: AccessConvention,
}

impl SuffixClassifier {
    pub fn new(access: AccessConvention) -> Self {
        Self { access }
    }
}

impl LevelClassifier for SuffixClassifier {
    fn classify(&self, present: &[String]) -> GuessedLevel {
        if present.is_empty() {
            return GuessedLevel::Metadata;
        }
        let access = present
            .iter()
            .filter(|f| self.access.stem_is_access(f))
            .count();
        match (access, present.len() - access) {
            (a, 0) if a > 0 => GuessedLevel::Access,
            (a, b) if a > 0 && b > 0 => GuessedLevel::Master,
            _ => GuessedLevel::Unknown,
        }
    }
}

/// Guess a collection's level from what is currently materialized.
///
/// A failing content-store query yields [`GuessedLevel::AnnexError`]
/// instead of an error.
pub async fn guess_collection_level(
    backend: &dyn ContentStore,
    path: &Path,
    classifier: &dyn LevelClassifier,
) -> GuessedLevel {
    match backend.find_present(path).await {
        Ok(present) => classifier.classify(&present),
        Err(e) => {
            warn!("Could not list present files in {}: {}", path.display(), e);
            GuessedLevel::AnnexError
        }
    }
}

/// Whether `path` has the layout of a collection repository.
pub fn looks_like_a_collection(path: &Path) -> bool {
    let git = path.join(FilenameConfig::GIT_DIR);
    git.is_dir()
        && git.join(FilenameConfig::ANNEX_DIR).is_dir()
        && path.join(FilenameConfig::CONTROL).is_file()
}

/// Read the collection id from `collection.json`.
///
/// The document is either an object with an `id` key or a list of
/// single-key objects, one of which is `id`.
pub fn read_collection_id(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path.join(FilenameConfig::COLLECTION_JSON)).ok()?;
    let data: Value = serde_json::from_str(&text).ok()?;
    let id = match &data {
        Value::Array(items) => items.iter().find_map(|item| item.get("id")),
        Value::Object(_) => data.get("id"),
        _ => None,
    }?;
    id.as_str().filter(|s| !s.is_empty()).map(String::from)
}

/// Medium label from the host name and the medium path.
///
/// `/media/WD5000BMV-2` on host `pnr` becomes `pnr_media-WD5000BMV-2`.
pub fn guess_drive_label(path: &Path) -> String {
    let host = sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_string());
    drive_label(&host, path)
}

fn drive_label(host: &str, path: &Path) -> String {
    let flat = path.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "-");
    format!("{}_{}", host, flat.strip_prefix('-').unwrap_or(&flat))
}

/// One collection found on a medium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedCollection {
    pub uuid: String,
    pub cid: String,
    /// Forced level, or the guessed classification.
    pub level: String,
    #[serde(skip)]
    pub path: PathBuf,
}

impl AnalyzedCollection {
    /// Manifest entry for this collection.
    pub fn to_entry(&self) -> CollectionEntry {
        let mut entry = CollectionEntry::new(&self.uuid, &self.cid, Level::parse(&self.level));
        entry.path = Some(self.path.clone());
        entry
    }
}

/// Everything [`analyze`] found on a medium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub label: String,
    pub collections: Vec<AnalyzedCollection>,
}

/// Scan `base` for collection repositories and classify each.
///
/// Subdirectories without the collection layout, or whose collection id or
/// content-store uuid cannot be resolved, are skipped.
pub async fn analyze(
    backend: &dyn ContentStore,
    base: &Path,
    force_level: Option<&Level>,
    classifier: &dyn LevelClassifier,
) -> Result<Analysis> {
    let entries = std::fs::read_dir(base).map_err(|e| DdrError::io_with_path(e, base))?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));

    let mut collections = Vec::new();
    for path in dirs {
        if !looks_like_a_collection(&path) {
            continue;
        }
        let Some(cid) = read_collection_id(&path) else {
            debug!("No collection id in {}", path.display());
            continue;
        };
        let uuid = match backend.uuid(&path).await {
            Ok(Some(uuid)) => uuid,
            Ok(None) | Err(_) => {
                debug!("No content-store uuid for {}", path.display());
                continue;
            }
        };
        let level = match force_level {
            Some(level) => level.to_string(),
            None => guess_collection_level(backend, &path, classifier)
                .await
                .to_string(),
        };
        debug!("{} {} {}", cid, uuid, level);
        collections.push(AnalyzedCollection {
            uuid,
            cid,
            level,
            path,
        });
    }

    Ok(Analysis {
        label: guess_drive_label(base),
        collections,
    })
}
