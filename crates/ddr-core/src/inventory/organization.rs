//! Organization registries: a git repository of store manifests.
//!
//! ```text
//! ddr-testing/
//! ├── .git/
//! ├── organization.json      {"id": "ddr-testing", "repo": "ddr", "org": "testing"}
//! ├── WD5000BMV-2.json       store manifest
//! └── pnr-media-backup.json  store manifest
//! ```

use super::store::{Level, Store};
use super::validate::{validate_organization, Validation};
use crate::backend::{Author, ContentStore, Replica};
use crate::config::{FilenameConfig, InventoryConfig};
use crate::error::{DdrError, Result};
use crate::metadata::{atomic_read_json, atomic_write_json};
use crate::util::natural_cmp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Contents of `organization.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDescriptor {
    pub id: String,
    pub repo: String,
    pub org: String,
}

/// A collection as carried by one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionLocation {
    pub uuid: String,
    pub cid: String,
    pub level: Level,
    /// Store label.
    pub label: String,
    pub location: String,
}

/// Which key [`Organization::collections_by`] groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKey {
    Uuid,
    Cid,
}

/// Collections a server reports, for merging into [`Organization::whereis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteListing {
    pub label: String,
    pub location: String,
    pub cids: Vec<String>,
}

/// A replica annotated with the store that holds it, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaLocation {
    #[serde(flatten)]
    pub replica: Replica,
    pub label: Option<String>,
    pub location: Option<String>,
}

/// Replicas of one content-addressed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReplicas {
    pub path: String,
    pub replicas: Vec<ReplicaLocation>,
}

/// An organization registry loaded from disk.
#[derive(Debug, Clone)]
pub struct Organization {
    pub path: PathBuf,
    pub descriptor: OrganizationDescriptor,
    stores: Vec<Store>,
    /// Manifests removed since load, for the next commit.
    removed: Vec<PathBuf>,
}

/// Whether `path` is an organization repository.
pub fn is_valid(path: &Path) -> bool {
    path.join(FilenameConfig::GIT_DIR).is_dir()
        && path.join(FilenameConfig::ORGANIZATION_JSON).is_file()
}

/// Organization repositories directly under `base`, in natural order.
pub fn organizations(base: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(base).map_err(|e| DdrError::io_with_path(e, base))?;
    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_valid(path))
        .collect();
    found.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(found)
}

fn is_manifest(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|e| e.to_str()) == Some(InventoryConfig::MANIFEST_EXTENSION)
        && path.file_name().and_then(|n| n.to_str()) != Some(FilenameConfig::ORGANIZATION_JSON)
}

impl Organization {
    /// Create an organization in memory; nothing is written until [`save`](Self::save).
    pub fn new(path: impl Into<PathBuf>, descriptor: OrganizationDescriptor) -> Self {
        Self {
            path: path.into(),
            descriptor,
            stores: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Load the descriptor and every valid store manifest in `path`.
    ///
    /// Invalid manifests are logged and left out.
    pub fn load(path: &Path) -> Result<Self> {
        let descriptor = Self::load_descriptor(path)?;

        let entries = std::fs::read_dir(path).map_err(|e| DdrError::io_with_path(e, path))?;
        let mut stores = Vec::new();
        for manifest in entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| is_manifest(p))
        {
            match Store::file_is_valid(&manifest) {
                Validation::Valid => match Store::load(&manifest) {
                    Ok(store) => stores.push(store),
                    Err(e) => warn!("Skipping {}: {}", manifest.display(), e),
                },
                Validation::Faults(faults) => {
                    warn!("Skipping {}: {}", manifest.display(), faults.join("; "));
                }
            }
        }
        stores.sort_by(|a, b| natural_cmp(&a.label, &b.label));
        debug!("Loaded organization {} ({} stores)", descriptor.id, stores.len());

        Ok(Self {
            path: path.to_path_buf(),
            descriptor,
            stores,
            removed: Vec::new(),
        })
    }

    fn load_descriptor(path: &Path) -> Result<OrganizationDescriptor> {
        let file = path.join(FilenameConfig::ORGANIZATION_JSON);
        let data: Value = atomic_read_json(&file)?.ok_or_else(|| {
            DdrError::io_with_path(
                std::io::Error::new(std::io::ErrorKind::NotFound, "organization descriptor not found"),
                &file,
            )
        })?;
        if let Validation::Faults(faults) = validate_organization(&data) {
            return Err(DdrError::invalid_argument(format!(
                "{}: {}",
                file.display(),
                faults.join("; ")
            )));
        }
        Ok(serde_json::from_value(data)?)
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// Look up a store by label.
    pub fn store(&self, label: &str) -> Result<&Store> {
        self.stores
            .iter()
            .find(|s| s.label == label)
            .ok_or_else(|| DdrError::StoreNotFound {
                label: label.to_string(),
            })
    }

    /// Add a store, replacing any store with the same label.
    pub fn add_store(&mut self, store: Store) {
        self.stores.retain(|s| s.label != store.label);
        self.stores.push(store);
        self.stores.sort_by(|a, b| natural_cmp(&a.label, &b.label));
    }

    /// Remove a store and delete its manifest.
    pub fn remove_store(&mut self, label: &str) -> Result<Store> {
        let index = self
            .stores
            .iter()
            .position(|s| s.label == label)
            .ok_or_else(|| DdrError::StoreNotFound {
                label: label.to_string(),
            })?;
        let store = self.stores.remove(index);
        let manifest = self.path.join(store.filename());
        if manifest.exists() {
            std::fs::remove_file(&manifest).map_err(|e| DdrError::io_with_path(e, &manifest))?;
        }
        self.removed.push(PathBuf::from(store.filename()));
        info!("Removed store {} from {}", label, self.descriptor.id);
        Ok(store)
    }

    /// Write the descriptor and every store manifest.
    ///
    /// Returns the written paths relative to the organization directory.
    pub fn save(&self) -> Result<Vec<PathBuf>> {
        let mut written = vec![PathBuf::from(FilenameConfig::ORGANIZATION_JSON)];
        atomic_write_json(
            &self.path.join(FilenameConfig::ORGANIZATION_JSON),
            &self.descriptor,
            InventoryConfig::BACKUP_ON_SAVE,
        )?;
        for store in &self.stores {
            let name = PathBuf::from(store.filename());
            store.save(&self.path.join(&name))?;
            written.push(name);
        }
        Ok(written)
    }

    /// Save, stage and commit the organization repository.
    pub async fn commit(
        &mut self,
        backend: &dyn ContentStore,
        author: &Author,
        message: &str,
    ) -> Result<String> {
        let written = self.save()?;
        for removed in &self.removed {
            backend.remove(&self.path, removed).await?;
        }
        backend.add(&self.path, &written).await?;
        let out = backend.commit(&self.path, author, message).await?;
        self.removed.clear();
        Ok(out)
    }

    /// Every collection on every store, with the store's label and location.
    pub fn collections(&self) -> Vec<CollectionLocation> {
        self.stores
            .iter()
            .flat_map(|store| {
                store.collections.iter().map(move |c| CollectionLocation {
                    uuid: c.uuid.clone(),
                    cid: c.cid.clone(),
                    level: c.level.clone(),
                    label: store.label.clone(),
                    location: store.location.clone(),
                })
            })
            .collect()
    }

    /// Stores holding the collection `cid`.
    pub fn collection(&self, cid: &str) -> Vec<CollectionLocation> {
        self.collections()
            .into_iter()
            .filter(|c| c.cid == cid)
            .collect()
    }

    /// Collections grouped by uuid or cid.
    pub fn collections_by(&self, key: CollectionKey) -> BTreeMap<String, Vec<CollectionLocation>> {
        let mut grouped: BTreeMap<String, Vec<CollectionLocation>> = BTreeMap::new();
        for c in self.collections() {
            let k = match key {
                CollectionKey::Uuid => c.uuid.clone(),
                CollectionKey::Cid => c.cid.clone(),
            };
            grouped.entry(k).or_default().push(c);
        }
        grouped
    }

    /// Where every collection is kept, keyed by cid.
    ///
    /// Collections a server lists are added at level `meta`. A (label,
    /// location) pair appears once per cid.
    pub fn whereis(&self, remote: Option<&RemoteListing>) -> BTreeMap<String, Vec<CollectionLocation>> {
        let mut grouped = self.collections_by(CollectionKey::Cid);
        if let Some(remote) = remote {
            for cid in &remote.cids {
                grouped.entry(cid.clone()).or_default().push(CollectionLocation {
                    uuid: String::new(),
                    cid: cid.clone(),
                    level: Level::Meta,
                    label: remote.label.clone(),
                    location: remote.location.clone(),
                });
            }
        }
        for locations in grouped.values_mut() {
            let mut seen = Vec::new();
            locations.retain(|c| {
                let key = (c.label.clone(), c.location.clone());
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            });
        }
        grouped
    }

    /// Replicas of every file in one collection, as seen from the store
    /// `label`.
    ///
    /// Each replica is matched to the store whose entry for `cid` has the
    /// replica's uuid.
    pub async fn collection_whereis(
        &self,
        label: &str,
        cid: &str,
        backend: &dyn ContentStore,
    ) -> Result<Vec<FileReplicas>> {
        let store = self.store(label)?;
        let entry = store.collection(cid).ok_or_else(|| {
            DdrError::invalid_argument(format!("store {} does not carry {}", label, cid))
        })?;
        let repo = entry.path.clone().ok_or_else(|| {
            DdrError::invalid_argument(format!("store {} has no medium path", label))
        })?;

        let by_uuid: BTreeMap<String, CollectionLocation> = self
            .collection(cid)
            .into_iter()
            .map(|c| (c.uuid.clone(), c))
            .collect();

        let files = backend.whereis(&repo).await?;
        Ok(files
            .into_iter()
            .map(|file| FileReplicas {
                path: file.path,
                replicas: file
                    .replicas
                    .into_iter()
                    .map(|replica| {
                        let known = by_uuid.get(&replica.uuid);
                        ReplicaLocation {
                            label: known.map(|c| c.label.clone()),
                            location: known.map(|c| c.location.clone()),
                            replica,
                        }
                    })
                    .collect(),
            })
            .collect())
    }
}
