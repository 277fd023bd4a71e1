//! Content-store / version-control backend contract.
//!
//! The inventory layer never talks to git or git-annex directly. Everything
//! goes through [`ContentStore`], which is implemented for real repositories
//! by [`GitAnnex`] and by in-memory doubles in tests.

mod git_annex;

pub use git_annex::GitAnnex;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One repository holding a copy of a content-addressed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    pub uuid: String,
    pub description: String,
    /// This replica is the working repository being queried.
    #[serde(default)]
    pub here: bool,
}

/// A content-addressed file known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnexFile {
    /// Path relative to the collection root.
    pub path: String,
    pub replicas: Vec<Replica>,
}

/// Commit author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub mail: String,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.mail)
    }
}

/// Narrow contract over a collection's working directory.
///
/// `fetch`/`release` are the only operations the reconciler mutates with;
/// `add`/`remove`/`commit` serve the surrounding workflow (saving
/// organization manifests).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every content-addressed file in the repository with its replicas.
    async fn whereis(&self, repo: &Path) -> Result<Vec<AnnexFile>>;

    /// Content-addressed files currently materialized in the repository.
    async fn find_present(&self, repo: &Path) -> Result<Vec<String>>;

    /// Materialize one file locally. Returns the backend's report.
    async fn fetch(&self, repo: &Path, file: &str) -> Result<String>;

    /// Drop the local copy of one file. Returns the backend's report.
    async fn release(&self, repo: &Path, file: &str) -> Result<String>;

    /// Unique id of the repository within the content store, if it has one.
    async fn uuid(&self, repo: &Path) -> Result<Option<String>>;

    async fn add(&self, repo: &Path, paths: &[PathBuf]) -> Result<()>;

    async fn remove(&self, repo: &Path, path: &Path) -> Result<()>;

    async fn commit(&self, repo: &Path, author: &Author, message: &str) -> Result<String>;
}
