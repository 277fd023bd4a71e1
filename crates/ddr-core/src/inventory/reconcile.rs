//! Bring a medium into line with its store manifest.
//!
//! For each collection the backend's file listing is authoritative. Every
//! file gets an effective level (entity override, else collection level),
//! a desired presence, and an action:
//!
//! | desired | on disk | action    |
//! |---------|---------|-----------|
//! | yes     | yes     | none      |
//! | yes     | no      | fetch     |
//! | no      | yes     | release   |
//! | no      | no      | none      |
//!
//! Unconfirmed passes only plan. Confirmed passes execute fetch/release
//! concurrently within a collection; each file's outcome is recorded on its
//! own action and never stops the rest of the pass.

use super::store::{CollectionEntry, Level, LevelSource, Store};
use crate::backend::{AnnexFile, ContentStore};
use crate::cancel::{CancelSignal, Interrupted};
use crate::config::{AccessConvention, ReconcileConfig};
use crate::identifier::Identifier;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to do with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Fetch,
    Release,
    None,
}

impl Action {
    /// Pick the action from desired and actual presence.
    pub fn decide(desired: bool, present: bool) -> Self {
        match (desired, present) {
            (true, false) => Action::Fetch,
            (false, true) => Action::Release,
            _ => Action::None,
        }
    }
}

/// Outcome recorded for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "output", rename_all = "snake_case")]
pub enum ActionResult {
    /// Unconfirmed pass; nothing was executed.
    Planned,
    /// Nothing to do.
    Noop,
    Succeeded(String),
    Failed(String),
    TimedOut,
    Cancelled,
}

/// One file's entry in a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationAction {
    pub cid: String,
    /// Path relative to the collection root.
    pub path: String,
    pub level: Level,
    pub level_source: LevelSource,
    pub action: Action,
    pub result: ActionResult,
}

/// A collection that could not be evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionFailure {
    pub cid: String,
    pub message: String,
}

/// Everything a pass did or would do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub actions: Vec<ReconciliationAction>,
    pub failed_collections: Vec<CollectionFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ApplyReport {
    /// Actions other than `none`.
    pub fn pending(&self) -> impl Iterator<Item = &ReconciliationAction> {
        self.actions.iter().filter(|a| a.action != Action::None)
    }

    /// Every action is `none` and every collection was evaluated.
    pub fn is_compliant(&self) -> bool {
        self.failed_collections.is_empty() && self.pending().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReconciliationAction> {
        self.actions
            .iter()
            .filter(|a| matches!(a.result, ActionResult::Failed(_) | ActionResult::TimedOut))
    }
}

/// Options for [`Reconciler::apply`].
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Restrict the pass to these collection ids. Empty means every collection.
    pub cids: Option<Vec<String>>,
    /// Execute actions; otherwise only plan them.
    pub confirmed: bool,
    /// Concurrent fetch/release operations per collection.
    pub concurrency: usize,
    /// Upper bound on one fetch or release.
    pub action_timeout: Duration,
    pub cancel: CancelSignal,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            cids: None,
            confirmed: false,
            concurrency: ReconcileConfig::DEFAULT_CONCURRENCY,
            action_timeout: ReconcileConfig::DEFAULT_ACTION_TIMEOUT,
            cancel: CancelSignal::new(),
        }
    }
}

impl ApplyOptions {
    pub fn confirmed() -> Self {
        Self {
            confirmed: true,
            ..Self::default()
        }
    }

    pub fn with_cids<I, S>(mut self, cids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cids = Some(cids.into_iter().map(Into::into).collect());
        self
    }

    fn includes(&self, cid: &str) -> bool {
        self.cids
            .as_ref()
            .filter(|cids| !cids.is_empty())
            .map_or(true, |cids| cids.iter().any(|c| c == cid))
    }
}

/// Entity id owning a content file, from its filename.
///
/// The access marker is dropped from the stem first so a derivative maps to
/// the same entity as its master.
pub fn entity_id_for(file: &str, access: &AccessConvention) -> Option<String> {
    let name = file.rsplit('/').next().unwrap_or(file);
    let stem = match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    };
    let stem = stem.strip_suffix(access.append()).unwrap_or(stem);
    Identifier::from_id(stem, None).ok()?.parent_id()
}

/// Executes tier policy against a content-store backend.
#[derive(Clone)]
pub struct Reconciler {
    backend: Arc<dyn ContentStore>,
    access: AccessConvention,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn ContentStore>) -> Self {
        Self {
            backend,
            access: AccessConvention::default(),
        }
    }

    pub fn with_access(mut self, access: AccessConvention) -> Self {
        self.access = access;
        self
    }

    /// Run one pass over the store's collections.
    pub async fn apply(&self, store: &Store, options: &ApplyOptions) -> ApplyReport {
        let started_at = Utc::now();
        let mut actions = Vec::new();
        let mut failed_collections = Vec::new();

        for entry in store.collections.iter().filter(|c| options.includes(&c.cid)) {
            match self.apply_collection(entry, options).await {
                Ok(mut done) => actions.append(&mut done),
                Err(message) => {
                    warn!("Skipping collection {}: {}", entry.cid, message);
                    failed_collections.push(CollectionFailure {
                        cid: entry.cid.clone(),
                        message,
                    });
                }
            }
        }

        let report = ApplyReport {
            actions,
            failed_collections,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "{} pass on {}: {} files, {} pending, {} failed, {} collections skipped",
            if options.confirmed { "Confirmed" } else { "Dry-run" },
            store.label,
            report.actions.len(),
            report.pending().count(),
            report.failures().count(),
            report.failed_collections.len()
        );
        report
    }

    async fn apply_collection(
        &self,
        entry: &CollectionEntry,
        options: &ApplyOptions,
    ) -> std::result::Result<Vec<ReconciliationAction>, String> {
        let repo = entry
            .path
            .clone()
            .ok_or_else(|| "collection has no path on the medium".to_string())?;
        let files = self
            .backend
            .whereis(&repo)
            .await
            .map_err(|e| e.to_string())?;

        let planned: Vec<ReconciliationAction> = files
            .iter()
            .map(|file| self.plan(entry, &repo, file))
            .collect();

        if !options.confirmed {
            return Ok(planned);
        }

        let concurrency = options.concurrency.max(1);
        Ok(stream::iter(
            planned
                .into_iter()
                .map(|action| self.execute(&repo, action, options)),
        )
        .buffered(concurrency)
        .collect()
        .await)
    }

    fn plan(&self, entry: &CollectionEntry, repo: &Path, file: &AnnexFile) -> ReconciliationAction {
        let (level, level_source) = match entity_id_for(&file.path, &self.access) {
            Some(eid) => entry.level_for(&eid),
            None => (&entry.level, LevelSource::Collection),
        };
        let present = materialized(repo, &file.path);

        let (action, result) = match level.wants_present(&file.path, &self.access) {
            Some(desired) => match Action::decide(desired, present) {
                Action::None => (Action::None, ActionResult::Noop),
                action => (action, ActionResult::Planned),
            },
            None => {
                warn!(
                    "Unrecognized level '{}' for {} in {}",
                    level, file.path, entry.cid
                );
                (Action::None, ActionResult::Noop)
            }
        };
        debug!(
            "{} {} level={} ({:?}) present={} -> {:?}",
            entry.cid, file.path, level, level_source, present, action
        );

        ReconciliationAction {
            cid: entry.cid.clone(),
            path: file.path.clone(),
            level: level.clone(),
            level_source,
            action,
            result,
        }
    }

    async fn execute(
        &self,
        repo: &Path,
        mut action: ReconciliationAction,
        options: &ApplyOptions,
    ) -> ReconciliationAction {
        if action.action == Action::None {
            return action;
        }
        if let Err(reason) = options.cancel.check() {
            action.result = match reason {
                Interrupted::Cancelled => ActionResult::Cancelled,
                Interrupted::DeadlineExceeded => ActionResult::TimedOut,
            };
            return action;
        }

        let limit = options
            .cancel
            .remaining()
            .map_or(options.action_timeout, |left| left.min(options.action_timeout));
        let run = async {
            match action.action {
                Action::Fetch => self.backend.fetch(repo, &action.path).await,
                Action::Release => self.backend.release(repo, &action.path).await,
                Action::None => Ok(String::new()),
            }
        };

        let outcome = tokio::time::timeout(limit, run).await;
        action.result = match outcome {
            Ok(Ok(output)) => ActionResult::Succeeded(output.trim().to_string()),
            Ok(Err(e)) => {
                warn!("{:?} {} failed: {}", action.action, action.path, e);
                ActionResult::Failed(e.to_string())
            }
            Err(_) => {
                warn!("{:?} {} timed out after {:?}", action.action, action.path, limit);
                ActionResult::TimedOut
            }
        };
        action
    }
}

/// Content is materialized when the path resolves; an annexed file without
/// local content is a dangling symlink.
fn materialized(repo: &Path, file: &str) -> bool {
    repo.join(file).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_table() {
        assert_eq!(Action::decide(true, true), Action::None);
        assert_eq!(Action::decide(true, false), Action::Fetch);
        assert_eq!(Action::decide(false, true), Action::Release);
        assert_eq!(Action::decide(false, false), Action::None);
    }

    #[test]
    fn test_entity_id_for() {
        let access = AccessConvention::default();
        assert_eq!(
            entity_id_for(
                "files/ddr-testing-123-4/files/ddr-testing-123-4-master-a1b2c3d4e5.tif",
                &access
            )
            .as_deref(),
            Some("ddr-testing-123-4")
        );
        assert_eq!(
            entity_id_for(
                "files/ddr-testing-123-4/files/ddr-testing-123-4-master-a1b2c3d4e5-a.jpg",
                &access
            )
            .as_deref(),
            Some("ddr-testing-123-4")
        );
        assert_eq!(entity_id_for("README", &access), None);
    }

    #[test]
    fn test_options_filter() {
        let options = ApplyOptions::default().with_cids(["ddr-testing-123"]);
        assert!(options.includes("ddr-testing-123"));
        assert!(!options.includes("ddr-testing-124"));
        assert!(ApplyOptions::default().includes("anything"));
        assert!(!ApplyOptions::default().confirmed);
        // an empty subset is no subset
        let empty = ApplyOptions::default().with_cids(Vec::<String>::new());
        assert!(empty.includes("ddr-testing-123"));
    }

    #[test]
    fn test_action_result_serialization() {
        let json = serde_json::to_value(ActionResult::Failed("no remote".into())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["output"], "no remote");
    }
}
