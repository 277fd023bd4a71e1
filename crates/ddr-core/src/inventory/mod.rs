//! Storage-tier inventory.
//!
//! A *store* manifest records what a physical medium carries and at what
//! level each collection is kept. Stores are grouped into organization
//! repositories. This module loads and validates manifests, classifies
//! collections found on a medium, and reconciles a medium against its
//! manifest through a [`ContentStore`](crate::backend::ContentStore).

mod analyze;
mod organization;
mod reconcile;
mod store;
mod validate;

pub use analyze::{
    analyze, guess_collection_level, guess_drive_label, looks_like_a_collection,
    read_collection_id, Analysis, AnalyzedCollection, GuessedLevel, LevelClassifier,
    SuffixClassifier,
};
pub use organization::{
    is_valid as is_organization, organizations, CollectionKey, CollectionLocation, FileReplicas,
    Organization, OrganizationDescriptor, RemoteListing, ReplicaLocation,
};
pub use reconcile::{
    entity_id_for, Action, ActionResult, ApplyOptions, ApplyReport, CollectionFailure,
    ReconciliationAction, Reconciler,
};
pub use store::{CollectionEntry, EntityOverride, Level, LevelSource, Store};
pub use validate::{validate_organization, validate_store, Validation};
