//! DDR Core - identifier resolution and storage-tier inventory for the
//! Densho Digital Repository.
//!
//! Every archival object (repository, organization, collection, entity,
//! file) has a hierarchical identifier with three textual surfaces: an id
//! string, a filesystem path and a URL. [`identifier`] converts between
//! them. [`inventory`] tracks which physical media carry which collections
//! and at what replication level, and reconciles a medium against its
//! manifest through a content-store backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use ddr_core::backend::GitAnnex;
//! use ddr_core::inventory::{ApplyOptions, Reconciler, Store};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ddr_core::Result<()> {
//!     let backend = Arc::new(GitAnnex::detect().await?);
//!     let store = Store::load("/media/WD5000BMV-2/ddr-testing/WD5000BMV-2.json".as_ref())?;
//!
//!     // Dry run: list what would be fetched or released
//!     let report = Reconciler::new(backend).apply(&store, &ApplyOptions::default()).await;
//!     for action in report.pending() {
//!         println!("{:?} {}", action.action, action.path);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod identifier;
pub mod inventory;
pub mod metadata;
pub mod util;

// Re-export commonly used types
pub use cancel::CancelSignal;
pub use config::AccessConvention;
pub use error::{DdrError, IdSurface, Result};
pub use hierarchy::{model_from_id, Model};
pub use identifier::{model_from_path, IdPart, IdParts, IdValue, Identification, Identifier};
pub use inventory::{Level, Organization, Reconciler, Store, Validation};
