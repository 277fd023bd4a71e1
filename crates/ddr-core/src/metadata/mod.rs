//! Metadata persistence.
//!
//! Manifests and organization descriptors are loaded wholesale and saved
//! wholesale through the atomic JSON helpers here.

mod atomic;

pub use atomic::{atomic_read_json, atomic_write_json};
