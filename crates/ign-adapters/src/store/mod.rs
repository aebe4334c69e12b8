//! Persistence adapters for project state and template manifests.

mod json;
mod memory;

pub use json::{JsonManifestStore, JsonProjectStore};
pub use memory::{FailOn, MemoryProjectStore};
