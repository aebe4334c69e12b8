//! Infrastructure adapters for ign.
//!
//! This crate implements the ports defined in `ign_core::application::ports`.
//! It contains all filesystem access: walking, hashing, scanning, generation
//! and persistence of project state.

pub mod generator;
pub mod hasher;
pub mod provider;
pub mod scanner;
pub mod store;
pub mod walker;

// Re-export commonly used adapters
pub use generator::SimpleGenerator;
pub use hasher::Sha256Hasher;
pub use provider::LocalProvider;
pub use scanner::FsDirectiveScanner;
pub use store::{FailOn, JsonManifestStore, JsonProjectStore, MemoryProjectStore};
