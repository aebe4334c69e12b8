//! Template provider adapters.

mod local;

pub use local::LocalProvider;
