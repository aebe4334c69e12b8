//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `ign-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `TemplateProvider`: Resolve a template reference to a local tree
//!   - `ContentHasher`: Digest a template tree
//!   - `DirectiveScanner`: Extract variable declarations
//!   - `Generator`: Materialize project files
//!   - `ProjectStateStore`: Project manifest and variables under `.ign/`
//!   - `TemplateManifestStore`: Template `ign.json`
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    ContentHasher, DirectiveScanner, FetchedTemplate, GenerationRequest, Generator,
    ProjectStateStore, TemplateManifestStore, TemplateProvider,
};
