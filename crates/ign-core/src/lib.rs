//! ign Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for ign, the
//! template checkout and update engine: change detection over template trees,
//! directive scanning and variable reconciliation, following hexagonal
//! (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             ign-cli (CLI)               │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (CheckoutService, TemplateService)    │
//! │   prepare → (prompt) → complete         │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Provider, Hasher, Scanner, Generator,  │
//! │  ProjectStateStore, ManifestStore)      │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    ign-adapters (Infrastructure)        │
//! │ (LocalProvider, Sha256Hasher, JSON...)  │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Directives, IgnoreMatcher, Reconciler) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ign_core::prelude::*;
//!
//! let service = CheckoutService::new(provider, hasher, store, generator);
//! let cancel = CancellationToken::new();
//!
//! // 1. Read-only diagnosis
//! let record = service.prepare_checkout(&reference, "./my-app".as_ref(), false, &cancel)?;
//!
//! // 2. Ask for whatever `record.prompts()` lists, then apply
//! let report = service.complete(record, values, CompleteOptions::default())?;
//! ```

pub mod domain;

pub mod application;

pub mod cancel;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        CheckoutService, CollectReport, CompleteOptions, CompletionReport, PreparationRecord,
        TemplateService,
        ports::{
            ContentHasher, DirectiveScanner, FetchedTemplate, GenerationRequest, Generator,
            ProjectStateStore, TemplateManifestStore, TemplateProvider,
        },
    };
    pub use crate::cancel::CancellationToken;
    pub use crate::domain::{
        CheckoutMode, GenerationReport, IgnoreMatcher, MergeMode, ProjectManifest,
        ProjectVariables, ScanReport, TemplateManifest, TemplateRef, VarType, VarValue,
        VariableDeclaration,
    };
    pub use crate::error::{IgnError, IgnResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
