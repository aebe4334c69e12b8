//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "check out a template" or "collect declarations".

pub mod checkout_service;
pub mod template_service;

pub use checkout_service::{
    CheckoutService, CompleteOptions, CompletionReport, PreparationRecord,
};
pub use template_service::{CollectReport, TemplateService};
