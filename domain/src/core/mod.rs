//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`] — models the Copilot CLI can serve
//! - [`error::DomainError`] — domain-level errors

pub mod error;
pub mod model;
