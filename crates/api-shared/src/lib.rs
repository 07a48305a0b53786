//! # API Shared
//!
//! Shared utilities and definitions for the LST API surface.
//!
//! Contains:
//! - Wire request/response types (`dto` module)
//! - Shared services like `HealthService`
//! - The trusted session context extractor (facility + user id)
//!
//! Used by `api-rest` and the `lst-run` launcher for common functionality.

pub mod context;
pub mod dto;
pub mod health;

pub use context::FacilityContext;
pub use health::{HealthRes, HealthService};
