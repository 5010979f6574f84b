//! Service layer for business logic orchestration
//!
//! This module contains the service layer that orchestrates publishing,
//! separating concerns from the CLI layer in main.rs.

pub mod publish;

pub use publish::{collect_publications, Providers, PublishService};
