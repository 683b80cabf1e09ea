//! Domain layer containing business entities and contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`lookup`] - Outcome model of the read-through lookup
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Lookup orchestration lives in [`crate::application::services`]

pub mod entities;
pub mod lookup;
pub mod repositories;
