//! Application layer containing business logic and service orchestration.
//!
//! # Modules
//!
//! - [`services`] - The read-through [`services::UserService`]
//! - [`inflight`] - Per-key coalescing of concurrent cache misses
//! - [`cache_writer`] - Detached, bounded cache repopulation

pub mod cache_writer;
pub mod inflight;
pub mod services;
