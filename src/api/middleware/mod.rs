//! HTTP middleware for request processing.
//!
//! Provides observability and request deadline middleware.

pub mod timeout;
pub mod tracing;
