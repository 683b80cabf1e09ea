//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - Authoritative user record lookups

pub mod pg_user_repository;

pub use pg_user_repository::PgUserRepository;
