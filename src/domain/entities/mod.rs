//! Core domain entities.
//!
//! Entities are plain data structures without business logic. A [`UserRecord`]
//! is built fresh from every store or cache read and passed by value between
//! layers.

pub mod user;

pub use user::UserRecord;
