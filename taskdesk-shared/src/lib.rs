//! # Taskdesk Shared Library
//!
//! This crate contains the data-access core of Taskdesk: the User and Task
//! data shapes, their validation and derived values, and the two stores that
//! own persistence and invariant enforcement for each entity.
//!
//! ## Module Organization
//!
//! - `models`: Data shapes, pure validation and derivation functions
//! - `validation`: Field-level violation types shared by all validators
//! - `pagination`: Page/limit parsing, clamping and page metadata
//! - `password`: Argon2id password hashing and verification
//! - `db`: Persistence handle, connection pool, migrations and backends
//! - `stores`: `UserStore` and `TaskStore`
//! - `error`: The store error taxonomy

pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod password;
pub mod stores;
pub mod validation;

pub use error::{StoreError, StoreResult};

/// Current version of the Taskdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
