//! # projectmgr Shared Library
//!
//! This crate contains the domain types, persistence and authentication
//! building blocks used by the projectmgr API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, projects, list filters and their SQL operations
//! - `store`: Storage handle injected into the API (PostgreSQL or in-memory)
//! - `auth`: Password hashing, JWT tokens, identity resolution, ownership checks
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the projectmgr shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
