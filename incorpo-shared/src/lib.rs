//! # Incorpo Shared Library
//!
//! This crate contains the types, persistence and authentication logic used by
//! the Incorpo API server.
//!
//! ## Module Organization
//!
//! - `auth`: JWT tokens, password hashing, request authentication and guards
//! - `db`: Connection pool and migrations
//! - `models`: Database models (users, companies, payments, documents, stats)
//! - `redis`: Redis client used for rate limiting
//! - `storage`: Upload storage for payment proofs and company documents

pub mod auth;
pub mod db;
pub mod models;
pub mod redis;
pub mod storage;

/// Current version of the Incorpo shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
