//! # Incorpo API Server Library
//!
//! REST backend for company formation: authentication, company files,
//! payment proof review, documents and admin statistics.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with the API error envelope
//! - `middleware`: Security headers and rate limiting
//! - `response`: Success envelope
//! - `routes`: API route handlers
//! - `seed`: Development admin account
//! - `upload`: Multipart form parsing and validation

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod seed;
pub mod upload;
