/// Middleware modules for the API server
///
/// - `security`: OWASP security headers on every response
/// - `rate_limit`: Redis-backed fixed-window limit per client IP

pub mod rate_limit;
pub mod security;
