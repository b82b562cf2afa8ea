/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh and current user
/// - `companies`: Company-formation files
/// - `documents`: Generated documents attached to companies
/// - `payments`: Payment proof submission and admin review
/// - `admin`: Statistics and user management

pub mod admin;
pub mod auth;
pub mod companies;
pub mod documents;
pub mod health;
pub mod payments;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;
pub const MAX_ADMIN_NOTES_LEN: usize = 2000;

/// Resolves a `?limit=` value, capping it at [`MAX_LIST_LIMIT`]
pub fn resolve_limit(limit: Option<i64>) -> ApiResult<i64> {
    match limit {
        None => Ok(DEFAULT_LIST_LIMIT),
        Some(n) if n < 1 => Err(ApiError::validation("limit", "Limit must be at least 1")),
        Some(n) => Ok(n.min(MAX_LIST_LIMIT)),
    }
}

/// Trims review notes; blank notes are stored as NULL
pub fn normalize_notes(notes: Option<String>) -> ApiResult<Option<String>> {
    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    if notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_ADMIN_NOTES_LEN)
    {
        return Err(ApiError::validation(
            "adminNotes",
            format!("Admin notes must be at most {} characters", MAX_ADMIN_NOTES_LEN),
        ));
    }

    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None).unwrap(), 50);
        assert_eq!(resolve_limit(Some(10)).unwrap(), 10);
        assert_eq!(resolve_limit(Some(5000)).unwrap(), 200);
        assert!(resolve_limit(Some(0)).is_err());
        assert!(resolve_limit(Some(-3)).is_err());
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes(None).unwrap(), None);
        assert_eq!(normalize_notes(Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            normalize_notes(Some(" duplicate ".to_string())).unwrap().as_deref(),
            Some("duplicate")
        );
        assert!(normalize_notes(Some("x".repeat(MAX_ADMIN_NOTES_LEN + 1))).is_err());
    }
}
