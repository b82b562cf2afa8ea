/// Role and ownership guards
///
/// Two roles exist: `client` and `admin`. Admins may read every resource and
/// are the only ones allowed to review companies and payments. Clients may
/// only touch what they own.
///
/// # Example
///
/// ```
/// use incorpo_shared::auth::authorization::{require_admin, require_owner_or_admin};
/// use incorpo_shared::auth::middleware::AuthContext;
/// use incorpo_shared::models::user::UserRole;
///
/// let client = AuthContext {
///     user_id: 7,
///     email: "awa@example.com".to_string(),
///     full_name: "Awa Diallo".to_string(),
///     role: UserRole::Client,
/// };
///
/// assert!(require_owner_or_admin(&client, 7).is_ok());
/// assert!(require_owner_or_admin(&client, 8).is_err());
/// assert!(require_admin(&client).is_err());
/// ```

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks; always maps to 403
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Admin access required")]
    AdminRequired,

    #[error("This action is reserved for client accounts")]
    ClientRequired,

    #[error("Not authorized to access this resource")]
    NotOwner,
}

pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.role != UserRole::Admin {
        return Err(AuthzError::AdminRequired);
    }

    Ok(())
}

pub fn require_client(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.role != UserRole::Client {
        return Err(AuthzError::ClientRequired);
    }

    Ok(())
}

/// Allows the resource owner or any admin
pub fn require_owner_or_admin(auth: &AuthContext, owner_id: i64) -> Result<(), AuthzError> {
    if auth.is_admin() || auth.user_id == owner_id {
        return Ok(());
    }

    Err(AuthzError::NotOwner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(user_id: i64, role: UserRole) -> AuthContext {
        AuthContext {
            user_id,
            email: format!("user{}@example.com", user_id),
            full_name: format!("User {}", user_id),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&ctx(1, UserRole::Admin)).is_ok());
        assert_eq!(
            require_admin(&ctx(2, UserRole::Client)),
            Err(AuthzError::AdminRequired)
        );
    }

    #[test]
    fn test_require_client() {
        assert!(require_client(&ctx(2, UserRole::Client)).is_ok());
        assert_eq!(
            require_client(&ctx(1, UserRole::Admin)),
            Err(AuthzError::ClientRequired)
        );
    }

    #[test]
    fn test_require_owner_or_admin() {
        let owner = ctx(5, UserRole::Client);
        let stranger = ctx(6, UserRole::Client);
        let admin = ctx(1, UserRole::Admin);

        assert!(require_owner_or_admin(&owner, 5).is_ok());
        assert_eq!(require_owner_or_admin(&stranger, 5), Err(AuthzError::NotOwner));
        assert!(require_owner_or_admin(&admin, 5).is_ok());
    }
}
