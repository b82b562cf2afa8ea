/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength policy
/// - [`jwt`]: Access/refresh token issue and validation
/// - [`middleware`]: Bearer-token authentication and the [`middleware::AuthContext`] extractor
/// - [`authorization`]: Admin, client and owner-or-admin guards
///
/// # Example
///
/// ```no_run
/// use incorpo_shared::auth::password::{hash_password, verify_password};
/// use incorpo_shared::auth::jwt::create_token_pair;
/// use incorpo_shared::models::user::UserRole;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("abidjan2025")?;
/// assert!(verify_password("abidjan2025", &hash)?);
///
/// let tokens = create_token_pair(1, UserRole::Client, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
