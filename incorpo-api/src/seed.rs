/// Default admin account for local development
///
/// When `APP_ENV=development` and both `ADMIN_EMAIL` and `ADMIN_PASSWORD` are
/// set, an admin with that email is created on startup unless one exists.
/// Other environments never seed.

use crate::config::{Config, SeedAdmin};
use incorpo_shared::{
    auth::password,
    models::user::{CreateUser, User, UserRole},
};
use sqlx::PgPool;

/// Seed credentials that apply to this configuration, if any
pub fn seed_credentials(config: &Config) -> Option<&SeedAdmin> {
    if !config.environment.is_development() {
        return None;
    }
    config.seed_admin.as_ref()
}

/// Creates the default admin if configured and missing
///
/// Returns the id of the created admin, or None when nothing was done.
pub async fn seed_default_admin(pool: &PgPool, config: &Config) -> anyhow::Result<Option<i64>> {
    let Some(seed) = seed_credentials(config) else {
        return Ok(None);
    };

    if User::find_by_email(pool, &seed.email).await?.is_some() {
        tracing::debug!(email = %seed.email, "Default admin already exists");
        return Ok(None);
    }

    password::validate_password_strength(&seed.password)
        .map_err(|e| anyhow::anyhow!("ADMIN_PASSWORD rejected: {}", e))?;
    let password_hash = password::hash_password(&seed.password)?;

    let admin = User::create(
        pool,
        CreateUser {
            email: seed.email.clone(),
            password_hash,
            full_name: "Administrator".to_string(),
            phone: None,
            role: UserRole::Admin,
        },
    )
    .await?;

    tracing::info!(user_id = admin.id, email = %admin.email, "Seeded default admin");

    Ok(Some(admin.id))
}
