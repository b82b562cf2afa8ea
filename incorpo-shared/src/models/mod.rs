/// Database models for Incorpo
///
/// Each model is a plain struct deriving `sqlx::FromRow` with async CRUD
/// functions taking a `&PgPool`.
///
/// # Models
///
/// - `user`: Client and admin accounts
/// - `company`: Company-formation files reviewed by admins
/// - `payment`: Mobile-money payment proofs and their verification
/// - `document`: Generated documents attached to a company
/// - `stats`: Read-only aggregations for the admin dashboard
///
/// # Example
///
/// ```no_run
/// use incorpo_shared::models::payment::Payment;
/// use incorpo_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let pending = Payment::list_pending(&pool, 50).await?;
/// println!("{} proofs awaiting review", pending.len());
/// # Ok(())
/// # }
/// ```

pub mod company;
pub mod document;
pub mod payment;
pub mod stats;
pub mod user;
