/// Payment model and database operations
///
/// Clients pay off-platform by mobile money and submit a proof (phone number,
/// transaction reference, screenshot). An admin then verifies or rejects it.
///
/// # State Machine
///
/// ```text
/// pending → verified
///         → rejected
/// ```
///
/// Terminal states are written exactly once: the transition query only
/// matches rows that are still `pending`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE payment_status AS ENUM ('pending', 'verified', 'rejected');
///
/// CREATE TABLE payments (
///     id BIGSERIAL PRIMARY KEY,
///     company_id BIGINT NOT NULL REFERENCES companies(id),
///     user_id BIGINT NOT NULL REFERENCES users(id),
///     amount BIGINT NOT NULL CHECK (amount > 0),
///     method VARCHAR(32) NOT NULL,
///     status payment_status NOT NULL DEFAULT 'pending',
///     phone_number VARCHAR(32) NOT NULL,
///     transaction_reference VARCHAR(64) NOT NULL UNIQUE,
///     proof_image_path VARCHAR(512) NOT NULL,
///     admin_notes TEXT,
///     verified_by BIGINT REFERENCES users(id),
///     verified_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use incorpo_shared::models::payment::{Payment, PaymentStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, admin_id: i64) -> Result<(), sqlx::Error> {
/// let pending = Payment::list(&pool, Some(PaymentStatus::Pending), None, 50).await?;
///
/// if let Some(first) = pending.first() {
///     Payment::transition(
///         &pool,
///         first.id,
///         PaymentStatus::Verified,
///         Some("Matched on operator statement".to_string()),
///         admin_id,
///     )
///     .await?;
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

/// Payment review status
///
/// `validated` is accepted as an input spelling of `verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Proof submitted, awaiting review
    Pending,

    /// Admin confirmed the transfer
    #[serde(alias = "validated")]
    Verified,

    /// Admin refused the proof
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Rejected => "rejected",
        }
    }

    /// Only a pending payment may be reviewed, into verified or rejected
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        matches!(
            (self, target),
            (PaymentStatus::Pending, PaymentStatus::Verified)
                | (PaymentStatus::Pending, PaymentStatus::Rejected)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "verified" | "validated" => Ok(PaymentStatus::Verified),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(format!("Unknown payment status '{}'", other)),
        }
    }
}

/// Payment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub company_id: i64,

    /// Client who submitted the proof
    pub user_id: i64,

    /// Amount in the smallest currency unit
    pub amount: i64,

    /// Payment channel, e.g. "orange_money"
    pub method: String,

    pub status: PaymentStatus,
    pub phone_number: String,
    pub transaction_reference: String,

    /// Path of the proof file relative to the upload root
    pub proof_image_path: String,

    pub admin_notes: Option<String>,
    pub verified_by: Option<i64>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a submitted proof
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub company_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub method: String,
    pub phone_number: String,
    pub transaction_reference: String,
    pub proof_image_path: String,
}

const PAYMENT_COLUMNS: &str = "id, company_id, user_id, amount, method, status, phone_number, \
                               transaction_reference, proof_image_path, admin_notes, verified_by, \
                               verified_at, created_at, updated_at";

impl Payment {
    /// Records a new proof in `pending` status
    ///
    /// # Errors
    ///
    /// - Unique violation on `payments_transaction_reference_key` for a reused reference
    /// - Foreign key violation if the company or user does not exist
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments
                 (company_id, user_id, amount, method, phone_number,
                  transaction_reference, proof_image_path)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PAYMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(data.company_id)
            .bind(data.user_id)
            .bind(data.amount)
            .bind(data.method)
            .bind(data.phone_number)
            .bind(data.transaction_reference)
            .bind(data.proof_image_path)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists payments newest first
    ///
    /// `status` filters by review status; `user_id` restricts to one submitter.
    pub async fn list(
        pool: &PgPool,
        status: Option<PaymentStatus>,
        user_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE ($1::payment_status IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR user_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(status)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Pending proofs awaiting review, newest first
    pub async fn list_pending(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        Self::list(pool, Some(PaymentStatus::Pending), None, limit).await
    }

    /// Moves a pending payment to `verified` or `rejected`
    ///
    /// Returns None when the payment does not exist or is no longer pending;
    /// callers distinguish the two with [`Payment::find_by_id`].
    pub async fn transition(
        pool: &PgPool,
        id: i64,
        target: PaymentStatus,
        admin_notes: Option<String>,
        verified_by: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE payments
             SET status = $2,
                 admin_notes = $3,
                 verified_by = $4,
                 verified_at = NOW(),
                 updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {PAYMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(target)
            .bind(admin_notes)
            .bind(verified_by)
            .fetch_optional(pool)
            .await
    }

}
