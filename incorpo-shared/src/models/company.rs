/// Company-formation file model and database operations
///
/// A company is created by a client and reviewed by an admin.
///
/// # State Machine
///
/// ```text
/// pending → approved
///         → rejected
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE company_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE companies (
///     id BIGSERIAL PRIMARY KEY,
///     owner_id BIGINT NOT NULL REFERENCES users(id),
///     name VARCHAR(255) NOT NULL,
///     legal_form VARCHAR(32) NOT NULL,
///     share_capital BIGINT NOT NULL DEFAULT 0,
///     address TEXT,
///     status company_status NOT NULL DEFAULT 'pending',
///     admin_notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;

/// Review status of a company-formation file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "company_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Pending,
    Approved,
    Rejected,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Pending => "pending",
            CompanyStatus::Approved => "approved",
            CompanyStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, target: CompanyStatus) -> bool {
        matches!(
            (self, target),
            (CompanyStatus::Pending, CompanyStatus::Approved)
                | (CompanyStatus::Pending, CompanyStatus::Rejected)
        )
    }
}

impl FromStr for CompanyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(CompanyStatus::Pending),
            "approved" => Ok(CompanyStatus::Approved),
            "rejected" => Ok(CompanyStatus::Rejected),
            other => Err(format!("Unknown company status '{}'", other)),
        }
    }
}

/// Company row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,

    /// Client who created the file
    pub owner_id: i64,

    pub name: String,

    /// Legal form, e.g. "SARL", "SA", "SASU"
    pub legal_form: String,

    /// Share capital in the smallest currency unit
    pub share_capital: i64,

    pub address: Option<String>,
    pub status: CompanyStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a company
#[derive(Debug, Clone)]
pub struct CreateCompany {
    pub owner_id: i64,
    pub name: String,
    pub legal_form: String,
    pub share_capital: i64,
    pub address: Option<String>,
}

const COMPANY_COLUMNS: &str = "id, owner_id, name, legal_form, share_capital, address, status, \
                               admin_notes, created_at, updated_at";

impl Company {
    /// Creates a company in `pending` status
    pub async fn create(pool: &PgPool, data: CreateCompany) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO companies (owner_id, name, legal_form, share_capital, address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COMPANY_COLUMNS}"
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(data.owner_id)
            .bind(data.name)
            .bind(data.legal_form)
            .bind(data.share_capital)
            .bind(data.address)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1");

        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists companies newest first
    ///
    /// `owner_id` restricts the list to one client; `status` filters by review status.
    pub async fn list(
        pool: &PgPool,
        owner_id: Option<i64>,
        status: Option<CompanyStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies
             WHERE ($1::BIGINT IS NULL OR owner_id = $1)
               AND ($2::company_status IS NULL OR status = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(owner_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Moves a pending company to a terminal status
    ///
    /// The update only matches rows still in `pending`, so concurrent reviews
    /// cannot overwrite each other. Returns None when no pending row matched.
    pub async fn transition_status(
        pool: &PgPool,
        id: i64,
        target: CompanyStatus,
        admin_notes: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE companies
             SET status = $2, admin_notes = $3, updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {COMPANY_COLUMNS}"
        );

        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .bind(target)
            .bind(admin_notes)
            .fetch_optional(pool)
            .await
    }
}
