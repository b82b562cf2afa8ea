/// Read-only aggregations for the admin dashboard
///
/// Every query takes an optional lower bound computed from a [`Period`] and
/// never writes. Sums over `BIGINT` columns are cast back to `BIGINT` because
/// Postgres returns `NUMERIC` for them.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest accepted period count, whatever the unit
const MAX_PERIOD_VALUE: u32 = 3650;

/// Errors from parsing a period string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Period must not be empty")]
    Empty,

    #[error("Unknown period unit '{0}', expected one of d, w, m, y")]
    UnknownUnit(char),

    #[error("Invalid period value '{0}'")]
    InvalidValue(String),
}

/// Unit of a [`Period`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodUnit {
    fn suffix(&self) -> char {
        match self {
            PeriodUnit::Day => 'd',
            PeriodUnit::Week => 'w',
            PeriodUnit::Month => 'm',
            PeriodUnit::Year => 'y',
        }
    }
}

/// Reporting window such as `30d`, `12m` or `all`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Last `n` units up to now
    Last(u32, PeriodUnit),

    /// No lower bound
    All,
}

impl Default for Period {
    fn default() -> Self {
        Period::Last(30, PeriodUnit::Day)
    }
}

impl Period {
    /// Lower bound of the window relative to `now`, or None for [`Period::All`]
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Period::All => None,
            Period::Last(n, PeriodUnit::Day) => Some(now - Duration::days(i64::from(n))),
            Period::Last(n, PeriodUnit::Week) => Some(now - Duration::weeks(i64::from(n))),
            Period::Last(n, PeriodUnit::Month) => now.checked_sub_months(Months::new(n)),
            Period::Last(n, PeriodUnit::Year) => now.checked_sub_months(Months::new(n * 12)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::All => f.write_str("all"),
            Period::Last(n, unit) => write!(f, "{}{}", n, unit.suffix()),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();

        if s.is_empty() {
            return Err(PeriodError::Empty);
        }
        if s == "all" {
            return Ok(Period::All);
        }

        // Non-empty, so there is a last char
        let unit_char = s.chars().last().ok_or(PeriodError::Empty)?;
        let unit = match unit_char {
            'd' => PeriodUnit::Day,
            'w' => PeriodUnit::Week,
            'm' => PeriodUnit::Month,
            'y' => PeriodUnit::Year,
            c if c.is_ascii_digit() => return Err(PeriodError::InvalidValue(s)),
            c => return Err(PeriodError::UnknownUnit(c)),
        };

        let digits = &s[..s.len() - unit_char.len_utf8()];
        let value: u32 = digits
            .parse()
            .map_err(|_| PeriodError::InvalidValue(s.clone()))?;

        if value == 0 || value > MAX_PERIOD_VALUE {
            return Err(PeriodError::InvalidValue(s));
        }

        Ok(Period::Last(value, unit))
    }
}

/// Headline counters
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_users: i64,
    pub new_users: i64,
    pub total_companies: i64,
    pub new_companies: i64,
    pub pending_companies: i64,
    pub approved_companies: i64,
    pub total_payments: i64,
    pub pending_payments: i64,
    pub verified_payments: i64,
    pub rejected_payments: i64,

    /// Sum of verified payment amounts in the period
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTotals {
    pub total: i64,
    pub verified_count: i64,
    pub average: Option<f64>,

    /// Amount still awaiting review
    pub pending_total: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MethodRevenue {
    pub method: String,
    pub total: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyAmount {
    pub day: NaiveDate,
    pub total: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    pub totals: RevenueTotals,
    pub by_method: Vec<MethodRevenue>,
    pub daily: Vec<DailyAmount>,
}

/// Count for one value of a grouping column
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub total: i64,
    pub by_status: Vec<LabelCount>,
    pub by_legal_form: Vec<LabelCount>,
    pub daily: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub by_role: Vec<LabelCount>,
    pub daily_signups: Vec<DailyCount>,
}

/// One entry of the recent-activity feed
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// `user_registered`, `company_created`, `payment_submitted` or `payment_reviewed`
    pub kind: String,
    pub entity_id: i64,

    /// Acting user, when known
    pub user_id: Option<i64>,

    pub label: String,
    pub status: String,
    pub occurred_at: DateTime<Utc>,
}

pub async fn overview(pool: &PgPool, since: Option<DateTime<Utc>>) -> Result<Overview, sqlx::Error> {
    sqlx::query_as::<_, Overview>(
        "SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users
               WHERE $1::timestamptz IS NULL OR created_at >= $1) AS new_users,
            (SELECT COUNT(*) FROM companies) AS total_companies,
            (SELECT COUNT(*) FROM companies
               WHERE $1::timestamptz IS NULL OR created_at >= $1) AS new_companies,
            (SELECT COUNT(*) FROM companies WHERE status = 'pending') AS pending_companies,
            (SELECT COUNT(*) FROM companies WHERE status = 'approved') AS approved_companies,
            (SELECT COUNT(*) FROM payments
               WHERE $1::timestamptz IS NULL OR created_at >= $1) AS total_payments,
            (SELECT COUNT(*) FROM payments WHERE status = 'pending') AS pending_payments,
            (SELECT COUNT(*) FROM payments WHERE status = 'verified'
               AND ($1::timestamptz IS NULL OR verified_at >= $1)) AS verified_payments,
            (SELECT COUNT(*) FROM payments WHERE status = 'rejected'
               AND ($1::timestamptz IS NULL OR verified_at >= $1)) AS rejected_payments,
            (SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payments WHERE status = 'verified'
               AND ($1::timestamptz IS NULL OR verified_at >= $1)) AS revenue",
    )
    .bind(since)
    .fetch_one(pool)
    .await
}

/// Revenue from verified payments, bucketed by verification day
pub async fn revenue(
    pool: &PgPool,
    since: Option<DateTime<Utc>>,
) -> Result<RevenueStats, sqlx::Error> {
    let totals = sqlx::query_as::<_, RevenueTotals>(
        "SELECT
            COALESCE(SUM(amount) FILTER (WHERE status = 'verified'), 0)::BIGINT AS total,
            COUNT(*) FILTER (WHERE status = 'verified') AS verified_count,
            (AVG(amount) FILTER (WHERE status = 'verified'))::FLOAT8 AS average,
            COALESCE(SUM(amount) FILTER (WHERE status = 'pending'), 0)::BIGINT AS pending_total
         FROM payments
         WHERE $1::timestamptz IS NULL OR COALESCE(verified_at, created_at) >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    let by_method = sqlx::query_as::<_, MethodRevenue>(
        "SELECT method, COALESCE(SUM(amount), 0)::BIGINT AS total, COUNT(*) AS count
         FROM payments
         WHERE status = 'verified'
           AND ($1::timestamptz IS NULL OR verified_at >= $1)
         GROUP BY method
         ORDER BY total DESC, method",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let daily = sqlx::query_as::<_, DailyAmount>(
        "SELECT verified_at::date AS day,
                COALESCE(SUM(amount), 0)::BIGINT AS total,
                COUNT(*) AS count
         FROM payments
         WHERE status = 'verified'
           AND verified_at IS NOT NULL
           AND ($1::timestamptz IS NULL OR verified_at >= $1)
         GROUP BY day
         ORDER BY day",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(RevenueStats {
        totals,
        by_method,
        daily,
    })
}

/// Companies created in the period, grouped by status, legal form and day
pub async fn companies(
    pool: &PgPool,
    since: Option<DateTime<Utc>>,
) -> Result<CompanyStats, sqlx::Error> {
    let by_status = sqlx::query_as::<_, LabelCount>(
        "SELECT status::text AS label, COUNT(*) AS count
         FROM companies
         WHERE $1::timestamptz IS NULL OR created_at >= $1
         GROUP BY status
         ORDER BY label",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let by_legal_form = sqlx::query_as::<_, LabelCount>(
        "SELECT legal_form AS label, COUNT(*) AS count
         FROM companies
         WHERE $1::timestamptz IS NULL OR created_at >= $1
         GROUP BY legal_form
         ORDER BY count DESC, label",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let daily = sqlx::query_as::<_, DailyCount>(
        "SELECT created_at::date AS day, COUNT(*) AS count
         FROM companies
         WHERE $1::timestamptz IS NULL OR created_at >= $1
         GROUP BY day
         ORDER BY day",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let total = by_status.iter().map(|c| c.count).sum();

    Ok(CompanyStats {
        total,
        by_status,
        by_legal_form,
        daily,
    })
}

/// Users registered in the period
pub async fn users(pool: &PgPool, since: Option<DateTime<Utc>>) -> Result<UserStats, sqlx::Error> {
    let (total, active): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active)
         FROM users
         WHERE $1::timestamptz IS NULL OR created_at >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    let by_role = sqlx::query_as::<_, LabelCount>(
        "SELECT role::text AS label, COUNT(*) AS count
         FROM users
         WHERE $1::timestamptz IS NULL OR created_at >= $1
         GROUP BY role
         ORDER BY label",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let daily_signups = sqlx::query_as::<_, DailyCount>(
        "SELECT created_at::date AS day, COUNT(*) AS count
         FROM users
         WHERE $1::timestamptz IS NULL OR created_at >= $1
         GROUP BY day
         ORDER BY day",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(UserStats {
        total,
        active,
        inactive: total - active,
        by_role,
        daily_signups,
    })
}

/// Most recent events across users, companies and payments
pub async fn activities(
    pool: &PgPool,
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        "SELECT kind, entity_id, user_id, label, status, occurred_at FROM (
            SELECT 'user_registered'::text AS kind, u.id AS entity_id, u.id AS user_id,
                   u.full_name::text AS label, u.role::text AS status, u.created_at AS occurred_at
            FROM users u
            WHERE $1::timestamptz IS NULL OR u.created_at >= $1
          UNION ALL
            SELECT 'company_created', c.id, c.owner_id,
                   c.name::text, c.status::text, c.created_at
            FROM companies c
            WHERE $1::timestamptz IS NULL OR c.created_at >= $1
          UNION ALL
            SELECT 'payment_submitted', p.id, p.user_id,
                   p.transaction_reference::text, 'pending', p.created_at
            FROM payments p
            WHERE $1::timestamptz IS NULL OR p.created_at >= $1
          UNION ALL
            SELECT 'payment_reviewed', p.id, p.verified_by,
                   p.transaction_reference::text, p.status::text, p.verified_at
            FROM payments p
            WHERE p.verified_at IS NOT NULL
              AND ($1::timestamptz IS NULL OR p.verified_at >= $1)
         ) feed
         ORDER BY occurred_at DESC, entity_id DESC
         LIMIT $2",
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await
}
