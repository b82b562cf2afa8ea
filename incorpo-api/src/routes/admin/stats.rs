/// Admin statistics
///
/// # Endpoints
///
/// - `GET /api/admin/stats/overview`
/// - `GET /api/admin/stats/revenue`
/// - `GET /api/admin/stats/companies`
/// - `GET /api/admin/stats/users`
/// - `GET /api/admin/stats/activities`
///
/// Every endpoint accepts `?period=` (`7d`, `30d`, `12w`, `6m`, `1y`, `all`;
/// default `30d`). Aggregates are computed on each request; nothing is
/// cached or written.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ApiQuery,
    response::ApiResponse,
    routes::resolve_limit,
};
use axum::extract::State;
use chrono::{DateTime, Utc};
use incorpo_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::stats::{self, Activity, CompanyStats, Overview, Period, RevenueStats, UserStats},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub period: Option<String>,
    pub limit: Option<i64>,
}

/// Aggregates tagged with the window they cover
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats<T: Serialize> {
    pub period: String,

    /// Start of the window; null for `all`
    pub since: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub stats: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFeed {
    pub period: String,
    pub since: Option<DateTime<Utc>>,
    pub activities: Vec<Activity>,
}

/// Parses `?period=`, falling back to the default window
pub fn resolve_period(raw: Option<&str>) -> ApiResult<Period> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(value.parse::<Period>()?),
        None => Ok(Period::default()),
    }
}

fn window(raw: Option<&str>) -> ApiResult<(Period, Option<DateTime<Utc>>)> {
    let period = resolve_period(raw)?;
    let since = period.since(Utc::now());
    Ok((period, since))
}

pub async fn overview(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<ApiResponse<PeriodStats<Overview>>> {
    require_admin(&auth)?;
    let (period, since) = window(query.period.as_deref())?;

    let stats = stats::overview(&state.db, since).await?;

    Ok(ApiResponse::ok(PeriodStats {
        period: period.to_string(),
        since,
        stats,
    }))
}

/// Verified revenue, counted on the verification date
pub async fn revenue(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<ApiResponse<PeriodStats<RevenueStats>>> {
    require_admin(&auth)?;
    let (period, since) = window(query.period.as_deref())?;

    let stats = stats::revenue(&state.db, since).await?;

    Ok(ApiResponse::ok(PeriodStats {
        period: period.to_string(),
        since,
        stats,
    }))
}

pub async fn companies(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<ApiResponse<PeriodStats<CompanyStats>>> {
    require_admin(&auth)?;
    let (period, since) = window(query.period.as_deref())?;

    let stats = stats::companies(&state.db, since).await?;

    Ok(ApiResponse::ok(PeriodStats {
        period: period.to_string(),
        since,
        stats,
    }))
}

pub async fn users(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<ApiResponse<PeriodStats<UserStats>>> {
    require_admin(&auth)?;
    let (period, since) = window(query.period.as_deref())?;

    let stats = stats::users(&state.db, since).await?;

    Ok(ApiResponse::ok(PeriodStats {
        period: period.to_string(),
        since,
        stats,
    }))
}

/// Recent registrations, company files and payment events, newest first
pub async fn activities(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> ApiResult<ApiResponse<ActivityFeed>> {
    require_admin(&auth)?;
    let (period, since) = window(query.period.as_deref())?;
    let limit = resolve_limit(query.limit)?;

    let activities = stats::activities(&state.db, since, limit).await?;

    Ok(ApiResponse::ok(ActivityFeed {
        period: period.to_string(),
        since,
        activities,
    }))
}
