/// Company-formation file endpoints
///
/// # Endpoints
///
/// - `POST /api/companies` - Client creates a file
/// - `GET /api/companies` - Own files (admins see all, `?status=` filter)
/// - `GET /api/companies/:id` - One file (owner or admin)
/// - `PUT /api/companies/admin/:id/status` - Approve or reject (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    response::ApiResponse,
    routes::{normalize_notes, resolve_limit},
};
use axum::extract::State;
use incorpo_shared::{
    auth::{
        authorization::{require_admin, require_client, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::company::{Company, CompanyStatus, CreateCompany},
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

pub const LEGAL_FORMS: &[&str] = &["EI", "GIE", "SA", "SARL", "SARLU", "SAS", "SASU", "SCI", "SNC"];

fn validate_legal_form(value: &str) -> Result<(), ValidationError> {
    if LEGAL_FORMS.contains(&value.trim().to_ascii_uppercase().as_str()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("legal_form");
        error.message = Some(format!("Legal form must be one of: {}", LEGAL_FORMS.join(", ")).into());
        Err(error)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be 2 to 255 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_legal_form"))]
    pub legal_form: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "Share capital cannot be negative"))]
    pub share_capital: i64,

    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanyListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyStatusRequest {
    /// `approved` or `rejected`
    pub status: String,

    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Creates a company-formation file in `pending` status
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Caller is an admin
pub async fn create_company(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateCompanyRequest>,
) -> ApiResult<ApiResponse<Company>> {
    require_client(&auth)?;
    req.validate()?;

    let company = Company::create(
        &state.db,
        CreateCompany {
            owner_id: auth.user_id,
            name: req.name.trim().to_string(),
            legal_form: req.legal_form.trim().to_ascii_uppercase(),
            share_capital: req.share_capital,
            address: req
                .address
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        },
    )
    .await?;

    tracing::info!(company_id = company.id, owner_id = company.owner_id, "Company created");

    Ok(ApiResponse::created(company))
}

/// Lists companies newest first
///
/// Clients only see their own; admins see all and may filter by status.
pub async fn list_companies(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<CompanyListQuery>,
) -> ApiResult<ApiResponse<Vec<Company>>> {
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<CompanyStatus>()
                .map_err(|message| ApiError::validation("status", message))
        })
        .transpose()?;
    let limit = resolve_limit(query.limit)?;
    let offset = query.offset.unwrap_or(0).max(0);

    let owner_id = if auth.is_admin() {
        None
    } else {
        Some(auth.user_id)
    };

    let companies = Company::list(&state.db, owner_id, status, limit, offset).await?;

    Ok(ApiResponse::ok(companies))
}

/// Gets one company; visible to its owner and to admins
pub async fn get_company(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<ApiResponse<Company>> {
    let company = load_company(&state, id).await?;
    require_owner_or_admin(&auth, company.owner_id)?;

    Ok(ApiResponse::ok(company))
}

/// Approves or rejects a pending company
///
/// # Errors
///
/// - `400 Bad Request`: Status is not `approved` or `rejected`
/// - `404 Not Found`: Unknown company
/// - `409 Conflict`: Company was already reviewed
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateCompanyStatusRequest>,
) -> ApiResult<ApiResponse<Company>> {
    require_admin(&auth)?;

    let target = review_target(&req.status)?;
    let admin_notes = normalize_notes(req.admin_notes)?;

    match Company::transition_status(&state.db, id, target, admin_notes).await? {
        Some(company) => {
            tracing::info!(
                company_id = company.id,
                admin_id = auth.user_id,
                status = company.status.as_str(),
                "Company reviewed"
            );
            Ok(ApiResponse::ok(company))
        }
        None => {
            let existing = load_company(&state, id).await?;
            Err(ApiError::Conflict(format!(
                "Company has already been {}",
                existing.status.as_str()
            )))
        }
    }
}

fn review_target(status: &str) -> ApiResult<CompanyStatus> {
    match status.parse::<CompanyStatus>() {
        Ok(target) if CompanyStatus::Pending.can_transition_to(target) => Ok(target),
        _ => Err(ApiError::validation(
            "status",
            "Status must be one of: approved, rejected",
        )),
    }
}

pub(crate) async fn load_company(state: &AppState, id: i64) -> ApiResult<Company> {
    Company::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(legal_form: &str, share_capital: i64) -> CreateCompanyRequest {
        CreateCompanyRequest {
            name: "Diallo Services".to_string(),
            legal_form: legal_form.to_string(),
            share_capital,
            address: None,
        }
    }

    #[test]
    fn test_legal_form_validation() {
        assert!(request("SARL", 1_000_000).validate().is_ok());
        assert!(request("sasu", 0).validate().is_ok());

        let errors = request("LLC", 0).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("legal_form"));
    }

    #[test]
    fn test_negative_share_capital_rejected() {
        let errors = request("SA", -1).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("share_capital"));
    }

    #[test]
    fn test_review_target_only_leaves_pending() {
        assert_eq!(review_target("approved").unwrap(), CompanyStatus::Approved);
        assert_eq!(review_target(" Rejected ").unwrap(), CompanyStatus::Rejected);

        for invalid in ["pending", "verified", ""] {
            match review_target(invalid) {
                Err(ApiError::ValidationError(errors)) => assert_eq!(errors[0].field, "status"),
                other => panic!("expected validation error for {:?}, got {:?}", invalid, other),
            }
        }
    }

    #[test]
    fn test_create_request_defaults_share_capital() {
        let req: CreateCompanyRequest =
            serde_json::from_str(r#"{"name":"Awa Conseil","legalForm":"SASU"}"#).unwrap();
        assert_eq!(req.share_capital, 0);
        assert!(req.validate().is_ok());
    }
}
