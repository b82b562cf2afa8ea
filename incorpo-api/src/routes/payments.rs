/// Payment proof submission and admin review
///
/// # Endpoints
///
/// - `POST /api/payments/submit-proof` - Client submits a proof (multipart)
/// - `GET /api/payments/mine` - Caller's own payments
/// - `GET /api/payments/:id` - One payment (submitter or admin)
/// - `GET /api/payments/admin/pending` - Proofs awaiting review (admin)
/// - `GET /api/payments/admin/all` - All payments, optional status filter (admin)
/// - `PUT /api/payments/admin/:id/verify` - Verify or reject (admin)
///
/// # Review Workflow
///
/// ```text
/// client ── submit-proof ──▶ pending ── admin verify ──▶ verified
///                                    └─ admin verify ──▶ rejected
/// ```
///
/// A payment leaves `pending` exactly once. When two admins review the same
/// payment concurrently, the first update wins and the second gets 409.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    response::ApiResponse,
    routes::{normalize_notes, resolve_limit},
    upload::{MultipartForm, PaymentProofForm},
};
use axum::extract::{multipart::MultipartRejection, Multipart, State};
use incorpo_shared::{
    auth::{
        authorization::{require_admin, require_client, require_owner_or_admin, AuthzError},
        middleware::AuthContext,
    },
    models::{
        company::Company,
        payment::{CreatePayment, Payment, PaymentStatus},
    },
    storage::UploadCategory,
};
use serde::Deserialize;

const PROOF_FIELD: &str = "proofImage";

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// Admin review decision
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    /// `verified` (or `validated`) or `rejected`
    pub status: String,

    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Parses the review decision; `pending` and unknown values are rejected
pub fn review_target(status: &str) -> ApiResult<PaymentStatus> {
    match status.parse::<PaymentStatus>() {
        Ok(target) if PaymentStatus::Pending.can_transition_to(target) => Ok(target),
        _ => Err(ApiError::validation(
            "status",
            "Status must be one of: verified, validated, rejected",
        )),
    }
}

fn parse_status_filter(status: Option<&str>) -> ApiResult<Option<PaymentStatus>> {
    status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<PaymentStatus>()
                .map_err(|message| ApiError::validation("status", message))
        })
        .transpose()
}

/// Submits a proof of payment for one of the caller's companies
///
/// Multipart fields: `companyId`, `phoneNumber`, `transactionReference`,
/// `proofImage` (file), optional `amount` and `method`.
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid field, unsupported image type
/// - `403 Forbidden`: Caller is an admin or does not own the company
/// - `404 Not Found`: Company does not exist
/// - `409 Conflict`: Transaction reference already submitted
/// - `413 Payload Too Large`: Image exceeds `MAX_UPLOAD_BYTES`
pub async fn submit_payment_proof(
    State(state): State<AppState>,
    auth: AuthContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Payment>> {
    require_client(&auth)?;

    let mut form = MultipartForm::read(multipart?, state.config.uploads.max_bytes).await?;
    let proof = PaymentProofForm::from_form(&form)?;
    let image = form
        .take_file(PROOF_FIELD)
        .ok_or_else(|| ApiError::validation(PROOF_FIELD, "Payment proof image is required"))?;

    if !UploadCategory::PaymentProof.accepts(&image.content_type) {
        return Err(ApiError::validation(
            PROOF_FIELD,
            format!(
                "Unsupported file type '{}'; expected JPEG, PNG, WebP or PDF",
                image.content_type
            ),
        ));
    }

    let company = Company::find_by_id(&state.db, proof.company_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    if company.owner_id != auth.user_id {
        tracing::warn!(
            user_id = auth.user_id,
            company_id = company.id,
            "Payment proof submitted for another user's company"
        );
        return Err(AuthzError::NotOwner.into());
    }

    let stored = state
        .storage
        .save(UploadCategory::PaymentProof, &image.content_type, &image.bytes)
        .await?;

    let created = Payment::create(
        &state.db,
        CreatePayment {
            company_id: company.id,
            user_id: auth.user_id,
            amount: proof.amount.unwrap_or(state.config.payments.default_amount),
            method: proof
                .method
                .unwrap_or_else(|| state.config.payments.default_method.clone()),
            phone_number: proof.phone_number,
            transaction_reference: proof.transaction_reference,
            proof_image_path: stored.relative_path.clone(),
        },
    )
    .await;

    let payment = match created {
        Ok(payment) => payment,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&stored.relative_path).await {
                tracing::warn!(
                    path = %stored.relative_path,
                    error = %cleanup,
                    "Failed to remove orphaned payment proof"
                );
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        payment_id = payment.id,
        company_id = payment.company_id,
        user_id = payment.user_id,
        amount = payment.amount,
        "Payment proof submitted"
    );

    Ok(ApiResponse::created(payment).with_message("Payment proof submitted, awaiting verification"))
}

/// Lists the caller's own payments, newest first
pub async fn my_payments(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<PaymentListQuery>,
) -> ApiResult<ApiResponse<Vec<Payment>>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let limit = resolve_limit(query.limit)?;

    let payments = Payment::list(&state.db, status, Some(auth.user_id), limit).await?;

    Ok(ApiResponse::ok(payments))
}

/// Gets one payment; visible to its submitter and to admins
pub async fn get_payment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<ApiResponse<Payment>> {
    let payment = Payment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    require_owner_or_admin(&auth, payment.user_id)?;

    Ok(ApiResponse::ok(payment))
}

/// Lists payments awaiting review, newest first
pub async fn get_pending_payments(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<ApiResponse<Vec<Payment>>> {
    require_admin(&auth)?;
    let limit = resolve_limit(query.limit)?;

    let payments = Payment::list_pending(&state.db, limit).await?;

    Ok(ApiResponse::ok(payments))
}

/// Lists all payments, optionally filtered by `?status=`
pub async fn admin_get_all_payments(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<PaymentListQuery>,
) -> ApiResult<ApiResponse<Vec<Payment>>> {
    require_admin(&auth)?;
    let status = parse_status_filter(query.status.as_deref())?;
    let limit = resolve_limit(query.limit)?;

    let payments = Payment::list(&state.db, status, None, limit).await?;

    Ok(ApiResponse::ok(payments))
}

/// Verifies or rejects a pending payment
///
/// # Errors
///
/// - `400 Bad Request`: Status is not `verified`, `validated` or `rejected`
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: Unknown payment
/// - `409 Conflict`: Payment was already reviewed
pub async fn admin_verify_payment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<VerifyPaymentRequest>,
) -> ApiResult<ApiResponse<Payment>> {
    require_admin(&auth)?;

    let target = review_target(&req.status)?;
    let admin_notes = normalize_notes(req.admin_notes)?;

    match Payment::transition(&state.db, id, target, admin_notes, auth.user_id).await? {
        Some(payment) => {
            tracing::info!(
                payment_id = payment.id,
                admin_id = auth.user_id,
                status = %payment.status,
                "Payment reviewed"
            );

            let message = format!("Payment {}", payment.status);
            Ok(ApiResponse::ok(payment).with_message(message))
        }
        None => match Payment::find_by_id(&state.db, id).await? {
            None => Err(ApiError::NotFound("Payment not found".to_string())),
            Some(existing) => {
                tracing::warn!(
                    payment_id = id,
                    admin_id = auth.user_id,
                    current = %existing.status,
                    requested = %target,
                    "Payment already reviewed"
                );
                Err(ApiError::Conflict(format!(
                    "Payment has already been {}",
                    existing.status
                )))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_target() {
        assert_eq!(review_target("verified").unwrap(), PaymentStatus::Verified);
        assert_eq!(review_target("validated").unwrap(), PaymentStatus::Verified);
        assert_eq!(review_target("REJECTED").unwrap(), PaymentStatus::Rejected);

        for invalid in ["pending", "approved", ""] {
            match review_target(invalid) {
                Err(ApiError::ValidationError(errors)) => assert_eq!(errors[0].field, "status"),
                other => panic!("expected validation error for {:?}, got {:?}", invalid, other),
            }
        }
    }

    #[test]
    fn test_parse_status_filter() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("pending")).unwrap(),
            Some(PaymentStatus::Pending)
        );
        assert_eq!(
            parse_status_filter(Some("validated")).unwrap(),
            Some(PaymentStatus::Verified)
        );
        assert!(parse_status_filter(Some("paid")).is_err());
    }

    #[test]
    fn test_verify_request_shape() {
        let req: VerifyPaymentRequest =
            serde_json::from_str(r#"{"status":"rejected","adminNotes":"duplicate"}"#).unwrap();
        assert_eq!(req.status, "rejected");
        assert_eq!(req.admin_notes.as_deref(), Some("duplicate"));

        let req: VerifyPaymentRequest = serde_json::from_str(r#"{"status":"verified"}"#).unwrap();
        assert!(req.admin_notes.is_none());
    }
}
