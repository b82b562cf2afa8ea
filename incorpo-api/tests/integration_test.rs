/// Integration tests for the Incorpo API
///
/// These tests drive the full router against a real database:
/// - Payment proof submission and the admin review flow
/// - Authorization of admin-only routes
/// - Validation failures leaving no rows or files behind
/// - Admin statistics
///
/// Run with: cargo test --test integration_test -- --ignored --test-threads=1

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{get_request, json_request, multipart_request, Part, TestContext};
use incorpo_shared::models::payment::{Payment, PaymentStatus};
use incorpo_shared::models::user::User;
use serde_json::json;
use uuid::Uuid;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

fn reference() -> String {
    format!("OM{}", Uuid::new_v4().simple())
}

async fn submit_proof(ctx: &TestContext, company_id: i64, reference: &str) -> (StatusCode, serde_json::Value) {
    let company_id = company_id.to_string();
    let request = multipart_request(
        "/api/payments/submit-proof",
        &ctx.client_token,
        &[
            Part::Text("companyId", &company_id),
            Part::Text("phoneNumber", "+225 07 12 34 56 78"),
            Part::Text("transactionReference", reference),
            Part::File {
                name: "proofImage",
                file_name: "receipt.png",
                content_type: "image/png",
                bytes: PNG,
            },
        ],
    );
    ctx.send(request).await
}

async fn pending_ids(ctx: &TestContext) -> Vec<i64> {
    let (status, body) = ctx
        .send(get_request("/api/payments/admin/pending?limit=200", &ctx.admin_token))
        .await;
    assert_eq!(status, StatusCode::OK, "pending list failed: {}", body);
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_submit_and_verify_payment() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = submit_proof(&ctx, ctx.company.id, &reference()).await;
    if status != StatusCode::CREATED {
        panic!("Expected 201 Created, got {}: {}", status, body);
    }
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["phoneNumber"], "+2250712345678");
    let payment_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(ctx.stored_files("payment-proofs"), 1);

    assert!(pending_ids(&ctx).await.contains(&payment_id));

    let (status, body) = ctx
        .send(json_request(
            "PUT",
            &format!("/api/payments/admin/{}/verify", payment_id),
            &ctx.admin_token,
            json!({ "status": "verified", "adminNotes": "Matches the Orange Money statement" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "verify failed: {}", body);
    assert_eq!(body["data"]["status"], "verified");
    assert_eq!(body["data"]["verifiedBy"], ctx.admin.id);

    // The owner sees the decision
    let (status, body) = ctx
        .send(get_request(&format!("/api/payments/{}", payment_id), &ctx.client_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "verified");
    assert_eq!(body["data"]["adminNotes"], "Matches the Orange Money statement");

    assert!(!pending_ids(&ctx).await.contains(&payment_id));
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_rejected_payment_leaves_pending_list() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = submit_proof(&ctx, ctx.company.id, &reference()).await;
    assert_eq!(status, StatusCode::CREATED, "submit failed: {}", body);
    let payment_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = ctx
        .send(json_request(
            "PUT",
            &format!("/api/payments/admin/{}/verify", payment_id),
            &ctx.admin_token,
            json!({ "status": "rejected", "adminNotes": "duplicate" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "reject failed: {}", body);
    assert_eq!(body["data"]["status"], "rejected");

    assert!(!pending_ids(&ctx).await.contains(&payment_id));

    let stored = Payment::find_by_id(&ctx.db, payment_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Rejected);
    assert_eq!(stored.admin_notes.as_deref(), Some("duplicate"));
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_second_review_conflicts() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = submit_proof(&ctx, ctx.company.id, &reference()).await;
    let payment_id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/payments/admin/{}/verify", payment_id);

    let (status, _) = ctx
        .send(json_request("PUT", &uri, &ctx.admin_token, json!({ "status": "validated" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(json_request("PUT", &uri, &ctx.admin_token, json!({ "status": "rejected" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let stored = Payment::find_by_id(&ctx.db, payment_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Verified);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_verify_requires_admin() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = submit_proof(&ctx, ctx.company.id, &reference()).await;
    let payment_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = ctx
        .send(json_request(
            "PUT",
            &format!("/api/payments/admin/{}/verify", payment_id),
            &ctx.client_token,
            json!({ "status": "verified" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    for path in [
        "/api/payments/admin/pending",
        "/api/payments/admin/all",
        "/api/admin/stats/overview",
    ] {
        let (status, _) = ctx.send(get_request(path, &ctx.client_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} should be admin only", path);
    }

    let stored = Payment::find_by_id(&ctx.db, payment_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_verify_forbidden_for_client_whatever_the_payload() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = submit_proof(&ctx, ctx.company.id, &reference()).await;
    let payment_id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/payments/admin/{}/verify", payment_id);

    let cases = [
        (uri.clone(), "{not json".to_string()),
        (uri.clone(), json!({ "status": "bogus" }).to_string()),
        (uri.clone(), json!({}).to_string()),
        (
            "/api/payments/admin/abc/verify".to_string(),
            json!({ "status": "verified" }).to_string(),
        ),
    ];

    for (uri, payload) in cases {
        let request = Request::builder()
            .method("PUT")
            .uri(&uri)
            .header(header::AUTHORIZATION, common::bearer(&ctx.client_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.clone()))
            .unwrap();

        let (status, body) = ctx.send(request).await;
        assert_eq!(
            status,
            StatusCode::FORBIDDEN,
            "{} with {} should be forbidden, got {}",
            uri,
            payload,
            body
        );
        assert_eq!(body["success"], false);
    }

    let stored = Payment::find_by_id(&ctx.db, payment_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_verify_unknown_payment_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = ctx
        .send(json_request(
            "PUT",
            "/api/payments/admin/999999999/verify",
            &ctx.admin_token,
            json!({ "status": "verified" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_disabled_account_forbidden() {
    let ctx = TestContext::new().await.unwrap();
    User::set_active(&ctx.db, ctx.client.id, false).await.unwrap();

    let (status, body) = ctx.send(get_request("/api/auth/me", &ctx.client_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_deleted_account_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let ghost = common::create_user(&ctx.db, incorpo_shared::models::user::UserRole::Client)
        .await
        .unwrap();
    let token = common::token_for(&ghost, &ctx.config).unwrap();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(ghost.id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let (status, _) = ctx.send(get_request("/api/auth/me", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_invalid_submission_stores_nothing() {
    let ctx = TestContext::new().await.unwrap();
    let company_id = ctx.company.id.to_string();

    // No image, no phone number, no reference
    let request = multipart_request(
        "/api/payments/submit-proof",
        &ctx.client_token,
        &[Part::Text("companyId", &company_id)],
    );
    let (status, body) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"proofImage"));
    assert!(fields.contains(&"phoneNumber"));
    assert!(fields.contains(&"transactionReference"));

    let rows = Payment::list(&ctx.db, None, Some(ctx.client.id), 200).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(ctx.stored_files("payment-proofs"), 0);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_unsupported_proof_type_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let company_id = ctx.company.id.to_string();
    let reference = reference();

    let request = multipart_request(
        "/api/payments/submit-proof",
        &ctx.client_token,
        &[
            Part::Text("companyId", &company_id),
            Part::Text("phoneNumber", "0712345678"),
            Part::Text("transactionReference", &reference),
            Part::File {
                name: "proofImage",
                file_name: "receipt.html",
                content_type: "text/html",
                bytes: b"<html></html>",
            },
        ],
    );
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.stored_files("payment-proofs"), 0);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_foreign_and_unknown_company() {
    let ctx = TestContext::new().await.unwrap();

    // Another client's token against this company
    let stranger = common::create_user(&ctx.db, incorpo_shared::models::user::UserRole::Client)
        .await
        .unwrap();
    let stranger_token = common::token_for(&stranger, &ctx.config).unwrap();
    let company_id = ctx.company.id.to_string();
    let reference = reference();

    let request = multipart_request(
        "/api/payments/submit-proof",
        &stranger_token,
        &[
            Part::Text("companyId", &company_id),
            Part::Text("phoneNumber", "0712345678"),
            Part::Text("transactionReference", &reference),
            Part::File {
                name: "proofImage",
                file_name: "receipt.png",
                content_type: "image/png",
                bytes: PNG,
            },
        ],
    );
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = submit_proof(&ctx, 999_999_999, &reference).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(ctx.stored_files("payment-proofs"), 0);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_duplicate_reference_conflicts() {
    let ctx = TestContext::new().await.unwrap();
    let reference = reference();

    let (status, _) = submit_proof(&ctx, ctx.company.id, &reference).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = submit_proof(&ctx, ctx.company.id, &reference).await;
    assert_eq!(status, StatusCode::CONFLICT, "unexpected body: {}", body);

    // The second file is removed once the insert fails
    assert_eq!(ctx.stored_files("payment-proofs"), 1);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_admin_stats() {
    let ctx = TestContext::new().await.unwrap();

    for path in [
        "/api/admin/stats/overview",
        "/api/admin/stats/revenue?period=7d",
        "/api/admin/stats/companies?period=1y",
        "/api/admin/stats/users?period=all",
        "/api/admin/stats/activities?period=30d&limit=10",
    ] {
        let (status, body) = ctx.send(get_request(path, &ctx.admin_token)).await;
        assert_eq!(status, StatusCode::OK, "{} failed: {}", path, body);
        assert_eq!(body["success"], true);
    }

    let (status, body) = ctx
        .send(get_request("/api/admin/stats/overview?period=forever", &ctx.admin_token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = ctx
        .send(get_request("/api/admin/stats/overview", &ctx.client_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
