/// Common test utilities for integration tests
///
/// - Test database setup (migrations run on every context)
/// - A client and an admin user with access tokens
/// - A company owned by the client
/// - Request helpers, including a multipart body builder

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use incorpo_api::app::{build_router, AppState};
use incorpo_api::config::Config;
use incorpo_shared::auth::jwt::{create_token, Claims, TokenType};
use incorpo_shared::models::company::{Company, CreateCompany};
use incorpo_shared::models::user::{CreateUser, User, UserRole};
use incorpo_shared::storage::LocalDiskStore;
use sqlx::PgPool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "----incorpo-test-boundary";

const FALLBACK_SECRET: &str = "integration-test-secret-at-least-32-chars";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
    pub upload_dir: TempDir,
    pub client: User,
    pub client_token: String,
    pub admin: User,
    pub admin_token: String,
    pub company: Company,
}

impl TestContext {
    /// Creates a context against `DATABASE_URL` with uploads in a temp dir
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let upload_dir = tempfile::tempdir()?;
        let upload_path = upload_dir.path().display().to_string();

        let config = Config::from_lookup(|key| match key {
            "APP_ENV" => Some("test".to_string()),
            "UPLOAD_DIR" => Some(upload_path.clone()),
            "MAX_UPLOAD_BYTES" => Some("1024".to_string()),
            "REDIS_URL" => None,
            "JWT_SECRET" => std::env::var(key)
                .ok()
                .or_else(|| Some(FALLBACK_SECRET.to_string())),
            _ => std::env::var(key).ok(),
        })?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let client = create_user(&db, UserRole::Client).await?;
        let admin = create_user(&db, UserRole::Admin).await?;
        let client_token = token_for(&client, &config)?;
        let admin_token = token_for(&admin, &config)?;

        let company = Company::create(
            &db,
            CreateCompany {
                owner_id: client.id,
                name: "Diallo Services".to_string(),
                legal_form: "SARL".to_string(),
                share_capital: 1_000_000,
                address: Some("Abidjan".to_string()),
            },
        )
        .await?;

        let storage = Arc::new(LocalDiskStore::new(upload_dir.path()));
        let state = AppState::new(db.clone(), config.clone(), storage, None);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            upload_dir,
            client,
            client_token,
            admin,
            admin_token,
            company,
        })
    }

    /// Sends a request and returns the status and parsed JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    /// Number of files stored under `category` (e.g. `payment-proofs`)
    pub fn stored_files(&self, category: &str) -> usize {
        std::fs::read_dir(self.upload_dir.path().join(category))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub async fn create_user(db: &PgPool, role: UserRole) -> anyhow::Result<User> {
    Ok(User::create(
        db,
        CreateUser {
            email: format!("test-{}@example.com", Uuid::new_v4()),
            password_hash: "not-used".to_string(),
            full_name: "Test User".to_string(),
            phone: None,
            role,
        },
    )
    .await?)
}

pub fn token_for(user: &User, config: &Config) -> anyhow::Result<String> {
    let claims = Claims::new(user.id, user.role, TokenType::Access);
    Ok(create_token(&claims, &config.jwt.secret)?)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// One part of a multipart body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(token))
        .body(Body::empty())
        .unwrap()
}
