/// Company document endpoints
///
/// - `GET /api/companies/:id/documents` - List (owner or admin)
/// - `POST /api/companies/:id/documents` - Upload (admin, multipart `file`,
///   `documentType`, `title`)
/// - `GET /api/documents/:id/download` - Download (owner or admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiPath,
    response::ApiResponse,
    routes::companies::load_company,
    upload::MultipartForm,
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use incorpo_shared::{
    auth::{
        authorization::{require_admin, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::document::{CreateDocument, Document},
    storage::UploadCategory,
};

const FILE_FIELD: &str = "file";

/// Lists a company's documents, newest first
pub async fn list_documents(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(company_id): ApiPath<i64>,
) -> ApiResult<ApiResponse<Vec<Document>>> {
    let company = load_company(&state, company_id).await?;
    require_owner_or_admin(&auth, company.owner_id)?;

    let documents = Document::list_by_company(&state.db, company.id).await?;

    Ok(ApiResponse::ok(documents))
}

/// Attaches a generated document to a company
///
/// # Errors
///
/// - `400 Bad Request`: Missing file, type or title; unsupported file type
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: Unknown company
/// - `413 Payload Too Large`: File exceeds `MAX_UPLOAD_BYTES`
pub async fn upload_document(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(company_id): ApiPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Document>> {
    require_admin(&auth)?;

    let mut form = MultipartForm::read(multipart?, state.config.uploads.max_bytes).await?;

    let mut errors = Vec::new();
    let document_type = form.text("documentType").map(str::to_ascii_lowercase);
    match document_type.as_deref() {
        Some(value) if is_valid_document_type(value) => {}
        Some(_) => errors.push(detail(
            "documentType",
            "Document type may only contain letters, digits, '_' and '-' (max 64)",
        )),
        None => errors.push(detail("documentType", "Document type is required")),
    }

    let title = form.text("title").map(str::to_string);
    match title.as_deref() {
        Some(value) if value.chars().count() <= 255 => {}
        Some(_) => errors.push(detail("title", "Title must be at most 255 characters")),
        None => errors.push(detail("title", "Title is required")),
    }

    let file = form.take_file(FILE_FIELD);
    match &file {
        Some(file) if !UploadCategory::Document.accepts(&file.content_type) => errors.push(detail(
            FILE_FIELD,
            &format!("Unsupported file type '{}'; expected PDF or Word", file.content_type),
        )),
        Some(_) => {}
        None => errors.push(detail(FILE_FIELD, "File is required")),
    }

    let (Some(document_type), Some(title), Some(file)) = (document_type, title, file) else {
        return Err(ApiError::ValidationError(errors));
    };
    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let company = load_company(&state, company_id).await?;

    let stored = state
        .storage
        .save(UploadCategory::Document, &file.content_type, &file.bytes)
        .await?;

    let created = Document::create(
        &state.db,
        CreateDocument {
            company_id: company.id,
            document_type,
            title,
            file_path: stored.relative_path.clone(),
            original_filename: file
                .file_name
                .unwrap_or_else(|| format!("document.{}", extension(&stored.relative_path))),
            content_type: file.content_type,
            size_bytes: stored.size as i64,
            uploaded_by: Some(auth.user_id),
        },
    )
    .await;

    let document = match created {
        Ok(document) => document,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&stored.relative_path).await {
                tracing::warn!(path = %stored.relative_path, error = %cleanup, "Failed to remove orphaned document");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        document_id = document.id,
        company_id = document.company_id,
        admin_id = auth.user_id,
        "Document uploaded"
    );

    Ok(ApiResponse::created(document))
}

/// Streams a stored document back as an attachment
pub async fn download_document(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Response> {
    let document = Document::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let company = load_company(&state, document.company_id).await?;
    require_owner_or_admin(&auth, company.owner_id)?;

    let bytes = state.storage.read(&document.file_path).await?;

    let content_type = HeaderValue::from_str(&document.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        attachment_filename(&document.original_filename)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

fn detail(field: &str, message: &str) -> ValidationErrorDetail {
    ValidationErrorDetail {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn is_valid_document_type(value: &str) -> bool {
    value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

fn extension(path: &str) -> &str {
    path.rsplit_once('.').map_or("bin", |(_, ext)| ext)
}

/// Restricts a user-supplied filename to characters safe in a quoted header
fn attachment_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}
