/// Generated company documents (statutes, registration certificates, ...)
///
/// The file itself lives in upload storage; this table only references it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub company_id: i64,

    /// Kind of document, e.g. "statutes" or "rccm_certificate"
    pub document_type: String,

    pub title: String,

    /// Path relative to the upload root
    #[serde(skip_serializing)]
    pub file_path: String,

    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub company_id: i64,
    pub document_type: String,
    pub title: String,
    pub file_path: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<i64>,
}

const DOCUMENT_COLUMNS: &str = "id, company_id, document_type, title, file_path, \
                                original_filename, content_type, size_bytes, uploaded_by, created_at";

impl Document {
    pub async fn create(pool: &PgPool, data: CreateDocument) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents
                 (company_id, document_type, title, file_path, original_filename,
                  content_type, size_bytes, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {DOCUMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Document>(&query)
            .bind(data.company_id)
            .bind(data.document_type)
            .bind(data.title)
            .bind(data.file_path)
            .bind(data.original_filename)
            .bind(data.content_type)
            .bind(data.size_bytes)
            .bind(data.uploaded_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");

        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All documents of a company, newest first
    pub async fn list_by_company(pool: &PgPool, company_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE company_id = $1
             ORDER BY created_at DESC, id DESC"
        );

        sqlx::query_as::<_, Document>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }
}
