/// Upload storage for payment proofs and company documents
///
/// Files are stored under a root directory, grouped by category, with a
/// random uuid filename so user-supplied names never reach the filesystem:
///
/// ```text
/// {root}/payment-proofs/7f1c...e2.png
/// {root}/documents/0a9b...41.pdf
/// ```
///
/// Rows in the database keep the path relative to the root. The root is also
/// served read-only under `/uploads`.
///
/// # Example
///
/// ```no_run
/// use incorpo_shared::storage::{LocalDiskStore, UploadCategory, UploadStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalDiskStore::new("./uploads");
/// let stored = store
///     .save(UploadCategory::PaymentProof, "image/png", b"\x89PNG...")
///     .await?;
///
/// let bytes = store.read(&stored.relative_path).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Invalid storage path")]
    InvalidPath,

    #[error("File not found")]
    NotFound,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory a file is grouped under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    PaymentProof,
    Document,
}

impl UploadCategory {
    pub fn dir_name(&self) -> &'static str {
        match self {
            UploadCategory::PaymentProof => "payment-proofs",
            UploadCategory::Document => "documents",
        }
    }

    /// Content types accepted for this category
    pub fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            UploadCategory::PaymentProof => {
                &["image/jpeg", "image/png", "image/webp", "application/pdf"]
            }
            UploadCategory::Document => &[
                "application/pdf",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/msword",
            ],
        }
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = normalize_content_type(content_type);
        self.allowed_types().contains(&essence.as_str())
    }
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the storage root, always with `/` separators
    pub relative_path: String,
    pub size: u64,
}

/// Storage backend used by the API
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Stores `bytes`, returning where they were written
    async fn save(
        &self,
        category: UploadCategory,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError>;

    async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError>;

    /// Removes a file; a missing file is not an error
    async fn delete(&self, relative_path: &str) -> Result<(), StorageError>;
}

/// Stores files on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a stored relative path, refusing anything that escapes the root
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative_path);

        if relative_path.is_empty()
            || path
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidPath);
        }

        Ok(self.root.join(path))
    }
}

#[async_trait]
impl UploadStore for LocalDiskStore {
    async fn save(
        &self,
        category: UploadCategory,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        if !category.accepts(content_type) {
            return Err(StorageError::UnsupportedType(content_type.to_string()));
        }

        let dir = self.root.join(category.dir_name());
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let relative_path = format!("{}/{}", category.dir_name(), file_name);
        tracing::debug!(path = %relative_path, size = bytes.len(), "Stored upload");

        Ok(StoredFile {
            relative_path,
            size: bytes.len() as u64,
        })
    }

    async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(relative_path)?;

        tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Io(e),
        })
    }

    async fn delete(&self, relative_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative_path)?;

        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Lowercased media type without parameters (`image/PNG; q=1` -> `image/png`)
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extension_for(content_type: &str) -> &'static str {
    match normalize_content_type(content_type).as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        _ => "bin",
    }
}
