/// Multipart form handling for payment proofs and company documents
///
/// A form is read completely into memory (files are capped at
/// `MAX_UPLOAD_BYTES`) and validated before anything touches the disk or the
/// database.

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use incorpo_shared::storage::normalize_content_type;
use std::collections::HashMap;

pub const MAX_TRANSACTION_REFERENCE_LEN: usize = 64;
pub const MAX_PAYMENT_AMOUNT: i64 = 1_000_000_000_000;

/// A file part of a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,

    /// Normalized media type, `application/octet-stream` when absent
    pub content_type: String,

    pub bytes: Bytes,
}

/// Text fields and files of a multipart request
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Drains `multipart`, rejecting any file larger than `max_file_bytes`
    ///
    /// Parts with a filename are files; everything else is text. A file part
    /// with an empty body counts as absent.
    ///
    /// # Errors
    ///
    /// - 413 when a file exceeds `max_file_bytes` or the body limit
    /// - 400 for malformed multipart bodies or non-UTF-8 text fields
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> ApiResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(mut field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .map(normalize_content_type)
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let mut buffer = BytesMut::new();
                while let Some(chunk) = field.chunk().await? {
                    if buffer.len() + chunk.len() > max_file_bytes {
                        return Err(ApiError::PayloadTooLarge(format!(
                            "File '{}' exceeds the maximum size of {} bytes",
                            name, max_file_bytes
                        )));
                    }
                    buffer.extend_from_slice(&chunk);
                }

                if buffer.is_empty() {
                    continue;
                }

                form.files.insert(
                    name,
                    UploadedFile {
                        file_name: Some(file_name).filter(|f| !f.is_empty()),
                        content_type,
                        bytes: buffer.freeze(),
                    },
                );
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed text field; blank values count as missing
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        fields: &[(&str, &str)],
        files: Vec<(&str, UploadedFile)>,
    ) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: files
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// Validated text fields of a payment proof submission
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentProofForm {
    pub company_id: i64,
    pub phone_number: String,
    pub transaction_reference: String,
    pub amount: Option<i64>,
    pub method: Option<String>,
}

impl PaymentProofForm {
    /// Validates every field at once so the client sees all problems together
    ///
    /// The proof image must already be present in `form`; its type is checked
    /// separately against the upload category.
    pub fn from_form(form: &MultipartForm) -> ApiResult<Self> {
        let mut errors = Vec::new();
        let mut fail = |field: &str, message: &str| {
            errors.push(ValidationErrorDetail {
                field: field.to_string(),
                message: message.to_string(),
            })
        };

        let company_id = match form.text("companyId").map(str::parse::<i64>) {
            Some(Ok(id)) if id > 0 => Some(id),
            Some(_) => {
                fail("companyId", "Company id must be a positive integer");
                None
            }
            None => {
                fail("companyId", "Company id is required");
                None
            }
        };

        let phone_number = match form.text("phoneNumber") {
            Some(phone) => match normalize_phone_number(phone) {
                Some(normalized) => Some(normalized),
                None => {
                    fail("phoneNumber", "Phone number must contain 8 to 15 digits");
                    None
                }
            },
            None => {
                fail("phoneNumber", "Phone number is required");
                None
            }
        };

        let transaction_reference = match form.text("transactionReference") {
            Some(reference) if is_valid_reference(reference) => Some(reference.to_string()),
            Some(_) => {
                fail(
                    "transactionReference",
                    "Transaction reference may only contain letters, digits, '-', '_' and '.' (max 64)",
                );
                None
            }
            None => {
                fail("transactionReference", "Transaction reference is required");
                None
            }
        };

        if !form.has_file("proofImage") {
            fail("proofImage", "Payment proof image is required");
        }

        let amount = match form.text("amount").map(str::parse::<i64>) {
            None => None,
            Some(Ok(amount)) if amount > 0 && amount <= MAX_PAYMENT_AMOUNT => Some(amount),
            Some(_) => {
                fail("amount", "Amount must be a positive integer");
                None
            }
        };

        let method = match form.text("method") {
            None => None,
            Some(method) if is_valid_method(method) => Some(method.to_ascii_lowercase()),
            Some(_) => {
                fail("method", "Payment method must be a short identifier such as 'orange_money'");
                None
            }
        };

        match (company_id, phone_number, transaction_reference) {
            (Some(company_id), Some(phone_number), Some(transaction_reference))
                if errors.is_empty() =>
            {
                Ok(Self {
                    company_id,
                    phone_number,
                    transaction_reference,
                    amount,
                    method,
                })
            }
            _ => Err(ApiError::ValidationError(errors)),
        }
    }
}

/// Strips spaces, dots and dashes; keeps a leading '+'
pub fn normalize_phone_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (prefix, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' => {}
            _ => return None,
        }
    }

    if (8..=15).contains(&digits.len()) {
        Some(format!("{}{}", prefix, digits))
    } else {
        None
    }
}

fn is_valid_reference(reference: &str) -> bool {
    reference.len() <= MAX_TRANSACTION_REFERENCE_LEN
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn is_valid_method(method: &str) -> bool {
    method.len() <= 32
        && method
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
