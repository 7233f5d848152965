//! Files bound for object storage and the keys they are stored under.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

/// Extensions accepted for product photos.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Extensions accepted for proofs of payment (photos or a PDF receipt).
pub const PROOF_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "pdf"];

/// Errors from validating an upload.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("invalid file type: {0}")]
    InvalidExtension(String),
    #[error("file is empty")]
    Empty,
}

/// A file received from a client.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Lowercased extension after the last dot, or `""`.
    #[must_use]
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// The declared content type, or one guessed from the extension.
    #[must_use]
    pub fn content_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| content_type_for(&self.extension()).to_owned())
    }

    fn checked_extension(&self, allowed: &[&str]) -> Result<String, UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let ext = self.extension();
        if allowed.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(UploadError::InvalidExtension(ext))
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Path of an object inside the storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// `{user_id}/payment-proofs/{random}.{ext}`
    ///
    /// # Errors
    ///
    /// Returns `UploadError` for an empty file or an unsupported extension.
    pub fn payment_proof(user_id: UserId, file: &UploadedFile) -> Result<Self, UploadError> {
        let ext = file.checked_extension(&PROOF_EXTENSIONS)?;
        Ok(Self(format!(
            "{user_id}/payment-proofs/{}.{ext}",
            Uuid::new_v4().simple()
        )))
    }

    /// `products/{unix_millis}-{random}.{ext}`
    ///
    /// # Errors
    ///
    /// Returns `UploadError` for an empty file or a non-image extension.
    pub fn product_image(file: &UploadedFile, now: DateTime<Utc>) -> Result<Self, UploadError> {
        let ext = file.checked_extension(&IMAGE_EXTENSIONS)?;
        Ok(Self(format!(
            "products/{}-{}.{ext}",
            now.timestamp_millis(),
            Uuid::new_v4().simple()
        )))
    }

    /// Wrap a key read back from storage or a URL.
    #[must_use]
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// MIME type for a known extension, `application/octet-stream` otherwise.
#[must_use]
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_owned(),
            content_type: None,
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_payment_proof_key_is_scoped_to_user() {
        let user = UserId::generate();
        let key = ObjectKey::payment_proof(user, &file("Receipt.PDF")).unwrap();
        let prefix = format!("{user}/payment-proofs/");
        assert!(key.as_str().starts_with(&prefix));
        assert!(key.as_str().ends_with(".pdf"));
    }

    #[test]
    fn test_product_image_key() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let key = ObjectKey::product_image(&file("dish.webp"), now).unwrap();
        let expected_prefix = format!("products/{}-", now.timestamp_millis());
        assert!(key.as_str().starts_with(&expected_prefix));
        assert!(key.as_str().ends_with(".webp"));
    }

    #[test]
    fn test_rejects_bad_extensions() {
        let now = Utc::now();
        assert_eq!(
            ObjectKey::product_image(&file("menu.pdf"), now),
            Err(UploadError::InvalidExtension("pdf".to_owned()))
        );
        assert_eq!(
            ObjectKey::product_image(&file("noext"), now),
            Err(UploadError::InvalidExtension(String::new()))
        );
    }

    #[test]
    fn test_rejects_empty_file() {
        let mut empty = file("a.png");
        empty.bytes.clear();
        assert_eq!(
            ObjectKey::payment_proof(UserId::generate(), &empty),
            Err(UploadError::Empty)
        );
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(file("a.JPG").content_type(), "image/jpeg");
        let mut declared = file("a.bin");
        declared.content_type = Some("image/png".to_owned());
        assert_eq!(declared.content_type(), "image/png");
    }
}
