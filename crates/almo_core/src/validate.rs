use thiserror::Error;

use crate::FileRef;

/// Extensions accepted for upload, lowercase and without the leading dot.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

/// Upload size ceiling in bytes (50 MiB). A file of exactly this size passes.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported file type '.{extension}'. Allowed types: {}", format_accepted(.accepted))]
    UnsupportedType {
        extension: String,
        accepted: Vec<String>,
    },
    #[error("file size ({actual} bytes) exceeds maximum allowed size ({limit} bytes)")]
    TooLarge { actual: u64, limit: u64 },
}

fn format_accepted(accepted: &[String]) -> String {
    accepted
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// File acceptance policy. `Default` carries the fixed production constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub accepted_extensions: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_extensions: ACCEPTED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Checks type first, then size. Looks only at the file's metadata.
    pub fn validate(&self, file: &FileRef) -> Result<(), ValidationError> {
        let extension = extension_of(&file.name);
        if !self
            .accepted_extensions
            .iter()
            .any(|accepted| *accepted == extension)
        {
            return Err(ValidationError::UnsupportedType {
                extension,
                accepted: self.accepted_extensions.clone(),
            });
        }
        if file.size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                actual: file.size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Validates against the default policy.
pub fn validate(file: &FileRef) -> Result<(), ValidationError> {
    UploadPolicy::default().validate(file)
}

/// Lowercase suffix after the last `.`; empty when the name has none.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}
