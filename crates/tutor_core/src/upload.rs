use thiserror::Error;

/// Largest document accepted for upload (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 4] = [
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("file too large: {actual} bytes (max {max_bytes} bytes, 5MB)")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("unsupported file type {mime:?}; use PDF, DOC, DOCX or TXT")]
    UnsupportedType { mime: String },
}

/// Client-side checks run before any upload reaches the network.
/// Size is checked before type.
pub fn validate_upload(mime: &str, size: u64) -> Result<(), UploadRejection> {
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge {
            max_bytes: MAX_UPLOAD_BYTES,
            actual: size,
        });
    }

    let essence = mime.split(';').next().unwrap_or(mime).trim();
    if !ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    {
        return Err(UploadRejection::UnsupportedType {
            mime: mime.to_string(),
        });
    }
    Ok(())
}

/// Maps a document file name to its MIME type by extension.
pub fn mime_for_filename(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}
