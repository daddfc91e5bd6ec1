use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Purpose attached to uploads unless another one is given.
pub const DEFAULT_PURPOSE: &str = "ocr";

/// A file stored by the OCR service.
///
/// The `id` is what later processing, result, download and delete calls take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Server-assigned identifier
    pub id: String,
    /// Name the file was uploaded under
    pub filename: String,
    /// Intended use, usually `ocr`
    pub purpose: String,
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    /// Upload time, sent as unix seconds
    #[serde(
        default,
        with = "time::serde::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    /// Server-side processing status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Response of `DELETE /files/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uploaded_file_full_response() {
        let file: UploadedFile = serde_json::from_value(json!({
            "id": "file-123",
            "purpose": "ocr",
            "filename": "invoice.pdf",
            "bytes": 52011,
            "created_at": 1_717_000_000,
            "status": "uploaded"
        }))
        .unwrap();

        assert_eq!(file.id, "file-123");
        assert_eq!(file.bytes, Some(52011));
        assert_eq!(
            file.created_at.map(OffsetDateTime::unix_timestamp),
            Some(1_717_000_000)
        );
        assert_eq!(file.status.as_deref(), Some("uploaded"));
    }

    #[test]
    fn test_uploaded_file_minimal_response() {
        let file: UploadedFile = serde_json::from_value(json!({
            "id": "file-123",
            "purpose": "ocr",
            "filename": "invoice.pdf"
        }))
        .unwrap();

        assert_eq!(file.bytes, None);
        assert_eq!(file.created_at, None);

        let serialized = serde_json::to_value(&file).unwrap();
        assert!(serialized.get("created_at").is_none());
    }

    #[test]
    fn test_delete_response() {
        let response: DeleteFileResponse =
            serde_json::from_value(json!({"status": "deleted"})).unwrap();
        assert_eq!(response.status, "deleted");
        assert_eq!(response.id, None);
    }
}
