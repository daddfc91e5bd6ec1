//! # OCR request and response primitives
//!
//! Types sent to and received from the processing endpoints: the prompt mode
//! selecting the service's processing profile, inline [`Document`] payloads and the
//! [`OcrOutput`] returned by processing and result lookups.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mime::Mime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fmt,
    hash::{Hash, Hasher},
    path::Path,
};

use crate::{
    client::{Error, InvalidDocumentSnafu},
    common::fs::read_local_file,
};

/// Processing profile understood by the OCR service.
///
/// Modes compare by their wire name, so `Custom("prompt_ocr")` equals [`PromptMode::Ocr`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PromptMode {
    /// Full layout analysis with text extraction, rendered as markdown
    #[default]
    LayoutAllEn,
    /// Layout detection only, without text content
    LayoutOnlyEn,
    /// Plain text recognition
    Ocr,
    /// Text recognition within a grounding box
    GroundingOcr,
    /// Any other mode the deployed service supports
    Custom(String),
}

impl PromptMode {
    pub fn as_str(&self) -> &str {
        match self {
            PromptMode::LayoutAllEn => "prompt_layout_all_en",
            PromptMode::LayoutOnlyEn => "prompt_layout_only_en",
            PromptMode::Ocr => "prompt_ocr",
            PromptMode::GroundingOcr => "prompt_grounding_ocr",
            PromptMode::Custom(mode) => mode,
        }
    }
}

impl PartialEq for PromptMode {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for PromptMode {}

impl Hash for PromptMode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<String> for PromptMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "prompt_layout_all_en" => PromptMode::LayoutAllEn,
            "prompt_layout_only_en" => PromptMode::LayoutOnlyEn,
            "prompt_ocr" => PromptMode::Ocr,
            "prompt_grounding_ocr" => PromptMode::GroundingOcr,
            _ => PromptMode::Custom(value),
        }
    }
}

impl From<&str> for PromptMode {
    fn from(value: &str) -> Self {
        PromptMode::from(value.to_string())
    }
}

impl From<PromptMode> for String {
    fn from(value: PromptMode) -> Self {
        match value {
            PromptMode::Custom(mode) => mode,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker for the `"type": "image_url"` field of URL documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    ImageUrl,
}

/// URL of an image, either a `data:` URI or a remote http(s) location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// An inline document sent to the image processing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    /// `{"type": "image_url", "image_url": {"url": ...}}`
    ImageUrl {
        #[serde(rename = "type")]
        kind: DocumentKind,
        image_url: ImageUrl,
    },
    /// `{"image": <base64>, "filename": ...}`
    Base64 {
        /// Base64 encoded image data
        image: String,
        filename: String,
    },
}

impl Document {
    /// A document referencing an image by URL.
    pub fn image_url(url: impl Into<String>) -> Self {
        Document::ImageUrl {
            kind: DocumentKind::ImageUrl,
            image_url: ImageUrl { url: url.into() },
        }
    }

    /// Encode raw image bytes as a `data:` URI document.
    pub fn from_bytes(data: &[u8], mime_type: &Mime) -> Self {
        Self::image_url(format!(
            "data:{};base64,{}",
            mime_type.essence_str(),
            STANDARD.encode(data)
        ))
    }

    /// Encode raw image bytes as a `{image, filename}` document.
    pub fn base64(data: &[u8], filename: impl Into<String>) -> Self {
        Document::Base64 {
            image: STANDARD.encode(data),
            filename: filename.into(),
        }
    }

    /// Read an image from disk into a `data:` URI document, guessing the MIME type
    /// from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = read_local_file(path).await?;
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();
        Ok(Self::from_bytes(&data, &mime_type))
    }

    /// Reject payloads the service can never accept.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Document::ImageUrl { image_url, .. } => validate_image_url(&image_url.url),
            Document::Base64 { image, filename } => {
                if image.is_empty() {
                    return InvalidDocumentSnafu {
                        reason: "image data is empty",
                    }
                    .fail();
                }
                if filename.trim().is_empty() {
                    return InvalidDocumentSnafu {
                        reason: "filename is empty",
                    }
                    .fail();
                }
                Ok(())
            }
        }
    }
}

fn validate_image_url(url: &str) -> Result<(), Error> {
    if let Some(rest) = url.strip_prefix("data:") {
        let payload = rest.split_once(";base64,").map(|(_, data)| data);
        return match payload {
            Some(data) if !data.is_empty() => Ok(()),
            Some(_) => InvalidDocumentSnafu {
                reason: "data URI has no content",
            }
            .fail(),
            None => InvalidDocumentSnafu {
                reason: "data URI must be base64 encoded",
            }
            .fail(),
        };
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }

    InvalidDocumentSnafu {
        reason: format!("unsupported image URL '{url}'"),
    }
    .fail()
}

/// Body of `POST /process`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessFileRequest {
    pub file_id: String,
    pub prompt_mode: PromptMode,
}

/// Body of `POST /process_image`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessImageRequest {
    pub document: Document,
    pub prompt_mode: PromptMode,
}

/// Output of a processing call or result lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutput {
    /// The service answered with a JSON document
    Json(Value),
    /// The service answered with raw text, usually markdown
    Text(String),
}

impl OcrOutput {
    /// The recognized markdown.
    ///
    /// For JSON bodies this looks at a top-level `markdown` or `text` string field.
    pub fn markdown(&self) -> Option<&str> {
        match self {
            OcrOutput::Text(text) => Some(text),
            OcrOutput::Json(value) => value
                .get("markdown")
                .or_else(|| value.get("text"))
                .and_then(Value::as_str),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            OcrOutput::Json(value) => Some(value),
            OcrOutput::Text(_) => None,
        }
    }

    /// Consume the output as a string; JSON is serialized.
    pub fn into_text(self) -> String {
        match self {
            OcrOutput::Text(text) => text,
            OcrOutput::Json(value) => value.to_string(),
        }
    }
}
