use bytes::Bytes;
use mime::Mime;
use reqwest::{header::CONTENT_TYPE, multipart, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::{instrument, Span};
use url::Url;

use crate::{
    files::{DeleteFileResponse, FileUpload, Files, UploadedFile},
    ocr::{
        formats::{self, SUPPORTED_FORMATS},
        Document, OcrOutput, ProcessFileRequest, ProcessImageRequest, PromptMode,
    },
};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
const API_KEY_ENV: &str = "NVOCR_API_KEY";
const BASE_URL_ENV: &str = "NVOCR_BASE_URL";

/// Result type for all client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("file not found: {}", path.display()))]
    NotFound { path: PathBuf },

    #[snafu(display("failed to read file {}", path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("file '{file_name}' has no content"))]
    EmptyContent { file_name: String },

    #[snafu(display("file name is missing"))]
    MissingFileName,

    #[snafu(display("file id must not be empty"))]
    EmptyFileId,

    #[snafu(display(
        "unsupported file format '{extension}' for {}; supported formats: {}",
        path.display(),
        SUPPORTED_FORMATS.join(", ")
    ))]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[snafu(display("invalid document: {reason}"))]
    InvalidDocument { reason: String },

    #[snafu(display("API key is missing (set NVOCR_API_KEY or pass one explicitly)"))]
    MissingApiKey,

    #[snafu(display("failed to parse base URL '{url}'"))]
    ParseBaseUrl {
        source: url::ParseError,
        url: String,
    },

    #[snafu(display("base URL '{url}' cannot be used to build endpoint URLs"))]
    CannotBeABase { url: Url },

    #[snafu(display("failed to build HTTP client"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("failed to construct URL for endpoint '{endpoint}'"))]
    ConstructUrl { endpoint: String },

    #[snafu(display("failed to prepare multipart body for '{file_name}'"))]
    Multipart {
        source: reqwest::Error,
        file_name: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display("OCR service returned {status_code}: {body}"))]
    Service { status_code: u16, body: String },

    #[snafu(display("invalid response from '{url}': {reason}"))]
    InvalidResponse { url: Url, reason: String },

    #[snafu(display("failed to read response body from '{url}'"))]
    DecodeResponse { source: reqwest::Error, url: Url },

    #[snafu(display("failed to deserialize response from '{url}'"))]
    Deserialize {
        source: serde_json::Error,
        url: Url,
    },
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A local path does not exist.
    NotFound,
    /// The caller passed something the client refuses to send.
    InvalidInput,
    /// The service answered with a non-2xx status.
    Service,
    /// Network, I/O or decoding failure.
    Transport,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::EmptyContent { .. }
            | Error::MissingFileName
            | Error::EmptyFileId
            | Error::UnsupportedFormat { .. }
            | Error::InvalidDocument { .. }
            | Error::MissingApiKey
            | Error::ParseBaseUrl { .. }
            | Error::CannotBeABase { .. } => ErrorKind::InvalidInput,
            Error::Service { .. } => ErrorKind::Service,
            Error::ReadFile { .. }
            | Error::BuildHttpClient { .. }
            | Error::ConstructUrl { .. }
            | Error::Multipart { .. }
            | Error::PerformRequest { .. }
            | Error::DecodeResponse { .. }
            | Error::InvalidResponse { .. }
            | Error::Deserialize { .. } => ErrorKind::Transport,
        }
    }

    /// HTTP status of a service error, if this is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Service { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Internal transport for the OCR service.
pub(crate) struct NvOcrClient {
    http_client: Client,
    api_key: String,
    base_url: Url,
}

impl NvOcrClient {
    /// Upload a file as multipart form data
    pub(crate) async fn upload_file(&self, file: FileUpload) -> Result<UploadedFile> {
        let url = self.build_url(&["files"])?;
        let mime_type = file.resolved_mime_type();

        let part = multipart::Part::bytes(file.content)
            .file_name(file.file_name.clone())
            .mime_str(mime_type.as_ref())
            .context(MultipartSnafu {
                file_name: file.file_name,
            })?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("purpose", file.purpose);

        let response = self
            .perform(self.http_client.post(url.clone()).multipart(form), &url)
            .await?;
        let uploaded: UploadedFile = Self::read_json(response).await?;
        ensure!(
            !uploaded.id.trim().is_empty(),
            InvalidResponseSnafu {
                url,
                reason: "uploaded file has an empty id",
            }
        );
        Ok(uploaded)
    }

    /// Process a previously uploaded file
    pub(crate) async fn process_file(&self, request: ProcessFileRequest) -> Result<OcrOutput> {
        let url = self.build_url(&["process"])?;
        let response = self.post_json(&url, &request).await?;
        Self::read_output(response).await
    }

    /// Process an inline document
    pub(crate) async fn process_image(&self, request: ProcessImageRequest) -> Result<OcrOutput> {
        let url = self.build_url(&["process_image"])?;
        let response = self.post_json(&url, &request).await?;
        Self::read_output(response).await
    }

    /// Get processing results for a file
    pub(crate) async fn get_results(&self, file_id: &str) -> Result<OcrOutput> {
        let url = self.build_url(&["results", file_id])?;
        let response = self
            .perform(self.http_client.get(url.clone()), &url)
            .await?;
        Self::read_output(response).await
    }

    /// Download processed output as raw bytes
    pub(crate) async fn download_file(&self, file_id: &str, filename: &str) -> Result<Bytes> {
        let mut url = self.build_url(&["files", file_id, "download"])?;
        url.query_pairs_mut().append_pair("filename", filename);

        let response = self
            .perform(self.http_client.get(url.clone()), &url)
            .await?;
        response
            .bytes()
            .await
            .context(DecodeResponseSnafu { url })
    }

    /// Delete a stored file and its results
    pub(crate) async fn delete_file(&self, file_id: &str) -> Result<DeleteFileResponse> {
        let url = self.build_url(&["files", file_id])?;
        let response = self
            .perform(self.http_client.delete(url.clone()), &url)
            .await?;
        Self::read_json(response).await
    }

    /// Query the service health endpoint
    pub(crate) async fn health(&self) -> Result<Value> {
        let url = self.build_url(&["health"])?;
        let response = self
            .perform(self.http_client.get(url.clone()), &url)
            .await?;
        Self::read_json(response).await
    }

    async fn post_json<T: Serialize>(&self, url: &Url, body: &T) -> Result<Response> {
        self.perform(self.http_client.post(url.clone()).json(body), url)
            .await
    }

    /// Send an authorized request and reject non-2xx responses.
    async fn perform(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        tracing::debug!(%url, "sending request to OCR service");
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context(PerformRequestSnafu { url: url.clone() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .context(DecodeResponseSnafu { url: url.clone() })?;
            tracing::warn!(%url, status = status.as_u16(), "OCR service returned an error");
            return ServiceSnafu {
                status_code: status.as_u16(),
                body,
            }
            .fail();
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let url = response.url().clone();
        let bytes = response
            .bytes()
            .await
            .context(DecodeResponseSnafu { url: url.clone() })?;
        serde_json::from_slice(&bytes).context(DeserializeSnafu { url })
    }

    /// JSON bodies become [`OcrOutput::Json`], anything else is kept as text.
    async fn read_output(response: Response) -> Result<OcrOutput> {
        let url = response.url().clone();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Mime>().ok())
            .is_some_and(|content_type| {
                content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON)
            });

        let bytes = response
            .bytes()
            .await
            .context(DecodeResponseSnafu { url: url.clone() })?;

        if is_json {
            let value = serde_json::from_slice(&bytes).context(DeserializeSnafu { url })?;
            Ok(OcrOutput::Json(value))
        } else {
            Ok(OcrOutput::Text(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }

    /// Append percent-encoded path segments to the base URL
    fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()
            .context(ConstructUrlSnafu {
                endpoint: segments.join("/"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Builder for [`NvOcr`].
#[derive(Clone, Default)]
pub struct NvOcrBuilder {
    api_key: Option<String>,
    base_url: Option<Url>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl NvOcrBuilder {
    /// The API key sent as a bearer token with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The base URL of the OCR service. Defaults to `http://localhost:8000/`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Overall timeout applied to each request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<NvOcr> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .context(MissingApiKeySnafu)?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL).context(ParseBaseUrlSnafu {
                url: DEFAULT_BASE_URL,
            })?,
        };
        ensure!(!base_url.cannot_be_a_base(), CannotBeABaseSnafu { url: base_url });

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("nvocr/{}", env!("CARGO_PKG_VERSION")));
        let mut http_client = Client::builder().user_agent(user_agent);
        if let Some(timeout) = self.timeout {
            http_client = http_client.timeout(timeout);
        }
        let http_client = http_client.build().context(BuildHttpClientSnafu)?;

        tracing::debug!(%base_url, "created OCR client");

        Ok(NvOcr {
            client: Arc::new(NvOcrClient {
                http_client,
                api_key,
                base_url,
            }),
        })
    }
}

impl fmt::Debug for NvOcrBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NvOcrBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Client for the NVIDIA OCR service
#[derive(Clone)]
pub struct NvOcr {
    client: Arc<NvOcrClient>,
}

impl NvOcr {
    /// Create a new client against the default local service
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().with_api_key(api_key).build()
    }

    /// Create a new client with a custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: Url) -> Result<Self> {
        Self::builder()
            .with_api_key(api_key)
            .with_base_url(base_url)
            .build()
    }

    /// Create a client from `NVOCR_API_KEY` and, if set, `NVOCR_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .context(MissingApiKeySnafu)?;
        let mut builder = Self::builder().with_api_key(api_key);
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty());
        if let Some(base_url) = base_url {
            let url = Url::parse(&base_url).context(ParseBaseUrlSnafu { url: base_url })?;
            builder = builder.with_base_url(url);
        }
        builder.build()
    }

    pub fn builder() -> NvOcrBuilder {
        NvOcrBuilder::default()
    }

    /// The configured service base URL.
    pub fn base_url(&self) -> &Url {
        &self.client.base_url
    }

    /// Access the file upload operations.
    pub fn files(&self) -> Files {
        Files::new(self.client.clone())
    }

    /// Process a previously uploaded file.
    #[instrument(skip_all, fields(file.id = %file_id, prompt_mode = tracing::field::Empty))]
    pub async fn process_uploaded_file(
        &self,
        file_id: &str,
        prompt_mode: impl Into<PromptMode>,
    ) -> Result<OcrOutput> {
        ensure!(!file_id.trim().is_empty(), EmptyFileIdSnafu);
        let prompt_mode = prompt_mode.into();
        Span::current().record("prompt_mode", prompt_mode.as_str());

        self.client
            .process_file(ProcessFileRequest {
                file_id: file_id.to_string(),
                prompt_mode,
            })
            .await
    }

    /// Process an inline document (base64 image or data URI).
    #[instrument(skip_all, fields(prompt_mode = tracing::field::Empty))]
    pub async fn process_image(
        &self,
        document: Document,
        prompt_mode: impl Into<PromptMode>,
    ) -> Result<OcrOutput> {
        document.validate()?;
        let prompt_mode = prompt_mode.into();
        Span::current().record("prompt_mode", prompt_mode.as_str());

        self.client
            .process_image(ProcessImageRequest {
                document,
                prompt_mode,
            })
            .await
    }

    /// Upload a local file and process it in one go.
    ///
    /// The extension is checked against [`SUPPORTED_FORMATS`] before anything is sent.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn process_file_direct(
        &self,
        path: impl AsRef<Path>,
        prompt_mode: impl Into<PromptMode>,
    ) -> Result<OcrOutput> {
        let path = path.as_ref();
        formats::ensure_supported(path)?;

        let uploaded = self.files().upload_from_path(path).await?;
        tracing::debug!(file.id = %uploaded.id, "uploaded file for direct processing");

        self.process_uploaded_file(&uploaded.id, prompt_mode).await
    }

    /// Fetch the results stored for a file.
    #[instrument(skip_all, fields(file.id = %file_id))]
    pub async fn get_results(&self, file_id: &str) -> Result<OcrOutput> {
        ensure!(!file_id.trim().is_empty(), EmptyFileIdSnafu);
        self.client.get_results(file_id).await
    }

    /// Download processed output.
    #[instrument(skip_all, fields(file.id = %file_id, filename = %filename))]
    pub async fn download_file(&self, file_id: &str, filename: &str) -> Result<Bytes> {
        ensure!(!file_id.trim().is_empty(), EmptyFileIdSnafu);
        let content = self.client.download_file(file_id, filename).await?;
        tracing::debug!(size = content.len(), "downloaded file");
        Ok(content)
    }

    /// Delete a stored file together with its results.
    #[instrument(skip_all, fields(file.id = %file_id))]
    pub async fn delete_file(&self, file_id: &str) -> Result<DeleteFileResponse> {
        ensure!(!file_id.trim().is_empty(), EmptyFileIdSnafu);
        self.client.delete_file(file_id).await
    }

    /// Check the service health. The body is returned exactly as sent.
    #[instrument(skip_all)]
    pub async fn health_check(&self) -> Result<Value> {
        self.client.health().await
    }

    /// File extensions accepted by [`process_file_direct`](Self::process_file_direct).
    pub fn get_supported_formats(&self) -> &'static [&'static str] {
        SUPPORTED_FORMATS
    }
}

impl fmt::Debug for NvOcr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NvOcr")
            .field("base_url", &self.client.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> NvOcr {
        NvOcr::with_base_url("test-key", Url::parse(base_url).unwrap()).unwrap()
    }

    #[test]
    fn test_default_base_url() {
        let client = NvOcr::new("test-key").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_missing_api_key() {
        let err = NvOcr::new("  ").unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_cannot_be_a_base_url() {
        let err = NvOcr::with_base_url("key", Url::parse("mailto:ocr@example.com").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::CannotBeABase { .. }));
    }

    #[test]
    fn test_build_url_with_and_without_trailing_slash() {
        let with_slash = client("http://ocr.example.com/api/");
        let without_slash = client("http://ocr.example.com/api");

        for client in [with_slash, without_slash] {
            let url = client.client.build_url(&["files", "abc"]).unwrap();
            assert_eq!(url.as_str(), "http://ocr.example.com/api/files/abc");
        }
    }

    #[test]
    fn test_build_url_encodes_segments() {
        let client = client("http://localhost:8000");
        let url = client.client.build_url(&["results", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/results/a%2Fb%20c");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let builder = NvOcr::builder().with_api_key("secret-key");
        assert!(!format!("{builder:?}").contains("secret-key"));

        let client = client("http://localhost:8000");
        assert!(!format!("{client:?}").contains("test-key"));
    }

    #[test]
    fn test_supported_formats_from_client() {
        let client = client("http://localhost:8000");
        assert_eq!(client.get_supported_formats(), SUPPORTED_FORMATS);
    }

    #[test]
    fn test_from_env() {
        // One test so the cases never race on the process environment.
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(BASE_URL_ENV);
        assert!(matches!(NvOcr::from_env(), Err(Error::MissingApiKey)));

        std::env::set_var(API_KEY_ENV, "env-key");
        let client = NvOcr::from_env().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/");

        std::env::set_var(BASE_URL_ENV, "");
        let client = NvOcr::from_env().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/");

        std::env::set_var(BASE_URL_ENV, "https://ocr.example.com/v1/");
        let client = NvOcr::from_env().unwrap();
        assert_eq!(client.base_url().as_str(), "https://ocr.example.com/v1/");

        std::env::set_var(BASE_URL_ENV, "not a url");
        assert!(matches!(
            NvOcr::from_env(),
            Err(Error::ParseBaseUrl { .. })
        ));

        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(BASE_URL_ENV);
    }

    #[test]
    fn test_error_kinds() {
        let service = Error::Service {
            status_code: 500,
            body: "boom".into(),
        };
        assert_eq!(service.kind(), ErrorKind::Service);
        assert_eq!(service.status_code(), Some(500));
        assert!(service.to_string().contains("boom"));

        let missing = Error::NotFound {
            path: PathBuf::from("/nope.pdf"),
        };
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.status_code(), None);
    }
}
