use snafu::OptionExt;
use std::{path::Path, sync::Arc};
use tracing::instrument;

use crate::{
    client::{Error, MissingFileNameSnafu, NvOcrClient},
    common::fs::read_local_file,
    files::{builder::FileUpload, model::UploadedFile, DEFAULT_PURPOSE},
};

/// File upload operations of the OCR service.
///
/// Obtained through [`NvOcr::files`](crate::NvOcr::files).
///
/// # Example
///
/// ```no_run
/// use nvocr::prelude::*;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = NvOcr::new("API_KEY")?;
///
/// let file = client.files().upload_from_path("invoice.pdf").await?;
/// let output = client
///     .process_uploaded_file(&file.id, PromptMode::LayoutAllEn)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Files {
    client: Arc<NvOcrClient>,
}

impl Files {
    pub(crate) fn new(client: Arc<NvOcrClient>) -> Self {
        Self { client }
    }

    /// Upload in-memory content.
    ///
    /// Empty content or a blank file name is rejected before any request is made.
    #[instrument(skip_all, fields(
        file.name = %file.file_name,
        file.size = file.content.len(),
        purpose = %file.purpose,
    ))]
    pub async fn upload(&self, file: FileUpload) -> Result<UploadedFile, Error> {
        file.validate()?;
        let uploaded = self.client.upload_file(file).await?;
        tracing::debug!(file.id = %uploaded.id, "file uploaded");
        Ok(uploaded)
    }

    /// Upload a file from disk with the default `ocr` purpose.
    pub async fn upload_from_path(&self, path: impl AsRef<Path>) -> Result<UploadedFile, Error> {
        self.upload_from_path_with_purpose(path, DEFAULT_PURPOSE)
            .await
    }

    /// Upload a file from disk, named after the last path component.
    ///
    /// Names that are not valid UTF-8 are converted lossily.
    /// A missing path yields [`Error::NotFound`] without contacting the service.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn upload_from_path_with_purpose(
        &self,
        path: impl AsRef<Path>,
        purpose: impl Into<String>,
    ) -> Result<UploadedFile, Error> {
        let path = path.as_ref();
        let content = read_local_file(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context(MissingFileNameSnafu)?;

        self.upload(FileUpload::new(file_name, content).with_purpose(purpose))
            .await
    }
}
