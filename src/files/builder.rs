use mime::Mime;
use snafu::ensure;

use crate::{
    client::{EmptyContentSnafu, Error, MissingFileNameSnafu},
    files::model::DEFAULT_PURPOSE,
};

/// A file to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub purpose: String,
    pub mime_type: Option<Mime>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            purpose: DEFAULT_PURPOSE.to_string(),
            mime_type: None,
        }
    }

    /// The purpose tag of the upload. Defaults to `ocr`.
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// The MIME type of the file. Guessed from the file name when unset.
    pub fn with_mime_type(mut self, mime_type: Mime) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        ensure!(!self.file_name.trim().is_empty(), MissingFileNameSnafu);
        ensure!(
            !self.content.is_empty(),
            EmptyContentSnafu {
                file_name: &self.file_name
            }
        );
        Ok(())
    }

    pub(crate) fn resolved_mime_type(&self) -> Mime {
        self.mime_type
            .clone()
            .unwrap_or_else(|| mime_guess::from_path(&self.file_name).first_or_octet_stream())
    }
}
