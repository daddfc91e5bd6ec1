//! # Prelude for the nvocr crate
//!
//! This module re-exports the most commonly used types for convenience.
//!
//! ```rust,ignore
//! use nvocr::prelude::*;
//! ```

pub use crate::client::{Error as ClientError, ErrorKind, NvOcr, NvOcrBuilder};
pub use crate::files::{FileUpload, Files, UploadedFile};
pub use crate::ocr::{Document, OcrOutput, PromptMode, SUPPORTED_FORMATS};
