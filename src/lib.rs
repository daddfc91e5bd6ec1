//! # nvocr
//!
//! A Rust client library for the NVIDIA OCR service.
//!
//! The service does the recognition work; this crate uploads documents, triggers
//! processing with a [`PromptMode`], and fetches, downloads or deletes the results.
//! Processing calls return the raw output of the service, usually markdown.
//!
//! ```no_run
//! use nvocr::prelude::*;
//!
//! # async fn example() -> Result<(), ClientError> {
//! let client = NvOcr::new("API_KEY")?;
//! let output = client
//!     .process_file_direct("scan.pdf", PromptMode::default())
//!     .await?;
//! println!("{}", output.markdown().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod client;
mod common;
pub mod files;
pub mod ocr;
pub mod prelude;


pub use client::{Error, Error as ClientError, ErrorKind, NvOcr, NvOcrBuilder, Result};
pub use files::{DeleteFileResponse, FileUpload, Files, UploadedFile, DEFAULT_PURPOSE};
pub use ocr::{
    is_supported_format, Document, DocumentKind, ImageUrl, OcrOutput, PromptMode,
    SUPPORTED_FORMATS,
};
