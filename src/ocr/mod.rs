pub mod formats;
pub mod model;

pub use formats::{extension_of, is_supported_format, SUPPORTED_FORMATS};
pub use model::{
    Document, DocumentKind, ImageUrl, OcrOutput, ProcessFileRequest, ProcessImageRequest,
    PromptMode,
};
