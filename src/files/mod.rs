pub mod builder;
pub mod handle;
pub mod model;

pub use builder::FileUpload;
pub use handle::Files;
pub use model::{DeleteFileResponse, UploadedFile, DEFAULT_PURPOSE};
