use snafu::ensure;
use std::path::Path;

use crate::client::{Error, UnsupportedFormatSnafu};

/// File extensions the service can process.
pub const SUPPORTED_FORMATS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png", ".tiff", ".tif"];

/// Lowercased extension of `path` with a leading dot, e.g. `.pdf`.
pub fn extension_of(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Whether the extension of `path` is in [`SUPPORTED_FORMATS`], ignoring case.
pub fn is_supported_format(path: impl AsRef<Path>) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_FORMATS.contains(&ext.as_str()))
}

pub(crate) fn ensure_supported(path: &Path) -> Result<(), Error> {
    let extension = extension_of(path);
    ensure!(
        extension
            .as_deref()
            .is_some_and(|ext| SUPPORTED_FORMATS.contains(&ext)),
        UnsupportedFormatSnafu {
            path,
            extension: extension.unwrap_or_else(|| "<none>".to_string()),
        }
    );
    Ok(())
}
