use snafu::ResultExt;
use std::{io::ErrorKind, path::Path};

use crate::client::{Error, NotFoundSnafu, ReadFileSnafu};

/// Read a whole file, mapping a missing path to [`Error::NotFound`].
pub(crate) async fn read_local_file(path: &Path) -> Result<Vec<u8>, Error> {
    match tokio::fs::read(path).await {
        Err(err) if err.kind() == ErrorKind::NotFound => NotFoundSnafu { path }.fail(),
        result => result.context(ReadFileSnafu { path }),
    }
}
