//! Attachment loading
//!
//! Reads a local file fully into memory so it can ride along with a command.

use std::path::Path;

use bytes::Bytes;

use crate::error::{EmuNwError, Result};

/// Load a file as an attachment payload
pub fn load_attachment(path: &Path) -> Result<Bytes> {
    let data = std::fs::read(path).map_err(|source| EmuNwError::File {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded attachment {} ({} bytes)", path.display(), data.len());
    Ok(Bytes::from(data))
}
