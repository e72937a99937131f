//! JSON output of the extracted posts.
//!
//! The file is a single array of `{"Title", "Description"}` objects in
//! listing order:
//! ```text
//! [
//!     {
//!         "Title": "Vestibular 2025",
//!         "Description": "Inscrições abertas"
//!     }
//! ]
//! ```
//!
//! Non-ASCII text is written as-is and each run fully replaces the previous
//! file.

use crate::models::Post;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Errors raised while writing the output file.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to serialize posts: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serialize posts as a JSON array indented with four spaces.
pub fn render_posts(posts: &[Post]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    posts.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write the posts to `path`, creating its parent directory if needed.
///
/// # Returns
///
/// `Ok(())` on success, or an error if serialization, directory creation or
/// the write itself fails.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = posts.len()))]
pub async fn write_posts(posts: &[Post], path: &Path) -> Result<(), WriteError> {
    info!("Saving posts");
    let json = render_posts(posts)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(WriteError::Io {
                path: parent.to_path_buf(),
                source: e,
            });
        }
    }

    fs::write(path, json).await.map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote posts JSON");

    Ok(())
}
