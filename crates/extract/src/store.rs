// ABOUTME: Writes extracted artifacts and article text into a caller-chosen folder.
// ABOUTME: Uses artifact file names unmodified and overwrites files left by a previous run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::result::Artifact;

/// Folder for images pulled out of uploaded documents.
pub const DOCUMENT_IMAGES_DIR: &str = "extracted_images";
/// Folder for images downloaded from a web page.
pub const WEB_IMAGES_DIR: &str = "scraped_images";
/// File for scraped article text.
pub const ARTICLE_FILE: &str = "scraped_article.txt";

/// Write every artifact into `dir`, creating the folder when missing.
///
/// Returns the written paths in artifact order. A file name that would escape
/// `dir` is rejected with [`io::ErrorKind::InvalidInput`] before anything is
/// written.
pub fn save_artifacts(dir: &Path, artifacts: &[Artifact]) -> io::Result<Vec<PathBuf>> {
    for artifact in artifacts {
        if !is_plain_file_name(&artifact.filename) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write artifact named {:?}", artifact.filename),
            ));
        }
    }

    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.filename);
        fs::write(&path, &artifact.bytes)?;
        debug!(path = %path.display(), bytes = artifact.bytes.len(), "saved artifact");
        written.push(path);
    }
    Ok(written)
}

/// Write article text to `path`, creating parent folders when missing.
pub fn save_text(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
