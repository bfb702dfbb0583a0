// ABOUTME: OfficeZip strategy: copies embedded media out of PPTX and DOCX containers.
// ABOUTME: Keeps non-directory zip entries under the media prefix, named by their base file name.

use std::collections::HashSet;
use std::io::{Cursor, Read};

use bytes::Bytes;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::ExtractError;
use crate::request::SourceKind;
use crate::result::{Artifact, ExtractionResult, ItemFailure};

/// Run the OfficeZip strategy.
///
/// Zero matching entries is a normal, empty result. Bytes that are not a zip
/// archive are a [`crate::ErrorCode::MalformedContainer`] error.
pub fn extract(bytes: &[u8], media_prefix: &str, label: &str) -> Result<ExtractionResult, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ExtractError::malformed(label, "OfficeZip", Some(anyhow::anyhow!("not a zip archive: {}", e)))
    })?;

    // Central directory order.
    let media_entries: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(media_prefix) && !name.ends_with('/'))
        .map(String::from)
        .collect();

    debug!(label, prefix = media_prefix, entries = media_entries.len(), "matched media entries");

    let mut artifacts = Vec::with_capacity(media_entries.len());
    let mut failures = Vec::new();
    let mut used_names = HashSet::new();

    for (index, entry_name) in media_entries.into_iter().enumerate() {
        let data = match read_entry(&mut archive, &entry_name) {
            Ok(data) => data,
            Err(reason) => {
                warn!(entry = %entry_name, %reason, "skipping zip entry");
                failures.push(ItemFailure::new(entry_name, reason));
                continue;
            }
        };

        let filename = unique_name(base_name(&entry_name), &mut used_names);
        artifacts.push(Artifact {
            filename,
            bytes: Bytes::from(data),
            origin_index: index,
            page: None,
        });
    }

    Ok(ExtractionResult::from_batch(SourceKind::OfficeZip, artifacts, failures))
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Vec<u8>, String> {
    let mut entry = archive.by_name(name).map_err(|e| e.to_string())?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).map_err(|e| e.to_string())?;
    Ok(data)
}

/// Final path component of a zip entry name.
fn base_name(entry_name: &str) -> &str {
    entry_name.rsplit('/').next().unwrap_or(entry_name)
}

/// Keep `name` unless already taken, else insert `_{n}` before the extension.
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (name, String::new()),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
