// ABOUTME: ExtractionResult, Artifact and ItemFailure returned by every strategy.
// ABOUTME: Carries succeeded artifacts and per-item failures side by side so callers can tell empty from broken.

use bytes::Bytes;
use serde::{Serialize, Serializer};

use crate::error::ExtractError;
use crate::request::SourceKind;

/// Result type alias for pluck operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// One extracted file. Ownership passes to the caller, which persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub filename: String,
    /// Raw bytes; serialized as their length only.
    #[serde(rename = "size", serialize_with = "serialize_len")]
    pub bytes: Bytes,
    /// Position of the item in its source (img list, zip entry list, or within its PDF page).
    pub origin_index: usize,
    /// One-based PDF page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

fn serialize_len<S: Serializer>(bytes: &Bytes, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}

/// A batch item that could not be extracted. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// URL, zip entry path, or PDF image position.
    pub item: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            reason: reason.into(),
        }
    }
}

/// Output of one extraction.
///
/// `count == 0` is a valid outcome meaning nothing was found (or every
/// attempt failed, in which case `failures` is non-empty).
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub kind: SourceKind,
    pub count: usize,
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub failures: Vec<ItemFailure>,
}

impl ExtractionResult {
    /// Result of a text-producing strategy: count is 1 for non-empty text.
    pub fn from_text(kind: SourceKind, text: String) -> Self {
        let count = usize::from(!text.trim().is_empty());
        Self {
            kind,
            count,
            artifacts: Vec::new(),
            text: Some(text),
            failures: Vec::new(),
        }
    }

    /// Result of a batch strategy: count is the number of artifacts.
    pub fn from_batch(kind: SourceKind, artifacts: Vec<Artifact>, failures: Vec<ItemFailure>) -> Self {
        Self {
            kind,
            count: artifacts.len(),
            artifacts,
            text: None,
            failures,
        }
    }

    /// True when the strategy found nothing to extract at all.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Items the strategy tried, successful or not.
    pub fn attempted(&self) -> usize {
        self.artifacts.len() + self.failures.len()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.filename.as_str()).collect()
    }
}
