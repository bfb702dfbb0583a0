// ABOUTME: ExtractionRequest and the tags that select an extraction strategy.
// ABOUTME: Also maps uploaded file extensions to DocumentFormat and its zip media prefix.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExtractError;

/// Media folder of a PowerPoint deck.
pub const PPT_MEDIA_PREFIX: &str = "ppt/media/";
/// Media folder of a Word document.
pub const WORD_MEDIA_PREFIX: &str = "word/media/";

/// Tag selecting which extraction strategy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    WebArticle,
    WebImages,
    OfficeZip,
    Pdf,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::WebArticle => "web article",
            SourceKind::WebImages => "web images",
            SourceKind::OfficeZip => "office zip",
            SourceKind::Pdf => "pdf",
        };
        write!(f, "{}", s)
    }
}

/// Uploaded document formats accepted for image extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pptx,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Map a file extension (with or without the leading dot, any case).
    pub fn from_extension(ext: &str) -> Result<Self, ExtractError> {
        let normalized = ext.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "pptx" => Ok(DocumentFormat::Pptx),
            "docx" => Ok(DocumentFormat::Docx),
            "pdf" => Ok(DocumentFormat::Pdf),
            _ => Err(ExtractError::invalid_input(
                ext,
                "DetectFormat",
                Some(anyhow::anyhow!(
                    "unsupported file type; supported file types are: .pptx, .docx, .pdf"
                )),
            )),
        }
    }

    /// Detect the format from a file path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).map_err(|mut err| {
            err.target = path.display().to_string();
            err
        })
    }

    /// Archive-internal media folder, for the zip-based formats.
    pub fn media_prefix(&self) -> Option<&'static str> {
        match self {
            DocumentFormat::Pptx => Some(PPT_MEDIA_PREFIX),
            DocumentFormat::Docx => Some(WORD_MEDIA_PREFIX),
            DocumentFormat::Pdf => None,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        match self {
            DocumentFormat::Pptx | DocumentFormat::Docx => SourceKind::OfficeZip,
            DocumentFormat::Pdf => SourceKind::Pdf,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentFormat::Pptx => "PPTX",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Pdf => "PDF",
        };
        write!(f, "{}", s)
    }
}

/// What an extraction runs against: a remote URL or bytes already in hand.
#[derive(Debug, Clone)]
pub enum Payload {
    Url(String),
    Bytes(Bytes),
}

/// A single extraction job. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    kind: SourceKind,
    payload: Payload,
    media_prefix: Option<String>,
    base_url: Option<Url>,
    name: Option<String>,
}

impl ExtractionRequest {
    fn new(kind: SourceKind, payload: Payload) -> Self {
        Self {
            kind,
            payload,
            media_prefix: None,
            base_url: None,
            name: None,
        }
    }

    /// Article text from the page at `url`.
    pub fn web_article(url: impl Into<String>) -> Self {
        Self::new(SourceKind::WebArticle, Payload::Url(url.into()))
    }

    /// Article text from HTML that was already fetched.
    pub fn web_article_html(html: impl Into<Bytes>) -> Self {
        Self::new(SourceKind::WebArticle, Payload::Bytes(html.into()))
    }

    /// Every `<img>` on the page at `url`.
    pub fn web_images(url: impl Into<String>) -> Self {
        Self::new(SourceKind::WebImages, Payload::Url(url.into()))
    }

    /// Every `<img>` in already-fetched HTML; relative sources resolve against `base_url`.
    pub fn web_images_html(html: impl Into<Bytes>, base_url: Url) -> Self {
        let mut req = Self::new(SourceKind::WebImages, Payload::Bytes(html.into()));
        req.base_url = Some(base_url);
        req
    }

    /// Embedded media of a zip-based office document under `media_prefix`.
    pub fn office_zip(bytes: impl Into<Bytes>, media_prefix: impl Into<String>) -> Self {
        let mut req = Self::new(SourceKind::OfficeZip, Payload::Bytes(bytes.into()));
        req.media_prefix = Some(media_prefix.into());
        req
    }

    /// Embedded images of a PDF.
    pub fn pdf(bytes: impl Into<Bytes>) -> Self {
        Self::new(SourceKind::Pdf, Payload::Bytes(bytes.into()))
    }

    /// Request matching an uploaded document of the given format.
    pub fn document(bytes: impl Into<Bytes>, format: DocumentFormat) -> Self {
        match format.media_prefix() {
            Some(prefix) => Self::office_zip(bytes, prefix),
            None => Self::pdf(bytes),
        }
    }

    /// Label used in errors and logs, e.g. the uploaded file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn media_prefix(&self) -> Option<&str> {
        self.media_prefix.as_deref()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// The explicit name, else the URL for remote payloads, else the source kind.
    pub fn label(&self) -> String {
        if let Some(ref name) = self.name {
            return name.clone();
        }
        match self.payload {
            Payload::Url(ref url) => url.clone(),
            Payload::Bytes(_) => self.kind.to_string(),
        }
    }
}
