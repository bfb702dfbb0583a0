// ABOUTME: Main library entry point for pluck, the article, image and document-media extractor.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, ExtractionRequest, ExtractionResult, ExtractError, OperationLog.

//! pluck - pull article text and images out of web pages and office documents.
//!
//! A [`Client`] fetches pages over HTTP and dispatches an
//! [`ExtractionRequest`] to one strategy per [`SourceKind`]: article text,
//! page images, media embedded in PPTX/DOCX archives, or images embedded in
//! PDFs. Strategies report per-item failures next to the artifacts they did
//! extract; persisting artifacts is left to the caller.
//!
//! # Example
//!
//! ```no_run
//! use pluck_extract::{save_artifacts, Client, ExtractError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ExtractError> {
//!     let client = Client::builder().build()?;
//!     let result = client.scrape_images("https://example.com/").await?;
//!     println!("downloaded {} images", result.count);
//!     save_artifacts("scraped_images".as_ref(), &result.artifacts).ok();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod log;
pub mod options;
pub mod request;
pub mod resource;
pub mod result;
pub mod store;
pub mod strategies;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::log::{EntryKind, LogEntry, OperationLog};
pub use crate::options::{ClientBuilder, Options, DEFAULT_USER_AGENT};
pub use crate::request::{
    DocumentFormat, ExtractionRequest, Payload, SourceKind, PPT_MEDIA_PREFIX, WORD_MEDIA_PREFIX,
};
pub use crate::resource::FetchResult;
pub use crate::result::{Artifact, ExtractionResult, ItemFailure, Result};
pub use crate::store::{save_artifacts, save_text, ARTICLE_FILE, DOCUMENT_IMAGES_DIR, WEB_IMAGES_DIR};
