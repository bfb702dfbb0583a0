// ABOUTME: The Client that owns the HTTP client and dispatches extraction requests by source kind.
// ABOUTME: Provides fetch(), extract() and the scrape_article/scrape_images/extract_document shortcuts.

use bytes::Bytes;
use tracing::info;
use url::Url;

use crate::error::ExtractError;
use crate::options::{ClientBuilder, Options};
use crate::request::{DocumentFormat, ExtractionRequest, Payload, SourceKind};
use crate::resource::{decode_body, fetch, FetchOptions, FetchResult};
use crate::result::ExtractionResult;
use crate::strategies;

/// The pluck client: one configured HTTP client plus request headers.
///
/// Holds no per-request state; one Client serves any number of extractions.
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    fetch_opts: FetchOptions,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Result<Self, ExtractError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| {
                    ExtractError::invalid_input(
                        "http client",
                        "Configure",
                        Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                    )
                })?,
        };

        let fetch_opts = FetchOptions {
            headers: opts.headers.clone(),
        };

        Ok(Self {
            opts,
            http_client,
            fetch_opts,
        })
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Fetch `url` with a single GET.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, ExtractError> {
        fetch(&self.http_client, url, &self.fetch_opts).await
    }

    /// Run the strategy selected by the request's source kind.
    ///
    /// Errors are fatal to the request: the input could not be fetched or
    /// opened, or the payload does not fit the source kind. Failures of single
    /// images are reported in [`ExtractionResult::failures`] instead.
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractError> {
        let label = request.label();
        let result = match request.kind() {
            SourceKind::WebArticle => {
                let (html, _) = self.load_html(request, &label).await?;
                strategies::article::extract(&html)
            }
            SourceKind::WebImages => {
                let (html, base) = self.load_html(request, &label).await?;
                let base = base.ok_or_else(|| {
                    ExtractError::invalid_input(
                        &label,
                        "WebImages",
                        Some(anyhow::anyhow!("HTML input needs a base URL")),
                    )
                })?;
                strategies::images::extract(&self.http_client, &self.fetch_opts, &html, &base).await
            }
            SourceKind::OfficeZip => {
                let bytes = require_bytes(request, &label, "OfficeZip")?;
                let prefix = request.media_prefix().ok_or_else(|| {
                    ExtractError::invalid_input(
                        &label,
                        "OfficeZip",
                        Some(anyhow::anyhow!("no media prefix given")),
                    )
                })?;
                strategies::office::extract(bytes, prefix, &label)?
            }
            SourceKind::Pdf => {
                let bytes = require_bytes(request, &label, "Pdf")?;
                strategies::pdf::extract(bytes, &label)?
            }
        };

        info!(
            target_label = %label,
            kind = %result.kind,
            count = result.count,
            failures = result.failures.len(),
            "extraction complete"
        );
        Ok(result)
    }

    /// Fetch the page at `url` and return its article text.
    pub async fn scrape_article(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        self.extract(&ExtractionRequest::web_article(url)).await
    }

    /// Fetch the page at `url` and download every image it references.
    ///
    /// Relative sources resolve against the page's final URL after redirects.
    pub async fn scrape_images(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        self.extract(&ExtractionRequest::web_images(url)).await
    }

    /// Extract the embedded images of an uploaded document.
    pub async fn extract_document(
        &self,
        bytes: impl Into<Bytes>,
        format: DocumentFormat,
    ) -> Result<ExtractionResult, ExtractError> {
        self.extract(&ExtractionRequest::document(bytes, format)).await
    }

    /// HTML text of a web request plus the base URL for resolving links.
    async fn load_html(
        &self,
        request: &ExtractionRequest,
        label: &str,
    ) -> Result<(String, Option<Url>), ExtractError> {
        match request.payload() {
            Payload::Url(url) => {
                let res = self.fetch(url).await?;
                let base = Url::parse(&res.final_url).ok();
                Ok((res.text_utf8(None), base))
            }
            Payload::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(ExtractError::invalid_input(
                        label,
                        "LoadHtml",
                        Some(anyhow::anyhow!("HTML input is empty")),
                    ));
                }
                Ok((decode_body(bytes, None), request.base_url().cloned()))
            }
        }
    }
}

fn require_bytes<'a>(request: &'a ExtractionRequest, label: &str, op: &str) -> Result<&'a [u8], ExtractError> {
    match request.payload() {
        Payload::Bytes(bytes) => Ok(bytes.as_ref()),
        Payload::Url(_) => Err(ExtractError::invalid_input(
            label,
            op,
            Some(anyhow::anyhow!("document strategies need the file bytes, not a URL")),
        )),
    }
}
