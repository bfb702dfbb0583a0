// ABOUTME: WebImages strategy: downloads every <img> referenced by an HTML page.
// ABOUTME: Names artifacts by position in the original img list so skipped images never shift names.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::request::SourceKind;
use crate::resource::{fetch, FetchOptions};
use crate::result::{Artifact, ExtractionResult, ItemFailure};

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Extension used when the URL path carries no usable one.
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// An `<img>` with a non-blank `src`, at its position among all `<img>` elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub index: usize,
    pub src: String,
    /// Absolute URL, or why `src` could not be resolved against the base.
    pub resolved: Result<Url, String>,
}

/// Collect image sources in document order, resolved against `base`.
///
/// Elements without a `src` (or with a blank one) are skipped but still
/// consume an index.
pub fn collect_image_candidates(doc: &Html, base: &Url) -> Vec<ImageCandidate> {
    doc.select(&IMG_SELECTOR)
        .enumerate()
        .filter_map(|(index, img)| {
            let src = img.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }
            let resolved = base
                .join(src)
                .map_err(|e| format!("cannot resolve image URL: {}", e));
            Some(ImageCandidate {
                index,
                src: src.to_string(),
                resolved,
            })
        })
        .collect()
}

/// File extension (with dot) taken from the last path segment of `url`.
///
/// Accepts 1 to 4 ASCII alphanumeric characters after the final dot;
/// anything else falls back to [`DEFAULT_IMAGE_EXTENSION`].
pub fn image_extension(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    if let Some((stem, ext)) = segment.rsplit_once('.') {
        if !stem.is_empty()
            && (1..=4).contains(&ext.len())
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return format!(".{}", ext);
        }
    }
    DEFAULT_IMAGE_EXTENSION.to_string()
}

/// Run the WebImages strategy: one sequential GET per resolvable image.
///
/// A failed download is recorded and the batch continues.
pub async fn extract(
    client: &reqwest::Client,
    opts: &FetchOptions,
    html: &str,
    base: &Url,
) -> ExtractionResult {
    let candidates = {
        let doc = Html::parse_document(html);
        collect_image_candidates(&doc, base)
    };
    debug!(base = %base, candidates = candidates.len(), "collected image sources");

    let mut artifacts = Vec::new();
    let mut failures = Vec::new();

    for candidate in candidates {
        let url = match candidate.resolved {
            Ok(url) => url,
            Err(reason) => {
                warn!(src = %candidate.src, %reason, "skipping image");
                failures.push(ItemFailure::new(candidate.src, reason));
                continue;
            }
        };

        match fetch(client, url.as_str(), opts).await {
            Ok(res) => {
                let filename = format!("image_{}{}", candidate.index, image_extension(&url));
                debug!(url = %url, %filename, bytes = res.body.len(), "downloaded image");
                artifacts.push(Artifact {
                    filename,
                    bytes: res.body,
                    origin_index: candidate.index,
                    page: None,
                });
            }
            Err(err) => {
                warn!(url = %url, error = %err, "could not download image");
                failures.push(ItemFailure::new(url.to_string(), err.reason()));
            }
        }
    }

    ExtractionResult::from_batch(SourceKind::WebImages, artifacts, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn candidates_skip_missing_src_but_keep_positions() {
        let html = r#"<img src="/logo.png"><img><img src="  "><img src="photos/cat.jpeg">"#;
        let doc = Html::parse_document(html);
        let got = collect_image_candidates(&doc, &url("https://example.com/blog/post"));

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].index, 0);
        assert_eq!(got[0].resolved, Ok(url("https://example.com/logo.png")));
        assert_eq!(got[1].index, 3);
        assert_eq!(
            got[1].resolved,
            Ok(url("https://example.com/blog/photos/cat.jpeg"))
        );
    }

    #[test]
    fn absolute_sources_are_kept() {
        let doc = Html::parse_document(r#"<img src="https://cdn.example.org/a.gif">"#);
        let got = collect_image_candidates(&doc, &url("https://example.com/"));
        assert_eq!(got[0].resolved, Ok(url("https://cdn.example.org/a.gif")));
    }

    #[test]
    fn extension_rules() {
        assert_eq!(image_extension(&url("https://e.com/a/logo.png")), ".png");
        assert_eq!(image_extension(&url("https://e.com/a/photo.jpeg?w=300")), ".jpeg");
        assert_eq!(image_extension(&url("https://e.com/a/photo.webpx")), ".jpg");
        assert_eq!(image_extension(&url("https://e.com/a/photo")), ".jpg");
        assert_eq!(image_extension(&url("https://e.com/a/.png")), ".jpg");
        assert_eq!(image_extension(&url("https://e.com/a/file.p-g")), ".jpg");
        assert_eq!(image_extension(&url("https://e.com/")), ".jpg");
    }

    #[tokio::test]
    async fn downloads_are_named_by_original_position() {
        let server = MockServer::start();
        let logo = server.mock(|when, then| {
            when.method(GET).path("/logo.png");
            then.status(200).body("PNGDATA");
        });
        let missing = server.mock(|when, then| {
            when.method(GET).path("/gone.gif");
            then.status(404);
        });
        let photo = server.mock(|when, then| {
            when.method(GET).path("/img/photo");
            then.status(200).body("JPEGDATA");
        });

        let html = r#"<img src="/logo.png"><img alt="no src"><img src="/gone.gif"><img src="img/photo">"#;
        let client = reqwest::Client::new();
        let base = url(&server.url("/"));

        let result = extract(&client, &FetchOptions::default(), html, &base).await;
        logo.assert();
        missing.assert();
        photo.assert();

        assert_eq!(result.count, 2);
        assert_eq!(result.filenames(), vec!["image_0.png", "image_3.jpg"]);
        assert_eq!(result.artifacts[0].bytes.as_ref(), b"PNGDATA");
        assert_eq!(result.artifacts[1].origin_index, 3);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].item.ends_with("/gone.gif"));
        assert!(result.failures[0].reason.contains("404"));
    }

    #[tokio::test]
    async fn unsupported_scheme_is_a_partial_failure() {
        let html = r#"<img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">"#;
        let client = reqwest::Client::new();
        let result = extract(
            &client,
            &FetchOptions::default(),
            html,
            &url("https://example.com/"),
        )
        .await;

        assert_eq!(result.count, 0);
        assert_eq!(result.failures.len(), 1);
    }

    #[tokio::test]
    async fn page_without_images_is_empty() {
        let client = reqwest::Client::new();
        let result = extract(
            &client,
            &FetchOptions::default(),
            "<p>no pictures</p>",
            &url("https://example.com/"),
        )
        .await;
        assert!(result.is_empty());
        assert!(result.failures.is_empty());
    }
}
