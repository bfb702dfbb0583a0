// ABOUTME: Resource handling module for fetching remote pages and images.
// ABOUTME: Handles single-attempt HTTP GETs, content-length limits, failure classification and charset decoding.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::ExtractError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching a resource.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as UTF-8 text, using charset hints from content-type header.
    pub fn text_utf8(&self, content_type_hint: Option<&str>) -> String {
        let ct = content_type_hint.or(self.content_type.as_deref());
        decode_body(&self.body, ct)
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub(crate) fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Classify a transport error from reqwest.
fn classify_send_error(url: &str, err: reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::timeout(url, "Fetch", Some(anyhow::anyhow!("request timed out: {}", err)))
    } else {
        ExtractError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", err)))
    }
}

fn body_read_error(url: &str, err: reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::timeout(url, "Fetch", Some(anyhow::anyhow!("body read timed out: {}", err)))
    } else {
        ExtractError::fetch(url, "Fetch", Some(anyhow::anyhow!("failed to read body: {}", err)))
    }
}

/// Validate that `url` is a non-empty absolute http(s) URL.
pub fn validate_url(url: &str, op: &str) -> Result<url::Url, ExtractError> {
    if url.trim().is_empty() {
        return Err(ExtractError::invalid_input(
            url,
            op,
            Some(anyhow::anyhow!("URL is empty")),
        ));
    }

    let parsed = url::Url::parse(url.trim()).map_err(|e| {
        ExtractError::invalid_input(url, op, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ExtractError::invalid_input(
            url,
            op,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    Ok(parsed)
}

/// Fetch a resource from the given URL.
///
/// Exactly one GET is sent. Redirects follow the HTTP client's default policy;
/// anything other than a 2xx final status is a fetch failure.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, ExtractError> {
    let parsed_url = validate_url(url, "Fetch")?;

    let mut request = client.get(parsed_url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    debug!(url, "fetching");
    let response = request
        .send()
        .await
        .map_err(|e| classify_send_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }

    // Check Content-Length header before reading body
    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(ExtractError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let mut response = response;
    let mut buf = BytesMut::new();
    // Chunked bodies carry no Content-Length; enforce the limit while reading.
    while let Some(chunk) = response.chunk().await.map_err(|e| body_read_error(url, e))? {
        if buf.len() + chunk.len() > MAX_CONTENT_LENGTH {
            return Err(ExtractError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
        buf.extend_from_slice(&chunk);
    }
    let body = buf.freeze();

    debug!(url, status = status.as_u16(), bytes = body.len(), "fetched");

    Ok(FetchResult {
        status: status.as_u16(),
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn create_test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .user_agent("test-agent")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok_utf8() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/test");
            then.status(200)
                .header("content-type", "text/plain; charset=utf-8")
                .body("hello");
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/test"), &FetchOptions::default()).await;
        mock.assert();

        let result = result.expect("fetch should succeed");
        assert_eq!(result.status, 200);
        assert_eq!(result.text_utf8(None), "hello");
        assert_eq!(
            result.content_type.as_deref(),
            Some("text/plain; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_custom_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/h").header("x-pluck", "yes");
            then.status(200).body("ok");
        });

        let client = create_test_client();
        let mut opts = FetchOptions::default();
        opts.headers.insert("x-pluck".to_string(), "yes".to_string());

        let result = fetch(&client, &server.url("/h"), &opts).await;
        mock.assert();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_rejected() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/notfound");
            then.status(404).body("not found");
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/notfound"), &FetchOptions::default()).await;
        mock.assert();

        let err = result.expect_err("should fail on 404");
        assert_eq!(err.code, ErrorCode::Fetch);
        assert!(err.to_string().contains("HTTP status 404"));
    }

    #[tokio::test]
    async fn test_fetch_accepts_any_2xx() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/partial");
            then.status(203).body("non-authoritative");
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/partial"), &FetchOptions::default()).await;
        mock.assert();

        assert_eq!(result.expect("203 is a success").status, 203);
    }

    #[tokio::test]
    async fn test_fetch_single_attempt_on_server_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/boom");
            then.status(503);
        });

        let client = create_test_client();
        let result = fetch(&client, &server.url("/boom"), &FetchOptions::default()).await;

        assert!(result.expect_err("503 must fail").is_fetch());
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_classified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500)).body("late");
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let result = fetch(&client, &server.url("/slow"), &FetchOptions::default()).await;

        let err = result.expect_err("should time out");
        assert!(err.is_timeout());
        assert!(err.is_fetch());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop a listener to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = create_test_client();
        let url = format!("http://127.0.0.1:{}/x", port);

        let err = fetch(&client, &url, &FetchOptions::default())
            .await
            .expect_err("nothing is listening");
        assert_eq!(err.code, ErrorCode::Fetch);
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_urls() {
        let client = create_test_client();
        for url in ["", "   ", "not a url", "ftp://example.com/file"] {
            let err = fetch(&client, url, &FetchOptions::default())
                .await
                .expect_err("should reject");
            assert!(err.is_invalid_input(), "expected invalid input for {:?}", url);
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/big");
            then.status(200).body(vec![b'x'; MAX_CONTENT_LENGTH + 1]);
        });

        let client = create_test_client();
        let err = fetch(&client, &server.url("/big"), &FetchOptions::default())
            .await
            .expect_err("body over the limit");
        assert!(err.is_fetch());
        assert!(err.to_string().contains("content too large"));
    }

    #[test]
    fn test_max_content_length_constant() {
        assert_eq!(MAX_CONTENT_LENGTH, 10 * 1024 * 1024);
    }

    #[test]
    fn test_extract_charset() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/html; charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn test_decode_body_with_charset() {
        let body = [0x63, 0x61, 0x66, 0xe9];
        let decoded = decode_body(&body, Some("text/html; charset=iso-8859-1"));
        assert_eq!(decoded, "café");
    }
}
