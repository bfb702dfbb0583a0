// ABOUTME: Error types for pluck extraction including the ErrorCode enum and ExtractError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the categories of fatal extraction failures.
///
/// Per-item failures inside a batch are not errors; they are reported through
/// [`crate::ItemFailure`] on the result instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    Fetch,
    Timeout,
    MalformedContainer,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidInput => "invalid input",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::MalformedContainer => "malformed container",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for fetch and extraction operations.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    /// URL or file name the operation was working on.
    pub target: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pluck: {} {}: {}", self.op, self.target, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    fn new(
        code: ErrorCode,
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            target: target.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidInput, target, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, target, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Timeout, target, op, source)
    }

    /// Create a MalformedContainer error.
    pub fn malformed(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::MalformedContainer, target, op, source)
    }

    /// Returns true if this is an InvalidInput error.
    pub fn is_invalid_input(&self) -> bool {
        self.code == ErrorCode::InvalidInput
    }

    /// Returns true for any fetch failure, timeouts included.
    pub fn is_fetch(&self) -> bool {
        matches!(self.code, ErrorCode::Fetch | ErrorCode::Timeout)
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a MalformedContainer error.
    pub fn is_malformed(&self) -> bool {
        self.code == ErrorCode::MalformedContainer
    }

    /// Short human-readable reason, without the op/target prefix.
    ///
    /// Used when a fatal error is demoted to a per-item failure.
    pub fn reason(&self) -> String {
        match self.source {
            Some(ref src) => format!("{}: {}", self.code, src),
            None => self.code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_target_and_source() {
        let err = ExtractError::fetch(
            "https://example.com/a.png",
            "Fetch",
            Some(anyhow::anyhow!("HTTP status 404")),
        );
        assert_eq!(
            err.to_string(),
            "pluck: Fetch https://example.com/a.png: fetch error: HTTP status 404"
        );
        assert_eq!(err.reason(), "fetch error: HTTP status 404");
    }

    #[test]
    fn timeout_counts_as_fetch_failure() {
        let err = ExtractError::timeout("https://example.com", "Fetch", None);
        assert!(err.is_fetch());
        assert!(err.is_timeout());
        assert!(!err.is_malformed());
    }

    #[test]
    fn malformed_has_no_fetch_flag() {
        let err = ExtractError::malformed("deck.pptx", "OfficeZip", None);
        assert!(err.is_malformed());
        assert!(!err.is_fetch());
        assert_eq!(err.to_string(), "pluck: OfficeZip deck.pptx: malformed container");
    }
}
