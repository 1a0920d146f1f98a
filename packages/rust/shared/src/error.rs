//! Error types for the portfolio harvester.
//!
//! Library crates use [`PortfolioError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all harvester operations.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The portfolio listing could not be fetched or had an unexpected shape.
    /// Fatal: everything downstream is seeded from the listing.
    #[error("source unavailable: {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    /// A single company detail page could not be fetched or parsed.
    /// Recovered per item by the fan-out.
    #[error("detail unavailable for {path}: {reason}")]
    DetailUnavailable { path: String, reason: String },

    /// Network/HTTP error outside the listing/detail contract.
    #[error("network error: {0}")]
    Network(String),

    /// External dataset could not be downloaded or decoded.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PortfolioError>;

impl PortfolioError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Listing source failure for `url`.
    pub fn source_unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Detail page failure for `path`.
    pub fn detail_unavailable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DetailUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a dataset error from any displayable message.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PortfolioError::config("missing base_url");
        assert_eq!(err.to_string(), "config error: missing base_url");

        let err = PortfolioError::source_unavailable(
            "https://example.com/page-data.json",
            "HTTP 503 Service Unavailable",
        );
        assert_eq!(
            err.to_string(),
            "source unavailable: https://example.com/page-data.json: HTTP 503 Service Unavailable"
        );
    }

    #[test]
    fn io_error_names_path() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "key must be a string");
        let err = PortfolioError::io("/out/result.json", source);
        assert_eq!(
            err.to_string(),
            "I/O error at \"/out/result.json\": key must be a string"
        );
    }

    #[test]
    fn detail_error_names_path() {
        let err = PortfolioError::detail_unavailable("/current-portfolio/acme/", "HTTP 404");
        assert!(err.to_string().contains("/current-portfolio/acme/"));
    }
}
