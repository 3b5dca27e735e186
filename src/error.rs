//! Error types for a pack run.
//!
//! Scan-time problems (a missing local stylesheet, an unknown `<link>` type,
//! an unparsable page) are logged and never surface here. Everything in [`PackError`] aborts the
//! whole run.

use crate::hash::ContentHash;
use thiserror::Error;

/// Fatal pack-run error.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("failed to fetch remote stylesheet `{url}` (media `{media}`, style {hash})")]
    Fetch {
        url: String,
        media: String,
        hash: ContentHash,
        #[source]
        source: FetchError,
    },

    #[error("failed to minify bundle {bundle} (media `{media}`): {message}")]
    Minify {
        bundle: String,
        media: String,
        message: String,
    },

    #[error("remote fetch task panicked or was cancelled")]
    Join(#[from] tokio::task::JoinError),
}

/// Transport-level failure for a single remote stylesheet.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    // Used by non-HTTP fetchers (tests, offline mirrors)
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_fetch_error_names_url_and_media() {
        let err = PackError::Fetch {
            url: "http://cdn.example/x.css".into(),
            media: "print".into(),
            hash: ContentHash::new([0x11; 32]),
            source: FetchError::Status(404),
        };
        let display = err.to_string();
        assert!(display.contains("http://cdn.example/x.css"));
        assert!(display.contains("print"));
        assert!(display.contains("1111111111111111"));
        // Source is kept, not flattened into the message
        assert_eq!(err.source().unwrap().to_string(), "server responded with status 404");
    }

    #[test]
    fn test_minify_error_display() {
        let err = PackError::Minify {
            bundle: "abc".into(),
            media: "screen".into(),
            message: "Unexpected token".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to minify bundle abc (media `screen`): Unexpected token"
        );
    }
}
