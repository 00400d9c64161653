//! Error type shared by transports, adapters and the harvest engine

use serde::Serialize;

/// Error from a single marketplace request or from interpreting its payload.
///
/// Adapters make exactly one attempt per call and return this type; the
/// crawler and fetcher decide about retries via [`FetchError::is_retryable`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Connection failure, timeout, or a 5xx answer
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// Non-success status that is neither rate limiting nor a server error
    Http { status: u16, message: String },
    /// Remote side throttled us (429, or the 403 some marketplaces use instead)
    RateLimited { status: u16 },
    /// Payload was not JSON or lacked an expected key
    Malformed(String),
    /// Shop/seller id lookup failed
    ShopResolution { slug: String, reason: String },
    /// Run was cancelled while the request was queued or in flight
    Cancelled,
}

/// Coarse error category, written into failed records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Http,
    RateLimited,
    MalformedResponse,
    ShopResolution,
    Cancelled,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Transport {
                status: None,
                message,
            } => write!(f, "transport error: {message}"),
            Self::Http { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::RateLimited { status } => write!(f, "rate limited (HTTP {status})"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
            Self::ShopResolution { slug, reason } => {
                write!(f, "cannot resolve shop '{slug}': {reason}")
            }
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Map a response status to the matching error variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            429 | 403 => Self::RateLimited { status },
            500..=599 => Self::Transport {
                status: Some(status),
                message: message.into(),
            },
            _ => Self::Http {
                status,
                message: message.into(),
            },
        }
    }

    /// Create a transport/status error from a reqwest error.
    ///
    /// The URL is stripped so query strings (shop ids, item ids) stay out of logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return Self::from_status(status.as_u16(), e.without_url().to_string());
        }
        if e.is_decode() {
            return Self::Malformed(e.without_url().to_string());
        }
        Self::Transport {
            status: None,
            message: e.without_url().to_string(),
        }
    }

    /// Shorthand for a payload that lacks `key`.
    pub fn missing(key: &str) -> Self {
        Self::Malformed(format!("missing '{key}'"))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::RateLimited { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Http { .. } => ErrorKind::Http,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Malformed(_) => ErrorKind::MalformedResponse,
            Self::ShopResolution { .. } => ErrorKind::ShopResolution,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_500_is_transport_and_retryable() {
        let err = FetchError::from_status(500, "boom");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_retryable());
    }

    #[test]
    fn status_429_rate_limited() {
        let err = FetchError::from_status(429, "slow down");
        assert_eq!(err, FetchError::RateLimited { status: 429 });
        assert!(err.is_retryable());
    }

    #[test]
    fn status_403_rate_limited() {
        assert!(FetchError::from_status(403, "blocked").is_retryable());
    }

    #[test]
    fn status_404_not_retryable() {
        let err = FetchError::from_status(404, "gone");
        assert_eq!(err.kind(), ErrorKind::Http);
        assert!(!err.is_retryable());
    }

    #[test]
    fn malformed_not_retryable() {
        assert!(!FetchError::missing("data").is_retryable());
    }

    #[test]
    fn cancelled_not_retryable() {
        assert!(!FetchError::Cancelled.is_retryable());
    }

    #[test]
    fn display_transport_with_status() {
        let err = FetchError::from_status(502, "bad gateway");
        assert_eq!(format!("{err}"), "HTTP 502: bad gateway");
    }

    #[test]
    fn display_missing_key() {
        assert_eq!(
            format!("{}", FetchError::missing("data")),
            "malformed response: missing 'data'"
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MalformedResponse).unwrap();
        assert_eq!(json, "\"malformed_response\"");
    }
}
