use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned when executing a webhook.
#[derive(Debug, Error)]
pub enum Error {
    /// The message has neither content nor embeds.
    #[error("message must have content or embeds")]
    EmptyMessage,

    /// The message could not be encoded to JSON.
    #[error("failed to encode message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server rejected the request as rate limited (HTTP 429), or a
    /// cooldown from an earlier rejection is still in effect.
    ///
    /// `retry_after` is how long to wait before another attempt can
    /// succeed; `global` reports whether the whole client is affected
    /// rather than just this webhook.
    #[error("{}", if *.global { "global rate limit exceeded" } else { "rate limit exceeded" })]
    RateLimited { retry_after: Duration, global: bool },

    /// The server responded with an HTTP error other than 429.
    /// `message` carries the status line, e.g. "400 Bad Request".
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// The request never completed: connection failure, timeout, or any
    /// other transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid client configuration, e.g. a zero timeout.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The webhook URL could not be parsed.
    #[error("invalid webhook url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
