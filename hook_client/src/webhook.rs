use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderValue;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use url::Url;

use hook_ratelimit::Cooldown;
use hook_ratelimit::SlidingLog;

use crate::api_limit::ApiLimiter;
use crate::client::Shared;
use crate::error::Error;
use crate::error::Result;
use crate::message::Message;

const RETRY_AFTER_DEFAULT: Duration = Duration::from_secs(60);

/// Options for executing a webhook.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Wait for server confirmation of the message send, which makes the
    /// response carry the created message body.
    pub wait: bool,
}

/// Body of a 429 response.
#[derive(Debug, Default, serde::Deserialize)]
struct TooManyRequestsBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    retry_after: f64,
    #[serde(default)]
    global: bool,
}

/// A single webhook endpoint.
///
/// A webhook owns its private rate limiter state and shares the global
/// limiter and cooldown with all other webhooks of the same [`Client`].
/// It is safe for concurrent use; concurrent sends to the same webhook
/// are serialized.
///
/// [`Client`]: crate::client::Client
#[derive(Debug)]
pub struct Webhook {
    shared: Arc<Shared>,
    url: Url,

    cooldown: Cooldown,
    limiter: SlidingLog,
    /// Also acts as the webhook's exclusive section: the lock is held from
    /// the cooldown check through the HTTP call and state updates.
    api_limiter: Mutex<ApiLimiter>,
}

impl Webhook {
    pub(crate) fn new(shared: Arc<Shared>, url: Url) -> Self {
        let limit = shared.webhook_rate_limit;
        Self {
            shared,
            url,
            cooldown: Cooldown::new(),
            limiter: SlidingLog::new(limit.requests, limit.period, "webhook"),
            api_limiter: Mutex::new(ApiLimiter::default()),
        }
    }

    /// Post a message to the webhook.
    ///
    /// Complies with all known rate limits by waiting for a free slot when
    /// necessary. See [`Webhook::execute_with`] for the error contract.
    pub async fn execute(&self, message: &Message) -> Result<Bytes> {
        self.execute_with(message, ExecuteOptions::default()).await
    }

    /// Post a message to the webhook, with options.
    ///
    /// The response body is returned; Discord only sends the created
    /// message back when [`ExecuteOptions::wait`] is enabled.
    ///
    /// Common errors:
    /// - [`Error::RateLimited`]: a 429 response, or a cooldown from an
    ///   earlier 429 that is still in effect. No retry is attempted; the
    ///   caller decides based on the carried `retry_after`.
    /// - [`Error::Http`]: any other response of 400 or above.
    /// - [`Error::Transport`]: the request failed or timed out; no limiter
    ///   state was changed.
    pub async fn execute_with(&self, message: &Message, options: ExecuteOptions) -> Result<Bytes> {
        tracing::debug!(?message, "message");
        if message.is_empty() {
            return Err(Error::EmptyMessage);
        }
        let payload = serde_json::to_vec(message)?;

        if let Some(retry_after) = self.shared.global_cooldown.get_or_reset() {
            return Err(Error::RateLimited { retry_after, global: true });
        }

        // Exclusive section: serializes concurrent sends to this webhook
        // so two attempts cannot both observe a free limiter slot. Taken
        // after the global cooldown check so a globally cooled-down client
        // does not contend webhooks against each other.
        let mut api_limiter = self.api_limiter.lock().await;

        if let Some(retry_after) = self.cooldown.get_or_reset() {
            return Err(Error::RateLimited { retry_after, global: false });
        }

        self.shared.global_limiter.wait().await;
        api_limiter.wait().await;
        self.limiter.wait().await;

        let mut url = self.url.clone();
        if options.wait {
            url.query_pairs_mut().append_pair("wait", "1");
        }
        tracing::debug!(%url, body_len = payload.len(), "request");
        let response = self
            .shared
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .timeout(self.shared.http_timeout)
            .send()
            .await?;

        let status = response.status();
        if let Err(err) = api_limiter.update_from_headers(response.headers()) {
            tracing::error!(error = %err, "Failed to update API limiter from headers");
        }
        let retry_after_header = response.headers().get(RETRY_AFTER).cloned();
        let body = response.bytes().await?;
        tracing::debug!(%url, %status, body_len = body.len(), "response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let parsed: TooManyRequestsBody = serde_json::from_slice(&body).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Failed to parse 429 response body");
                TooManyRequestsBody::default()
            });
            tracing::warn!(
                %url,
                message = %parsed.message,
                retry_after = parsed.retry_after,
                global = parsed.global,
                "Rate limited by server"
            );
            // The header value is more reliable than the body's float.
            let retry_after = parse_retry_after(retry_after_header).unwrap_or(RETRY_AFTER_DEFAULT);
            self.cooldown.set(retry_after);
            if parsed.global {
                self.shared.global_cooldown.set(retry_after);
            }
            return Err(Error::RateLimited { retry_after, global: parsed.global });
        }
        if status >= StatusCode::BAD_REQUEST {
            tracing::warn!(%url, %status, "response");
            return Err(Error::Http { status, message: status.to_string() });
        }
        tracing::info!(%url, %status, "response");
        Ok(body)
    }

    /// The webhook's endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Parse the whole-seconds `Retry-After` header accompanying a 429.
fn parse_retry_after(value: Option<HeaderValue>) -> Option<Duration> {
    let value = value?;
    match value.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => {
            tracing::warn!(?value, "Failed to parse retry after. Assuming default");
            None
        }
    }
}
