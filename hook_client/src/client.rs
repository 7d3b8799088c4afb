use std::sync::Arc;
use std::time::Duration;

use url::Url;

use hook_ratelimit::Cooldown;
use hook_ratelimit::SlidingLog;

use crate::error::Error;
use crate::error::Result;
use crate::webhook::Webhook;

const GLOBAL_RATE_LIMIT_REQUESTS_DEFAULT: u32 = 50;
const GLOBAL_RATE_LIMIT_PERIOD_DEFAULT: Duration = Duration::from_secs(1);
const HTTP_TIMEOUT_DEFAULT: Duration = Duration::from_secs(30);
const WEBHOOK_RATE_LIMIT_REQUESTS_DEFAULT: u32 = 30;
const WEBHOOK_RATE_LIMIT_PERIOD_DEFAULT: Duration = Duration::from_secs(60);

/// A rate limit expressed as a maximum number of requests per period.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimit {
    pub(crate) requests: u32,
    pub(crate) period: Duration,
}

/// State shared by a client and all of its webhooks.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) http: reqwest::Client,
    pub(crate) http_timeout: Duration,
    pub(crate) global_limiter: SlidingLog,
    pub(crate) global_cooldown: Cooldown,
    pub(crate) webhook_rate_limit: RateLimit,
}

/// Shared client used by all webhooks posting to the same API.
///
/// The shared client enforces the global rate limit and the client-wide
/// cooldown across webhooks, and provides the common HTTP transport.
/// Cloning is cheap; clones refer to the same shared state.
#[derive(Debug, Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    /// Create a new client with defaults: a 30 second HTTP timeout, a
    /// global limit of 50 requests per second and a per-webhook limit of
    /// 30 requests per minute.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a new webhook for this client.
    ///
    /// The webhook shares the client's global limiter and cooldown and
    /// owns its private per-webhook limiter state.
    pub fn webhook(&self, url: &str) -> Result<Webhook> {
        let url = Url::parse(url)?;
        Ok(Webhook::new(Arc::clone(&self.shared), url))
    }
}

/// Builder for configuring a [`Client`].
pub struct ClientBuilder {
    http_client: Option<reqwest::Client>,
    http_timeout: Duration,
    global_rate_limit: RateLimit,
    webhook_rate_limit: RateLimit,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            http_client: None,
            http_timeout: HTTP_TIMEOUT_DEFAULT,
            global_rate_limit: RateLimit {
                requests: GLOBAL_RATE_LIMIT_REQUESTS_DEFAULT,
                period: GLOBAL_RATE_LIMIT_PERIOD_DEFAULT,
            },
            webhook_rate_limit: RateLimit {
                requests: WEBHOOK_RATE_LIMIT_REQUESTS_DEFAULT,
                period: WEBHOOK_RATE_LIMIT_PERIOD_DEFAULT,
            },
        }
    }
}

impl ClientBuilder {
    /// Use a custom HTTP client, e.g. one with a proxy or custom TLS setup.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the timeout applied to each HTTP request.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the global rate limit shared by all webhooks of this client.
    pub fn global_rate_limit(mut self, requests: u32, period: Duration) -> Self {
        self.global_rate_limit = RateLimit { requests, period };
        self
    }

    /// Set the rate limit applied to each individual webhook.
    pub fn webhook_rate_limit(mut self, requests: u32, period: Duration) -> Self {
        self.webhook_rate_limit = RateLimit { requests, period };
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        if self.http_timeout.is_zero() {
            return Err(Error::InvalidConfig("http timeout must be positive"));
        }
        for limit in [self.global_rate_limit, self.webhook_rate_limit] {
            if limit.requests == 0 {
                return Err(Error::InvalidConfig("rate limit requests must be positive"));
            }
            if limit.period.is_zero() {
                return Err(Error::InvalidConfig("rate limit period must be positive"));
            }
        }

        let http = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder().build()?,
        };
        Ok(Client {
            shared: Arc::new(Shared {
                http,
                http_timeout: self.http_timeout,
                global_limiter: SlidingLog::new(
                    self.global_rate_limit.requests,
                    self.global_rate_limit.period,
                    "global",
                ),
                global_cooldown: Cooldown::new(),
                webhook_rate_limit: self.webhook_rate_limit,
            }),
        })
    }
}
