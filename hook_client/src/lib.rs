//! Client for sending messages to Discord webhooks at high volume without
//! tripping the Discord API's rate limiting (i.e. 429 responses).
//!
//! Every send respects three independent rate limits:
//! - the documented global limit shared by all webhooks of one client,
//! - the dynamic per-route limit communicated through `X-RateLimit-*`
//!   response headers,
//! - the undocumented per-webhook limit.
//!
//! Should a request still be rejected with a 429, further sends are blocked
//! for the duration of the reported cooldown to prevent escalation.

pub mod api_limit;
pub mod client;
pub mod error;
pub mod message;
pub mod webhook;

pub use api_limit::ApiLimiter;
pub use api_limit::HeaderError;
pub use api_limit::RateQuota;
pub use client::Client;
pub use client::ClientBuilder;
pub use error::Error;
pub use error::Result;
pub use message::Color;
pub use message::Embed;
pub use message::EmbedAuthor;
pub use message::EmbedField;
pub use message::EmbedFooter;
pub use message::EmbedImage;
pub use message::EmbedProvider;
pub use message::EmbedThumbnail;
pub use message::Message;
pub use webhook::ExecuteOptions;
pub use webhook::Webhook;
