use std::str::FromStr;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use reqwest::header::HeaderMap;
use thiserror::Error;

use hook_ratelimit::round_up;

const HEADER_LIMIT: &str = "X-RateLimit-Limit";
const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
const HEADER_RESET: &str = "X-RateLimit-Reset";
const HEADER_RESET_AFTER: &str = "X-RateLimit-Reset-After";
const HEADER_BUCKET: &str = "X-RateLimit-Bucket";

/// A complete-but-malformed rate limit header set.
#[derive(Debug, Error)]
#[error("invalid rate limit header {name}: {value:?}")]
pub struct HeaderError {
    name: &'static str,
    value: String,
}

/// One reading of the server-communicated rate limit, taken from the
/// `X-RateLimit-*` response headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuota {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: SystemTime,
    pub reset_after: f64,
    /// Opaque server-assigned id grouping requests that share a window.
    pub bucket: String,
}

impl RateQuota {
    /// Extract a rate limit reading from response headers.
    ///
    /// Returns `Ok(None)` when any of the five expected headers is absent:
    /// an incomplete set means no information, not an error. A complete set
    /// with an unparsable value is an error.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, HeaderError> {
        let Some(limit) = header_str(headers, HEADER_LIMIT)? else {
            return Ok(None);
        };
        let Some(remaining) = header_str(headers, HEADER_REMAINING)? else {
            return Ok(None);
        };
        let Some(reset) = header_str(headers, HEADER_RESET)? else {
            return Ok(None);
        };
        let Some(reset_after) = header_str(headers, HEADER_RESET_AFTER)? else {
            return Ok(None);
        };
        let Some(bucket) = header_str(headers, HEADER_BUCKET)? else {
            return Ok(None);
        };

        let reset_epoch: u64 = parse_value(reset, HEADER_RESET)?;
        Ok(Some(Self {
            limit: parse_value(limit, HEADER_LIMIT)?,
            remaining: parse_value(remaining, HEADER_REMAINING)?,
            reset_at: UNIX_EPOCH + Duration::from_secs(reset_epoch),
            reset_after: parse_value(reset_after, HEADER_RESET_AFTER)?,
            bucket: bucket.to_string(),
        }))
    }

    /// Whether the next request would be rejected: budget spent and the
    /// window has not reset yet.
    fn is_exhausted(&self, now: SystemTime) -> bool {
        self.remaining == 0 && self.reset_at > now
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, HeaderError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => match value.to_str() {
            Ok(s) => Ok(Some(s)),
            Err(_) => Err(HeaderError { name, value: format!("{value:?}") }),
        },
    }
}

fn parse_value<T: FromStr>(value: &str, name: &'static str) -> Result<T, HeaderError> {
    value.parse().map_err(|_| HeaderError { name, value: value.to_string() })
}

/// Limiter fed by the rate limit the server reports in its response
/// headers. It predicts whether the next call would be rejected and blocks
/// preemptively.
///
/// While no reading has been observed the limiter never blocks: no
/// information implies no constraint.
#[derive(Debug, Default)]
pub struct ApiLimiter {
    quota: Option<RateQuota>,
}

impl ApiLimiter {
    /// Sleep until the reported window resets if the budget is spent,
    /// and report whether a wait happened.
    pub async fn wait(&self) -> bool {
        tracing::debug!(quota = ?self.quota, "API rate limit");
        let Some(quota) = &self.quota else {
            return false;
        };
        let now = SystemTime::now();
        if !quota.is_exhausted(now) {
            return false;
        }
        let Ok(until_reset) = quota.reset_at.duration_since(now) else {
            return false;
        };
        let retry_after = round_up(until_reset, Duration::from_secs(1));
        tracing::info!(?retry_after, "API rate limit exhausted. Waiting for reset");
        tokio::time::sleep(retry_after).await;
        true
    }

    /// Update the limiter from the response headers of a completed call.
    ///
    /// The known remaining budget is decremented first, as optimistic
    /// bookkeeping for the request these headers belong to; concurrent
    /// requests would otherwise all believe they own the same last slot. A
    /// reading for the already-known `(bucket, reset_at)` window is then
    /// discarded, since the decrement has accounted for it; any other
    /// reading replaces the stored state wholesale. An incomplete header
    /// set leaves the state untouched.
    pub fn update_from_headers(&mut self, headers: &HeaderMap) -> Result<(), HeaderError> {
        if let Some(quota) = &mut self.quota {
            if quota.remaining > 0 {
                quota.remaining -= 1;
            }
        }
        let Some(reading) = RateQuota::from_headers(headers)? else {
            return Ok(());
        };
        if let Some(quota) = &self.quota {
            if quota.bucket == reading.bucket && quota.reset_at == reading.reset_at {
                return Ok(());
            }
        }
        self.quota = Some(reading);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_LIMIT, "5".parse().unwrap());
        headers.insert(HEADER_REMAINING, "1".parse().unwrap());
        headers.insert(HEADER_RESET, "1470173023".parse().unwrap());
        headers.insert(HEADER_RESET_AFTER, "1.2".parse().unwrap());
        headers.insert(HEADER_BUCKET, "abcd1234".parse().unwrap());
        headers
    }

    fn quota(remaining: u32, reset_epoch: u64, bucket: &str) -> RateQuota {
        RateQuota {
            limit: 5,
            remaining,
            reset_at: UNIX_EPOCH + Duration::from_secs(reset_epoch),
            reset_after: 1.2,
            bucket: bucket.to_string(),
        }
    }

    #[test]
    fn test_extracts_quota_from_headers() {
        let quota = RateQuota::from_headers(&full_headers()).unwrap().unwrap();
        assert_eq!(quota.limit, 5);
        assert_eq!(quota.remaining, 1);
        assert_eq!(quota.reset_at, UNIX_EPOCH + Duration::from_secs(1470173023));
        assert_eq!(quota.reset_after, 1.2);
        assert_eq!(quota.bucket, "abcd1234");
    }

    #[test]
    fn test_no_headers_is_no_reading() {
        assert_eq!(RateQuota::from_headers(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn test_incomplete_headers_is_no_reading() {
        for missing in [HEADER_LIMIT, HEADER_REMAINING, HEADER_RESET, HEADER_RESET_AFTER, HEADER_BUCKET] {
            let mut headers = full_headers();
            headers.remove(missing);
            assert_eq!(RateQuota::from_headers(&headers).unwrap(), None, "missing {missing}");
        }
    }

    #[test]
    fn test_malformed_complete_headers_is_an_error() {
        let mut headers = full_headers();
        headers.insert(HEADER_REMAINING, "not-a-number".parse().unwrap());
        let err = RateQuota::from_headers(&headers).unwrap_err();
        assert!(err.to_string().contains(HEADER_REMAINING));
    }

    #[test]
    fn test_is_exhausted() {
        let now = SystemTime::now();
        let future = now + Duration::from_secs(5);
        let past = now - Duration::from_secs(5);

        let mut q = quota(1, 0, "abcd1234");
        q.reset_at = future;
        assert!(!q.is_exhausted(now));

        q.remaining = 0;
        assert!(q.is_exhausted(now));

        q.reset_at = past;
        assert!(!q.is_exhausted(now));
    }

    #[test]
    fn test_update_decrements_for_same_bucket_and_window() {
        let mut limiter = ApiLimiter { quota: Some(quota(2, 1470173023, "abcd1234")) };
        let mut headers = full_headers();
        headers.insert(HEADER_REMAINING, "3".parse().unwrap());
        limiter.update_from_headers(&headers).unwrap();
        assert_eq!(limiter.quota.unwrap().remaining, 1);
    }

    #[test]
    fn test_update_replaces_state_for_new_window() {
        let mut limiter = ApiLimiter { quota: Some(quota(2, 1470173022, "abcd1234")) };
        let mut headers = full_headers();
        headers.insert(HEADER_REMAINING, "4".parse().unwrap());
        limiter.update_from_headers(&headers).unwrap();
        assert_eq!(limiter.quota.unwrap().remaining, 4);
    }

    #[test]
    fn test_update_replaces_state_for_new_bucket() {
        let mut limiter = ApiLimiter { quota: Some(quota(2, 1470173023, "wxyz9876")) };
        let mut headers = full_headers();
        headers.insert(HEADER_REMAINING, "4".parse().unwrap());
        limiter.update_from_headers(&headers).unwrap();
        assert_eq!(limiter.quota.unwrap().remaining, 4);
    }

    #[test]
    fn test_update_with_incomplete_headers_keeps_state() {
        let mut limiter = ApiLimiter { quota: Some(quota(2, 1470173023, "abcd1234")) };
        limiter.update_from_headers(&HeaderMap::new()).unwrap();

        let quota = limiter.quota.unwrap();
        // Only the optimistic decrement applies.
        assert_eq!(quota.remaining, 1);
        assert_eq!(quota.bucket, "abcd1234");
        assert_eq!(quota.reset_at, UNIX_EPOCH + Duration::from_secs(1470173023));
    }

    #[test]
    fn test_update_error_still_decrements() {
        let mut limiter = ApiLimiter { quota: Some(quota(2, 1470173023, "abcd1234")) };
        let mut headers = full_headers();
        headers.insert(HEADER_RESET, "not-an-epoch".parse().unwrap());
        assert!(limiter.update_from_headers(&headers).is_err());
        assert_eq!(limiter.quota.unwrap().remaining, 1);
    }

    #[tokio::test]
    async fn test_wait_without_reading_does_not_block() {
        let limiter = ApiLimiter::default();
        assert!(!limiter.wait().await);
    }

    #[tokio::test]
    async fn test_wait_with_budget_does_not_block() {
        let mut q = quota(1, 0, "abcd1234");
        q.reset_at = SystemTime::now() + Duration::from_secs(5);
        let limiter = ApiLimiter { quota: Some(q) };
        assert!(!limiter.wait().await);
    }

    #[tokio::test]
    async fn test_wait_with_elapsed_reset_does_not_block() {
        let mut q = quota(0, 0, "abcd1234");
        q.reset_at = SystemTime::now() - Duration::from_secs(5);
        let limiter = ApiLimiter { quota: Some(q) };
        assert!(!limiter.wait().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_when_exhausted_blocks_until_reset() {
        let mut q = quota(0, 0, "abcd1234");
        q.reset_at = SystemTime::now() + Duration::from_millis(200);
        let limiter = ApiLimiter { quota: Some(q) };
        assert!(limiter.wait().await);
    }
}
