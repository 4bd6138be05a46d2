use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::controllers::AppState;
use crate::error::EtudeError;

/// A parsed limit string such as `"100/minute"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl FromStr for RateLimit {
    type Err = String;

    /// Accepts `<count>/<period>` where period is one of
    /// `second`, `minute`, `hour`, `day`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (count, period) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid rate limit {s:?}, expected e.g. \"100/minute\""))?;

        let max_requests: u32 = count
            .trim()
            .parse()
            .map_err(|_| format!("invalid rate limit count in {s:?}"))?;

        let window = match period.trim() {
            "second" => Duration::from_secs(1),
            "minute" => Duration::from_secs(60),
            "hour" => Duration::from_secs(3600),
            "day" => Duration::from_secs(86400),
            other => return Err(format!("unknown rate limit period {other:?}")),
        };

        Ok(RateLimit {
            max_requests,
            window,
        })
    }
}

/// In-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key and rejects when the count
/// exceeds the limit within the window.
pub struct RateLimiter {
    limit: RateLimit,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    pub fn new(limit: RateLimit) -> Self {
        RateLimiter {
            limit,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Check if a key is rate-limited. Returns `Ok(())` if allowed,
    /// or `Err(seconds_until_retry)` if limited.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let mut map = self.attempts.lock().unwrap();
        let now = Instant::now();
        let cutoff = now - self.limit.window;

        let entries = map.entry(key.to_string()).or_default();
        entries.retain(|t| *t > cutoff);

        if entries.len() >= self.limit.max_requests as usize {
            // Oldest entry decides when a slot frees up
            let oldest = entries.first().unwrap();
            let retry_after =
                self.limit.window.as_secs() - now.duration_since(*oldest).as_secs();
            return Err(retry_after.max(1));
        }

        entries.push(now);
        Ok(())
    }

    /// Reset attempts for a key.
    pub fn reset(&self, key: &str) {
        let mut map = self.attempts.lock().unwrap();
        map.remove(key);
    }

    /// Remove expired entries to prevent memory growth.
    pub fn cleanup(&self) {
        let mut map = self.attempts.lock().unwrap();
        let now = Instant::now();
        let cutoff = now - self.limit.window;
        map.retain(|_, entries| {
            entries.retain(|t| *t > cutoff);
            !entries.is_empty()
        });
    }
}

/// Best-effort client key: proxy headers first, then a fixed fallback.
pub fn client_key(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or("").trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware applying the shared limiter per client key.
///
/// When rate limiting is disabled by configuration this is a passthrough.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, EtudeError> {
    if !state.config.rate_limit.enabled {
        return Ok(next.run(request).await);
    }

    let key = client_key(request.headers());
    if let Err(retry_after) = state.rate_limiter.check(&key) {
        tracing::warn!(client = %key, retry_after, "Rate limit exceeded");
        return Err(EtudeError::TooManyRequests(format!(
            "Too many requests. Try again in {} seconds.",
            retry_after
        )));
    }

    Ok(next.run(request).await)
}
