/// Fixed-window rate limiting per client IP
///
/// Each client IP gets `RATE_LIMIT_REQUESTS` requests per
/// `RATE_LIMIT_WINDOW_SECS` window. Counters live in Redis so several API
/// instances share them; without `REDIS_URL` the layer is a no-op.
///
/// The IP is the socket peer address. Forwarding headers are honored only
/// with `RATE_LIMIT_TRUST_PROXY=true`, and only when they hold a valid IP.
///
/// # Storage
///
/// Key `ratelimit:ip:{ip}`, incremented atomically by a Lua script that sets
/// the expiry on the first hit of a window. The key expiring starts a new
/// window.
///
/// # Headers
///
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: requests left in the current window
/// - `X-RateLimit-Reset`: seconds until the window resets
/// - `Retry-After`: on 429 responses only
///
/// # Failure Mode
///
/// Redis errors and timeouts are logged and the request is let through.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use incorpo_shared::redis::RedisClient;
use std::net::{IpAddr, SocketAddr};

const WINDOW_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {current, ttl}
"#;

/// Outcome of counting one request against its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,

    /// Seconds until the window resets
    pub reset_after: u64,
}

/// Decides from the post-increment counter and the key's remaining TTL
pub fn evaluate_window(count: u64, ttl_secs: i64, limit: u32, window_secs: u64) -> RateLimitDecision {
    let reset_after = if ttl_secs > 0 {
        ttl_secs as u64
    } else {
        window_secs
    };

    RateLimitDecision {
        allowed: count <= u64::from(limit),
        limit,
        remaining: u64::from(limit).saturating_sub(count) as u32,
        reset_after,
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

/// Client IP for rate limiting
///
/// With `trust_proxy_headers`, prefers the first `X-Forwarded-For` entry,
/// then `X-Real-IP`. Falls back to the socket peer address. Header values
/// that are not an IP address are ignored.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    let forwarded = if trust_proxy_headers {
        header_ip(headers, "x-forwarded-for").or_else(|| header_ip(headers, "x-real-ip"))
    } else {
        None
    };

    forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn hit_window(
    redis: &RedisClient,
    key: &str,
    window_secs: u64,
) -> Result<(u64, i64), String> {
    let mut conn = redis.get_connection();
    let script = redis::Script::new(WINDOW_SCRIPT);

    let result: Result<(u64, i64), redis::RedisError> = tokio::time::timeout(
        redis.command_timeout(),
        script.key(key).arg(window_secs).invoke_async(&mut conn),
    )
    .await
    .map_err(|_| "rate limit script timed out".to_string())?;

    result.map_err(|e| e.to_string())
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_after));
}

/// Rate limiting middleware
///
/// # Errors
///
/// - 429 Too Many Requests when the window is exhausted
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(redis) = state.redis.as_ref() else {
        return next.run(request).await;
    };

    let settings = &state.config.rate_limit;
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer, settings.trust_proxy_headers);
    let key = format!("ratelimit:ip:{}", ip);

    let decision = match hit_window(redis, &key, settings.window_secs).await {
        Ok((count, ttl)) => evaluate_window(count, ttl, settings.max_requests, settings.window_secs),
        Err(e) => {
            tracing::warn!(error = %e, ip = %ip, "Rate limit check failed, allowing request");
            return next.run(request).await;
        }
    };

    if !decision.allowed {
        tracing::warn!(ip = %ip, limit = decision.limit, "Rate limit exceeded");

        let mut response = ApiError::RateLimitExceeded {
            retry_after: decision.reset_after,
            message: format!(
                "Too many requests. Try again in {} seconds",
                decision.reset_after
            ),
        }
        .into_response();
        apply_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &decision);
    response
}
