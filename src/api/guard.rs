//! Protection for `POST /articles/generate`: a per-address rate limit and an
//! optional shared key.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    middleware::Next,
    response::Response,
};
use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};
use serde::Deserialize;

use crate::error::{AppError, Result};

use super::error::ApiError;
use super::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Above this many tracked addresses, idle entries are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

const WINDOW: Duration = Duration::from_secs(3600);

/// Keyed GCRA limiter: at most `n` calls per client address in any hour.
/// A spent call comes back a full hour later, not `1/n` of an hour later.
pub struct GenerateLimiter<C: Clock = DefaultClock> {
    limiter: RateLimiter<IpAddr, DashMapStateStore<IpAddr>, C, NoOpMiddleware<C::Instant>>,
    clock: C,
}

impl GenerateLimiter {
    pub fn per_hour(n: u32) -> Result<Self> {
        Self::with_clock(n, DefaultClock::default())
    }
}

impl<C: Clock> GenerateLimiter<C> {
    pub fn with_clock(n: u32, clock: C) -> Result<Self> {
        let n = NonZeroU32::new(n)
            .ok_or_else(|| AppError::Config("rate limit must be greater than zero".to_string()))?;
        let quota = Quota::with_period(WINDOW)
            .ok_or_else(|| AppError::Config("invalid rate limit window".to_string()))?
            .allow_burst(n);
        Ok(Self {
            limiter: RateLimiter::dashmap_with_clock(quota, &clock),
            clock,
        })
    }

    /// `Err` carries how long the caller has to wait.
    pub fn check(&self, addr: IpAddr) -> std::result::Result<(), Duration> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }
        self.limiter
            .check_key(&addr)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let addr = connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if let Err(retry_after) = state.limiter.check(addr) {
        tracing::warn!("Rate limit exceeded for {}", addr);
        return Err(ApiError::TooManyRequests { retry_after });
    }

    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    api_key: Option<String>,
}

/// Passes everything through when no key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    // A query string that doesn't parse just means no key was given there
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            Query::<KeyQuery>::try_from_uri(request.uri())
                .ok()
                .and_then(|Query(query)| query.api_key)
        });

    if provided.as_deref() != Some(expected) {
        tracing::warn!("Rejected generate request with missing or invalid API key");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use governor::clock::FakeRelativeClock;

    #[test]
    fn allows_quota_then_blocks() {
        let limiter = GenerateLimiter::per_hour(5).unwrap();
        let addr: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..5 {
            assert!(limiter.check(addr).is_ok());
        }
        let wait = limiter.check(addr).unwrap_err();
        assert!(wait > Duration::from_secs(60));
        assert!(wait <= Duration::from_secs(3600));
    }

    #[test]
    fn addresses_are_counted_separately() {
        let limiter = GenerateLimiter::per_hour(1).unwrap();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(a).is_ok());
        assert!(limiter.check(a).is_err());
        assert!(limiter.check(b).is_ok());
    }

    #[test]
    fn spent_calls_come_back_only_after_an_hour() {
        let clock = FakeRelativeClock::default();
        let limiter = GenerateLimiter::with_clock(5, clock.clone()).unwrap();
        let addr: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..5 {
            assert!(limiter.check(addr).is_ok());
        }

        clock.advance(Duration::from_secs(13 * 60));
        let wait = limiter.check(addr).unwrap_err();
        assert_eq!(wait, Duration::from_secs(47 * 60));

        // Nothing gets through anywhere else in the hour
        for _ in 0..3 {
            clock.advance(Duration::from_secs(12 * 60));
            assert!(limiter.check(addr).is_err());
        }

        clock.advance(Duration::from_secs(11 * 60));
        assert!(limiter.check(addr).is_ok());
        assert!(limiter.check(addr).is_err());
    }

    #[test]
    fn zero_quota_is_rejected() {
        assert!(GenerateLimiter::per_hour(0).is_err());
    }
}
