//! Per-client rate limiting for URL creation.

use anyhow::{Context, Result};
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::net::IpAddr;
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Layer type returned by [`layer`].
pub type RateLimitLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Keys requests by client IP.
///
/// Uses the socket peer address unless the service runs behind a trusted
/// proxy, in which case `X-Forwarded-For` / `X-Real-IP` / `Forwarded` are
/// honoured first.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    behind_proxy: bool,
}

impl ClientIpKeyExtractor {
    pub fn new(behind_proxy: bool) -> Self {
        Self { behind_proxy }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.behind_proxy {
            SmartIpKeyExtractor.extract(req)
        } else {
            PeerIpKeyExtractor.extract(req)
        }
    }
}

/// Creates the token-bucket limiter applied to `POST /urls`.
///
/// `per_second` is the replenish period in seconds per token and `burst`
/// the bucket size. Requests over the limit receive `429 Too Many Requests`.
///
/// # Errors
///
/// Returns an error if either value is zero.
///
/// # Example
///
/// ```rust,ignore
/// let create = post(create_url_handler).layer(rate_limit::layer(2, 100, false)?);
/// ```
pub fn layer(per_second: u64, burst: u32, behind_proxy: bool) -> Result<RateLimitLayer> {
    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(behind_proxy))
        .per_second(per_second)
        .burst_size(burst)
        .finish()
        .context("Rate limit period and burst size must be greater than 0")?;

    Ok(GovernorLayer::new(Arc::new(governor_conf)))
}
