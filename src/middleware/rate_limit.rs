use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    cache::{Admission, RateLimitCacheOperations},
    config::{Config, ConfigError},
};

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Try again later.";

#[derive(Debug)]
pub struct RateLimiter {
    windows: RateLimitCacheOperations,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(
        request_limit: u32,
        window: Duration,
        trust_proxy_headers: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            windows: RateLimitCacheOperations::new(request_limit, window)?,
            trust_proxy_headers,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            config.rate_limit_requests,
            config.rate_limit_window(),
            config.trust_proxy_headers,
        )
    }

    pub fn admit(&self, client_id: &str) -> Admission {
        self.windows.admit(client_id)
    }

    pub fn windows(&self) -> &RateLimitCacheOperations {
        &self.windows
    }

    /// 确定客户端标识
    ///
    /// 默认只用连接地址；开启代理头信任后依次尝试 `x-real-ip`、
    /// `x-forwarded-for` 的第一个非空地址。
    pub fn client_id(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let remote_ip = peer.map(|addr| addr.ip().to_string());

        let forwarded = if self.trust_proxy_headers {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .filter(|ip| !ip.trim().is_empty())
                .or_else(|| {
                    headers
                        .get("x-forwarded-for")
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
                })
        } else {
            None
        };

        forwarded
            .or(remote_ip.as_deref()) // 降级使用连接IP
            .unwrap_or("unknown")
            .trim()
            .to_string()
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        let ip = self.client_id(req.headers(), peer);

        match self.admit(&ip) {
            Admission::Allowed { count } => {
                if count == 1 {
                    tracing::info!("Request count started for IP {}", ip);
                } else {
                    tracing::info!("Request {} for IP {}", count, ip);
                }
                next.run(req).await
            }
            Admission::Rejected { retry_after } => {
                tracing::warn!("Rate limit exceeded for IP {}", ip);
                too_many_requests(retry_after)
            }
        }
    }
}

fn too_many_requests(retry_after: Duration) -> Response {
    // 向上取整到秒，至少 1 秒
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
    response
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
