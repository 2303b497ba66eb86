// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

use crate::config::settings::RateLimitingSettings;

/// 速率限制错误类型
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// 请求过多错误
    #[error("Rate limit exceeded. Please try again later.")]
    TooManyRequests,
}

/// 进程内速率限制器
///
/// 对每个客户端IP维护一个滑动窗口的请求时间戳列表
pub struct RateLimiter {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    requests: DashMap<IpAddr, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitingSettings) -> Self {
        Self {
            enabled: settings.enabled,
            max_requests: settings.max_requests_per_minute,
            window: Duration::from_secs(60),
            requests: DashMap::new(),
        }
    }

    /// 检查客户端IP是否超出速率限制
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 请求未超出限制，本次请求已计入窗口
    /// * `Err(RateLimitError)` - 请求超出限制
    pub fn check(&self, client: IpAddr) -> Result<(), RateLimitError> {
        if !self.enabled {
            return Ok(());
        }

        let now = Instant::now();
        let mut entry = self.requests.entry(client).or_default();
        entry.retain(|seen| now.duration_since(*seen) < self.window);

        if entry.len() >= self.max_requests as usize {
            return Err(RateLimitError::TooManyRequests);
        }

        entry.push(now);
        Ok(())
    }
}

/// 速率限制中间件
///
/// 超出限制时返回429，不再进入下游处理器
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if let Err(e) = limiter.check(client_ip) {
        warn!("Rate limit exceeded for client {}", client_ip);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            })),
        )
            .into_response();
    }

    next.run(request).await
}
