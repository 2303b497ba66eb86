// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化日志订阅器
///
/// 过滤级别取自RUST_LOG，未设置时默认info并放开本服务的debug日志。
/// ANIMAGEN_LOG_FORMAT=json时输出结构化JSON日志，便于日志采集。
pub fn init_telemetry() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,animagen=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    if matches!(
        std::env::var("ANIMAGEN_LOG_FORMAT").as_deref(),
        Ok("json")
    ) {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
