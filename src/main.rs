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

use animagen::config::settings::Settings;
use animagen::domain::services::animation_service::AnimationService;
use animagen::domain::services::refiner_service::GeminiRefiner;
use animagen::domain::store::TaskStore;
use animagen::engines::manim_engine::ManimEngine;
use animagen::infrastructure::storage::AnimationStorage;
use animagen::presentation::middleware::rate_limit_middleware::RateLimiter;
use animagen::presentation::routes;
use animagen::utils::telemetry;
use animagen::workers::cleanup_worker::CleanupWorker;
use axum::Extension;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting animagen...");

    // Initialize Prometheus Metrics
    animagen::infrastructure::metrics::init_metrics();

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Prepare storage directories
    let storage = Arc::new(AnimationStorage::new(&settings.storage));
    storage.ensure_directories().await?;
    info!("Storage directories ready");

    // 4. Initialize Components
    let store = Arc::new(TaskStore::new());
    let refiner = Arc::new(GeminiRefiner::new(settings.gemini.clone()));
    let engine = Arc::new(ManimEngine::new(&settings.manim, &settings.storage));
    let service = Arc::new(AnimationService::new(store, refiner, engine));

    // 5. Initialize Rate Limiter
    let rate_limiter = Arc::new(RateLimiter::new(&settings.rate_limiting));
    info!("Rate limiter initialized");

    // 6. Start Cleanup Worker
    let cleanup_worker = CleanupWorker::new(
        Arc::clone(&service),
        Arc::clone(&storage),
        &settings.cleanup,
    );
    cleanup_worker.start();

    // 7. Start HTTP server
    let app = routes::routes::<GeminiRefiner, ManimEngine>(rate_limiter)
        .layer(Extension(Arc::clone(&service)))
        .layer(Extension(storage))
        .layer(Extension(Arc::clone(&settings)))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    service.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
}
