// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::domain::services::refiner_service::PromptRefiner;
use crate::engines::traits::RenderEngine;
use crate::presentation::handlers::{animation_handler, health_handler};
use crate::presentation::middleware::rate_limit_middleware::{
    rate_limit_middleware, RateLimiter,
};

/// 创建应用路由
///
/// 处理器按细化器和渲染引擎的具体类型实例化，
/// 服务实例通过Extension在启动时注入
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes<R, E>(rate_limiter: Arc<RateLimiter>) -> Router
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    let generate_routes = Router::new()
        .route(
            "/api/animations/generate",
            post(animation_handler::generate_animation::<R, E>),
        )
        .layer(from_fn_with_state(rate_limiter, rate_limit_middleware));

    let animation_routes = Router::new()
        .route(
            "/api/animations/status/{task_id}",
            get(animation_handler::get_animation_status::<R, E>),
        )
        .route(
            "/api/animations/refined-prompt/{task_id}",
            get(animation_handler::get_refined_prompt::<R, E>),
        )
        .route(
            "/api/animations/download/{task_id}",
            get(animation_handler::download_animation::<R, E>),
        )
        .route(
            "/api/animations/list",
            get(animation_handler::list_animations::<R, E>),
        )
        .route(
            "/api/animations/cleanup",
            delete(animation_handler::cleanup_old_tasks::<R, E>),
        )
        .route(
            "/api/animations/storage-stats",
            get(animation_handler::get_storage_stats),
        );

    let health_routes = Router::new()
        .route("/api/health", get(health_handler::health_check))
        .route(
            "/api/health/detailed",
            get(health_handler::detailed_health_check),
        )
        .route("/api/health/ready", get(health_handler::readiness_check))
        .route("/api/health/live", get(health_handler::liveness_check));

    Router::new()
        .merge(generate_routes)
        .merge(animation_routes)
        .merge(health_routes)
}
