// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Disks, System};
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::settings::Settings;
use crate::infrastructure::storage::AnimationStorage;

/// 基础健康检查
///
/// 报告各依赖项（Gemini配置、Manim可执行文件、文件系统）的状态；
/// 任一依赖不健康时整体状态降级为degraded
pub async fn health_check(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(storage): Extension<Arc<AnimationStorage>>,
) -> impl IntoResponse {
    let gemini = if settings.gemini.api_key.is_some() {
        "healthy".to_string()
    } else {
        "unhealthy: API key not configured".to_string()
    };

    let manim = match probe_manim(&settings.manim.binary).await {
        Ok(()) => "healthy".to_string(),
        Err(e) => format!("unhealthy: {}", e),
    };

    let filesystem = if storage.is_writable().await {
        "healthy".to_string()
    } else {
        "unhealthy: output directory not writable".to_string()
    };

    let all_healthy = [&gemini, &manim, &filesystem]
        .iter()
        .all(|status| status.as_str() == "healthy");
    let overall = if all_healthy { "healthy" } else { "degraded" };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": overall,
            "timestamp": Utc::now(),
            "version": env!("CARGO_PKG_VERSION"),
            "services": {
                "gemini": gemini,
                "manim": manim,
                "filesystem": filesystem,
            }
        })),
    )
}

/// 详细健康检查
///
/// 返回系统资源、配置和存储的全面状态
pub async fn detailed_health_check(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(storage): Extension<Arc<AnimationStorage>>,
) -> impl IntoResponse {
    let mut sys = System::new_all();
    sys.refresh_all();

    let disks = Disks::new_with_refreshed_list();
    let disk_free_gb = disks
        .list()
        .first()
        .map(|disk| to_gb(disk.available_space()))
        .unwrap_or(0.0);

    let system_info = serde_json::json!({
        "platform": std::env::consts::OS,
        "cpu_count": sys.cpus().len(),
        "memory_total_gb": to_gb(sys.total_memory()),
        "memory_available_gb": to_gb(sys.available_memory()),
        "disk_free_gb": disk_free_gb,
    });

    let configuration = serde_json::json!({
        "gemini_api_key_configured": settings.gemini.api_key.is_some(),
        "output_directory_exists": storage.output_dir().exists(),
        "temp_directory_exists": storage.temp_dir().exists(),
        "animation_directory_exists": storage.animation_dir().exists(),
    });

    let storage_stats = storage.storage_stats().await;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "timestamp": Utc::now(),
            "system_info": system_info,
            "configuration": configuration,
            "storage": storage_stats,
            "settings": {
                "gemini_model": settings.gemini.model,
                "manim_timeout_secs": settings.manim.timeout_secs,
                "max_requests_per_minute": settings.rate_limiting.max_requests_per_minute,
                "cleanup_max_age_hours": settings.cleanup.max_age_hours,
            }
        })),
    )
}

/// Kubernetes风格就绪检查
///
/// 存在任何阻碍接收请求的问题时返回not ready及问题列表
pub async fn readiness_check(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(storage): Extension<Arc<AnimationStorage>>,
) -> impl IntoResponse {
    let mut issues: Vec<String> = Vec::new();

    if settings.gemini.api_key.is_none() {
        issues.push("Gemini API key not configured".to_string());
    }

    if !storage.output_dir().exists() {
        issues.push("Output directory does not exist".to_string());
    }

    if let Err(e) = probe_manim(&settings.manim.binary).await {
        issues.push(format!("Manim not available: {}", e));
    }

    if issues.is_empty() {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "timestamp": Utc::now(),
            })),
        )
    } else {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "not ready",
                "timestamp": Utc::now(),
                "issues": issues,
            })),
        )
    }
}

/// Kubernetes风格存活检查
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "timestamp": Utc::now(),
        })),
    )
}

/// 探测Manim可执行文件是否可用
async fn probe_manim(binary: &str) -> Result<(), String> {
    let probe = Command::new(binary).arg("--version").output();

    match timeout(Duration::from_secs(5), probe).await {
        Ok(Ok(output)) if output.status.success() => Ok(()),
        Ok(Ok(output)) => Err(format!(
            "exited with status {}",
            output.status.code().unwrap_or(-1)
        )),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("version probe timed out".to_string()),
    }
}

fn to_gb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0 * 1024.0) * 100.0).round() / 100.0
}
