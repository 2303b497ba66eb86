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
    extract::{Extension, Json, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::animation_request::AnimationRequestDto;
use crate::domain::models::task::TaskStatus;
use crate::domain::services::animation_service::AnimationService;
use crate::domain::services::refiner_service::PromptRefiner;
use crate::engines::traits::RenderEngine;
use crate::infrastructure::storage::AnimationStorage;
use crate::utils::validators::validate_task_id;

/// 清理请求查询参数
#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    /// 清理早于该小时数的任务，默认24
    pub hours: Option<i64>,
}

pub async fn generate_animation<R, E>(
    Extension(service): Extension<Arc<AnimationService<R, E>>>,
    Json(payload): Json<AnimationRequestDto>,
) -> impl IntoResponse
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    if let Err(e) = payload.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            })),
        )
            .into_response();
    }

    info!("Animation generation request: {:.100}...", payload.prompt);

    let response = service.create_animation(payload);
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn get_animation_status<R, E>(
    Path(task_id): Path<String>,
    Extension(service): Extension<Arc<AnimationService<R, E>>>,
) -> impl IntoResponse
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match id.and_then(|id| service.get_animation_status(&id)) {
        Some(status) => (StatusCode::OK, Json(status)).into_response(),
        None => task_not_found(),
    }
}

pub async fn get_refined_prompt<R, E>(
    Path(task_id): Path<String>,
    Extension(service): Extension<Arc<AnimationService<R, E>>>,
) -> impl IntoResponse
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match id.and_then(|id| service.get_refined_prompt(&id)) {
        Some(refined) => (StatusCode::OK, Json(refined)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "error": "Task not found or prompt not yet processed"
            })),
        )
            .into_response(),
    }
}

pub async fn download_animation<R, E>(
    Path(task_id): Path<String>,
    Extension(service): Extension<Arc<AnimationService<R, E>>>,
    Extension(storage): Extension<Arc<AnimationStorage>>,
) -> impl IntoResponse
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    let id = match parse_task_id(&task_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let status = match id.and_then(|id| service.get_animation_status(&id)) {
        Some(status) => status,
        None => return task_not_found(),
    };

    if status.status != TaskStatus::Completed {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Animation is not ready. Current status: {}", status.status)
            })),
        )
            .into_response();
    }

    let file_path = match storage.find_animation_file(status.task_id).await {
        Some(path) => path,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "success": false,
                    "error": "Animation file not found"
                })),
            )
                .into_response();
        }
    };

    let body = match tokio::fs::read(&file_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(
                "Failed to read animation file {}: {}",
                file_path.display(),
                e
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": "Failed to read animation file"
                })),
            )
                .into_response();
        }
    };

    info!("Serving animation download for task: {}", status.task_id);

    let filename = format!("animation_{}.mp4", status.task_id);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn list_animations<R, E>(
    Extension(service): Extension<Arc<AnimationService<R, E>>>,
) -> impl IntoResponse
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    let tasks = service.list_tasks();

    let simplified: serde_json::Map<String, serde_json::Value> = tasks
        .iter()
        .map(|task| {
            (
                task.id.to_string(),
                serde_json::json!({
                    "status": task.status,
                    "progress": task.progress,
                    "message": task.message,
                    "created_at": task.created_at,
                    "prompt": truncate_prompt(&task.request.prompt),
                }),
            )
        })
        .collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "total_tasks": simplified.len(),
            "tasks": simplified
        })),
    )
        .into_response()
}

pub async fn cleanup_old_tasks<R, E>(
    Query(params): Query<CleanupParams>,
    Extension(service): Extension<Arc<AnimationService<R, E>>>,
    Extension(storage): Extension<Arc<AnimationStorage>>,
) -> impl IntoResponse
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    let hours = params.hours.unwrap_or(24).max(0);

    let cleaned_tasks = service.cleanup_old_tasks(hours).await;
    let cleaned_files = storage
        .cleanup_old_animations(((hours / 24).max(1)) as u64)
        .await;
    let cleaned_temp = storage.cleanup_temp_files().await;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "cleaned_tasks": cleaned_tasks,
            "cleaned_animation_files": cleaned_files,
            "cleaned_temp_files": cleaned_temp,
            "message": format!(
                "Cleanup completed. Removed {} tasks, {} animation files, and {} temp files.",
                cleaned_tasks, cleaned_files, cleaned_temp
            )
        })),
    )
        .into_response()
}

pub async fn get_storage_stats(
    Extension(storage): Extension<Arc<AnimationStorage>>,
) -> impl IntoResponse {
    let stats = storage.storage_stats().await;
    (StatusCode::OK, Json(stats)).into_response()
}

/// 任务ID边界检查
///
/// 长度不足直接400；语法合法但不是UUID的ID当作查询未命中
fn parse_task_id(task_id: &str) -> Result<Option<Uuid>, axum::response::Response> {
    if validate_task_id(task_id).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": "Invalid task ID format"
            })),
        )
            .into_response());
    }

    Ok(Uuid::parse_str(task_id).ok())
}

fn task_not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "error": "Task not found"
        })),
    )
        .into_response()
}

/// 截断提示词用于列表展示，保持字符边界
fn truncate_prompt(prompt: &str) -> String {
    if prompt.chars().count() <= 100 {
        prompt.to_string()
    } else {
        let truncated: String = prompt.chars().take(100).collect();
        format!("{}...", truncated)
    }
}
