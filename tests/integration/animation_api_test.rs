// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::helpers::mocks::MockRefiner;
use crate::helpers::{disabled_rate_limiting, poll_until_terminal, TestApp};
use animagen::config::settings::RateLimitingSettings;

fn generate_body() -> serde_json::Value {
    json!({
        "prompt": "Show the Pythagorean theorem visually",
        "style": "educational",
        "duration": 10
    })
}

#[tokio::test]
async fn test_full_generation_workflow() {
    let app = TestApp::spawn_default().await;

    let response = app
        .server
        .post("/api/animations/generate")
        .json(&generate_body())
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "pending");
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let status = poll_until_terminal(&app, &task_id).await;
    assert_eq!(status["status"], "completed");
    assert_eq!(status["progress"], 100);
    assert_eq!(
        status["file_url"],
        format!("/api/animations/download/{}", task_id)
    );
    assert!(status.get("error_message").is_none());
    assert!(status["processing_time"].as_f64().unwrap() >= 0.0);

    // 细化结果在完成后可查询
    let refined = app
        .server
        .get(&format!("/api/animations/refined-prompt/{}", task_id))
        .await;
    assert_eq!(refined.status_code(), 200);
    let refined_body: serde_json::Value = refined.json();
    assert_eq!(refined_body["manim_code"], "from manim import *");
    assert_eq!(
        refined_body["original_prompt"],
        "Show the Pythagorean theorem visually"
    );

    // 下载产出的视频
    let download = app
        .server
        .get(&format!("/api/animations/download/{}", task_id))
        .await;
    assert_eq!(download.status_code(), 200);
    assert_eq!(
        download.headers().get("content-type").unwrap(),
        "video/mp4"
    );
    assert_eq!(download.as_bytes().as_ref(), &b"fake mp4 bytes"[..]);
}

#[tokio::test]
async fn test_render_failure_workflow() {
    let app = TestApp::spawn(
        MockRefiner::ok(),
        Some("render error"),
        disabled_rate_limiting(),
    )
    .await;

    let response = app
        .server
        .post("/api/animations/generate")
        .json(&generate_body())
        .await;
    let task_id = response.json::<serde_json::Value>()["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let status = poll_until_terminal(&app, &task_id).await;
    assert_eq!(status["status"], "failed");
    assert!(status["error_message"]
        .as_str()
        .unwrap()
        .contains("render error"));
    assert!(status.get("file_url").is_none());

    // 未完成的任务不允许下载
    let download = app
        .server
        .get(&format!("/api/animations/download/{}", task_id))
        .await;
    assert_eq!(download.status_code(), 400);
}

#[tokio::test]
async fn test_refiner_failure_workflow() {
    let app = TestApp::spawn(MockRefiner::failing(), None, disabled_rate_limiting()).await;

    let response = app
        .server
        .post("/api/animations/generate")
        .json(&generate_body())
        .await;
    let task_id = response.json::<serde_json::Value>()["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let status = poll_until_terminal(&app, &task_id).await;
    assert_eq!(status["status"], "failed");
    assert!(status.get("file_url").is_none());
}

#[tokio::test]
async fn test_generate_rejects_invalid_request() {
    let app = TestApp::spawn_default().await;

    // 提示词过短
    let response = app
        .server
        .post("/api/animations/generate")
        .json(&json!({ "prompt": "too short" }))
        .await;
    assert_eq!(response.status_code(), 400);

    // 时长超出范围
    let response = app
        .server
        .post("/api/animations/generate")
        .json(&json!({
            "prompt": "Show the Pythagorean theorem visually",
            "duration": 120
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    // 背景颜色格式错误
    let response = app
        .server
        .post("/api/animations/generate")
        .json(&json!({
            "prompt": "Show the Pythagorean theorem visually",
            "background_color": "black"
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_status_not_found_and_invalid_id() {
    let app = TestApp::spawn_default().await;

    // 语法合法但不存在的任务ID
    let response = app
        .server
        .get(&format!("/api/animations/status/{}", Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), 404);

    // 过短的任务ID在边界层被拒绝
    let response = app.server.get("/api/animations/status/short").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_refined_prompt_unavailable_mid_refinement() {
    let app = TestApp::spawn(
        MockRefiner::slow(Duration::from_millis(300)),
        None,
        disabled_rate_limiting(),
    )
    .await;

    let response = app
        .server
        .post("/api/animations/generate")
        .json(&generate_body())
        .await;
    let task_id = response.json::<serde_json::Value>()["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    // 任务存在但细化尚未完成：返回404
    let status = app
        .server
        .get(&format!("/api/animations/status/{}", task_id))
        .await;
    assert_eq!(status.status_code(), 200);

    let refined = app
        .server
        .get(&format!("/api/animations/refined-prompt/{}", task_id))
        .await;
    assert_eq!(refined.status_code(), 404);
}

#[tokio::test]
async fn test_list_animations() {
    let app = TestApp::spawn_default().await;

    for _ in 0..2 {
        app.server
            .post("/api/animations/generate")
            .json(&generate_body())
            .await;
    }

    let response = app.server.get("/api/animations/list").await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_tasks"], 2);
    assert_eq!(body["tasks"].as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cleanup_endpoint() {
    let app = TestApp::spawn_default().await;

    let response = app
        .server
        .post("/api/animations/generate")
        .json(&generate_body())
        .await;
    let task_id = response.json::<serde_json::Value>()["task_id"]
        .as_str()
        .unwrap()
        .to_string();
    poll_until_terminal(&app, &task_id).await;

    // 人为把任务标老
    let id = Uuid::parse_str(&task_id).unwrap();
    app.store.update(&id, |task| {
        task.created_at = chrono::Utc::now() - chrono::Duration::hours(25);
    });

    let response = app
        .server
        .delete("/api/animations/cleanup")
        .add_query_param("hours", 24)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["cleaned_tasks"], 1);

    // 清理后任务不可见
    let status = app
        .server
        .get(&format!("/api/animations/status/{}", task_id))
        .await;
    assert_eq!(status.status_code(), 404);

    // 再次清理没有新增删除
    let response = app
        .server
        .delete("/api/animations/cleanup")
        .add_query_param("hours", 24)
        .await;
    assert_eq!(response.json::<serde_json::Value>()["cleaned_tasks"], 0);
}

#[tokio::test]
async fn test_storage_stats_endpoint() {
    let app = TestApp::spawn_default().await;

    std::fs::write(app.storage.animation_dir().join("a.mp4"), vec![0u8; 2048]).unwrap();

    let response = app.server.get("/api/animations/storage-stats").await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["animation_count"], 1);
    assert!(body["total_size_mb"].as_f64().is_some());
}

#[tokio::test]
async fn test_generate_rate_limited() {
    let app = TestApp::spawn(
        MockRefiner::ok(),
        None,
        RateLimitingSettings {
            enabled: true,
            max_requests_per_minute: 2,
        },
    )
    .await;

    for _ in 0..2 {
        let response = app
            .server
            .post("/api/animations/generate")
            .json(&generate_body())
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let response = app
        .server
        .post("/api/animations/generate")
        .json(&generate_body())
        .await;
    assert_eq!(response.status_code(), 429);

    // 其余端点不受速率限制
    let response = app.server.get("/api/animations/list").await;
    assert_eq!(response.status_code(), 200);
}
