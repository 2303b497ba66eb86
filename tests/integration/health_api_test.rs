// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::TestApp;

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::spawn_default().await;

    let response = app.server.get("/api/health/live").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<serde_json::Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_status() {
    let app = TestApp::spawn_default().await;

    let response = app.server.get("/api/health/ready").await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    let status = body["status"].as_str().unwrap();
    // 测试环境通常没有manim可执行文件，两种结果都合法
    assert!(status == "ready" || status == "not ready");
    if status == "not ready" {
        assert!(!body["issues"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_health_check_reports_services() {
    let app = TestApp::spawn_default().await;

    let response = app.server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert!(body["status"] == "healthy" || body["status"] == "degraded");
    assert_eq!(body["services"]["gemini"], "healthy");
    assert!(body["services"]["filesystem"].as_str().is_some());
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_detailed_health_check() {
    let app = TestApp::spawn_default().await;

    let response = app.server.get("/api/health/detailed").await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert!(body["system_info"]["cpu_count"].as_u64().unwrap() > 0);
    assert_eq!(body["configuration"]["gemini_api_key_configured"], true);
    assert_eq!(body["configuration"]["animation_directory_exists"], true);
    assert!(body["storage"]["animation_count"].as_u64().is_some());
}
