// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod mocks;

use axum::Extension;
use axum_test::TestServer;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use animagen::config::settings::{
    CleanupSettings, GeminiSettings, ManimSettings, RateLimitingSettings, ServerSettings,
    Settings, StorageSettings,
};
use animagen::domain::services::animation_service::AnimationService;
use animagen::domain::store::TaskStore;
use animagen::infrastructure::storage::AnimationStorage;
use animagen::presentation::middleware::rate_limit_middleware::RateLimiter;
use animagen::presentation::routes;

use mocks::{MockEngine, MockRefiner};

/// 组装好的测试应用
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<TaskStore>,
    pub storage: Arc<AnimationStorage>,
    _tempdir: TempDir,
}

impl TestApp {
    /// 用给定的细化器行为和渲染结果启动测试应用
    pub async fn spawn(
        refiner: MockRefiner,
        render_error: Option<&str>,
        rate_limiting: RateLimitingSettings,
    ) -> Self {
        let tempdir = tempfile::tempdir().unwrap();
        let root = tempdir.path();

        let storage_settings = StorageSettings {
            output_dir: root.display().to_string(),
            temp_dir: root.join("temp").display().to_string(),
            animation_dir: root.join("animations").display().to_string(),
        };

        let settings = Arc::new(Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            gemini: GeminiSettings {
                api_key: Some("test-key".to_string()),
                model: "gemini-1.5-flash".to_string(),
                temperature: 0.7,
                max_tokens: 2048,
                api_base_url: "http://localhost:1".to_string(),
            },
            manim: ManimSettings {
                binary: "manim".to_string(),
                timeout_secs: 300,
            },
            storage: storage_settings.clone(),
            rate_limiting: rate_limiting.clone(),
            cleanup: CleanupSettings {
                interval_secs: 3600,
                max_age_hours: 24,
            },
        });

        let storage = Arc::new(AnimationStorage::new(&storage_settings));
        storage.ensure_directories().await.unwrap();

        let engine = MockEngine::new(storage.animation_dir().to_path_buf(), render_error);

        let store = Arc::new(TaskStore::new());
        let service = Arc::new(AnimationService::new(
            Arc::clone(&store),
            Arc::new(refiner),
            Arc::new(engine),
        ));

        let rate_limiter = Arc::new(RateLimiter::new(&rate_limiting));
        let app = routes::routes::<MockRefiner, MockEngine>(rate_limiter)
            .layer(Extension(service))
            .layer(Extension(Arc::clone(&storage)))
            .layer(Extension(settings));

        let server = TestServer::new(app).unwrap();

        Self {
            server,
            store,
            storage,
            _tempdir: tempdir,
        }
    }

    pub async fn spawn_default() -> Self {
        Self::spawn(MockRefiner::ok(), None, disabled_rate_limiting()).await
    }
}

pub fn disabled_rate_limiting() -> RateLimitingSettings {
    RateLimitingSettings {
        enabled: false,
        max_requests_per_minute: 10,
    }
}

/// 轮询任务状态直到进入终态
pub async fn poll_until_terminal(app: &TestApp, task_id: &str) -> serde_json::Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let response = app
                .server
                .get(&format!("/api/animations/status/{}", task_id))
                .await;
            assert_eq!(response.status_code(), 200);

            let body: serde_json::Value = response.json();
            let status = body["status"].as_str().unwrap().to_string();
            if status == "completed" || status == "failed" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task should reach a terminal state")
}
