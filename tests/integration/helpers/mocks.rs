// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use animagen::application::dto::animation_request::AnimationStyle;
use animagen::domain::models::refinement::RefinedAnimation;
use animagen::domain::services::refiner_service::{PromptRefiner, RefinerError};
use animagen::engines::traits::{RenderEngine, RenderError, RenderRequest, RenderedAnimation};

/// 测试用细化器，可配置失败或延迟
pub struct MockRefiner {
    fail: bool,
    delay: Duration,
}

impl MockRefiner {
    pub fn ok() -> Self {
        Self {
            fail: false,
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { fail: false, delay }
    }
}

#[async_trait]
impl PromptRefiner for MockRefiner {
    async fn refine(
        &self,
        prompt: &str,
        _style: AnimationStyle,
        duration: u32,
    ) -> Result<RefinedAnimation, RefinerError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(RefinerError::EmptyResponse);
        }
        Ok(RefinedAnimation {
            original_prompt: prompt.to_string(),
            refined_prompt: "An animated visual proof".to_string(),
            manim_code: "from manim import *".to_string(),
            explanation: "test animation".to_string(),
            estimated_duration: duration,
            key_elements: vec!["triangle".to_string()],
        })
    }
}

/// 测试用渲染引擎
///
/// 成功时把一个假的视频文件写入动画目录，
/// 模拟真实引擎的产出约定
pub struct MockEngine {
    animation_dir: PathBuf,
    error: Option<String>,
}

impl MockEngine {
    pub fn new(animation_dir: PathBuf, error: Option<&str>) -> Self {
        Self {
            animation_dir,
            error: error.map(str::to_string),
        }
    }
}

#[async_trait]
impl RenderEngine for MockEngine {
    async fn render(&self, request: RenderRequest) -> Result<RenderedAnimation, RenderError> {
        if let Some(message) = &self.error {
            return Err(RenderError::Execution(message.clone()));
        }

        let path = self
            .animation_dir
            .join(format!("animation_{}.mp4", request.task_id));
        tokio::fs::write(&path, b"fake mp4 bytes").await?;

        Ok(RenderedAnimation {
            file_path: path,
            file_size: 14,
        })
    }
}
