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

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::application::dto::animation_request::AnimationQuality;

/// 渲染引擎错误类型
#[derive(Error, Debug)]
pub enum RenderError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 渲染进程执行失败
    #[error("Manim execution failed: {0}")]
    Execution(String),
    /// 渲染超时
    #[error("Manim execution timed out")]
    Timeout,
    /// 未找到输出文件
    #[error("Animation file was not generated")]
    OutputMissing,
}

/// 渲染请求
pub struct RenderRequest {
    /// 要执行的Manim代码
    pub manim_code: String,
    /// 任务唯一标识符，决定输出文件名
    pub task_id: Uuid,
    /// 渲染质量
    pub quality: AnimationQuality,
    /// 背景颜色（十六进制 #RRGGBB）
    pub background_color: String,
}

/// 渲染结果
#[derive(Debug, Clone)]
pub struct RenderedAnimation {
    /// 输出文件路径
    pub file_path: PathBuf,
    /// 输出文件大小（字节）
    pub file_size: u64,
}

/// 渲染引擎特质
///
/// 外部协作者的窄适配接口：代码进，文件出或类型化错误
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<RenderedAnimation, RenderError>;
}
