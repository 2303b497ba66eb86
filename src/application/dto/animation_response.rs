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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::refinement::RefinedAnimation;
use crate::domain::models::task::{AnimationTask, TaskStatus};

/// 动画生成响应数据传输对象
///
/// 任务创建成功后立即返回，客户端用task_id轮询状态
#[derive(Debug, Serialize, Deserialize)]
pub struct AnimationResponseDto {
    /// 任务唯一标识符
    pub task_id: Uuid,
    /// 任务状态
    pub status: TaskStatus,
    /// 状态消息
    pub message: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl AnimationResponseDto {
    pub fn from_task(task: &AnimationTask) -> Self {
        Self {
            task_id: task.id,
            status: task.status,
            message: "Animation generation started. Use the task ID to check status.".to_string(),
            created_at: task.created_at,
        }
    }
}

/// 动画状态查询响应
///
/// 任务记录的只读投影，供轮询客户端使用
#[derive(Debug, Serialize, Deserialize)]
pub struct AnimationStatusDto {
    /// 任务唯一标识符
    pub task_id: Uuid,
    /// 任务状态
    pub status: TaskStatus,
    /// 进度百分比（0-100）
    pub progress: u8,
    /// 当前步骤描述
    pub message: String,
    /// 文件下载URL，仅在完成后出现
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// 错误消息，仅在失败后出现
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 完成时间，进入终态时设置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// 处理耗时（秒），completed_at - created_at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

impl AnimationStatusDto {
    pub fn from_task(task: &AnimationTask) -> Self {
        let processing_time = task
            .completed_at
            .map(|done| (done - task.created_at).num_milliseconds() as f64 / 1000.0);

        Self {
            task_id: task.id,
            status: task.status,
            progress: task.progress,
            message: task.message.clone(),
            file_url: task.file_url.clone(),
            error_message: task.error_message.clone(),
            created_at: task.created_at,
            completed_at: task.completed_at,
            processing_time,
        }
    }
}

/// 细化提示词响应
///
/// 细化步骤完成后可查询的结构化结果
#[derive(Debug, Serialize, Deserialize)]
pub struct RefinedPromptDto {
    /// 用户的原始提示词
    pub original_prompt: String,
    /// 细化后的提示词
    pub refined_prompt: String,
    /// 生成的Manim代码
    pub manim_code: String,
    /// 动画内容说明
    pub explanation: String,
    /// 预估时长（秒）
    pub estimated_duration: u32,
}

impl RefinedPromptDto {
    pub fn from_refinement(refined: &RefinedAnimation) -> Self {
        Self {
            original_prompt: refined.original_prompt.clone(),
            refined_prompt: refined.refined_prompt.clone(),
            manim_code: refined.manim_code.clone(),
            explanation: refined.explanation.clone(),
            estimated_duration: refined.estimated_duration,
        }
    }
}
