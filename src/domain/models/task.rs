// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::application::dto::animation_request::AnimationRequestDto;
use crate::domain::models::refinement::RefinedAnimation;

/// 动画任务实体
///
/// 表示一次动画生成请求及其被跟踪的生命周期状态。
/// 每个任务只有一个后台处理例程作为其唯一写入者，
/// 状态轮询作为并发读取者获取记录快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationTask {
    /// 任务唯一标识符，创建时生成且不可变
    pub id: Uuid,
    /// 任务状态，跟踪任务在其生命周期中的当前阶段
    pub status: TaskStatus,
    /// 进度百分比，固定检查点10/50/90/100，单调不减
    pub progress: u8,
    /// 当前步骤的人类可读描述
    pub message: String,
    /// 创建时间，创建时设置且不可变
    pub created_at: DateTime<Utc>,
    /// 完成时间，进入终态时设置一次
    pub completed_at: Option<DateTime<Utc>>,
    /// 文件下载URL，仅在成功完成时设置
    pub file_url: Option<String>,
    /// 错误消息，仅在失败时设置
    pub error_message: Option<String>,
    /// 原始请求参数的不可变快照
    pub request: AnimationRequestDto,
    /// 提示词细化结果，细化步骤成功后设置一次
    pub refinement: Option<RefinedAnimation>,
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程，进入终态后不再转换：
/// Pending → Processing → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 等待中，任务已创建但尚未开始处理
    #[default]
    Pending,
    /// 处理中，后台例程正在执行
    Processing,
    /// 已完成，动画生成成功
    Completed,
    /// 已失败，细化或渲染失败
    Failed,
}

impl TaskStatus {
    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当任务状态转换不符合业务规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,
}

impl AnimationTask {
    /// 创建一个新的任务
    ///
    /// # 参数
    ///
    /// * `request` - 请求参数，原样快照到任务上
    ///
    /// # 返回值
    ///
    /// 返回状态为Pending、进度为0的新任务实例
    pub fn new(request: AnimationRequestDto) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: TaskStatus::Pending,
            progress: 0,
            message: "Task created, waiting to start processing".to_string(),
            created_at: Utc::now(),
            completed_at: None,
            file_url: None,
            error_message: None,
            request,
            refinement: None,
        }
    }

    /// 推进任务到指定的进度检查点
    ///
    /// 将任务状态置为Processing并更新进度和消息。
    /// 进度单调不减：低于当前值的检查点不会回退进度。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 推进成功
    /// * `Err(DomainError)` - 任务已处于终态
    pub fn advance(&mut self, progress: u8, message: &str) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::Processing => {
                self.status = TaskStatus::Processing;
                self.progress = self.progress.max(progress);
                self.message = message.to_string();
                Ok(())
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 完成任务
    ///
    /// 将任务状态从Processing变更为Completed，
    /// 设置文件URL、进度100和完成时间
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 完成成功
    /// * `Err(DomainError)` - 状态转换失败
    pub fn complete(&mut self, file_url: String) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Processing => {
                self.status = TaskStatus::Completed;
                self.progress = 100;
                self.message = "Animation generated successfully!".to_string();
                self.file_url = Some(file_url);
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记任务失败
    ///
    /// 从任意非终态进入Failed，记录错误消息并设置完成时间。
    /// 进度保持不变。
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 标记成功
    /// * `Err(DomainError)` - 任务已处于终态
    pub fn fail(&mut self, message: &str, error: String) -> Result<(), DomainError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::Processing => {
                self.status = TaskStatus::Failed;
                self.message = message.to_string();
                self.error_message = Some(error);
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 附加细化结果
    pub fn attach_refinement(&mut self, refined: RefinedAnimation) {
        self.refinement = Some(refined);
    }
}
