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

use thiserror::Error;

/// 验证错误类型
#[derive(Error, Debug)]
pub enum ValidationError {
    /// 任务ID格式无效
    #[error("Invalid task ID format")]
    InvalidTaskId,
}

/// 验证任务ID格式
///
/// 边界层只做语法检查：长度不少于10个字符即视为合法，
/// 是否存在由存储层查询决定
///
/// # 参数
///
/// * `task_id` - 任务ID字符串
///
/// # 返回值
///
/// * `Ok(())` - 格式合法
/// * `Err(ValidationError)` - 格式非法
pub fn validate_task_id(task_id: &str) -> Result<(), ValidationError> {
    if task_id.len() < 10 {
        return Err(ValidationError::InvalidTaskId);
    }
    Ok(())
}

/// 验证十六进制背景颜色（#RRGGBB）
pub fn validate_background_color(color: &str) -> Result<(), validator::ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err(validator::ValidationError::new("background_color"))
    }
}
