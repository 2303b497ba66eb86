// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 提示词细化结果
///
/// Gemini细化步骤成功后产出的结构化内容，
/// 附加到任务记录上且之后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinedAnimation {
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
    /// 主要视觉元素列表
    pub key_elements: Vec<String>,
}
