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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::utils::validators::validate_background_color;

/// 动画风格枚举
///
/// 决定提示词细化时采用的风格指导
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStyle {
    /// 数学风格，侧重公式、图形和推导
    Mathematical,
    /// 教育风格，清晰渐进的讲解
    #[default]
    Educational,
    /// 科学风格，强调精确性和数据可视化
    Scientific,
    /// 演示风格，适合商务展示
    Presentation,
    /// 创意风格，强调视觉表现力
    Creative,
}

impl fmt::Display for AnimationStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnimationStyle::Mathematical => write!(f, "mathematical"),
            AnimationStyle::Educational => write!(f, "educational"),
            AnimationStyle::Scientific => write!(f, "scientific"),
            AnimationStyle::Presentation => write!(f, "presentation"),
            AnimationStyle::Creative => write!(f, "creative"),
        }
    }
}

impl FromStr for AnimationStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mathematical" => Ok(AnimationStyle::Mathematical),
            "educational" => Ok(AnimationStyle::Educational),
            "scientific" => Ok(AnimationStyle::Scientific),
            "presentation" => Ok(AnimationStyle::Presentation),
            "creative" => Ok(AnimationStyle::Creative),
            _ => Err(()),
        }
    }
}

/// 动画质量枚举
///
/// 对外接口使用简短名称，传给Manim时转换为其质量参数值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationQuality {
    /// 低质量，渲染最快
    Low,
    /// 中等质量
    #[default]
    Medium,
    /// 高质量
    High,
    /// 超高质量，产品级输出
    Ultra,
}

impl AnimationQuality {
    /// 转换为Manim命令行的质量参数值
    pub fn cli_value(&self) -> &'static str {
        match self {
            AnimationQuality::Low => "low_quality",
            AnimationQuality::Medium => "medium_quality",
            AnimationQuality::High => "high_quality",
            AnimationQuality::Ultra => "production_quality",
        }
    }
}

impl fmt::Display for AnimationQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnimationQuality::Low => write!(f, "low"),
            AnimationQuality::Medium => write!(f, "medium"),
            AnimationQuality::High => write!(f, "high"),
            AnimationQuality::Ultra => write!(f, "ultra"),
        }
    }
}

/// 动画生成请求数据传输对象
///
/// 封装客户端发起的动画生成请求的全部参数，
/// 创建任务时原样快照到任务记录中
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnimationRequestDto {
    /// 要生成的动画的自然语言描述
    #[validate(length(min = 10, max = 2000))]
    pub prompt: String,
    /// 动画风格
    #[serde(default)]
    pub style: AnimationStyle,
    /// 动画质量
    #[serde(default)]
    pub quality: AnimationQuality,
    /// 动画时长（秒）
    #[validate(range(min = 5, max = 30))]
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// 背景颜色（十六进制 #RRGGBB）
    #[validate(custom(function = validate_background_color))]
    #[serde(default = "default_background_color")]
    pub background_color: String,
    /// 是否包含音频旁白（尚未实现）
    #[serde(default)]
    pub include_audio: bool,
}

fn default_duration() -> u32 {
    10
}

fn default_background_color() -> String {
    "#000000".to_string()
}
