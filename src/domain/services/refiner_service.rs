// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::application::dto::animation_request::AnimationStyle;
use crate::config::settings::GeminiSettings;
use crate::domain::models::refinement::RefinedAnimation;

/// 细化服务错误类型
#[derive(Error, Debug)]
pub enum RefinerError {
    /// API密钥未配置
    #[error("Gemini API key not configured")]
    NotConfigured,
    /// 请求发送失败
    #[error("Failed to send request to Gemini API: {0}")]
    Request(String),
    /// API返回错误状态
    #[error("Gemini API returned error: {status} - {body}")]
    Api { status: u16, body: String },
    /// 模型返回空响应
    #[error("Empty response from Gemini")]
    EmptyResponse,
    /// 响应解析失败
    #[error("Failed to parse Gemini response: {0}")]
    Parse(String),
}

/// 提示词细化器特质
///
/// 外部协作者的窄适配接口：自然语言提示词进，
/// 结构化的细化结果或类型化错误出
#[async_trait]
pub trait PromptRefiner: Send + Sync {
    async fn refine(
        &self,
        prompt: &str,
        style: AnimationStyle,
        duration: u32,
    ) -> Result<RefinedAnimation, RefinerError>;
}

/// Gemini提示词细化服务
///
/// 调用Gemini generateContent接口，把用户的动画描述细化为
/// 具体的动画脚本并生成可执行的Manim代码。
/// 结构化JSON解析失败时走显式命名的降级路径（代码块提取）。
pub struct GeminiRefiner {
    settings: GeminiSettings,
}

#[async_trait]
impl PromptRefiner for GeminiRefiner {
    async fn refine(
        &self,
        prompt: &str,
        style: AnimationStyle,
        duration: u32,
    ) -> Result<RefinedAnimation, RefinerError> {
        GeminiRefiner::refine(self, prompt, style, duration).await
    }
}

impl GeminiRefiner {
    pub fn new(settings: GeminiSettings) -> Self {
        Self { settings }
    }

    /// 细化提示词并生成Manim代码
    ///
    /// # 参数
    /// * `prompt` - 用户的动画描述
    /// * `style` - 动画风格
    /// * `duration` - 期望时长（秒）
    ///
    /// # 错误
    /// * API密钥未配置、请求失败、响应为空或无法解析时返回错误
    pub async fn refine(
        &self,
        prompt: &str,
        style: AnimationStyle,
        duration: u32,
    ) -> Result<RefinedAnimation, RefinerError> {
        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or(RefinerError::NotConfigured)?;

        info!("Processing prompt with Gemini: {:.100}...", prompt);

        let system_prompt = build_system_prompt(style, duration);
        let full_prompt = format!("{}\n\nUser Request: {}", system_prompt, prompt);

        let request_body = json!({
            "contents": [
                {
                    "parts": [{ "text": full_prompt }]
                }
            ],
            "generationConfig": {
                "temperature": self.settings.temperature,
                "maxOutputTokens": self.settings.max_tokens,
            }
        });

        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.api_base_url, self.settings.model
        );
        let client = reqwest::Client::new();
        let response = client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RefinerError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RefinerError::Api { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RefinerError::Parse(e.to_string()))?;

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|t| !t.trim().is_empty())
            .ok_or(RefinerError::EmptyResponse)?;

        let refined = parse_response(text, prompt, duration)?;
        info!("Successfully generated refined prompt and Manim code");
        Ok(refined)
    }
}

/// 根据动画风格和时长构建系统提示词
fn build_system_prompt(style: AnimationStyle, duration: u32) -> String {
    let base_prompt = format!(
        r#"You are an expert Manim (Mathematical Animation Engine) developer. Your task is to:

1. Refine the user's prompt to be more specific and animation-friendly
2. Generate working Manim code that creates the requested animation
3. Ensure the animation duration is approximately {duration} seconds

Animation Style: {style}

Requirements:
- Generate complete, executable Manim code
- Use proper Manim syntax and imports
- Include appropriate animations and transitions
- Code should be production-ready
- Animation should be visually appealing and smooth
- Use colors and styling appropriate for {style} content

Response Format (JSON):
{{
    "refined_prompt": "Detailed, specific description of the animation",
    "manim_code": "Complete Manim Python code",
    "explanation": "Brief explanation of what the animation does",
    "estimated_duration": {duration},
    "key_elements": ["list", "of", "main", "visual", "elements"]
}}

Style-specific guidelines:"#
    );

    let style_guidelines = match style {
        AnimationStyle::Mathematical => {
            r#"
- Focus on mathematical concepts, equations, graphs
- Use mathematical notation and symbols
- Include step-by-step derivations or proofs
- Use colors that highlight mathematical relationships
- Consider geometric transformations and algebraic manipulations
"#
        }
        AnimationStyle::Educational => {
            r#"
- Create clear, easy-to-follow explanations
- Use simple, clean visuals
- Include text explanations alongside visuals
- Build concepts progressively
- Use educational color schemes (blues, greens)
"#
        }
        AnimationStyle::Scientific => {
            r#"
- Focus on scientific accuracy and precision
- Use scientific notation and units
- Include data visualizations, charts, diagrams
- Use professional color schemes
- Show cause-and-effect relationships
"#
        }
        AnimationStyle::Presentation => {
            r#"
- Create polished, professional-looking animations
- Use corporate-friendly colors and fonts
- Focus on clear messaging and key points
- Include smooth transitions and engaging visuals
- Emphasize important information
"#
        }
        AnimationStyle::Creative => {
            r#"
- Use vibrant colors and creative visual effects
- Include artistic elements and creative transitions
- Experiment with unique visual styles
- Focus on visual appeal and engagement
- Use creative typography and design elements
"#
        }
    };

    base_prompt + style_guidelines
}

/// 解析模型回复为结构化细化结果
///
/// 先尝试提取并解析JSON对象；JSON解析失败时进入降级提取路径
pub(crate) fn parse_response(
    response_text: &str,
    original_prompt: &str,
    duration: u32,
) -> Result<RefinedAnimation, RefinerError> {
    let start = response_text.find('{');
    let end = response_text.rfind('}');

    let json_str = match (start, end) {
        (Some(s), Some(e)) if e > s => &response_text[s..=e],
        _ => {
            error!("No JSON found in Gemini response, using fallback extraction");
            return Ok(fallback_extract(response_text, original_prompt, duration));
        }
    };

    let parsed: Value = match serde_json::from_str(json_str) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to parse JSON response: {}, using fallback extraction", e);
            return Ok(fallback_extract(response_text, original_prompt, duration));
        }
    };

    // Required fields; a structurally valid reply missing them is a hard error
    for field in ["refined_prompt", "manim_code", "explanation"] {
        if parsed.get(field).and_then(Value::as_str).is_none() {
            return Err(RefinerError::Parse(format!(
                "Missing required field: {}",
                field
            )));
        }
    }

    let key_elements = parsed["key_elements"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Ok(RefinedAnimation {
        original_prompt: original_prompt.to_string(),
        refined_prompt: parsed["refined_prompt"].as_str().unwrap_or_default().to_string(),
        manim_code: parsed["manim_code"].as_str().unwrap_or_default().to_string(),
        explanation: parsed["explanation"].as_str().unwrap_or_default().to_string(),
        estimated_duration: parsed["estimated_duration"].as_u64().unwrap_or(duration as u64)
            as u32,
        key_elements,
    })
}

/// 降级提取路径
///
/// JSON解析失败时尽力从回复中抠出代码块，其余字段使用
/// 标记降级的占位内容
pub(crate) fn fallback_extract(
    response_text: &str,
    original_prompt: &str,
    duration: u32,
) -> RefinedAnimation {
    let manim_code = extract_code_block(response_text)
        .unwrap_or_else(|| "# No code found in response".to_string());

    let explanation = if response_text.len() > 500 {
        let boundary = response_text
            .char_indices()
            .take_while(|(i, _)| *i <= 500)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &response_text[..boundary])
    } else {
        response_text.to_string()
    };

    RefinedAnimation {
        original_prompt: original_prompt.to_string(),
        refined_prompt: "Refined prompt extraction failed".to_string(),
        manim_code,
        explanation,
        estimated_duration: duration,
        key_elements: vec![
            "animation".to_string(),
            "visual".to_string(),
            "content".to_string(),
        ],
    }
}

/// 从回复文本中提取第一个代码块的内容
fn extract_code_block(text: &str) -> Option<String> {
    let start = text.find("```python").or_else(|| text.find("```"))?;
    let after_fence = &text[start..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    let code = body[..end].trim();

    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

#[cfg(test)]
#[path = "refiner_service_test.rs"]
mod tests;
