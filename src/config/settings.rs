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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、Gemini、Manim、存储、速率限制和清理等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// Gemini AI配置
    pub gemini: GeminiSettings,
    /// Manim渲染配置
    pub manim: ManimSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 后台清理配置
    pub cleanup: CleanupSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// Gemini AI配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// Gemini API密钥
    pub api_key: Option<String>,
    /// 使用的模型名称
    pub model: String,
    /// 生成温度
    pub temperature: f32,
    /// 最大输出Token数
    pub max_tokens: u32,
    /// API基础URL
    pub api_base_url: String,
}

/// Manim渲染配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ManimSettings {
    /// Manim可执行文件名或路径
    pub binary: String,
    /// 单次渲染的超时时间（秒）
    pub timeout_secs: u64,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 输出根目录
    pub output_dir: String,
    /// 临时文件目录
    pub temp_dir: String,
    /// 动画文件目录
    pub animation_dir: String,
}

/// 速率限制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingSettings {
    /// 是否启用速率限制
    pub enabled: bool,
    /// 每个客户端IP每分钟请求数限制
    pub max_requests_per_minute: u32,
}

/// 后台清理配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupSettings {
    /// 清理扫描间隔（秒）
    pub interval_secs: u64,
    /// 任务最大保留时长（小时）
    pub max_age_hours: i64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            // Default Gemini settings
            .set_default("gemini.model", "gemini-1.5-flash")?
            .set_default("gemini.temperature", 0.7)?
            .set_default("gemini.max_tokens", 2048)?
            .set_default(
                "gemini.api_base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            // Default Manim settings
            .set_default("manim.binary", "manim")?
            .set_default("manim.timeout_secs", 300)?
            // Default Storage settings
            .set_default("storage.output_dir", "outputs")?
            .set_default("storage.temp_dir", "outputs/temp")?
            .set_default("storage.animation_dir", "outputs/animations")?
            // Default Rate Limiting settings
            .set_default("rate_limiting.enabled", true)?
            .set_default("rate_limiting.max_requests_per_minute", 10)?
            // Default Cleanup settings
            .set_default("cleanup.interval_secs", 3600)?
            .set_default("cleanup.max_age_hours", 24)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("ANIMAGEN").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
