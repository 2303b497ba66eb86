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
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::{ManimSettings, StorageSettings};
use crate::engines::traits::{RenderEngine, RenderError, RenderRequest, RenderedAnimation};

/// Manim渲染引擎
///
/// 把生成的Manim代码写入临时文件，调用外部manim命令渲染，
/// 并在输出目录中定位产出的视频文件。
/// 每次渲染只尝试一次，不做重试。
pub struct ManimEngine {
    binary: String,
    timeout: Duration,
    animation_dir: PathBuf,
    temp_dir: PathBuf,
}

#[async_trait]
impl RenderEngine for ManimEngine {
    async fn render(&self, request: RenderRequest) -> Result<RenderedAnimation, RenderError> {
        ManimEngine::render(self, request).await
    }
}

impl ManimEngine {
    pub fn new(manim: &ManimSettings, storage: &StorageSettings) -> Self {
        Self {
            binary: manim.binary.clone(),
            timeout: Duration::from_secs(manim.timeout_secs),
            animation_dir: PathBuf::from(&storage.animation_dir),
            temp_dir: PathBuf::from(&storage.temp_dir),
        }
    }

    /// 渲染动画
    ///
    /// # 参数
    ///
    /// * `request` - 渲染请求，包含代码、任务ID、质量和背景颜色
    ///
    /// # 返回值
    ///
    /// * `Ok(RenderedAnimation)` - 渲染成功，包含输出文件信息
    /// * `Err(RenderError)` - 渲染失败
    pub async fn render(&self, request: RenderRequest) -> Result<RenderedAnimation, RenderError> {
        info!("Starting animation generation for task {}", request.task_id);

        let cleaned_code = clean_manim_code(&request.manim_code, &request.background_color);

        let code_file = self
            .temp_dir
            .join(format!("animation_{}.py", request.task_id));
        tokio::fs::write(&code_file, &cleaned_code).await?;
        debug!("Prepared code file: {}", code_file.display());

        let result = self.execute_manim(&code_file, request.task_id, request.quality.cli_value())
            .await;

        // 无论渲染结果如何都清理临时代码文件
        if let Err(e) = tokio::fs::remove_file(&code_file).await {
            warn!("Failed to cleanup temp file {}: {}", code_file.display(), e);
        }

        let output_path = result?;
        let metadata = tokio::fs::metadata(&output_path).await?;

        info!(
            "Animation generated successfully for task {}",
            request.task_id
        );

        Ok(RenderedAnimation {
            file_path: output_path,
            file_size: metadata.len(),
        })
    }

    /// 执行manim命令并返回输出文件路径
    async fn execute_manim(
        &self,
        code_file: &Path,
        task_id: Uuid,
        quality: &str,
    ) -> Result<PathBuf, RenderError> {
        let output_filename = format!("animation_{}.mp4", task_id);
        let output_path = self.animation_dir.join(&output_filename);

        let mut cmd = Command::new(&self.binary);
        cmd.arg(code_file)
            .arg("--format=mp4")
            .arg(format!("--quality={}", quality))
            .arg(format!("--output_file={}", output_filename))
            .arg("--disable_caching")
            .arg("--flush_cache")
            .current_dir(&self.animation_dir)
            .kill_on_drop(true);

        info!("Executing Manim command for task {}", task_id);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| RenderError::Timeout)??;

        if !output.status.success() {
            let error_msg = if output.stderr.is_empty() {
                "Unknown Manim error".to_string()
            } else {
                String::from_utf8_lossy(&output.stderr).to_string()
            };
            return Err(RenderError::Execution(error_msg));
        }

        // Manim可能把文件写到质量子目录，找到后搬到预期位置
        if let Some(generated) = find_generated_file(&self.animation_dir, task_id) {
            if generated != output_path {
                tokio::fs::rename(&generated, &output_path).await?;
            }
        }

        if !output_path.exists() {
            return Err(RenderError::OutputMissing);
        }

        Ok(output_path)
    }
}

/// 清理并增强Manim代码
///
/// 确保标准导入存在，无场景类时包裹到默认场景中，
/// 并注入背景颜色设置
pub(crate) fn clean_manim_code(code: &str, background_color: &str) -> String {
    let standard_imports = "from manim import *\nimport numpy as np\nimport math\n\n";

    let mut code = code.to_string();
    if !code.contains("from manim import") && !code.contains("import manim") {
        code = format!("{}{}", standard_imports, code);
    }

    if !code.contains("class ") || !code.contains("Scene") {
        let indented = indent_code(&code, 8);
        return format!(
            "{imports}\nclass GeneratedAnimation(Scene):\n    def construct(self):\n        # Set background color\n        self.camera.background_color = \"{color}\"\n\n{body}\n",
            imports = standard_imports,
            color = background_color,
            body = indented
        );
    }

    if !code.contains("background_color") {
        let mut lines: Vec<String> = code.lines().map(str::to_string).collect();
        for i in 0..lines.len() {
            if lines[i].contains("def construct(self):") {
                lines.insert(
                    i + 1,
                    format!(
                        "        self.camera.background_color = \"{}\"",
                        background_color
                    ),
                );
                break;
            }
        }
        code = lines.join("\n");
    }

    code
}

/// 按指定空格数缩进代码
fn indent_code(code: &str, spaces: usize) -> String {
    let indent = " ".repeat(spaces);
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 在输出目录及Manim质量子目录中查找生成的视频文件
///
/// 优先精确文件名，其次按任务ID模糊匹配，最后取目录中
/// 最新的mp4文件
pub(crate) fn find_generated_file(animation_dir: &Path, task_id: Uuid) -> Option<PathBuf> {
    let search_dirs = [
        animation_dir.to_path_buf(),
        animation_dir.join("videos"),
        animation_dir.join("videos").join("1080p60"),
        animation_dir.join("videos").join("720p30"),
        animation_dir.join("videos").join("480p15"),
    ];

    let exact_name = format!("animation_{}.mp4", task_id);
    let id_fragment = task_id.to_string();

    for dir in &search_dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        let mut id_matches: Vec<PathBuf> = Vec::new();
        let mut any_mp4: Vec<PathBuf> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            if name == exact_name {
                return Some(path);
            }
            if name.ends_with(".mp4") {
                if name.contains(&id_fragment) {
                    id_matches.push(path);
                } else {
                    any_mp4.push(path);
                }
            }
        }

        let mut candidates = if id_matches.is_empty() {
            any_mp4
        } else {
            id_matches
        };
        if !candidates.is_empty() {
            candidates.sort_by_key(|p| {
                std::fs::metadata(p)
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
            });
            return candidates.pop();
        }
    }

    None
}

#[cfg(test)]
#[path = "manim_engine_test.rs"]
mod tests;
