// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::settings::StorageSettings;

/// 视频文件扩展名
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

/// 存储统计信息
#[derive(Debug, Serialize, Deserialize)]
pub struct StorageStats {
    /// 动画文件数量
    pub animation_count: usize,
    /// 动画文件总大小（MB）
    pub animation_size_mb: f64,
    /// 临时文件数量
    pub temp_files_count: usize,
    /// 临时文件总大小（MB）
    pub temp_size_mb: f64,
    /// 总大小（MB）
    pub total_size_mb: f64,
}

/// 动画文件存储
///
/// 负责定位渲染产出的视频文件、统计磁盘占用，
/// 以及清理过期动画和临时文件。
/// 单个文件的IO失败只记录日志，不影响整体操作。
pub struct AnimationStorage {
    output_dir: PathBuf,
    animation_dir: PathBuf,
    temp_dir: PathBuf,
}

impl AnimationStorage {
    pub fn new(settings: &StorageSettings) -> Self {
        info!("Initialized File Storage");
        Self {
            output_dir: PathBuf::from(&settings.output_dir),
            animation_dir: PathBuf::from(&settings.animation_dir),
            temp_dir: PathBuf::from(&settings.temp_dir),
        }
    }

    /// 确保存储目录存在
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.output_dir).await?;
        fs::create_dir_all(&self.animation_dir).await?;
        fs::create_dir_all(&self.temp_dir).await?;
        Ok(())
    }

    /// 输出目录是否可写
    pub async fn is_writable(&self) -> bool {
        let probe = self.output_dir.join(".healthcheck");
        match fs::write(&probe, b"ok").await {
            Ok(()) => {
                let _ = fs::remove_file(&probe).await;
                true
            }
            Err(_) => false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn animation_dir(&self) -> &Path {
        &self.animation_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// 查找任务对应的动画文件
    ///
    /// 优先使用确定性命名`animation_<id>.mp4`，找不到时
    /// 退化为按任务ID的模式搜索
    pub async fn find_animation_file(&self, task_id: Uuid) -> Option<PathBuf> {
        let expected = self.animation_dir.join(format!("animation_{}.mp4", task_id));
        if fs::metadata(&expected).await.is_ok() {
            return Some(expected);
        }

        let id_fragment = task_id.to_string();
        let mut entries = match fs::read_dir(&self.animation_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read animation dir: {}", e);
                return None;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);

            if name.contains(&id_fragment)
                && extension.as_deref().is_some_and(|e| VIDEO_EXTENSIONS.contains(&e))
            {
                return Some(path);
            }
        }

        warn!("Animation file not found for task: {}", task_id);
        None
    }

    /// 获取存储统计信息
    pub async fn storage_stats(&self) -> StorageStats {
        let (animation_count, animation_size) =
            dir_usage(&self.animation_dir, Some("mp4")).await;
        let (temp_files_count, temp_size) = dir_usage(&self.temp_dir, None).await;

        StorageStats {
            animation_count,
            animation_size_mb: to_mb(animation_size),
            temp_files_count,
            temp_size_mb: to_mb(temp_size),
            total_size_mb: to_mb(animation_size + temp_size),
        }
    }

    /// 清理早于指定天数的动画文件
    ///
    /// # 返回值
    ///
    /// 返回删除的文件数量
    pub async fn cleanup_old_animations(&self, days: u64) -> usize {
        let cutoff = SystemTime::from(Utc::now()) - Duration::from_secs(days * 24 * 60 * 60);
        let mut cleaned = 0;

        let mut entries = match fs::read_dir(&self.animation_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read animation dir during cleanup: {}", e);
                return 0;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("mp4") {
                continue;
            }

            let modified = match fs::metadata(&path).await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(_) => continue,
            };

            if modified < cutoff {
                match fs::remove_file(&path).await {
                    Ok(()) => {
                        info!("Deleted old animation: {}", path.display());
                        cleaned += 1;
                    }
                    Err(e) => warn!("Failed to delete old animation {}: {}", path.display(), e),
                }
            }
        }

        info!("Cleaned up {} old animation files", cleaned);
        cleaned
    }

    /// 清理所有临时文件
    ///
    /// # 返回值
    ///
    /// 返回删除的文件数量
    pub async fn cleanup_temp_files(&self) -> usize {
        let mut cleaned = 0;

        let mut entries = match fs::read_dir(&self.temp_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read temp dir during cleanup: {}", e);
                return 0;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_file = fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => cleaned += 1,
                Err(e) => warn!("Failed to delete temp file {}: {}", path.display(), e),
            }
        }

        info!("Cleaned up {} temporary files", cleaned);
        cleaned
    }
}

/// 统计目录下文件数量和总大小，可按扩展名过滤
async fn dir_usage(dir: &Path, extension: Option<&str>) -> (usize, u64) {
    let mut count = 0;
    let mut size = 0;

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return (0, 0),
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if let Some(wanted) = extension {
            if path.extension().and_then(|e| e.to_str()) != Some(wanted) {
                continue;
            }
        }

        if let Ok(metadata) = fs::metadata(&path).await {
            if metadata.is_file() {
                count += 1;
                size += metadata.len();
            }
        }
    }

    (count, size)
}

fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
