// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::settings::CleanupSettings;
use crate::domain::services::animation_service::AnimationService;
use crate::domain::services::refiner_service::PromptRefiner;
use crate::engines::traits::RenderEngine;
use crate::infrastructure::storage::AnimationStorage;

/// 任务过期清理工作器
///
/// 定期扫描并删除过期的任务记录、动画文件和临时文件
pub struct CleanupWorker<R, E>
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    service: Arc<AnimationService<R, E>>,
    storage: Arc<AnimationStorage>,
    interval: Duration,
    max_age_hours: i64,
}

impl<R, E> CleanupWorker<R, E>
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    pub fn new(
        service: Arc<AnimationService<R, E>>,
        storage: Arc<AnimationStorage>,
        settings: &CleanupSettings,
    ) -> Self {
        Self {
            service,
            storage,
            interval: Duration::from_secs(settings.interval_secs),
            max_age_hours: settings.max_age_hours,
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Task cleanup worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            let (tasks, files, temp) = self.sweep().await;
            if tasks > 0 || files > 0 || temp > 0 {
                info!(
                    "Cleanup sweep removed {} tasks, {} animation files, {} temp files",
                    tasks, files, temp
                );
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn sweep(&self) -> (usize, usize, usize) {
        let tasks = self.service.cleanup_old_tasks(self.max_age_hours).await;
        let days = ((self.max_age_hours / 24).max(1)) as u64;
        let files = self.storage.cleanup_old_animations(days).await;
        let temp = self.storage.cleanup_temp_files().await;
        (tasks, files, temp)
    }
}

#[cfg(test)]
#[path = "cleanup_worker_test.rs"]
mod tests;
