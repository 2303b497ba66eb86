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

use dashmap::DashMap;
use futures::FutureExt;
use metrics::counter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::dto::animation_request::AnimationRequestDto;
use crate::application::dto::animation_response::{
    AnimationResponseDto, AnimationStatusDto, RefinedPromptDto,
};
use crate::domain::models::task::AnimationTask;
use crate::domain::services::refiner_service::PromptRefiner;
use crate::domain::store::TaskStore;
use crate::engines::traits::{RenderEngine, RenderRequest};

/// 动画编排服务
///
/// 创建任务后为每个任务启动一个独立的后台处理例程，
/// 按顺序调用细化器和渲染引擎，并在每个阶段更新任务存储。
/// 后台例程是其任务记录的唯一写入者；状态查询只读快照。
///
/// 每个外部调用恰好尝试一次，不做重试。后台例程保证
/// 任何失败路径都会落到终态，轮询客户端最终总能观察到
/// completed或failed。
pub struct AnimationService<R, E>
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    store: Arc<TaskStore>,
    refiner: Arc<R>,
    engine: Arc<E>,
    /// 每个任务的后台例程句柄，用于关停时中止未完成的任务
    handles: Arc<DashMap<Uuid, JoinHandle<()>>>,
}

impl<R, E> AnimationService<R, E>
where
    R: PromptRefiner + 'static,
    E: RenderEngine + 'static,
{
    pub fn new(store: Arc<TaskStore>, refiner: Arc<R>, engine: Arc<E>) -> Self {
        info!("Initialized Animation Service");
        Self {
            store,
            refiner,
            engine,
            handles: Arc::new(DashMap::new()),
        }
    }

    /// 创建动画生成任务
    ///
    /// 生成新的任务记录（status=pending, progress=0），
    /// 启动后台处理例程后立即返回，不等待处理完成
    ///
    /// # 返回值
    ///
    /// 返回包含任务ID的响应，客户端用它轮询状态
    pub fn create_animation(&self, request: AnimationRequestDto) -> AnimationResponseDto {
        let task = AnimationTask::new(request);
        let id = task.id;
        let response = AnimationResponseDto::from_task(&task);

        info!(
            "Created animation task {} with prompt: {:.100}...",
            id, task.request.prompt
        );

        self.store.insert(task);
        counter!("animagen_tasks_created_total").increment(1);

        let store = Arc::clone(&self.store);
        let refiner = Arc::clone(&self.refiner);
        let engine = Arc::clone(&self.engine);
        let handles = Arc::clone(&self.handles);

        let handle = tokio::spawn(async move {
            Self::process_animation(store, refiner, engine, id).await;
            handles.remove(&id);
        });
        self.handles.insert(id, handle);
        // 任务可能在句柄登记前就已结束，补一次清理
        if self
            .handles
            .get(&id)
            .map(|handle| handle.is_finished())
            .unwrap_or(false)
        {
            self.handles.remove(&id);
        }

        response
    }

    /// 后台处理例程，每个任务恰好运行一次
    ///
    /// 捕获处理流程中的panic，保证任务总能到达终态
    async fn process_animation(
        store: Arc<TaskStore>,
        refiner: Arc<R>,
        engine: Arc<E>,
        id: Uuid,
    ) {
        info!("Starting processing for task {}", id);

        let pipeline = Self::run_pipeline(&store, &refiner, &engine, id);
        if AssertUnwindSafe(pipeline).catch_unwind().await.is_err() {
            error!("Unexpected panic while processing task {}", id);
            Self::fail_task(
                &store,
                id,
                "Processing failed due to unexpected error",
                "Unexpected error: background routine panicked".to_string(),
            );
        }
    }

    async fn run_pipeline(store: &TaskStore, refiner: &R, engine: &E, id: Uuid) {
        // 请求参数在创建时已快照；记录不存在说明已被清理
        let request = match store.get(&id) {
            Some(task) => task.request,
            None => return,
        };

        // Step 1: refine prompt
        store.update(&id, |task| {
            let _ = task.advance(10, "Refining prompt with AI...");
        });

        let refined = match refiner
            .refine(&request.prompt, request.style, request.duration)
            .await
        {
            Ok(refined) => refined,
            Err(e) => {
                error!("Prompt refinement failed for task {}: {}", id, e);
                Self::fail_task(store, id, "Prompt refinement failed", e.to_string());
                return;
            }
        };
        info!("Prompt refined for task {}", id);

        // Step 2: render animation
        let manim_code = refined.manim_code.clone();
        store.update(&id, |task| {
            task.attach_refinement(refined.clone());
            let _ = task.advance(50, "Generating animation...");
        });

        let render_request = RenderRequest {
            manim_code,
            task_id: id,
            quality: request.quality,
            background_color: request.background_color.clone(),
        };

        if let Err(e) = engine.render(render_request).await {
            error!("Animation generation failed for task {}: {}", id, e);
            Self::fail_task(store, id, "Animation generation failed", e.to_string());
            return;
        }

        // Step 3: finalize
        store.update(&id, |task| {
            let _ = task.advance(90, "Finalizing animation...");
        });

        let file_url = format!("/api/animations/download/{}", id);
        let completed = store.update(&id, |task| {
            if task.complete(file_url.clone()).is_ok() {
                counter!("animagen_tasks_completed_total").increment(1);
            }
        });

        if completed {
            info!("Animation generation completed for task {}", id);
        } else {
            warn!("Task {} was removed before completion could be recorded", id);
        }
    }

    /// 把失败吸收到任务记录中
    ///
    /// 记录已删除或已处于终态时写入被忽略
    fn fail_task(store: &TaskStore, id: Uuid, message: &str, error: String) {
        store.update(&id, |task| {
            if task.fail(message, error.clone()).is_ok() {
                counter!("animagen_tasks_failed_total").increment(1);
            }
        });
    }

    /// 查询任务状态
    ///
    /// 纯读操作，返回记录快照的投影；任务不存在时返回None
    pub fn get_animation_status(&self, id: &Uuid) -> Option<AnimationStatusDto> {
        self.store
            .get(id)
            .map(|task| AnimationStatusDto::from_task(&task))
    }

    /// 查询细化结果
    ///
    /// 只有细化步骤完成后才有结果；任务存在但尚未完成
    /// 细化时同样返回None
    pub fn get_refined_prompt(&self, id: &Uuid) -> Option<RefinedPromptDto> {
        self.store
            .get(id)?
            .refinement
            .as_ref()
            .map(RefinedPromptDto::from_refinement)
    }

    /// 获取所有任务的快照
    pub fn list_tasks(&self) -> Vec<AnimationTask> {
        self.store.list()
    }

    /// 清理早于指定小时数的任务
    ///
    /// 不区分任务状态；处理中任务被删除后，其后台例程的
    /// 后续写入会被存储忽略
    ///
    /// # 返回值
    ///
    /// 返回删除的任务数量
    pub async fn cleanup_old_tasks(&self, hours: i64) -> usize {
        self.store
            .remove_older_than(chrono::Duration::hours(hours))
            .await
    }

    /// 中止所有仍在运行的后台例程
    pub fn shutdown(&self) {
        let active = self.handles.len();
        for entry in self.handles.iter() {
            entry.value().abort();
        }
        info!(
            "Animation service shut down, {} background jobs aborted",
            active
        );
    }
}

#[cfg(test)]
#[path = "animation_service_test.rs"]
mod tests;
