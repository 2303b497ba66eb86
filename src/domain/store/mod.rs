// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::domain::models::task::AnimationTask;

/// 进程内任务存储
///
/// 系统中唯一的共享可变状态：从任务ID到任务记录的并发映射。
/// 每条记录至多有一个写入者（任务自己的后台例程），读取者
/// 获取完整克隆的快照，不会观察到部分更新。
///
/// 对已被清理删除的键的更新会被忽略（返回false），
/// 因此清理扫描与仍在运行的后台例程之间不存在悬挂写入。
pub struct TaskStore {
    tasks: DashMap<Uuid, AnimationTask>,
    /// 序列化清理扫描：同一时刻至多一个扫描在执行
    cleanup_lock: Mutex<()>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
            cleanup_lock: Mutex::new(()),
        }
    }

    /// 插入新任务记录
    pub fn insert(&self, task: AnimationTask) {
        self.tasks.insert(task.id, task);
    }

    /// 获取任务记录的一致性快照
    pub fn get(&self, id: &Uuid) -> Option<AnimationTask> {
        self.tasks.get(id).map(|entry| entry.value().clone())
    }

    /// 在分片锁内对任务记录应用一次更新
    ///
    /// # 返回值
    ///
    /// 记录存在并完成更新时返回true；记录已被删除时返回false，
    /// 更新被静默忽略
    pub fn update<F>(&self, id: &Uuid, f: F) -> bool
    where
        F: FnOnce(&mut AnimationTask),
    {
        match self.tasks.get_mut(id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// 获取所有任务的快照
    pub fn list(&self) -> Vec<AnimationTask> {
        self.tasks
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// 当前任务数量
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 删除创建时间早于max_age的所有任务
    ///
    /// 不区分任务状态，处理中的任务同样会被删除；其后台例程
    /// 随后的写入将落在不存在的键上而被忽略。
    ///
    /// # 返回值
    ///
    /// 返回删除的任务数量
    pub async fn remove_older_than(&self, max_age: Duration) -> usize {
        let _guard = self.cleanup_lock.lock().await;
        let cutoff = Utc::now() - max_age;

        let expired: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|entry| entry.created_at < cutoff)
            .map(|entry| entry.id)
            .collect();

        let mut removed = 0;
        for id in expired {
            if self.tasks.remove(&id).is_some() {
                info!("Cleaned up old task: {}", id);
                removed += 1;
            }
        }

        removed
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
