//! 控制端 - 编排层
//!
//! 队列的增删、暂停请求、状态查询。运行中只允许写暂停标记，
//! 其他修改应在主循环停止后进行。

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{AppResult, QueueError};
use crate::models::{display_date, JobEntry, JobQueue, RunState};
use crate::services::JobStore;

/// 控制端
pub struct Controller<S> {
    store: Arc<S>,
}

impl<S: JobStore> Controller<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 用新队列重置运行状态
    pub async fn begin(&self, queue: JobQueue, delay_ms: u64) -> AppResult<RunState> {
        let state = self.store.reset(queue, delay_ms).await?;
        info!(
            "📋 新队列: {} 个日期, 共 {} 条目标",
            state.queue.len(),
            state.queue.total_goal()
        );
        Ok(state)
    }

    pub async fn pause(&self) -> AppResult<()> {
        self.store.set_paused(true).await?;
        info!("⏸️ 已写入暂停标记");
        Ok(())
    }

    /// 追加一个日期
    pub async fn enqueue(&self, entry: JobEntry) -> AppResult<RunState> {
        let state = self.store.enqueue(entry).await?;
        info!("➕ 已添加日期 {}", entry);
        Ok(state)
    }

    /// 按日期移除；移除的是队首时计数切换到新的队首
    pub async fn remove(&self, date: NaiveDate) -> AppResult<JobEntry> {
        let mut state = self.store.load().await?;
        let was_head = state.current_job().map(|job| job.date) == Some(date);
        let removed = state.queue.remove(date)?;
        if was_head {
            let next_goal = state.current_job().map(|job| job.goal).unwrap_or(0);
            state.progress.restart(next_goal);
        }
        state.touch();
        self.store.save(&state).await?;
        info!("➖ 已移除日期 {}", display_date(date));
        Ok(removed)
    }

    /// 跳过当前日期并清除暂停标记，下一次运行从新的队首开始
    pub async fn skip_date(&self) -> AppResult<JobEntry> {
        let skipped = self.store.dequeue_head().await?.ok_or(QueueError::Empty)?;
        self.store.set_paused(false).await?;
        info!("⏭️ 跳过日期 {}", skipped);
        Ok(skipped)
    }

    pub async fn status(&self) -> AppResult<RunState> {
        self.store.load().await
    }
}
