//! 运行状态模型
//!
//! `RunState` 是唯一被持久化的可变状态：队列（队首即当前任务）、当前日期的进度计数、
//! 暂停标记和节奏延迟。编排器每轮开始时读取、结束时写回。

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::job::{JobEntry, JobQueue};

/// 默认的步骤间延迟（毫秒）
pub const DEFAULT_DELAY_MS: u64 = 1200;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Error,
    Completed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Idle => "Idle",
            RunStatus::Running => "Running",
            RunStatus::Paused => "Paused",
            RunStatus::Error => "Error",
            RunStatus::Completed => "Completed",
        };
        f.write_str(name)
    }
}

/// 当前日期的进度
///
/// 不变式：`failed <= done <= total`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    pub done: u32,
    pub total: u32,
    pub status: RunStatus,
    /// 已计入 `done` 但出错的条目数
    #[serde(default)]
    pub failed: u32,
}

impl ProgressState {
    /// 对齐到某个任务的目标数量
    pub fn focus(&mut self, goal: u32) {
        self.total = goal;
        self.done = self.done.min(goal);
        self.failed = self.failed.min(self.done);
    }

    /// 切换到新的任务，计数归零
    pub fn restart(&mut self, goal: u32) {
        self.done = 0;
        self.failed = 0;
        self.total = goal;
    }

    /// 记录一次尝试；已达目标时不再增加
    pub fn record_attempt(&mut self, failed: bool) -> bool {
        if self.done >= self.total {
            return false;
        }
        self.done += 1;
        if failed {
            self.failed += 1;
        }
        true
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.done)
    }

    pub fn is_satisfied(&self) -> bool {
        self.done >= self.total
    }
}

/// 持久化的运行状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub queue: JobQueue,
    pub progress: ProgressState,
    /// 暂停标记由 `JobStore::set_paused` 单独存储，`save` 不会改写它
    #[serde(skip)]
    pub paused: bool,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// 本次运行所有日期累计尝试的条目数
    #[serde(default)]
    pub attempted: u64,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Local>>,
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            queue: JobQueue::new(),
            progress: ProgressState::default(),
            paused: false,
            delay_ms: DEFAULT_DELAY_MS,
            attempted: 0,
            last_error: None,
            updated_at: None,
        }
    }
}

impl RunState {
    /// 用新队列创建运行状态
    pub fn fresh(queue: JobQueue, delay_ms: u64) -> Self {
        let total = queue.head().map(|j| j.goal).unwrap_or(0);
        Self {
            queue,
            progress: ProgressState {
                total,
                ..ProgressState::default()
            },
            delay_ms,
            ..Self::default()
        }
    }

    pub fn current_job(&self) -> Option<&JobEntry> {
        self.queue.head()
    }

    /// 将进度对齐到当前队首任务，返回该任务
    pub fn focus_head(&mut self) -> Option<JobEntry> {
        let job = self.queue.head().copied()?;
        self.progress.focus(job.goal);
        Some(job)
    }

    /// 弹出已完成的队首日期，计数切换到下一个日期
    pub fn finish_head(&mut self) -> Option<JobEntry> {
        let finished = self.queue.pop_head()?;
        let next_goal = self.queue.head().map(|j| j.goal).unwrap_or(0);
        self.progress.restart(next_goal);
        Some(finished)
    }

    /// 记录一个已尝试的条目
    pub fn record_item(&mut self, failed: bool) {
        if self.progress.record_attempt(failed) {
            self.attempted += 1;
        }
    }

    pub fn set_status(&mut self, status: RunStatus) {
        self.progress.status = status;
        if status != RunStatus::Error {
            self.last_error = None;
        }
    }

    pub fn set_error(&mut self, reason: impl Into<String>) {
        self.progress.status = RunStatus::Error;
        self.last_error = Some(reason.into());
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Local::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::parse_date;

    fn queue(entries: &[(&str, u32)]) -> JobQueue {
        JobQueue::from_entries(
            entries
                .iter()
                .map(|(d, g)| JobEntry::new(parse_date(d).unwrap(), *g)),
        )
        .unwrap()
    }

    #[test]
    fn fresh_state_targets_first_goal() {
        let state = RunState::fresh(queue(&[("2024-01-10", 2), ("2024-01-11", 1)]), 500);
        assert_eq!(state.progress.total, 2);
        assert_eq!(state.progress.done, 0);
        assert_eq!(state.progress.status, RunStatus::Idle);
        assert_eq!(state.delay_ms, 500);
    }

    #[test]
    fn done_never_exceeds_total() {
        let mut state = RunState::fresh(queue(&[("2024-01-10", 2)]), 0);
        for _ in 0..5 {
            state.record_item(false);
        }
        assert_eq!(state.progress.done, 2);
        assert_eq!(state.attempted, 2);
        assert!(state.progress.is_satisfied());
    }

    #[test]
    fn focus_clamps_stale_counters() {
        let mut state = RunState::fresh(queue(&[("2024-01-10", 3)]), 0);
        state.progress.done = 7;
        state.progress.failed = 7;
        let job = state.focus_head().unwrap();
        assert_eq!(job.goal, 3);
        assert_eq!(state.progress.done, 3);
        assert_eq!(state.progress.failed, 3);
    }

    #[test]
    fn finishing_head_resets_counter_for_next_date() {
        let mut state = RunState::fresh(queue(&[("2024-01-10", 1), ("2024-01-11", 4)]), 0);
        state.record_item(true);
        let finished = state.finish_head().unwrap();
        assert_eq!(finished.goal, 1);
        assert_eq!(state.progress.done, 0);
        assert_eq!(state.progress.failed, 0);
        assert_eq!(state.progress.total, 4);
        assert_eq!(state.attempted, 1);
    }

    #[test]
    fn paused_flag_is_not_serialized() {
        let mut state = RunState::fresh(queue(&[("2024-01-10", 1)]), 0);
        state.paused = true;
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("paused").is_none());
        assert_eq!(json["progress"]["status"], "idle");
        let back: RunState = serde_json::from_value(json).unwrap();
        assert!(!back.paused);
    }

    #[test]
    fn leaving_error_clears_reason() {
        let mut state = RunState::default();
        state.set_error("API status 500");
        assert_eq!(state.last_error.as_deref(), Some("API status 500"));
        state.set_status(RunStatus::Running);
        assert!(state.last_error.is_none());
    }
}
