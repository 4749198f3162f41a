//! 任务队列模型
//!
//! `JobEntry` 是一个 (日期, 目标数量) 工作单元；`JobQueue` 按插入顺序处理，日期唯一。

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::QueueError;

/// 页面与日志中使用的日期格式
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// 解析操作员输入的日期
///
/// 支持 `YYYY-MM-DD` 和 `DD-MM-YYYY` 两种写法
pub fn parse_date(input: &str) -> Result<NaiveDate, QueueError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, DISPLAY_DATE_FORMAT))
        .map_err(|_| QueueError::InvalidDate {
            input: input.to_string(),
        })
}

/// 以 DD-MM-YYYY 格式显示日期
pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// 单个日期的工作单元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    pub date: NaiveDate,
    /// 该日期需要提交的数量
    pub goal: u32,
}

impl JobEntry {
    pub fn new(date: NaiveDate, goal: u32) -> Self {
        Self { date, goal }
    }
}

impl fmt::Display for JobEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (目标: {})", display_date(self.date), self.goal)
    }
}

/// 按插入顺序处理的任务队列
///
/// 反序列化同样经过重复日期检查，手工改坏的状态文件会被拒绝
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<JobEntry>", into = "Vec<JobEntry>")]
pub struct JobQueue {
    entries: Vec<JobEntry>,
}

impl TryFrom<Vec<JobEntry>> for JobQueue {
    type Error = QueueError;

    fn try_from(entries: Vec<JobEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<JobQueue> for Vec<JobEntry> {
    fn from(queue: JobQueue) -> Self {
        queue.entries
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从条目列表构建队列，重复日期会被拒绝
    pub fn from_entries(entries: impl IntoIterator<Item = JobEntry>) -> Result<Self, QueueError> {
        let mut queue = Self::new();
        for entry in entries {
            queue.push(entry)?;
        }
        Ok(queue)
    }

    /// 追加到队尾
    pub fn push(&mut self, entry: JobEntry) -> Result<(), QueueError> {
        if self.contains(entry.date) {
            return Err(QueueError::DuplicateDate { date: entry.date });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn head(&self) -> Option<&JobEntry> {
        self.entries.first()
    }

    pub fn pop_head(&mut self) -> Option<JobEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    /// 按日期移除条目
    pub fn remove(&mut self, date: NaiveDate) -> Result<JobEntry, QueueError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.date == date)
            .ok_or(QueueError::NotQueued { date })?;
        Ok(self.entries.remove(position))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.iter().any(|e| e.date == date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobEntry> {
        self.entries.iter()
    }

    /// 队列中所有日期的目标总数
    pub fn total_goal(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.goal)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn parses_both_date_formats() {
        assert_eq!(date("2024-01-10"), date("10-01-2024"));
        assert_eq!(display_date(date("2024-01-10")), "10-01-2024");
        assert!(matches!(
            parse_date("2024/01/10"),
            Err(QueueError::InvalidDate { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let mut queue = JobQueue::new();
        queue.push(JobEntry::new(date("2024-01-10"), 2)).unwrap();
        let err = queue.push(JobEntry::new(date("2024-01-10"), 5)).unwrap_err();
        assert!(matches!(err, QueueError::DuplicateDate { .. }));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head().unwrap().goal, 2);
    }

    #[test]
    fn pops_in_insertion_order() {
        let mut queue = JobQueue::from_entries([
            JobEntry::new(date("2024-01-11"), 1),
            JobEntry::new(date("2024-01-10"), 2),
        ])
        .unwrap();
        assert_eq!(queue.total_goal(), 3);
        assert_eq!(queue.pop_head().unwrap().date, date("2024-01-11"));
        assert_eq!(queue.pop_head().unwrap().date, date("2024-01-10"));
        assert!(queue.pop_head().is_none());
    }

    #[test]
    fn removes_by_date() {
        let mut queue = JobQueue::from_entries([
            JobEntry::new(date("2024-01-10"), 2),
            JobEntry::new(date("2024-01-11"), 1),
        ])
        .unwrap();
        assert_eq!(queue.remove(date("2024-01-11")).unwrap().goal, 1);
        assert!(matches!(
            queue.remove(date("2024-01-12")),
            Err(QueueError::NotQueued { .. })
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn serializes_as_plain_array() {
        let queue = JobQueue::from_entries([JobEntry::new(date("2024-01-10"), 2)]).unwrap();
        let json = serde_json::to_value(&queue).unwrap();
        assert_eq!(json, serde_json::json!([{ "date": "2024-01-10", "goal": 2 }]));
    }

    #[test]
    fn deserializing_rejects_duplicate_dates() {
        let json = r#"[{ "date": "2024-01-10", "goal": 2 }, { "date": "2024-01-10", "goal": 1 }]"#;
        let err = serde_json::from_str::<JobQueue>(json).unwrap_err();
        assert!(err.to_string().contains("2024-01-10"));

        let ok: JobQueue = serde_json::from_str(r#"[{ "date": "2024-01-10", "goal": 2 }]"#).unwrap();
        assert_eq!(ok.len(), 1);
    }
}
