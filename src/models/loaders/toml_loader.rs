use crate::error::{AppResult, QueueError};
use crate::models::job::{parse_date, JobEntry, JobQueue};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 队列文件内容
///
/// ```toml
/// delay_ms = 1200
///
/// [[jobs]]
/// date = "2024-01-10"
/// goal = 2
/// ```
#[derive(Debug, Deserialize)]
struct QueueFile {
    delay_ms: Option<u64>,
    #[serde(default)]
    jobs: Vec<QueueFileJob>,
}

#[derive(Debug, Deserialize)]
struct QueueFileJob {
    date: String,
    goal: u32,
}

/// 从 TOML 文件加载的队列
#[derive(Debug)]
pub struct LoadedQueue {
    pub queue: JobQueue,
    pub delay_ms: Option<u64>,
}

/// 从 TOML 文件加载任务队列
pub async fn load_queue_file(path: &Path) -> AppResult<LoadedQueue> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| QueueError::InvalidFile {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

    let loaded = parse_queue_toml(&content).map_err(|e| match e {
        QueueError::InvalidFile { reason, .. } => QueueError::InvalidFile {
            path: shown.clone(),
            reason,
        },
        other => other,
    })?;

    tracing::info!("✓ 已加载队列文件 {}，共 {} 个日期", shown, loaded.queue.len());
    Ok(loaded)
}

/// 解析队列 TOML 文本
pub fn parse_queue_toml(content: &str) -> Result<LoadedQueue, QueueError> {
    let file: QueueFile = toml::from_str(content).map_err(|e| QueueError::InvalidFile {
        path: String::new(),
        reason: e.to_string(),
    })?;

    let mut queue = JobQueue::new();
    for job in file.jobs {
        queue.push(JobEntry::new(parse_date(&job.date)?, job.goal))?;
    }

    Ok(LoadedQueue {
        queue,
        delay_ms: file.delay_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jobs_in_order() {
        let loaded = parse_queue_toml(
            r#"
            delay_ms = 800

            [[jobs]]
            date = "2024-01-10"
            goal = 2

            [[jobs]]
            date = "11-01-2024"
            goal = 1
            "#,
        )
        .unwrap();

        assert_eq!(loaded.delay_ms, Some(800));
        let goals: Vec<u32> = loaded.queue.iter().map(|j| j.goal).collect();
        assert_eq!(goals, vec![2, 1]);
        assert_eq!(
            loaded.queue.head().unwrap().date,
            parse_date("2024-01-10").unwrap()
        );
    }

    #[test]
    fn rejects_duplicate_dates_in_file() {
        let err = parse_queue_toml(
            r#"
            [[jobs]]
            date = "2024-01-10"
            goal = 2

            [[jobs]]
            date = "10-01-2024"
            goal = 3
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, QueueError::DuplicateDate { .. }));
    }

    #[tokio::test]
    async fn loads_queue_file_and_names_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.toml");
        std::fs::write(&path, "[[jobs]]\ndate = \"2024-01-10\"\ngoal = 4\n").unwrap();

        let loaded = load_queue_file(&path).await.unwrap();
        assert_eq!(loaded.queue.total_goal(), 4);
        assert_eq!(loaded.delay_ms, None);

        let missing = dir.path().join("missing.toml");
        let err = load_queue_file(&missing).await.unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn rejects_bad_dates() {
        let err = parse_queue_toml("[[jobs]]\ndate = \"tomorrow\"\ngoal = 1\n").unwrap_err();
        assert!(matches!(err, QueueError::InvalidDate { .. }));
    }
}
