//! 任务存储服务 - 业务能力层
//!
//! 负责运行状态的读取与持久化。暂停标记与状态分开存储：
//! 编排器每轮结束时 `save` 整个状态，但不会覆盖控制端写入的暂停标记。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{AppResult, QueueError, StoreError};
use crate::models::{JobEntry, JobQueue, RunState};

/// 运行状态存储
#[async_trait]
pub trait JobStore: Send + Sync {
    /// 读取运行状态（包括暂停标记）
    async fn load(&self) -> AppResult<RunState>;

    /// 原子地写入运行状态，不改变暂停标记
    async fn save(&self, state: &RunState) -> AppResult<()>;

    /// 设置暂停标记
    async fn set_paused(&self, paused: bool) -> AppResult<()>;

    /// 追加日期到队尾，重复日期会被拒绝
    async fn enqueue(&self, entry: JobEntry) -> AppResult<RunState> {
        let mut state = self.load().await?;
        let was_empty = state.queue.is_empty();
        state.queue.push(entry)?;
        if was_empty {
            state.progress.restart(entry.goal);
        }
        state.touch();
        self.save(&state).await?;
        Ok(state)
    }

    /// 弹出队首日期
    async fn dequeue_head(&self) -> AppResult<Option<JobEntry>> {
        let mut state = self.load().await?;
        let head = state.finish_head();
        if head.is_some() {
            state.touch();
            self.save(&state).await?;
        }
        Ok(head)
    }

    /// 用新队列重置运行状态并清除暂停标记
    async fn reset(&self, queue: JobQueue, delay_ms: u64) -> AppResult<RunState> {
        if queue.is_empty() {
            return Err(QueueError::Empty.into());
        }
        let mut state = RunState::fresh(queue, delay_ms);
        state.touch();
        self.save(&state).await?;
        self.set_paused(false).await?;
        Ok(state)
    }
}

/// 基于 JSON 文件的存储
///
/// 状态写入 `<path>`，暂停标记是同目录下的 `<path>.paused` 文件
pub struct FileJobStore {
    path: PathBuf,
    pause_path: PathBuf,
}

impl FileJobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut pause_name = path.as_os_str().to_owned();
        pause_name.push(".paused");
        Self {
            path,
            pause_path: PathBuf::from(pause_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn load(&self) -> AppResult<RunState> {
        let mut state = match fs::read(&self.path).await {
            Ok(bytes) => {
                serde_json::from_slice::<RunState>(&bytes).map_err(|source| StoreError::Corrupt {
                    path: self.display(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("状态文件不存在，使用空状态: {}", self.display());
                RunState::default()
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.display(),
                    source,
                }
                .into())
            }
        };

        state.paused = fs::try_exists(&self.pause_path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.pause_path.display().to_string(),
                source,
            })?;
        Ok(state)
    }

    async fn save(&self, state: &RunState) -> AppResult<()> {
        let payload = serde_json::to_vec_pretty(state).map_err(|source| StoreError::Corrupt {
            path: self.display(),
            source,
        })?;

        // 先写临时文件再 rename，读者看不到半截内容
        let temp = self.temp_path();
        let write_err = |source| StoreError::Write {
            path: self.display(),
            source,
        };
        fs::write(&temp, &payload).await.map_err(write_err)?;
        fs::rename(&temp, &self.path).await.map_err(write_err)?;

        debug!(
            "💾 状态已保存: {}/{} ({})",
            state.progress.done, state.progress.total, state.progress.status
        );
        Ok(())
    }

    async fn set_paused(&self, paused: bool) -> AppResult<()> {
        let result = if paused {
            fs::write(&self.pause_path, b"paused").await
        } else {
            match fs::remove_file(&self.pause_path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        };
        result.map_err(|source| StoreError::Write {
            path: self.pause_path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

/// 内存存储，用于测试和一次性运行
#[derive(Default)]
pub struct MemoryJobStore {
    state: Mutex<RunState>,
    paused: AtomicBool,
    saves: std::sync::atomic::AtomicUsize,
}

impl MemoryJobStore {
    pub fn new(state: RunState) -> Self {
        Self {
            paused: AtomicBool::new(state.paused),
            state: Mutex::new(state),
            saves: Default::default(),
        }
    }

    /// 已执行的 save 次数
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// 当前状态快照
    pub fn snapshot(&self) -> RunState {
        let mut state = match self.state.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        state.paused = self.paused.load(Ordering::SeqCst);
        state
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn load(&self) -> AppResult<RunState> {
        Ok(self.snapshot())
    }

    async fn save(&self, state: &RunState) -> AppResult<()> {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = state.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_paused(&self, paused: bool) -> AppResult<()> {
        self.paused.store(paused, Ordering::SeqCst);
        Ok(())
    }
}
