//! 集成测试共用的假实现
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use pcare_bot::error::{AppError, AppResult, BrowserError, StoreError};
use pcare_bot::models::{display_date, parse_date, JobEntry, JobQueue, RunState};
use pcare_bot::services::{
    FormAdapter, JobStore, MemoryJobStore, NumberSource, ProgressEvent, ProgressReporter,
};

pub fn queue(entries: &[(&str, u32)]) -> JobQueue {
    JobQueue::from_entries(
        entries
            .iter()
            .map(|(d, g)| JobEntry::new(parse_date(d).unwrap(), *g)),
    )
    .unwrap()
}

pub async fn store_with(entries: &[(&str, u32)], delay_ms: u64) -> Arc<MemoryJobStore> {
    let store = Arc::new(MemoryJobStore::default());
    store.reset(queue(entries), delay_ms).await.unwrap();
    store
}

// ========== 假页面 ==========

/// 记录调用顺序的假页面
#[derive(Default)]
pub struct FakeForm {
    calls: Mutex<Vec<String>>,
    missing_for: HashSet<String>,
    dialogs: HashMap<String, String>,
    save_hangs: bool,
    search_silent: bool,
    browser_gone: bool,
    current: Mutex<Option<String>>,
    dialog: Mutex<Option<String>>,
    /// 搜索结果字段的内容，清除遮罩不会重置它
    result: Mutex<Option<String>>,
    saved: AtomicBool,
}

impl FakeForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// 该编号的输入框找不到
    pub fn failing_on(mut self, identifier: &str) -> Self {
        self.missing_for.insert(identifier.to_string());
        self
    }

    /// 搜索该编号后弹出对话框
    pub fn with_dialog(mut self, identifier: &str, text: &str) -> Self {
        self.dialogs
            .insert(identifier.to_string(), text.to_string());
        self
    }

    /// 保存后页面永远不确认
    pub fn save_never_confirms(mut self) -> Self {
        self.save_hangs = true;
        self
    }

    /// 搜索后结果一直不返回
    pub fn search_never_answers(mut self) -> Self {
        self.search_silent = true;
        self
    }

    /// 结果字段里残留着上一个条目的内容
    pub fn with_stale_result(self, text: &str) -> Self {
        *self.result.lock().unwrap() = Some(text.to_string());
        self
    }

    /// 浏览器已断开，所有页面操作都失败
    pub fn disconnected(mut self) -> Self {
        self.browser_gone = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// 已保存的编号
    pub fn saved(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("save:").map(str::to_string))
            .collect()
    }

    /// 填写过的日期（按顺序，已去重相邻项）
    pub fn dates(&self) -> Vec<String> {
        let mut dates: Vec<String> = self
            .calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("set_date:").map(str::to_string))
            .collect();
        dates.dedup();
        dates
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn connected(&self) -> AppResult<()> {
        if self.browser_gone {
            return Err(BrowserError::Disconnected {
                source: "websocket closed".into(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl FormAdapter for FakeForm {
    async fn page_ready(&self) -> AppResult<bool> {
        self.connected()?;
        Ok(true)
    }

    async fn clear_overlays(&self) -> AppResult<()> {
        self.connected()?;
        self.record("clear_overlays");
        self.saved.store(false, Ordering::SeqCst);
        *self.dialog.lock().unwrap() = None;
        Ok(())
    }

    async fn set_date(&self, date: NaiveDate) -> AppResult<()> {
        self.record(format!("set_date:{}", display_date(date)));
        Ok(())
    }

    async fn set_identifier(&self, identifier: &str) -> AppResult<()> {
        if self.missing_for.contains(identifier) {
            return Err(AppError::element_not_found("编号输入框"));
        }
        *self.current.lock().unwrap() = Some(identifier.to_string());
        self.record(format!("set_identifier:{}", identifier));
        Ok(())
    }

    async fn search(&self) -> AppResult<()> {
        self.record("search");
        let Some(current) = self.current.lock().unwrap().clone() else {
            return Ok(());
        };
        if let Some(text) = self.dialogs.get(&current) {
            *self.dialog.lock().unwrap() = Some(text.clone());
        } else if !self.search_silent {
            *self.result.lock().unwrap() = Some(format!("peserta {}", current));
        }
        Ok(())
    }

    async fn clear_search_result(&self) -> AppResult<()> {
        self.record("clear_search_result");
        *self.result.lock().unwrap() = None;
        Ok(())
    }

    async fn search_result_ready(&self) -> AppResult<bool> {
        Ok(self.result.lock().unwrap().is_some() && self.dialog.lock().unwrap().is_none())
    }

    async fn save_completed(&self) -> AppResult<bool> {
        Ok(self.saved.load(Ordering::SeqCst) && !self.save_hangs)
    }

    async fn visible_dialog(&self) -> AppResult<Option<String>> {
        Ok(self.dialog.lock().unwrap().clone())
    }

    async fn dismiss_dialog(&self) -> AppResult<bool> {
        let dismissed = self.dialog.lock().unwrap().take().is_some();
        if dismissed {
            self.record("dismiss_dialog");
        }
        Ok(dismissed)
    }

    async fn set_category_options(&self) -> AppResult<()> {
        self.record("set_category_options");
        Ok(())
    }

    async fn save(&self) -> AppResult<()> {
        let current = self.current.lock().unwrap().clone().unwrap_or_default();
        self.record(format!("save:{}", current));
        self.saved.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ========== 假号码源 ==========

/// 先按脚本返回失败，之后返回递增编号 0001, 0002, ...
#[derive(Default)]
pub struct ScriptedNumbers {
    failures: Mutex<VecDeque<AppError>>,
    calls: AtomicUsize,
    issued: AtomicUsize,
}

impl ScriptedNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with_network(self, times: usize) -> Self {
        {
            let mut failures = self.failures.lock().unwrap();
            for _ in 0..times {
                failures.push_back(AppError::network("http://fake/next", "API status 503"));
            }
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NumberSource for ScriptedNumbers {
    async fn fetch(&self) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{:04}", n))
    }
}

// ========== 记录用报告器 ==========

/// 记录所有事件；可选在某个进度时写入暂停标记
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
    pause_at: Option<(u32, Arc<MemoryJobStore>)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pausing_at(done: u32, store: Arc<MemoryJobStore>) -> Self {
        Self {
            events: Mutex::default(),
            pause_at: Some((done, store)),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn emit(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
        if let Some((done, store)) = &self.pause_at {
            if event.done == *done && event.identifier.is_some() {
                futures::executor::block_on(store.set_paused(true)).unwrap();
            }
        }
    }
}

// ========== 会失败的存储 ==========

/// 前 `ok_saves` 次保存成功，之后每次保存都失败
pub struct FlakyStore {
    inner: MemoryJobStore,
    ok_saves: usize,
}

impl FlakyStore {
    pub fn new(state: RunState, ok_saves: usize) -> Self {
        Self {
            inner: MemoryJobStore::new(state),
            ok_saves,
        }
    }

    pub fn snapshot(&self) -> RunState {
        self.inner.snapshot()
    }
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn load(&self) -> AppResult<RunState> {
        self.inner.load().await
    }

    async fn save(&self, state: &RunState) -> AppResult<()> {
        if self.inner.save_count() >= self.ok_saves {
            return Err(StoreError::Write {
                path: "state.json".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            }
            .into());
        }
        self.inner.save(state).await
    }

    async fn set_paused(&self, paused: bool) -> AppResult<()> {
        self.inner.set_paused(paused).await
    }
}
