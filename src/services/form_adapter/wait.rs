//! 有界等待原语
//!
//! 以固定间隔轮询，直到条件满足或超时；任何等待都不会无限阻塞。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use super::dialogs::{self, DialogKind};
use super::FormAdapter;
use crate::error::{AppResult, FormError};

/// 页面等待参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    pub poll_interval: Duration,
    pub page_ready_timeout: Duration,
    pub element_timeout: Duration,
    pub search_timeout: Duration,
    pub save_timeout: Duration,
    /// 搜索后给弹窗出现留出的时间
    pub dialog_settle: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            page_ready_timeout: Duration::from_secs(15),
            element_timeout: Duration::from_secs(5),
            search_timeout: Duration::from_secs(10),
            save_timeout: Duration::from_secs(15),
            dialog_settle: Duration::from_millis(400),
        }
    }
}

/// 等待的目标条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeTarget {
    /// 搜索结果已填充
    SearchResult,
    /// 保存已完成
    SaveCompletion,
}

/// 一次等待的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 目标条件满足
    Success,
    /// 出现已知弹窗，已关闭
    Dialog { kind: DialogKind, text: String },
    /// 出现未识别的弹窗，保留在页面上
    Blocked { text: String },
    /// 超时，结果未知
    Unknown,
}

/// 轮询直到 `probe` 返回 `Some` 或超时
///
/// 至少检查一次；超时返回 `Ok(None)`，`probe` 的错误直接向上传播
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> AppResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// 等待目标条件或阻塞弹窗
pub async fn wait_for_outcome<A>(
    adapter: &A,
    target: OutcomeTarget,
    settings: &WaitSettings,
) -> AppResult<WaitOutcome>
where
    A: FormAdapter + ?Sized,
{
    let timeout = match target {
        OutcomeTarget::SearchResult => settings.search_timeout,
        OutcomeTarget::SaveCompletion => settings.save_timeout,
    };

    let outcome = poll_until(settings.poll_interval, timeout, || {
        probe_outcome(adapter, target)
    })
    .await?;

    Ok(outcome.unwrap_or(WaitOutcome::Unknown))
}

/// 单次检查：目标条件、已知弹窗或未知弹窗
async fn probe_outcome<A>(adapter: &A, target: OutcomeTarget) -> AppResult<Option<WaitOutcome>>
where
    A: FormAdapter + ?Sized,
{
    let reached = match target {
        OutcomeTarget::SearchResult => adapter.search_result_ready().await?,
        OutcomeTarget::SaveCompletion => adapter.save_completed().await?,
    };
    if reached {
        return Ok(Some(WaitOutcome::Success));
    }

    let Some(text) = adapter.visible_dialog().await? else {
        return Ok(None);
    };
    match dialogs::classify(&text) {
        Some(kind) => {
            debug!("关闭已知弹窗 ({}): {}", kind, text);
            adapter.dismiss_dialog().await?;
            Ok(Some(WaitOutcome::Dialog { kind, text }))
        }
        None => Ok(Some(WaitOutcome::Blocked { text })),
    }
}

async fn probe_ready<A>(adapter: &A) -> AppResult<Option<()>>
where
    A: FormAdapter + ?Sized,
{
    Ok(adapter.page_ready().await?.then_some(()))
}

/// 等待页面加载完成，超时返回 `Timeout`
pub async fn wait_until_ready<A>(adapter: &A, settings: &WaitSettings) -> AppResult<()>
where
    A: FormAdapter + ?Sized,
{
    let ready = poll_until(settings.poll_interval, settings.page_ready_timeout, || {
        probe_ready(adapter)
    })
    .await?;

    ready.ok_or_else(|| {
        FormError::Timeout {
            what: "页面就绪".to_string(),
            waited_ms: settings.page_ready_timeout.as_millis() as u64,
        }
        .into()
    })
}
