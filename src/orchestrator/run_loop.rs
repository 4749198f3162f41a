//! 主循环 - 编排层
//!
//! ## 职责
//!
//! 按队列顺序消费日期：每个条目取一个编号、走一遍提交流程、写回进度。
//! 每轮开始时读取状态，结束时先保存再推送，中途被打断也不会丢失或重复计数。
//!
//! ## 状态流转
//!
//! ```text
//! Idle → Running → { Paused, Completed, Error }
//! Paused → Running        (resume)
//! Error  → Running        (退避后重试，或计数后继续)
//! ```
//!
//! 暂停只在每轮开始时检查，不会打断正在进行的条目。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{display_date, JobEntry, RunState, RunStatus, DEFAULT_DELAY_MS};
use crate::orchestrator::policy::FailurePolicy;
use crate::services::form_adapter::{FormAdapter, WaitSettings};
use crate::services::{JobStore, NumberSource, ProgressEvent, ProgressReporter};
use crate::workflow::{ItemCtx, ItemOutcome, SubmitFlow};

/// 主循环参数
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    /// 号码获取失败后的等待时间
    pub fetch_backoff: Duration,
    pub wait: WaitSettings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            fetch_backoff: Duration::from_millis(DEFAULT_DELAY_MS),
            wait: WaitSettings::default(),
        }
    }
}

/// 一次运行的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 观察到暂停标记
    Paused,
    /// 队列已清空
    Completed,
    /// 已有主循环在运行，本次调用什么也没做
    AlreadyRunning,
}

/// 运行标记的守卫，离开作用域时清除标记
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 编排器
///
/// - 唯一会在运行中修改 `RunState` 的地方
/// - 同一时间只允许一个主循环
/// - 只依赖能力 trait，不认识具体页面或存储
pub struct Orchestrator<S, N, F, R> {
    store: Arc<S>,
    numbers: N,
    form: F,
    reporter: R,
    flow: SubmitFlow,
    fetch_backoff: Duration,
    running: AtomicBool,
}

impl<S, N, F, R> Orchestrator<S, N, F, R>
where
    S: JobStore,
    N: NumberSource,
    F: FormAdapter,
    R: ProgressReporter,
{
    pub fn new(store: Arc<S>, numbers: N, form: F, reporter: R, settings: RunSettings) -> Self {
        Self {
            store,
            numbers,
            form,
            reporter,
            flow: SubmitFlow::new(settings.wait),
            fetch_backoff: settings.fetch_backoff,
            running: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn number_source(&self) -> &N {
        &self.numbers
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 从当前位置开始或继续消费队列
    pub async fn start(&self) -> AppResult<RunOutcome> {
        let Some(_guard) = self.try_begin() else {
            debug!("主循环已在运行，忽略 start");
            return Ok(RunOutcome::AlreadyRunning);
        };
        self.run_loop().await
    }

    /// 清除暂停标记后继续
    pub async fn resume(&self) -> AppResult<RunOutcome> {
        let Some(_guard) = self.try_begin() else {
            debug!("主循环已在运行，忽略 resume");
            return Ok(RunOutcome::AlreadyRunning);
        };
        self.store.set_paused(false).await?;
        info!("▶️ 继续运行");
        self.run_loop().await
    }

    /// 请求暂停，主循环在下一轮开始时退出
    pub async fn pause(&self) -> AppResult<()> {
        self.store.set_paused(true).await?;
        info!("⏸️ 已请求暂停");
        Ok(())
    }

    fn try_begin(&self) -> Option<RunningGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunningGuard(&self.running))
    }

    async fn run_loop(&self) -> AppResult<RunOutcome> {
        loop {
            let mut state = match self.store.load().await {
                Ok(state) => state,
                Err(err) => {
                    error!("❌ 读取运行状态失败: {}", err);
                    self.reporter.emit(
                        &ProgressEvent::new(RunStatus::Error, None, 0, 0)
                            .with_message(err.to_string()),
                    );
                    return Err(err);
                }
            };

            // ========== 1. 暂停检查 ==========
            if state.paused {
                state.set_status(RunStatus::Paused);
                self.persist(&mut state).await?;
                self.emit(&state, None, None);
                return Ok(RunOutcome::Paused);
            }

            // ========== 2. 队列为空 ==========
            let Some(job) = state.focus_head() else {
                state.set_status(RunStatus::Completed);
                self.persist(&mut state).await?;
                self.emit(&state, None, Some("全部日期已完成".to_string()));
                return Ok(RunOutcome::Completed);
            };

            // ========== 3. 当前日期已达目标 ==========
            if state.progress.is_satisfied() {
                self.advance_date(&mut state, job).await?;
                tokio::task::yield_now().await;
                continue;
            }

            // ========== 4. 获取编号 ==========
            let identifier = match self.numbers.fetch().await {
                Ok(identifier) => identifier,
                Err(err) => match FailurePolicy::for_error(&err) {
                    FailurePolicy::RetryAfterBackoff => {
                        warn!(
                            "⚠️ 获取编号失败，{} ms 后重试: {}",
                            self.fetch_backoff.as_millis(),
                            err
                        );
                        state.set_error(err.to_string());
                        self.persist(&mut state).await?;
                        self.emit(&state, None, Some(err.to_string()));
                        sleep(self.fetch_backoff).await;
                        continue;
                    }
                    _ => return self.halt(state, err).await,
                },
            };

            // ========== 5. 提交流程 ==========
            let ctx = ItemCtx::new(
                job.date,
                identifier,
                state.progress.done + 1,
                job.goal,
                Duration::from_millis(state.delay_ms),
            );
            let message = match self.flow.run(&self.form, &ctx).await {
                Ok(ItemOutcome::Saved) => {
                    state.record_item(false);
                    state.set_status(RunStatus::Running);
                    None
                }
                Ok(ItemOutcome::Unconfirmed) => {
                    state.record_item(false);
                    state.set_status(RunStatus::Running);
                    Some("结果未确认".to_string())
                }
                Err(err) => match FailurePolicy::for_error(&err) {
                    FailurePolicy::Halt => return self.halt(state, err).await,
                    _ => {
                        warn!("{} ❌ 条目失败: {}", ctx, err);
                        state.record_item(true);
                        state.set_error(format!("{}: {}", ctx.identifier, err));
                        Some(err.to_string())
                    }
                },
            };

            // ========== 6. 先保存再推送 ==========
            self.persist(&mut state).await?;
            self.emit(&state, Some(ctx.identifier.as_str()), message);

            // ========== 7. 节奏延迟 ==========
            sleep(Duration::from_millis(state.delay_ms)).await;
        }
    }

    /// 弹出已完成的日期，计数切换到下一个日期
    async fn advance_date(&self, state: &mut RunState, job: JobEntry) -> AppResult<()> {
        let done = state.progress.done;
        state.finish_head();
        state.set_status(RunStatus::Running);
        self.persist(state).await?;

        info!("✅ 日期 {} 完成 ({}/{})", display_date(job.date), done, job.goal);
        self.reporter.emit(
            &ProgressEvent::new(RunStatus::Running, Some(job.date), done, job.goal)
                .with_message(format!("日期 {} 完成", display_date(job.date))),
        );
        Ok(())
    }

    /// 保存状态；失败时推送终止事件再返回错误
    async fn persist(&self, state: &mut RunState) -> AppResult<()> {
        state.touch();
        if let Err(err) = self.store.save(state).await {
            error!("❌ 保存运行状态失败: {}", err);
            let mut failed = state.clone();
            failed.set_error(err.to_string());
            self.emit(&failed, None, Some(err.to_string()));
            return Err(err);
        }
        Ok(())
    }

    /// 致命错误：尽量记录 Error 状态，然后返回错误
    async fn halt(&self, mut state: RunState, err: AppError) -> AppResult<RunOutcome> {
        error!("❌ 主循环终止: {}", err);
        state.set_error(err.to_string());
        self.persist(&mut state).await?;
        self.emit(&state, None, Some(err.to_string()));
        Err(err)
    }

    fn emit(&self, state: &RunState, identifier: Option<&str>, message: Option<String>) {
        let mut event = ProgressEvent::new(
            state.progress.status,
            state.current_job().map(|job| job.date),
            state.progress.done,
            state.progress.total,
        );
        if let Some(identifier) = identifier {
            event = event.with_identifier(identifier);
        }
        if let Some(message) = message {
            event = event.with_message(message);
        }
        self.reporter.emit(&event);
    }
}
