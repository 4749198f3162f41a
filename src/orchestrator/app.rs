//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **命令分发**：把 CLI 子命令交给 `Controller` 或主循环
//! 2. **资源装配**：连接浏览器、创建 JsExecutor、选择号码源和报告器
//! 3. **资源管理**：持有 Browser，直到主循环结束
//! 4. **中断处理**：Ctrl-C 只写暂停标记，当前条目完成后再退出

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::browser;
use crate::cli::Command;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;
use crate::models::{
    load_numbers_from_file, load_numbers_from_url, load_queue_file, JobEntry, JobQueue,
};
use crate::orchestrator::controller::Controller;
use crate::orchestrator::run_loop::{Orchestrator, RunOutcome, RunSettings};
use crate::services::{
    ApiNumberSource, ConfiguredNumberSource, FanoutReporter, FileJobStore, JobStore,
    ListNumberSource, LogFileReporter, PcarePage, TracingReporter,
};
use crate::utils::logging::{init_log_file, log_startup, log_status, print_final_stats};

/// 生产环境使用的编排器
pub type PcareOrchestrator =
    Orchestrator<FileJobStore, ConfiguredNumberSource, PcarePage, FanoutReporter>;

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<FileJobStore>,
    controller: Controller<FileJobStore>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(FileJobStore::new(&config.state_file));
        let controller = Controller::new(Arc::clone(&store));
        Self {
            config,
            store,
            controller,
        }
    }

    pub fn controller(&self) -> &Controller<FileJobStore> {
        &self.controller
    }

    /// 执行一个子命令
    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Start {
                queue,
                date,
                goal,
                delay_ms,
            } => {
                if let Some((queue, file_delay)) = self.build_queue(queue, date, goal).await? {
                    let delay = delay_ms.or(file_delay).unwrap_or(self.config.delay_ms);
                    self.controller.begin(queue, delay).await?;
                } else if let Some(delay) = delay_ms {
                    let mut state = self.store.load().await?;
                    state.delay_ms = delay;
                    self.store.save(&state).await?;
                }
                self.drive(false).await
            }
            Command::Resume => self.drive(true).await,
            Command::Pause => Ok(self.controller.pause().await?),
            Command::Add { date, goal } => {
                let state = self.controller.enqueue(JobEntry::new(date, goal)).await?;
                log_status(&state);
                Ok(())
            }
            Command::Remove { date } => {
                self.controller.remove(date).await?;
                log_status(&self.controller.status().await?);
                Ok(())
            }
            Command::NextDate => {
                self.controller.skip_date().await?;
                self.drive(true).await
            }
            Command::Status => {
                log_status(&self.controller.status().await?);
                Ok(())
            }
        }
    }

    /// 由命令行参数构造队列；都未指定时返回 None，沿用已保存的队列
    async fn build_queue(
        &self,
        file: Option<PathBuf>,
        date: Option<NaiveDate>,
        goal: Option<u32>,
    ) -> AppResult<Option<(JobQueue, Option<u64>)>> {
        if let Some(path) = file {
            let loaded = load_queue_file(&path).await?;
            return Ok(Some((loaded.queue, loaded.delay_ms)));
        }
        match (date, goal) {
            (Some(date), Some(goal)) => {
                let queue = JobQueue::from_entries([JobEntry::new(date, goal)])?;
                Ok(Some((queue, None)))
            }
            _ => Ok(None),
        }
    }

    /// 连接浏览器并运行主循环
    async fn drive(&self, resume: bool) -> Result<()> {
        init_log_file(&self.config.output_log_file)?;

        let state = self.store.load().await?;
        if state.queue.is_empty() {
            info!("📋 队列为空，无需运行");
            log_status(&state);
            return Ok(());
        }
        log_startup(if resume { "继续运行" } else { "开始运行" }, &state);

        // 连接浏览器，Browser 必须活到主循环结束
        let (_browser, page) = browser::open_page(&self.config).await?;
        let form = PcarePage::new(
            JsExecutor::new(page),
            self.config.selectors.clone(),
            self.config.wait_settings(),
        );
        let numbers = self.number_source(state.attempted).await?;
        let reporter = FanoutReporter::new()
            .with(TracingReporter)
            .with(LogFileReporter::new(&self.config.output_log_file));

        let orchestrator: PcareOrchestrator = Orchestrator::new(
            Arc::clone(&self.store),
            numbers,
            form,
            reporter,
            RunSettings {
                fetch_backoff: self.config.fetch_backoff(),
                wait: self.config.wait_settings(),
            },
        );

        let ctrl_c = spawn_pause_on_ctrl_c(Arc::clone(&self.store));
        let result = if resume {
            orchestrator.resume().await
        } else {
            orchestrator.start().await
        };
        ctrl_c.abort();

        let final_state = self.store.load().await?;
        print_final_stats(&final_state, &self.config.output_log_file);

        match result? {
            RunOutcome::Completed => info!("🎉 队列已全部完成"),
            RunOutcome::Paused => info!("⏸️ 已暂停，使用 resume 继续"),
            RunOutcome::AlreadyRunning => warn!("⚠️ 主循环已在运行"),
        }
        Ok(())
    }

    /// 按配置选择号码源
    ///
    /// 静态列表的游标从 `start_index + attempted` 开始，重启后不会重复使用编号
    async fn number_source(&self, attempted: u64) -> AppResult<ConfiguredNumberSource> {
        let offset = self.config.start_index + attempted as usize;

        let numbers = if let Some(path) = &self.config.numbers_file {
            Some(load_numbers_from_file(Path::new(path)).await?)
        } else if let Some(url) = &self.config.numbers_url {
            let client = reqwest::Client::builder()
                .timeout(self.config.http_timeout())
                .build()
                .map_err(|e| AppError::network(url.clone(), e))?;
            Some(load_numbers_from_url(&client, url).await?)
        } else {
            None
        };

        match numbers {
            Some(numbers) => {
                info!("📋 使用号码列表: 共 {} 个, 从第 {} 个开始", numbers.len(), offset + 1);
                Ok(ConfiguredNumberSource::List(ListNumberSource::new(
                    numbers, offset,
                )))
            }
            None => {
                info!("🌐 使用号码 API: {}", self.config.number_source_url);
                Ok(ConfiguredNumberSource::Api(ApiNumberSource::new(
                    self.config.number_source_url.clone(),
                    self.config.http_timeout(),
                )?))
            }
        }
    }
}

/// Ctrl-C 时写入暂停标记，主循环在下一轮开始时退出
fn spawn_pause_on_ctrl_c<S: JobStore + 'static>(store: Arc<S>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏸️ 收到 Ctrl-C，当前条目完成后暂停");
            if let Err(e) = store.set_paused(true).await {
                warn!("写入暂停标记失败: {}", e);
            }
        }
    })
}
