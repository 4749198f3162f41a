//! 进度报告服务 - 业务能力层
//!
//! 把编排器的状态变化推送给观察者。对编排器而言只写不读，
//! 报告失败只在内部记录，绝不影响主循环。

use std::fs::OpenOptions;
use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::models::{display_date, RunStatus};

/// 一次状态推送
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub status: RunStatus,
    pub date: Option<NaiveDate>,
    pub identifier: Option<String>,
    pub done: u32,
    pub total: u32,
    /// 附加说明（错误原因、日期完成等）
    pub message: Option<String>,
}

impl ProgressEvent {
    pub fn new(status: RunStatus, date: Option<NaiveDate>, done: u32, total: u32) -> Self {
        Self {
            status,
            date,
            identifier: None,
            done,
            total,
            message: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 进度百分比
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            ((u64::from(self.done) * 100 + u64::from(self.total) / 2) / u64::from(self.total)) as u32
        }
    }

    /// 单行文本
    pub fn to_line(&self) -> String {
        let date = self.date.map(display_date).unwrap_or_else(|| "-".to_string());
        let current = self.identifier.as_deref().unwrap_or("-");
        let mut line = format!(
            "[{}] 日期: {} | 当前: {} | 进度: {}/{} ({}%)",
            self.status,
            date,
            current,
            self.done,
            self.total,
            self.percent()
        );
        if let Some(message) = &self.message {
            line.push_str(" | ");
            line.push_str(message);
        }
        line
    }
}

/// 进度观察者
pub trait ProgressReporter: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// 输出到 tracing 日志
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn emit(&self, event: &ProgressEvent) {
        let line = event.to_line();
        match event.status {
            RunStatus::Error => error!("❌ {}", line),
            RunStatus::Paused => warn!("⏸️ {}", line),
            RunStatus::Completed => info!("🎉 {}", line),
            RunStatus::Running | RunStatus::Idle => info!("🤖 {}", line),
        }
    }
}

/// 追加到运行日志文件
pub struct LogFileReporter {
    path: String,
}

impl LogFileReporter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ProgressReporter for LogFileReporter {
    fn emit(&self, event: &ProgressEvent) {
        let line = format!(
            "{} {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            event.to_line()
        );
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            debug!("写入日志文件失败 ({}): {}", self.path, e);
        }
    }
}

/// 同时推送给多个观察者
#[derive(Default)]
pub struct FanoutReporter {
    reporters: Vec<Box<dyn ProgressReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }
}

impl ProgressReporter for FanoutReporter {
    fn emit(&self, event: &ProgressEvent) {
        for reporter in &self.reporters {
            reporter.emit(event);
        }
    }
}
