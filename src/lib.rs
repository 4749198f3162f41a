//! # PCare Bot
//!
//! 一个用于自动化 PCare 登记提交的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `JobStore` - 运行状态持久化（JSON 文件 + 暂停标记）
//! - `NumberSource` - 取下一个编号（API 或静态列表）
//! - `FormAdapter` - 页面步骤与有界等待
//! - `ProgressReporter` - 状态推送（日志 / 日志文件）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个编号"的完整处理流程
//! - `ItemCtx` - 上下文封装（日期 + 编号 + 序号）
//! - `SubmitFlow` - 流程编排（日期 → 编号 → 搜索 → 弹窗 → 保存）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_loop` - 可恢复的主循环
//! - `orchestrator/controller` - 队列和暂停控制
//! - `orchestrator/app` - 资源装配与命令分发
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{JobEntry, JobQueue, RunState, RunStatus};
pub use orchestrator::{App, Controller, Orchestrator, RunOutcome};
pub use workflow::{ItemCtx, ItemOutcome, SubmitFlow};
