//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责队列调度和运行控制，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `run_loop` - 主循环
//! - 按队列顺序消费日期，每轮读取并写回 `RunState`
//! - 单飞：同一时间只有一个主循环
//! - 按 `policy` 处理失败
//!
//! ### `controller` - 控制端
//! - 重置队列、追加/移除日期、跳过当前日期
//! - 写暂停标记、查询状态
//!
//! ### `app` - 应用入口
//! - 管理浏览器资源，装配主循环
//! - 分发 CLI 子命令
//!
//! ## 层次关系
//!
//! ```text
//! app (CLI 子命令)
//!     ↓
//! run_loop (处理 Vec<JobEntry>)
//!     ↓
//! workflow::SubmitFlow (处理单个编号)
//!     ↓
//! services (能力层：store / numbers / form / reporter)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod app;
pub mod controller;
pub mod policy;
pub mod run_loop;

// 重新导出主要类型
pub use app::{App, PcareOrchestrator};
pub use controller::Controller;
pub use policy::FailurePolicy;
pub use run_loop::{Orchestrator, RunOutcome, RunSettings};
