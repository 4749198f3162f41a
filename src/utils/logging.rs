/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::AppResult;
use crate::error::StoreError;
use crate::models::{display_date, RunState};

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则 `verbose` 时为 debug，默认 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pcare_bot={},warn", default_level)));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\nPCare 提交日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|source| StoreError::Write {
        path: log_file_path.to_string(),
        source,
    })?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(mode: &str, state: &RunState) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", mode);
    info!(
        "📋 队列: {} 个日期, 共 {} 条目标",
        state.queue.len(),
        state.queue.total_goal()
    );
    if let Some(job) = state.current_job() {
        info!(
            "📅 当前日期: {} ({}/{})",
            display_date(job.date),
            state.progress.done,
            job.goal
        );
    }
    info!("⏱️ 步骤间延迟: {} ms", state.delay_ms);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(state: &RunState, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行结束统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("状态: {}", state.progress.status);
    info!("✅ 累计尝试: {}", state.attempted);
    info!("📋 剩余日期: {}", state.queue.len());
    if let Some(reason) = &state.last_error {
        info!("❌ 最后错误: {}", reason);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 显示保存的运行状态
pub fn log_status(state: &RunState) {
    info!("{}", "=".repeat(60));
    info!(
        "状态: {}{}",
        state.progress.status,
        if state.paused { " (已请求暂停)" } else { "" }
    );
    match state.current_job() {
        Some(job) => info!(
            "📅 当前日期: {} ({}/{}, 失败 {})",
            display_date(job.date),
            state.progress.done,
            state.progress.total,
            state.progress.failed
        ),
        None => info!("📅 队列为空"),
    }
    for (i, job) in state.queue.iter().enumerate() {
        info!("  {}. {} × {}", i + 1, display_date(job.date), job.goal);
    }
    info!("✅ 累计尝试: {}", state.attempted);
    if let Some(reason) = &state.last_error {
        info!("❌ 最后错误: {}", reason);
    }
    if let Some(updated_at) = state.updated_at {
        info!("🕒 更新时间: {}", updated_at.format("%Y-%m-%d %H:%M:%S"));
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
