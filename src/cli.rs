//! 命令行接口
//!
//! 子命令对应控制端的操作；`start` / `resume` / `next-date` 会连接浏览器并进入主循环，
//! 其余命令只读写状态文件。

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::parse_date;

/// PCare 登记自动提交
#[derive(Debug, Parser)]
#[command(name = "pcare_bot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 配置文件路径（默认读取当前目录的 pcare_bot.toml）
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 用新队列开始运行
    Start {
        /// TOML 队列文件（[[jobs]] date / goal）
        #[arg(long, conflicts_with_all = ["date", "goal"])]
        queue: Option<PathBuf>,

        /// 单个日期（YYYY-MM-DD 或 DD-MM-YYYY）
        #[arg(long, value_parser = parse_date, requires = "goal")]
        date: Option<NaiveDate>,

        /// 该日期的目标数量
        #[arg(long, requires = "date")]
        goal: Option<u32>,

        /// 步骤间延迟（毫秒）
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// 清除暂停标记并从当前位置继续
    Resume,

    /// 请求暂停，运行中的主循环在当前条目结束后退出
    Pause,

    /// 追加一个日期到队尾
    Add {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        goal: u32,
    },

    /// 从队列移除一个日期
    Remove {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },

    /// 跳过当前日期并继续运行
    NextDate,

    /// 显示保存的运行状态
    Status,
}
