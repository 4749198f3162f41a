//! 条目处理上下文
//!
//! 封装"我正在为哪个日期提交第几个编号"这一信息

use std::fmt::Display;
use std::time::Duration;

use chrono::NaiveDate;

use crate::models::display_date;

/// 条目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    pub date: NaiveDate,

    /// 从号码源取得的编号
    pub identifier: String,

    /// 该日期内的序号（从1开始，仅用于日志显示）
    pub sequence: u32,

    pub goal: u32,

    /// 填写步骤之间的停顿
    pub step_delay: Duration,
}

impl ItemCtx {
    pub fn new(
        date: NaiveDate,
        identifier: String,
        sequence: u32,
        goal: u32,
        step_delay: Duration,
    ) -> Self {
        Self {
            date,
            identifier,
            sequence,
            goal,
            step_delay,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[日期 {} 条目 {}/{} 编号#{}]",
            display_date(self.date),
            self.sequence,
            self.goal,
            self.identifier
        )
    }
}
