//! 表单适配器 - 业务能力层
//!
//! 把目标页面抽象成固定的能力集合（日期、编号、搜索、弹窗、类别选项、保存），
//! 编排层只依赖这个 trait。更换页面版本时只需换一个实现或一套选择器。

pub mod dialogs;
pub mod pcare_page;
pub mod wait;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;

pub use dialogs::{classify, DialogKind};
pub use pcare_page::{CategoryOption, PageSelectors, PcarePage};
pub use wait::{poll_until, wait_for_outcome, wait_until_ready, OutcomeTarget, WaitOutcome, WaitSettings};

/// 目标页面的能力集合
///
/// 每个步骤都是幂等的：要么完成，要么以 `ElementNotFound` / `Timeout` 失败
#[async_trait]
pub trait FormAdapter: Send + Sync {
    /// 页面是否已加载完成
    async fn page_ready(&self) -> AppResult<bool>;

    /// 清除残留的遮罩和弹窗
    async fn clear_overlays(&self) -> AppResult<()>;

    async fn set_date(&self, date: NaiveDate) -> AppResult<()>;

    async fn set_identifier(&self, identifier: &str) -> AppResult<()>;

    /// 清空搜索结果字段，避免上一个条目的残留内容被当成新结果
    async fn clear_search_result(&self) -> AppResult<()>;

    /// 触发搜索
    async fn search(&self) -> AppResult<()>;

    /// 搜索结果是否已填充
    async fn search_result_ready(&self) -> AppResult<bool>;

    /// 保存是否已完成
    async fn save_completed(&self) -> AppResult<bool>;

    /// 当前可见弹窗的文本
    async fn visible_dialog(&self) -> AppResult<Option<String>>;

    /// 关闭当前弹窗，返回是否找到可点击的按钮
    async fn dismiss_dialog(&self) -> AppResult<bool>;

    async fn set_category_options(&self) -> AppResult<()>;

    /// 触发保存
    async fn save(&self) -> AppResult<()>;
}
