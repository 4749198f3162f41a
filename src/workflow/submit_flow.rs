//! 条目提交流程 - 流程层
//!
//! 核心职责：定义"一个编号"的完整页面操作顺序
//!
//! 流程顺序：
//! 1. 等待页面就绪 → 清除残留遮罩
//! 2. 填日期 → 填编号 → 清空旧结果 → 搜索
//! 3. 等待搜索结果 → 处理弹窗
//! 4. 类别选项 → 保存 → 等待保存完成
//!
//! 任何一步失败都直接返回错误，由编排层决定计数方式。

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{AppResult, FormError};
use crate::services::form_adapter::{
    classify, wait_for_outcome, wait_until_ready, DialogKind, FormAdapter, OutcomeTarget,
    WaitOutcome, WaitSettings,
};
use crate::utils::logging::truncate_text;
use crate::workflow::item_ctx::ItemCtx;

/// 条目处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// 保存已确认
    Saved,
    /// 等待超时，无法确认结果
    Unconfirmed,
}

/// 条目提交流程
///
/// - 决定页面步骤的顺序
/// - 解释等待结果和弹窗
/// - 不持有任何资源（page）
pub struct SubmitFlow {
    wait: WaitSettings,
}

impl SubmitFlow {
    pub fn new(wait: WaitSettings) -> Self {
        Self { wait }
    }

    pub fn wait_settings(&self) -> &WaitSettings {
        &self.wait
    }

    pub async fn run<F>(&self, form: &F, ctx: &ItemCtx) -> AppResult<ItemOutcome>
    where
        F: FormAdapter + ?Sized,
    {
        info!("{} 📝 开始填写", ctx);

        wait_until_ready(form, &self.wait).await?;
        form.clear_overlays().await?;

        form.set_date(ctx.date).await?;
        form.set_identifier(&ctx.identifier).await?;
        sleep(ctx.step_delay).await;

        // ========== 搜索 ==========
        form.clear_search_result().await?;
        form.search().await?;
        let searched = wait_for_outcome(form, OutcomeTarget::SearchResult, &self.wait).await?;
        if !self.accept(ctx, searched, "搜索")? {
            return Ok(ItemOutcome::Unconfirmed);
        }

        // 搜索结果出现后页面可能再弹出确认框
        sleep(self.wait.dialog_settle).await;
        self.dismiss_late_dialog(form, ctx).await?;

        // ========== 保存 ==========
        form.set_category_options().await?;
        form.save().await?;
        let saved = wait_for_outcome(form, OutcomeTarget::SaveCompletion, &self.wait).await?;
        if !self.accept(ctx, saved, "保存")? {
            return Ok(ItemOutcome::Unconfirmed);
        }

        info!("{} ✓ 保存成功", ctx);
        Ok(ItemOutcome::Saved)
    }

    /// 解释一次等待结果
    ///
    /// 返回 `Ok(true)` 继续，`Ok(false)` 表示超时未知
    fn accept(&self, ctx: &ItemCtx, outcome: WaitOutcome, stage: &str) -> AppResult<bool> {
        match outcome {
            WaitOutcome::Success => Ok(true),
            WaitOutcome::Dialog { kind, text } => {
                reject_if_blocking(kind, &text)?;
                debug!("{} {}后关闭弹窗 ({})", ctx, stage, kind);
                Ok(true)
            }
            WaitOutcome::Blocked { text } => Err(FormError::BlockingDialog { text }.into()),
            WaitOutcome::Unknown => {
                warn!("{} ⚠️ 等待{}结果超时，结果未知", ctx, stage);
                Ok(false)
            }
        }
    }

    async fn dismiss_late_dialog<F>(&self, form: &F, ctx: &ItemCtx) -> AppResult<()>
    where
        F: FormAdapter + ?Sized,
    {
        let Some(text) = form.visible_dialog().await? else {
            return Ok(());
        };
        let Some(kind) = classify(&text) else {
            return Err(FormError::BlockingDialog { text }.into());
        };

        debug!("{} 关闭弹窗 ({}): {}", ctx, kind, truncate_text(&text, 60));
        if !form.dismiss_dialog().await? {
            warn!("{} ⚠️ 找不到弹窗的关闭按钮", ctx);
        }
        reject_if_blocking(kind, &text)
    }
}

fn reject_if_blocking(kind: DialogKind, text: &str) -> AppResult<()> {
    if kind.blocks_submission() {
        return Err(FormError::Rejected {
            kind,
            text: text.to_string(),
        }
        .into());
    }
    Ok(())
}
