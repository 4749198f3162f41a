//! PCare 登记页面的表单适配器
//!
//! 所有页面访问都通过 `JsExecutor`；选择器来自配置，页面改版时只需改配置。

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::wait::{poll_until, WaitSettings};
use super::FormAdapter;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{JsExecutor, StepReply};
use crate::models::display_date;

/// 类别控件及其取值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    pub selector: String,
    /// 复选框/单选框用 "true"/"false"，其他控件直接写入
    pub value: String,
}

/// 页面选择器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    pub date_field: String,
    /// 编号输入框所在表单组的标签文本
    pub identifier_label: String,
    /// 直接指定编号输入框，设置后忽略标签查找
    pub identifier_field: Option<String>,
    pub search_button_text: String,
    /// 搜索成功后被填充的字段
    pub result_field: String,
    pub dialog: String,
    /// 按顺序尝试的关闭按钮
    pub dialog_dismiss: Vec<String>,
    /// 每个条目开始前移除的残留遮罩
    pub stale_overlays: String,
    pub category_options: Vec<CategoryOption>,
    pub save_button: String,
    /// 保存成功后出现的元素；未设置时以编号输入框被清空为准
    pub saved_indicator: Option<String>,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            date_field: "#tglDaftar".to_string(),
            identifier_label: "No. Pencarian".to_string(),
            identifier_field: None,
            search_button_text: "Cari".to_string(),
            result_field: "#nmPst".to_string(),
            dialog: ".modal.in, .modal.show, .bootbox, .swal2-popup".to_string(),
            dialog_dismiss: vec![
                "#batalNIKSubmit_btn".to_string(),
                ".swal2-confirm".to_string(),
                ".bootbox .btn-primary".to_string(),
                "[data-dismiss='modal']".to_string(),
            ],
            stale_overlays: ".modal, .modal-backdrop".to_string(),
            category_options: vec![CategoryOption {
                selector: "#kunjSakitF".to_string(),
                value: "true".to_string(),
            }],
            save_button: "#btnSimpanPendaftaran".to_string(),
            saved_indicator: None,
        }
    }
}

/// 所有脚本共享的辅助函数
const PRELUDE: &str = r#"
    const __q = (sel) => (sel ? document.querySelector(sel) : null);
    const __visible = (el) => !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
    const __setValue = (el, v) => {
        el.value = v;
        el.dispatchEvent(new Event('input', { bubbles: true }));
        el.dispatchEvent(new Event('change', { bubbles: true }));
    };
    const __findIdentifier = (label, sel) => {
        if (sel) return __q(sel);
        const l = [...document.querySelectorAll('label')].find((x) => x.innerText.includes(label));
        return l?.closest('.form-group')?.querySelector('input') ?? null;
    };
"#;

/// 包装成带异常捕获的立即执行函数
fn script(body: &str) -> String {
    format!(
        "(() => {{ try {{ {PRELUDE} {body} }} catch (e) {{ return {{ found: false, error: String((e && e.message) || e) }}; }} }})()"
    )
}

fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// PCare 页面
pub struct PcarePage {
    executor: JsExecutor,
    selectors: PageSelectors,
    wait: WaitSettings,
}

impl PcarePage {
    pub fn new(executor: JsExecutor, selectors: PageSelectors, wait: WaitSettings) -> Self {
        Self {
            executor,
            selectors,
            wait,
        }
    }

    pub fn selectors(&self) -> &PageSelectors {
        &self.selectors
    }

    /// 执行一次，元素不存在时返回 None
    async fn attempt(&self, step: &str, js: &str) -> AppResult<Option<StepReply>> {
        let reply = self.executor.step(step, js).await?;
        Ok(reply.found.then_some(reply))
    }

    /// 反复执行直到元素出现；超过元素等待时间返回 `ElementNotFound`
    async fn run_step(&self, step: &str, element: &str, body: &str) -> AppResult<StepReply> {
        let js = script(body);
        let js = js.as_str();
        debug!("页面步骤: {}", step);
        poll_until(self.wait.poll_interval, self.wait.element_timeout, move || {
            self.attempt(step, js)
        })
        .await?
        .ok_or_else(|| AppError::element_not_found(element))
    }

    /// 只执行一次，不等待元素
    async fn probe(&self, step: &str, body: &str) -> AppResult<StepReply> {
        self.executor.step(step, script(body)).await
    }

    fn identifier_lookup(&self) -> String {
        format!(
            "__findIdentifier({}, {})",
            js_str(&self.selectors.identifier_label),
            self.selectors
                .identifier_field
                .as_deref()
                .map(js_str)
                .unwrap_or_else(|| "null".to_string())
        )
    }
}

#[async_trait]
impl FormAdapter for PcarePage {
    async fn page_ready(&self) -> AppResult<bool> {
        let reply = self
            .probe(
                "page_ready",
                "return { found: true, value: document.readyState === 'complete' };",
            )
            .await?;
        Ok(reply.flag())
    }

    async fn clear_overlays(&self) -> AppResult<()> {
        let body = format!(
            "document.querySelectorAll({}).forEach((e) => e.remove());
             document.body.classList.remove('modal-open');
             return {{ found: true }};",
            js_str(&self.selectors.stale_overlays)
        );
        self.probe("clear_overlays", &body).await?;
        Ok(())
    }

    async fn set_date(&self, date: NaiveDate) -> AppResult<()> {
        let body = format!(
            "const el = __q({});
             if (!el) return {{ found: false }};
             __setValue(el, {});
             return {{ found: true }};",
            js_str(&self.selectors.date_field),
            js_str(&display_date(date))
        );
        self.run_step("set_date", "日期输入框", &body).await?;
        Ok(())
    }

    async fn set_identifier(&self, identifier: &str) -> AppResult<()> {
        let body = format!(
            "const el = {};
             if (!el) return {{ found: false }};
             __setValue(el, {});
             return {{ found: true }};",
            self.identifier_lookup(),
            js_str(identifier)
        );
        self.run_step("set_identifier", "编号输入框", &body).await?;
        Ok(())
    }

    async fn search(&self) -> AppResult<()> {
        let body = format!(
            "const text = {};
             const btn = [...document.querySelectorAll('button, input[type=button], input[type=submit]')]
                 .find((b) => (b.innerText || b.value || '').trim() === text);
             if (!btn) return {{ found: false }};
             btn.click();
             return {{ found: true }};",
            js_str(&self.selectors.search_button_text)
        );
        self.run_step("search", "搜索按钮", &body).await?;
        Ok(())
    }

    async fn clear_search_result(&self) -> AppResult<()> {
        let body = format!(
            "const el = __q({});
             if (!el) return {{ found: false }};
             if ('value' in el) el.value = ''; else el.innerText = '';
             return {{ found: true }};",
            js_str(&self.selectors.result_field)
        );
        self.probe("clear_search_result", &body).await?;
        Ok(())
    }

    async fn search_result_ready(&self) -> AppResult<bool> {
        let body = format!(
            "const el = __q({});
             const text = el ? String(el.value ?? el.innerText ?? '').trim() : '';
             return {{ found: true, value: text.length > 0 }};",
            js_str(&self.selectors.result_field)
        );
        Ok(self.probe("search_result_ready", &body).await?.flag())
    }

    async fn save_completed(&self) -> AppResult<bool> {
        let body = match &self.selectors.saved_indicator {
            Some(indicator) => format!(
                "return {{ found: true, value: __visible(__q({})) }};",
                js_str(indicator)
            ),
            None => format!(
                "const el = {};
                 return {{ found: true, value: !!el && String(el.value ?? '').trim() === '' }};",
                self.identifier_lookup()
            ),
        };
        Ok(self.probe("save_completed", &body).await?.flag())
    }

    async fn visible_dialog(&self) -> AppResult<Option<String>> {
        let body = format!(
            "const d = [...document.querySelectorAll({})].find(__visible);
             return {{ found: !!d, value: d ? d.innerText : null }};",
            js_str(&self.selectors.dialog)
        );
        let reply = self.probe("visible_dialog", &body).await?;
        Ok(if reply.found { reply.text() } else { None })
    }

    async fn dismiss_dialog(&self) -> AppResult<bool> {
        let dismiss = serde_json::to_string(&self.selectors.dialog_dismiss)
            .unwrap_or_else(|_| "[]".to_string());
        let body = format!(
            "const d = [...document.querySelectorAll({})].find(__visible);
             for (const sel of {}) {{
                 const btn = [...(d ? d.querySelectorAll(sel) : []), ...document.querySelectorAll(sel)]
                     .find(__visible);
                 if (btn) {{ btn.click(); return {{ found: true, value: sel }}; }}
             }}
             return {{ found: false }};",
            js_str(&self.selectors.dialog),
            dismiss
        );
        Ok(self.probe("dismiss_dialog", &body).await?.found)
    }

    async fn set_category_options(&self) -> AppResult<()> {
        for option in &self.selectors.category_options {
            let body = format!(
                "const el = __q({});
                 if (!el) return {{ found: false }};
                 const v = {};
                 if (el.type === 'checkbox' || el.type === 'radio') {{
                     const want = v !== 'false';
                     if (el.checked !== want) el.click();
                 }} else {{
                     __setValue(el, v);
                 }}
                 return {{ found: true }};",
                js_str(&option.selector),
                js_str(&option.value)
            );
            self.run_step("set_category_options", &option.selector, &body)
                .await?;
        }
        Ok(())
    }

    async fn save(&self) -> AppResult<()> {
        let body = format!(
            "const btn = __q({});
             if (!btn) return {{ found: false }};
             btn.click();
             return {{ found: true }};",
            js_str(&self.selectors.save_button)
        );
        self.run_step("save", "保存按钮", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_wraps_body_with_prelude_and_catch() {
        let js = script("return { found: true };");
        assert!(js.starts_with("(() => { try {"));
        assert!(js.contains("const __q ="));
        assert!(js.contains("return { found: true };"));
        assert!(js.ends_with("})()"));
    }

    #[test]
    fn js_strings_are_escaped() {
        assert_eq!(js_str("No. \"Pencarian\""), "\"No. \\\"Pencarian\\\"\"");
    }

    #[test]
    fn default_selectors_come_from_the_registration_page() {
        let selectors = PageSelectors::default();
        assert_eq!(selectors.identifier_label, "No. Pencarian");
        assert_eq!(selectors.search_button_text, "Cari");
        assert_eq!(selectors.save_button, "#btnSimpanPendaftaran");
        assert_eq!(selectors.dialog_dismiss[0], "#batalNIKSubmit_btn");
    }
}
