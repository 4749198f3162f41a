//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult, FormError};

fn script_error(step: &str, err: serde_json::Error) -> AppError {
    AppError::Form(FormError::Script {
        step: step.to_string(),
        reason: err.to_string(),
    })
}

/// 页面脚本的统一返回格式
///
/// 脚本约定返回 `{ found, value?, error? }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepReply {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub value: Option<JsonValue>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StepReply {
    /// 读取 value 中的布尔值
    pub fn flag(&self) -> bool {
        self.value.as_ref().and_then(JsonValue::as_bool).unwrap_or(false)
    }

    /// 读取 value 中的非空字符串
    pub fn text(&self) -> Option<String> {
        self.value
            .as_ref()
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识日期 / 编号
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value: JsonValue = result.into_value().map_err(|e| script_error("eval", e))?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value =
            serde_json::from_value(json_value).map_err(|e| script_error("eval_as", e))?;
        Ok(typed_value)
    }

    /// 执行一个页面步骤脚本
    ///
    /// 脚本报告的 `error` 转换为 `FormError::Script`
    pub async fn step(&self, step: &str, js_code: impl Into<String>) -> AppResult<StepReply> {
        let reply: StepReply = self.eval_as(js_code).await?;
        if let Some(reason) = &reply.error {
            return Err(FormError::Script {
                step: step.to_string(),
                reason: reason.clone(),
            }
            .into());
        }
        Ok(reply)
    }
}
