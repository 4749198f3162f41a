//! 号码源服务 - 业务能力层
//!
//! 只负责"取下一个编号"，每个条目调用一次，不做重试；
//! 重试策略完全由编排层决定。

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{AppError, AppResult, NumberSourceError};

/// 号码源
#[async_trait]
pub trait NumberSource: Send + Sync {
    /// 获取下一个要提交的编号
    async fn fetch(&self) -> AppResult<String>;
}

/// API 响应体
#[derive(Debug, Deserialize)]
struct NextNumberPayload {
    numbers: Option<JsonValue>,
}

/// 通过 HTTP GET 获取编号
pub struct ApiNumberSource {
    client: reqwest::Client,
    endpoint: String,
}

impl ApiNumberSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::network(endpoint.clone(), e))?;
        Ok(Self { client, endpoint })
    }

    /// 使用已有的 HTTP 客户端
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn invalid(&self, reason: impl Into<String>) -> AppError {
        AppError::NumberSource(NumberSourceError::InvalidPayload {
            endpoint: self.endpoint.clone(),
            reason: reason.into(),
        })
    }

    /// 从响应体提取编号；空字符串、null、缺失字段都视为无效
    fn extract_number(&self, payload: NextNumberPayload) -> AppResult<String> {
        match payload.numbers {
            Some(JsonValue::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Some(JsonValue::Number(n)) => Ok(n.to_string()),
            Some(other) if !other.is_null() && !matches!(other, JsonValue::String(_)) => {
                Err(self.invalid(format!("numbers 字段类型不正确: {}", other)))
            }
            _ => Err(self.invalid("响应缺少 numbers 字段")),
        }
    }
}

#[async_trait]
impl NumberSource for ApiNumberSource {
    async fn fetch(&self) -> AppResult<String> {
        debug!("请求下一个编号: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| AppError::network(self.endpoint.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::network(
                self.endpoint.clone(),
                format!("API status {}", status.as_u16()),
            ));
        }

        let payload: NextNumberPayload = response
            .json()
            .await
            .map_err(|e| self.invalid(e.to_string()))?;

        let number = self.extract_number(payload)?;
        debug!("获取到编号: {}", number);
        Ok(number)
    }
}

/// 预先加载的静态号码列表
///
/// 游标从 `offset` 开始，每次 fetch 前进一位，用完后返回 `Exhausted`
pub struct ListNumberSource {
    numbers: Vec<String>,
    cursor: Mutex<usize>,
}

impl ListNumberSource {
    pub fn new(numbers: Vec<String>, offset: usize) -> Self {
        Self {
            numbers,
            cursor: Mutex::new(offset),
        }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

#[async_trait]
impl NumberSource for ListNumberSource {
    async fn fetch(&self) -> AppResult<String> {
        let mut cursor = match self.cursor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let number = self
            .numbers
            .get(*cursor)
            .cloned()
            .ok_or(NumberSourceError::Exhausted {
                total: self.numbers.len(),
            })?;
        *cursor += 1;
        Ok(number)
    }
}

/// 按配置选择的号码源
pub enum ConfiguredNumberSource {
    Api(ApiNumberSource),
    List(ListNumberSource),
}

#[async_trait]
impl NumberSource for ConfiguredNumberSource {
    async fn fetch(&self) -> AppResult<String> {
        match self {
            ConfiguredNumberSource::Api(source) => source.fetch().await,
            ConfiguredNumberSource::List(source) => source.fetch().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ApiNumberSource {
        ApiNumberSource::with_client(reqwest::Client::new(), "http://localhost/api/next-number")
    }

    fn payload(json: JsonValue) -> NextNumberPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn extracts_string_and_numeric_numbers() {
        let s = source();
        assert_eq!(
            s.extract_number(payload(serde_json::json!({ "numbers": " 0001234 " })))
                .unwrap(),
            "0001234"
        );
        assert_eq!(
            s.extract_number(payload(serde_json::json!({ "numbers": 42 })))
                .unwrap(),
            "42"
        );
    }

    #[test]
    fn empty_or_missing_numbers_are_invalid() {
        let s = source();
        for body in [
            serde_json::json!({}),
            serde_json::json!({ "numbers": "" }),
            serde_json::json!({ "numbers": null }),
            serde_json::json!({ "numbers": ["1"] }),
        ] {
            let err = s.extract_number(payload(body)).unwrap_err();
            assert!(matches!(
                err,
                AppError::NumberSource(NumberSourceError::InvalidPayload { .. })
            ));
        }
    }

    #[tokio::test]
    async fn list_source_walks_from_offset_then_exhausts() {
        let list = ListNumberSource::new(vec!["a".into(), "b".into(), "c".into()], 1);
        assert_eq!(list.fetch().await.unwrap(), "b");
        assert_eq!(list.fetch().await.unwrap(), "c");
        let err = list.fetch().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NumberSource(NumberSourceError::Exhausted { total: 3 })
        ));
    }
}
