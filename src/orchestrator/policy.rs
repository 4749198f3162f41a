//! 失败处理策略
//!
//! 错误类型到处理方式的固定映射，主循环只看这张表。

use crate::error::{AppError, BrowserError, NumberSourceError};

/// 失败后的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// 不消耗条目，等待固定时间后重试
    RetryAfterBackoff,
    /// 计入已尝试，继续下一个条目
    CountAndContinue,
    /// 停止主循环并把错误返回给调用方
    Halt,
}

impl FailurePolicy {
    pub fn for_error(err: &AppError) -> Self {
        match err {
            AppError::NumberSource(NumberSourceError::Network { .. })
            | AppError::NumberSource(NumberSourceError::InvalidPayload { .. }) => {
                FailurePolicy::RetryAfterBackoff
            }
            AppError::NumberSource(NumberSourceError::Exhausted { .. }) => FailurePolicy::Halt,
            AppError::Form(_) => FailurePolicy::CountAndContinue,
            AppError::Browser(BrowserError::ScriptExecutionFailed { .. }) => {
                FailurePolicy::CountAndContinue
            }
            AppError::Browser(BrowserError::Disconnected { .. })
            | AppError::Browser(BrowserError::ConnectionFailed { .. })
            | AppError::Browser(BrowserError::LaunchFailed { .. })
            | AppError::Browser(BrowserError::NavigationFailed { .. }) => FailurePolicy::Halt,
            AppError::Store(_) | AppError::Queue(_) | AppError::Config(_) => FailurePolicy::Halt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormError, QueueError, StoreError};

    #[test]
    fn fetch_failures_are_retried() {
        let err = AppError::network("http://x", "API status 500");
        assert_eq!(FailurePolicy::for_error(&err), FailurePolicy::RetryAfterBackoff);

        let err = AppError::NumberSource(NumberSourceError::InvalidPayload {
            endpoint: "http://x".into(),
            reason: "empty".into(),
        });
        assert_eq!(FailurePolicy::for_error(&err), FailurePolicy::RetryAfterBackoff);
    }

    #[test]
    fn page_failures_are_counted() {
        for err in [
            AppError::element_not_found("日期输入框"),
            FormError::Timeout {
                what: "页面就绪".into(),
                waited_ms: 10,
            }
            .into(),
            FormError::BlockingDialog { text: "?".into() }.into(),
            AppError::Browser(BrowserError::ScriptExecutionFailed {
                source: "boom".into(),
            }),
        ] {
            assert_eq!(FailurePolicy::for_error(&err), FailurePolicy::CountAndContinue);
        }
    }

    #[test]
    fn store_and_exhaustion_halt() {
        let store = AppError::Store(StoreError::Write {
            path: "state.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        });
        assert_eq!(FailurePolicy::for_error(&store), FailurePolicy::Halt);

        let exhausted = AppError::NumberSource(NumberSourceError::Exhausted { total: 3 });
        assert_eq!(FailurePolicy::for_error(&exhausted), FailurePolicy::Halt);

        assert_eq!(
            FailurePolicy::for_error(&QueueError::Empty.into()),
            FailurePolicy::Halt
        );
    }

    #[test]
    fn lost_browser_halts() {
        let err = AppError::Browser(BrowserError::Disconnected {
            source: "websocket closed".into(),
        });
        assert_eq!(FailurePolicy::for_error(&err), FailurePolicy::Halt);
    }
}
