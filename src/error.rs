use chrono::NaiveDate;
use thiserror::Error;

use crate::services::form_adapter::DialogKind;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 号码源错误
    #[error("号码源错误: {0}")]
    NumberSource(#[from] NumberSourceError),
    /// 页面表单错误
    #[error("表单错误: {0}")]
    Form(#[from] FormError),
    /// 状态持久化错误
    #[error("持久化错误: {0}")]
    Store(#[from] StoreError),
    /// 队列操作错误
    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 号码源错误
#[derive(Debug, Error)]
pub enum NumberSourceError {
    /// 传输失败或非 2xx 状态
    #[error("请求失败 ({endpoint}): {reason}")]
    Network { endpoint: String, reason: String },
    /// 响应缺少 numbers 字段
    #[error("响应无效 ({endpoint}): {reason}")]
    InvalidPayload { endpoint: String, reason: String },
    /// 静态号码列表已用完
    #[error("号码列表已用完 (共 {total} 个)")]
    Exhausted { total: usize },
}

/// 页面表单错误
#[derive(Debug, Error)]
pub enum FormError {
    /// 最长等待后仍找不到必需元素
    #[error("找不到页面元素: {element}")]
    ElementNotFound { element: String },
    /// 等待超时
    #[error("等待 {what} 超时 ({waited_ms} ms)")]
    Timeout { what: String, waited_ms: u64 },
    /// 未识别的对话框挡住了页面
    #[error("未识别的对话框: {text}")]
    BlockingDialog { text: String },
    /// 页面拒绝了该编号
    #[error("页面拒绝 ({kind}): {text}")]
    Rejected { kind: DialogKind, text: String },
    /// 页面脚本返回了无法理解的结果
    #[error("步骤 {step} 执行失败: {reason}")]
    Script { step: String, reason: String },
}

/// 状态持久化错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("读取状态文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入状态文件失败 ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("状态文件损坏 ({path}): {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 队列操作错误
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("日期 {date} 已在队列中")]
    DuplicateDate { date: NaiveDate },
    #[error("日期 {date} 不在队列中")]
    NotQueued { date: NaiveDate },
    #[error("无法解析日期: {input} (支持 YYYY-MM-DD 或 DD-MM-YYYY)")]
    InvalidDate { input: String },
    #[error("队列为空")]
    Empty,
    #[error("队列文件无效 ({path}): {reason}")]
    InvalidFile { path: String, reason: String },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动无头浏览器失败
    #[error("启动无头浏览器失败: {reason}")]
    LaunchFailed { reason: String },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 与浏览器的连接已断开（websocket 关闭、标签页崩溃、无响应）
    #[error("浏览器连接已断开: {source}")]
    Disconnected {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        // 只有页面内求值本身的失败算脚本错误，其余都是传输层问题
        let script_level = matches!(
            err,
            CdpError::JavascriptException(_)
                | CdpError::Chrome(_)
                | CdpError::ChromeMessage(_)
                | CdpError::Serde(_)
                | CdpError::InvalidMessage(..)
                | CdpError::NotFound
                | CdpError::FrameNotFound(_)
                | CdpError::ScrollingFailed(_)
                | CdpError::DecodeError(_)
        );
        let source = Box::new(err);
        if script_level {
            AppError::Browser(BrowserError::ScriptExecutionFailed { source })
        } else {
            AppError::Browser(BrowserError::Disconnected { source })
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建号码源网络错误
    pub fn network(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        AppError::NumberSource(NumberSourceError::Network {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        })
    }

    /// 创建找不到元素错误
    pub fn element_not_found(element: impl Into<String>) -> Self {
        AppError::Form(FormError::ElementNotFound {
            element: element.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
