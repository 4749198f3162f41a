use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::DEFAULT_DELAY_MS;
use crate::services::form_adapter::{PageSelectors, WaitSettings};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "pcare_bot.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 使用无头浏览器而不是连接已打开的浏览器
    pub headless: bool,
    /// 无头模式下的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 目标URL
    pub target_url: String,
    /// 优先复用标题包含该文本的页面
    pub target_title: Option<String>,
    /// 号码源 API
    pub number_source_url: String,
    /// 号码列表文件（设置后不再调用 API）
    pub numbers_file: Option<String>,
    /// 号码列表 URL（纯文本，每行一个）
    pub numbers_url: Option<String>,
    /// 号码列表的起始位置
    pub start_index: usize,
    /// 运行状态文件
    pub state_file: String,
    /// 步骤间延迟（毫秒），start 时写入运行状态
    pub delay_ms: u64,
    /// 号码获取失败后的等待时间（毫秒）
    pub fetch_backoff_ms: u64,
    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 等待页面就绪的最长时间（毫秒）
    pub page_ready_timeout_ms: u64,
    /// 等待页面元素出现的最长时间（毫秒）
    pub element_timeout_ms: u64,
    /// 等待搜索结果的最长时间（毫秒）
    pub search_timeout_ms: u64,
    /// 等待保存完成的最长时间（毫秒）
    pub save_timeout_ms: u64,
    /// 搜索后等待弹窗出现的时间（毫秒）
    pub dialog_settle_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 页面选择器
    pub selectors: PageSelectors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            target_url: "https://pcarejkn.bpjs-kesehatan.go.id/eclaim/EntriPendaftaran".to_string(),
            target_title: Some("PCare".to_string()),
            number_source_url: "https://v0-pcare.vercel.app/api/next-number".to_string(),
            numbers_file: None,
            numbers_url: None,
            start_index: 0,
            state_file: "pcare_state.json".to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            fetch_backoff_ms: DEFAULT_DELAY_MS,
            http_timeout_secs: 15,
            poll_interval_ms: 250,
            page_ready_timeout_ms: 15_000,
            element_timeout_ms: 5_000,
            search_timeout_ms: 10_000,
            save_timeout_ms: 15_000,
            dialog_settle_ms: 400,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            selectors: PageSelectors::default(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（若存在）→ 环境变量
    ///
    /// 显式指定的文件必须存在；未指定时只在当前目录存在 `pcare_bot.toml` 时读取
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        base.with_env_overrides()
    }

    /// 从 TOML 文件读取，缺失字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", self.browser_debug_port)?,
            headless: env_parse("HEADLESS", self.headless)?,
            chrome_executable: env_opt("CHROME_EXECUTABLE").or(self.chrome_executable),
            target_url: std::env::var("TARGET_URL").unwrap_or(self.target_url),
            target_title: env_opt("TARGET_TITLE").or(self.target_title),
            number_source_url: std::env::var("NUMBER_SOURCE_URL")
                .unwrap_or(self.number_source_url),
            numbers_file: env_opt("NUMBERS_FILE").or(self.numbers_file),
            numbers_url: env_opt("NUMBERS_URL").or(self.numbers_url),
            start_index: env_parse("START_INDEX", self.start_index)?,
            state_file: std::env::var("STATE_FILE").unwrap_or(self.state_file),
            delay_ms: env_parse("DELAY_MS", self.delay_ms)?,
            fetch_backoff_ms: env_parse("FETCH_BACKOFF_MS", self.fetch_backoff_ms)?,
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            ..self
        })
    }

    /// 页面等待参数
    pub fn wait_settings(&self) -> WaitSettings {
        WaitSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            page_ready_timeout: Duration::from_millis(self.page_ready_timeout_ms),
            element_timeout: Duration::from_millis(self.element_timeout_ms),
            search_timeout: Duration::from_millis(self.search_timeout_ms),
            save_timeout: Duration::from_millis(self.save_timeout_ms),
            dialog_settle: Duration::from_millis(self.dialog_settle_ms),
        }
    }

    pub fn fetch_backoff(&self) -> Duration {
        Duration::from_millis(self.fetch_backoff_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn env_opt(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        Err(_) => Ok(default),
    }
}
