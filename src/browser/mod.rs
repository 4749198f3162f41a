pub mod connection;
pub mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_headless_browser;

use chromiumoxide::{Browser, Page};

use crate::config::Config;
use crate::error::AppResult;

/// 按配置连接已打开的浏览器或启动无头浏览器
pub async fn open_page(config: &Config) -> AppResult<(Browser, Page)> {
    if config.headless {
        launch_headless_browser(&config.target_url, config.chrome_executable.as_deref()).await
    } else {
        connect_to_browser_and_page(
            config.browser_debug_port,
            Some(&config.target_url),
            config.target_title.as_deref(),
        )
        .await
    }
}
