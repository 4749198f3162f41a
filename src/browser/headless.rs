use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppResult, BrowserError};

/// 启动无头浏览器并导航到指定 URL
///
/// 未指定可执行文件时由 chromiumoxide 自动查找本机的 Chrome/Chromium
pub async fn launch_headless_browser(
    url: &str,
    executable: Option<&str>,
) -> AppResult<(Browser, Page)> {
    info!("🚀 启动无头浏览器...");
    debug!("目标 URL: {}, 可执行文件: {:?}", url, executable);

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
    ]);
    if let Some(path) = executable {
        builder = builder.chrome_executable(Path::new(path));
    }
    let config = builder.build().map_err(|reason| {
        error!("配置无头浏览器失败: {}", reason);
        BrowserError::LaunchFailed { reason }
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        BrowserError::LaunchFailed {
            reason: e.to_string(),
        }
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        BrowserError::NavigationFailed {
            url: url.to_string(),
            source: Box::new(e),
        }
    })?;

    info!("✅ 无头浏览器已导航到: {}", url);
    Ok((browser, page))
}
