use crate::error::{AppError, AppResult, NumberSourceError};
use std::path::Path;
use tokio::fs;
use tracing::info;

/// 把文本按行拆成号码列表（去空白、去空行）
pub fn parse_number_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 从文本文件加载号码列表
pub async fn load_numbers_from_file(path: &Path) -> AppResult<Vec<String>> {
    let text = fs::read_to_string(path).await.map_err(|e| {
        AppError::NumberSource(NumberSourceError::InvalidPayload {
            endpoint: path.display().to_string(),
            reason: e.to_string(),
        })
    })?;
    let numbers = parse_number_lines(&text);
    info!("✅ 从文件加载了 {} 个号码", numbers.len());
    Ok(numbers)
}

/// 从 URL 加载号码列表（纯文本，每行一个）
pub async fn load_numbers_from_url(client: &reqwest::Client, url: &str) -> AppResult<Vec<String>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::network(url, format!("HTTP {}", status.as_u16())));
    }

    let text = response.text().await.map_err(|e| AppError::network(url, e))?;
    let numbers = parse_number_lines(&text);
    info!("✅ 从 URL 加载了 {} 个号码", numbers.len());
    Ok(numbers)
}
