use anyhow::Result;
use clap::Parser;

use pcare_bot::cli::Cli;
use pcare_bot::utils::logging;
use pcare_bot::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    // 执行子命令
    App::new(config).execute(cli.command).await
}
