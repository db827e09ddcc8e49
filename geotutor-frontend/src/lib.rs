pub mod cli;
pub mod loader;
pub mod orchestrator;

use geotutor_config::AppConfig;
use tracing::info;

/// 启动 CLI 演示前端。
pub fn run_cli_demo(config: &AppConfig) {
    info!("启动 CLI 演示前端");
    cli::run_demo(config);
}
