pub mod cli;
pub mod errors;
pub mod loader;

use errors::FrontendError;
use tracing::info;
use vizdom_config::{AppConfig, Scenario};

/// 启动 CLI 演示或返回错误。
pub fn run_cli_demo(config: &AppConfig, scenario: Scenario) -> Result<(), FrontendError> {
    info!(scenario = scenario.name(), "启动 CLI 演示前端");
    cli::run_demo(config, scenario)
}
