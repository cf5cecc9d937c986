use thiserror::Error;
use vizdom_io::IoError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("加载场景种子失败: {0}")]
    Seed(#[from] IoError),
    #[error("演示脚本 `{scenario}` 未能完成: {reason}")]
    Scenario {
        scenario: &'static str,
        reason: String,
    },
    #[error("命令 `{command}` 执行失败: {message}")]
    Command { command: String, message: String },
}
