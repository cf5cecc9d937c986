use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。每个分节都可以缺省。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub units: UnitsConfig,
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 自动发现配置文件：优先读取环境变量 `VIZDOM_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        Self::from_file_or_default(default_path)
    }

    fn from_file_or_default(path: PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

pub const CONFIG_ENV: &str = "VIZDOM_CONFIG";

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UnitsConfig {
    #[serde(default = "default_true")]
    pub metric: bool,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self { metric: true }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UndoConfig {
    #[serde(default = "UndoConfig::default_max_depth")]
    pub max_depth: usize,
}

impl UndoConfig {
    fn default_max_depth() -> usize {
        50
    }
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
        }
    }
}

/// 拖拽参数。`min_size` 以米为单位。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "InteractionConfig::default_min_size")]
    pub min_size: f64,
    #[serde(default = "default_true")]
    pub snap: bool,
}

impl InteractionConfig {
    fn default_min_size() -> f64 {
        0.01
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_size: Self::default_min_size(),
            snap: true,
        }
    }
}

/// CLI 演示要跑的脚本。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    #[default]
    All,
    Box,
    Cylinder,
    Line,
    Plane,
    Point,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Box,
        Scenario::Cylinder,
        Scenario::Line,
        Scenario::Plane,
        Scenario::Point,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "all" => Some(Scenario::All),
            "box" => Some(Scenario::Box),
            "cylinder" => Some(Scenario::Cylinder),
            "line" => Some(Scenario::Line),
            "plane" => Some(Scenario::Plane),
            "point" => Some(Scenario::Point),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scenario::All => "all",
            Scenario::Box => "box",
            Scenario::Cylinder => "cylinder",
            Scenario::Line => "line",
            Scenario::Plane => "plane",
            Scenario::Point => "point",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default)]
    pub seed_scene: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
