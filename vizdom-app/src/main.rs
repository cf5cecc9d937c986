use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use vizdom_config::{AppConfig, ConfigError, Scenario};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut scenario_override: Option<Scenario> = None;
    let mut config_override: Option<PathBuf> = None;
    let mut seed_override: Option<PathBuf> = None;
    let mut imperial = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--imperial" => imperial = true,
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--seed" => {
                let Some(path) = args.next() else {
                    eprintln!("`--seed` 需要提供场景文件路径");
                    std::process::exit(1);
                };
                seed_override = Some(PathBuf::from(path));
            }
            "--scenario" => {
                let Some(name) = args.next() else {
                    eprintln!("`--scenario` 需要提供脚本名称");
                    std::process::exit(1);
                };
                let Some(scenario) = Scenario::from_name(&name) else {
                    eprintln!("未知脚本：{name}（可选 all, box, cylinder, line, plane, point）");
                    std::process::exit(1);
                };
                scenario_override = Some(scenario);
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let mut config = load_configuration(config_override);
    if imperial {
        config.units.metric = false;
    }
    if seed_override.is_some() {
        config.frontend.seed_scene = seed_override;
    }
    init_logging(&config);
    info!("启动 Vizdom 应用");

    let scenario = scenario_override.unwrap_or(config.frontend.scenario);
    if let Err(err) = vizdom_frontend::run_cli_demo(&config, scenario) {
        error!(error = %err, "执行 CLI 演示失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
