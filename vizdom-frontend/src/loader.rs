use std::env;
use std::path::PathBuf;

use tracing::{info, warn};
use vizdom_config::AppConfig;
use vizdom_engine::{DomainObjectId, InteractionSettings, Scene};
use vizdom_io::{JsonFacade, load_into};

/// 覆盖配置中 `seed_scene` 的环境变量。
pub const SEED_ENV: &str = "VIZDOM_SEED_SCENE";

/// 场景来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq)]
pub enum SceneSource {
    Seed(PathBuf),
    Empty,
}

/// 统一封装加载后的场景与元信息。
pub struct LoadedScene {
    pub scene: Scene,
    pub source: SceneSource,
    pub seeded: Vec<DomainObjectId>,
}

/// 按配置创建空场景：单位制、撤销深度与拖拽参数。
pub fn configured_scene(config: &AppConfig) -> Scene {
    let mut scene = Scene::headless();
    if scene.unit_system().is_metric() != config.units.metric {
        scene.toggle_units();
    }
    scene
        .undo_manager_mut()
        .set_max_depth(config.undo.max_depth);
    scene.set_settings(InteractionSettings {
        min_size: config.interaction.min_size,
        snap: config.interaction.snap,
    });
    scene
}

/// 环境变量 `VIZDOM_SEED_SCENE` 优先于配置中的 `seed_scene`。
pub fn load_scene(config: &AppConfig) -> LoadedScene {
    let seed = env::var_os(SEED_ENV)
        .map(PathBuf::from)
        .or_else(|| config.frontend.seed_scene.clone());
    load_scene_from(config, seed)
}

/// 种子文件加载失败时回退到空场景。
pub fn load_scene_from(config: &AppConfig, seed: Option<PathBuf>) -> LoadedScene {
    let mut scene = configured_scene(config);
    if let Some(path) = seed {
        match load_into(&JsonFacade::new(), &mut scene, &path) {
            Ok(seeded) => {
                info!(path = %path.display(), count = seeded.len(), "从种子文件加载场景成功");
                return LoadedScene {
                    scene,
                    source: SceneSource::Seed(path),
                    seeded,
                };
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载种子文件失败，使用空场景");
                scene = configured_scene(config);
            }
        }
    }
    LoadedScene {
        scene,
        source: SceneSource::Empty,
        seeded: Vec::new(),
    }
}
