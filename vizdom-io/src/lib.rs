//! 场景种子文件：以 JSON 保存与加载根节点下的图元。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use vizdom_core::colors::Color;
use vizdom_engine::primitives::Primitive;
use vizdom_engine::{DomainObject, DomainObjectId, Scene};

pub const SCENE_FILE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scene json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported scene file version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid scene: {0}")]
    InvalidScene(String),
}

/// 磁盘上的场景文件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub version: u32,
    #[serde(default)]
    pub objects: Vec<PrimitiveRecord>,
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            version: SCENE_FILE_VERSION,
            objects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub primitive: Primitive,
}

impl PrimitiveRecord {
    pub fn new(primitive: Primitive) -> Self {
        Self {
            name: None,
            color: None,
            visible: true,
            primitive,
        }
    }
}

fn default_visible() -> bool {
    true
}

pub trait SceneLoader {
    fn load(&self, path: &Path) -> Result<SceneFile, IoError>;
}

pub trait SceneSaver {
    fn save(&self, file: &SceneFile, path: &Path) -> Result<(), IoError>;
}

pub struct JsonFacade;

impl JsonFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, data: &str) -> Result<SceneFile, IoError> {
        let file: SceneFile = serde_json::from_str(data)?;
        if file.version != SCENE_FILE_VERSION {
            return Err(IoError::UnsupportedVersion(file.version));
        }
        Ok(file)
    }

    pub fn to_string(&self, file: &SceneFile) -> Result<String, IoError> {
        Ok(serde_json::to_string_pretty(file)?)
    }
}

impl Default for JsonFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<SceneFile, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let file = self.parse(&data)?;
        debug!(path = %path.display(), objects = file.objects.len(), "读取场景文件");
        Ok(file)
    }
}

impl SceneSaver for JsonFacade {
    fn save(&self, file: &SceneFile, path: &Path) -> Result<(), IoError> {
        let data = self.to_string(file)?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), objects = file.objects.len(), "写入场景文件");
        Ok(())
    }
}

/// 把文件中的图元挂到场景根节点下。
///
/// 先整体校验，任何一条记录的种类与几何不匹配都会让整个文件被拒绝，
/// 场景保持不变。
pub fn populate(scene: &mut Scene, file: &SceneFile) -> Result<Vec<DomainObjectId>, IoError> {
    for (index, record) in file.objects.iter().enumerate() {
        let primitive = &record.primitive;
        if Primitive::with_shape(primitive.primitive_type(), primitive.shape().clone()).is_none() {
            return Err(IoError::InvalidScene(format!(
                "record {index}: {:?} does not match its geometry",
                primitive.primitive_type()
            )));
        }
    }

    let root = scene.root();
    let mut ids = Vec::with_capacity(file.objects.len());
    for record in &file.objects {
        let mut object = DomainObject::primitive(record.primitive.clone());
        if let Some(name) = &record.name {
            object.set_name(name.clone());
        }
        if let Some(color) = record.color {
            object.set_color(color);
        }
        let id = scene.insert(object);
        if !scene.add_child_interactive(root, id) {
            warn!(id = id.get(), "无法挂载种子图元");
            continue;
        }
        if record.visible {
            scene.set_visible_interactive(id, true);
        }
        ids.push(id);
    }
    info!(count = ids.len(), "场景种子已加载");
    Ok(ids)
}

/// 收集根节点下所有合法图元。创建中的图元不会写出。
pub fn capture(scene: &Scene) -> SceneFile {
    let objects = scene
        .descendants(scene.root())
        .into_iter()
        .filter_map(|id| {
            let object = scene.object(id)?;
            let primitive = object.as_primitive()?;
            if !object.is_legal() {
                return None;
            }
            Some(PrimitiveRecord {
                name: object.has_name().then(|| object.name().to_string()),
                color: Some(object.color()),
                visible: scene.is_visible(id),
                primitive: primitive.clone(),
            })
        })
        .collect();
    SceneFile {
        version: SCENE_FILE_VERSION,
        objects,
    }
}

/// 读取文件并填充场景。
pub fn load_into(
    loader: &impl SceneLoader,
    scene: &mut Scene,
    path: &Path,
) -> Result<Vec<DomainObjectId>, IoError> {
    let file = loader.load(path)?;
    populate(scene, &file)
}
