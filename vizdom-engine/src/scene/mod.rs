//! 场景：领域对象的扁平存储（以 id 为键）加上树结构、渲染目标与撤销栈。
//!
//! 方法按职责拆在几个文件里：`tree`（结构与遍历）、`interactive`
//! （可见性/选中/焦点等带通知的设置器）、`history`（事务与撤销）、
//! `display`（命名、颜色、渲染样式与面板）。

mod display;
mod history;
mod interactive;
mod tree;

use std::collections::HashMap;

use tracing::{trace, warn};
use vizdom_core::colors::ColorPalette;
use vizdom_core::units::UnitSystem;

use crate::changes::{Change, DomainObjectChange};
use crate::domain::{DomainKind, DomainObject, DomainObjectId};
use crate::errors::EngineError;
use crate::observable::Observable;
use crate::primitives::{Primitive, PrimitiveType};
use crate::render::{HeadlessRenderTarget, RenderTarget};
use crate::undo::UndoManager;

const DEFAULT_MIN_SIZE: f64 = 0.01;

/// 交互参数：拖拽时的最小尺寸，以及是否允许按住 shift 吸附。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSettings {
    pub min_size: f64,
    pub snap: bool,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            snap: true,
        }
    }
}

pub struct Scene {
    objects: HashMap<DomainObjectId, DomainObject>,
    root: DomainObjectId,
    render_target: Box<dyn RenderTarget>,
    palette: ColorPalette,
    settings: InteractionSettings,
    undo: UndoManager,
    units: Observable<UnitSystem>,
}

impl Scene {
    pub fn new(render_target: Box<dyn RenderTarget>) -> Self {
        let root = DomainObject::new(DomainKind::Root);
        let root_id = root.id();
        let units = Observable::new(render_target.unit_system());
        let mut objects = HashMap::new();
        objects.insert(root_id, root);
        Self {
            objects,
            root: root_id,
            render_target,
            palette: ColorPalette::new(),
            settings: InteractionSettings::default(),
            undo: UndoManager::default(),
            units,
        }
    }

    /// 使用无头渲染目标构建场景，CLI 与测试使用。
    pub fn headless() -> Self {
        Self::new(Box::new(HeadlessRenderTarget::default()))
    }

    #[inline]
    pub fn root(&self) -> DomainObjectId {
        self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.len() <= 1
    }

    #[inline]
    pub fn contains(&self, id: DomainObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    #[inline]
    pub fn object(&self, id: DomainObjectId) -> Option<&DomainObject> {
        self.objects.get(&id)
    }

    /// 直接修改字段不会触发通知，调用方需要自行 `notify`。
    #[inline]
    pub fn object_mut(&mut self, id: DomainObjectId) -> Option<&mut DomainObject> {
        self.objects.get_mut(&id)
    }

    pub fn primitive(&self, id: DomainObjectId) -> Option<&Primitive> {
        self.objects.get(&id).and_then(DomainObject::as_primitive)
    }

    /// 替换几何但不通知。
    pub fn set_primitive(&mut self, id: DomainObjectId, primitive: Primitive) -> bool {
        self.objects
            .get_mut(&id)
            .is_some_and(|object| object.set_primitive(primitive))
    }

    #[inline]
    pub fn render_target(&self) -> &dyn RenderTarget {
        self.render_target.as_ref()
    }

    #[inline]
    pub fn render_target_mut(&mut self) -> &mut dyn RenderTarget {
        self.render_target.as_mut()
    }

    pub fn headless_target(&self) -> Option<&HeadlessRenderTarget> {
        self.render_target
            .as_any()
            .downcast_ref::<HeadlessRenderTarget>()
    }

    #[inline]
    pub fn unit_system(&self) -> UnitSystem {
        self.render_target.unit_system()
    }

    /// 单位制信号，对象可以通过 `DomainObject::add_effect` 订阅。
    #[inline]
    pub fn units_signal(&self) -> &Observable<UnitSystem> {
        &self.units
    }

    /// 在公制与英制之间切换，并向整棵树广播 `Unit`。
    pub fn toggle_units(&mut self) -> UnitSystem {
        self.render_target.unit_system_mut().toggle();
        let units = self.render_target.unit_system();
        self.units.set(units);
        for id in self.this_and_descendants(self.root) {
            self.notify(id, Change::Unit);
        }
        units
    }

    #[inline]
    pub fn settings(&self) -> InteractionSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: InteractionSettings) {
        self.settings = settings;
    }

    /// 放入一个游离对象（尚无父节点）。id 冲突时返回错误。
    pub fn try_insert(&mut self, object: DomainObject) -> Result<DomainObjectId, EngineError> {
        if self.objects.contains_key(&object.id()) {
            return Err(EngineError::DuplicateId(object.id().get()));
        }
        Ok(self.store(object))
    }

    /// 与 `try_insert` 相同，但 id 冲突时分配新 id。
    pub fn insert(&mut self, mut object: DomainObject) -> DomainObjectId {
        if self.objects.contains_key(&object.id()) {
            warn!(id = object.id().get(), "对象 id 已存在，重新分配");
            object.id = DomainObjectId::next();
        }
        self.store(object)
    }

    fn store(&mut self, mut object: DomainObject) -> DomainObjectId {
        let id = object.id();
        object.parent = None;
        object.children.clear();
        if object.color.is_none() && object.can_change_color() {
            object.color = Some(self.palette.next_color());
        }
        self.objects.insert(id, object);
        id
    }

    /// 同步通知：先视图（按挂载顺序），再监听器。未知 id 或已释放的对象静默忽略。
    pub fn notify(&mut self, id: DomainObjectId, change: impl Into<DomainObjectChange>) {
        let change = change.into();
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        if object.is_disposed {
            return;
        }
        trace!(id = id.get(), change = ?change, "notify");

        // 回调期间视图集合被取出，视图拿到的是只读对象，无法重入修改
        let mut views = std::mem::take(&mut object.views);
        views.notify(object, &change);
        object.views = views;

        let is_style_root = object.is_render_style_root();
        let is_plane = object
            .primitive_type()
            .is_some_and(PrimitiveType::is_plane);

        if is_style_root {
            if let Some(description) = change.description(Change::RenderStyle).cloned() {
                for descendant in self.descendants(id) {
                    self.notify(
                        descendant,
                        DomainObjectChange::from_description(description.clone()),
                    );
                }
            }
        }
        if is_plane
            && change.is_changed(&[
                Change::Geometry,
                Change::Dragging,
                Change::VisibleState,
                Change::Focus,
            ])
        {
            self.update_global_clipping();
        }
        self.render_target.invalidate();
    }

    #[inline]
    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    #[inline]
    pub fn undo_manager_mut(&mut self) -> &mut UndoManager {
        &mut self.undo
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::headless()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("root", &self.root)
            .field("objects", &self.objects.len())
            .field("settings", &self.settings)
            .field("undo", &self.undo)
            .finish()
    }
}
