use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use vizdom_core::geometry::Plane;
use vizdom_core::units::UnitSystem;

use crate::changes::{Change, DomainObjectChange};
use crate::domain::{DomainObject, DomainObjectId};
use crate::views::View;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(u64);

impl RenderTargetId {
    pub fn next() -> Self {
        Self(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorKind {
    #[default]
    Default,
    Navigate,
    Move,
    Resize,
    Grab,
    Crosshair,
}

/// 外部渲染引擎的抽象：单位制、全局剖切、光标、重绘请求与视图工厂。
pub trait RenderTarget {
    fn id(&self) -> RenderTargetId;

    fn unit_system(&self) -> UnitSystem;

    fn unit_system_mut(&mut self) -> &mut UnitSystem;

    fn is_global_clipping_active(&self) -> bool;

    fn global_clipping(&self) -> &[Plane];

    fn set_global_clipping(&mut self, planes: Vec<Plane>);

    fn cursor(&self) -> CursorKind;

    fn set_cursor(&mut self, cursor: CursorKind);

    fn set_default_cursor(&mut self) {
        self.set_cursor(CursorKind::Default);
    }

    fn set_navigate_cursor(&mut self) {
        self.set_cursor(CursorKind::Navigate);
    }

    fn set_move_cursor(&mut self) {
        self.set_cursor(CursorKind::Move);
    }

    fn set_resize_cursor(&mut self) {
        self.set_cursor(CursorKind::Resize);
    }

    fn set_grab_cursor(&mut self) {
        self.set_cursor(CursorKind::Grab);
    }

    /// 请求重绘。
    fn invalidate(&mut self);

    /// 为对象创建一个新视图；不支持的对象返回 `None`。
    fn create_view(&mut self, object: &DomainObject) -> Option<Box<dyn View>>;

    fn as_any(&self) -> &dyn Any;
}

/// 视图事件日志，供 CLI 与测试观察通知顺序。
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Attached(DomainObjectId),
    Updated(DomainObjectId, Vec<Change>),
    Disposed(DomainObjectId),
}

pub type ViewLog = Rc<RefCell<Vec<ViewEvent>>>;

/// 进程内渲染目标：不绘制任何东西，只记录状态。
#[derive(Debug)]
pub struct HeadlessRenderTarget {
    id: RenderTargetId,
    unit_system: UnitSystem,
    clipping: Vec<Plane>,
    cursor: CursorKind,
    invalidations: usize,
    created_views: usize,
    log: ViewLog,
}

impl HeadlessRenderTarget {
    pub fn new(unit_system: UnitSystem) -> Self {
        Self {
            id: RenderTargetId::next(),
            unit_system,
            clipping: Vec::new(),
            cursor: CursorKind::Default,
            invalidations: 0,
            created_views: 0,
            log: ViewLog::default(),
        }
    }

    #[inline]
    pub fn invalidations(&self) -> usize {
        self.invalidations
    }

    #[inline]
    pub fn created_views(&self) -> usize {
        self.created_views
    }

    pub fn log(&self) -> ViewLog {
        Rc::clone(&self.log)
    }
}

impl Default for HeadlessRenderTarget {
    fn default() -> Self {
        Self::new(UnitSystem::metric())
    }
}

impl RenderTarget for HeadlessRenderTarget {
    fn id(&self) -> RenderTargetId {
        self.id
    }

    fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    fn unit_system_mut(&mut self) -> &mut UnitSystem {
        &mut self.unit_system
    }

    fn is_global_clipping_active(&self) -> bool {
        !self.clipping.is_empty()
    }

    fn global_clipping(&self) -> &[Plane] {
        &self.clipping
    }

    fn set_global_clipping(&mut self, planes: Vec<Plane>) {
        self.clipping = planes;
    }

    fn cursor(&self) -> CursorKind {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: CursorKind) {
        self.cursor = cursor;
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }

    fn create_view(&mut self, object: &DomainObject) -> Option<Box<dyn View>> {
        if !object.can_create_view() {
            return None;
        }
        self.created_views += 1;
        Some(Box::new(RecordingView {
            target: self.id,
            object: object.id(),
            log: Rc::clone(&self.log),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 无头渲染目标创建的视图，把收到的事件写入共享日志。
pub struct RecordingView {
    target: RenderTargetId,
    object: DomainObjectId,
    log: ViewLog,
}

impl View for RecordingView {
    fn target(&self) -> Option<RenderTargetId> {
        Some(self.target)
    }

    fn attach(&mut self, object: &DomainObject) {
        self.object = object.id();
        self.log.borrow_mut().push(ViewEvent::Attached(self.object));
    }

    fn update(&mut self, object: &DomainObject, change: &DomainObjectChange) {
        self.log
            .borrow_mut()
            .push(ViewEvent::Updated(object.id(), change.changes().collect()));
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().push(ViewEvent::Disposed(self.object));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
