//! 拖拽器：按下时记录原始几何，之后每一帧都从这份快照重新计算，
//! 而不是在上一帧结果上累加。

mod box_dragger;
mod cylinder;
mod plane;
mod translate;

use glam::DVec3;
use vizdom_core::geometry::{EPSILON, Ray};
use vizdom_core::units::{Quantity, UnitSystem};

use crate::changes::Change;
use crate::domain::{DomainObject, DomainObjectId};
use crate::primitives::{PickInfo, Primitive, PrimitiveType};
use crate::scene::Scene;
use crate::transaction::Transaction;

pub use box_dragger::BoxDragger;
pub use cylinder::CylinderDragger;
pub use plane::PlaneDragger;
pub use translate::TranslateDragger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ctrl: false,
        }
    }
}

/// 按下时的拾取信息。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraggerProps {
    pub point: DVec3,
    pub ray: Ray,
    pub pick: PickInfo,
}

impl DraggerProps {
    pub fn new(point: DVec3, ray: Ray, pick: PickInfo) -> Self {
        Self { point, ray, pick }
    }
}

/// 单帧计算所需的外部参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragContext {
    pub unit_system: UnitSystem,
    pub min_size: f64,
    pub snap: bool,
}

impl DragContext {
    pub fn snap_length(&self, value: f64) -> f64 {
        if self.snap {
            self.unit_system.snap(value, Quantity::Length)
        } else {
            value
        }
    }

    pub fn snap_angle(&self, value: f64) -> f64 {
        if self.snap {
            self.unit_system.snap(value, Quantity::Angle)
        } else {
            value
        }
    }

    /// 吸附后再限制最小尺寸。
    pub fn size(&self, value: f64) -> f64 {
        self.snap_length(value).max(self.min_size)
    }
}

#[derive(Debug)]
pub struct DraggerState {
    object: DomainObjectId,
    props: DraggerProps,
    original: Primitive,
    transaction: Option<Transaction>,
    is_changed: bool,
}

impl DraggerState {
    pub fn new(object: &DomainObject, props: DraggerProps) -> Option<Self> {
        Some(Self {
            object: object.id(),
            props,
            original: object.as_primitive()?.clone(),
            transaction: None,
            is_changed: false,
        })
    }

    #[inline]
    pub fn object(&self) -> DomainObjectId {
        self.object
    }

    #[inline]
    pub fn props(&self) -> &DraggerProps {
        &self.props
    }

    /// 按下时的几何快照。
    #[inline]
    pub fn original(&self) -> &Primitive {
        &self.original
    }

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.is_changed
    }
}

pub trait Dragger {
    fn state(&self) -> &DraggerState;

    fn state_mut(&mut self) -> &mut DraggerState;

    /// 由快照与当前射线算出新几何。射线退化（平行等）时返回 `None`，本帧不变。
    fn compute(&self, ray: &Ray, context: &DragContext) -> Option<Primitive>;

    fn object(&self) -> DomainObjectId {
        self.state().object
    }

    fn on_pointer_down(&mut self, scene: &mut Scene) {
        let pick = self.state().props.pick;
        scene.set_focus_interactive(self.object(), pick.focus_type, pick.face);
    }

    fn on_pointer_drag(&mut self, scene: &mut Scene, modifiers: Modifiers, ray: &Ray) -> bool {
        let settings = scene.settings();
        let context = DragContext {
            unit_system: scene.unit_system(),
            min_size: settings.min_size,
            snap: settings.snap && modifiers.shift,
        };
        let Some(primitive) = self.compute(ray, &context) else {
            return false;
        };
        let object = self.object();
        let Some(current) = scene.primitive(object) else {
            return false;
        };
        if current.geometry_eq(&primitive, EPSILON) {
            return false;
        }
        // 事务在第一次真正变化时才创建，此时场景里仍是原始几何
        if self.state().transaction.is_none() {
            self.state_mut().transaction = scene.create_transaction(object, Change::Geometry);
        }
        if !scene.set_primitive(object, primitive) {
            return false;
        }
        self.state_mut().is_changed = true;
        scene.notify(object, Change::Dragging);
        true
    }

    /// 有变化时通知 `Geometry` 并交出事务。
    fn on_pointer_up(&mut self, scene: &mut Scene) -> Option<Transaction> {
        let state = self.state_mut();
        if !state.is_changed {
            return None;
        }
        scene.notify(state.object, Change::Geometry);
        state.transaction.take()
    }
}

impl Scene {
    /// 按图元种类分派拖拽器。创建中的对象不能拖拽。
    pub fn create_dragger(
        &self,
        id: DomainObjectId,
        props: DraggerProps,
    ) -> Option<Box<dyn Dragger>> {
        let object = self.object(id)?;
        if !object.is_legal() {
            return None;
        }
        let state = DraggerState::new(object, props)?;
        let dragger: Box<dyn Dragger> = match state.original.primitive_type() {
            PrimitiveType::Box => Box::new(BoxDragger::new(state)),
            PrimitiveType::HorizontalCircle
            | PrimitiveType::VerticalCylinder
            | PrimitiveType::HorizontalCylinder => Box::new(CylinderDragger::new(state)),
            PrimitiveType::PlaneX
            | PrimitiveType::PlaneY
            | PrimitiveType::PlaneZ
            | PrimitiveType::PlaneXY => Box::new(PlaneDragger::new(state)),
            PrimitiveType::Line
            | PrimitiveType::Polyline
            | PrimitiveType::Polygon
            | PrimitiveType::Point => Box::new(TranslateDragger::new(state)),
        };
        Some(dragger)
    }
}

/// 射线与穿过 `point` 的水平面的交点相对 `point` 的水平位移。
pub(crate) fn horizontal_delta(props: &DraggerProps, ray: &Ray) -> Option<DVec3> {
    let plane = vizdom_core::geometry::Plane::horizontal(props.point.z);
    let hit = ray.intersect_plane(&plane)?;
    Some(hit - props.point)
}

/// 平移快照；吸附时对 x/y 分量分别吸附。
pub(crate) fn translated(
    original: &Primitive,
    delta: DVec3,
    context: &DragContext,
) -> Primitive {
    let delta = DVec3::new(
        context.snap_length(delta.x),
        context.snap_length(delta.y),
        context.snap_length(delta.z),
    );
    let mut primitive = original.clone();
    primitive.translate(delta);
    primitive
}
