//! 创建器：把一串点击/悬停点转成图元几何。
//!
//! 点列表末尾最多有一个“悬停点”（预览），新的悬停点会替换它；
//! 每次成功加点都根据完整点列表重建几何，而不是增量修改。

mod box_creator;
mod cylinder;
mod line;
mod plane;
mod point;

use glam::DVec3;
use tracing::debug;
use vizdom_core::geometry::{EPSILON, Ray};

use crate::changes::Change;
use crate::domain::{DomainObject, DomainObjectId, FocusType};
use crate::primitives::{Primitive, PrimitiveType};
use crate::scene::Scene;

pub use box_creator::BoxCreator;
pub use cylinder::CylinderCreator;
pub use line::LineCreator;
pub use plane::PlaneCreator;
pub use point::PointCreator;

/// 按下 Esc 后调用方该怎么处理这次创建。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorEscape {
    /// 对象已经完整，保留。
    Finished,
    /// 点数不足，对象连同事务一起丢弃。
    Discard,
}

#[derive(Debug, Clone)]
pub struct CreatorState {
    object: DomainObjectId,
    primitive_type: PrimitiveType,
    points: Vec<DVec3>,
    last_is_pending: bool,
    last_ray: Option<Ray>,
    finished: bool,
}

impl CreatorState {
    /// 在场景中放入一个处于 `Pending` 的游离图元。
    pub fn new(scene: &mut Scene, primitive_type: PrimitiveType) -> Self {
        let mut object = DomainObject::primitive(Primitive::new(primitive_type));
        object.focus_type = FocusType::Pending;
        let object = scene.insert(object);
        Self {
            object,
            primitive_type,
            points: Vec::new(),
            last_is_pending: false,
            last_ray: None,
            finished: false,
        }
    }

    #[inline]
    pub fn object(&self) -> DomainObjectId {
        self.object
    }

    #[inline]
    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive_type
    }

    /// 含末尾悬停点在内的全部点。
    #[inline]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// 已确认的点（不含悬停点）。
    pub fn committed(&self) -> &[DVec3] {
        if self.last_is_pending {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    #[inline]
    pub fn committed_count(&self) -> usize {
        self.committed().len()
    }

    #[inline]
    pub fn has_pending_point(&self) -> bool {
        self.last_is_pending
    }
}

pub trait Creator {
    fn state(&self) -> &CreatorState;

    fn state_mut(&mut self) -> &mut CreatorState;

    fn minimum_point_count(&self) -> usize;

    /// 无上限时返回 `usize::MAX`。
    fn maximum_point_count(&self) -> usize;

    /// 为 true 时第一个点必须落在表面上。
    fn prefer_intersection(&self) -> bool {
        true
    }

    /// 由射线与可选的表面交点算出下一个点；`state().committed()` 是已确认的点。
    fn point_from(&self, ray: &Ray, intersection: Option<DVec3>) -> Option<DVec3>;

    /// 由完整点列表重建几何。
    fn build(&self, scene: &Scene, points: &[DVec3], ray: &Ray) -> Option<Primitive>;

    fn object(&self) -> DomainObjectId {
        self.state().object
    }

    fn is_finished(&self) -> bool {
        self.state().finished
    }

    fn add_point(
        &mut self,
        scene: &mut Scene,
        ray: &Ray,
        intersection: Option<DVec3>,
        is_pending: bool,
    ) -> bool {
        let state = self.state();
        if state.finished {
            return false;
        }
        let committed = state.committed_count();
        let maximum = self.maximum_point_count();
        if committed >= maximum {
            return false;
        }
        if self.prefer_intersection() && intersection.is_none() && committed == 0 {
            return false;
        }
        let point = match self.point_from(ray, intersection) {
            Some(point)
                if !state
                    .committed()
                    .last()
                    .is_some_and(|last| last.distance(point) < EPSILON) =>
            {
                point
            }
            _ => {
                // 旧悬停点已不对应当前指针位置
                if is_pending {
                    self.drop_pending_point(scene);
                }
                return false;
            }
        };
        let state = self.state();
        let mut points = state.committed().to_vec();
        points.push(point);
        let Some(primitive) = self.build(scene, &points, ray) else {
            return false;
        };
        let object = state.object;
        if !scene.set_primitive(object, primitive) {
            return false;
        }

        let state = self.state_mut();
        state.points = points;
        state.last_is_pending = is_pending;
        state.last_ray = Some(*ray);
        scene.notify(object, Change::Geometry);

        if !is_pending && state.points.len() >= maximum {
            state.finished = true;
            scene.set_focus_interactive(object, FocusType::Focus, None);
            debug!(id = object.get(), points = maximum, "创建完成");
        }
        true
    }

    /// 去掉末尾的悬停点，并按已确认的点重建几何。
    fn drop_pending_point(&mut self, scene: &mut Scene) {
        let state = self.state_mut();
        if !state.last_is_pending {
            return;
        }
        state.points.pop();
        state.last_is_pending = false;
        let object = state.object;
        let points = state.points.clone();
        let Some(ray) = state.last_ray else {
            return;
        };
        if points.is_empty() {
            return;
        }
        if let Some(primitive) = self.build(scene, &points, &ray) {
            if scene.set_primitive(object, primitive) {
                scene.notify(object, Change::Geometry);
            }
        }
    }

    fn handle_escape(&mut self, scene: &mut Scene) -> CreatorEscape {
        if self.state().finished {
            return CreatorEscape::Finished;
        }
        let minimum = self.minimum_point_count().max(1);
        let state = self.state_mut();
        if state.last_is_pending {
            state.points.pop();
            state.last_is_pending = false;
        }
        let count = state.points.len();
        let object = state.object;
        let ray = match state.last_ray {
            Some(ray) if count >= minimum => ray,
            _ => {
                debug!(id = object.get(), points = count, "点数不足，放弃创建");
                return CreatorEscape::Discard;
            }
        };
        let points = state.points.clone();
        let Some(primitive) = self.build(scene, &points, &ray) else {
            return CreatorEscape::Discard;
        };
        scene.set_primitive(object, primitive);
        scene.notify(object, Change::Geometry);
        self.state_mut().finished = true;
        scene.set_focus_interactive(object, FocusType::Focus, None);
        debug!(id = object.get(), points = count, "创建完成");
        CreatorEscape::Finished
    }
}

/// 为给定种类创建对应的创建器，并在场景里放入其目标对象。
pub fn create_creator(scene: &mut Scene, primitive_type: PrimitiveType) -> Box<dyn Creator> {
    match primitive_type {
        PrimitiveType::Line | PrimitiveType::Polyline | PrimitiveType::Polygon => {
            Box::new(LineCreator::new(scene, primitive_type))
        }
        PrimitiveType::Box => Box::new(BoxCreator::new(scene)),
        PrimitiveType::HorizontalCircle
        | PrimitiveType::VerticalCylinder
        | PrimitiveType::HorizontalCylinder => Box::new(CylinderCreator::new(scene, primitive_type)),
        PrimitiveType::PlaneX
        | PrimitiveType::PlaneY
        | PrimitiveType::PlaneZ
        | PrimitiveType::PlaneXY => Box::new(PlaneCreator::new(scene, primitive_type)),
        PrimitiveType::Point => Box::new(PointCreator::new(scene)),
    }
}
