use vizdom_core::geometry::{Plane, Ray};

use super::{DragContext, Dragger, DraggerState};
use crate::primitives::{Primitive, Shape};

/// 平面沿法向平移。吸附作用在平面到原点的距离上。
pub struct PlaneDragger {
    state: DraggerState,
}

impl PlaneDragger {
    pub fn new(state: DraggerState) -> Self {
        Self { state }
    }
}

impl Dragger for PlaneDragger {
    fn state(&self) -> &DraggerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DraggerState {
        &mut self.state
    }

    fn compute(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        let original = self.state.original();
        let plane = *original.as_plane()?;
        let props = self.state.props();
        let hit = ray.closest_point_on_line(props.point, plane.normal)?;
        let distance = (hit - props.point).dot(plane.normal);
        let offset = context.snap_length(-(plane.constant - distance));
        let moved = Plane::new(plane.normal, -offset);
        Primitive::with_shape(original.primitive_type(), Shape::Plane(moved))
    }
}
