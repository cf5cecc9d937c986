use vizdom_core::geometry::{Plane, Ray};

use super::{DragContext, Dragger, DraggerState, horizontal_delta, translated};
use crate::domain::FocusType;
use crate::primitives::{CylinderShape, Primitive, PrimitiveType, Shape};

/// 圆柱与水平圆：整体平移、沿轴拉端面、拉侧面改半径。
/// 水平圆没有高度，拉任何面都只改半径。
pub struct CylinderDragger {
    state: DraggerState,
}

impl CylinderDragger {
    pub fn new(state: DraggerState) -> Self {
        Self { state }
    }

    fn with_shape(&self, shape: CylinderShape) -> Option<Primitive> {
        Primitive::with_shape(self.state.original().primitive_type(), Shape::Cylinder(shape))
    }

    fn move_cap(&self, ray: &Ray, context: &DragContext, top: bool) -> Option<Primitive> {
        let original = *self.state.original().as_cylinder()?;
        let props = self.state.props();
        let axis = original.axis();
        let direction = if top { axis } else { -axis };
        let hit = ray.closest_point_on_line(props.point, direction)?;
        let delta = (hit - props.point).dot(direction);
        let height = context.size(original.height() + delta);

        let mut shape = original;
        if top {
            shape.center_b = original.center_a + axis * height;
        } else {
            shape.center_a = original.center_b - axis * height;
        }
        self.with_shape(shape)
    }

    fn change_radius(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        let original = *self.state.original().as_cylinder()?;
        let props = self.state.props();
        let plane = Plane::from_normal_and_point(original.axis(), props.point);
        let hit = ray.intersect_plane(&plane)?;
        let radius = context.size(hit.distance(original.closest_point_on_axis(hit)));
        self.with_shape(CylinderShape::new(original.center_a, original.center_b, radius))
    }
}

impl Dragger for CylinderDragger {
    fn state(&self) -> &DraggerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DraggerState {
        &mut self.state
    }

    fn compute(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        let props = self.state.props();
        let is_circle = self.state.original().primitive_type() == PrimitiveType::HorizontalCircle;
        match (props.pick.focus_type, props.pick.face) {
            (FocusType::Face, Some(_)) if is_circle => self.change_radius(ray, context),
            (FocusType::Face, Some(face)) if face.index() == CylinderShape::TOP_FACE => {
                self.move_cap(ray, context, true)
            }
            (FocusType::Face, Some(face)) if face.index() == CylinderShape::BOTTOM_FACE => {
                self.move_cap(ray, context, false)
            }
            (FocusType::Face, Some(_)) => self.change_radius(ray, context),
            _ => {
                let delta = horizontal_delta(props, ray)?;
                Some(translated(self.state.original(), delta, context))
            }
        }
    }
}
