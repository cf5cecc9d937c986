use glam::DVec3;
use vizdom_core::geometry::Ray;

use super::{Creator, CreatorState};
use crate::primitives::{Primitive, PrimitiveType, Shape};
use crate::scene::Scene;

pub struct PointCreator {
    state: CreatorState,
}

impl PointCreator {
    pub fn new(scene: &mut Scene) -> Self {
        Self {
            state: CreatorState::new(scene, PrimitiveType::Point),
        }
    }
}

impl Creator for PointCreator {
    fn state(&self) -> &CreatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CreatorState {
        &mut self.state
    }

    fn minimum_point_count(&self) -> usize {
        1
    }

    fn maximum_point_count(&self) -> usize {
        1
    }

    fn point_from(&self, _ray: &Ray, intersection: Option<DVec3>) -> Option<DVec3> {
        intersection
    }

    fn build(&self, _scene: &Scene, points: &[DVec3], _ray: &Ray) -> Option<Primitive> {
        let point = points.last()?;
        Primitive::with_shape(PrimitiveType::Point, Shape::Point(*point))
    }
}
