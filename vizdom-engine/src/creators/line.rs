use glam::DVec3;
use vizdom_core::geometry::Ray;

use super::{Creator, CreatorState};
use crate::primitives::{Primitive, PrimitiveType, Shape};
use crate::scene::Scene;

/// 线段（2 点）、折线（2 点起）与多边形（3 点起）。
/// 第一个点之后允许在空中取点：取射线上离上一个点最近的位置。
pub struct LineCreator {
    state: CreatorState,
}

impl LineCreator {
    pub fn new(scene: &mut Scene, primitive_type: PrimitiveType) -> Self {
        Self {
            state: CreatorState::new(scene, primitive_type),
        }
    }
}

impl Creator for LineCreator {
    fn state(&self) -> &CreatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CreatorState {
        &mut self.state
    }

    fn minimum_point_count(&self) -> usize {
        match self.state.primitive_type() {
            PrimitiveType::Polygon => 3,
            _ => 2,
        }
    }

    fn maximum_point_count(&self) -> usize {
        match self.state.primitive_type() {
            PrimitiveType::Line => 2,
            _ => usize::MAX,
        }
    }

    fn point_from(&self, ray: &Ray, intersection: Option<DVec3>) -> Option<DVec3> {
        if intersection.is_some() {
            return intersection;
        }
        let last = self.state.committed().last()?;
        Some(ray.closest_point_to_point(*last))
    }

    fn build(&self, _scene: &Scene, points: &[DVec3], _ray: &Ray) -> Option<Primitive> {
        Primitive::with_shape(self.state.primitive_type(), Shape::Line(points.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_point_projects_onto_ray() {
        let mut scene = Scene::headless();
        let mut creator = LineCreator::new(&mut scene, PrimitiveType::Line);
        let start = DVec3::ZERO;
        assert!(creator.add_point(&mut scene, &Ray::looking_down_at(start), Some(start), false));

        let ray = Ray::new(DVec3::new(2.0, -5.0, 0.0), DVec3::Y);
        assert!(creator.add_point(&mut scene, &ray, None, false));
        assert!(creator.is_finished());
        let points = scene
            .primitive(creator.object())
            .and_then(Primitive::as_line)
            .map(<[DVec3]>::to_vec)
            .unwrap_or_default();
        assert_eq!(points.len(), 2);
        assert!(points[1].abs_diff_eq(DVec3::new(2.0, 0.0, 0.0), 1e-9));
    }
}
