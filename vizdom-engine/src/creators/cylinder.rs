use glam::DVec3;
use vizdom_core::geometry::{self, Plane, Ray};

use super::{Creator, CreatorState};
use crate::primitives::{CylinderShape, Primitive, PrimitiveType, Shape};
use crate::scene::Scene;

/// 水平圆（圆心 + 半径点）、竖直圆柱（圆心 + 半径点 + 高度点）
/// 与水平圆柱（轴线两端 + 半径点）。
pub struct CylinderCreator {
    state: CreatorState,
}

impl CylinderCreator {
    pub fn new(scene: &mut Scene, primitive_type: PrimitiveType) -> Self {
        Self {
            state: CreatorState::new(scene, primitive_type),
        }
    }

    fn is_circle(&self) -> bool {
        self.state.primitive_type() == PrimitiveType::HorizontalCircle
    }

    fn is_horizontal(&self) -> bool {
        self.state.primitive_type() == PrimitiveType::HorizontalCylinder
    }
}

impl Creator for CylinderCreator {
    fn state(&self) -> &CreatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CreatorState {
        &mut self.state
    }

    fn minimum_point_count(&self) -> usize {
        if self.is_circle() { 2 } else { 3 }
    }

    fn maximum_point_count(&self) -> usize {
        self.minimum_point_count()
    }

    fn point_from(&self, ray: &Ray, intersection: Option<DVec3>) -> Option<DVec3> {
        let committed = self.state.committed();
        match committed.len() {
            0 => intersection,
            1 => {
                let base = Plane::horizontal(committed[0].z);
                match intersection {
                    Some(point) => Some(base.project_point(point)),
                    None => ray.intersect_plane(&base),
                }
            }
            _ => {
                let anchor = if self.is_horizontal() {
                    committed[1]
                } else {
                    committed[0]
                };
                intersection.or_else(|| ray.closest_point_on_line(anchor, DVec3::Z))
            }
        }
    }

    fn build(&self, _scene: &Scene, points: &[DVec3], _ray: &Ray) -> Option<Primitive> {
        let first = *points.first()?;
        let shape = if self.is_horizontal() {
            let second = points.get(1).copied().unwrap_or(first);
            let radius = points.get(2).map_or(0.0, |third| {
                let offset = *third - first;
                match (second - first).try_normalize() {
                    Some(axis) => (offset - axis * offset.dot(axis)).length(),
                    None => offset.length(),
                }
            });
            CylinderShape::new(first, second, radius)
        } else {
            let radius = points
                .get(1)
                .map_or(0.0, |second| geometry::horizontal(*second - first).length());
            let height = points.get(2).map_or(0.0, |third| third.z - first.z);
            CylinderShape::new(first, first + DVec3::Z * height, radius)
        };
        Primitive::with_shape(self.state.primitive_type(), Shape::Cylinder(shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(scene: &mut Scene, creator: &mut CylinderCreator, point: DVec3) -> bool {
        creator.add_point(scene, &Ray::looking_down_at(point), Some(point), false)
    }

    fn cylinder(scene: &Scene, creator: &CylinderCreator) -> Option<CylinderShape> {
        scene
            .primitive(creator.object())
            .and_then(Primitive::as_cylinder)
            .copied()
    }

    #[test]
    fn circle_finishes_after_two_points() {
        let mut scene = Scene::headless();
        let mut creator = CylinderCreator::new(&mut scene, PrimitiveType::HorizontalCircle);
        assert!(click(&mut scene, &mut creator, DVec3::new(1.0, 1.0, 0.5)));
        assert!(click(&mut scene, &mut creator, DVec3::new(1.0, 3.0, 0.5)));
        assert!(creator.is_finished());
        let shape = cylinder(&scene, &creator).expect("circle");
        assert!((shape.radius - 2.0).abs() < 1e-9);
        assert!(shape.height() < 1e-9);
    }

    #[test]
    fn vertical_cylinder_takes_height_from_third_point() {
        let mut scene = Scene::headless();
        let mut creator = CylinderCreator::new(&mut scene, PrimitiveType::VerticalCylinder);
        assert!(click(&mut scene, &mut creator, DVec3::ZERO));
        assert!(click(&mut scene, &mut creator, DVec3::X));
        assert!(!creator.is_finished());
        let ray = Ray::new(DVec3::new(4.0, 0.0, 3.0), DVec3::NEG_X);
        assert!(creator.add_point(&mut scene, &ray, None, false));
        assert!(creator.is_finished());
        let shape = cylinder(&scene, &creator).expect("cylinder");
        assert!((shape.radius - 1.0).abs() < 1e-9);
        assert!((shape.height() - 3.0).abs() < 1e-9);
        assert!(shape.axis().abs_diff_eq(DVec3::Z, 1e-9));
    }

    #[test]
    fn horizontal_cylinder_radius_is_distance_to_axis() {
        let mut scene = Scene::headless();
        let mut creator = CylinderCreator::new(&mut scene, PrimitiveType::HorizontalCylinder);
        assert!(click(&mut scene, &mut creator, DVec3::ZERO));
        assert!(click(&mut scene, &mut creator, DVec3::new(4.0, 0.0, 0.0)));
        assert!(click(&mut scene, &mut creator, DVec3::new(2.0, 0.5, 0.0)));
        let shape = cylinder(&scene, &creator).expect("cylinder");
        assert!((shape.radius - 0.5).abs() < 1e-9);
        assert!((shape.height() - 4.0).abs() < 1e-9);
    }
}
