use glam::DVec3;
use vizdom_core::geometry::{self, EPSILON, Plane, Ray};

use super::{Creator, CreatorState};
use crate::domain::{DomainObjectId, DomainType};
use crate::primitives::{Primitive, PrimitiveType, Shape};
use crate::scene::Scene;

/// 轴向平面（X/Y/Z，一个点）与竖直平面（两个点确定水平方向）。
/// 法向朝向观察者，并与场景中第一个同类平面保持一致。
pub struct PlaneCreator {
    state: CreatorState,
}

impl PlaneCreator {
    pub fn new(scene: &mut Scene, primitive_type: PrimitiveType) -> Self {
        Self {
            state: CreatorState::new(scene, primitive_type),
        }
    }
}

impl Creator for PlaneCreator {
    fn state(&self) -> &CreatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CreatorState {
        &mut self.state
    }

    fn minimum_point_count(&self) -> usize {
        self.maximum_point_count()
    }

    fn maximum_point_count(&self) -> usize {
        match self.state.primitive_type() {
            PrimitiveType::PlaneXY => 2,
            _ => 1,
        }
    }

    fn point_from(&self, ray: &Ray, intersection: Option<DVec3>) -> Option<DVec3> {
        let first = self.state.committed().first();
        match (intersection, first) {
            (Some(point), _) => Some(point),
            (None, Some(first)) => ray
                .intersect_plane(&Plane::horizontal(first.z))
                .or_else(|| Some(ray.closest_point_to_point(*first))),
            (None, None) => None,
        }
    }

    fn build(&self, scene: &Scene, points: &[DVec3], ray: &Ray) -> Option<Primitive> {
        let primitive_type = self.state.primitive_type();
        let origin = *points.first()?;
        let normal = match primitive_type {
            PrimitiveType::PlaneX => DVec3::X,
            PrimitiveType::PlaneY => DVec3::Y,
            PrimitiveType::PlaneZ => DVec3::Z,
            _ => match points.get(1) {
                Some(second) => geometry::horizontal(*second - origin)
                    .cross(DVec3::Z)
                    .try_normalize()?,
                // 只有一个点时法向先朝向观察者，竖直向下看时退化为 x 轴
                None => (-geometry::horizontal(ray.direction))
                    .try_normalize()
                    .unwrap_or(DVec3::X),
            },
        };
        let mut plane = Plane::from_normal_and_point(normal, origin);
        if plane.normal.dot(ray.direction) > EPSILON {
            plane.negate();
        }
        make_flipping_consistent(scene, &mut plane, primitive_type, self.state.object());
        Primitive::with_shape(primitive_type, Shape::Plane(plane))
    }
}

/// 与场景里第一个同类平面的法向保持同侧。只看第一个匹配的平面。
pub fn make_flipping_consistent(
    scene: &Scene,
    plane: &mut Plane,
    primitive_type: PrimitiveType,
    except: DomainObjectId,
) {
    let other = scene
        .descendants_by_type(scene.root(), DomainType::PrimitiveOf(primitive_type))
        .into_iter()
        .filter(|id| *id != except)
        .find_map(|id| scene.primitive(id).and_then(Primitive::as_plane).copied());
    if let Some(other) = other {
        if plane.normal.dot(other.normal) < 0.0 {
            plane.negate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainObject;

    #[test]
    fn axis_plane_faces_the_viewer() {
        let mut scene = Scene::headless();
        let mut creator = PlaneCreator::new(&mut scene, PrimitiveType::PlaneX);
        let point = DVec3::new(5.0, 0.0, 0.0);
        let ray = Ray::new(DVec3::new(10.0, 0.0, 0.0), DVec3::new(-1.0, 0.0, 0.0));
        assert!(creator.add_point(&mut scene, &ray, Some(point), false));
        assert!(creator.is_finished());

        let primitive = scene.primitive(creator.object()).expect("plane");
        let plane = primitive.as_plane().expect("plane shape");
        assert!(plane.normal.abs_diff_eq(DVec3::X, 1e-12));
        assert_eq!(primitive.coordinate(), Some(5.0));

        let mut flipped = PlaneCreator::new(&mut scene, PrimitiveType::PlaneX);
        let back = Ray::new(DVec3::new(-10.0, 0.0, 0.0), DVec3::X);
        assert!(flipped.add_point(&mut scene, &back, Some(DVec3::new(-2.0, 0.0, 0.0)), false));
        let normal = scene
            .primitive(flipped.object())
            .and_then(Primitive::as_plane)
            .map(|plane| plane.normal);
        assert_eq!(normal, Some(DVec3::NEG_X));
    }

    #[test]
    fn first_plane_of_same_type_decides_orientation() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let existing = scene.insert(DomainObject::primitive(
            Primitive::with_shape(
                PrimitiveType::PlaneX,
                Shape::Plane(Plane::from_normal_and_point(DVec3::X, DVec3::ZERO)),
            )
            .expect("plane"),
        ));
        assert!(scene.add_child_interactive(root, existing));

        let mut creator = PlaneCreator::new(&mut scene, PrimitiveType::PlaneX);
        let ray = Ray::new(DVec3::new(-10.0, 0.0, 0.0), DVec3::X);
        assert!(creator.add_point(&mut scene, &ray, Some(DVec3::new(3.0, 0.0, 0.0)), false));
        let plane = scene
            .primitive(creator.object())
            .and_then(Primitive::as_plane)
            .copied()
            .expect("plane");
        assert!(plane.normal.abs_diff_eq(DVec3::X, 1e-12));
        assert!((plane.distance_to_point(DVec3::new(3.0, 0.0, 0.0))).abs() < 1e-12);
    }

    #[test]
    fn vertical_plane_from_two_points() {
        let mut scene = Scene::headless();
        let mut creator = PlaneCreator::new(&mut scene, PrimitiveType::PlaneXY);
        let a = DVec3::ZERO;
        let b = DVec3::new(0.0, 2.0, 0.0);
        let ray = Ray::new(DVec3::new(5.0, 1.0, 1.0), DVec3::NEG_X);
        assert!(creator.add_point(&mut scene, &ray, Some(a), false));
        assert!(!creator.is_finished());
        assert!(creator.add_point(&mut scene, &ray, Some(b), false));
        assert!(creator.is_finished());
        let plane = scene
            .primitive(creator.object())
            .and_then(Primitive::as_plane)
            .copied()
            .expect("plane");
        assert!(plane.normal.abs_diff_eq(DVec3::X, 1e-12));
    }
}
