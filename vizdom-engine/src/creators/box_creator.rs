use glam::DVec3;
use vizdom_core::geometry::{self, EPSILON, Plane, Ray};

use super::{Creator, CreatorState};
use crate::primitives::{Primitive, PrimitiveType};
use crate::scene::Scene;

/// 盒子：第 1、2 点给出底边（长度与朝向），第 3 点给出宽度，第 4 点给出高度。
/// 三个点即可结束（高度为 0）。
pub struct BoxCreator {
    state: CreatorState,
}

impl BoxCreator {
    pub fn new(scene: &mut Scene) -> Self {
        Self {
            state: CreatorState::new(scene, PrimitiveType::Box),
        }
    }
}

impl Creator for BoxCreator {
    fn state(&self) -> &CreatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CreatorState {
        &mut self.state
    }

    fn minimum_point_count(&self) -> usize {
        3
    }

    fn maximum_point_count(&self) -> usize {
        4
    }

    fn point_from(&self, ray: &Ray, intersection: Option<DVec3>) -> Option<DVec3> {
        let committed = self.state.committed();
        match committed.len() {
            0 => intersection,
            1 | 2 => {
                let base = Plane::horizontal(committed[0].z);
                match intersection {
                    Some(point) => Some(base.project_point(point)),
                    None => ray.intersect_plane(&base),
                }
            }
            _ => {
                // 高度：表面交点直接使用，否则取射线到竖直线的最近点
                intersection.or_else(|| ray.closest_point_on_line(committed[2], DVec3::Z))
            }
        }
    }

    fn build(&self, _scene: &Scene, points: &[DVec3], _ray: &Ray) -> Option<Primitive> {
        let origin = *points.first()?;
        let mut center = origin;
        let mut size = DVec3::ZERO;
        let mut z_rotation = 0.0;

        if let Some(second) = points.get(1) {
            let along = geometry::horizontal(*second - origin);
            let length = along.length();
            let x_axis = if length > EPSILON {
                z_rotation = geometry::normalize_angle(geometry::horizontal_angle(along));
                along / length
            } else {
                DVec3::X
            };
            let y_axis = DVec3::Z.cross(x_axis);
            let width = points.get(2).map_or(0.0, |third| (*third - origin).dot(y_axis));
            let height = points.get(3).map_or(0.0, |fourth| fourth.z - origin.z);

            center = origin + x_axis * (length * 0.5) + y_axis * (width * 0.5) + DVec3::Z * (height * 0.5);
            size = DVec3::new(length, width.abs(), height.abs());
        }
        Some(Primitive::new_box(center, size, z_rotation))
    }
}
