use glam::DVec3;
use vizdom_core::geometry::{self, Plane, Ray};

use super::{DragContext, Dragger, DraggerState, horizontal_delta, translated};
use crate::domain::FocusType;
use crate::primitives::{BoxShape, Primitive};

/// 盒子：整体平移、拉面、拉角点（只改水平尺寸）与绕 z 轴旋转。
pub struct BoxDragger {
    state: DraggerState,
}

impl BoxDragger {
    pub fn new(state: DraggerState) -> Self {
        Self { state }
    }

    fn original_box(&self) -> Option<&BoxShape> {
        self.state.original().as_box()
    }

    fn resize_face(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        let original = self.original_box()?;
        let props = self.state.props();
        let face = props.pick.face?;
        let axis = face.axis();
        let direction = original.axis(axis) * face.sign();
        let hit = ray.closest_point_on_line(props.point, direction)?;
        let delta = (hit - props.point).dot(direction);

        let size = context.size(original.size[axis] + delta);
        let applied = size - original.size[axis];
        let mut shape = *original;
        shape.size[axis] = size;
        shape.center = original.center + direction * (applied * 0.5);
        Some(Primitive::new_box(shape.center, shape.size, shape.z_rotation))
    }

    fn resize_corner(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        let original = self.original_box()?;
        let props = self.state.props();
        let world_delta = horizontal_delta(props, ray)?;
        let local_delta = geometry::z_rotation_matrix(-original.z_rotation) * world_delta;

        let mut size = original.size;
        let mut shift = DVec3::ZERO;
        for axis in 0..2 {
            let sign = props.pick.corner_sign[axis];
            if sign == 0.0 {
                continue;
            }
            size[axis] = context.size(original.size[axis] + sign * local_delta[axis]);
            shift[axis] = sign * (size[axis] - original.size[axis]) * 0.5;
        }
        let center = original.center + geometry::z_rotation_matrix(original.z_rotation) * shift;
        Some(Primitive::new_box(center, size, original.z_rotation))
    }

    fn rotate(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        let original = self.original_box()?;
        let props = self.state.props();
        let hit = ray.intersect_plane(&Plane::horizontal(props.point.z))?;
        let start = geometry::horizontal(props.point - original.center);
        let end = geometry::horizontal(hit - original.center);
        if start.length_squared() < 1e-12 || end.length_squared() < 1e-12 {
            return None;
        }
        let angle = geometry::horizontal_angle(end) - geometry::horizontal_angle(start);
        let rotation = geometry::normalize_angle(context.snap_angle(original.z_rotation + angle));
        Some(Primitive::new_box(original.center, original.size, rotation))
    }
}

impl Dragger for BoxDragger {
    fn state(&self) -> &DraggerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DraggerState {
        &mut self.state
    }

    fn compute(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        match self.state.props().pick.focus_type {
            FocusType::Face => self.resize_face(ray, context),
            FocusType::Corner => self.resize_corner(ray, context),
            FocusType::Rotation => self.rotate(ray, context),
            _ => {
                let delta = horizontal_delta(self.state.props(), ray)?;
                Some(translated(self.state.original(), delta, context))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainObject, DomainObjectId};
    use crate::draggers::{DraggerProps, Modifiers};
    use crate::primitives::{BoxFace, PickInfo};
    use crate::scene::Scene;

    fn add_box(scene: &mut Scene, center: DVec3, size: DVec3, rotation: f64) -> DomainObjectId {
        let id = scene.insert(DomainObject::primitive(Primitive::new_box(center, size, rotation)));
        let root = scene.root();
        assert!(scene.add_child_interactive(root, id));
        id
    }

    fn drag(scene: &mut Scene, id: DomainObjectId, pick: PickInfo, from: DVec3, to: DVec3) -> BoxShape {
        let props = DraggerProps::new(from, Ray::looking_down_at(from), pick);
        let mut dragger = scene.create_dragger(id, props).expect("dragger");
        dragger.on_pointer_down(scene);
        dragger.on_pointer_drag(scene, Modifiers::default(), &Ray::looking_down_at(to));
        let transaction = dragger.on_pointer_up(scene);
        scene.push_transaction(transaction);
        scene
            .primitive(id)
            .and_then(Primitive::as_box)
            .copied()
            .expect("box")
    }

    #[test]
    fn body_drag_moves_horizontally() {
        let mut scene = Scene::headless();
        let id = add_box(&mut scene, DVec3::splat(0.5), DVec3::ONE, 0.0);
        let shape = drag(
            &mut scene,
            id,
            PickInfo::body(),
            DVec3::new(0.5, 0.5, 1.0),
            DVec3::new(2.5, 1.5, 1.0),
        );
        assert!(shape.center.abs_diff_eq(DVec3::new(2.5, 1.5, 0.5), 1e-9));
        assert!(shape.size.abs_diff_eq(DVec3::ONE, 1e-12));
        assert!(scene.undo_manager().can_undo());
    }

    #[test]
    fn corner_drag_keeps_opposite_corner() {
        let mut scene = Scene::headless();
        let id = add_box(&mut scene, DVec3::splat(0.5), DVec3::ONE, 0.0);
        let shape = drag(
            &mut scene,
            id,
            PickInfo::corner(DVec3::new(1.0, 1.0, 0.0)),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(2.0, 3.0, 1.0),
        );
        assert!(shape.size.abs_diff_eq(DVec3::new(2.0, 3.0, 1.0), 1e-9));
        assert!(shape.center.abs_diff_eq(DVec3::new(1.0, 1.5, 0.5), 1e-9));
    }

    #[test]
    fn face_drag_is_clamped_to_minimum_size() {
        let mut scene = Scene::headless();
        let id = add_box(&mut scene, DVec3::splat(0.5), DVec3::ONE, 0.0);
        let shape = drag(
            &mut scene,
            id,
            PickInfo::face(BoxFace::new(0)),
            DVec3::new(1.0, 0.5, 0.5),
            DVec3::new(-5.0, 0.5, 0.5),
        );
        let min_size = scene.settings().min_size;
        assert!((shape.size.x - min_size).abs() < 1e-12);
        // 负 x 面保持不动
        assert!((shape.center.x - shape.size.x * 0.5).abs() < 1e-9);
    }

    #[test]
    fn rotation_drag_turns_around_center() {
        let mut scene = Scene::headless();
        let id = add_box(&mut scene, DVec3::ZERO, DVec3::ONE, 0.0);
        let shape = drag(
            &mut scene,
            id,
            PickInfo::rotation(),
            DVec3::new(1.0, 0.0, 0.5),
            DVec3::new(0.0, 1.0, 0.5),
        );
        assert!((shape.z_rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!(shape.center.abs_diff_eq(DVec3::ZERO, 1e-12));
    }

    #[test]
    fn shift_snaps_face_size() {
        let mut scene = Scene::headless();
        let id = add_box(&mut scene, DVec3::splat(0.5), DVec3::ONE, 0.0);
        let from = DVec3::new(1.0, 0.5, 0.5);
        let props = DraggerProps::new(from, Ray::looking_down_at(from), PickInfo::face(BoxFace::new(0)));
        let mut dragger = scene.create_dragger(id, props).expect("dragger");
        dragger.on_pointer_down(&mut scene);
        assert!(dragger.on_pointer_drag(
            &mut scene,
            Modifiers::shift(),
            &Ray::looking_down_at(DVec3::new(1.234, 0.5, 0.5)),
        ));
        let size = scene
            .primitive(id)
            .and_then(Primitive::as_box)
            .map(|shape| shape.size.x);
        assert!(size.is_some_and(|size| (size - 1.2).abs() < 1e-9));
    }
}
