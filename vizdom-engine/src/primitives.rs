use glam::DVec3;
use serde::{Deserialize, Serialize};
use vizdom_core::geometry::{self, EPSILON, Plane};

use crate::domain::FocusType;

/// 可交互创建的图元种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Line,
    Polyline,
    Polygon,
    Box,
    HorizontalCircle,
    VerticalCylinder,
    HorizontalCylinder,
    PlaneX,
    PlaneY,
    PlaneZ,
    PlaneXY,
    Point,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Line,
        PrimitiveType::Polyline,
        PrimitiveType::Polygon,
        PrimitiveType::Box,
        PrimitiveType::HorizontalCircle,
        PrimitiveType::VerticalCylinder,
        PrimitiveType::HorizontalCylinder,
        PrimitiveType::PlaneX,
        PrimitiveType::PlaneY,
        PrimitiveType::PlaneZ,
        PrimitiveType::PlaneXY,
        PrimitiveType::Point,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            PrimitiveType::Line => "Line",
            PrimitiveType::Polyline => "Polyline",
            PrimitiveType::Polygon => "Polygon",
            PrimitiveType::Box => "Box",
            PrimitiveType::HorizontalCircle => "Circle",
            PrimitiveType::VerticalCylinder | PrimitiveType::HorizontalCylinder => "Cylinder",
            PrimitiveType::PlaneX => "X plane",
            PrimitiveType::PlaneY => "Y plane",
            PrimitiveType::PlaneZ => "Z plane",
            PrimitiveType::PlaneXY => "Vertical plane",
            PrimitiveType::Point => "Point",
        }
    }

    #[inline]
    pub fn is_line(self) -> bool {
        matches!(
            self,
            PrimitiveType::Line | PrimitiveType::Polyline | PrimitiveType::Polygon
        )
    }

    #[inline]
    pub fn is_plane(self) -> bool {
        matches!(
            self,
            PrimitiveType::PlaneX
                | PrimitiveType::PlaneY
                | PrimitiveType::PlaneZ
                | PrimitiveType::PlaneXY
        )
    }

    #[inline]
    pub fn is_cylinder(self) -> bool {
        matches!(
            self,
            PrimitiveType::HorizontalCircle
                | PrimitiveType::VerticalCylinder
                | PrimitiveType::HorizontalCylinder
        )
    }

    /// 实体图元（盒子、圆柱）使用面/角/旋转等拾取信息。
    #[inline]
    pub fn is_solid(self) -> bool {
        self == PrimitiveType::Box || self.is_cylinder()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        let kind = match normalized.as_str() {
            "line" => PrimitiveType::Line,
            "polyline" => PrimitiveType::Polyline,
            "polygon" => PrimitiveType::Polygon,
            "box" => PrimitiveType::Box,
            "circle" | "horizontalcircle" => PrimitiveType::HorizontalCircle,
            "cylinder" | "verticalcylinder" => PrimitiveType::VerticalCylinder,
            "horizontalcylinder" => PrimitiveType::HorizontalCylinder,
            "planex" => PrimitiveType::PlaneX,
            "planey" => PrimitiveType::PlaneY,
            "planez" => PrimitiveType::PlaneZ,
            "planexy" => PrimitiveType::PlaneXY,
            "point" => PrimitiveType::Point,
            _ => return None,
        };
        Some(kind)
    }
}

/// 盒子的面编号：0..=2 为 x/y/z 正方向，3..=5 为对应负方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxFace {
    index: usize,
}

impl BoxFace {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self { index: index % 6 }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index
    }

    #[inline]
    pub fn axis(self) -> usize {
        self.index % 3
    }

    #[inline]
    pub fn sign(self) -> f64 {
        if self.index < 3 { 1.0 } else { -1.0 }
    }

    pub fn normal(self) -> DVec3 {
        let mut normal = DVec3::ZERO;
        normal[self.axis()] = self.sign();
        normal
    }

    #[inline]
    pub fn opposite(self) -> Self {
        Self::new(self.index + 3)
    }

    pub fn all() -> impl Iterator<Item = BoxFace> {
        (0..6).map(BoxFace::new)
    }
}

/// 拾取时命中的把手。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickInfo {
    pub focus_type: FocusType,
    pub face: Option<BoxFace>,
    /// 角点的象限符号（每个分量为 ±1），仅 `Corner` 有意义。
    pub corner_sign: DVec3,
}

impl PickInfo {
    pub fn new(focus_type: FocusType) -> Self {
        Self {
            focus_type,
            face: None,
            corner_sign: DVec3::ZERO,
        }
    }

    pub fn body() -> Self {
        Self::new(FocusType::Body)
    }

    pub fn face(face: BoxFace) -> Self {
        Self {
            focus_type: FocusType::Face,
            face: Some(face),
            corner_sign: DVec3::ZERO,
        }
    }

    pub fn corner(corner_sign: DVec3) -> Self {
        Self {
            focus_type: FocusType::Corner,
            face: None,
            corner_sign,
        }
    }

    pub fn rotation() -> Self {
        Self::new(FocusType::Rotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    pub center: DVec3,
    pub size: DVec3,
    /// 绕 z 轴的旋转角（弧度）。
    pub z_rotation: f64,
}

impl BoxShape {
    pub fn new(center: DVec3, size: DVec3, z_rotation: f64) -> Self {
        Self {
            center,
            size,
            z_rotation,
        }
    }

    /// 本地坐标轴在世界坐标中的方向。
    pub fn axis(&self, axis: usize) -> DVec3 {
        let rotation = geometry::z_rotation_matrix(self.z_rotation);
        match axis {
            0 => rotation * DVec3::X,
            1 => rotation * DVec3::Y,
            _ => DVec3::Z,
        }
    }

    pub fn to_local(&self, point: DVec3) -> DVec3 {
        geometry::z_rotation_matrix(-self.z_rotation) * (point - self.center)
    }

    pub fn to_world(&self, local: DVec3) -> DVec3 {
        geometry::z_rotation_matrix(self.z_rotation) * local + self.center
    }

    pub fn face_center(&self, face: BoxFace) -> DVec3 {
        let mut local = DVec3::ZERO;
        local[face.axis()] = face.sign() * self.size[face.axis()] * 0.5;
        self.to_world(local)
    }

    /// 根据表面上的命中点判断落在哪个面；点在盒子内部时返回 `None`。
    pub fn face_at(&self, point: DVec3) -> Option<BoxFace> {
        let local = self.to_local(point);
        let mut best: Option<(usize, f64)> = None;
        for axis in 0..3 {
            let half = self.size[axis] * 0.5;
            if half < EPSILON {
                continue;
            }
            let ratio = local[axis] / half;
            if best.is_none_or(|(_, value)| ratio.abs() > value.abs()) {
                best = Some((axis, ratio));
            }
        }
        let (axis, ratio) = best?;
        if ratio.abs() < 1.0 - 1e-3 {
            return None;
        }
        Some(BoxFace::new(if ratio > 0.0 { axis } else { axis + 3 }))
    }

    #[inline]
    pub fn horizontal_area(&self) -> f64 {
        self.size.x * self.size.y
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderShape {
    pub center_a: DVec3,
    pub center_b: DVec3,
    pub radius: f64,
}

impl CylinderShape {
    pub const TOP_FACE: usize = 0;
    pub const BOTTOM_FACE: usize = 1;
    pub const SIDE_FACE: usize = 2;

    pub fn new(center_a: DVec3, center_b: DVec3, radius: f64) -> Self {
        Self {
            center_a,
            center_b,
            radius,
        }
    }

    /// 轴向单位向量；退化（高度为 0）时取 z 轴。
    pub fn axis(&self) -> DVec3 {
        (self.center_b - self.center_a)
            .try_normalize()
            .unwrap_or(DVec3::Z)
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.center_a.distance(self.center_b)
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.center_a + self.center_b) * 0.5
    }

    #[inline]
    pub fn cap_area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.cap_area() * self.height()
    }

    /// 轴线上距离 `point` 最近的点（不截断到端面之间）。
    pub fn closest_point_on_axis(&self, point: DVec3) -> DVec3 {
        let axis = self.axis();
        self.center_a + axis * (point - self.center_a).dot(axis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box(BoxShape),
    Cylinder(CylinderShape),
    Line(Vec<DVec3>),
    Plane(Plane),
    Point(DVec3),
}

/// 图元种类加几何数据。种类决定几何变体，二者总是成对出现。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    primitive_type: PrimitiveType,
    shape: Shape,
}

impl Primitive {
    /// 给定种类的空几何。
    pub fn new(primitive_type: PrimitiveType) -> Self {
        let shape = match primitive_type {
            PrimitiveType::Box => Shape::Box(BoxShape::new(DVec3::ZERO, DVec3::ZERO, 0.0)),
            PrimitiveType::HorizontalCircle
            | PrimitiveType::VerticalCylinder
            | PrimitiveType::HorizontalCylinder => {
                Shape::Cylinder(CylinderShape::new(DVec3::ZERO, DVec3::ZERO, 0.0))
            }
            PrimitiveType::Line | PrimitiveType::Polyline | PrimitiveType::Polygon => {
                Shape::Line(Vec::new())
            }
            PrimitiveType::PlaneX => Shape::Plane(Plane::new(DVec3::X, 0.0)),
            PrimitiveType::PlaneY => Shape::Plane(Plane::new(DVec3::Y, 0.0)),
            PrimitiveType::PlaneZ => Shape::Plane(Plane::new(DVec3::Z, 0.0)),
            PrimitiveType::PlaneXY => Shape::Plane(Plane::new(DVec3::X, 0.0)),
            PrimitiveType::Point => Shape::Point(DVec3::ZERO),
        };
        Self {
            primitive_type,
            shape,
        }
    }

    pub fn new_box(center: DVec3, size: DVec3, z_rotation: f64) -> Self {
        Self {
            primitive_type: PrimitiveType::Box,
            shape: Shape::Box(BoxShape::new(center, size, z_rotation)),
        }
    }

    /// 种类与几何变体不匹配时返回 `None`。
    pub fn with_shape(primitive_type: PrimitiveType, shape: Shape) -> Option<Self> {
        let matches = match &shape {
            Shape::Box(_) => primitive_type == PrimitiveType::Box,
            Shape::Cylinder(_) => primitive_type.is_cylinder(),
            Shape::Line(_) => primitive_type.is_line(),
            Shape::Plane(_) => primitive_type.is_plane(),
            Shape::Point(_) => primitive_type == PrimitiveType::Point,
        };
        matches.then_some(Self {
            primitive_type,
            shape,
        })
    }

    #[inline]
    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive_type
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn as_box(&self) -> Option<&BoxShape> {
        match &self.shape {
            Shape::Box(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_cylinder(&self) -> Option<&CylinderShape> {
        match &self.shape {
            Shape::Cylinder(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&[DVec3]> {
        match &self.shape {
            Shape::Line(points) => Some(points),
            _ => None,
        }
    }

    pub fn as_plane(&self) -> Option<&Plane> {
        match &self.shape {
            Shape::Plane(plane) => Some(plane),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<DVec3> {
        match &self.shape {
            Shape::Point(point) => Some(*point),
            _ => None,
        }
    }

    /// 平面在其轴向上的坐标（X/Y/Z 平面），竖直平面返回到原点的距离。
    pub fn coordinate(&self) -> Option<f64> {
        let plane = self.as_plane()?;
        let point = plane.coplanar_point();
        Some(match self.primitive_type {
            PrimitiveType::PlaneX => point.x,
            PrimitiveType::PlaneY => point.y,
            PrimitiveType::PlaneZ => point.z,
            _ => -plane.constant,
        })
    }

    /// 在 `epsilon` 容差内比较几何；种类不同视为不相等。
    pub fn geometry_eq(&self, other: &Primitive, epsilon: f64) -> bool {
        if self.primitive_type != other.primitive_type {
            return false;
        }
        match (&self.shape, &other.shape) {
            (Shape::Box(a), Shape::Box(b)) => {
                a.center.abs_diff_eq(b.center, epsilon)
                    && a.size.abs_diff_eq(b.size, epsilon)
                    && (a.z_rotation - b.z_rotation).abs() <= epsilon
            }
            (Shape::Cylinder(a), Shape::Cylinder(b)) => {
                a.center_a.abs_diff_eq(b.center_a, epsilon)
                    && a.center_b.abs_diff_eq(b.center_b, epsilon)
                    && (a.radius - b.radius).abs() <= epsilon
            }
            (Shape::Line(a), Shape::Line(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(p, q)| p.abs_diff_eq(*q, epsilon))
            }
            (Shape::Plane(a), Shape::Plane(b)) => a.abs_diff_eq(b, epsilon),
            (Shape::Point(a), Shape::Point(b)) => a.abs_diff_eq(*b, epsilon),
            _ => false,
        }
    }

    /// 平移整个图元。
    pub fn translate(&mut self, delta: DVec3) {
        match &mut self.shape {
            Shape::Box(shape) => shape.center += delta,
            Shape::Cylinder(shape) => {
                shape.center_a += delta;
                shape.center_b += delta;
            }
            Shape::Line(points) => {
                for point in points.iter_mut() {
                    *point += delta;
                }
            }
            Shape::Plane(plane) => {
                let point = plane.coplanar_point() + delta;
                *plane = Plane::from_normal_and_point(plane.normal, point);
            }
            Shape::Point(point) => *point += delta,
        }
    }

    /// 给出可供标注的参考点。
    pub fn anchor(&self) -> DVec3 {
        match &self.shape {
            Shape::Box(shape) => shape.center,
            Shape::Cylinder(shape) => shape.center(),
            Shape::Line(points) => points.first().copied().unwrap_or(DVec3::ZERO),
            Shape::Plane(plane) => plane.coplanar_point(),
            Shape::Point(point) => *point,
        }
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_faces_are_consistent() {
        let face = BoxFace::new(4);
        assert_eq!(face.axis(), 1);
        assert_eq!(face.sign(), -1.0);
        assert_eq!(face.opposite(), BoxFace::new(1));
        assert!(face.normal().abs_diff_eq(DVec3::NEG_Y, 1e-12));
        assert_eq!(BoxFace::all().count(), 6);
    }

    #[test]
    fn face_at_detects_rotated_faces() {
        let shape = BoxShape::new(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0), std::f64::consts::FRAC_PI_2);
        // 旋转 90° 后本地 x 轴指向世界 y 轴
        let face = shape.face_at(DVec3::new(0.0, 1.0, 0.0)).expect("point on +x face");
        assert_eq!(face, BoxFace::new(0));
        assert!(shape.face_center(face).abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), 1e-9));
        assert!(shape.face_at(DVec3::ZERO).is_none());
    }

    #[test]
    fn geometry_eq_uses_tolerance() {
        let a = Primitive::new_box(DVec3::ZERO, DVec3::ONE, 0.0);
        let b = Primitive::new_box(DVec3::splat(1e-8), DVec3::ONE, 0.0);
        let c = Primitive::new_box(DVec3::splat(1e-3), DVec3::ONE, 0.0);
        assert!(a.geometry_eq(&b, EPSILON));
        assert!(!a.geometry_eq(&c, EPSILON));
        assert!(!a.geometry_eq(&Primitive::new(PrimitiveType::Point), EPSILON));
    }

    #[test]
    fn with_shape_rejects_mismatched_variants() {
        assert!(Primitive::with_shape(PrimitiveType::Box, Shape::Point(DVec3::ZERO)).is_none());
        let plane = Primitive::with_shape(
            PrimitiveType::PlaneY,
            Shape::Plane(Plane::from_normal_and_point(DVec3::NEG_Y, DVec3::new(0.0, 3.0, 0.0))),
        )
        .expect("plane shape matches plane type");
        assert!((plane.coordinate().unwrap_or_default() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn names_round_trip_through_parser() {
        for kind in PrimitiveType::ALL {
            let parsed = PrimitiveType::from_name(&format!("{kind:?}"));
            assert_eq!(parsed, Some(kind));
        }
        assert_eq!(PrimitiveType::from_name("plane-xy"), Some(PrimitiveType::PlaneXY));
        assert_eq!(PrimitiveType::from_name("torus"), None);
    }
}
