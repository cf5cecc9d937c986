pub mod geometry {
    use glam::{DMat3, DVec3};
    use serde::{Deserialize, Serialize};

    /// 几何比较的默认容差。拾取射线与平面/直线求交会带来浮点噪声，
    /// 判定“是否发生变化”时统一使用该值。
    pub const EPSILON: f64 = 1e-6;

    /// 拾取射线，方向始终为单位向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Ray {
        pub origin: DVec3,
        pub direction: DVec3,
    }

    impl Ray {
        #[inline]
        pub fn new(origin: DVec3, direction: DVec3) -> Self {
            Self {
                origin,
                direction: direction.normalize_or_zero(),
            }
        }

        /// 构造一条自上而下、穿过指定点的射线，便于测试与脚本化交互。
        #[inline]
        pub fn looking_down_at(point: DVec3) -> Self {
            Self::new(point + DVec3::Z * 100.0, DVec3::NEG_Z)
        }

        #[inline]
        pub fn at(&self, distance: f64) -> DVec3 {
            self.origin + self.direction * distance
        }

        /// 射线上距离 `point` 最近的点（不回溯到起点之后）。
        pub fn closest_point_to_point(&self, point: DVec3) -> DVec3 {
            let distance = (point - self.origin).dot(self.direction).max(0.0);
            self.at(distance)
        }

        /// 与平面求交；平行或交点位于射线背后时返回 `None`。
        pub fn intersect_plane(&self, plane: &Plane) -> Option<DVec3> {
            let denominator = plane.normal.dot(self.direction);
            if denominator.abs() < EPSILON {
                return None;
            }
            let distance = -(plane.normal.dot(self.origin) + plane.constant) / denominator;
            if distance < 0.0 {
                return None;
            }
            Some(self.at(distance))
        }

        /// 返回直线 `origin + s * direction` 上距离射线最近的点。
        /// 射线与直线平行时无解。
        pub fn closest_point_on_line(&self, origin: DVec3, direction: DVec3) -> Option<DVec3> {
            let direction = direction.try_normalize()?;
            let w0 = self.origin - origin;
            let b = self.direction.dot(direction);
            let denominator = 1.0 - b * b;
            if denominator.abs() < EPSILON {
                return None;
            }
            let d = self.direction.dot(w0);
            let e = direction.dot(w0);
            let s = (e - b * d) / denominator;
            Some(origin + direction * s)
        }
    }

    /// 平面，采用 `normal · p + constant = 0` 形式。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Plane {
        pub normal: DVec3,
        pub constant: f64,
    }

    impl Plane {
        #[inline]
        pub fn new(normal: DVec3, constant: f64) -> Self {
            Self { normal, constant }
        }

        pub fn from_normal_and_point(normal: DVec3, point: DVec3) -> Self {
            let normal = normal.normalize_or_zero();
            Self {
                normal,
                constant: -normal.dot(point),
            }
        }

        /// 穿过 `z` 高度的水平面。
        #[inline]
        pub fn horizontal(z: f64) -> Self {
            Self::new(DVec3::Z, -z)
        }

        #[inline]
        pub fn distance_to_point(&self, point: DVec3) -> f64 {
            self.normal.dot(point) + self.constant
        }

        #[inline]
        pub fn project_point(&self, point: DVec3) -> DVec3 {
            point - self.normal * self.distance_to_point(point)
        }

        #[inline]
        pub fn coplanar_point(&self) -> DVec3 {
            self.normal * -self.constant
        }

        #[inline]
        pub fn negate(&mut self) {
            self.normal = -self.normal;
            self.constant = -self.constant;
        }

        pub fn abs_diff_eq(&self, other: &Plane, epsilon: f64) -> bool {
            self.normal.abs_diff_eq(other.normal, epsilon)
                && (self.constant - other.constant).abs() <= epsilon
        }
    }

    /// 去掉 z 分量。
    #[inline]
    pub fn horizontal(vector: DVec3) -> DVec3 {
        DVec3::new(vector.x, vector.y, 0.0)
    }

    /// 向量在 xy 平面内的方位角（弧度）。
    #[inline]
    pub fn horizontal_angle(vector: DVec3) -> f64 {
        vector.y.atan2(vector.x)
    }

    /// 绕 z 轴的旋转矩阵。
    #[inline]
    pub fn z_rotation_matrix(angle: f64) -> DMat3 {
        DMat3::from_rotation_z(angle)
    }

    /// 将角度规范到 `[0, 2π)`。
    pub fn normalize_angle(angle: f64) -> f64 {
        let result = angle.rem_euclid(std::f64::consts::TAU);
        if (result - std::f64::consts::TAU).abs() < EPSILON {
            0.0
        } else {
            result
        }
    }

    pub fn polyline_length(points: &[DVec3], is_closed: bool) -> f64 {
        let mut length: f64 = points.windows(2).map(|pair| pair[0].distance(pair[1])).sum();
        if is_closed && points.len() > 2 {
            length += points[points.len() - 1].distance(points[0]);
        }
        length
    }

    /// 多边形面积（Newell 法，适用于任意朝向的平面多边形）。
    pub fn polygon_area(points: &[DVec3]) -> f64 {
        if points.len() < 3 {
            return 0.0;
        }
        let mut normal = DVec3::ZERO;
        for (index, current) in points.iter().enumerate() {
            let next = points[(index + 1) % points.len()];
            normal += current.cross(next);
        }
        normal.length() * 0.5
    }

    /// 多边形在 xy 平面上的投影面积。
    pub fn horizontal_area(points: &[DVec3]) -> f64 {
        if points.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for (index, current) in points.iter().enumerate() {
            let next = points[(index + 1) % points.len()];
            sum += current.x * next.y - next.x * current.y;
        }
        (sum * 0.5).abs()
    }

}

pub mod units {
    use serde::{Deserialize, Serialize};

    const METERS_PER_FOOT: f64 = 0.3048;
    const ANGLE_SNAP_DEGREES: f64 = 5.0;

    /// 物理量类型，决定换算与显示方式。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Quantity {
        Length,
        Area,
        Volume,
        Angle,
        Unitless,
    }

    /// 单位制。内部数据一律为米与弧度，只有显示与吸附在用户单位下进行。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UnitSystem {
        is_metric: bool,
    }

    impl UnitSystem {
        #[inline]
        pub fn metric() -> Self {
            Self { is_metric: true }
        }

        #[inline]
        pub fn imperial() -> Self {
            Self { is_metric: false }
        }

        #[inline]
        pub fn is_metric(&self) -> bool {
            self.is_metric
        }

        #[inline]
        pub fn toggle(&mut self) {
            self.is_metric = !self.is_metric;
        }

        fn factor(&self, quantity: Quantity) -> f64 {
            match quantity {
                Quantity::Length if !self.is_metric => 1.0 / METERS_PER_FOOT,
                Quantity::Area if !self.is_metric => 1.0 / (METERS_PER_FOOT * METERS_PER_FOOT),
                Quantity::Volume if !self.is_metric => {
                    1.0 / (METERS_PER_FOOT * METERS_PER_FOOT * METERS_PER_FOOT)
                }
                Quantity::Angle => 180.0 / std::f64::consts::PI,
                _ => 1.0,
            }
        }

        /// 内部值 → 用户单位。
        #[inline]
        pub fn convert_to_unit(&self, value: f64, quantity: Quantity) -> f64 {
            value * self.factor(quantity)
        }

        /// 用户单位 → 内部值。
        #[inline]
        pub fn convert_from_unit(&self, value: f64, quantity: Quantity) -> f64 {
            value / self.factor(quantity)
        }

        pub fn unit_symbol(&self, quantity: Quantity) -> &'static str {
            match (quantity, self.is_metric) {
                (Quantity::Length, true) => "m",
                (Quantity::Length, false) => "ft",
                (Quantity::Area, true) => "m²",
                (Quantity::Area, false) => "ft²",
                (Quantity::Volume, true) => "m³",
                (Quantity::Volume, false) => "ft³",
                (Quantity::Angle, _) => "°",
                (Quantity::Unitless, _) => "",
            }
        }

        pub fn to_string_with_unit(&self, value: f64, quantity: Quantity) -> String {
            let converted = self.convert_to_unit(value, quantity);
            let symbol = self.unit_symbol(quantity);
            match quantity {
                Quantity::Angle => format!("{converted:.1}{symbol}"),
                Quantity::Unitless => format!("{converted:.2}"),
                _ => format!("{converted:.2} {symbol}"),
            }
        }

        /// 在用户单位下按数量级吸附：数值越大步长越粗。
        /// 角度固定按 5° 吸附。
        pub fn snap(&self, value: f64, quantity: Quantity) -> f64 {
            let converted = self.convert_to_unit(value, quantity);
            let step = match quantity {
                Quantity::Angle => ANGLE_SNAP_DEGREES,
                _ => match best_increment(converted) {
                    Some(step) => step,
                    None => return value,
                },
            };
            let snapped = (converted / step).round() * step;
            self.convert_from_unit(snapped, quantity)
        }
    }

    impl Default for UnitSystem {
        fn default() -> Self {
            Self::metric()
        }
    }

    /// 数值的吸附步长：比数值自身的数量级低一位。
    pub fn best_increment(value: f64) -> Option<f64> {
        let magnitude = value.abs();
        if !magnitude.is_finite() || magnitude < 1e-9 {
            return None;
        }
        let exponent = magnitude.log10().floor();
        Some(10f64.powf(exponent - 1.0))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn converts_between_units() {
            let imperial = UnitSystem::imperial();
            let feet = imperial.convert_to_unit(0.3048, Quantity::Length);
            assert!((feet - 1.0).abs() < 1e-12);
            let back = imperial.convert_from_unit(feet, Quantity::Length);
            assert!((back - 0.3048).abs() < 1e-12);

            let metric = UnitSystem::metric();
            assert!((metric.convert_to_unit(2.5, Quantity::Area) - 2.5).abs() < 1e-12);
            let degrees = metric.convert_to_unit(std::f64::consts::PI, Quantity::Angle);
            assert!((degrees - 180.0).abs() < 1e-9);
        }

        #[test]
        fn formats_with_symbols() {
            let metric = UnitSystem::metric();
            assert_eq!(metric.to_string_with_unit(1.234, Quantity::Length), "1.23 m");
            assert_eq!(metric.to_string_with_unit(2.0, Quantity::Volume), "2.00 m³");
            let mut units = metric;
            units.toggle();
            assert!(!units.is_metric());
            assert_eq!(units.to_string_with_unit(0.3048, Quantity::Length), "1.00 ft");
        }

        #[test]
        fn snapping_is_coarser_for_bigger_values() {
            let metric = UnitSystem::metric();
            assert!((metric.snap(1.234, Quantity::Length) - 1.2).abs() < 1e-9);
            assert!((metric.snap(12.34, Quantity::Length) - 12.0).abs() < 1e-9);
            assert!((metric.snap(123.4, Quantity::Length) - 120.0).abs() < 1e-9);
            assert_eq!(metric.snap(0.0, Quantity::Length), 0.0);

            let angle = 37.0_f64.to_radians();
            assert!((metric.snap(angle, Quantity::Angle) - 35.0_f64.to_radians()).abs() < 1e-9);
        }

        #[test]
        fn imperial_snapping_happens_in_feet() {
            let imperial = UnitSystem::imperial();
            let snapped = imperial.snap(1.234 * METERS_PER_FOOT, Quantity::Length);
            assert!((snapped - 1.2 * METERS_PER_FOOT).abs() < 1e-9);
        }
    }
}

pub mod colors {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Color {
        pub r: f32,
        pub g: f32,
        pub b: f32,
    }

    impl Color {
        pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
        pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

        #[inline]
        pub const fn new(r: f32, g: f32, b: f32) -> Self {
            Self { r, g, b }
        }

        #[inline]
        pub fn is_grey(&self) -> bool {
            self.r == self.g && self.r == self.b
        }
    }

    impl Default for Color {
        fn default() -> Self {
            Self::WHITE
        }
    }

    const PALETTE: [Color; 10] = [
        Color::new(0.90, 0.30, 0.24),
        Color::new(0.18, 0.80, 0.44),
        Color::new(0.20, 0.60, 0.86),
        Color::new(0.95, 0.77, 0.06),
        Color::new(0.61, 0.35, 0.71),
        Color::new(0.10, 0.74, 0.61),
        Color::new(0.90, 0.49, 0.13),
        Color::new(0.93, 0.44, 0.72),
        Color::new(0.36, 0.55, 0.20),
        Color::new(0.44, 0.50, 0.90),
    ];

    /// 依次分配调色板颜色，每个场景持有自己的实例。
    #[derive(Debug, Clone, Default)]
    pub struct ColorPalette {
        next: usize,
    }

    impl ColorPalette {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn next_color(&mut self) -> Color {
            let color = PALETTE[self.next % PALETTE.len()];
            self.next += 1;
            color
        }
    }

}
