//! 属性面板：每个图元给出一组带物理量类型的数值，显示时再按单位制格式化。

use vizdom_core::geometry;
use vizdom_core::units::{Quantity, UnitSystem};

use crate::domain::DomainObject;
use crate::primitives::{PrimitiveType, Shape};

#[derive(Debug, Clone, PartialEq)]
pub struct PanelItem {
    pub label: &'static str,
    pub value: f64,
    pub quantity: Quantity,
}

impl PanelItem {
    fn new(label: &'static str, value: f64, quantity: Quantity) -> Self {
        Self {
            label,
            value,
            quantity,
        }
    }

    pub fn format(&self, units: &UnitSystem) -> String {
        format!(
            "{}: {}",
            self.label,
            units.to_string_with_unit(self.value, self.quantity)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelInfo {
    pub header: String,
    pub items: Vec<PanelItem>,
}

impl PanelInfo {
    pub fn for_object(object: &DomainObject) -> Option<Self> {
        let primitive = object.as_primitive()?;
        let items = match primitive.shape() {
            Shape::Box(shape) => vec![
                PanelItem::new("Length", shape.size.x, Quantity::Length),
                PanelItem::new("Width", shape.size.y, Quantity::Length),
                PanelItem::new("Height", shape.size.z, Quantity::Length),
                PanelItem::new("Area", shape.horizontal_area(), Quantity::Area),
                PanelItem::new("Volume", shape.volume(), Quantity::Volume),
            ],
            Shape::Cylinder(shape) => {
                let mut items = vec![PanelItem::new("Radius", shape.radius, Quantity::Length)];
                if primitive.primitive_type() != PrimitiveType::HorizontalCircle {
                    items.push(PanelItem::new("Height", shape.height(), Quantity::Length));
                }
                items.push(PanelItem::new("Area", shape.cap_area(), Quantity::Area));
                if primitive.primitive_type() != PrimitiveType::HorizontalCircle {
                    items.push(PanelItem::new("Volume", shape.volume(), Quantity::Volume));
                }
                items
            }
            Shape::Line(points) => {
                let closed = primitive.primitive_type() == PrimitiveType::Polygon;
                let mut items = vec![PanelItem::new(
                    "Length",
                    geometry::polyline_length(points, closed),
                    Quantity::Length,
                )];
                if closed {
                    items.push(PanelItem::new(
                        "Area",
                        geometry::polygon_area(points),
                        Quantity::Area,
                    ));
                }
                items
            }
            Shape::Plane(_) => vec![PanelItem::new(
                "Coordinate",
                primitive.coordinate().unwrap_or_default(),
                Quantity::Length,
            )],
            Shape::Point(point) => vec![
                PanelItem::new("X", point.x, Quantity::Length),
                PanelItem::new("Y", point.y, Quantity::Length),
                PanelItem::new("Z", point.z, Quantity::Length),
            ],
        };
        Some(Self {
            header: object.name().to_string(),
            items,
        })
    }

    pub fn value(&self, label: &str) -> Option<f64> {
        self.items
            .iter()
            .find(|item| item.label == label)
            .map(|item| item.value)
    }

    pub fn lines(&self, units: &UnitSystem) -> Vec<String> {
        self.items.iter().map(|item| item.format(units)).collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::primitives::{CylinderShape, Primitive};

    #[test]
    fn box_panel_lists_dimensions() {
        let object = DomainObject::primitive(Primitive::new_box(
            DVec3::ZERO,
            DVec3::new(2.0, 3.0, 4.0),
            0.0,
        ));
        let info = PanelInfo::for_object(&object).expect("panel");
        assert_eq!(info.header, "Box");
        assert_eq!(info.value("Volume"), Some(24.0));
        assert_eq!(info.value("Area"), Some(6.0));
        let lines = info.lines(&UnitSystem::metric());
        assert_eq!(lines[0], "Length: 2.00 m");
    }

    #[test]
    fn circle_has_no_height() {
        let primitive = Primitive::with_shape(
            PrimitiveType::HorizontalCircle,
            Shape::Cylinder(CylinderShape::new(DVec3::ZERO, DVec3::ZERO, 1.0)),
        )
        .expect("circle");
        let info = PanelInfo::for_object(&DomainObject::primitive(primitive)).expect("panel");
        assert!(info.value("Height").is_none());
        assert!((info.value("Area").unwrap_or_default() - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn polygon_reports_area_in_feet() {
        let square = vec![DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::Y];
        let primitive = Primitive::with_shape(PrimitiveType::Polygon, Shape::Line(square))
            .expect("polygon");
        let info = PanelInfo::for_object(&DomainObject::primitive(primitive)).expect("panel");
        assert_eq!(info.value("Length"), Some(4.0));
        assert_eq!(info.value("Area"), Some(1.0));
        let lines = info.lines(&UnitSystem::imperial());
        assert_eq!(lines[1], "Area: 10.76 ft²");
    }

    #[test]
    fn folders_have_no_panel() {
        assert!(PanelInfo::for_object(&DomainObject::folder()).is_none());
    }
}
