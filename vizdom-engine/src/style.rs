use serde::{Deserialize, Serialize};

use crate::primitives::PrimitiveType;

/// 图元的绘制参数。只描述“怎么画”，具体网格由外部视图负责。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStyle {
    pub line_width: f64,
    pub opacity: f32,
    pub depth_test: bool,
    pub show_label: bool,
    pub show_solid: bool,
}

impl RenderStyle {
    pub fn for_primitive(primitive_type: PrimitiveType) -> Self {
        let mut style = Self::default();
        if primitive_type.is_plane() {
            style.opacity = 0.25;
            style.show_label = false;
        }
        if primitive_type.is_line() || primitive_type == PrimitiveType::Point {
            style.show_solid = false;
            style.line_width = 2.0;
        }
        style
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            opacity: 0.5,
            depth_test: true,
            show_label: true,
            show_solid: true,
        }
    }
}
