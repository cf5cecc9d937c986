use vizdom_core::colors::Color;

use super::Scene;
use crate::changes::{Change, ChangedDescription};
use crate::domain::DomainObjectId;
use crate::panel::PanelInfo;
use crate::style::RenderStyle;

impl Scene {
    /// 最近的、作为渲染样式根的祖先文件夹。
    pub fn render_style_root(&self, id: DomainObjectId) -> Option<DomainObjectId> {
        self.ancestors(id).into_iter().find(|ancestor| {
            self.objects
                .get(ancestor)
                .is_some_and(|object| object.is_render_style_root())
        })
    }

    /// 实际生效的渲染样式：样式根优先，否则用对象自身的（首次访问时按种类创建）。
    pub fn render_style(&mut self, id: DomainObjectId) -> Option<RenderStyle> {
        let owner = self.render_style_root(id).unwrap_or(id);
        let object = self.objects.get_mut(&owner)?;
        if object.render_style.is_none() {
            object.render_style = object.create_render_style();
        }
        object.render_style.clone()
    }

    pub fn set_render_style_interactive(
        &mut self,
        id: DomainObjectId,
        style: RenderStyle,
        field_name: &str,
    ) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if object.render_style.as_ref() == Some(&style) {
            return false;
        }
        object.render_style = Some(style);
        self.notify(id, ChangedDescription::with_field(Change::RenderStyle, field_name));
        true
    }

    pub fn set_name_interactive(&mut self, id: DomainObjectId, name: &str) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if !object.can_change_name() || object.name.as_deref() == Some(name) {
            return false;
        }
        object.set_name(name);
        self.notify(id, Change::Naming);
        true
    }

    pub fn set_color_interactive(&mut self, id: DomainObjectId, color: Color) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if !object.can_change_color() || object.color == Some(color) {
            return false;
        }
        object.set_color(color);
        self.notify(id, Change::Color);
        true
    }

    /// 属性面板内容，按当前单位制格式化。
    pub fn panel_info(&self, id: DomainObjectId) -> Option<PanelInfo> {
        let object = self.objects.get(&id)?;
        if !object.has_panel_info() {
            return None;
        }
        PanelInfo::for_object(object)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::DVec3;
    use vizdom_core::colors::Color;

    use crate::changes::Change;
    use crate::domain::{DomainKind, DomainObject};
    use crate::primitives::{Primitive, PrimitiveType};
    use crate::scene::Scene;
    use crate::style::RenderStyle;

    #[test]
    fn style_root_overrides_and_renotifies_descendants() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let folder = scene.insert(DomainObject::new(DomainKind::Folder {
            is_render_style_root: true,
        }));
        assert!(scene.add_child_interactive(root, folder));
        let plane = scene.insert(DomainObject::primitive(Primitive::new(PrimitiveType::PlaneZ)));
        assert!(scene.add_child_interactive(folder, plane));

        assert_eq!(scene.render_style_root(plane), Some(folder));
        assert_eq!(scene.render_style(plane), Some(RenderStyle::default()));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scene
            .object_mut(plane)
            .expect("plane")
            .add_event_listener(move |_, change| {
                if let Some(description) = change.description(Change::RenderStyle) {
                    sink.borrow_mut().push(description.field_name.clone());
                }
            });

        let style = RenderStyle {
            opacity: 0.5,
            ..RenderStyle::default()
        };
        assert!(scene.set_render_style_interactive(folder, style.clone(), "opacity"));
        assert!(!scene.set_render_style_interactive(folder, style, "opacity"));
        assert_eq!(seen.borrow().as_slice(), &[Some("opacity".to_string())]);
    }

    #[test]
    fn name_and_color_setters_are_idempotent() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let id = scene.insert(DomainObject::primitive(Primitive::new_box(
            DVec3::ZERO,
            DVec3::ONE,
            0.0,
        )));
        assert!(scene.add_child_interactive(root, id));

        assert!(scene.set_name_interactive(id, "Kitchen"));
        assert!(!scene.set_name_interactive(id, "Kitchen"));
        assert!(!scene.set_name_interactive(root, "World"));

        let red = Color::new(1.0, 0.0, 0.0);
        assert!(scene.set_color_interactive(id, red));
        assert!(!scene.set_color_interactive(id, red));
        assert_eq!(scene.object(id).map(DomainObject::color), Some(red));
        assert!(scene.panel_info(id).is_some());
        assert!(scene.panel_info(root).is_none());
    }
}
