use tracing::debug;
use vizdom_core::geometry::Plane;

use super::Scene;
use crate::changes::{Change, DomainObjectChange};
use crate::domain::{DomainObjectId, DomainType, FocusType, VisibleState};
use crate::primitives::{BoxFace, Primitive};

impl Scene {
    /// 由子对象与自身视图推导出的可见状态。
    pub fn visible_state(&self, id: DomainObjectId) -> VisibleState {
        let Some(object) = self.objects.get(&id) else {
            return VisibleState::Disabled;
        };
        let mut candidates = 0;
        let mut all = 0;
        let mut none = 0;
        for child in &object.children {
            match self.visible_state(*child) {
                VisibleState::Disabled => continue,
                VisibleState::All => all += 1,
                VisibleState::None | VisibleState::CanNotBeVisibleNow => none += 1,
                VisibleState::Some => {}
            }
            candidates += 1;
        }
        if object.can_create_view() {
            candidates += 1;
            if object.can_be_set_visible_now()
                && object.views.has_view_for(self.render_target.id())
            {
                all += 1;
            } else {
                none += 1;
            }
        }
        if candidates == 0 {
            VisibleState::Disabled
        } else if candidates == all {
            VisibleState::All
        } else if candidates == none {
            if object.can_be_set_visible_now() {
                VisibleState::None
            } else {
                VisibleState::CanNotBeVisibleNow
            }
        } else {
            VisibleState::Some
        }
    }

    pub fn is_visible(&self, id: DomainObjectId) -> bool {
        matches!(
            self.visible_state(id),
            VisibleState::All | VisibleState::Some
        )
    }

    /// 显示或隐藏对象及其子树。只有最外层调用发出 `VisibleState` 通知，
    /// 通知范围包括自身、祖先与子孙。
    pub fn set_visible_interactive(&mut self, id: DomainObjectId, visible: bool) -> bool {
        if !self.set_visible_core(id, visible) {
            return false;
        }
        self.notify_visible_state_change(id);
        true
    }

    /// 显示刚完成创建的对象。预览视图已经挂载时不会重复挂载，
    /// 但仍然发出 `VisibleState` 通知，剖切随之刷新。
    pub fn reveal_interactive(&mut self, id: DomainObjectId) -> bool {
        if self.set_visible_interactive(id, true) {
            return true;
        }
        let target = self.render_target.id();
        let shown = self
            .objects
            .get(&id)
            .is_some_and(|object| object.is_legal() && object.views.has_view_for(target));
        if !shown {
            return false;
        }
        self.notify_visible_state_change(id);
        true
    }

    pub fn toggle_visible_interactive(&mut self, id: DomainObjectId) -> bool {
        match self.visible_state(id) {
            VisibleState::None => self.set_visible_interactive(id, true),
            VisibleState::Some | VisibleState::All => self.set_visible_interactive(id, false),
            VisibleState::Disabled | VisibleState::CanNotBeVisibleNow => false,
        }
    }

    fn set_visible_core(&mut self, id: DomainObjectId, visible: bool) -> bool {
        let state = self.visible_state(id);
        let Some(object) = self.objects.get(&id) else {
            return false;
        };
        if state == VisibleState::Disabled {
            return false;
        }
        // 不合法的对象只能隐藏（例如创建中的预览）
        if visible
            && matches!(state, VisibleState::None | VisibleState::CanNotBeVisibleNow)
            && !object.can_be_set_visible_now()
        {
            return false;
        }
        let children = object.children.clone();
        let owns_view = object.can_create_view() && (!visible || object.can_be_set_visible_now());

        let mut changed = false;
        for child in children {
            if self.set_visible_core(child, visible) {
                changed = true;
            }
        }
        if owns_view {
            let own = if visible {
                self.attach_view(id)
            } else {
                self.detach_view(id)
            };
            changed |= own;
        }
        changed
    }

    fn notify_visible_state_change(&mut self, id: DomainObjectId) {
        let change = DomainObjectChange::new(Change::VisibleState);
        self.notify(id, change.clone());
        for ancestor in self.ancestors(id) {
            self.notify(ancestor, change.clone());
        }
        for descendant in self.descendants(id) {
            self.notify(descendant, change.clone());
        }
    }

    /// 通过渲染目标的视图工厂创建并挂载视图，不检查合法性。
    pub(crate) fn attach_view(&mut self, id: DomainObjectId) -> bool {
        let target = self.render_target.id();
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if object.views.has_view_for(target) {
            return false;
        }
        let Some(mut view) = self.render_target.create_view(object) else {
            return false;
        };
        view.attach(object);
        view.initialize();
        view.on_show();
        object.views.add_view(view);
        true
    }

    fn detach_view(&mut self, id: DomainObjectId) -> bool {
        let target = self.render_target.id();
        self.objects
            .get_mut(&id)
            .is_some_and(|object| object.views.remove_view(target))
    }

    /// 创建中的对象不能通过 `set_visible_interactive` 显示，
    /// 预览视图走这条不做合法性检查的路径。
    pub fn show_pending_preview(&mut self, id: DomainObjectId) -> bool {
        self.attach_view(id)
    }

    pub fn set_selected_interactive(&mut self, id: DomainObjectId, selected: bool) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if object.is_selected == selected {
            return false;
        }
        if selected && (!object.can_be_selected() || !object.is_legal()) {
            return false;
        }
        object.is_selected = selected;
        self.notify(id, Change::Selected);
        true
    }

    pub fn set_expanded_interactive(&mut self, id: DomainObjectId, expanded: bool) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if object.is_expanded == expanded {
            return false;
        }
        object.is_expanded = expanded;
        self.notify(id, Change::Expanded);
        true
    }

    /// 设置焦点。离开 `Pending` 时同一次通知里同时携带 `Focus` 与 `Geometry`；
    /// 不允许重新进入 `Pending`。
    pub fn set_focus_interactive(
        &mut self,
        id: DomainObjectId,
        focus_type: FocusType,
        face: Option<BoxFace>,
    ) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if object.focus_type == focus_type && object.focus_face == face {
            return false;
        }
        let was_pending = object.focus_type == FocusType::Pending;
        if focus_type == FocusType::Pending && !was_pending {
            return false;
        }
        object.focus_type = focus_type;
        object.focus_face = face;

        let mut change = DomainObjectChange::new(Change::Focus);
        if was_pending && focus_type != FocusType::Pending {
            debug!(id = id.get(), "对象离开创建状态");
            change.add(Change::Geometry);
        }
        self.notify(id, change);
        true
    }

    /// 激活对象，同时取消父节点下同类对象的激活状态。
    pub fn set_active_interactive(&mut self, id: DomainObjectId) -> bool {
        let Some(object) = self.objects.get(&id) else {
            return false;
        };
        if object.is_active || !object.can_be_active() {
            return false;
        }
        let type_name = object.type_name();
        if let Some(parent) = object.parent {
            for sibling in self.descendants(parent) {
                if sibling == id {
                    continue;
                }
                let Some(other) = self.objects.get_mut(&sibling) else {
                    continue;
                };
                if other.type_name() != type_name || !other.can_be_active() || !other.is_active {
                    continue;
                }
                other.is_active = false;
                self.notify(sibling, Change::Active);
            }
        }
        if let Some(object) = self.objects.get_mut(&id) {
            object.is_active = true;
        }
        self.notify(id, Change::Active);
        true
    }

    pub fn deselect_all(&mut self, except: Option<DomainObjectId>) {
        for id in self.this_and_descendants(self.root) {
            if Some(id) != except {
                self.set_selected_interactive(id, false);
            }
        }
    }

    pub fn defocus_all(&mut self, except: Option<DomainObjectId>) {
        for id in self.descendants_by_type(self.root, DomainType::Primitive) {
            if Some(id) == except {
                continue;
            }
            let pending = self
                .objects
                .get(&id)
                .is_some_and(|object| object.focus_type == FocusType::Pending);
            if !pending {
                self.set_focus_interactive(id, FocusType::None, None);
            }
        }
    }

    /// 所有可见且合法的平面共同定义渲染目标的全局剖切；变化时通知根对象 `Clipping`。
    pub(crate) fn update_global_clipping(&mut self) {
        let target = self.render_target.id();
        let planes: Vec<Plane> = self
            .descendants_by_type(self.root, DomainType::Plane)
            .into_iter()
            .filter_map(|id| self.objects.get(&id))
            .filter(|object| object.is_legal() && object.views.has_view_for(target))
            .filter_map(|object| object.as_primitive().and_then(Primitive::as_plane).copied())
            .collect();
        if planes.as_slice() == self.render_target.global_clipping() {
            return;
        }
        debug!(planes = planes.len(), "更新全局剖切");
        self.render_target.set_global_clipping(planes);
        self.notify(self.root, Change::Clipping);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::DVec3;
    use vizdom_core::geometry::Plane;

    use crate::changes::Change;
    use crate::domain::{DomainObject, DomainObjectId, FocusType, VisibleState};
    use crate::primitives::{BoxFace, Primitive, PrimitiveType, Shape};
    use crate::render::ViewEvent;
    use crate::scene::Scene;

    fn record(scene: &mut Scene, id: DomainObjectId) -> Rc<RefCell<Vec<Vec<Change>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        scene
            .object_mut(id)
            .expect("object")
            .add_event_listener(move |_, change| sink.borrow_mut().push(change.changes().collect()));
        log
    }

    fn attached(scene: &mut Scene, primitive: Primitive) -> DomainObjectId {
        let id = scene.insert(DomainObject::primitive(primitive));
        let root = scene.root();
        scene.add_child(root, id, false).expect("attach");
        id
    }

    #[test]
    fn setters_are_idempotent() {
        let mut scene = Scene::headless();
        let id = attached(&mut scene, Primitive::new_box(DVec3::ZERO, DVec3::ONE, 0.0));
        let log = record(&mut scene, id);

        assert!(scene.set_selected_interactive(id, true));
        assert!(!scene.set_selected_interactive(id, true));
        assert!(scene.set_expanded_interactive(id, true));
        assert!(!scene.set_expanded_interactive(id, true));
        assert!(scene.set_focus_interactive(id, FocusType::Face, Some(BoxFace::new(1))));
        assert!(!scene.set_focus_interactive(id, FocusType::Face, Some(BoxFace::new(1))));
        assert!(scene.set_focus_interactive(id, FocusType::Face, Some(BoxFace::new(2))));
        assert!(scene.set_visible_interactive(id, true));
        assert!(!scene.set_visible_interactive(id, true));

        let log = log.borrow();
        assert_eq!(
            log.as_slice(),
            &[
                vec![Change::Selected],
                vec![Change::Expanded],
                vec![Change::Focus],
                vec![Change::Focus],
                vec![Change::VisibleState],
            ]
        );
    }

    #[test]
    fn leaving_pending_fires_focus_and_geometry_together() {
        let mut scene = Scene::headless();
        let id = attached(&mut scene, Primitive::new(PrimitiveType::Point));
        scene.object_mut(id).expect("point").focus_type = FocusType::Pending;
        let log = record(&mut scene, id);

        assert!(!scene.set_selected_interactive(id, true));
        assert!(!scene.set_visible_interactive(id, true));
        assert_eq!(scene.visible_state(id), VisibleState::CanNotBeVisibleNow);

        assert!(scene.set_focus_interactive(id, FocusType::Focus, None));
        assert!(!scene.set_focus_interactive(id, FocusType::Pending, None));
        assert_eq!(log.borrow().as_slice(), &[vec![Change::Focus, Change::Geometry]]);
        assert!(scene.set_selected_interactive(id, true));
    }

    #[test]
    fn visible_state_aggregates_children() {
        let mut scene = Scene::headless();
        let root = scene.root();
        assert_eq!(scene.visible_state(root), VisibleState::Disabled);
        assert!(!scene.set_visible_interactive(root, true));

        let first = attached(&mut scene, Primitive::new(PrimitiveType::Point));
        let second = attached(&mut scene, Primitive::new(PrimitiveType::Point));
        assert_eq!(scene.visible_state(root), VisibleState::None);

        assert!(scene.set_visible_interactive(first, true));
        assert_eq!(scene.visible_state(root), VisibleState::Some);
        assert!(scene.set_visible_interactive(root, true));
        assert_eq!(scene.visible_state(root), VisibleState::All);
        assert!(scene.is_visible(second));

        assert!(scene.toggle_visible_interactive(root));
        assert_eq!(scene.visible_state(root), VisibleState::None);
    }

    #[test]
    fn pending_preview_can_be_hidden() {
        let mut scene = Scene::headless();
        let id = attached(&mut scene, Primitive::new(PrimitiveType::Point));
        scene.object_mut(id).expect("point").focus_type = FocusType::Pending;

        assert!(scene.show_pending_preview(id));
        assert!(scene.object(id).is_some_and(|object| object.views().len() == 1));
        assert!(!scene.set_visible_interactive(id, true));

        assert!(scene.set_visible_interactive(id, false));
        assert!(scene.object(id).is_some_and(|object| object.views().is_empty()));
        assert!(!scene.set_visible_interactive(id, false));
    }

    #[test]
    fn visibility_notifies_ancestors_and_views() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let folder = scene.insert(DomainObject::folder());
        scene.add_child(root, folder, false).expect("attach folder");
        let id = scene.insert(DomainObject::primitive(Primitive::new(PrimitiveType::Point)));
        scene.add_child(folder, id, false).expect("attach point");
        let root_log = record(&mut scene, root);

        assert!(scene.set_visible_interactive(folder, true));
        assert_eq!(root_log.borrow().as_slice(), &[vec![Change::VisibleState]]);

        let log = scene.headless_target().expect("headless").log();
        let events = log.borrow();
        assert_eq!(events.first(), Some(&ViewEvent::Attached(id)));
        assert!(events.contains(&ViewEvent::Updated(id, vec![Change::VisibleState])));
    }

    #[test]
    fn active_is_exclusive_among_same_type_siblings() {
        let mut scene = Scene::headless();
        let first = attached(&mut scene, Primitive::new(PrimitiveType::PlaneX));
        let second = attached(&mut scene, Primitive::new(PrimitiveType::PlaneX));
        let point = attached(&mut scene, Primitive::new(PrimitiveType::Point));

        assert!(!scene.set_active_interactive(point));
        assert!(scene.set_active_interactive(first));
        assert!(!scene.set_active_interactive(first));
        assert!(scene.set_active_interactive(second));
        assert!(!scene.object(first).is_some_and(DomainObject::is_active));
        assert!(scene.object(second).is_some_and(DomainObject::is_active));
    }

    #[test]
    fn visible_planes_drive_global_clipping() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let plane = Plane::from_normal_and_point(DVec3::X, DVec3::new(2.0, 0.0, 0.0));
        let id = attached(
            &mut scene,
            Primitive::with_shape(PrimitiveType::PlaneX, Shape::Plane(plane)).expect("plane"),
        );
        let root_log = record(&mut scene, root);
        assert!(!scene.render_target().is_global_clipping_active());

        assert!(scene.set_visible_interactive(id, true));
        assert!(scene.render_target().is_global_clipping_active());
        assert_eq!(scene.render_target().global_clipping(), &[plane]);
        assert!(root_log.borrow().contains(&vec![Change::Clipping]));

        assert!(scene.remove_interactive(id, true));
        assert!(!scene.render_target().is_global_clipping_active());
    }
}
