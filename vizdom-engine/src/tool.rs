//! 图元编辑工具：悬停聚焦、点击选中或创建、按下拖拽、Esc、删除与撤销。

use glam::DVec3;
use tracing::debug;
use vizdom_core::geometry::Ray;

use crate::changes::Change;
use crate::creators::{Creator, CreatorEscape, create_creator};
use crate::domain::{DomainObject, DomainObjectId, FocusType};
use crate::draggers::{Dragger, DraggerProps, Modifiers};
use crate::primitives::{PickInfo, PrimitiveType};
use crate::scene::Scene;

/// 拾取结果：命中点，以及命中的对象与把手（若有）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: DVec3,
    pub object: Option<DomainObjectId>,
    pub pick: Option<PickInfo>,
}

impl Intersection {
    /// 命中背景几何（不属于任何领域对象）。
    pub fn surface(point: DVec3) -> Self {
        Self {
            point,
            object: None,
            pick: None,
        }
    }

    pub fn object(point: DVec3, object: DomainObjectId, pick: PickInfo) -> Self {
        Self {
            point,
            object: Some(object),
            pick: Some(pick),
        }
    }
}

/// 一次指针事件：射线总是存在，交点可能没有（指向空中）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub ray: Ray,
    pub intersection: Option<Intersection>,
    pub modifiers: Modifiers,
}

impl PointerSample {
    pub fn new(ray: Ray, intersection: Option<Intersection>) -> Self {
        Self {
            ray,
            intersection,
            modifiers: Modifiers::default(),
        }
    }

    /// 自上而下点击背景表面上的一点。
    pub fn at_surface(point: DVec3) -> Self {
        Self::new(Ray::looking_down_at(point), Some(Intersection::surface(point)))
    }

    /// 自上而下指向空中（无交点）。
    pub fn in_air(point: DVec3) -> Self {
        Self::new(Ray::looking_down_at(point), None)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

pub struct PrimitiveEditTool {
    primitive_type: Option<PrimitiveType>,
    default_primitive_type: Option<PrimitiveType>,
    creator: Option<Box<dyn Creator>>,
    dragger: Option<Box<dyn Dragger>>,
}

impl PrimitiveEditTool {
    /// `None` 表示纯编辑模式（不创建新对象）。
    pub fn new(primitive_type: Option<PrimitiveType>) -> Self {
        Self {
            primitive_type,
            default_primitive_type: primitive_type,
            creator: None,
            dragger: None,
        }
    }

    #[inline]
    pub fn is_edit(&self) -> bool {
        self.primitive_type.is_none()
    }

    #[inline]
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        self.primitive_type
    }

    pub fn set_primitive_type(&mut self, primitive_type: Option<PrimitiveType>) {
        self.primitive_type = primitive_type;
    }

    #[inline]
    pub fn is_creating(&self) -> bool {
        self.creator.is_some()
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.dragger.is_some()
    }

    /// 正在创建的对象。
    pub fn creating_object(&self) -> Option<DomainObjectId> {
        self.creator.as_ref().map(|creator| creator.object())
    }

    pub fn on_hover(&mut self, scene: &mut Scene, sample: &PointerSample) {
        if !self.is_edit() {
            if let Some(creator) = self.creator.as_mut() {
                Self::hover_creator(creator.as_mut(), scene, sample);
                return;
            }
        }
        let hit = sample.intersection;
        let selectable = hit.and_then(|hit| self.selectable_object(scene, &hit));
        match (hit, selectable) {
            (Some(hit), Some(id)) => self.set_focus(scene, id, &hit),
            (hit, _) => {
                scene.defocus_all(None);
                if self.is_edit() || hit.is_none() {
                    scene.render_target_mut().set_navigate_cursor();
                } else {
                    scene.render_target_mut().set_default_cursor();
                }
            }
        }
    }

    fn hover_creator(creator: &mut dyn Creator, scene: &mut Scene, sample: &PointerSample) {
        let ray = &sample.ray;
        if !creator.prefer_intersection() && creator.add_point(scene, ray, None, true) {
            scene.render_target_mut().set_default_cursor();
            return;
        }
        let Some(hit) = sample.intersection else {
            if creator.prefer_intersection() && creator.add_point(scene, ray, None, true) {
                scene.render_target_mut().set_default_cursor();
            } else {
                scene.render_target_mut().set_navigate_cursor();
            }
            return;
        };
        let over_other = hit.object.is_some_and(|id| {
            id != creator.object()
                && scene
                    .object(id)
                    .is_some_and(|object| object.can_be_selected() && object.is_legal())
        });
        if !over_other && creator.add_point(scene, ray, Some(hit.point), true) {
            scene.render_target_mut().set_default_cursor();
        } else {
            scene.render_target_mut().set_navigate_cursor();
        }
    }

    pub fn on_click(&mut self, scene: &mut Scene, sample: &PointerSample) {
        let ray = &sample.ray;
        if let Some(creator) = self.creator.as_mut() {
            if !creator.prefer_intersection() && creator.add_point(scene, ray, None, false) {
                self.end_creator_if_finished(scene, false);
                return;
            }
        }
        let Some(hit) = sample.intersection else {
            return;
        };
        if let Some(creator) = self.creator.as_mut() {
            if creator.add_point(scene, ray, Some(hit.point), false) {
                self.end_creator_if_finished(scene, false);
            }
            return;
        }
        if let Some(id) = self.selectable_object(scene, &hit) {
            scene.deselect_all(Some(id));
            scene.set_selected_interactive(id, true);
            return;
        }
        let Some(primitive_type) = self.primitive_type else {
            return;
        };

        let mut creator = create_creator(scene, primitive_type);
        let object = creator.object();
        if !creator.add_point(scene, ray, Some(hit.point), false) {
            scene.remove_interactive(object, false);
            return;
        }
        scene.deselect_all(None);
        let root = scene.root();
        scene.add_child_interactive(root, object);
        // 单击即完成的对象已经合法，交给 end_creator_if_finished 正式显示
        if !scene.object(object).is_some_and(DomainObject::is_legal) {
            scene.show_pending_preview(object);
        }
        let transaction = scene.create_transaction(object, Change::Added);
        scene.push_transaction(transaction);
        debug!(id = object.get(), kind = ?primitive_type, "开始创建");
        self.creator = Some(creator);
        self.end_creator_if_finished(scene, false);
    }

    /// 按下命中可选对象时开始拖拽。创建过程中不允许拖拽。
    pub fn on_pointer_down(&mut self, scene: &mut Scene, sample: &PointerSample) -> bool {
        if self.creator.is_some() {
            return false;
        }
        let Some(hit) = sample.intersection else {
            return false;
        };
        let Some(id) = self.selectable_object(scene, &hit) else {
            return false;
        };
        let pick = hit.pick.unwrap_or_else(|| PickInfo::new(FocusType::Focus));
        let props = DraggerProps::new(hit.point, sample.ray, pick);
        let Some(mut dragger) = scene.create_dragger(id, props) else {
            return false;
        };
        scene.deselect_all(Some(id));
        scene.set_selected_interactive(id, true);
        dragger.on_pointer_down(scene);
        self.dragger = Some(dragger);
        true
    }

    pub fn on_pointer_drag(&mut self, scene: &mut Scene, sample: &PointerSample) -> bool {
        match self.dragger.as_mut() {
            Some(dragger) => dragger.on_pointer_drag(scene, sample.modifiers, &sample.ray),
            None => false,
        }
    }

    /// 结束拖拽；有变化时把事务压入撤销栈。
    pub fn on_pointer_up(&mut self, scene: &mut Scene) -> bool {
        let Some(mut dragger) = self.dragger.take() else {
            return false;
        };
        let transaction = dragger.on_pointer_up(scene);
        scene.push_transaction(transaction)
    }

    pub fn on_escape(&mut self, scene: &mut Scene) {
        let Some(creator) = self.creator.as_mut() else {
            self.set_default_primitive_type();
            return;
        };
        match creator.handle_escape(scene) {
            CreatorEscape::Finished => self.end_creator_if_finished(scene, true),
            CreatorEscape::Discard => {
                let object = creator.object();
                scene.remove_interactive(object, false);
                let dropped = scene.undo_manager_mut().remove_for(object);
                debug!(id = object.get(), dropped, "放弃创建");
                self.creator = None;
                self.set_default_primitive_type();
            }
        }
    }

    pub fn on_deactivate(&mut self, scene: &mut Scene) {
        self.on_escape(scene);
        if let Some(mut dragger) = self.dragger.take() {
            let transaction = dragger.on_pointer_up(scene);
            scene.push_transaction(transaction);
        }
    }

    /// 删除当前选中对象，并记录可撤销的事务。
    pub fn on_delete(&mut self, scene: &mut Scene) -> bool {
        self.creator = None;
        let root = scene.root();
        let Some(id) = scene.selected_descendant(root) else {
            return false;
        };
        let transaction = scene.create_transaction(id, Change::Deleted);
        if !scene.remove_interactive(id, true) {
            return false;
        }
        scene.push_transaction(transaction)
    }

    /// 撤销；若正在创建的对象因此被删除或仍不合法，则结束创建。
    pub fn on_undo(&mut self, scene: &mut Scene) -> bool {
        self.dragger = None;
        let undone = scene.undo();
        if let Some(object) = self.creating_object() {
            let legal = scene.object(object).map(DomainObject::is_legal);
            if legal != Some(true) {
                if scene.object(object).is_some_and(DomainObject::has_parent) {
                    scene.remove_interactive(object, false);
                }
                self.creator = None;
            }
        }
        undone
    }

    fn end_creator_if_finished(&mut self, scene: &mut Scene, force: bool) {
        let Some(creator) = self.creator.as_ref() else {
            return;
        };
        if !force && !creator.is_finished() {
            return;
        }
        let object = creator.object();
        if creator.is_finished() {
            scene.reveal_interactive(object);
            scene.set_selected_interactive(object, true);
        }
        self.creator = None;
        self.set_default_primitive_type();
    }

    fn set_default_primitive_type(&mut self) {
        self.primitive_type = self.default_primitive_type;
    }

    /// 命中对象可被选中时返回其 id；正在创建的对象除外。
    fn selectable_object(&self, scene: &Scene, hit: &Intersection) -> Option<DomainObjectId> {
        let id = hit.object?;
        if Some(id) == self.creating_object() {
            return None;
        }
        let object = scene.object(id)?;
        (object.can_be_selected() && object.is_legal()).then_some(id)
    }

    fn set_focus(&mut self, scene: &mut Scene, id: DomainObjectId, hit: &Intersection) {
        let Some(primitive_type) = scene.object(id).and_then(DomainObject::primitive_type) else {
            return;
        };
        if primitive_type.is_line() {
            scene.defocus_all(Some(id));
            scene.set_focus_interactive(id, FocusType::Focus, None);
            scene.render_target_mut().set_default_cursor();
            return;
        }
        if primitive_type.is_plane() || primitive_type == PrimitiveType::Point {
            scene.defocus_all(Some(id));
            scene.set_focus_interactive(id, FocusType::Focus, None);
            scene.render_target_mut().set_move_cursor();
            return;
        }
        let Some(pick) = hit.pick else {
            scene.defocus_all(None);
            scene.render_target_mut().set_default_cursor();
            return;
        };
        let target = scene.render_target_mut();
        match pick.focus_type {
            FocusType::Body => target.set_move_cursor(),
            FocusType::Face | FocusType::Corner => target.set_resize_cursor(),
            FocusType::Rotation => target.set_grab_cursor(),
            _ => target.set_default_cursor(),
        }
        scene.defocus_all(Some(id));
        scene.set_focus_interactive(id, pick.focus_type, pick.face);
    }
}

impl Default for PrimitiveEditTool {
    fn default() -> Self {
        Self::new(None)
    }
}
