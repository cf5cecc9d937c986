use tracing::{debug, warn};

use super::Scene;
use crate::changes::Change;
use crate::domain::{DomainObject, DomainObjectId, DomainType};
use crate::errors::EngineError;

impl Scene {
    /// 把游离对象挂到 `parent` 下。父指针与子列表在同一处更新。
    pub fn add_child(
        &mut self,
        parent: DomainObjectId,
        child: DomainObjectId,
        insert_first: bool,
    ) -> Result<(), EngineError> {
        if parent == child {
            return Err(EngineError::IllegalChild(child.get()));
        }
        if !self.objects.contains_key(&parent) {
            return Err(EngineError::ObjectNotFound(parent.get()));
        }
        let Some(object) = self.objects.get(&child) else {
            return Err(EngineError::ObjectNotFound(child.get()));
        };
        if object.parent.is_some() || child == self.root {
            return Err(EngineError::AlreadyHasParent(child.get()));
        }
        if self.ancestors(parent).contains(&child) {
            return Err(EngineError::IllegalChild(child.get()));
        }

        if let Some(parent_object) = self.objects.get_mut(&parent) {
            if insert_first {
                parent_object.children.insert(0, child);
            } else {
                parent_object.children.push(child);
            }
        }
        let name = self.generate_name(parent, child);
        if let Some(object) = self.objects.get_mut(&child) {
            object.parent = Some(parent);
            if let Some(name) = name {
                object.name = Some(name);
            }
        }
        debug!(parent = parent.get(), child = child.get(), "挂载子对象");
        Ok(())
    }

    /// 挂载并通知：父对象 `ChildAdded`，子对象 `Added`。
    pub fn add_child_interactive(&mut self, parent: DomainObjectId, child: DomainObjectId) -> bool {
        if let Err(err) = self.add_child(parent, child, false) {
            warn!(error = %err, "挂载子对象失败");
            return false;
        }
        self.notify(parent, Change::ChildAdded);
        self.notify(child, Change::Added);
        true
    }

    /// 删除对象及其子树。子对象先于自身删除；自身依次收到 `Deleting`、`Deleted`，
    /// 随后父对象收到 `ChildDeleted`。
    pub fn remove_interactive(&mut self, id: DomainObjectId, check_can_be_removed: bool) -> bool {
        let Some(object) = self.objects.get(&id) else {
            return false;
        };
        if id == self.root || (check_can_be_removed && !object.can_be_removed()) {
            warn!(id = id.get(), "对象不可删除");
            return false;
        }
        let children = object.children.clone();
        let parent = object.parent;
        let is_plane = object.primitive_type().is_some_and(|kind| kind.is_plane());

        for child in children {
            self.remove_interactive(child, false);
        }
        self.notify(id, Change::Deleting);
        self.notify(id, Change::Deleted);

        if let Some(parent) = parent {
            if let Some(parent_object) = self.objects.get_mut(&parent) {
                parent_object.children.retain(|child| *child != id);
            }
        }
        if let Some(mut object) = self.objects.remove(&id) {
            object.parent = None;
            object.dispose();
        }
        debug!(id = id.get(), "对象已删除");

        if let Some(parent) = parent {
            self.notify(parent, Change::ChildDeleted);
        }
        if is_plane {
            self.update_global_clipping();
        }
        true
    }

    /// 子孙节点（先序，父先于子）。返回快照，遍历期间修改树是安全的。
    pub fn descendants(&self, id: DomainObjectId) -> Vec<DomainObjectId> {
        let mut result = Vec::new();
        self.collect_descendants(id, &mut result);
        result
    }

    fn collect_descendants(&self, id: DomainObjectId, result: &mut Vec<DomainObjectId>) {
        let Some(object) = self.objects.get(&id) else {
            return;
        };
        for child in &object.children {
            result.push(*child);
            self.collect_descendants(*child, result);
        }
    }

    pub fn this_and_descendants(&self, id: DomainObjectId) -> Vec<DomainObjectId> {
        if !self.objects.contains_key(&id) {
            return Vec::new();
        }
        let mut result = vec![id];
        self.collect_descendants(id, &mut result);
        result
    }

    /// 祖先节点，从直接父节点到根。
    pub fn ancestors(&self, id: DomainObjectId) -> Vec<DomainObjectId> {
        let mut result = Vec::new();
        let mut current = self.objects.get(&id).and_then(DomainObject::parent);
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.objects.get(&ancestor).and_then(DomainObject::parent);
        }
        result
    }

    pub fn descendants_by_type(&self, id: DomainObjectId, filter: DomainType) -> Vec<DomainObjectId> {
        self.descendants(id)
            .into_iter()
            .filter(|descendant| self.matches(*descendant, filter))
            .collect()
    }

    pub fn this_or_descendant_by_unique_id(
        &self,
        id: DomainObjectId,
        unique_id: DomainObjectId,
    ) -> Option<DomainObjectId> {
        self.this_and_descendants(id)
            .into_iter()
            .find(|candidate| *candidate == unique_id)
    }

    pub fn child_by_type(&self, id: DomainObjectId, filter: DomainType) -> Option<DomainObjectId> {
        self.objects
            .get(&id)?
            .children
            .iter()
            .copied()
            .find(|child| self.matches(*child, filter))
    }

    pub fn child_by_name(&self, id: DomainObjectId, name: &str) -> Option<DomainObjectId> {
        self.objects
            .get(&id)?
            .children
            .iter()
            .copied()
            .find(|child| {
                self.objects
                    .get(child)
                    .is_some_and(|object| object.has_equal_name(name))
            })
    }

    /// 自身或子孙中第一个被选中的对象。
    pub fn selected_descendant(&self, id: DomainObjectId) -> Option<DomainObjectId> {
        self.this_and_descendants(id).into_iter().find(|candidate| {
            self.objects
                .get(candidate)
                .is_some_and(DomainObject::is_selected)
        })
    }

    fn matches(&self, id: DomainObjectId, filter: DomainType) -> bool {
        self.objects
            .get(&id)
            .is_some_and(|object| filter.matches(object.kind()))
    }

    /// 未命名对象的默认名：类型名加同类兄弟中的序号（从 1 开始）。
    fn generate_name(&self, parent: DomainObjectId, child: DomainObjectId) -> Option<String> {
        let object = self.objects.get(&child)?;
        if object.has_name() || !object.can_change_name() {
            return None;
        }
        let type_name = object.type_name();
        let siblings = &self.objects.get(&parent)?.children;
        let mut index = 0;
        for sibling in siblings {
            if *sibling == child {
                break;
            }
            if self
                .objects
                .get(sibling)
                .is_some_and(|other| other.type_name() == type_name)
            {
                index += 1;
            }
        }
        Some(format!("{type_name} {}", index + 1))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::DVec3;

    use crate::changes::Change;
    use crate::domain::{DomainObject, DomainType};
    use crate::errors::EngineError;
    use crate::primitives::{Primitive, PrimitiveType};
    use crate::scene::Scene;

    fn add_box(scene: &mut Scene, parent: crate::domain::DomainObjectId) -> crate::domain::DomainObjectId {
        let id = scene.insert(DomainObject::primitive(Primitive::new_box(
            DVec3::ZERO,
            DVec3::ONE,
            0.0,
        )));
        scene.add_child(parent, id, false).expect("attach box");
        id
    }

    #[test]
    fn add_child_rejects_structural_misuse() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let folder = scene.insert(DomainObject::folder());
        assert_eq!(
            scene.add_child(folder, folder, false),
            Err(EngineError::IllegalChild(folder.get()))
        );
        scene.add_child(root, folder, false).expect("attach folder");
        assert_eq!(
            scene.add_child(root, folder, false),
            Err(EngineError::AlreadyHasParent(folder.get()))
        );
        let detached = DomainObject::folder();
        let unknown = detached.id();
        assert_eq!(
            scene.add_child(unknown, folder, false),
            Err(EngineError::ObjectNotFound(unknown.get()))
        );
        assert_eq!(scene.object(folder).and_then(DomainObject::parent), Some(root));
    }

    #[test]
    fn traversal_is_pre_order() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let folder = scene.insert(DomainObject::folder());
        scene.add_child(root, folder, false).expect("attach folder");
        let first = add_box(&mut scene, folder);
        let second = add_box(&mut scene, root);
        let nested = add_box(&mut scene, folder);

        assert_eq!(scene.descendants(root), vec![folder, first, nested, second]);
        assert_eq!(scene.this_and_descendants(folder), vec![folder, first, nested]);
        assert_eq!(scene.ancestors(nested), vec![folder, root]);
        assert_eq!(
            scene.descendants_by_type(root, DomainType::PrimitiveOf(PrimitiveType::Box)),
            vec![first, nested, second]
        );
        assert_eq!(scene.child_by_type(root, DomainType::Primitive), Some(second));
        assert_eq!(scene.this_or_descendant_by_unique_id(root, nested), Some(nested));
        assert_eq!(scene.this_or_descendant_by_unique_id(folder, second), None);
    }

    #[test]
    fn insert_first_and_generated_names() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let first = add_box(&mut scene, root);
        let second = add_box(&mut scene, root);
        assert_eq!(scene.object(first).map(DomainObject::name), Some("Box 1"));
        assert_eq!(scene.object(second).map(DomainObject::name), Some("Box 2"));
        assert_eq!(scene.child_by_name(root, "box 2"), Some(second));

        let folder = scene.insert(DomainObject::folder());
        scene.add_child(root, folder, true).expect("insert first");
        assert_eq!(scene.object(root).map(|root| root.children()[0]), Some(folder));
    }

    #[test]
    fn remove_interactive_fires_events_in_order() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let folder = scene.insert(DomainObject::folder());
        scene.add_child(root, folder, false).expect("attach folder");
        let child = add_box(&mut scene, folder);

        let events = Rc::new(RefCell::new(Vec::new()));
        for id in [root, folder, child] {
            let log = Rc::clone(&events);
            scene
                .object_mut(id)
                .expect("object")
                .add_event_listener(move |object, change| {
                    for token in change.changes() {
                        log.borrow_mut().push((object.id(), token));
                    }
                });
        }

        assert!(!scene.remove_interactive(root, true));
        assert!(scene.remove_interactive(folder, true));
        assert!(!scene.contains(folder));
        assert!(!scene.contains(child));
        assert!(scene.object(root).is_some_and(|root| root.children().is_empty()));

        let events = events.borrow();
        assert_eq!(
            events.as_slice(),
            &[
                (child, Change::Deleting),
                (child, Change::Deleted),
                (folder, Change::ChildDeleted),
                (folder, Change::Deleting),
                (folder, Change::Deleted),
                (root, Change::ChildDeleted),
            ]
        );
    }

    #[test]
    fn add_child_interactive_notifies_parent_then_child() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let events = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&events);
        scene
            .object_mut(root)
            .expect("root")
            .add_event_listener(move |_, change| log.borrow_mut().extend(change.changes()));

        let id = scene.insert(DomainObject::primitive(Primitive::new(PrimitiveType::Point)));
        let child_log = Rc::clone(&events);
        scene
            .object_mut(id)
            .expect("point")
            .add_event_listener(move |_, change| child_log.borrow_mut().extend(change.changes()));

        assert!(scene.add_child_interactive(root, id));
        assert!(!scene.add_child_interactive(root, id));
        assert_eq!(events.borrow().as_slice(), &[Change::ChildAdded, Change::Added]);
    }
}
