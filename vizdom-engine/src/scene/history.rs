use tracing::{debug, warn};

use super::Scene;
use crate::changes::Change;
use crate::domain::{DomainKind, DomainObject, DomainObjectId};
use crate::transaction::{Snapshot, Transaction};

impl Scene {
    /// 为即将发生的变更记录撤销信息。根对象没有事务。
    pub fn create_transaction(&self, id: DomainObjectId, change: Change) -> Option<Transaction> {
        let object = self.objects.get(&id)?;
        if matches!(object.kind, DomainKind::Root) {
            return None;
        }
        let snapshot = match change {
            Change::Added => Snapshot::None,
            Change::Deleted => Snapshot::Subtree(
                self.this_and_descendants(id)
                    .into_iter()
                    .filter_map(|node| self.objects.get(&node))
                    .map(|node| (node.clone_object(None), node.parent))
                    .collect(),
            ),
            _ => Snapshot::Partial(Box::new(object.clone_object(Some(change)))),
        };
        Some(Transaction::new(id, object.parent, change, snapshot))
    }

    /// 压入撤销栈并清空重做栈。
    pub fn push_transaction(&mut self, transaction: Option<Transaction>) -> bool {
        let Some(transaction) = transaction else {
            return false;
        };
        debug!(
            id = transaction.object().get(),
            change = ?transaction.change(),
            "记录事务"
        );
        self.undo.push(transaction);
        true
    }

    /// 撤销最近一次事务。事务已失效（对象找不到）时丢弃并返回 false。
    pub fn undo(&mut self) -> bool {
        let Some(transaction) = self.undo.pop_undo() else {
            return false;
        };
        match self.apply_with_inverse(&transaction) {
            Some(inverse) => {
                self.undo.push_redo(inverse);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let Some(transaction) = self.undo.pop_redo() else {
            return false;
        };
        match self.apply_with_inverse(&transaction) {
            Some(inverse) => {
                self.undo.push_undo_keep_redo(inverse);
                true
            }
            None => false,
        }
    }

    /// 应用事务，返回能把结果再次还原的反向事务。
    fn apply_with_inverse(&mut self, transaction: &Transaction) -> Option<Transaction> {
        let id = transaction.object();
        let change = transaction.change();
        let before = match change {
            Change::Added => self.create_transaction(id, Change::Deleted),
            Change::Deleted => None,
            _ => self.create_transaction(id, change),
        };
        if !transaction.undo(self) {
            warn!(id = id.get(), change = ?change, "事务已失效，丢弃");
            return None;
        }
        debug!(id = id.get(), change = ?change, "事务已撤销");
        match change {
            Change::Deleted => self.create_transaction(id, Change::Added),
            _ => before,
        }
    }

    /// 把删除时保存的子树重新挂到 `parent` 下并显示。
    pub(crate) fn restore_subtree(
        &mut self,
        parent: DomainObjectId,
        nodes: &[(DomainObject, Option<DomainObjectId>)],
    ) -> bool {
        if nodes.iter().any(|(node, _)| self.objects.contains_key(&node.id())) {
            return false;
        }
        let mut top = None;
        for (node, node_parent) in nodes {
            let clone = node.clone_object(None);
            let Ok(id) = self.try_insert(clone) else {
                return false;
            };
            let attach_to = match top {
                None => parent,
                Some(_) => node_parent.unwrap_or(parent),
            };
            if let Err(err) = self.add_child(attach_to, id, false) {
                warn!(error = %err, "恢复子树失败");
                return false;
            }
            top.get_or_insert(id);
        }
        let Some(top) = top else {
            return false;
        };
        self.notify(parent, Change::ChildAdded);
        self.notify(top, Change::Added);
        self.set_visible_interactive(top, true);
        true
    }

    /// 把快照中属于 `change` 的字段复制回对象，重新通知并确保可见。
    pub(crate) fn restore_fields(
        &mut self,
        id: DomainObjectId,
        snapshot: &DomainObject,
        change: Change,
    ) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        object.copy_from(snapshot, Some(change));
        self.notify(id, change);
        self.set_visible_interactive(id, true);
        true
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use crate::changes::Change;
    use crate::domain::{DomainObject, DomainObjectId};
    use crate::primitives::Primitive;
    use crate::scene::Scene;
    use crate::transaction::Snapshot;

    fn visible_box(scene: &mut Scene) -> DomainObjectId {
        let id = scene.insert(DomainObject::primitive(Primitive::new_box(
            DVec3::ZERO,
            DVec3::ONE,
            0.0,
        )));
        let root = scene.root();
        assert!(scene.add_child_interactive(root, id));
        assert!(scene.set_visible_interactive(id, true));
        id
    }

    #[test]
    fn transactions_capture_the_right_snapshot() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let id = visible_box(&mut scene);

        assert!(scene.create_transaction(root, Change::Geometry).is_none());
        let added = scene.create_transaction(id, Change::Added).expect("added");
        assert!(matches!(added.snapshot(), Snapshot::None));
        let deleted = scene.create_transaction(id, Change::Deleted).expect("deleted");
        match deleted.snapshot() {
            Snapshot::Subtree(nodes) => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].0.id(), id);
                assert_eq!(nodes[0].1, Some(root));
            }
            other => panic!("unexpected snapshot {other:?}"),
        }
        let geometry = scene.create_transaction(id, Change::Geometry).expect("geometry");
        assert!(matches!(geometry.snapshot(), Snapshot::Partial(_)));
        assert_eq!(geometry.parent(), Some(root));
    }

    #[test]
    fn undo_and_redo_geometry_change() {
        let mut scene = Scene::headless();
        let id = visible_box(&mut scene);

        let transaction = scene.create_transaction(id, Change::Geometry);
        assert!(scene.set_primitive(id, Primitive::new_box(DVec3::X, DVec3::splat(2.0), 0.0)));
        scene.notify(id, Change::Geometry);
        assert!(scene.push_transaction(transaction));

        assert!(scene.undo());
        let restored = scene.primitive(id).and_then(Primitive::as_box).copied().expect("box");
        assert!(restored.center.abs_diff_eq(DVec3::ZERO, 1e-12));
        assert!(scene.undo_manager().can_redo());

        assert!(scene.redo());
        let redone = scene.primitive(id).and_then(Primitive::as_box).copied().expect("box");
        assert!(redone.size.abs_diff_eq(DVec3::splat(2.0), 1e-12));
        assert!(scene.undo_manager().can_undo());
        assert!(!scene.undo_manager().can_redo());
    }

    #[test]
    fn undo_delete_restores_subtree_under_parent() {
        let mut scene = Scene::headless();
        let root = scene.root();
        let id = visible_box(&mut scene);
        let name = scene.object(id).map(|object| object.name().to_string());

        assert!(scene.push_transaction(scene.create_transaction(id, Change::Deleted)));
        assert!(scene.remove_interactive(id, true));
        assert!(!scene.contains(id));

        assert!(scene.undo());
        assert!(scene.contains(id));
        assert_eq!(scene.object(id).and_then(DomainObject::parent), Some(root));
        assert_eq!(scene.object(id).map(|object| object.name().to_string()), name);
        assert!(scene.is_visible(id));

        // 重做即再次删除
        assert!(scene.redo());
        assert!(!scene.contains(id));
    }

    #[test]
    fn stale_transactions_are_dropped() {
        let mut scene = Scene::headless();
        let id = visible_box(&mut scene);
        assert!(scene.push_transaction(scene.create_transaction(id, Change::Color)));
        assert!(scene.remove_interactive(id, true));

        assert!(!scene.undo());
        assert!(!scene.undo_manager().can_undo());
        assert!(!scene.undo_manager().can_redo());
    }
}
