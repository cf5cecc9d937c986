use std::time::SystemTime;

use crate::changes::Change;
use crate::domain::{DomainObject, DomainObjectId};
use crate::scene::Scene;

/// 撤销所需的对象快照。
#[derive(Debug)]
pub enum Snapshot {
    /// `Added`：撤销即删除，无需快照。
    None,
    /// `Deleted`：被删子树的完整副本（先序），以及各节点原来的父节点。
    Subtree(Vec<(DomainObject, Option<DomainObjectId>)>),
    /// 其它变更：只含该变更类型所拥有字段的部分副本。
    Partial(Box<DomainObject>),
}

/// 一条撤销记录。创建后不可变，撤销时总是按 id 重新查找对象。
#[derive(Debug)]
pub struct Transaction {
    object: DomainObjectId,
    parent: Option<DomainObjectId>,
    change: Change,
    timestamp: SystemTime,
    snapshot: Snapshot,
}

impl Transaction {
    pub fn new(
        object: DomainObjectId,
        parent: Option<DomainObjectId>,
        change: Change,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            object,
            parent,
            change,
            timestamp: SystemTime::now(),
            snapshot,
        }
    }

    #[inline]
    pub fn object(&self) -> DomainObjectId {
        self.object
    }

    #[inline]
    pub fn parent(&self) -> Option<DomainObjectId> {
        self.parent
    }

    #[inline]
    pub fn change(&self) -> Change {
        self.change
    }

    #[inline]
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    #[inline]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// 把场景还原到事务记录前的状态。引用的对象（删除时为父对象）已不存在时返回 false。
    pub fn undo(&self, scene: &mut Scene) -> bool {
        match &self.snapshot {
            Snapshot::None => {
                scene.contains(self.object) && scene.remove_interactive(self.object, false)
            }
            Snapshot::Subtree(nodes) => {
                let Some(parent) = self.parent else {
                    return false;
                };
                if !scene.contains(parent) || scene.contains(self.object) {
                    return false;
                }
                scene.restore_subtree(parent, nodes)
            }
            Snapshot::Partial(snapshot) => {
                scene.contains(self.object)
                    && scene.restore_fields(self.object, snapshot, self.change)
            }
        }
    }
}
