pub mod changes;
pub mod command;
pub mod creators;
pub mod domain;
pub mod draggers;
pub mod observable;
pub mod panel;
pub mod primitives;
pub mod render;
pub mod scene;
pub mod style;
pub mod tool;
pub mod transaction;
pub mod undo;
pub mod views;

pub mod errors {
    use thiserror::Error;

    /// 场景树结构性误用。守卫式的空操作不会走到这里，而是返回 `false`。
    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum EngineError {
        #[error("domain object with id {0} not found")]
        ObjectNotFound(u64),
        #[error("domain object {0} already has a parent")]
        AlreadyHasParent(u64),
        #[error("domain object {0} cannot be added as a child of itself")]
        IllegalChild(u64),
        #[error("domain object with id {0} already exists in the scene")]
        DuplicateId(u64),
    }
}

pub use changes::{Change, ChangedDescription, DomainObjectChange};
pub use domain::{DomainKind, DomainObject, DomainObjectId, DomainType, FocusType, VisibleState};
pub use errors::EngineError;
pub use scene::{InteractionSettings, Scene};
pub use tool::{Intersection, PointerSample, PrimitiveEditTool};
pub use transaction::{Snapshot, Transaction};
pub use undo::UndoManager;
