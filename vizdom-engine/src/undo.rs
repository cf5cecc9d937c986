use std::collections::VecDeque;

use tracing::debug;

use crate::domain::DomainObjectId;
use crate::transaction::Transaction;

pub const DEFAULT_MAX_DEPTH: usize = 50;

/// 撤销/重做栈。每个手势一条事务；超过上限时丢弃最旧的记录。
#[derive(Debug)]
pub struct UndoManager {
    undo_stack: VecDeque<Transaction>,
    redo_stack: Vec<Transaction>,
    max_depth: usize,
}

impl UndoManager {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        self.trim();
    }

    /// 新事务会使重做栈失效。
    pub fn push(&mut self, transaction: Transaction) {
        self.redo_stack.clear();
        self.push_undo_keep_redo(transaction);
    }

    pub(crate) fn push_undo_keep_redo(&mut self, transaction: Transaction) {
        self.undo_stack.push_back(transaction);
        self.trim();
    }

    pub(crate) fn push_redo(&mut self, transaction: Transaction) {
        self.redo_stack.push(transaction);
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Transaction> {
        self.undo_stack.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Transaction> {
        self.redo_stack.pop()
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!(id = dropped.object().get(), "撤销栈已满，丢弃最旧事务");
            }
        }
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[inline]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    #[inline]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn peek_undo(&self) -> Option<&Transaction> {
        self.undo_stack.back()
    }

    /// 丢弃与某个对象相关的全部记录（例如放弃创建时），返回丢弃数量。
    pub fn remove_for(&mut self, id: DomainObjectId) -> usize {
        let before = self.undo_stack.len() + self.redo_stack.len();
        self.undo_stack.retain(|transaction| transaction.object() != id);
        self.redo_stack.retain(|transaction| transaction.object() != id);
        before - self.undo_stack.len() - self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
