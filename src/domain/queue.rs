// Pending output for a dump.

use std::collections::VecDeque;

use crate::domain::ast::{DeclId, QualType, Qualifiers};
use crate::domain::registry::NodeIndex;

/// One node waiting to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItem {
    Decl(DeclId),
    Type(QualType),
    /// A `CvQualifiedType` element over an already numbered node.
    CvQualified { base: NodeIndex, quals: Qualifiers },
}

/// Strict FIFO of work items, in discovery order.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    pub fn push(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::TypeId;

    #[test]
    fn test_fifo_order() {
        let mut q = WorkQueue::default();
        q.push(WorkItem::Decl(DeclId(3)));
        q.push(WorkItem::Type(QualType::new(TypeId(0))));
        q.push(WorkItem::Decl(DeclId(1)));
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(WorkItem::Decl(DeclId(3))));
        assert_eq!(q.pop(), Some(WorkItem::Type(QualType::new(TypeId(0)))));
        assert_eq!(q.pop(), Some(WorkItem::Decl(DeclId(1))));
        assert!(q.pop().is_none());
        assert!(q.is_empty());
    }
}
