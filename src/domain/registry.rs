//! Dump Node Registry
//!
//! Tracks which declarations, types and source files have been reached during
//! a dump, hands out their XML ids and decides when each one is queued.
//!
//! Declarations and types are numbered from one shared [`IdAllocator`], so ids
//! reflect discovery order across both kinds. Files use a separate counter.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use crate::domain::ast::{DeclId, FileId, QualType, Qualifiers};
use crate::domain::queue::{WorkItem, WorkQueue};

// ═══════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════

/// XML id of a node, rendered as `_<n>`. Numbering starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

/// XML id of a source file, rendered as `f<n>`. Numbering starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileIndex(u32);

impl FileIndex {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Single counter shared by every node identity space of one dump.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    pub fn allocate(&mut self) -> NodeIndex {
        self.last += 1;
        NodeIndex(self.last)
    }

    /// Number of ids handed out so far.
    pub fn count(&self) -> u32 {
        self.last
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Node status
// ═══════════════════════════════════════════════════════════════════════════

/// Dump status of one declaration or type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpNode {
    pub index: NodeIndex,
    /// Whether the node is to be written in full rather than as a stub.
    pub complete: bool,
    /// Whether the element has been written.
    pub emitted: bool,
}

/// Which registrations get queued without an explicit request for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    RequireComplete,
    AcceptIncomplete,
}

/// Outcome of one registration against a [`NodeMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub index: NodeIndex,
    pub enqueue: bool,
}

/// Identity-to-status map for one identity space.
#[derive(Debug)]
pub struct NodeMap<K> {
    nodes: BTreeMap<K, DumpNode>,
}

impl<K> Default for NodeMap<K> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> NodeMap<K> {
    /// Look up or create the node for `key`, upgrading it to complete when asked.
    pub fn register(
        &mut self,
        key: K,
        complete: bool,
        ids: &mut IdAllocator,
        phase: Phase,
    ) -> Registration {
        if let Some(node) = self.nodes.get_mut(&key) {
            let upgrade = complete && !node.complete;
            if upgrade {
                node.complete = true;
            }
            return Registration {
                index: node.index,
                enqueue: upgrade,
            };
        }

        let index = ids.allocate();
        self.nodes.insert(
            key,
            DumpNode {
                index,
                complete,
                emitted: false,
            },
        );
        Registration {
            index,
            enqueue: complete || phase == Phase::AcceptIncomplete,
        }
    }

    pub fn get(&self, key: &K) -> Option<&DumpNode> {
        self.nodes.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut DumpNode> {
        self.nodes.get_mut(key)
    }

    fn incomplete(&self) -> impl Iterator<Item = (K, NodeIndex)> + '_ {
        self.nodes
            .iter()
            .filter(|(_, n)| !n.complete)
            .map(|(k, n)| (*k, n.index))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════

/// All node bookkeeping of one dump: both identity maps, the shared id
/// allocator, the current phase and the work queue they feed.
#[derive(Debug)]
pub struct Registry {
    ids: IdAllocator,
    decls: NodeMap<DeclId>,
    types: NodeMap<QualType>,
    cv_qualified: BTreeSet<(NodeIndex, Qualifiers)>,
    phase: Phase,
    queue: WorkQueue,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            ids: IdAllocator::default(),
            decls: NodeMap::default(),
            types: NodeMap::default(),
            cv_qualified: BTreeSet::new(),
            phase: Phase::RequireComplete,
            queue: WorkQueue::default(),
        }
    }
}

impl Registry {
    /// Register a canonical declaration and return its stable id.
    pub fn register_decl(&mut self, decl: DeclId, complete: bool) -> NodeIndex {
        let reg = self.decls.register(decl, complete, &mut self.ids, self.phase);
        if reg.enqueue {
            self.queue.push(WorkItem::Decl(decl));
        }
        reg.index
    }

    /// Register a type identity and return its stable id.
    pub fn register_type(&mut self, ty: QualType, complete: bool) -> NodeIndex {
        let reg = self.types.register(ty, complete, &mut self.ids, self.phase);
        if reg.enqueue {
            self.queue.push(WorkItem::Type(ty));
        }
        reg.index
    }

    /// Queue a `CvQualifiedType` element for `base` + `quals` the first time the
    /// pair is seen. Returns whether it was new.
    pub fn register_cv_qualified(&mut self, base: NodeIndex, quals: Qualifiers) -> bool {
        let new = self.cv_qualified.insert((base, quals));
        if new {
            self.queue.push(WorkItem::CvQualified { base, quals });
        }
        new
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Leave the require-complete phase and queue every node still incomplete,
    /// in discovery order. Returns how many nodes were queued.
    pub fn accept_incomplete(&mut self) -> usize {
        self.phase = Phase::AcceptIncomplete;

        let mut pending: Vec<(NodeIndex, WorkItem)> = self
            .decls
            .incomplete()
            .map(|(d, i)| (i, WorkItem::Decl(d)))
            .chain(self.types.incomplete().map(|(t, i)| (i, WorkItem::Type(t))))
            .collect();
        pending.sort_by_key(|(index, _)| *index);

        let count = pending.len();
        for (_, item) in pending {
            self.queue.push(item);
        }
        count
    }

    pub fn next_item(&mut self) -> Option<WorkItem> {
        self.queue.pop()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn decl_node(&self, decl: DeclId) -> Option<&DumpNode> {
        self.decls.get(&decl)
    }

    pub fn type_node(&self, ty: QualType) -> Option<&DumpNode> {
        self.types.get(&ty)
    }

    /// Claim the right to write `item`. Returns the node status, or `None` when
    /// the element was already written.
    pub fn begin_output(&mut self, item: WorkItem) -> Option<DumpNode> {
        let node = match item {
            WorkItem::Decl(d) => self.decls.get_mut(&d)?,
            WorkItem::Type(t) => self.types.get_mut(&t)?,
            WorkItem::CvQualified { .. } => return None,
        };
        if node.emitted {
            return None;
        }
        node.emitted = true;
        Some(*node)
    }

    /// Number of node ids handed out.
    pub fn node_count(&self) -> u32 {
        self.ids.count()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Files
// ═══════════════════════════════════════════════════════════════════════════

/// Source files referenced by locations, numbered independently of nodes.
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: BTreeMap<FileId, FileIndex>,
    queue: VecDeque<(FileId, FileIndex)>,
}

impl FileRegistry {
    pub fn register(&mut self, file: FileId) -> FileIndex {
        let next = FileIndex(self.files.len() as u32 + 1);
        let queue = &mut self.queue;
        *self.files.entry(file).or_insert_with(|| {
            queue.push_back((file, next));
            next
        })
    }

    pub fn next_file(&mut self) -> Option<(FileId, FileIndex)> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::TypeId;

    fn int() -> QualType {
        QualType::new(TypeId(0))
    }

    #[test]
    fn test_shared_numbering_across_kinds() {
        let mut reg = Registry::default();
        assert_eq!(reg.register_decl(DeclId(7), true).get(), 1);
        assert_eq!(reg.register_type(int(), false).get(), 2);
        assert_eq!(reg.register_decl(DeclId(2), false).get(), 3);
        assert_eq!(reg.register_type(int().with(Qualifiers::CONST), false).get(), 4);
        assert_eq!(reg.node_count(), 4);
    }

    #[test]
    fn test_register_is_stable() {
        let mut reg = Registry::default();
        let first = reg.register_decl(DeclId(1), false);
        let again = reg.register_decl(DeclId(1), true);
        let third = reg.register_decl(DeclId(1), false);
        assert_eq!(first, again);
        assert_eq!(first, third);
    }

    #[test]
    fn test_stub_not_queued_in_first_phase() {
        let mut reg = Registry::default();
        reg.register_decl(DeclId(1), false);
        reg.register_type(int(), false);
        assert_eq!(reg.pending(), 0);
    }

    #[test]
    fn test_node_map_register_outcomes() {
        let mut ids = IdAllocator::default();
        let mut map: NodeMap<DeclId> = NodeMap::default();
        assert!(map.is_empty());

        let stub = map.register(DeclId(4), false, &mut ids, Phase::RequireComplete);
        assert!(!stub.enqueue);
        let upgrade = map.register(DeclId(4), true, &mut ids, Phase::RequireComplete);
        assert_eq!(upgrade.index, stub.index);
        assert!(upgrade.enqueue);

        let late = map.register(DeclId(5), false, &mut ids, Phase::AcceptIncomplete);
        assert!(late.enqueue);
        assert_eq!(map.len(), 2);
        assert_eq!(ids.count(), 2);
    }

    #[test]
    fn test_qualified_types_are_distinct_identities() {
        let mut reg = Registry::default();
        let plain = reg.register_type(int(), true);
        let konst = reg.register_type(int().with(Qualifiers::CONST), false);
        assert_ne!(plain, konst);
        assert!(reg.type_node(int()).unwrap().complete);
        assert!(!reg.type_node(int().with(Qualifiers::CONST)).unwrap().complete);
        assert!(reg.type_node(QualType::new(TypeId(9))).is_none());
    }

    #[test]
    fn test_upgrade_queues_once() {
        let mut reg = Registry::default();
        reg.register_decl(DeclId(1), false);
        assert_eq!(reg.pending(), 0);

        reg.register_decl(DeclId(1), true);
        assert_eq!(reg.pending(), 1);
        assert!(reg.decl_node(DeclId(1)).unwrap().complete);

        // Already complete: no re-enqueue, no downgrade.
        reg.register_decl(DeclId(1), true);
        reg.register_decl(DeclId(1), false);
        assert_eq!(reg.pending(), 1);
        assert!(reg.decl_node(DeclId(1)).unwrap().complete);
    }

    #[test]
    fn test_accept_incomplete_sweeps_in_discovery_order() {
        let mut reg = Registry::default();
        reg.register_type(int(), false); // _1
        reg.register_decl(DeclId(9), true); // _2
        reg.register_decl(DeclId(3), false); // _3
        assert_eq!(reg.next_item(), Some(WorkItem::Decl(DeclId(9))));
        assert!(reg.next_item().is_none());

        assert_eq!(reg.accept_incomplete(), 2);
        assert_eq!(reg.phase(), Phase::AcceptIncomplete);
        assert_eq!(reg.next_item(), Some(WorkItem::Type(int())));
        assert_eq!(reg.next_item(), Some(WorkItem::Decl(DeclId(3))));

        // New stubs are queued immediately once incomplete nodes are accepted.
        reg.register_decl(DeclId(4), false);
        assert_eq!(reg.next_item(), Some(WorkItem::Decl(DeclId(4))));
    }

    #[test]
    fn test_begin_output_only_once() {
        let mut reg = Registry::default();
        reg.register_decl(DeclId(1), true);
        let item = WorkItem::Decl(DeclId(1));
        let node = reg.begin_output(item).unwrap();
        assert_eq!(node.index.get(), 1);
        assert!(node.complete);
        assert!(reg.begin_output(item).is_none());
    }

    #[test]
    fn test_cv_qualified_pairs_dedup() {
        let mut reg = Registry::default();
        let base = reg.register_type(int(), true);
        reg.next_item();
        assert!(reg.register_cv_qualified(base, Qualifiers::CONST));
        assert!(!reg.register_cv_qualified(base, Qualifiers::CONST));
        assert!(reg.register_cv_qualified(base, Qualifiers::CONST | Qualifiers::VOLATILE));
        assert_eq!(reg.pending(), 2);
        // No id is spent on qualified forms.
        assert_eq!(reg.node_count(), 1);
    }

    #[test]
    fn test_file_numbering_is_separate() {
        let mut reg = Registry::default();
        let mut files = FileRegistry::default();
        assert!(files.is_empty());
        reg.register_decl(DeclId(0), true);
        let a = files.register(FileId(5));
        let b = files.register(FileId(2));
        assert_eq!(files.register(FileId(5)), a);
        assert_eq!(a.to_string(), "f1");
        assert_eq!(b.to_string(), "f2");
        assert_eq!(files.next_file(), Some((FileId(5), a)));
        assert_eq!(files.next_file(), Some((FileId(2), b)));
        assert!(files.next_file().is_none());
        assert_eq!(files.len(), 2);
    }
}
