//! The variable-layout tree node.
//!
//! A node represents all item sets sharing the prefix spelled by the path
//! from the root, and stores one support counter per item that may extend
//! that prefix. Two layouts exist: a dense window (counter `i` belongs to
//! item `offset + i`) and a sparse one (an ascending item map parallel to
//! the counters). Child edges mirror the layout: dense nodes address their
//! children by item offset in a slot array that may contain gaps, sparse
//! nodes keep a packed, ascending `(item, child)` list.
//!
//! Flags that pointer-based formulations of such trees tend to pack into
//! sign bits are explicit here: per-counter SKIP flags live in a bit
//! vector, the subtree skip mark and the head-only mark are plain fields.

use vob::Vob;

use basket::{ItemId, Supp};

/// Index handle of a node in the tree arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node of any tree.
    pub(crate) const ROOT: NodeId = NodeId(0);
}

/// How the counter window addresses its items.
#[derive(Clone, Debug)]
pub(crate) enum Layout {
    /// Counter `i` belongs to item `offset + i`.
    Dense { offset: ItemId },
    /// Counter `i` belongs to `map[i]`; the map ascends strictly.
    Sparse { map: Vec<ItemId> },
}

/// Child edges of a node.
#[derive(Clone, Debug)]
pub(crate) enum ChildSlots {
    /// Slot `i` belongs to edge item `first + i`; empty slots are `None`.
    Dense {
        first: ItemId,
        slots: Vec<Option<NodeId>>,
    },
    /// Packed `(edge item, child)` pairs, ascending by edge item.
    Packed { slots: Vec<(ItemId, NodeId)> },
}

impl ChildSlots {
    /// The child reached over `item`, if any.
    pub(crate) fn get(&self, item: ItemId) -> Option<NodeId> {
        match self {
            ChildSlots::Dense { first, slots } => {
                if item < *first {
                    return None;
                }
                slots.get(item - first).copied().flatten()
            }
            ChildSlots::Packed { slots } => slots
                .binary_search_by_key(&item, |&(it, _)| it)
                .ok()
                .map(|i| slots[i].1),
        }
    }

}

/// A tree node. The counter cells always hold the true support; SKIP marks
/// live next to them in `skip`.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    /// Item labeling the edge from the parent; 0 (unused) at the root.
    pub(crate) item: ItemId,
    /// Set when the represented prefix contains a head-only item.
    pub(crate) head_only: bool,
    pub(crate) layout: Layout,
    pub(crate) cnts: Vec<Supp>,
    /// Per-counter SKIP flags, same length as `cnts`.
    pub(crate) skip: Vob,
    pub(crate) children: Option<ChildSlots>,
    /// Subtree skip mark: counting passes ignore the whole subtree.
    pub(crate) cut: bool,
}

impl Node {
    pub(crate) fn new(
        parent: Option<NodeId>,
        item: ItemId,
        head_only: bool,
        layout: Layout,
        size: usize,
    ) -> Self {
        Self {
            parent,
            item,
            head_only,
            layout,
            cnts: vec![0; size],
            skip: Vob::from_elem(size, false),
            children: None,
            cut: false,
        }
    }

    /// Number of counters in the window.
    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.cnts.len()
    }

    /// The item a counter index belongs to.
    #[inline]
    pub(crate) fn item_at(&self, index: usize) -> ItemId {
        match &self.layout {
            Layout::Dense { offset } => offset + index,
            Layout::Sparse { map } => map[index],
        }
    }

    /// Index of the counter for `item`; on a miss the insertion position is
    /// reported in the error, mirroring `slice::binary_search`.
    pub(crate) fn counter_index(&self, item: ItemId) -> Result<usize, usize> {
        match &self.layout {
            Layout::Dense { offset } => {
                if item < *offset {
                    Err(0)
                } else if item - offset < self.cnts.len() {
                    Ok(item - offset)
                } else {
                    Err(self.cnts.len())
                }
            }
            Layout::Sparse { map } => map.binary_search(&item),
        }
    }

    /// Whether the counter at `index` carries the SKIP flag.
    #[inline]
    pub(crate) fn skipped(&self, index: usize) -> bool {
        self.skip.get(index).unwrap_or(false)
    }

    #[inline]
    pub(crate) fn set_skip(&mut self, index: usize) {
        self.skip.set(index, true);
    }

    /// Replaces counters, map and flags with the given window; used by the
    /// pruning pass.
    pub(crate) fn shrink_dense(&mut self, lo: usize, hi: usize) {
        debug_assert!(matches!(self.layout, Layout::Dense { .. }));
        if let Layout::Dense { offset } = &mut self.layout {
            *offset += lo;
        }
        let mut skip = Vob::from_elem(hi.saturating_sub(lo), false);
        for (k, i) in (lo..hi).enumerate() {
            if self.skip.get(i).unwrap_or(false) {
                skip.set(k, true);
            }
        }
        self.cnts = self.cnts[lo..hi].to_vec();
        self.skip = skip;
    }
}
