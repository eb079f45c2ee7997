//! # The item set tree
//!
//! A prefix tree of support counters over an item-base snapshot. The tree
//! owns its nodes in a flat arena (`nodes`); `levels[d]` lists the nodes of
//! depth `d` in creation order, which is also the traversal order of the
//! extraction cursor. The root is the sole node of level 0 and its counters
//! hold the singleton supports.
//!
//! A mining run alternates strictly between counting passes, which only add
//! transaction weights to counters of the deepest level, and structural
//! passes (`add_level`, `prune`), which may reshape nodes. The tree is
//! single-threaded and self-contained; dropping it abandons the run.

use vob::Vob;

use basket::{Appearance, ItemBase, ItemId, Supp};

use crate::Depth;

pub use eval::{Agg, EvalConfig};
pub use extract::{FoundRule, FoundSet};
pub use mark::Marking;
pub use node::NodeId;

use extract::Cursor;
use node::{ChildSlots, Layout, Node};

mod count;
mod eval;
mod extract;
mod grow;
mod mark;
mod node;
mod prune;
mod report;

#[cfg(test)]
mod test;

/// Construction options for an [`ItemsetTree`].
#[derive(Clone, Copy, Debug)]
pub struct TreeOptions {
    /// Absolute minimum support of a frequent item set.
    pub supp: Supp,
    /// Maximum support of a reported item set (`Supp::MAX` for no bound).
    pub smax: Supp,
    /// Minimum rule confidence in [0, 1].
    pub conf: f64,
    /// Suppress perfect extensions during candidate generation; they are
    /// re-attached by the reporter traversal.
    pub perfect: bool,
    /// Tree is built for rule mining: the set-support threshold is lowered
    /// to `ceil(conf·supp)`, since a rule only needs that much set support
    /// when its body meets the body-support threshold.
    pub rules: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            supp: 1,
            smax: Supp::MAX,
            conf: 1.0,
            perfect: false,
            rules: false,
        }
    }
}

/// Result of following a path of items down to a counter.
#[derive(Clone, Copy, Debug)]
pub(crate) enum PathSupp {
    /// The path leaves the represented ranges; the support is below the
    /// minimum support (or the set was never a candidate).
    Absent,
    /// The path ends in a counter.
    Counted { supp: Supp, skip: bool },
}

impl PathSupp {
    /// The support if counted, else 0.
    pub(crate) fn supp(self) -> Supp {
        match self {
            PathSupp::Absent => 0,
            PathSupp::Counted { supp, .. } => supp,
        }
    }
}

/// The item set tree. See the module documentation.
pub struct ItemsetTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) levels: Vec<Vec<NodeId>>,
    /// Appearance flags, snapshot from the item base.
    pub(crate) apps: Vec<Appearance>,
    /// Total transaction weight; the support of the empty set.
    pub(crate) wgt: Supp,
    /// SKIP mark of the empty set (set by closed/maximal marking).
    pub(crate) empty_cut: bool,
    /// Minimum support of a frequent set.
    pub(crate) supp: Supp,
    /// Maximum support of a reported set.
    pub(crate) smax: Supp,
    /// Minimum support of a rule body.
    pub(crate) rule: Supp,
    /// Minimum confidence, pre-scaled by (1 − ε) to absorb roundoff.
    pub(crate) conf: f64,
    pub(crate) perfect: bool,
    pub(crate) eval: eval::EvalState,
    /// Scratch item buffer for candidate generation; always at least
    /// `height + 2` long, resized only by `add_level`.
    pub(crate) buf: Vec<ItemId>,
    pub(crate) cursor: Cursor,
    /// Current node of the step-wise navigation interface.
    curr: NodeId,
}

impl ItemsetTree {
    /// Creates a tree over a snapshot of `base`: item count, per-item
    /// frequencies and appearance flags, and the total transaction weight.
    /// The root counters are seeded with the singleton supports, so the
    /// first counting pass runs after the first [`add_level`].
    ///
    /// Thresholds are clamped to sensible minima: the body-support
    /// threshold and the set-support threshold to at least 1, the maximum
    /// support to at least the body-support threshold.
    ///
    /// [`add_level`]: ItemsetTree::add_level
    pub fn new(base: &ItemBase, opts: TreeOptions) -> Self {
        let cnt = base.cnt();
        let rule = opts.supp.max(1);
        let smax = opts.smax.max(rule);
        let supp = if opts.rules {
            ((opts.conf * opts.supp as f64).ceil() as Supp).max(1)
        } else {
            opts.supp.max(1)
        };
        let mut root = Node::new(None, 0, false, Layout::Dense { offset: 0 }, cnt);
        for item in 0..cnt {
            root.cnts[item] = base.frq(item);
        }
        Self {
            nodes: vec![root],
            levels: vec![vec![NodeId::ROOT]],
            apps: (0..cnt).map(|i| base.app(i)).collect(),
            wgt: base.wgt(),
            empty_cut: false,
            supp,
            smax,
            rule,
            conf: opts.conf * (1.0 - f64::EPSILON),
            perfect: opts.perfect,
            eval: eval::EvalState::default(),
            buf: vec![0; 4],
            cursor: Cursor::default(),
            curr: NodeId::ROOT,
        }
    }

    /// Current height: the number of levels, which is also the size of the
    /// largest item sets that have counters.
    #[inline]
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Total transaction weight (support of the empty set).
    #[inline]
    pub fn total_weight(&self) -> Supp {
        self.wgt
    }

    /// The minimum support of a frequent item set.
    #[inline]
    pub fn min_supp(&self) -> Supp {
        self.supp
    }

    /// Number of items of the underlying base snapshot.
    #[inline]
    pub fn item_cnt(&self) -> usize {
        self.apps.len()
    }

    /// Number of nodes on the level at `depth` (0 when out of range).
    pub fn level_width(&self, depth: Depth) -> usize {
        self.levels.get(depth).map(|l| l.len()).unwrap_or(0)
    }

    /// Number of live nodes over all levels.
    pub fn node_cnt(&self) -> usize {
        self.levels.iter().map(|l| l.len()).sum()
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Follows `items` downward from `start` and reports the counter
    /// reached. Never allocates; any step outside the represented ranges
    /// yields [`PathSupp::Absent`].
    pub(crate) fn path_support(&self, start: NodeId, items: &[ItemId]) -> PathSupp {
        debug_assert!(!items.is_empty(), "path must name at least one item");
        let mut node = start;
        for &item in &items[..items.len() - 1] {
            let slots = match &self.node(node).children {
                Some(slots) => slots,
                None => return PathSupp::Absent,
            };
            match slots.get(item) {
                Some(child) => node = child,
                None => return PathSupp::Absent,
            }
        }
        let n = self.node(node);
        match n.counter_index(items[items.len() - 1]) {
            Ok(i) => PathSupp::Counted {
                supp: n.cnts[i],
                skip: n.skipped(i),
            },
            Err(_) => PathSupp::Absent,
        }
    }

    /// Support of an arbitrary item set (ascending, duplicate-free items);
    /// the empty set yields the total transaction weight, sets outside the
    /// tree yield 0.
    pub fn support_of(&self, items: &[ItemId]) -> Supp {
        if items.is_empty() {
            return self.wgt;
        }
        self.path_support(NodeId::ROOT, items).supp()
    }

    /// Marks, per item, whether it occurs in any frequent set that can
    /// still grow; external collaborators use the marks to drop unused
    /// items from the transaction source between passes.
    pub fn check(&self) -> Vob {
        let mut marks = Vob::from_elem(self.item_cnt(), false);
        self.mark_used(NodeId::ROOT, &mut marks);
        marks
    }

    fn mark_used(&self, nid: NodeId, marks: &mut Vob) -> bool {
        let node = self.node(nid);
        if node.cut {
            return false;
        }
        let mut used = false;
        match &node.children {
            None => {
                for i in 0..node.size() {
                    if !node.skipped(i) && node.cnts[i] >= self.supp {
                        marks.set(node.item_at(i), true);
                        used = true;
                    }
                }
            }
            Some(ChildSlots::Dense { slots, .. }) => {
                for child in slots.iter().flatten() {
                    used |= self.mark_used(*child, marks);
                }
            }
            Some(ChildSlots::Packed { slots }) => {
                for &(_, child) in slots {
                    used |= self.mark_used(child, marks);
                }
            }
        }
        if used && node.parent.is_some() {
            marks.set(node.item, true);
        }
        used
    }

    // --- step-wise navigation ------------------------------------------

    /// Moves the navigation cursor back to the root.
    pub fn to_root(&mut self) {
        self.curr = NodeId::ROOT;
    }

    /// Moves the navigation cursor to the parent; false at the root.
    pub fn up(&mut self) -> bool {
        match self.node(self.curr).parent {
            Some(p) => {
                self.curr = p;
                true
            }
            None => false,
        }
    }

    /// Follows the edge labeled `item` downward; false when there is no
    /// such child.
    pub fn down(&mut self, item: ItemId) -> bool {
        let child = self
            .node(self.curr)
            .children
            .as_ref()
            .and_then(|slots| slots.get(item));
        match child {
            Some(c) => {
                self.curr = c;
                true
            }
            None => false,
        }
    }

    /// The next item after `item` that has a counter in the current node.
    pub fn next_item(&self, item: ItemId) -> Option<ItemId> {
        let node = self.node(self.curr);
        match node.counter_index(item) {
            Ok(i) => {
                if i + 1 < node.size() {
                    Some(node.item_at(i + 1))
                } else {
                    None
                }
            }
            Err(i) => {
                if i < node.size() {
                    Some(node.item_at(i))
                } else {
                    None
                }
            }
        }
    }

    /// Support of the current prefix extended by `item`; 0 when the item
    /// has no counter here.
    pub fn item_support(&self, item: ItemId) -> Supp {
        let node = self.node(self.curr);
        match node.counter_index(item) {
            Ok(i) => node.cnts[i],
            Err(_) => 0,
        }
    }

    /// Rebuilds the item set represented by a node plus one of its
    /// counters; `out` receives the items in ascending order.
    pub(crate) fn rebuild_set(&self, nid: NodeId, index: usize, out: &mut Vec<ItemId>) {
        out.clear();
        out.push(self.node(nid).item_at(index));
        let mut cur = nid;
        while let Some(p) = self.node(cur).parent {
            out.push(self.node(cur).item);
            cur = p;
        }
        out.reverse();
    }
}
