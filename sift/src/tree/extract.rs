//! The resumable extraction cursor.
//!
//! A state machine over (size, node, counter index, head, path) that
//! enumerates qualifying item sets or association rules exactly once each.
//! The traversal order follows the per-depth level lists, moving through
//! the configured size range in the configured direction; for rules, every
//! selected set is additionally rotated through its items as candidate
//! heads, with the body support for each rotation reconstructed from the
//! ancestor chain.

use basket::{Appearance, ItemId, Supp};

use crate::measures::Measure;
use crate::tree::node::NodeId;
use crate::tree::ItemsetTree;

/// A frequent item set produced by [`ItemsetTree::next_set`].
#[derive(Clone, Debug, PartialEq)]
pub struct FoundSet {
    /// The items, ascending.
    pub items: Vec<ItemId>,
    pub supp: Supp,
    /// Value of the configured measure (0 when none is configured).
    pub eval: f64,
}

/// An association rule produced by [`ItemsetTree::next_rule`]:
/// `items[0]` is the head, the remaining items form the body.
#[derive(Clone, Debug, PartialEq)]
pub struct FoundRule {
    pub items: Vec<ItemId>,
    /// Support of body and head together.
    pub supp: Supp,
    /// Support of the body alone.
    pub body: Supp,
    /// Singleton support of the head item.
    pub head: Supp,
    pub eval: f64,
}

/// Cursor state. `size` is signed so that stepping past either end of the
/// size range is representable.
#[derive(Clone, Debug)]
pub(crate) struct Cursor {
    pub(crate) minsz: usize,
    pub(crate) maxsz: usize,
    pub(crate) order: i32,
    size: isize,
    /// Position within the level list of the current size.
    pos: usize,
    node: Option<NodeId>,
    /// Next counter index to examine.
    index: usize,
    /// The set currently rotated through its heads (rules only).
    cur_node: NodeId,
    cur_index: usize,
    head_item: Option<ItemId>,
    head_node: Option<NodeId>,
    head_only: bool,
    /// Path buffer for body-support lookups; occupied from `path_start`.
    path: Vec<ItemId>,
    path_start: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            minsz: 1,
            maxsz: usize::MAX,
            order: 1,
            size: 0,
            pos: 0,
            node: None,
            index: 0,
            cur_node: NodeId::ROOT,
            cur_index: 0,
            head_item: None,
            head_node: None,
            head_only: false,
            path: Vec::new(),
            path_start: 0,
        }
    }
}

impl ItemsetTree {
    /// Configures the size range and traversal direction of the cursor:
    /// `order >= 0` walks from small to large sets, negative order the
    /// other way.
    pub fn set_size(&mut self, min: usize, max: usize, order: i32) {
        self.cursor.minsz = min;
        self.cursor.maxsz = max;
        self.cursor.order = if order < 0 { -1 } else { 1 };
    }

    /// Resets the cursor to the first node of the start size. Must be
    /// called before the first [`next_set`]/[`next_rule`] and after any
    /// structural change.
    ///
    /// [`next_set`]: ItemsetTree::next_set
    /// [`next_rule`]: ItemsetTree::next_rule
    pub fn init(&mut self) {
        let height = self.height();
        if self.cursor.maxsz > height {
            self.cursor.maxsz = height;
        }
        self.cursor.size = if self.cursor.order >= 0 {
            self.cursor.minsz as isize
        } else {
            self.cursor.maxsz as isize
        };
        let lvl = if self.cursor.size > 0 {
            self.cursor.size as usize - 1
        } else {
            0
        };
        self.cursor.pos = 0;
        self.cursor.index = 0;
        self.cursor.node = self.levels.get(lvl).and_then(|l| l.first().copied());
        self.cursor.head_item = None;
        self.cursor.head_node = None;
        self.cursor.path = vec![0; height + 1];
        self.cursor.path_start = height + 1;
    }

    /// Produces the next frequent item set, or `None` when the size range
    /// is exhausted. Sets outside the support window, sets with a SKIP
    /// flag, sets containing ignored items, and sets failing the measure
    /// threshold are passed over.
    pub fn next_set(&mut self) -> Option<FoundSet> {
        loop {
            let size = self.cursor.size;
            if size < self.cursor.minsz as isize || size > self.cursor.maxsz as isize {
                return None;
            }
            if size == 0 {
                // the empty set is checked once, then the cursor moves on
                let qualifies = self.empty_qualifies();
                self.advance_level();
                if qualifies {
                    return Some(FoundSet {
                        items: Vec::new(),
                        supp: self.wgt,
                        eval: 0.0,
                    });
                }
                continue;
            }
            let (nid, i) = match self.advance_counter() {
                Some(found) => found,
                None => continue,
            };
            let node = self.node(nid);
            let item = node.item_at(i);
            if self.apps[item] == Appearance::Ignore {
                continue;
            }
            let supp = node.cnts[i];
            if node.skipped(i) || supp < self.supp || supp > self.smax {
                continue;
            }
            let eval = if self.eval.measure == Measure::None {
                0.0
            } else {
                let val = self.evaluate(nid, i);
                if self.eval.dir * val < self.eval.thresh {
                    continue;
                }
                val
            };
            let mut items = Vec::with_capacity(size as usize);
            self.rebuild_set(nid, i, &mut items);
            return Some(FoundSet { items, supp, eval });
        }
    }

    /// Produces the next association rule, or `None` when the size range
    /// is exhausted. Rules read the true supports (mark flags do not apply
    /// to rule extraction); the confidence comparison uses the pre-scaled
    /// threshold, so a confidence that equals the requested bound up to
    /// roundoff still passes.
    pub fn next_rule(&mut self) -> Option<FoundRule> {
        if self.cursor.size == 0 {
            self.advance_level();
        }
        loop {
            let size = self.cursor.size;
            if size <= 0 || size < self.cursor.minsz as isize || size > self.cursor.maxsz as isize
            {
                return None;
            }
            // move the head one ancestor up, extending the path
            if let (Some(prev), Some(hn)) = (self.cursor.head_item, self.cursor.head_node) {
                self.cursor.path_start -= 1;
                let at = self.cursor.path_start;
                self.cursor.path[at] = prev;
                self.cursor.head_item = Some(self.node(hn).item);
                match self.node(hn).parent {
                    Some(p) => self.cursor.head_node = Some(p),
                    None => {
                        // all rotations done; select a new set
                        self.cursor.head_item = None;
                        self.cursor.head_node = None;
                    }
                }
            }
            if self.cursor.head_item.is_none() {
                let (nid, i) = match self.advance_counter() {
                    Some(found) => found,
                    None => continue,
                };
                let node = self.node(nid);
                let item = node.item_at(i);
                let app = self.apps[item];
                let node_head_only = node.head_only;
                if app == Appearance::Ignore || (app == Appearance::Head && node_head_only) {
                    continue;
                }
                self.cursor.cur_node = nid;
                self.cursor.cur_index = i;
                self.cursor.head_item = Some(item);
                self.cursor.head_node = Some(nid);
                self.cursor.head_only = app == Appearance::Head || node_head_only;
                self.cursor.path_start = self.cursor.path.len();
            }
            let head_item = match self.cursor.head_item {
                Some(item) => item,
                None => continue,
            };
            let app = self.apps[head_item];
            // in a set with a head-only item, only that item may be head
            if !app.in_head() || (app != Appearance::Head && self.cursor.head_only) {
                continue;
            }
            let nid = self.cursor.cur_node;
            let index = self.cursor.cur_index;
            let supp = self.node(nid).cnts[index];
            if supp < self.supp || supp > self.smax {
                self.cursor.head_item = None;
                self.cursor.head_node = None;
                continue;
            }
            let path_len = self.cursor.path.len() - self.cursor.path_start;
            let body = if path_len > 0 {
                match self.cursor.head_node {
                    Some(hn) => self
                        .path_support(hn, &self.cursor.path[self.cursor.path_start..])
                        .supp(),
                    None => 0,
                }
            } else {
                match self.node(nid).parent {
                    None => self.wgt,
                    Some(parent) => {
                        let pn = self.node(parent);
                        match pn.counter_index(self.node(nid).item) {
                            Ok(pi) => pn.cnts[pi],
                            Err(_) => 0,
                        }
                    }
                }
            };
            if body < self.rule || (supp as f64) < body as f64 * self.conf {
                continue;
            }
            let head_supp = self.node(NodeId::ROOT).cnts[head_item];
            let eval = match self.eval.measure {
                Measure::None | Measure::LogRatio => 0.0,
                measure => {
                    let val = if self.eval.invert
                        && (head_supp as f64) * (body as f64)
                            >= (supp as f64) * (self.wgt as f64)
                    {
                        0.0
                    } else {
                        (measure.function())(supp, body, head_supp, self.wgt)
                    };
                    if self.eval.dir * val < self.eval.thresh {
                        continue;
                    }
                    val
                }
            };
            // assemble the rule: head first, body in path order
            let rule_size = size as usize;
            let mut items = vec![0; rule_size];
            let mut write = rule_size;
            let counter_item = self.node(nid).item_at(index);
            if counter_item != head_item {
                write -= 1;
                items[write] = counter_item;
            }
            let mut cur = nid;
            while let Some(parent) = self.node(cur).parent {
                let it = self.node(cur).item;
                if it != head_item {
                    write -= 1;
                    items[write] = it;
                }
                cur = parent;
            }
            items[0] = head_item;
            return Some(FoundRule {
                items,
                supp,
                body,
                head: head_supp,
                eval,
            });
        }
    }

    /// Steps to the next counter of the current size, moving through the
    /// level list; bumps the size (returning `None` for this round) when
    /// the level is exhausted.
    fn advance_counter(&mut self) -> Option<(NodeId, usize)> {
        loop {
            let nid = match self.cursor.node {
                Some(n) => n,
                None => {
                    self.advance_level();
                    return None;
                }
            };
            if self.cursor.index >= self.node(nid).size() {
                self.cursor.pos += 1;
                self.cursor.index = 0;
                let lvl = self.cursor.size as usize - 1;
                self.cursor.node = self.levels[lvl].get(self.cursor.pos).copied();
                continue;
            }
            let i = self.cursor.index;
            self.cursor.index += 1;
            return Some((nid, i));
        }
    }

    /// Moves the cursor to the first node of the next size in traversal
    /// order.
    fn advance_level(&mut self) {
        self.cursor.size += self.cursor.order as isize;
        self.cursor.pos = 0;
        self.cursor.index = 0;
        let size = self.cursor.size;
        self.cursor.node = if size > 0 && (size as usize) <= self.height() {
            self.levels[size as usize - 1].first().copied()
        } else {
            None
        };
    }

    fn empty_qualifies(&self) -> bool {
        !self.empty_cut
            && self.wgt >= self.supp
            && self.wgt <= self.smax
            && (self.eval.measure == Measure::None || 0.0 >= self.eval.thresh)
    }
}
