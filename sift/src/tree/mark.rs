//! Closed/maximal marking: SKIP-flagging sets the extraction must not
//! report.

use vob::Vob;

use basket::Supp;

use crate::measures::Measure;
use crate::tree::node::NodeId;
use crate::tree::ItemsetTree;

/// Which filter [`ItemsetTree::mark`] applies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Marking {
    /// Flag every set that has a proper superset of equal support.
    Closed,
    /// Flag every set that has a frequent proper superset.
    Maximal,
}

/// How a one-smaller subset is flagged during marking.
#[derive(Clone, Copy, Debug)]
enum MarkRule {
    Always,
    IfEqual(Supp),
}

impl ItemsetTree {
    /// Removes every SKIP flag, including the empty-set flag. Marking
    /// expects a tree without stale flags.
    pub fn clear_marks(&mut self) {
        self.empty_cut = false;
        for depth in 0..self.height() {
            for pos in 0..self.levels[depth].len() {
                let nid = self.levels[depth][pos];
                let node = self.node_mut(nid);
                node.skip = Vob::from_elem(node.cnts.len(), false);
            }
        }
    }

    /// Flags all sets failing the closed/maximal predicate so that the
    /// extraction cursor passes over them. With `with_eval` and a
    /// configured measure, sets failing the measure threshold are flagged
    /// as well and the subset marking runs bottom-up for both predicates.
    pub fn mark(&mut self, mode: Marking, with_eval: bool) {
        if with_eval && self.eval.measure != Measure::None {
            self.mark_with_eval(mode);
            return;
        }
        match mode {
            Marking::Closed => {
                // a singleton of full weight makes the empty set non-closed
                self.mark_empty(self.wgt);
                // top-down: subset flags always land on already processed
                // levels, so every frequent set gets to mark its subsets
                for depth in 1..self.height() {
                    self.mark_level(depth, mode);
                }
            }
            Marking::Maximal => {
                // a frequent singleton makes the empty set non-maximal
                self.mark_empty(self.supp);
                // bottom-up: a flagged set still has frequent supersets,
                // so it keeps propagating marks to its own subsets
                for depth in (1..self.height()).rev() {
                    self.mark_level(depth, mode);
                }
            }
        }
    }

    fn mark_level(&mut self, depth: usize, mode: Marking) {
        for pos in 0..self.levels[depth].len() {
            let nid = self.levels[depth][pos];
            for i in 0..self.node(nid).size() {
                let node = self.node(nid);
                match mode {
                    Marking::Closed => {
                        if node.skipped(i) || node.cnts[i] < self.supp {
                            self.node_mut(nid).set_skip(i);
                            continue;
                        }
                        let supp = self.node(nid).cnts[i];
                        self.mark_subsets(nid, i, MarkRule::IfEqual(supp));
                    }
                    Marking::Maximal => {
                        if !node.skipped(i) && node.cnts[i] < self.supp {
                            self.node_mut(nid).set_skip(i);
                            continue;
                        }
                        self.mark_subsets(nid, i, MarkRule::Always);
                    }
                }
            }
        }
    }

    /// The evaluation-aware variant: bottom-up for both predicates, with
    /// the measure threshold as an additional reason to flag a set.
    fn mark_with_eval(&mut self, mode: Marking) {
        for depth in (1..self.height()).rev() {
            for pos in 0..self.levels[depth].len() {
                let nid = self.levels[depth][pos];
                for i in 0..self.node(nid).size() {
                    let node = self.node(nid);
                    if !node.skipped(i)
                        && (node.cnts[i] < self.supp
                            || self.eval.dir * self.evaluate(nid, i) < self.eval.thresh)
                    {
                        self.node_mut(nid).set_skip(i);
                        continue;
                    }
                    let rule = match mode {
                        Marking::Closed => {
                            if self.node(nid).skipped(i) {
                                MarkRule::Always
                            } else {
                                MarkRule::IfEqual(self.node(nid).cnts[i])
                            }
                        }
                        Marking::Maximal => MarkRule::Always,
                    };
                    self.mark_subsets(nid, i, rule);
                }
            }
        }
        let thresh = match mode {
            Marking::Closed => self.wgt,
            Marking::Maximal => self.supp,
        };
        let root = self.node(NodeId::ROOT);
        let hit = (0..root.size()).any(|i| root.cnts[i] >= thresh || root.skipped(i));
        if hit {
            self.empty_cut = true;
        }
    }

    fn mark_empty(&mut self, thresh: Supp) {
        let root = self.node(NodeId::ROOT);
        let hit = (0..root.size()).any(|i| root.cnts[i] >= thresh);
        if hit {
            self.empty_cut = true;
        }
    }

    /// Walks to every one-smaller subset of the set at (`nid`, `index`) by
    /// dropping each item of the path in turn, flagging the subset's
    /// counter according to `rule`.
    fn mark_subsets(&mut self, nid: NodeId, index: usize, rule: MarkRule) {
        let parent = match self.node(nid).parent {
            Some(p) => p,
            // a singleton: its only subset is the empty set
            None => return,
        };
        let maxht = self.height() + 2;
        let mut buf = vec![0; maxht];
        buf[maxht - 1] = self.node(nid).item_at(index);
        // drop the counter's own item, then the node's edge item
        self.mark_one(parent, &buf[maxht - 1..], rule);
        buf[maxht - 2] = self.node(nid).item;
        self.mark_one(parent, &buf[maxht - 2..maxht - 1], rule);
        // climb: drop each further ancestor item once
        let mut len = 2;
        let mut node = parent;
        while let Some(grand) = self.node(node).parent {
            self.mark_one(grand, &buf[maxht - len..], rule);
            buf[maxht - len - 1] = self.node(node).item;
            len += 1;
            node = grand;
        }
    }

    /// Follows `items` from `start` and flags the counter reached, if any.
    fn mark_one(&mut self, start: NodeId, items: &[basket::ItemId], rule: MarkRule) {
        let mut node = start;
        for &item in &items[..items.len() - 1] {
            let child = self.node(node).children.as_ref().and_then(|s| s.get(item));
            match child {
                Some(c) => node = c,
                None => return,
            }
        }
        let idx = match self.node(node).counter_index(items[items.len() - 1]) {
            Ok(i) => i,
            Err(_) => return,
        };
        let hit = match rule {
            MarkRule::Always => true,
            MarkRule::IfEqual(supp) => self.node(node).cnts[idx] == supp,
        };
        if hit {
            self.node_mut(node).set_skip(idx);
        }
    }
}
