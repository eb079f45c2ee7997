//! Recursive reporter traversal.
//!
//! The standard way to enumerate all frequent sets: walk the tree once,
//! registering perfect extensions with the reporter instead of descending
//! into them, and let the reporter expand them back into full sets. With
//! perfect-extension pruning enabled during growth this reports exactly
//! the same sets as an unpruned tree, from far fewer nodes.

use basket::Supp;

use crate::measures::Measure;
use crate::report::{Reporter, SetSink};
use crate::tree::node::NodeId;
use crate::tree::ItemsetTree;

impl ItemsetTree {
    /// Reports every frequent item set through `rep`, honoring the
    /// reporter's size window and evaluation gate. Returns the number of
    /// sets the reporter emitted.
    pub fn report_all<S: SetSink>(&self, rep: &mut Reporter<S>) -> usize {
        let before = rep.reported();
        self.report_node(rep, NodeId::ROOT, self.wgt, self.empty_cut, 0.0);
        rep.reported() - before
    }

    /// Reports the subtree of `nid`; `supp`/`skipped` describe the set
    /// leading to this node, `eval` its measure value.
    fn report_node<S: SetSink>(
        &self,
        rep: &mut Reporter<S>,
        nid: NodeId,
        supp: Supp,
        skipped: bool,
        eval: f64,
    ) {
        let node = self.node(nid);
        let spx = if !self.perfect {
            Supp::MAX
        } else {
            // counters matching the parent-set support are perfect
            // extensions; the reporter re-attaches them on output
            for i in 0..node.size() {
                if node.cnts[i] >= supp {
                    let _ = rep.add_pex(node.item_at(i));
                }
            }
            supp
        };
        if !skipped && supp <= self.smax {
            rep.report(eval);
        }
        for i in 0..node.size() {
            let s = node.cnts[i];
            if s < self.supp || s >= spx {
                continue;
            }
            let item = node.item_at(i);
            let val = if self.eval.measure == Measure::None {
                0.0
            } else {
                self.evaluate(nid, i)
            };
            if rep.add(item, s).is_err() {
                continue;
            }
            let child = node.children.as_ref().and_then(|slots| slots.get(item));
            match child {
                Some(c) => self.report_node(rep, c, s, node.skipped(i), val),
                None => {
                    if !node.skipped(i) && s <= self.smax {
                        rep.report(val);
                    }
                }
            }
            rep.remove(1);
        }
    }
}
