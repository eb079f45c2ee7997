//! Evaluation of item sets with a configured measure.
//!
//! A measure sees four counts: the support of the set, of a body, of a
//! head, and the total transaction weight. For an item set the canonical
//! split treats the counter's item as the head and the remainder as the
//! body; aggregation over all rotations (`min`/`max`/`avg`) walks the
//! ancestor path and rebuilds each rotation's body support with
//! [`ItemsetTree::path_support`]. The log-of-support-ratio measure is
//! computed here directly because it needs the frequencies of all items on
//! the path, not just the four counts.

use crate::measures::Measure;
use crate::tree::node::NodeId;
use crate::tree::ItemsetTree;
use basket::ItemId;

/// How the per-rotation measure values of a set are combined.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Agg {
    /// Evaluate only the canonical rotation.
    First,
    Min,
    Max,
    Avg,
}

/// Evaluation settings, as handed to [`ItemsetTree::set_eval`].
#[derive(Clone, Copy, Debug)]
pub struct EvalConfig {
    pub measure: Measure,
    pub agg: Agg,
    /// Force the value to 0 when the observed joint support does not
    /// exceed the independence expectation (`head·body ≥ supp·base`).
    pub invert: bool,
    /// Threshold a set must reach (on the preferred side) to qualify.
    pub thresh: f64,
    /// Minimum improvement over the best one-item-smaller subset;
    /// `NEG_INFINITY` disables the gate.
    pub minimp: f64,
    /// Depth from which evaluation-based pruning runs during
    /// [`ItemsetTree::add_level`]; `None` disables it.
    pub prune: Option<usize>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            measure: Measure::None,
            agg: Agg::First,
            invert: false,
            thresh: 0.0,
            minimp: f64::NEG_INFINITY,
            prune: None,
        }
    }
}

/// Resolved evaluation state stored in the tree. The threshold is kept
/// pre-multiplied by the direction so comparisons are uniform.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EvalState {
    pub(crate) measure: Measure,
    pub(crate) agg: Agg,
    pub(crate) invert: bool,
    pub(crate) dir: f64,
    pub(crate) thresh: f64,
    pub(crate) minimp: f64,
    pub(crate) prune: usize,
}

impl Default for EvalState {
    fn default() -> Self {
        Self {
            measure: Measure::None,
            agg: Agg::First,
            invert: false,
            dir: 1.0,
            thresh: 0.0,
            minimp: f64::NEG_INFINITY,
            prune: usize::MAX,
        }
    }
}

/// Which counter of a node to evaluate: by index, or by item identifier
/// (used for the recursive subset evaluations of the improvement gate,
/// which must not re-enter the gate).
#[derive(Clone, Copy, Debug)]
enum EvalPos {
    Index(usize),
    Item(ItemId),
}

impl ItemsetTree {
    /// Configures the additional evaluation measure.
    pub fn set_eval(&mut self, cfg: EvalConfig) {
        let dir = cfg.measure.direction();
        self.eval = EvalState {
            measure: cfg.measure,
            agg: cfg.agg,
            invert: cfg.invert,
            dir,
            thresh: dir * cfg.thresh,
            minimp: cfg.minimp,
            prune: match cfg.prune {
                Some(p) if p > 0 => p,
                _ => usize::MAX,
            },
        };
    }

    /// Aggregated evaluation of the set represented by counter `index` of
    /// node `nid`. Returns `NEG_INFINITY` when the improvement gate
    /// suppresses the set.
    pub(crate) fn evaluate(&self, nid: NodeId, index: usize) -> f64 {
        self.evaluate_pos(nid, EvalPos::Index(index))
    }

    fn evaluate_pos(&self, nid: NodeId, pos: EvalPos) -> f64 {
        if self.eval.measure == Measure::None {
            return 0.0;
        }
        let node = self.node(nid);
        let (index, item, gated) = match pos {
            EvalPos::Index(i) => (i, node.item_at(i), true),
            EvalPos::Item(it) => match node.counter_index(it) {
                Ok(i) => (i, it, false),
                Err(_) => return 0.0,
            },
        };
        if self.eval.measure == Measure::LogRatio {
            return self.ld_ratio(nid, index);
        }
        let refn = self.eval.measure.function();
        let supp = node.cnts[index];
        let head = self.node(NodeId::ROOT).cnts[item];
        let base = self.wgt;
        let parent = match node.parent {
            None => {
                // a singleton: the body is the empty set
                if self.eval.invert && head >= supp {
                    return 0.0;
                }
                return refn(supp, base, head, base);
            }
            Some(p) => p,
        };
        let pn = self.node(parent);
        let body = match pn.counter_index(node.item) {
            Ok(i) => pn.cnts[i],
            Err(_) => 0,
        };
        let mut sum = if self.eval.invert
            && (head as f64) * (body as f64) >= (supp as f64) * (base as f64)
        {
            0.0
        } else {
            refn(supp, body, head, base)
        };
        if self.eval.agg == Agg::First {
            if self.eval.minimp == f64::NEG_INFINITY || !gated {
                return sum;
            }
            let val = sum - self.evaluate_pos(parent, EvalPos::Item(node.item));
            if self.eval.dir * val < self.eval.minimp {
                return f64::NEG_INFINITY;
            }
            return sum;
        }

        // min/max/avg: walk the rotations along the ancestor path; the
        // path buffer is filled from the back, newest entry first
        let maxht = self.height() + 2;
        let mut buf = vec![0 as ItemId; maxht];
        let mut p = maxht - 1;
        buf[p] = item;
        let mut n = 1usize;
        let mut head_item = node.item;
        let mut best_at = 0usize;
        let mut walker = Some(parent);
        while let Some(curr) = walker {
            let head_r = self.node(NodeId::ROOT).cnts[head_item];
            let body_r = self.path_support(curr, &buf[p..]).supp();
            let val = if self.eval.invert
                && (head_r as f64) * (body_r as f64) >= (supp as f64) * (base as f64)
            {
                0.0
            } else {
                refn(supp, body_r, head_r, base)
            };
            match self.eval.agg {
                Agg::Min => {
                    if val < sum {
                        sum = val;
                        best_at = n;
                    }
                }
                Agg::Max => {
                    if val > sum {
                        sum = val;
                        best_at = n;
                    }
                }
                _ => sum += val,
            }
            p -= 1;
            buf[p] = head_item;
            n += 1;
            head_item = self.node(curr).item;
            walker = self.node(curr).parent;
        }
        if self.eval.agg == Agg::Avg {
            sum /= n as f64;
        } else if self.eval.minimp > f64::NEG_INFINITY && n > 2 && gated {
            // locate the subset belonging to the extreme rotation and
            // require a sufficient improvement over it
            let sub_item = if best_at > 0 { buf[p + n - 1] } else { node.item };
            let mut curr = parent;
            let mut climb = best_at;
            while climb > 1 {
                curr = match self.node(curr).parent {
                    Some(c) => c,
                    None => break,
                };
                climb -= 1;
            }
            let mut left = best_at;
            let mut at = p + (n - best_at);
            while left > 1 {
                let step = buf[at];
                at += 1;
                curr = match self.node(curr).children.as_ref().and_then(|s| s.get(step)) {
                    Some(c) => c,
                    None => break,
                };
                left -= 1;
            }
            let val = sum - self.evaluate_pos(curr, EvalPos::Item(sub_item));
            if self.eval.dir * val < self.eval.minimp {
                return f64::NEG_INFINITY;
            }
        }
        sum
    }

    /// Binary logarithm of the quotient of the actual support of the set
    /// and its expectation under full independence of the items.
    fn ld_ratio(&self, nid: NodeId, index: usize) -> f64 {
        let node = self.node(nid);
        let item = node.item_at(index);
        let root = self.node(NodeId::ROOT);
        let mut sum = (node.cnts[index] as f64).ln() - (root.cnts[item] as f64).ln();
        let mut n = 0usize;
        let mut cur = nid;
        while let Some(p) = self.node(cur).parent {
            sum -= (root.cnts[self.node(cur).item] as f64).ln();
            n += 1;
            cur = p;
        }
        if n > 0 {
            sum += n as f64 * (self.wgt as f64).ln();
        }
        sum / std::f64::consts::LN_2
    }
}
