//! The level-wise mining driver.
//!
//! Wires the pieces together for one run: create the tree seeded with
//! singleton supports, then repeat grow / count / prune until the tree
//! stops growing or the size cap is reached, optionally thinning the
//! transaction source between passes; finally report the configured
//! target through the reporter.

use basket::{ItemBase, Supp, TaTree, TransactionBag};

use crate::logging::{MineLogger, PassRecord, RunRecordBuilder};
use crate::measures::Measure;
use crate::progress::{MineProgress, ProgressFactory};
use crate::report::{EvalGate, Reporter, SetSink};
use crate::tree::{EvalConfig, ItemsetTree, Marking, TreeOptions};

/// What a run produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    /// All frequent item sets.
    Sets,
    /// Only closed frequent item sets.
    ClosedSets,
    /// Only maximal frequent item sets.
    MaximalSets,
    /// Association rules.
    Rules,
}

/// Configuration of a mining run.
#[derive(Clone, Debug)]
pub struct MinerSetup {
    pub target: Target,
    /// Absolute minimum support.
    pub min_supp: Supp,
    /// Maximum support of reported sets.
    pub max_supp: Supp,
    /// Minimum rule confidence in [0, 1].
    pub min_conf: f64,
    /// Minimum number of items per reported set/rule.
    pub min_size: usize,
    /// Maximum number of items per set/rule; also caps the tree height.
    pub max_size: usize,
    /// Perfect-extension pruning (effective for the `Sets` target, whose
    /// reporting path re-attaches the suppressed extensions).
    pub perfect: bool,
    /// Count through a prefix-compressed transaction tree instead of the
    /// plain bag.
    pub tree_counting: bool,
    /// Drop items that can no longer occur in a frequent set from the
    /// transaction source between passes.
    pub filter_unused: bool,
    /// Additional evaluation measure configuration.
    pub eval: EvalConfig,
}

impl Default for MinerSetup {
    fn default() -> Self {
        Self {
            target: Target::Sets,
            min_supp: 2,
            max_supp: Supp::MAX,
            min_conf: 0.8,
            min_size: 1,
            max_size: 16,
            perfect: false,
            tree_counting: false,
            filter_unused: false,
            eval: EvalConfig::default(),
        }
    }
}

/// Summary of a finished run.
#[derive(Clone, Copy, Debug)]
pub struct MineOutcome {
    /// Final tree height (largest counted set size).
    pub height: usize,
    /// Sets or rules emitted.
    pub reported: usize,
}

/// Runs a complete mining pass over `bag` and reports through `rep`.
/// The bag is only modified when `filter_unused` is set.
pub fn mine<S, L, P>(
    setup: &MinerSetup,
    base: &ItemBase,
    bag: &mut TransactionBag,
    rep: &mut Reporter<S>,
    logger: &mut L,
    progress: &P,
) -> MineOutcome
where
    S: SetSink,
    L: MineLogger,
    P: ProgressFactory,
{
    let perfect = setup.perfect && setup.target == Target::Sets;
    let mut tree = ItemsetTree::new(
        base,
        TreeOptions {
            supp: setup.min_supp,
            smax: setup.max_supp,
            conf: setup.min_conf,
            perfect,
            rules: setup.target == Target::Rules,
        },
    );
    tree.set_eval(setup.eval);

    let mut builder = RunRecordBuilder::new(setup.min_supp);
    let bar = progress.new_bar(setup.max_size as u64);
    while tree.height() < setup.max_size {
        if !tree.add_level() {
            break;
        }
        bar.set_message(&format!("counting item sets of size {}", tree.height()));
        if setup.tree_counting {
            let tatree = TaTree::build(bag);
            tree.count_tree(&tatree);
        } else {
            tree.count_bag(bag);
        }
        tree.prune();
        let marks = tree.check();
        let used = marks.iter_set_bits(..).count();
        builder.pass(PassRecord {
            width: tree.height(),
            level_nodes: tree.level_width(tree.height() - 1),
            tree_nodes: tree.node_cnt(),
            used_items: used,
            transactions: bag.cnt(),
        });
        if setup.filter_unused && used < tree.item_cnt() {
            bag.filter(tree.height(), &marks);
        }
        bar.inc(1);
    }

    bar.set_message("reporting");
    rep.set_size(setup.min_size, setup.max_size);
    if setup.target == Target::Sets {
        rep.set_gate(match setup.eval.measure {
            Measure::None => EvalGate::None,
            Measure::LogRatio => {
                EvalGate::log_ratio(base, Measure::LogRatio.direction(), setup.eval.thresh)
            }
            measure => EvalGate::Given {
                dir: measure.direction(),
                thresh: setup.eval.thresh,
            },
        });
    } else {
        rep.set_gate(EvalGate::None);
    }
    tree.set_size(setup.min_size, setup.max_size, 1);
    match setup.target {
        Target::Sets => {
            tree.report_all(rep);
        }
        Target::ClosedSets => {
            tree.mark(Marking::Closed, setup.eval.measure != Measure::None);
            tree.init();
            while let Some(set) = tree.next_set() {
                rep.direct(&set.items, set.supp, set.eval);
            }
        }
        Target::MaximalSets => {
            tree.mark(Marking::Maximal, setup.eval.measure != Measure::None);
            tree.init();
            while let Some(set) = tree.next_set() {
                rep.direct(&set.items, set.supp, set.eval);
            }
        }
        Target::Rules => {
            tree.init();
            while let Some(rule) = tree.next_rule() {
                rep.rule(&rule.items, rule.supp, rule.body, rule.head, rule.eval);
            }
        }
    }
    bar.finish_and_clear();

    let outcome = MineOutcome {
        height: tree.height(),
        reported: rep.reported(),
    };
    logger.record(builder.finalize(outcome.height, outcome.reported));
    outcome
}
