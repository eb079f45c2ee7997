//! # The item set reporter
//!
//! Collects the current item set as a stack of (item, support) entries,
//! tracks perfect extensions per prefix, and emits qualifying sets and
//! rules through a [`SetSink`]. Perfect extensions registered with
//! [`Reporter::add_pex`] are expanded on output: every combination of the
//! stacked extensions is reported with the support of the base set, which
//! is exactly the set family a tree grown without perfect-extension
//! pruning would have produced node by node.
//!
//! The sink seam separates enumeration from formatting: [`ItemsetWriter`]
//! renders text lines, [`Collector`] captures results in memory.

use std::fmt;
use std::io::{self, Write};

use vob::Vob;

use basket::{ItemBase, ItemId, Supp};

/// Receiver of reported item sets and rules.
pub trait SetSink {
    /// A frequent item set (ascending items) with its support.
    fn itemset(&mut self, items: &[ItemId], supp: Supp, eval: f64);
    /// An association rule: `items[0]` is the head, the rest the body.
    fn rule(&mut self, items: &[ItemId], supp: Supp, body: Supp, head: Supp, eval: f64);
}

/// Errors surfaced by the reporter stack operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReportError {
    /// The item is already part of the current set or its extensions.
    ItemInUse(ItemId),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportError::ItemInUse(item) => write!(f, "item {} is already in use", item),
        }
    }
}

/// Evaluation gate applied to each output set.
#[derive(Clone, Debug)]
pub enum EvalGate {
    /// Emit everything, carrying the evaluation handed to `report`.
    None,
    /// Gate on the evaluation handed to `report`.
    Given { dir: f64, thresh: f64 },
    /// Recompute the binary log of the support ratio per output set (it
    /// changes with every expanded perfect extension) and gate on it.
    LogRatio {
        logs: Vec<f64>,
        logwgt: f64,
        dir: f64,
        thresh: f64,
    },
}

impl EvalGate {
    /// A log-ratio gate over the item frequencies of `base`.
    pub fn log_ratio(base: &ItemBase, dir: f64, thresh: f64) -> Self {
        let logs = (0..base.cnt())
            .map(|i| {
                let frq = base.frq(i);
                if frq > 0 {
                    (frq as f64).ln()
                } else {
                    0.0
                }
            })
            .collect();
        let logwgt = if base.wgt() > 0 {
            (base.wgt() as f64).ln()
        } else {
            0.0
        };
        EvalGate::LogRatio {
            logs,
            logwgt,
            dir,
            thresh,
        }
    }
}

/// The reporter. See the module documentation.
pub struct Reporter<'a, S: SetSink> {
    base: &'a ItemBase,
    sink: S,
    min: usize,
    max: usize,
    expand: bool,
    items: Vec<ItemId>,
    /// `supps[k]` is the support of the length-`k` prefix; `supps[0]` the
    /// total transaction weight.
    supps: Vec<Supp>,
    pexs: Vec<ItemId>,
    /// Number of perfect extensions registered per prefix length.
    pex_cnt: Vec<usize>,
    used: Vob,
    reported: usize,
    gate: EvalGate,
    cur_eval: f64,
}

impl<'a, S: SetSink> Reporter<'a, S> {
    pub fn new(base: &'a ItemBase, sink: S) -> Self {
        Self {
            base,
            sink,
            min: 1,
            max: usize::MAX,
            expand: true,
            items: Vec::new(),
            supps: vec![base.wgt()],
            pexs: Vec::new(),
            pex_cnt: vec![0],
            used: Vob::from_elem(base.cnt(), false),
            reported: 0,
            gate: EvalGate::None,
            cur_eval: 0.0,
        }
    }

    /// Restricts the size of reported sets/rules to `min..=max` items.
    pub fn set_size(&mut self, min: usize, max: usize) {
        self.min = min;
        self.max = max;
    }

    /// Disables perfect-extension expansion: each set is reported once,
    /// with all its extensions merged in.
    pub fn set_expand(&mut self, expand: bool) {
        self.expand = expand;
    }

    pub fn set_gate(&mut self, gate: EvalGate) {
        self.gate = gate;
    }

    #[inline]
    pub fn base(&self) -> &ItemBase {
        self.base
    }

    /// Number of items in the current set.
    #[inline]
    pub fn cnt(&self) -> usize {
        self.items.len()
    }

    /// Number of sets and rules emitted so far.
    #[inline]
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Whether `item` is part of the current set or its extensions.
    pub fn uses(&self, item: ItemId) -> bool {
        self.used.get(item).unwrap_or(false)
    }

    /// Pushes an item with the support of the extended set. Returns the
    /// new set size.
    pub fn add(&mut self, item: ItemId, supp: Supp) -> Result<usize, ReportError> {
        if self.uses(item) {
            return Err(ReportError::ItemInUse(item));
        }
        self.used.set(item, true);
        self.items.push(item);
        self.supps.push(supp);
        self.pex_cnt.push(0);
        Ok(self.items.len())
    }

    /// Registers a perfect extension of the current set. Returns the
    /// number of stacked extensions.
    pub fn add_pex(&mut self, item: ItemId) -> Result<usize, ReportError> {
        if self.uses(item) {
            return Err(ReportError::ItemInUse(item));
        }
        self.used.set(item, true);
        self.pexs.push(item);
        *self.pex_cnt.last_mut().expect("prefix counter stack") += 1;
        Ok(self.pexs.len())
    }

    /// Pops `n` items together with the perfect extensions registered on
    /// top of them. Returns the new set size.
    pub fn remove(&mut self, n: usize) -> usize {
        let n = n.min(self.items.len());
        for _ in 0..n {
            let released = self.pex_cnt.pop().expect("prefix counter stack");
            for _ in 0..released {
                let pex = self.pexs.pop().expect("extension stack");
                self.used.set(pex, false);
            }
            let item = self.items.pop().expect("item stack");
            self.used.set(item, false);
            self.supps.pop();
        }
        self.items.len()
    }

    /// Reports the current set, expanded over all stacked perfect
    /// extensions. `eval` is the measure value of the base set; it is
    /// carried (or re-derived, for the log-ratio gate) per output set.
    /// Returns how many sets were emitted by this call.
    pub fn report(&mut self, eval: f64) -> usize {
        self.cur_eval = eval;
        if self.items.len() > self.max {
            return 0;
        }
        let pex_cnt = self.pexs.len();
        if self.items.len() + pex_cnt < self.min {
            return 0;
        }
        let saved_min = self.min;
        if !self.expand {
            // only the fully extended set qualifies
            let full = (self.items.len() + pex_cnt).min(self.max);
            if full > self.min {
                self.min = full;
            }
        }
        let before = self.reported;
        if pex_cnt > 0 && self.items.len() < self.max {
            self.expand_pexs(pex_cnt);
        }
        if self.items.len() >= self.min {
            self.output();
        }
        self.min = saved_min;
        self.reported - before
    }

    /// Emits a complete set directly, bypassing the stack (used with the
    /// extraction cursor).
    pub fn direct(&mut self, items: &[ItemId], supp: Supp, eval: f64) -> bool {
        if items.len() < self.min || items.len() > self.max {
            return false;
        }
        self.reported += 1;
        self.sink.itemset(items, supp, eval);
        true
    }

    /// Emits a rule (`items[0]` is the head) directly.
    pub fn rule(&mut self, items: &[ItemId], supp: Supp, body: Supp, head: Supp, eval: f64) -> bool {
        if items.is_empty() || items.len() < self.min || items.len() > self.max {
            return false;
        }
        self.reported += 1;
        self.sink.rule(items, supp, body, head, eval);
        true
    }

    /// Recursively adds every combination of the first `k` stacked
    /// extensions, reporting each combination that reaches the minimum
    /// size.
    fn expand_pexs(&mut self, mut k: usize) {
        loop {
            k -= 1;
            self.items.push(self.pexs[k]);
            let supp = *self.supps.last().expect("support stack");
            self.supps.push(supp);
            if k > 0
                && self.items.len() >= self.min.saturating_sub(k)
                && self.items.len() < self.max
            {
                self.expand_pexs(k);
            }
            if self.items.len() >= self.min {
                self.output();
            }
            self.items.pop();
            self.supps.pop();
            if k == 0 {
                return;
            }
        }
    }

    fn output(&mut self) {
        let supp = *self.supps.last().expect("support stack");
        let eval = match &self.gate {
            EvalGate::None => self.cur_eval,
            EvalGate::Given { dir, thresh } => {
                if dir * self.cur_eval < *thresh {
                    return;
                }
                self.cur_eval
            }
            EvalGate::LogRatio {
                logs,
                logwgt,
                dir,
                thresh,
            } => {
                let mut sum = if supp > 0 { (supp as f64).ln() } else { 0.0 };
                for &item in &self.items {
                    sum -= logs[item];
                }
                let val = (sum + (self.items.len() as f64 - 1.0) * logwgt)
                    / std::f64::consts::LN_2;
                if dir * val < *thresh {
                    return;
                }
                val
            }
        };
        self.reported += 1;
        self.sink.itemset(&self.items, supp, eval);
    }
}

/// Sink collecting everything in memory; mostly useful for tests and for
/// post-processing results programmatically.
#[derive(Debug, Default)]
pub struct Collector {
    pub sets: Vec<(Vec<ItemId>, Supp, f64)>,
    pub rules: Vec<(Vec<ItemId>, Supp, Supp, Supp, f64)>,
}

impl SetSink for Collector {
    fn itemset(&mut self, items: &[ItemId], supp: Supp, eval: f64) {
        self.sets.push((items.to_vec(), supp, eval));
    }

    fn rule(&mut self, items: &[ItemId], supp: Supp, body: Supp, head: Supp, eval: f64) {
        self.rules.push((items.to_vec(), supp, body, head, eval));
    }
}

/// Sink rendering one text line per set or rule. Items print under their
/// base names; a rule prints as `head <- body  (supp, conf%)`.
pub struct ItemsetWriter<'a, W: Write> {
    base: &'a ItemBase,
    out: W,
    hdr: String,
    sep: String,
    imp: String,
    err: Option<io::Error>,
}

impl<'a, W: Write> ItemsetWriter<'a, W> {
    pub fn new(base: &'a ItemBase, out: W) -> Self {
        Self {
            base,
            out,
            hdr: String::new(),
            sep: " ".to_string(),
            imp: " <- ".to_string(),
            err: None,
        }
    }

    /// Record header, item separator and implication sign for the output.
    pub fn set_format(&mut self, hdr: &str, sep: &str, imp: &str) {
        self.hdr = hdr.to_string();
        self.sep = sep.to_string();
        self.imp = imp.to_string();
    }

    /// Hands back the writer; the first write error, if any, surfaces
    /// here.
    pub fn finish(self) -> io::Result<W> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }

    fn emit(&mut self, line: fmt::Arguments) {
        if self.err.is_some() {
            return;
        }
        if let Err(err) = self.out.write_fmt(line).and_then(|_| self.out.write_all(b"\n")) {
            self.err = Some(err);
        }
    }
}

impl<'a, W: Write> SetSink for ItemsetWriter<'a, W> {
    fn itemset(&mut self, items: &[ItemId], supp: Supp, _eval: f64) {
        let mut line = self.hdr.clone();
        for (k, &item) in items.iter().enumerate() {
            if k > 0 {
                line.push_str(&self.sep);
            }
            line.push_str(self.base.name(item));
        }
        self.emit(format_args!("{}  ({})", line, supp));
    }

    fn rule(&mut self, items: &[ItemId], supp: Supp, body: Supp, _head: Supp, _eval: f64) {
        let mut line = self.hdr.clone();
        line.push_str(self.base.name(items[0]));
        line.push_str(&self.imp);
        for (k, &item) in items[1..].iter().enumerate() {
            if k > 0 {
                line.push_str(&self.sep);
            }
            line.push_str(self.base.name(item));
        }
        let conf = if body > 0 {
            100.0 * supp as f64 / body as f64
        } else {
            0.0
        };
        self.emit(format_args!("{}  ({}, {:.1})", line, supp, conf));
    }
}
