//! Transactions and the transaction bag/multiset.

use std::cmp::Ordering;

use vob::Vob;

use crate::{AHashMap, ItemBase, ItemId, Supp};

/// A single transaction: an ascending, duplicate-free list of items plus an
/// integer occurrence weight (how many times the transaction occurred).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    items: Vec<ItemId>,
    wgt: Supp,
}

impl Transaction {
    /// Builds a transaction from an arbitrary item list; the items are
    /// sorted and duplicates are removed.
    pub fn new(mut items: Vec<ItemId>, wgt: Supp) -> Self {
        items.sort_unstable();
        items.dedup();
        Self { items, wgt }
    }

    #[inline]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn wgt(&self) -> Supp {
        self.wgt
    }

    /// Lexicographic comparison on the item lists (weights are ignored);
    /// the order used for sorting a bag before building a transaction tree
    /// or merging duplicates.
    pub fn cmp_items(&self, other: &Self) -> Ordering {
        self.items.cmp(&other.items)
    }
}

/// A bag (multiset) of transactions. Keeps the total transaction weight and
/// the size of the largest transaction alongside the transactions
/// themselves.
#[derive(Clone, Debug, Default)]
pub struct TransactionBag {
    tracts: Vec<Transaction>,
    wgt: Supp,
    max: usize,
}

impl TransactionBag {
    pub fn new() -> Self {
        Self {
            tracts: Vec::new(),
            wgt: 0,
            max: 0,
        }
    }

    /// Adds a transaction, updating the base: the weighted frequency of
    /// every contained item grows by `wgt`, as does the total weight.
    pub fn push(&mut self, base: &mut ItemBase, items: &[ItemId], wgt: Supp) {
        let t = Transaction::new(items.to_vec(), wgt);
        for &item in t.items() {
            base.inc_frq(item, wgt);
        }
        base.inc_wgt(wgt);
        self.push_tract(t);
    }

    /// Adds an already normalized transaction without touching any item
    /// base. Used when rebuilding a bag in place.
    pub fn push_tract(&mut self, t: Transaction) {
        self.wgt += t.wgt();
        if t.size() > self.max {
            self.max = t.size();
        }
        self.tracts.push(t);
    }

    /// Number of transactions in the bag.
    #[inline]
    pub fn cnt(&self) -> usize {
        self.tracts.len()
    }

    /// Total weight of the transactions.
    #[inline]
    pub fn wgt(&self) -> Supp {
        self.wgt
    }

    /// Number of items in the largest transaction.
    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    #[inline]
    pub fn tract(&self, index: usize) -> &Transaction {
        &self.tracts[index]
    }

    #[inline]
    pub fn tracts(&self) -> &[Transaction] {
        &self.tracts
    }

    /// Sorts the transactions lexicographically by their item lists.
    pub fn sort(&mut self) {
        self.tracts.sort_unstable_by(|a, b| a.cmp_items(b));
    }

    /// Merges transactions with identical item lists, summing their
    /// weights. Returns the number of transactions removed by the merge.
    pub fn reduce(&mut self) -> usize {
        let before = self.tracts.len();
        let mut merged: AHashMap<Vec<ItemId>, Supp> = AHashMap::default();
        for t in self.tracts.drain(..) {
            let Transaction { items, wgt } = t;
            *merged.entry(items).or_insert(0) += wgt;
        }
        self.tracts = merged
            .into_iter()
            .map(|(items, wgt)| Transaction { items, wgt })
            .collect();
        self.sort();
        before - self.tracts.len()
    }

    /// Removes all items whose mark is not set and drops every transaction
    /// that falls below `min_size` items afterwards. The largest
    /// transaction size and the total weight are recomputed from what
    /// remains. Item frequencies recorded in an item base are not touched.
    pub fn filter(&mut self, min_size: usize, marks: &Vob) {
        let mut kept = Vec::with_capacity(self.tracts.len());
        for t in self.tracts.drain(..) {
            let items: Vec<ItemId> = t
                .items
                .iter()
                .copied()
                .filter(|&i| marks.get(i).unwrap_or(false))
                .collect();
            if items.len() >= min_size {
                kept.push(Transaction { items, wgt: t.wgt });
            }
        }
        self.tracts = kept;
        self.wgt = self.tracts.iter().map(|t| t.wgt()).sum();
        self.max = self.tracts.iter().map(|t| t.size()).max().unwrap_or(0);
    }

    /// Drops all items with a weighted frequency below `min` and renumbers
    /// the survivors by ascending (`dir >= 0`) or descending (`dir < 0`)
    /// frequency; ties keep their old relative order. The base and every
    /// transaction are rewritten accordingly. Returns the new item count.
    pub fn recode(&mut self, base: &mut ItemBase, min: Supp, dir: i32) -> usize {
        let mut order: Vec<ItemId> = (0..base.cnt()).filter(|&i| base.frq(i) >= min).collect();
        if dir >= 0 {
            order.sort_by_key(|&i| base.frq(i));
        } else {
            order.sort_by_key(|&i| -base.frq(i));
        }
        let map = base.permute(&order);
        let mut tracts = Vec::with_capacity(self.tracts.len());
        for t in self.tracts.drain(..) {
            let items: Vec<ItemId> = t.items.iter().filter_map(|&i| map[i]).collect();
            tracts.push(Transaction::new(items, t.wgt));
        }
        self.tracts = tracts;
        self.max = self.tracts.iter().map(|t| t.size()).max().unwrap_or(0);
        order.len()
    }
}
