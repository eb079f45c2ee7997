//! # Frequent item set and association rule mining
//!
//! ## Description
//! A level-wise (Apriori) mining core built around an item set tree: a
//! prefix tree of support counters organized in per-depth levels. A mining
//! run seeds the tree with singleton supports, then alternates counting
//! passes over a transaction source with candidate generation
//! ([`tree::ItemsetTree::add_level`]) and compaction
//! ([`tree::ItemsetTree::prune`]) until no further level can be built.
//! Frequent sets and association rules are then produced either through the
//! resumable extraction cursor or through the recursive reporter traversal,
//! which compresses output with perfect extensions.
//!
//! ## Pruning
//! Candidate generation applies several tactics to keep the tree small:
//! the Apriori subset-support check, perfect-extension suppression,
//! evaluation-based counter flagging, and skip marks on subtrees that can
//! no longer grow. Counting passes honor the skip marks, so the cost of a
//! pass shrinks together with the tree.
//!
//! ## Collaborators
//! Transactions come from the [`basket`] crate, either as a plain bag or as
//! a prefix-compressed transaction tree. Output goes through the
//! [`report`] module, whose sink seam decouples the core from formatting.

pub use basket::{Appearance, ItemBase, ItemId, Supp, TaTree, Transaction, TransactionBag};

pub mod logging;
pub mod measures;
pub mod miner;
pub mod progress;
pub mod report;
pub mod tree;

/// Depth of a level in the item set tree; the root lives at depth 0.
pub type Depth = usize;
