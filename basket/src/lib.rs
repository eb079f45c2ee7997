//! # Item and transaction management
//!
//! ## Description
//! Foundation crate for the mining engine: the item base (identifiers,
//! appearance flags and weighted frequencies), transactions and the
//! transaction bag/multiset, the prefix-compressed transaction tree used to
//! amortize counting over shared transaction prefixes, and a line parser
//! for transaction data.
//!
//! ## Conventions
//! Items are small non-negative integers (`ItemId`). A transaction is an
//! ascending, duplicate-free item list with an integer occurrence weight.
//! All weights and supports use `Supp`, which is also the type of the total
//! transaction weight of a bag.

use ahash::AHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

pub use item::{Appearance, ItemBase};
pub use tatree::{TaKind, TaNode, TaNodeId, TaTree};
pub use transaction::{Transaction, TransactionBag};

mod item;
mod tatree;
mod transaction;
pub mod parse;

/// Identifier of an item. Items are numbered consecutively from 0.
pub type ItemId = usize;

/// Support/weight type: occurrence weights of transactions and the supports
/// accumulated from them.
pub type Supp = i64;

/// A `HashMap` using the (fast, non-cryptographic) ahash hasher.
pub type AHashMap<K, V> = HashMap<K, V, BuildHasherDefault<AHasher>>;
