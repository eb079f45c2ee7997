//! The item base: name interning, appearance flags and weighted item
//! frequencies, shared by everything that handles transactions.

use crate::{AHashMap, ItemId, Supp};

/// Where an item may appear in an association rule. `Ignore`d items are
/// invisible to candidate generation and extraction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Appearance {
    Ignore,
    Body,
    Head,
    Both,
}

impl Appearance {
    /// May the item appear in a rule head (consequent)?
    #[inline]
    pub fn in_head(self) -> bool {
        match self {
            Appearance::Head | Appearance::Both => true,
            _ => false,
        }
    }

    /// May the item appear in a rule body (antecedent)?
    #[inline]
    pub fn in_body(self) -> bool {
        match self {
            Appearance::Body | Appearance::Both => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
struct ItemData {
    name: String,
    app: Appearance,
    frq: Supp,
}

/// The item base. Maps names to consecutive identifiers and records, per
/// item, its appearance flag and its weighted frequency (total weight of the
/// transactions containing it). Also carries the total transaction weight,
/// which doubles as the support of the empty set.
#[derive(Clone, Debug)]
pub struct ItemBase {
    items: Vec<ItemData>,
    index: AHashMap<String, ItemId>,
    wgt: Supp,
    default_app: Appearance,
}

impl ItemBase {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: AHashMap::default(),
            wgt: 0,
            default_app: Appearance::Both,
        }
    }

    /// An item base with `cnt` pre-registered items named by their own
    /// identifier. Convenient when transactions are built programmatically.
    pub fn with_item_count(cnt: usize) -> Self {
        let mut base = Self::new();
        for i in 0..cnt {
            base.intern(&i.to_string());
        }
        base
    }

    /// Sets the appearance flag assigned to newly interned items.
    pub fn set_default_app(&mut self, app: Appearance) {
        self.default_app = app;
    }

    /// Returns the identifier for `name`, registering the item if it is not
    /// known yet.
    pub fn intern(&mut self, name: &str) -> ItemId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.items.len();
        self.items.push(ItemData {
            name: name.to_string(),
            app: self.default_app,
            frq: 0,
        });
        self.index.insert(name.to_string(), id);
        id
    }

    /// Looks up a registered item by name.
    pub fn item(&self, name: &str) -> Option<ItemId> {
        self.index.get(name).copied()
    }

    /// Number of registered items.
    #[inline]
    pub fn cnt(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn name(&self, item: ItemId) -> &str {
        &self.items[item].name
    }

    #[inline]
    pub fn app(&self, item: ItemId) -> Appearance {
        self.items[item].app
    }

    pub fn set_app(&mut self, item: ItemId, app: Appearance) {
        self.items[item].app = app;
    }

    /// Weighted frequency of `item`: total weight of the transactions that
    /// contain it.
    #[inline]
    pub fn frq(&self, item: ItemId) -> Supp {
        self.items[item].frq
    }

    pub fn set_frq(&mut self, item: ItemId, frq: Supp) {
        self.items[item].frq = frq;
    }

    pub fn inc_frq(&mut self, item: ItemId, frq: Supp) {
        self.items[item].frq += frq;
    }

    /// Total weight of all transactions registered with this base.
    #[inline]
    pub fn wgt(&self) -> Supp {
        self.wgt
    }

    pub fn set_wgt(&mut self, wgt: Supp) {
        self.wgt = wgt;
    }

    pub fn inc_wgt(&mut self, wgt: Supp) {
        self.wgt += wgt;
    }

    /// Reorders the items of the base according to `order` and renumbers
    /// them consecutively. Returns the mapping from old to new identifiers.
    /// Used by [`TransactionBag::recode`](crate::TransactionBag::recode).
    pub(crate) fn permute(&mut self, order: &[ItemId]) -> Vec<Option<ItemId>> {
        let mut map = vec![None; self.items.len()];
        let mut items = Vec::with_capacity(order.len());
        for (new, &old) in order.iter().enumerate() {
            map[old] = Some(new);
            items.push(self.items[old].clone());
        }
        self.items = items;
        self.index.clear();
        for (id, data) in self.items.iter().enumerate() {
            self.index.insert(data.name.clone(), id);
        }
        map
    }
}

impl Default for ItemBase {
    fn default() -> Self {
        Self::new()
    }
}
