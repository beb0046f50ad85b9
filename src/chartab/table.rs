//! The root codepoint table: inheritance, defaults, ASCII fast path
//!
//! A [`CharTable`] owns the level-0 slot array inline plus the bookkeeping
//! that does not belong to any one trie node: the purpose tag, the default
//! value consulted when a slot resolves absent, the shared parent link that
//! forms an inheritance chain, bounds-checked extra slots, and a cache that
//! answers ASCII lookups with a single array index.

use std::cell::RefCell;
use std::rc::Rc;

use crate::chartab::node::{
    node_install_block, node_optimize, node_ref, node_ref_and_range, node_set, node_set_range,
    PackedBlock, Slot, ASCII_LIMIT, BLOCK_SPAN, LEAF_DEPTH, MAX_CODEPOINT, SLOT_COUNT,
};
use crate::datum::Datum;
use crate::error::{Result, ValtabError};

/// A table shared so it can serve as another table's parent.
pub type SharedCharTable<V> = Rc<RefCell<CharTable<V>>>;

/// ASCII fast path: either the whole sub-range resolves through one flat
/// slot, or a materialized copy of the 128 raw leaf values. Ownership rules
/// forbid an aliasing pointer into the tree, so the cache is a copy that is
/// rebuilt after every mutation touching the sub-range.
enum AsciiCache<V> {
    Uniform(Option<V>),
    Flat(Box<[Option<V>; ASCII_LIMIT as usize]>),
}

/// A sparse map from codepoints to values with range operations and
/// inheritance.
///
/// Lookups resolve in order: the table's own trie, its default value, then
/// the parent chain (each ancestor contributing its own slots and default).
/// Writes materialize trie nodes lazily and push the previous coverage down,
/// so a point write into a uniformly filled region costs one node per level,
/// not one write per codepoint.
///
/// # Examples
///
/// ```
/// use valtab::CharTable;
///
/// let mut table: CharTable<i64> = CharTable::new(0);
/// table.set_range('a' as u32, 'z' as u32, Some(1));
/// table.set('q' as u32, Some(2));
/// assert_eq!(table.get('a' as u32), Some(1));
/// assert_eq!(table.get('q' as u32), Some(2));
/// assert_eq!(table.get('A' as u32), None);
/// ```
pub struct CharTable<V: Datum> {
    purpose: V,
    default: Option<V>,
    parent: Option<SharedCharTable<V>>,
    slots: Vec<Slot<V>>,
    extras: Vec<Option<V>>,
    ascii: AsciiCache<V>,
    property: bool,
}

impl<V: Datum> CharTable<V> {
    /// Create an empty table tagged with `purpose`.
    pub fn new(purpose: V) -> Self {
        Self::with_extra_slots(purpose, 0)
    }

    /// Create an empty table with `extra_slots` metadata slots.
    pub fn with_extra_slots(purpose: V, extra_slots: usize) -> Self {
        CharTable {
            purpose,
            default: None,
            parent: None,
            slots: vec![Slot::Empty; SLOT_COUNT[0]],
            extras: vec![None; extra_slots],
            ascii: AsciiCache::Uniform(None),
            property: false,
        }
    }

    /// Create a property table: one that accepts packed leaf blocks.
    pub fn new_property(purpose: V, extra_slots: usize) -> Self {
        let mut table = Self::with_extra_slots(purpose, extra_slots);
        table.property = true;
        table
    }

    /// Create a table mapping the entire codepoint domain to `value`.
    pub fn uniform(purpose: V, value: V) -> Self {
        let mut table = Self::new(purpose);
        table.set_range(0, MAX_CODEPOINT, Some(value));
        table
    }

    /// Move the table behind a shared handle so it can parent other tables.
    pub fn into_shared(self) -> SharedCharTable<V> {
        Rc::new(RefCell::new(self))
    }

    /// The purpose tag given at creation.
    pub fn purpose(&self) -> &V {
        &self.purpose
    }

    /// Whether the table accepts packed leaf blocks.
    pub fn is_property_table(&self) -> bool {
        self.property
    }

    /// The fallback value consulted when a slot resolves absent.
    pub fn default_value(&self) -> Option<&V> {
        self.default.as_ref()
    }

    /// Replace the fallback value.
    pub fn set_default(&mut self, default: Option<V>) {
        self.default = default;
    }

    /// The current parent table, if any.
    pub fn parent(&self) -> Option<SharedCharTable<V>> {
        self.parent.clone()
    }

    /// Link `table` under `parent`, rejecting assignments that would make
    /// the inheritance chain cyclic. On rejection neither table changes.
    pub fn set_parent(
        table: &SharedCharTable<V>,
        parent: Option<SharedCharTable<V>>,
    ) -> Result<()> {
        if let Some(p) = &parent {
            let mut cursor = Some(p.clone());
            while let Some(ancestor) = cursor {
                if Rc::ptr_eq(&ancestor, table) {
                    return Err(ValtabError::ParentCycle);
                }
                cursor = ancestor.borrow().parent.clone();
            }
        }
        table.borrow_mut().parent = parent;
        Ok(())
    }

    /// Number of extra slots.
    pub fn extra_slots(&self) -> usize {
        self.extras.len()
    }

    /// Read extra slot `index`.
    pub fn extra(&self, index: usize) -> Result<Option<V>> {
        self.extras
            .get(index)
            .cloned()
            .ok_or_else(|| ValtabError::extra_slot_out_of_range(index, self.extras.len()))
    }

    /// Write extra slot `index`.
    pub fn set_extra(&mut self, index: usize, value: Option<V>) -> Result<()> {
        let len = self.extras.len();
        match self.extras.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ValtabError::extra_slot_out_of_range(index, len)),
        }
    }

    /// Look up `c`, falling back to the default and then the parent chain.
    ///
    /// Each step of the chain consults only that ancestor's own slots and
    /// default; an ancestor never forwards the nested query further itself.
    pub fn get(&self, c: u32) -> Option<V> {
        assert!(c <= MAX_CODEPOINT, "codepoint {c:#x} out of range");
        if let Some(v) = self.get_local(c) {
            return Some(v);
        }
        let mut parent = self.parent.clone();
        while let Some(p) = parent {
            let table = p.borrow();
            if let Some(v) = table.get_local(c) {
                return Some(v);
            }
            parent = table.parent.clone();
        }
        None
    }

    /// Own-table lookup: trie slot (one array index for ASCII), then default.
    fn get_local(&self, c: u32) -> Option<V> {
        let own = if c < ASCII_LIMIT {
            match &self.ascii {
                AsciiCache::Uniform(u) => u.clone(),
                AsciiCache::Flat(values) => values[c as usize].clone(),
            }
        } else {
            node_ref(&self.slots, 0, 0, c)
        };
        own.or_else(|| self.default.clone())
    }

    /// Store `value` at `c` (`None` clears the slot back to absent).
    pub fn set(&mut self, c: u32, value: Option<V>) {
        assert!(c <= MAX_CODEPOINT, "codepoint {c:#x} out of range");
        node_set(&mut self.slots, 0, 0, c, value);
        if c < ASCII_LIMIT {
            self.refresh_ascii();
        }
    }

    /// Store `value` for every codepoint in `[from, to]`.
    pub fn set_range(&mut self, from: u32, to: u32, value: Option<V>) {
        assert!(from <= to, "empty range {from:#x}..{to:#x}");
        assert!(to <= MAX_CODEPOINT, "codepoint {to:#x} out of range");
        if from == to {
            return self.set(from, value);
        }
        node_set_range(&mut self.slots, 0, 0, from, to, &value);
        if from < ASCII_LIMIT {
            self.refresh_ascii();
        }
    }

    /// Clear every codepoint in `[from, to]` back to absent.
    pub fn clear_range(&mut self, from: u32, to: u32) {
        self.set_range(from, to, None);
    }

    /// Look up `c` and shrink `[*from, *to]` to the surrounding run that
    /// resolves to the identical value, so callers can batch-process uniform
    /// stretches.
    ///
    /// Run edges are detected with identity comparison against neighboring
    /// slots; `*from - 1` or `*to + 1` may therefore coincidentally resolve
    /// to the returned value. When this table resolves `c` absent, the
    /// ancestor chain is consulted level by level, narrowing the run
    /// further at each step.
    pub fn get_with_run(&self, c: u32, from: &mut u32, to: &mut u32) -> Option<V> {
        assert!(c <= MAX_CODEPOINT, "codepoint {c:#x} out of range");
        if *to > MAX_CODEPOINT {
            *to = MAX_CODEPOINT;
        }
        debug_assert!(*from <= c && c <= *to);
        let val = node_ref_and_range(&self.slots, 0, 0, c, from, to, &self.default);
        if val.is_some() {
            return val;
        }
        let mut parent = self.parent.clone();
        while let Some(p) = parent {
            let table = p.borrow();
            let val = node_ref_and_range(&table.slots, 0, 0, c, from, to, &table.default);
            if val.is_some() {
                return val;
            }
            parent = table.parent.clone();
        }
        None
    }

    /// Call `visit(from, to, value)` once per maximal stretch of present
    /// values, walking the whole domain left to right. Adjacent stretches
    /// merge only when their values are identical, not merely equal, so
    /// stretches that could later diverge through shared structure stay
    /// separate. Absent stretches fall back to the ancestor chain.
    pub fn for_each_run<F: FnMut(u32, u32, &V)>(&self, mut visit: F) {
        let mut pending: Option<(u32, u32, V)> = None;
        let mut c: u32 = 0;
        loop {
            let mut from = 0;
            let mut to = MAX_CODEPOINT;
            match self.get_with_run(c, &mut from, &mut to) {
                Some(v) => match &mut pending {
                    Some((_, end, value)) if value.same(&v) => *end = to,
                    _ => {
                        if let Some((start, end, value)) = pending.take() {
                            visit(start, end, &value);
                        }
                        pending = Some((from, to, v));
                    }
                },
                None => {
                    if let Some((start, end, value)) = pending.take() {
                        visit(start, end, &value);
                    }
                }
            }
            if to >= MAX_CODEPOINT {
                break;
            }
            c = to + 1;
        }
        if let Some((start, end, value)) = pending.take() {
            visit(start, end, &value);
        }
    }

    /// Collapse sub-structure that has become uniform, comparing values with
    /// deep equality (identity short-circuits first). Lookup results are
    /// unchanged.
    pub fn optimize(&mut self) {
        self.optimize_with(|a, b| a.equal(b));
    }

    /// [`CharTable::optimize`] with a caller-chosen equivalence.
    pub fn optimize_with<F: Fn(&V, &V) -> bool>(&mut self, cmp: F) {
        node_optimize(&mut self.slots, &cmp);
        self.refresh_ascii();
    }

    /// Install a packed 128-codepoint block starting at `start`. Property
    /// tables only; `start` must be block-aligned. Whatever the block's
    /// range held before is discarded.
    pub fn load_packed(&mut self, start: u32, block: PackedBlock<V>) -> Result<()> {
        if !self.property {
            return Err(ValtabError::NotPropertyTable);
        }
        if start % BLOCK_SPAN != 0 || start > MAX_CODEPOINT {
            return Err(ValtabError::misaligned_block(start, BLOCK_SPAN));
        }
        node_install_block(&mut self.slots, 0, 0, start, block);
        if start < ASCII_LIMIT {
            self.refresh_ascii();
        }
        Ok(())
    }

    fn refresh_ascii(&mut self) {
        self.ascii = Self::compute_ascii(&self.slots);
    }

    /// Walk the 0-slot chain: a flat slot anywhere on the way covers all of
    /// ASCII uniformly; a leaf node (or packed block) covering 0..=127 is
    /// materialized into the flat cache.
    fn compute_ascii(slots: &[Slot<V>]) -> AsciiCache<V> {
        let mut cur = &slots[0];
        loop {
            match cur {
                Slot::Sub(sub) if sub.depth < LEAF_DEPTH => cur = &sub.slots[0],
                Slot::Sub(sub) => {
                    let values = Box::new(std::array::from_fn(|i| match &sub.slots[i] {
                        Slot::Val(v) => Some(v.clone()),
                        _ => None,
                    }));
                    return AsciiCache::Flat(values);
                }
                Slot::Packed(block) => {
                    let values = Box::new(std::array::from_fn(|i| block.get(i as u32)));
                    return AsciiCache::Flat(values);
                }
                Slot::Empty => return AsciiCache::Uniform(None),
                Slot::Val(v) => return AsciiCache::Uniform(Some(v.clone())),
            }
        }
    }
}

/// Structural copy: every reachable node is duplicated, leaf value handles
/// are shared, the parent link is shared, and the ASCII cache is recomputed
/// from the new tree rather than copied.
impl<V: Datum> Clone for CharTable<V> {
    fn clone(&self) -> Self {
        let slots = self.slots.clone();
        let ascii = Self::compute_ascii(&slots);
        CharTable {
            purpose: self.purpose.clone(),
            default: self.default.clone(),
            parent: self.parent.clone(),
            slots,
            extras: self.extras.clone(),
            ascii,
            property: self.property,
        }
    }
}
