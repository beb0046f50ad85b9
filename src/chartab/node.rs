//! Trie nodes and slot arithmetic for the codepoint table
//!
//! The table is a four-level trie. Level geometry is fixed: the root holds 64
//! slots of 65536 codepoints each, the next two levels fan out 16 × 4096 and
//! 32 × 128, and the leaf level holds 128 single-codepoint slots. A slot is
//! absent, a raw value, an owned child node one level deeper, or (in property
//! tables) a still-packed 128-codepoint block.
//!
//! All traversal helpers here take a slot array plus its `(depth, min_char)`
//! coordinates so the root array and heap nodes share one code path.

use crate::datum::Datum;
use crate::error::{Result, ValtabError};

/// Highest codepoint the table covers.
pub const MAX_CODEPOINT: u32 = 0x3F_FFFF;

/// Codepoints covered by one packed leaf block.
pub const BLOCK_SPAN: u32 = 128;

/// Codepoints with a dedicated fast-path cache at the root.
pub(crate) const ASCII_LIMIT: u32 = 128;

/// Slots per node, by node depth (0 is the root array).
pub(crate) const SLOT_COUNT: [usize; 4] = [64, 16, 32, 128];

/// Codepoints covered by one slot, by node depth.
pub(crate) const SLOT_SPAN: [u32; 4] = [1 << 16, 1 << 12, 1 << 7, 1];

/// Right shift mapping an in-node offset to a slot index, by node depth.
pub(crate) const SLOT_SHIFT: [u32; 4] = [16, 12, 7, 0];

pub(crate) const LEAF_DEPTH: usize = 3;

/// One slot of a trie node.
#[derive(Clone)]
pub(crate) enum Slot<V> {
    Empty,
    Val(V),
    Sub(Box<SubNode<V>>),
    Packed(PackedBlock<V>),
}

impl<V> Slot<V> {
    pub(crate) fn from_option(value: Option<V>) -> Self {
        match value {
            Some(v) => Slot::Val(v),
            None => Slot::Empty,
        }
    }
}

/// A heap node covering `SLOT_COUNT[depth]` slots starting at `min_char`.
#[derive(Clone)]
pub(crate) struct SubNode<V> {
    pub(crate) depth: usize,
    pub(crate) min_char: u32,
    pub(crate) slots: Vec<Slot<V>>,
}

impl<V: Datum> SubNode<V> {
    /// Fresh node with every slot holding `fill`: the non-destructive
    /// push-down of the value the node replaces.
    pub(crate) fn uniform(depth: usize, min_char: u32, fill: Slot<V>) -> Self {
        SubNode {
            depth,
            min_char,
            slots: vec![fill; SLOT_COUNT[depth]],
        }
    }
}

/// A 128-codepoint block kept in its loaded, still-compressed form.
///
/// Property tables install these wholesale (one per leaf block) and expand
/// them into real leaf nodes only when a write or other structured access
/// needs to land inside; point lookups decode arithmetically in place.
#[derive(Clone)]
pub struct PackedBlock<V> {
    repr: Repr<V>,
}

#[derive(Clone)]
enum Repr<V> {
    /// One entry per covered codepoint.
    Literal(Vec<Option<V>>),
    /// Run-length pairs; counts sum to the block span.
    Runs(Vec<(u16, Option<V>)>),
}

impl<V: Datum> PackedBlock<V> {
    /// Build a literal block. `values` must hold exactly [`BLOCK_SPAN`]
    /// entries.
    pub fn literal(values: Vec<Option<V>>) -> Result<Self> {
        if values.len() != BLOCK_SPAN as usize {
            return Err(ValtabError::bad_packed_block(format!(
                "literal block holds {} entries, expected {}",
                values.len(),
                BLOCK_SPAN
            )));
        }
        Ok(PackedBlock {
            repr: Repr::Literal(values),
        })
    }

    /// Build a run-length block from `(count, value)` pairs. Counts must be
    /// positive and sum to exactly [`BLOCK_SPAN`].
    pub fn runs(runs: Vec<(u16, Option<V>)>) -> Result<Self> {
        let mut total: u32 = 0;
        for (count, _) in &runs {
            if *count == 0 {
                return Err(ValtabError::bad_packed_block("zero-length run"));
            }
            total += u32::from(*count);
        }
        if total != BLOCK_SPAN {
            return Err(ValtabError::bad_packed_block(format!(
                "runs cover {} codepoints, expected {}",
                total, BLOCK_SPAN
            )));
        }
        Ok(PackedBlock {
            repr: Repr::Runs(runs),
        })
    }

    /// Decode the entry at `offset` (0-based within the block).
    pub(crate) fn get(&self, offset: u32) -> Option<V> {
        debug_assert!(offset < BLOCK_SPAN);
        match &self.repr {
            Repr::Literal(values) => values[offset as usize].clone(),
            Repr::Runs(runs) => {
                let mut covered: u32 = 0;
                for (count, value) in runs {
                    covered += u32::from(*count);
                    if offset < covered {
                        return value.clone();
                    }
                }
                None
            }
        }
    }

    /// Expand into a real leaf node rooted at `min_char`.
    pub(crate) fn unpack(self, min_char: u32) -> SubNode<V> {
        let mut slots = Vec::with_capacity(BLOCK_SPAN as usize);
        match self.repr {
            Repr::Literal(values) => {
                slots.extend(values.into_iter().map(Slot::from_option));
            }
            Repr::Runs(runs) => {
                for (count, value) in runs {
                    for _ in 0..count {
                        slots.push(Slot::from_option(value.clone()));
                    }
                }
            }
        }
        SubNode {
            depth: LEAF_DEPTH,
            min_char,
            slots,
        }
    }

    /// Value at `c` plus the surrounding in-block run, clamped to
    /// `[*from, *to]`. Entries decoding to absent resolve to `default`
    /// before comparison, like ordinary slots.
    fn ref_and_range(
        &self,
        start: u32,
        c: u32,
        from: &mut u32,
        to: &mut u32,
        default: &Option<V>,
    ) -> Option<V> {
        let resolve = |off: u32| self.get(off).or_else(|| default.clone());
        let val = resolve(c - start);

        let mut x = c;
        while x > start && x > *from {
            if !option_same(&resolve(x - 1 - start), &val) {
                *from = x;
                break;
            }
            x -= 1;
        }

        let end = start + BLOCK_SPAN - 1;
        let mut x = c;
        while x < end && x < *to {
            if !option_same(&resolve(x + 1 - start), &val) {
                *to = x;
                break;
            }
            x += 1;
        }

        val
    }
}

/// Identity comparison lifted over absence.
#[inline]
pub(crate) fn option_same<V: Datum>(a: &Option<V>, b: &Option<V>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x.same(y),
        _ => false,
    }
}

#[inline]
pub(crate) fn slot_index(depth: usize, min_char: u32, c: u32) -> usize {
    ((c - min_char) >> SLOT_SHIFT[depth]) as usize
}

#[inline]
pub(crate) fn slot_start(depth: usize, min_char: u32, i: usize) -> u32 {
    min_char + (i as u32) * SLOT_SPAN[depth]
}

/// Point lookup within one node's subtree. Returns the raw stored value;
/// defaults and inheritance are the root's concern.
pub(crate) fn node_ref<V: Datum>(
    slots: &[Slot<V>],
    depth: usize,
    min_char: u32,
    c: u32,
) -> Option<V> {
    let i = slot_index(depth, min_char, c);
    match &slots[i] {
        Slot::Empty => None,
        Slot::Val(v) => Some(v.clone()),
        Slot::Sub(sub) => node_ref(&sub.slots, sub.depth, sub.min_char, c),
        Slot::Packed(block) => block.get(c - slot_start(depth, min_char, i)),
    }
}

/// Replace a flat slot with a child node one level deeper, pushing the old
/// value down as the child's uniform fill. Packed blocks expand here.
pub(crate) fn ensure_sub<V: Datum>(slot: &mut Slot<V>, child_depth: usize, start: u32) {
    if matches!(slot, Slot::Sub(_)) {
        return;
    }
    let old = std::mem::replace(slot, Slot::Empty);
    let sub = match old {
        Slot::Sub(sub) => *sub,
        Slot::Packed(block) => block.unpack(start),
        flat => SubNode::uniform(child_depth, start, flat),
    };
    *slot = Slot::Sub(Box::new(sub));
}

/// Point write, materializing missing nodes down to the leaf level.
pub(crate) fn node_set<V: Datum>(
    slots: &mut [Slot<V>],
    depth: usize,
    min_char: u32,
    c: u32,
    value: Option<V>,
) {
    let i = slot_index(depth, min_char, c);
    if depth == LEAF_DEPTH {
        slots[i] = Slot::from_option(value);
        return;
    }
    ensure_sub(&mut slots[i], depth + 1, slot_start(depth, min_char, i));
    if let Slot::Sub(sub) = &mut slots[i] {
        node_set(&mut sub.slots, sub.depth, sub.min_char, c, value);
    }
}

/// Range write. Fully covered slots are overwritten in one step, dropping
/// any subtree they held; boundary slots materialize and recurse. The leaf
/// level always writes per slot.
pub(crate) fn node_set_range<V: Datum>(
    slots: &mut [Slot<V>],
    depth: usize,
    min_char: u32,
    from: u32,
    to: u32,
    value: &Option<V>,
) {
    let span = SLOT_SPAN[depth];
    let from = from.max(min_char);
    let mut i = slot_index(depth, min_char, from);
    let mut c = slot_start(depth, min_char, i);
    while i < SLOT_COUNT[depth] && c <= to {
        if depth == LEAF_DEPTH || (from <= c && c + span - 1 <= to) {
            slots[i] = Slot::from_option(value.clone());
        } else {
            ensure_sub(&mut slots[i], depth + 1, c);
            if let Slot::Sub(sub) = &mut slots[i] {
                node_set_range(&mut sub.slots, sub.depth, sub.min_char, from, to, value);
            }
        }
        i += 1;
        c += span;
    }
}

/// Resolve one slot to its value at probe codepoint `c`, narrowing
/// `[*from, *to]` when descending into child structure.
fn resolve_slot<V: Datum>(
    slot: &Slot<V>,
    depth: usize,
    min_char: u32,
    i: usize,
    c: u32,
    from: &mut u32,
    to: &mut u32,
    default: &Option<V>,
) -> Option<V> {
    match slot {
        Slot::Empty => default.clone(),
        Slot::Val(v) => Some(v.clone()),
        Slot::Sub(sub) => {
            node_ref_and_range(&sub.slots, sub.depth, sub.min_char, c, from, to, default)
        }
        Slot::Packed(block) => {
            block.ref_and_range(slot_start(depth, min_char, i), c, from, to, default)
        }
    }
}

/// Lookup at `c` that also narrows `[*from, *to]` to the surrounding run of
/// slots resolving to the identical value. Scans left then right from the
/// anchor slot, stopping at the first neighbor whose resolved value differs
/// under identity comparison. The clamp lands on the differing slot's edge,
/// so a re-derived but identical-looking neighbor may be excluded; callers
/// accept that the reported run need not be maximal.
pub(crate) fn node_ref_and_range<V: Datum>(
    slots: &[Slot<V>],
    depth: usize,
    min_char: u32,
    c: u32,
    from: &mut u32,
    to: &mut u32,
    default: &Option<V>,
) -> Option<V> {
    let span = SLOT_SPAN[depth];
    let anchor = slot_index(depth, min_char, c);
    let val = resolve_slot(&slots[anchor], depth, min_char, anchor, c, from, to, default);

    let mut idx = anchor;
    while idx > 0 && *from < slot_start(depth, min_char, idx) {
        let edge = slot_start(depth, min_char, idx) - 1;
        idx -= 1;
        let this_val = resolve_slot(&slots[idx], depth, min_char, idx, edge, from, to, default);
        if !option_same(&this_val, &val) {
            *from = edge + 1;
            break;
        }
    }

    let mut idx = anchor;
    loop {
        let next_start = slot_start(depth, min_char, idx) + span;
        if idx + 1 >= SLOT_COUNT[depth] || next_start > *to {
            break;
        }
        idx += 1;
        let this_val =
            resolve_slot(&slots[idx], depth, min_char, idx, next_start, from, to, default);
        if !option_same(&this_val, &val) {
            *to = next_start - 1;
            break;
        }
    }

    val
}

/// Post-order collapse of child nodes whose slots are all flat and mutually
/// equal under `cmp` (identity short-circuits before `cmp` runs). Purely a
/// space optimization; lookups are unchanged.
pub(crate) fn node_optimize<V: Datum>(slots: &mut [Slot<V>], cmp: &dyn Fn(&V, &V) -> bool) {
    for slot in slots.iter_mut() {
        if let Slot::Sub(sub) = slot {
            node_optimize(&mut sub.slots, cmp);
            if let Some(collapsed) = uniform_value(&sub.slots, cmp) {
                *slot = collapsed;
            }
        }
    }
}

fn uniform_value<V: Datum>(slots: &[Slot<V>], cmp: &dyn Fn(&V, &V) -> bool) -> Option<Slot<V>> {
    let first = &slots[0];
    for slot in slots {
        match (first, slot) {
            (Slot::Empty, Slot::Empty) => {}
            (Slot::Val(a), Slot::Val(b)) => {
                if !(a.same(b) || cmp(a, b)) {
                    return None;
                }
            }
            _ => return None,
        }
    }
    Some(first.clone())
}

/// Install a packed block at the leaf-block slot covering `start`,
/// materializing the path above it. Whatever the slot held is discarded.
pub(crate) fn node_install_block<V: Datum>(
    slots: &mut [Slot<V>],
    depth: usize,
    min_char: u32,
    start: u32,
    block: PackedBlock<V>,
) {
    let i = slot_index(depth, min_char, start);
    if depth == LEAF_DEPTH - 1 {
        slots[i] = Slot::Packed(block);
        return;
    }
    ensure_sub(&mut slots[i], depth + 1, slot_start(depth, min_char, i));
    if let Slot::Sub(sub) = &mut slots[i] {
        node_install_block(&mut sub.slots, sub.depth, sub.min_char, start, block);
    }
}
