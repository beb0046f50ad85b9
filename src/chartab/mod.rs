//! Hierarchical codepoint range map with inheritance
//!
//! A [`CharTable`] maps every codepoint in `0..=MAX_CODEPOINT` to an optional
//! value through a fixed four-level trie, giving:
//!
//! - **O(depth) point access** with a one-index fast path for ASCII
//! - **O(slots) range writes**: a fully covered slot is overwritten in one
//!   step no matter how many codepoints it spans
//! - **Run-coalescing lookup**: [`CharTable::get_with_run`] reports the
//!   uniform stretch surrounding a codepoint so callers can batch work
//! - **Inheritance**: tables chain to parents consulted when a lookup
//!   resolves absent, with cycle-checked parent assignment
//! - **Compaction**: [`CharTable::optimize`] collapses uniform subtrees
//! - **Packed property data**: bulk-loaded 128-codepoint blocks stay in
//!   their compressed form until a write needs to land inside one
//!
//! # Examples
//!
//! ```
//! use valtab::CharTable;
//!
//! let mut widths: CharTable<i64> = CharTable::new(0);
//! widths.set_range(0x1100, 0x115F, Some(2));
//!
//! let mut from = 0;
//! let mut to = valtab::MAX_CODEPOINT;
//! assert_eq!(widths.get_with_run(0x1120, &mut from, &mut to), Some(2));
//! assert_eq!((from, to), (0x1100, 0x115F));
//! ```

mod node;
mod table;

pub use node::{PackedBlock, BLOCK_SPAN, MAX_CODEPOINT};
pub use table::{CharTable, SharedCharTable};
