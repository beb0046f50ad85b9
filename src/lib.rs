//! # Valtab: Runtime Table Structures
//!
//! This crate provides the two workhorse table structures of a
//! dynamic-language runtime, implemented over an opaque value handle so the
//! host's object model stays outside:
//!
//! - **Char-table** ([`CharTable`]): a sparse hierarchical map from
//!   codepoints to values with range writes, run-coalescing lookup,
//!   inheritance chains, and uniform-subtree compaction
//! - **Hash table** ([`HashTable`]): chained hashing with stable entry
//!   slots, a free list, pluggable equality strategies, weak-reference
//!   retention policies swept by an external collector, and a freeze/thaw
//!   snapshot form
//!
//! Both structures are single-threaded by design and communicate absence as
//! `Option`, never through sentinels or errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use valtab::{CharTable, HashTable, HashTest, MAX_CODEPOINT};
//!
//! // Map a block of codepoints in one write, then refine one of them.
//! let mut widths: CharTable<i64> = CharTable::new(0);
//! widths.set_range(0x4E00, 0x9FFF, Some(2));
//! widths.set(0x4E2D, Some(3));
//! assert_eq!(widths.get(0x4E00), Some(2));
//! assert_eq!(widths.get(0x4E2D), Some(3));
//!
//! // Coalesce the uniform run around a codepoint.
//! let mut from = 0;
//! let mut to = MAX_CODEPOINT;
//! assert_eq!(widths.get_with_run(0x9000, &mut from, &mut to), Some(2));
//!
//! // A hash table keyed by value equality.
//! let mut table: HashTable<i64> = HashTable::with_test(HashTest::Eql);
//! table.put(1, 100).unwrap();
//! assert_eq!(table.get(&1).unwrap(), Some(&100));
//! ```
//!
//! ## Embedding
//!
//! Implement [`Datum`] for the runtime's value handle to supply the three
//! equivalences and their hashes, and [`GcOracle`] for the collector's
//! liveness view if weak tables are in play. Convenience impls cover
//! immediates (`i64`, `char`, …) and `Rc<T>`.

#![warn(missing_docs)]

pub mod chartab;
pub mod datum;
pub mod error;
pub mod hash_table;

pub use chartab::{CharTable, PackedBlock, SharedCharTable, BLOCK_SPAN, MAX_CODEPOINT};
pub use datum::{Datum, GcOracle};
pub use error::{Result, ValtabError};
pub use hash_table::{
    FrozenHashTable, HashTable, HashTableConfig, HashTest, TestKind, TestRegistry, Weakness,
};
