//! Hash tables with pluggable equality, weak entries, and snapshots
//!
//! [`HashTable`] is a chained hash table over opaque runtime values:
//!
//! - **Pluggable tests**: identity, identity-plus-numbers, deep equality, or
//!   user-defined callbacks interned through a [`TestRegistry`]
//! - **Stable entries**: a free list recycles removed slots, so entry
//!   indices only move on growth
//! - **Front-loaded growth**: small tables quadruple, large ones double,
//!   and resizing reuses cached hashes so user callbacks never run mid-grow
//! - **Reentrancy guard**: while a user callback runs, mutation attempts
//!   fail cleanly instead of corrupting the arrays
//! - **Weak entries**: four retention policies swept in the collector's
//!   mark/remove rhythm through a [`GcOracle`](crate::GcOracle)
//! - **Freeze/thaw**: a compact snapshot form that rebuilds all derived
//!   state on restore
//!
//! # Examples
//!
//! ```
//! use valtab::{HashTable, HashTest};
//!
//! let mut counts: HashTable<i64> = HashTable::new();
//! counts.put(7, 1).unwrap();
//! counts.put(7, 2).unwrap();
//! assert_eq!(counts.len(), 1);
//! assert_eq!(counts.get(&7).unwrap(), Some(&2));
//! ```

mod frozen;
mod strategy;
mod table;
mod weak;

pub use frozen::FrozenHashTable;
pub use strategy::{
    CustomEqualFn, CustomHashFn, CustomTest, HashTest, TestKind, TestRegistry, Weakness,
};
pub use table::{HashTable, HashTableConfig, Iter};
