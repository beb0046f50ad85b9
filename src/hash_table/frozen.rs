//! Snapshot form of a hash table
//!
//! Freezing keeps only what cannot be rederived: the live `(key, value)`
//! pairs, compacted, plus the coarse test kind and the weakness policy. The
//! derived arrays (cached hashes, chain links, the bucket index) are
//! dropped and rebuilt wholesale on thaw by rehashing every stored key into
//! a table sized exactly to the pair count. A user-defined test cannot be
//! serialized, so it freezes as its coarse kind (`equal`); that downgrade is
//! the documented lossy case.

use crate::datum::Datum;
use crate::error::Result;
use crate::hash_table::strategy::{HashTest, TestKind, Weakness};
use crate::hash_table::table::{HashTable, NO_INDEX};

/// The frozen shape of a [`HashTable`].
///
/// With the `serde` feature this derives `Serialize`/`Deserialize`; the byte
/// layout of a persisted snapshot belongs to the embedding persistence
/// layer, not to this crate.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrozenHashTable<V> {
    pairs: Vec<(V, V)>,
    test_kind: TestKind,
    weakness: Weakness,
}

impl<V: Datum> FrozenHashTable<V> {
    /// Assemble a frozen table directly, for persistence layers
    /// reconstructing a snapshot. Pairs must be distinct under `test_kind`.
    pub fn new(test_kind: TestKind, weakness: Weakness, pairs: Vec<(V, V)>) -> Self {
        FrozenHashTable {
            pairs,
            test_kind,
            weakness,
        }
    }

    /// The stored pairs, in frozen order.
    pub fn pairs(&self) -> &[(V, V)] {
        &self.pairs
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the snapshot holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The coarse strategy the thawed table will run under.
    pub fn test_kind(&self) -> TestKind {
        self.test_kind
    }

    /// The retention policy the thawed table will carry.
    pub fn weakness(&self) -> Weakness {
        self.weakness
    }
}

impl<V: Datum> HashTable<V> {
    /// Capture the table's logical content in frozen form.
    pub fn freeze(&self) -> FrozenHashTable<V> {
        FrozenHashTable {
            pairs: self
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            test_kind: self.test.kind(),
            weakness: self.weakness,
        }
    }

    /// Rebuild a live table from its frozen form: one bulk pass that sizes
    /// the arrays to the pair count, recomputes each key's hash, and links
    /// the index. Equivalent to replaying every pair through
    /// [`HashTable::put`] without any growth steps.
    pub fn thaw(frozen: FrozenHashTable<V>) -> Result<Self> {
        let size = frozen.pairs.len();
        let test = match frozen.test_kind {
            TestKind::Eq => HashTest::Eq,
            TestKind::Eql => HashTest::Eql,
            TestKind::Equal => HashTest::Equal,
        };
        let mut table = Self::allocate(test, frozen.weakness, size)?;
        for (i, (key, value)) in frozen.pairs.into_iter().enumerate() {
            let hash = table.test.hash(&key)?;
            table.hash[i] = hash;
            let bucket = table.bucket_of(hash);
            table.next[i] = table.index[bucket];
            table.index[bucket] = i as i32;
            table.key_and_value[2 * i] = Some(key);
            table.key_and_value[2 * i + 1] = Some(value);
        }
        table.count = size;
        table.next_free = NO_INDEX;
        Ok(table)
    }
}
