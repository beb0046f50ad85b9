//! Equality strategies, weakness policies, and bucket hashing
//!
//! A table's behavior is parameterized by a test strategy: one of three
//! builtins driving the [`Datum`](crate::Datum) equivalences, or a
//! user-defined descriptor pairing a fallible hash function with a fallible
//! equality function. User descriptors are interned in a [`TestRegistry`] so
//! repeated construction by name reuses one shared descriptor.
//!
//! Bucket selection uses Knuth multiplicative hashing over a 32-bit
//! reduction of the cached 64-bit hash, against an index that is always a
//! power of two.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::datum::Datum;
use crate::error::{Result, ValtabError};

/// Multiplier for Knuth multiplicative hashing (2^32 / phi).
const KNUTH_ALPHA: u32 = 2_654_435_769;

/// Fold a cached 64-bit hash into the 32 bits the bucket step consumes.
#[inline]
pub(crate) fn reduce_hash(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Bucket for `hash` in an index of `2^bits` heads.
#[inline]
pub(crate) fn knuth_bucket(hash: u64, bits: u32) -> usize {
    debug_assert!((1..=32).contains(&bits));
    (reduce_hash(hash).wrapping_mul(KNUTH_ALPHA) >> (32 - bits)) as usize
}

/// Coarse strategy discriminant, the only strategy information a frozen
/// table retains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestKind {
    /// Identity.
    Eq,
    /// Identity plus numbers by value.
    Eql,
    /// Deep structural equality.
    Equal,
}

impl TestKind {
    /// Canonical name of the builtin.
    pub fn name(self) -> &'static str {
        match self {
            TestKind::Eq => "eq",
            TestKind::Eql => "eql",
            TestKind::Equal => "equal",
        }
    }
}

/// User-supplied hash function. May fail; failures propagate out of the
/// table operation that invoked it.
pub type CustomHashFn<V> = Rc<dyn Fn(&V) -> Result<u64>>;

/// User-supplied equality function. Same failure contract as the hash.
pub type CustomEqualFn<V> = Rc<dyn Fn(&V, &V) -> Result<bool>>;

/// A named user-defined test descriptor.
pub struct CustomTest<V> {
    pub(crate) name: String,
    pub(crate) hash_fn: CustomHashFn<V>,
    pub(crate) equal_fn: CustomEqualFn<V>,
}

impl<V> fmt::Debug for CustomTest<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTest").field("name", &self.name).finish()
    }
}

/// The equality strategy a hash table runs under.
#[derive(Debug)]
pub enum HashTest<V> {
    /// Identity comparison, identity hash.
    Eq,
    /// Identity plus numbers by value.
    Eql,
    /// Deep structural equality and hash.
    Equal,
    /// A user-defined, possibly interned descriptor.
    Custom(Rc<CustomTest<V>>),
}

impl<V> Clone for HashTest<V> {
    fn clone(&self) -> Self {
        match self {
            HashTest::Eq => HashTest::Eq,
            HashTest::Eql => HashTest::Eql,
            HashTest::Equal => HashTest::Equal,
            HashTest::Custom(t) => HashTest::Custom(t.clone()),
        }
    }
}

impl<V: Datum> HashTest<V> {
    /// Resolve a test by name: one of the builtins, else a registered
    /// descriptor in `registry`.
    pub fn from_name(name: &str, registry: &TestRegistry<V>) -> Result<Self> {
        match name {
            "eq" => Ok(HashTest::Eq),
            "eql" => Ok(HashTest::Eql),
            "equal" => Ok(HashTest::Equal),
            other => registry
                .lookup(other)
                .ok_or_else(|| ValtabError::unknown_test(other)),
        }
    }

    /// The strategy's name.
    pub fn name(&self) -> &str {
        match self {
            HashTest::Eq => "eq",
            HashTest::Eql => "eql",
            HashTest::Equal => "equal",
            HashTest::Custom(t) => &t.name,
        }
    }

    /// Coarse discriminant; user tests degrade to [`TestKind::Equal`].
    pub fn kind(&self) -> TestKind {
        match self {
            HashTest::Eq => TestKind::Eq,
            HashTest::Eql => TestKind::Eql,
            HashTest::Equal | HashTest::Custom(_) => TestKind::Equal,
        }
    }

    pub(crate) fn is_custom(&self) -> bool {
        matches!(self, HashTest::Custom(_))
    }

    /// Hash under this strategy. Only the custom arm can fail.
    pub(crate) fn hash(&self, value: &V) -> Result<u64> {
        match self {
            HashTest::Eq => Ok(value.hash_identity()),
            HashTest::Eql => Ok(value.hash_eqv()),
            HashTest::Equal => Ok(value.hash_equal()),
            HashTest::Custom(t) => (t.hash_fn)(value),
        }
    }

    /// Equality under this strategy, for keys the caller has already found
    /// non-identical with matching cached hashes. Identity tables therefore
    /// answer false here.
    pub(crate) fn confirm(&self, probe: &V, stored: &V) -> Result<bool> {
        match self {
            HashTest::Eq => Ok(false),
            HashTest::Eql => Ok(probe.eqv(stored)),
            HashTest::Equal => Ok(probe.equal(stored)),
            HashTest::Custom(t) => (t.equal_fn)(probe, stored),
        }
    }
}

/// Retention policy for entries of a weak table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weakness {
    /// Entries always survive.
    #[default]
    None,
    /// An entry survives while its key does.
    Key,
    /// An entry survives while its value does.
    Value,
    /// An entry survives while either component does.
    KeyOrValue,
    /// An entry survives only while both components do.
    KeyAndValue,
}

impl Weakness {
    /// Resolve a weakness by name. `"nil"` and `"none"` select no weakness;
    /// `"t"` is accepted as the strongest form, key-and-value.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "nil" | "none" => Ok(Weakness::None),
            "key" => Ok(Weakness::Key),
            "value" => Ok(Weakness::Value),
            "key-or-value" => Ok(Weakness::KeyOrValue),
            "key-and-value" | "t" => Ok(Weakness::KeyAndValue),
            other => Err(ValtabError::unknown_weakness(other)),
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Weakness::None => "none",
            Weakness::Key => "key",
            Weakness::Value => "value",
            Weakness::KeyOrValue => "key-or-value",
            Weakness::KeyAndValue => "key-and-value",
        }
    }

    /// Whether an entry with the given component liveness is retained.
    #[inline]
    pub(crate) fn keeps(self, key_live: bool, value_live: bool) -> bool {
        match self {
            Weakness::None => true,
            Weakness::Key => key_live,
            Weakness::Value => value_live,
            Weakness::KeyOrValue => key_live || value_live,
            Weakness::KeyAndValue => key_live && value_live,
        }
    }
}

/// Interning store for user-defined test descriptors.
///
/// Defining the same name with the same function objects returns the
/// already-interned descriptor; redefining a name with different functions
/// replaces it.
pub struct TestRegistry<V> {
    tests: HashMap<String, Rc<CustomTest<V>>, ahash::RandomState>,
}

impl<V: Datum> TestRegistry<V> {
    /// Empty registry.
    pub fn new() -> Self {
        TestRegistry {
            tests: HashMap::default(),
        }
    }

    /// Define (or re-define) a named test.
    pub fn define(
        &mut self,
        name: &str,
        hash_fn: CustomHashFn<V>,
        equal_fn: CustomEqualFn<V>,
    ) -> HashTest<V> {
        if let Some(existing) = self.tests.get(name) {
            let same_fns = Rc::ptr_eq(&existing.hash_fn, &hash_fn)
                && Rc::ptr_eq(&existing.equal_fn, &equal_fn);
            if same_fns {
                return HashTest::Custom(existing.clone());
            }
        }
        let test = Rc::new(CustomTest {
            name: name.to_string(),
            hash_fn,
            equal_fn,
        });
        self.tests.insert(name.to_string(), test.clone());
        HashTest::Custom(test)
    }

    /// Look up a previously defined test.
    pub fn lookup(&self, name: &str) -> Option<HashTest<V>> {
        self.tests.get(name).map(|t| HashTest::Custom(t.clone()))
    }
}

impl<V: Datum> Default for TestRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_stays_in_range() {
        for bits in 1..=16u32 {
            let size = 1usize << bits;
            for hash in [0u64, 1, 42, u64::MAX, 0xDEAD_BEEF_CAFE_F00D] {
                assert!(knuth_bucket(hash, bits) < size);
            }
        }
    }

    #[test]
    fn reduce_folds_high_bits() {
        assert_ne!(reduce_hash(1 << 40), reduce_hash(0));
        assert_eq!(reduce_hash(7), 7);
    }

    #[test]
    fn builtin_from_name() {
        let registry = TestRegistry::<i64>::new();
        assert!(matches!(
            HashTest::from_name("eq", &registry).unwrap(),
            HashTest::Eq
        ));
        assert!(matches!(
            HashTest::from_name("eql", &registry).unwrap(),
            HashTest::Eql
        ));
        assert!(matches!(
            HashTest::from_name("equal", &registry).unwrap(),
            HashTest::Equal
        ));
        assert!(matches!(
            HashTest::from_name("bogus", &registry),
            Err(ValtabError::UnknownTest { .. })
        ));
    }

    #[test]
    fn registry_interns_by_identity() {
        let mut registry = TestRegistry::<i64>::new();
        let hash_fn: CustomHashFn<i64> = Rc::new(|v| Ok(*v as u64));
        let equal_fn: CustomEqualFn<i64> = Rc::new(|a, b| Ok(a == b));

        let first = registry.define("mine", hash_fn.clone(), equal_fn.clone());
        let second = registry.define("mine", hash_fn, equal_fn);
        match (&first, &second) {
            (HashTest::Custom(a), HashTest::Custom(b)) => assert!(Rc::ptr_eq(a, b)),
            _ => panic!("expected custom tests"),
        }

        // Different functions under the same name replace the descriptor.
        let third = registry.define("mine", Rc::new(|_| Ok(0)), Rc::new(|_, _| Ok(false)));
        match (&first, &third) {
            (HashTest::Custom(a), HashTest::Custom(b)) => assert!(!Rc::ptr_eq(a, b)),
            _ => panic!("expected custom tests"),
        }

        assert!(registry.lookup("mine").is_some());
        assert!(registry.lookup("other").is_none());
    }

    #[test]
    fn weakness_names_round_trip() {
        for w in [
            Weakness::None,
            Weakness::Key,
            Weakness::Value,
            Weakness::KeyOrValue,
            Weakness::KeyAndValue,
        ] {
            assert_eq!(Weakness::from_name(w.name()).unwrap(), w);
        }
        assert_eq!(Weakness::from_name("t").unwrap(), Weakness::KeyAndValue);
        assert!(matches!(
            Weakness::from_name("sometimes"),
            Err(ValtabError::UnknownWeakness { .. })
        ));
    }

    #[test]
    fn weakness_retention_matrix() {
        use Weakness::*;
        for (w, key, value, kept) in [
            (None, false, false, true),
            (Key, true, false, true),
            (Key, false, true, false),
            (Value, false, true, true),
            (Value, true, false, false),
            (KeyOrValue, false, false, false),
            (KeyOrValue, true, false, true),
            (KeyOrValue, false, true, true),
            (KeyAndValue, true, false, false),
            (KeyAndValue, true, true, true),
        ] {
            assert_eq!(w.keeps(key, value), kept, "{w:?} {key} {value}");
        }
    }

    #[test]
    fn custom_kind_is_coarse() {
        let mut registry = TestRegistry::<i64>::new();
        let test = registry.define("c", Rc::new(|v| Ok(*v as u64)), Rc::new(|a, b| Ok(a == b)));
        assert_eq!(test.kind(), TestKind::Equal);
        assert_eq!(test.name(), "c");
        assert_eq!(HashTest::<i64>::Eq.kind(), TestKind::Eq);
    }
}
