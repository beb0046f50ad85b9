//! Shared test fixtures: a Lisp-flavored datum with genuinely distinct
//! identity, numeric, and structural equivalences, plus a mark-set stand-in
//! for the collector's liveness view.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use valtab::{Datum, GcOracle};

/// A miniature runtime value: immediates compare by value, boxed values by
/// pointer under identity and by content under structural equality.
#[derive(Clone, Debug)]
pub enum Lobj {
    Int(i64),
    Sym(Rc<str>),
    Str(Rc<String>),
    Pair(Rc<(Lobj, Lobj)>),
}

pub fn int(n: i64) -> Lobj {
    Lobj::Int(n)
}

pub fn sym(name: &str) -> Lobj {
    Lobj::Sym(Rc::from(name))
}

pub fn string(text: &str) -> Lobj {
    Lobj::Str(Rc::new(text.to_string()))
}

pub fn pair(car: Lobj, cdr: Lobj) -> Lobj {
    Lobj::Pair(Rc::new((car, cdr)))
}

fn thin_ptr<T: ?Sized>(ptr: *const T) -> usize {
    ptr.cast::<u8>() as usize
}

impl Datum for Lobj {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Lobj::Int(a), Lobj::Int(b)) => a == b,
            (Lobj::Sym(a), Lobj::Sym(b)) => Rc::ptr_eq(a, b),
            (Lobj::Str(a), Lobj::Str(b)) => Rc::ptr_eq(a, b),
            (Lobj::Pair(a), Lobj::Pair(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn equal(&self, other: &Self) -> bool {
        match (self, other) {
            (Lobj::Int(a), Lobj::Int(b)) => a == b,
            (Lobj::Sym(a), Lobj::Sym(b)) => a == b,
            (Lobj::Str(a), Lobj::Str(b)) => a == b,
            (Lobj::Pair(a), Lobj::Pair(b)) => a.0.equal(&b.0) && a.1.equal(&b.1),
            _ => false,
        }
    }

    fn hash_identity(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            Lobj::Int(n) => {
                0u8.hash(&mut hasher);
                n.hash(&mut hasher);
            }
            Lobj::Sym(s) => {
                1u8.hash(&mut hasher);
                thin_ptr(Rc::as_ptr(s)).hash(&mut hasher);
            }
            Lobj::Str(s) => {
                2u8.hash(&mut hasher);
                thin_ptr(Rc::as_ptr(s)).hash(&mut hasher);
            }
            Lobj::Pair(p) => {
                3u8.hash(&mut hasher);
                thin_ptr(Rc::as_ptr(p)).hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    fn hash_equal(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_structural(self, &mut hasher);
        hasher.finish()
    }
}

fn hash_structural(value: &Lobj, hasher: &mut DefaultHasher) {
    match value {
        Lobj::Int(n) => {
            0u8.hash(hasher);
            n.hash(hasher);
        }
        Lobj::Sym(s) => {
            1u8.hash(hasher);
            s.hash(hasher);
        }
        Lobj::Str(s) => {
            2u8.hash(hasher);
            s.hash(hasher);
        }
        Lobj::Pair(p) => {
            3u8.hash(hasher);
            hash_structural(&p.0, hasher);
            hash_structural(&p.1, hasher);
        }
    }
}

/// Liveness by identity, the way a collector sees handles: admit values that
/// are "reachable elsewhere", let the sweep mark the rest.
#[derive(Default)]
pub struct MarkSet {
    live: HashSet<u64>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a value reachable from outside the table under test.
    pub fn admit(&mut self, value: &Lobj) {
        self.live.insert(value.hash_identity());
    }
}

impl GcOracle<Lobj> for MarkSet {
    fn is_live(&self, value: &Lobj) -> bool {
        self.live.contains(&value.hash_identity())
    }

    fn mark(&mut self, value: &Lobj) {
        self.live.insert(value.hash_identity());
    }
}
