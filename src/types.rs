//! Utility types.

use crate::grammar::SymbolID;

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;

/// A dense set of interned symbols, backed by a bit set.
///
/// Used for per-item lookahead sets where cheap equality and union are what
/// matters; iteration yields symbols in ascending intern order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SymbolIDSet {
    inner: bit_set::BitSet,
}

impl SymbolIDSet {
    pub fn contains(&self, id: SymbolID) -> bool {
        self.inner.contains(id.into_raw().into())
    }

    pub fn insert(&mut self, id: SymbolID) -> bool {
        self.inner.insert(id.into_raw().into())
    }

    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| raw.try_into().ok().map(SymbolID::from_raw))
    }
}

impl FromIterator<SymbolID> for SymbolIDSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = SymbolID>,
    {
        Self {
            inner: iter.into_iter().map(|s| s.into_raw().into()).collect(),
        }
    }
}
