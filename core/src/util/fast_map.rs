//! Fx-hashed maps. Every per-object table in the VM is keyed by a symbol or a
//! small integer, where the default SipHash is wasted work.

use crate::value::Sym;

pub type FastHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Method tables, constants, instance variables and globals.
pub type SymMap<V> = FastHashMap<Sym, V>;

#[inline]
pub fn sym_map<V>() -> SymMap<V> {
    SymMap::default()
}

#[inline]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, Default::default())
}
