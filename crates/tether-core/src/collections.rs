//! Hook lookup tables keyed by field name.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::HashMap;

    pub type FieldMap<V> = HashMap<String, V>;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::HashMap;

    pub type FieldMap<V> = HashMap<String, V, ahash::RandomState>;
}

pub use map::FieldMap;

/// Keys of `map` in lexical order, so diagnostics do not depend on hasher seeds.
pub(crate) fn sorted_keys<V>(map: &FieldMap<V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}
