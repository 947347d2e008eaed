use crate::core::models::compound::{BondLink, BondTable};
use crate::core::models::keys::{BondKey, CanonicalKey};
use std::collections::BTreeMap;

/// Maps every existing key to its canonical replacement `<prefix><i>`,
/// where `i` runs `1..=N` over the numeric sort order of the existing keys.
///
/// Pure and deterministic: identical inputs always yield identical outputs,
/// and a key set that is already dense maps to itself. For example:
///
/// ```text
/// renumber([a2, a3])  =>  { a2 -> a1, a3 -> a2 }
/// ```
pub fn renumber<K: CanonicalKey>(keys: impl IntoIterator<Item = K>) -> BTreeMap<K, K> {
    let mut sorted: Vec<K> = keys.into_iter().collect();
    sorted.sort_unstable();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, old)| (old, K::new(i as u32 + 1)))
        .collect()
}

/// Assigns canonical bond keys `b1..bM` to a set of bond links.
///
/// Bonds are ordered by their sorted pair of endpoint keys, with ties (for
/// parallel bonds of a multigraph) broken by the original bond key. The
/// ordering is therefore fully defined by the links themselves and never
/// depends on any storage iteration order.
pub fn number_bonds(links: impl IntoIterator<Item = (BondKey, BondLink)>) -> BondTable {
    let mut links: Vec<(BondKey, BondLink)> = links.into_iter().collect();
    links.sort_by(|(key_a, link_a), (key_b, link_b)| {
        link_a.endpoints.cmp(&link_b.endpoints).then(key_a.cmp(key_b))
    });
    links
        .into_iter()
        .enumerate()
        .map(|(i, (_, link))| (BondKey::new(i as u32 + 1), link))
        .collect()
}
