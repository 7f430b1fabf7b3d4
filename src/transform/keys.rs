use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

pub type SurrogateKey = i64;

/// Business key -> surrogate key lookup for one dimension.
///
/// Keys are handed out as `1..=n` in ascending business-key order, so the same
/// set of business keys always maps to the same surrogate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap<K> {
    keys: BTreeMap<K, SurrogateKey>,
}

impl<K> Default for KeyMap<K> {
    fn default() -> Self {
        KeyMap {
            keys: BTreeMap::new(),
        }
    }
}

impl<K: Ord> KeyMap<K> {
    pub fn assign<I>(business_keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let distinct: BTreeSet<K> = business_keys.into_iter().collect();
        let keys = distinct
            .into_iter()
            .zip(1..)
            .collect::<BTreeMap<K, SurrogateKey>>();
        KeyMap { keys }
    }

    /// Rebuilds a map from rows already stored in the warehouse.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, SurrogateKey)>,
    {
        KeyMap {
            keys: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, business_key: &K) -> Option<SurrogateKey> {
        self.keys.get(business_key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, SurrogateKey)> {
        self.keys.iter().map(|(k, v)| (k, *v))
    }
}

/// Output of a dimension transform: the rows to load plus the key map the
/// fact transform needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension<M, K> {
    pub rows: Vec<M>,
    pub keys: KeyMap<K>,
}

/// The four lookups the rental fact transform resolves against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionKeys {
    pub dates: KeyMap<NaiveDate>,
    pub films: KeyMap<i64>,
    pub stores: KeyMap<i64>,
    pub customers: KeyMap<i64>,
}
