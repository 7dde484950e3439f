pub mod ordered_hash_map;

pub use ordered_hash_map::{OrderedHashMap, OrderedHashSet};
