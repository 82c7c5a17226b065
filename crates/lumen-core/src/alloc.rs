//! Hash collections used throughout Lumen.
//!
//! Asset tables are keyed by 64-bit ids and short strings, where AHash
//! outperforms SipHash by a wide margin.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
