//! Dense integer id arrays shared across graph views.
//!
//! An [`IdArray`] is the unit of exchange between the storage layer and its
//! callers: a 1-D integer tensor behind an `Arc`, so every view of a graph
//! can alias the same buffer without copying. Arrays are read-only once
//! constructed; derived views are built by producing new arrays.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Storage width of the ids in an array.
///
/// The storage layer accepts both widths; the sampler path requires
/// [`BitWidth::W64`]. Narrow arrays are widened to `i64` internally and keep
/// the tag so downstream consumers can refuse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitWidth {
    /// 32-bit ids.
    W32,
    /// 64-bit ids.
    W64,
}

/// A shared, immutable 1-D array of vertex or edge ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdArray {
    data: Arc<Vec<i64>>,
    width: BitWidth,
}

impl IdArray {
    /// Wrap a vector of 64-bit ids.
    #[must_use]
    pub fn from_vec(data: Vec<i64>) -> Self {
        Self {
            data: Arc::new(data),
            width: BitWidth::W64,
        }
    }

    /// Wrap a vector of 32-bit ids, widening the storage but keeping the tag.
    #[must_use]
    pub fn from_i32(data: Vec<i32>) -> Self {
        Self {
            data: Arc::new(data.into_iter().map(i64::from).collect()),
            width: BitWidth::W32,
        }
    }

    /// An empty 64-bit array.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// The half-open range `start..stop` as an array.
    #[must_use]
    pub fn range(start: i64, stop: i64) -> Self {
        Self::from_vec((start..stop).collect())
    }

    /// `len` copies of `value`.
    #[must_use]
    pub fn full(value: i64, len: usize) -> Self {
        Self::from_vec(vec![value; len])
    }

    /// Rebuild with the same width as `self` (used by derived views).
    #[must_use]
    pub fn like(&self, data: Vec<i64>) -> Self {
        Self {
            data: Arc::new(data),
            width: self.width,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn width(&self) -> BitWidth {
        self.width
    }

    /// Element at `i`. Panics when out of bounds.
    #[must_use]
    pub fn get(&self, i: usize) -> i64 {
        self.data[i]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.data.iter().copied()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<i64> {
        self.data.as_ref().clone()
    }

    /// Gather `self[idx[0]], self[idx[1]], …`.
    ///
    /// Panics when an index is out of bounds; callers validate id ranges
    /// before indexing.
    #[must_use]
    pub fn index_select(&self, idx: &IdArray) -> IdArray {
        self.like(idx.iter().map(|i| self.data[i as usize]).collect())
    }

    /// Element-wise `self < bound`.
    #[must_use]
    pub fn lt(&self, bound: i64) -> Vec<bool> {
        self.data.iter().map(|&v| v < bound).collect()
    }

    /// Concatenate two arrays.
    #[must_use]
    pub fn hstack(a: &IdArray, b: &IdArray) -> IdArray {
        let mut out = Vec::with_capacity(a.len() + b.len());
        out.extend_from_slice(a.as_slice());
        out.extend_from_slice(b.as_slice());
        a.like(out)
    }

    /// Relabel the union of `arrays` onto a dense `0..k` id space.
    ///
    /// The new id of a value is its first-occurrence position across the
    /// concatenation of the inputs. Each input array is rewritten through the
    /// map (copy-on-write, so other holders of the same buffer are
    /// unaffected). Returns the mapping: an array whose position `i` holds
    /// the original id that was relabeled to `i`.
    pub fn relabel(arrays: &mut [IdArray]) -> IdArray {
        let mut map: HashMap<i64, i64> = HashMap::new();
        let mut uniques: Vec<i64> = Vec::new();
        for arr in arrays.iter() {
            for v in arr.iter() {
                map.entry(v).or_insert_with(|| {
                    uniques.push(v);
                    (uniques.len() - 1) as i64
                });
            }
        }
        for arr in arrays.iter_mut() {
            let data = Arc::make_mut(&mut arr.data);
            for v in data.iter_mut() {
                *v = map[v];
            }
        }
        IdArray::from_vec(uniques)
    }
}

impl From<Vec<i64>> for IdArray {
    fn from(v: Vec<i64>) -> Self {
        Self::from_vec(v)
    }
}

impl FromIterator<i64> for IdArray {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// A set of edges as parallel `(src, dst, eid)` arrays.
///
/// `eid` always holds the owning graph's canonical edge ids.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeArray {
    pub src: IdArray,
    pub dst: IdArray,
    pub eid: IdArray,
}

impl EdgeArray {
    #[must_use]
    pub fn len(&self) -> usize {
        self.eid.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.eid.is_empty()
    }
}
