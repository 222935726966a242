//! Derives the displayable image list from raw channel blocks and maintains
//! the shuffled playback order.
//!
//! [`filter_unique_images`] is the pure dedup/filter stage: it is recomputed
//! from scratch on every raw-collection change, keeps first occurrences, and
//! preserves relative order. [`PlaybackList`] holds the shuffled order used
//! during playback: shuffled once on entry, and only ever extended afterwards
//! so no visible item disappears mid-playback.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use super::model::Block;

/// Reduces the accumulated raw block sequence to unique, image-bearing
/// blocks in stable order (first occurrence wins). Deterministic and
/// idempotent.
pub fn filter_unique_images(raw: &[Block]) -> Vec<Block> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|block| block.image.is_some())
        .filter(|block| seen.insert(block.id))
        .cloned()
        .collect()
}

/// The ordered sequence of image blocks the slideshow cycles through.
///
/// `absorbed` counts how many entries of the filtered list have been folded
/// into the shuffled order; the filtered list only grows (append-only raw
/// collection, first-occurrence dedup), so the slice beyond `absorbed` is
/// exactly the new arrivals.
#[derive(Clone, Debug, Default)]
pub struct PlaybackList {
    items: Vec<Block>,
    absorbed: usize,
}

impl PlaybackList {
    /// Builds the initial playback order: a uniformly shuffled copy of the
    /// filtered list.
    pub fn shuffled_from(filtered: &[Block], rng: &mut impl Rng) -> Self {
        let mut items = filtered.to_vec();
        items.shuffle(rng);
        Self {
            absorbed: filtered.len(),
            items,
        }
    }

    /// Folds newly arrived filtered items into the playback order: the new
    /// slice is shuffled independently and appended. The already-playing
    /// prefix is never reordered.
    pub fn absorb(&mut self, filtered: &[Block], rng: &mut impl Rng) {
        if filtered.len() <= self.absorbed {
            return;
        }
        let mut fresh = filtered[self.absorbed..].to_vec();
        fresh.shuffle(rng);
        self.items.extend(fresh);
        self.absorbed = filtered.len();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of filtered entries already folded into this order.
    pub fn absorbed(&self) -> usize {
        self.absorbed
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.items.get(index)
    }
}
