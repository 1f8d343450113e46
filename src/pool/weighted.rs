//! Weighted selection over registry positions.
//!
//! A backend of weight `w` owns `w` consecutive slots; the set holds
//! `sum(w)` slots in total. Weight-0 backends own no slots.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    index: usize,
    weight: u32,
}

/// Registry indices with their selection weights.
#[derive(Debug, Clone, Default)]
pub struct WeightedSet {
    entries: Vec<Entry>,
    total: u64,
}

impl WeightedSet {
    /// Build from weights in registry order.
    pub fn new(weights: impl IntoIterator<Item = u32>) -> Self {
        let entries: Vec<Entry> = weights
            .into_iter()
            .enumerate()
            .filter(|(_, weight)| *weight > 0)
            .map(|(index, weight)| Entry { index, weight })
            .collect();
        let total = entries.iter().map(|e| u64::from(e.weight)).sum();
        Self { entries, total }
    }

    /// Sum of all weights, i.e. the number of slots.
    pub fn total_weight(&self) -> u64 {
        self.total
    }

    /// Weight of the backend at `index`; zero when it owns no slots.
    pub fn weight_of(&self, index: usize) -> u32 {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .map_or(0, |e| e.weight)
    }

    /// Whether the backend at `index` owns at least one slot.
    pub fn contains(&self, index: usize) -> bool {
        self.weight_of(index) > 0
    }

    /// Registry indices owning slots, in registry order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.index)
    }

    /// Owner of the slot at `offset`.
    pub fn slot(&self, offset: u64) -> Option<usize> {
        let mut remaining = offset;
        for entry in &self.entries {
            let weight = u64::from(entry.weight);
            if remaining < weight {
                return Some(entry.index);
            }
            remaining -= weight;
        }
        None
    }

    /// Every slot in order; a backend of weight `w` appears `w` times.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .flat_map(|e| std::iter::repeat(e.index).take(e.weight as usize))
    }

    /// Weighted random choice among the indices accepted by `eligible`.
    pub fn pick<R, F>(&self, rng: &mut R, eligible: F) -> Option<usize>
    where
        R: Rng + ?Sized,
        F: Fn(usize) -> bool,
    {
        let eligible_total: u64 = self
            .entries
            .iter()
            .filter(|e| eligible(e.index))
            .map(|e| u64::from(e.weight))
            .sum();
        if eligible_total == 0 {
            return None;
        }

        let mut offset = rng.gen_range(0..eligible_total);
        for entry in self.entries.iter().filter(|e| eligible(e.index)) {
            let weight = u64::from(entry.weight);
            if offset < weight {
                return Some(entry.index);
            }
            offset -= weight;
        }
        None
    }
}
