//! Rank-weighted parent selection.

use super::genome::TimetableRng;

/// Cumulative weight ladder over a fitness-sorted population.
///
/// Rung `i` holds the sum of the weights of ranks `0..=i`. A draw `u` in
/// `[0, total)` selects the first rung whose cumulative weight is `>= u`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightLadder {
    rungs: Vec<f64>,
}

impl WeightLadder {
    /// Geometric weights `alpha * (1 - alpha)^rank` for `n` ranks.
    pub fn geometric(n: usize, alpha: f64) -> Self {
        let mut weight = alpha;
        Self::from_weights((0..n).map(|_| {
            let w = weight;
            weight *= 1.0 - alpha;
            w
        }))
    }

    /// Ladder over arbitrary non-negative weights, in rank order.
    pub fn from_weights(weights: impl IntoIterator<Item = f64>) -> Self {
        let mut total = 0.0;
        let rungs = weights
            .into_iter()
            .map(|w| {
                total += w.max(0.0);
                total
            })
            .collect();
        Self { rungs }
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.rungs.last().copied().unwrap_or(0.0)
    }

    /// Rank chosen by the draw `u`; the last rank when rounding skips
    /// every rung.
    ///
    /// # Panics
    ///
    /// Panics on an empty ladder.
    pub fn rank_for(&self, u: f64) -> usize {
        assert!(!self.rungs.is_empty(), "selection from an empty population");
        self.rungs
            .iter()
            .position(|&rung| rung >= u)
            .unwrap_or(self.rungs.len() - 1)
    }

    /// Draw one rank.
    pub fn select(&self, rng: &mut TimetableRng) -> usize {
        self.rank_for(rng.unit_scaled(self.total()))
    }
}
