//! Weighted roulette selection shared by every generation stage.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Pick an index with probability proportional to its weight.
///
/// Returns `None` when the slice is empty or no weight is positive, so
/// callers can treat "nothing eligible" as an ordinary outcome. Exactly one
/// value is drawn from `rng` when a choice is made.
pub fn weighted_choice(weights: &[f64], rng: &mut impl Rng) -> Option<usize> {
    if !weights.iter().any(|w| w.is_finite() && *w > 0.0) {
        return None;
    }
    let sanitized: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let dist = WeightedIndex::new(&sanitized).ok()?;
    Some(dist.sample(rng))
}
