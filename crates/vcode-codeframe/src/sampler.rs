//! Representative subset selection for codeframe prompts.

use rand::seq::SliceRandom;
use rand::Rng;

/// Sample size for `total` responses: `max(floor, round(total * pct / 100))`,
/// capped at `total`.
#[must_use]
pub fn target_sample_size(total: usize, percentage: f64, minimum_floor: usize) -> usize {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let by_percentage = (total as f64 * percentage.max(0.0) / 100.0).round() as usize;
    by_percentage.max(minimum_floor).min(total)
}

/// Uniform random subset of `responses` without replacement.
///
/// When there are no more responses than `minimum_floor`, every response is
/// returned in its original order.
#[must_use]
pub fn sample(responses: &[String], percentage: f64, minimum_floor: usize) -> Vec<String> {
    let mut rng = rand::rng();
    sample_with(responses, percentage, minimum_floor, &mut rng)
}

/// [`sample`] with a caller-supplied random source (seed it for tests).
#[must_use]
pub fn sample_with<R: Rng + ?Sized>(
    responses: &[String],
    percentage: f64,
    minimum_floor: usize,
    rng: &mut R,
) -> Vec<String> {
    if responses.len() <= minimum_floor {
        return responses.to_vec();
    }

    let size = target_sample_size(responses.len(), percentage, minimum_floor);
    let mut pool = responses.to_vec();
    pool.shuffle(rng);
    pool.truncate(size);
    pool
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn responses(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("response {i}")).collect()
    }

    #[test]
    fn target_size_uses_percentage_above_floor() {
        assert_eq!(target_sample_size(1000, 30.0, 20), 300);
    }

    #[test]
    fn target_size_uses_floor_when_percentage_is_small() {
        assert_eq!(target_sample_size(50, 30.0, 20), 20);
    }

    #[test]
    fn target_size_is_capped_at_total() {
        assert_eq!(target_sample_size(10, 30.0, 20), 10);
        assert_eq!(target_sample_size(10, 250.0, 0), 10);
    }

    #[test]
    fn target_size_rounds_half_away_from_zero() {
        // 45 * 30% = 13.5
        assert_eq!(target_sample_size(45, 30.0, 0), 14);
    }

    #[test]
    fn empty_input_yields_empty_sample() {
        assert!(sample(&[], 30.0, 20).is_empty());
    }

    #[test]
    fn small_input_is_returned_whole() {
        let input = responses(15);
        assert_eq!(sample(&input, 30.0, 20), input);
    }

    #[test]
    fn sample_size_matches_bound_for_many_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [0_usize, 1, 19, 20, 21, 66, 100, 333] {
            for pct in [0.0, 10.0, 30.0, 75.0, 100.0] {
                for floor in [0_usize, 5, 20] {
                    let input = responses(n);
                    let got = sample_with(&input, pct, floor, &mut rng);
                    assert_eq!(
                        got.len(),
                        target_sample_size(n, pct, floor),
                        "n={n} pct={pct} floor={floor}"
                    );
                }
            }
        }
    }

    #[test]
    fn sample_draws_without_replacement_from_input() {
        let input = responses(200);
        let mut rng = StdRng::seed_from_u64(42);
        let got = sample_with(&input, 30.0, 20, &mut rng);
        let unique: HashSet<&String> = got.iter().collect();
        assert_eq!(unique.len(), got.len());
        assert!(got.iter().all(|s| input.contains(s)));
    }

    #[test]
    fn seeded_samples_are_reproducible() {
        let input = responses(100);
        let a = sample_with(&input, 30.0, 20, &mut StdRng::seed_from_u64(1));
        let b = sample_with(&input, 30.0, 20, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
