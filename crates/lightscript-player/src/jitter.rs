//! Channel jitter

use rand::Rng;

/// Randomly perturb `base` by up to half of `variance` either way, clamped
/// to `0..=upper`
///
/// A zero variance returns `base` untouched, even when it lies outside the
/// bounds. The offset is drawn from `0..variance` and shifted down by
/// `variance / 2`, so odd variances lean slightly upwards.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, base: i64, upper: i64, variance: i64) -> i64 {
    if variance == 0 {
        return base;
    }

    let variance = variance.saturating_abs();
    let offset = rng.gen_range(0..variance);
    let candidate = base.saturating_add(offset).saturating_sub(variance / 2);

    candidate.max(0).min(upper)
}
