//! Level threshold and experience accrual rules.

/// Experience needed per level step; the threshold for level `n` is `n * EXP_PER_LEVEL`.
pub const EXP_PER_LEVEL: i64 = 100;

/// Experience required to advance from `level` to the next one.
pub fn exp_to_next_level(level: i64) -> i64 {
    level.saturating_mul(EXP_PER_LEVEL)
}

/// Resulting `(level, experience)` after adding `amount` experience.
///
/// The threshold grows with each level, so leftover experience is consumed
/// one level at a time rather than by a single division.
pub fn apply_experience(level: i64, experience: i64, amount: i64) -> (i64, i64) {
    let mut level = level.max(1);
    let mut experience = experience.saturating_add(amount).max(0);

    loop {
        let threshold = exp_to_next_level(level);
        if threshold <= 0 || experience < threshold {
            break;
        }
        experience -= threshold;
        level += 1;
    }

    (level, experience)
}

/// Whole percent of progress towards the next level, `0..=99`.
pub fn progress_percent(level: i64, experience: i64) -> i64 {
    let threshold = exp_to_next_level(level);
    if threshold <= 0 {
        return 0;
    }

    experience.rem_euclid(threshold) * 100 / threshold
}

#[cfg(test)]
mod tests {
    use super::{apply_experience, exp_to_next_level, progress_percent};

    #[test]
    fn threshold_scales_with_level() {
        assert_eq!(exp_to_next_level(1), 100);
        assert_eq!(exp_to_next_level(7), 700);
    }

    #[test]
    fn small_grant_stays_on_level() {
        assert_eq!(apply_experience(1, 0, 99), (1, 99));
        assert_eq!(apply_experience(3, 10, 0), (3, 10));
    }

    #[test]
    fn exact_threshold_levels_up_with_nothing_left() {
        assert_eq!(apply_experience(1, 0, 100), (2, 0));
        assert_eq!(apply_experience(2, 150, 50), (3, 0));
    }

    #[test]
    fn multi_level_jump_uses_growing_thresholds() {
        assert_eq!(apply_experience(1, 0, 250), (2, 150));
        // 100 + 200 + 300 consumed, 50 left at level 4
        assert_eq!(apply_experience(1, 0, 650), (4, 50));
    }

    #[test]
    fn invariant_holds_for_a_range_of_grants() {
        let mut level = 1;
        let mut experience = 0;
        for amount in [0, 1, 37, 99, 100, 101, 499, 1_000, 12_345, 250_000] {
            (level, experience) = apply_experience(level, experience, amount);
            assert!(level >= 1);
            assert!(experience >= 0);
            assert!(experience < exp_to_next_level(level));
        }
    }

    #[test]
    fn progress_percent_floors() {
        assert_eq!(progress_percent(1, 0), 0);
        assert_eq!(progress_percent(1, 50), 50);
        assert_eq!(progress_percent(3, 299), 99);
        assert_eq!(progress_percent(3, 100), 33);
    }

    #[test]
    fn progress_percent_wraps_out_of_range_experience() {
        assert_eq!(progress_percent(1, 150), 50);
        assert_eq!(progress_percent(0, 10), 0);
    }
}
