use serde::{Deserialize, Serialize};

use crate::error::{AmountKind, ProgressionError, Result};
use crate::leveling;

/// A registered account. Owns exactly one [`Player`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: u64,
}

/// The progression-bearing profile of one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub account_id: i64,
    pub level: i64,
    pub experience: i64,
    pub total_points: i64,
    pub created_at: u64,
}

impl Player {
    /// Fresh profile for a newly created account.
    pub fn new(id: i64, account_id: i64, created_at: u64) -> Self {
        Self {
            id,
            account_id,
            level: 1,
            experience: 0,
            total_points: 0,
            created_at,
        }
    }

    pub fn exp_to_next_level(&self) -> i64 {
        leveling::exp_to_next_level(self.level)
    }

    pub fn exp_progress_percent(&self) -> i64 {
        leveling::progress_percent(self.level, self.experience)
    }

    /// Apply both halves of a reward. Returns levels gained.
    pub fn apply_reward(&mut self, reward: Reward) -> i64 {
        let before = self.level;
        (self.level, self.experience) =
            leveling::apply_experience(self.level, self.experience, reward.experience);
        self.total_points = self.total_points.saturating_add(reward.points);
        self.level - before
    }
}

/// Experience and points handed out together by one grant.
///
/// Construction rejects negative amounts, so every `Reward` in circulation
/// can only move a player forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub experience: i64,
    pub points: i64,
}

impl Reward {
    pub fn new(experience: i64, points: i64) -> Result<Self> {
        if experience < 0 {
            return Err(ProgressionError::InvalidAmount {
                kind: AmountKind::Experience,
                amount: experience,
            });
        }
        if points < 0 {
            return Err(ProgressionError::InvalidAmount {
                kind: AmountKind::Points,
                amount: points,
            });
        }
        Ok(Self { experience, points })
    }

    pub fn experience(amount: i64) -> Result<Self> {
        Self::new(amount, 0)
    }

    pub fn points(amount: i64) -> Result<Self> {
        Self::new(0, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::{Player, Reward};
    use crate::error::{AmountKind, ProgressionError};

    #[test]
    fn new_player_starts_at_level_one() {
        let player = Player::new(1, 10, 0);
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 0);
        assert_eq!(player.total_points, 0);
        assert_eq!(player.exp_to_next_level(), 100);
    }

    #[test]
    fn experience_reward_reports_levels_gained() {
        let mut player = Player::new(1, 10, 0);
        assert_eq!(player.apply_reward(Reward::experience(250).unwrap()), 1);
        assert_eq!((player.level, player.experience), (2, 150));
        assert_eq!(player.exp_progress_percent(), 75);
    }

    #[test]
    fn negative_experience_never_becomes_a_reward() {
        let err = Reward::experience(-50).unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::InvalidAmount {
                kind: AmountKind::Experience,
                amount: -50
            }
        ));
    }

    #[test]
    fn points_are_additive() {
        let mut split = Player::new(1, 10, 0);
        split.apply_reward(Reward::points(15).unwrap());
        split.apply_reward(Reward::points(27).unwrap());

        let mut single = Player::new(2, 11, 0);
        single.apply_reward(Reward::points(42).unwrap());

        assert_eq!(split.total_points, single.total_points);
        assert_eq!(split.level, 1);
    }

    #[test]
    fn apply_reward_touches_both_fields() {
        let mut player = Player::new(1, 10, 0);
        let gained = player.apply_reward(Reward::new(100, 50).unwrap());
        assert_eq!(gained, 1);
        assert_eq!(player.level, 2);
        assert_eq!(player.experience, 0);
        assert_eq!(player.total_points, 50);
    }

    #[test]
    fn reward_rejects_negative_points() {
        assert!(matches!(
            Reward::points(-1),
            Err(ProgressionError::InvalidAmount {
                kind: AmountKind::Points,
                ..
            })
        ));
    }
}
