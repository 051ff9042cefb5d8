use playerhub_core::model::achievement::Achievement;
use playerhub_core::{Account, Player};
use serde::{Deserialize, Serialize};

use crate::model::badge::Badge;
use crate::model::game::PlayerGame;

/// One leaderboard row, ordered by level then experience.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: i64,
    pub username: String,
    pub level: i64,
    pub experience: i64,
    pub total_points: i64,
}

#[derive(Clone, Debug)]
pub struct PlayerProfile {
    pub account: Account,
    pub player: Player,
    pub games: Vec<PlayerGame>,
    pub achievements: Vec<Achievement>,
    pub badges: Vec<Badge>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HomeStats {
    pub total_games: i64,
    pub total_players: i64,
}
