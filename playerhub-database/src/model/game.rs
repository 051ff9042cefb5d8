use chrono::NaiveDate;
use playerhub_core::model::achievement::Achievement;
use serde::{Deserialize, Serialize};

use crate::model::review::GameReview;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub genre: String,
    pub release_date: NaiveDate,
    pub rating: f64,
    pub created_at: u64,
}

#[derive(Clone, Debug)]
pub struct NewGame<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub genre: &'a str,
    /// ISO `YYYY-MM-DD`.
    pub release_date: &'a str,
    pub rating: f64,
}

/// A player's time and standing in one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGame {
    pub player_id: i64,
    pub game_id: i64,
    pub game_name: String,
    pub hours_tenths: i64,
    pub game_level: i64,
    pub game_points: i64,
    pub started_at: u64,
    pub last_played: u64,
}

#[derive(Clone, Debug)]
pub struct GameDetail {
    pub game: Game,
    pub achievements: Vec<Achievement>,
    pub players_count: i64,
    pub reviews: Vec<GameReview>,
    /// Progress of the viewing player, if they started the game.
    pub player_game: Option<PlayerGame>,
}
