use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReview {
    pub id: i64,
    pub game_id: i64,
    pub player_id: i64,
    pub username: String,
    pub rating: i16,
    pub title: String,
    pub body: String,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct ReviewDraft<'a> {
    pub rating: i16,
    pub title: &'a str,
    pub body: &'a str,
}
