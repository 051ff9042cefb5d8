pub mod achievement;
pub mod friend;
pub mod player;
pub mod quest;
pub mod tournament;
