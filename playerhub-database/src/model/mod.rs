pub mod badge;
pub mod friend;
pub mod game;
pub mod player;
pub mod review;
pub mod tournament;
