pub mod cache;
pub mod database;
pub mod impls;
pub mod model;
mod progression;

pub use cache::CacheService;
pub use database::{Database, MIGRATOR};
