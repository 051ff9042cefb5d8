pub mod achievements;
pub mod badges;
pub mod friends;
pub mod games;
pub mod player_games;
pub mod players;
pub mod quests;
pub mod reviews;
pub mod tournaments;

use anyhow::Context as _;
use playerhub_utils::time::now_unix_secs;

/// Current unix time as the BIGINT the schema stores.
pub(crate) fn now_i64() -> anyhow::Result<i64> {
    i64::try_from(now_unix_secs()).context("now out of i64 range")
}
