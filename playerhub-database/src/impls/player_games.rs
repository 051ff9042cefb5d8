use anyhow::Context as _;
use playerhub_core::{Entity, ProgressionError};

use crate::database::Database;
use crate::impls::now_i64;
use crate::model::game::PlayerGame;

/// Hours logged per in-game level step, in tenths.
const HOURS_TENTHS_PER_GAME_LEVEL: i64 = 100;

#[derive(sqlx::FromRow)]
struct PlayerGameRow {
    player_id: i64,
    game_id: i64,
    game_name: String,
    hours_tenths: i64,
    game_level: i64,
    game_points: i64,
    started_at: i64,
    last_played: i64,
}

impl PlayerGameRow {
    fn into_player_game(self) -> anyhow::Result<PlayerGame> {
        Ok(PlayerGame {
            player_id: self.player_id,
            game_id: self.game_id,
            game_name: self.game_name,
            hours_tenths: self.hours_tenths,
            game_level: self.game_level,
            game_points: self.game_points,
            started_at: u64::try_from(self.started_at).context("started_at row out of u64 range")?,
            last_played: u64::try_from(self.last_played)
                .context("last_played row out of u64 range")?,
        })
    }
}

const SELECT_PLAYER_GAME: &str = "SELECT pg.player_id, pg.game_id, g.name AS game_name, pg.hours_tenths,
        pg.game_level, pg.game_points, pg.started_at, pg.last_played
 FROM player_games pg
 JOIN games g ON g.id = pg.game_id";

/// Get or create the player's row for a game.
pub async fn start_game(db: &Database, player_id: i64, game_id: i64) -> anyhow::Result<PlayerGame> {
    let now = now_i64()?;

    let game_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM games WHERE id = $1)")
        .bind(game_id)
        .fetch_one(db.pool())
        .await?;
    if !game_exists {
        return Err(ProgressionError::InvalidInput(format!("game {game_id} does not exist")).into());
    }

    let player_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM players WHERE id = $1)")
            .bind(player_id)
            .fetch_one(db.pool())
            .await?;
    if !player_exists {
        return Err(ProgressionError::not_found(Entity::Player, player_id).into());
    }

    sqlx::query(
        "INSERT INTO player_games (player_id, game_id, started_at, last_played)
         VALUES ($1, $2, $3, $3)
         ON CONFLICT (player_id, game_id) DO NOTHING",
    )
    .bind(player_id)
    .bind(game_id)
    .bind(now)
    .execute(db.pool())
    .await?;

    get_player_game(db, player_id, game_id)
        .await?
        .context("player game row vanished after insert")
}

/// Add a play session. The in-game level follows total hours played.
pub async fn log_session(
    db: &Database,
    player_id: i64,
    game_id: i64,
    hours_tenths: i64,
    points: i64,
) -> anyhow::Result<PlayerGame> {
    if hours_tenths < 0 || points < 0 {
        return Err(ProgressionError::InvalidInput(
            "session hours and points must not be negative".to_owned(),
        )
        .into());
    }

    let updated = sqlx::query(
        "UPDATE player_games
         SET hours_tenths = hours_tenths + $1,
             game_points = game_points + $2,
             game_level = 1 + (hours_tenths + $1) / $3,
             last_played = $4
         WHERE player_id = $5 AND game_id = $6",
    )
    .bind(hours_tenths)
    .bind(points)
    .bind(HOURS_TENTHS_PER_GAME_LEVEL)
    .bind(now_i64()?)
    .bind(player_id)
    .bind(game_id)
    .execute(db.pool())
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(ProgressionError::InvalidInput(format!(
            "player {player_id} has not started game {game_id}"
        ))
        .into());
    }

    get_player_game(db, player_id, game_id)
        .await?
        .context("player game row vanished after update")
}

pub async fn get_player_game(
    db: &Database,
    player_id: i64,
    game_id: i64,
) -> anyhow::Result<Option<PlayerGame>> {
    let row: Option<PlayerGameRow> = sqlx::query_as(&format!(
        "{SELECT_PLAYER_GAME} WHERE pg.player_id = $1 AND pg.game_id = $2"
    ))
    .bind(player_id)
    .bind(game_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(PlayerGameRow::into_player_game).transpose()
}

/// A player's games, most recently played first.
pub async fn list_player_games(
    db: &Database,
    player_id: i64,
    limit: Option<u32>,
) -> anyhow::Result<Vec<PlayerGame>> {
    let rows: Vec<PlayerGameRow> = sqlx::query_as(&format!(
        "{SELECT_PLAYER_GAME} WHERE pg.player_id = $1 ORDER BY pg.last_played DESC, pg.game_id ASC LIMIT $2"
    ))
    .bind(player_id)
    .bind(limit.map(i64::from))
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(PlayerGameRow::into_player_game).collect()
}
