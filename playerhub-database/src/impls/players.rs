use anyhow::Context as _;
use playerhub_core::{Account, Entity, Player, ProgressionError, Reward, RewardApplied};
use playerhub_utils::parse::escape_like;
use sqlx::PgConnection;

use crate::cache::{LEADERBOARD_SNAPSHOT_SIZE, invalidate_leaderboard, leaderboard_key};
use crate::database::Database;
use crate::impls::{achievements, badges, player_games};
use crate::model::player::{HomeStats, LeaderboardEntry, PlayerProfile};

const PLAYER_COLUMNS: &str = "id, account_id, level, experience, total_points, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PlayerRow {
    id: i64,
    account_id: i64,
    level: i64,
    experience: i64,
    total_points: i64,
    created_at: i64,
}

impl PlayerRow {
    pub(crate) fn into_player(self) -> anyhow::Result<Player> {
        Ok(Player {
            id: self.id,
            account_id: self.account_id,
            level: self.level,
            experience: self.experience,
            total_points: self.total_points,
            created_at: u64::try_from(self.created_at)
                .context("player created_at row out of u64 range")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    created_at: i64,
}

impl AccountRow {
    fn into_account(self) -> anyhow::Result<Account> {
        Ok(Account {
            id: self.id,
            username: self.username,
            email: self.email,
            created_at: u64::try_from(self.created_at)
                .context("account created_at row out of u64 range")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    player_id: i64,
    username: String,
    level: i64,
    experience: i64,
    total_points: i64,
}

impl LeaderboardRow {
    fn into_entry(self) -> LeaderboardEntry {
        LeaderboardEntry {
            player_id: self.player_id,
            username: self.username,
            level: self.level,
            experience: self.experience,
            total_points: self.total_points,
        }
    }
}

/// Create an account and its player profile in one transaction.
pub async fn create_account(
    db: &Database,
    username: &str,
    email: &str,
    now: u64,
) -> anyhow::Result<(Account, Player)> {
    let now_i64 = i64::try_from(now).context("now out of i64 range")?;

    let mut tx = db.pool().begin().await?;

    let account_row: Option<AccountRow> = sqlx::query_as(
        "INSERT INTO accounts (username, email, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT ((LOWER(username))) DO NOTHING
         RETURNING id, username, email, created_at",
    )
    .bind(username)
    .bind(email)
    .bind(now_i64)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(account_row) = account_row else {
        tx.rollback().await?;
        return Err(ProgressionError::UsernameTaken(username.to_owned()).into());
    };

    let player_row: PlayerRow = sqlx::query_as(&format!(
        "INSERT INTO players (account_id, created_at) VALUES ($1, $2) RETURNING {PLAYER_COLUMNS}"
    ))
    .bind(account_row.id)
    .bind(now_i64)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    invalidate_leaderboard(db.cache()).await;

    Ok((account_row.into_account()?, player_row.into_player()?))
}

pub async fn get_player(db: &Database, player_id: i64) -> anyhow::Result<Option<Player>> {
    let row: Option<PlayerRow> =
        sqlx::query_as(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"))
            .bind(player_id)
            .fetch_optional(db.pool())
            .await?;

    row.map(PlayerRow::into_player).transpose()
}

pub async fn get_account_by_username(
    db: &Database,
    username: &str,
) -> anyhow::Result<Option<(Account, Player)>> {
    let account: Option<AccountRow> = sqlx::query_as(
        "SELECT id, username, email, created_at FROM accounts WHERE LOWER(username) = LOWER($1)",
    )
    .bind(username)
    .fetch_optional(db.pool())
    .await?;

    let Some(account) = account else {
        return Ok(None);
    };

    let player: PlayerRow = sqlx::query_as(&format!(
        "SELECT {PLAYER_COLUMNS} FROM players WHERE account_id = $1"
    ))
    .bind(account.id)
    .fetch_one(db.pool())
    .await
    .with_context(|| format!("account {} has no player profile", account.id))?;

    Ok(Some((account.into_account()?, player.into_player()?)))
}

/// Lock a player row for the rest of the transaction.
pub(crate) async fn lock_player(conn: &mut PgConnection, player_id: i64) -> anyhow::Result<Player> {
    let row: Option<PlayerRow> = sqlx::query_as(&format!(
        "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1 FOR UPDATE"
    ))
    .bind(player_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => row.into_player(),
        None => Err(ProgressionError::not_found(Entity::Player, player_id).into()),
    }
}

pub(crate) async fn save_progress(conn: &mut PgConnection, player: &Player) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE players SET level = $1, experience = $2, total_points = $3 WHERE id = $4",
    )
    .bind(player.level)
    .bind(player.experience)
    .bind(player.total_points)
    .bind(player.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Lock, reward and save a player inside an open transaction.
pub(crate) async fn reward_locked(
    conn: &mut PgConnection,
    player_id: i64,
    reward: Reward,
) -> anyhow::Result<RewardApplied> {
    let mut player = lock_player(conn, player_id).await?;
    let levels_gained = player.apply_reward(reward);
    save_progress(conn, &player).await?;
    Ok(RewardApplied {
        player,
        levels_gained,
    })
}

pub async fn apply_reward(
    db: &Database,
    player_id: i64,
    reward: Reward,
) -> anyhow::Result<RewardApplied> {
    let mut tx = db.pool().begin().await?;
    let applied = reward_locked(&mut tx, player_id, reward).await?;
    tx.commit().await?;

    invalidate_leaderboard(db.cache()).await;
    Ok(applied)
}

async fn load_leaderboard_snapshot(db: &Database) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let rows: Vec<LeaderboardRow> = sqlx::query_as(
        "SELECT p.id AS player_id, a.username, p.level, p.experience, p.total_points
         FROM players p
         JOIN accounts a ON a.id = p.account_id
         ORDER BY p.level DESC, p.experience DESC, p.id ASC
         LIMIT $1",
    )
    .bind(i64::from(LEADERBOARD_SNAPSHOT_SIZE))
    .fetch_all(db.pool())
    .await?;

    Ok(rows.into_iter().map(LeaderboardRow::into_entry).collect())
}

/// Top players by level, then experience. Served from the cache when possible.
pub async fn leaderboard(db: &Database, limit: u32) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let limit = usize::try_from(limit.clamp(1, LEADERBOARD_SNAPSHOT_SIZE))
        .context("leaderboard limit out of usize range")?;
    let key = leaderboard_key(db.cache());

    let mut entries = db
        .cache()
        .get_or_load_json(&key, db.cache().leaderboard_ttl(), || {
            load_leaderboard_snapshot(db)
        })
        .await?;
    entries.truncate(limit);
    Ok(entries)
}

/// Case-insensitive username substring search. `None` lists everyone.
pub async fn search_players(
    db: &Database,
    term: Option<&str>,
    limit: u32,
) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let pattern = term.map(|term| format!("%{}%", escape_like(term)));
    let limit_i64 = i64::from(limit.clamp(1, 200));

    let rows: Vec<LeaderboardRow> = sqlx::query_as(
        "SELECT p.id AS player_id, a.username, p.level, p.experience, p.total_points
         FROM players p
         JOIN accounts a ON a.id = p.account_id
         WHERE ($1::TEXT IS NULL OR a.username ILIKE $1)
         ORDER BY p.level DESC, p.experience DESC, p.id ASC
         LIMIT $2",
    )
    .bind(pattern)
    .bind(limit_i64)
    .fetch_all(db.pool())
    .await?;

    Ok(rows.into_iter().map(LeaderboardRow::into_entry).collect())
}

pub async fn home_stats(db: &Database) -> anyhow::Result<HomeStats> {
    let (total_games, total_players): (i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM games), (SELECT COUNT(*) FROM players)",
    )
    .fetch_one(db.pool())
    .await?;

    Ok(HomeStats {
        total_games,
        total_players,
    })
}

/// Everything shown on a player's page. `recent` caps games and achievements.
pub async fn player_profile(
    db: &Database,
    username: &str,
    recent: Option<u32>,
) -> anyhow::Result<Option<PlayerProfile>> {
    let Some((account, player)) = get_account_by_username(db, username).await? else {
        return Ok(None);
    };

    let games = player_games::list_player_games(db, player.id, recent).await?;
    let achievements = achievements::list_player_achievements(db, player.id, recent).await?;
    let badges = badges::list_player_badges(db, player.id).await?;

    Ok(Some(PlayerProfile {
        account,
        player,
        games,
        achievements,
        badges,
    }))
}
