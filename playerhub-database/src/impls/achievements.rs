use anyhow::Context as _;
use playerhub_core::GrantOutcome;
use playerhub_core::model::achievement::{Achievement, Difficulty};

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::impls::players::{lock_player, save_progress};
use crate::impls::now_i64;

const ACHIEVEMENT_COLUMNS: &str =
    "id, game_id, name, description, difficulty, points, experience_reward";

#[derive(sqlx::FromRow)]
struct AchievementRow {
    id: i64,
    game_id: i64,
    name: String,
    description: String,
    difficulty: String,
    points: i64,
    experience_reward: i64,
}

impl AchievementRow {
    fn into_achievement(self) -> anyhow::Result<Achievement> {
        let difficulty = self
            .difficulty
            .parse::<Difficulty>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("achievement {} has a bad difficulty", self.id))?;

        Ok(Achievement {
            id: self.id,
            game_id: self.game_id,
            name: self.name,
            description: self.description,
            difficulty,
            points: self.points,
            experience_reward: self.experience_reward,
        })
    }
}

pub struct NewAchievement<'a> {
    pub game_id: i64,
    pub name: &'a str,
    pub description: &'a str,
    pub difficulty: Difficulty,
    pub points: i64,
    pub experience_reward: i64,
}

pub async fn create_achievement(
    db: &Database,
    new_achievement: NewAchievement<'_>,
) -> anyhow::Result<Achievement> {
    let row: AchievementRow = sqlx::query_as(&format!(
        "INSERT INTO achievements (game_id, name, description, difficulty, points, experience_reward, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {ACHIEVEMENT_COLUMNS}"
    ))
    .bind(new_achievement.game_id)
    .bind(new_achievement.name)
    .bind(new_achievement.description)
    .bind(new_achievement.difficulty.as_str())
    .bind(new_achievement.points)
    .bind(new_achievement.experience_reward)
    .bind(now_i64()?)
    .fetch_one(db.pool())
    .await?;

    row.into_achievement()
}

pub async fn get_achievement(
    db: &Database,
    achievement_id: i64,
) -> anyhow::Result<Option<Achievement>> {
    let row: Option<AchievementRow> = sqlx::query_as(&format!(
        "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = $1"
    ))
    .bind(achievement_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(AchievementRow::into_achievement).transpose()
}

pub async fn list_game_achievements(
    db: &Database,
    game_id: i64,
) -> anyhow::Result<Vec<Achievement>> {
    let rows: Vec<AchievementRow> = sqlx::query_as(&format!(
        "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE game_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(game_id)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(AchievementRow::into_achievement).collect()
}

/// Achievements credited to a player, most recent first.
pub async fn list_player_achievements(
    db: &Database,
    player_id: i64,
    limit: Option<u32>,
) -> anyhow::Result<Vec<Achievement>> {
    let limit_i64 = limit.map(i64::from);

    let rows: Vec<AchievementRow> = sqlx::query_as(
        "SELECT a.id, a.game_id, a.name, a.description, a.difficulty, a.points, a.experience_reward
         FROM achievement_credits c
         JOIN achievements a ON a.id = c.achievement_id
         WHERE c.player_id = $1
         ORDER BY c.credited_at DESC, a.id DESC
         LIMIT $2",
    )
    .bind(player_id)
    .bind(limit_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(AchievementRow::into_achievement).collect()
}

/// Insert the (player, achievement) credit and apply the reward in the same
/// transaction. An existing credit leaves the player untouched.
pub async fn credit_achievement(
    db: &Database,
    player_id: i64,
    achievement: &Achievement,
    now: u64,
) -> anyhow::Result<GrantOutcome> {
    let now_i64 = i64::try_from(now).context("now out of i64 range")?;

    let mut tx = db.pool().begin().await?;

    let mut player = lock_player(&mut tx, player_id).await?;

    let inserted: Option<i64> = sqlx::query_scalar(
        "INSERT INTO achievement_credits (player_id, achievement_id, credited_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (player_id, achievement_id) DO NOTHING
         RETURNING achievement_id",
    )
    .bind(player_id)
    .bind(achievement.id)
    .bind(now_i64)
    .fetch_optional(&mut *tx)
    .await?;

    if inserted.is_none() {
        tx.rollback().await?;
        return Ok(GrantOutcome::AlreadyCredited { player });
    }

    let levels_gained = player.apply_reward(achievement.reward());
    save_progress(&mut tx, &player).await?;

    tx.commit().await?;

    invalidate_leaderboard(db.cache()).await;

    Ok(GrantOutcome::Granted {
        player,
        levels_gained,
    })
}
