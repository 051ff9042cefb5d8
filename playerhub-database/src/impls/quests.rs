use anyhow::Context as _;
use playerhub_core::model::quest::{DailyQuest, QuestCompletion, QuestProgress};
use playerhub_core::{Entity, ProgressionError};

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::impls::now_i64;
use crate::impls::players::{lock_player, save_progress};

const QUEST_COLUMNS: &str =
    "id, game_id, title, description, reward_points, reward_experience, is_active";

#[derive(sqlx::FromRow)]
struct QuestRow {
    id: i64,
    game_id: i64,
    title: String,
    description: String,
    reward_points: i64,
    reward_experience: i64,
    is_active: bool,
}

impl QuestRow {
    fn into_quest(self) -> DailyQuest {
        DailyQuest {
            id: self.id,
            game_id: self.game_id,
            title: self.title,
            description: self.description,
            reward_points: self.reward_points,
            reward_experience: self.reward_experience,
            is_active: self.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    player_id: i64,
    quest_id: i64,
    completed: bool,
    completed_at: Option<i64>,
    progress: i64,
}

impl ProgressRow {
    fn into_progress(self) -> anyhow::Result<QuestProgress> {
        Ok(QuestProgress {
            player_id: self.player_id,
            quest_id: self.quest_id,
            completed: self.completed,
            completed_at: self
                .completed_at
                .map(u64::try_from)
                .transpose()
                .context("completed_at row out of u64 range")?,
            progress: self.progress,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BoardRow {
    #[sqlx(flatten)]
    quest: QuestRow,
    completed: bool,
    completed_at: Option<i64>,
    progress: i64,
}

pub struct NewQuest<'a> {
    pub game_id: i64,
    pub title: &'a str,
    pub description: &'a str,
    pub reward_points: i64,
    pub reward_experience: i64,
}

pub async fn create_quest(db: &Database, new_quest: NewQuest<'_>) -> anyhow::Result<DailyQuest> {
    let row: QuestRow = sqlx::query_as(&format!(
        "INSERT INTO daily_quests (game_id, title, description, reward_points, reward_experience, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {QUEST_COLUMNS}"
    ))
    .bind(new_quest.game_id)
    .bind(new_quest.title)
    .bind(new_quest.description)
    .bind(new_quest.reward_points)
    .bind(new_quest.reward_experience)
    .bind(now_i64()?)
    .fetch_one(db.pool())
    .await?;

    Ok(row.into_quest())
}

pub async fn set_quest_active(db: &Database, quest_id: i64, is_active: bool) -> anyhow::Result<bool> {
    let updated = sqlx::query("UPDATE daily_quests SET is_active = $1 WHERE id = $2")
        .bind(is_active)
        .bind(quest_id)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(updated > 0)
}

pub async fn get_quest(db: &Database, quest_id: i64) -> anyhow::Result<Option<DailyQuest>> {
    let row: Option<QuestRow> = sqlx::query_as(&format!(
        "SELECT {QUEST_COLUMNS} FROM daily_quests WHERE id = $1"
    ))
    .bind(quest_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(row.map(QuestRow::into_quest))
}

/// Active quests with the player's progress; missing progress rows are created.
pub async fn quest_board(
    db: &Database,
    player_id: i64,
) -> anyhow::Result<Vec<(DailyQuest, QuestProgress)>> {
    let mut tx = db.pool().begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM players WHERE id = $1")
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        tx.rollback().await?;
        return Err(ProgressionError::not_found(Entity::Player, player_id).into());
    }

    sqlx::query(
        "INSERT INTO quest_progress (player_id, quest_id)
         SELECT $1, id FROM daily_quests WHERE is_active
         ON CONFLICT (player_id, quest_id) DO NOTHING",
    )
    .bind(player_id)
    .execute(&mut *tx)
    .await?;

    let rows: Vec<BoardRow> = sqlx::query_as(
        "SELECT q.id, q.game_id, q.title, q.description, q.reward_points, q.reward_experience,
                q.is_active, qp.completed, qp.completed_at, qp.progress
         FROM daily_quests q
         JOIN quest_progress qp ON qp.quest_id = q.id AND qp.player_id = $1
         WHERE q.is_active
         ORDER BY q.id ASC",
    )
    .bind(player_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let mut board = Vec::with_capacity(rows.len());
    for row in rows {
        let progress = ProgressRow {
            player_id,
            quest_id: row.quest.id,
            completed: row.completed,
            completed_at: row.completed_at,
            progress: row.progress,
        }
        .into_progress()?;
        board.push((row.quest.into_quest(), progress));
    }

    Ok(board)
}

/// Mark a quest finished and pay its reward under the player's row lock.
pub async fn complete_quest(
    db: &Database,
    player_id: i64,
    quest: &DailyQuest,
    now: u64,
) -> anyhow::Result<QuestCompletion> {
    let now_i64 = i64::try_from(now).context("now out of i64 range")?;

    let mut tx = db.pool().begin().await?;

    let mut player = lock_player(&mut tx, player_id).await?;

    let row: Option<ProgressRow> = sqlx::query_as(
        "SELECT player_id, quest_id, completed, completed_at, progress
         FROM quest_progress
         WHERE player_id = $1 AND quest_id = $2
         FOR UPDATE",
    )
    .bind(player_id)
    .bind(quest.id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Err(ProgressionError::not_found(Entity::QuestProgress, quest.id).into());
    };

    let mut progress = row.into_progress()?;
    if !progress.complete(now) {
        tx.rollback().await?;
        return Ok(QuestCompletion::AlreadyCompleted { progress, player });
    }

    sqlx::query(
        "UPDATE quest_progress
         SET completed = TRUE, progress = $1, completed_at = $2
         WHERE player_id = $3 AND quest_id = $4",
    )
    .bind(progress.progress)
    .bind(now_i64)
    .bind(player_id)
    .bind(quest.id)
    .execute(&mut *tx)
    .await?;

    let levels_gained = player.apply_reward(quest.reward());
    save_progress(&mut tx, &player).await?;

    tx.commit().await?;

    invalidate_leaderboard(db.cache()).await;

    Ok(QuestCompletion::Completed {
        progress,
        player,
        levels_gained,
    })
}
