use playerhub_core::{Entity, ProgressionError};
use tracing::info;

use crate::database::Database;
use crate::impls::now_i64;
use crate::model::badge::Badge;

#[derive(sqlx::FromRow)]
struct BadgeRow {
    id: i64,
    name: String,
    description: String,
    requirement: String,
}

impl BadgeRow {
    fn into_badge(self) -> Badge {
        Badge {
            id: self.id,
            name: self.name,
            description: self.description,
            requirement: self.requirement,
        }
    }
}

/// Create a badge, or return the existing one with the same name.
pub async fn get_or_create_badge(
    db: &Database,
    name: &str,
    description: &str,
    requirement: &str,
) -> anyhow::Result<Badge> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProgressionError::InvalidInput("badge name is required".to_owned()).into());
    }

    let row: BadgeRow = sqlx::query_as(
        "WITH inserted AS (
            INSERT INTO badges (name, description, requirement)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, description, requirement
         )
         SELECT id, name, description, requirement FROM inserted
         UNION ALL
         SELECT id, name, description, requirement FROM badges WHERE name = $1
         LIMIT 1",
    )
    .bind(name)
    .bind(description)
    .bind(requirement)
    .fetch_one(db.pool())
    .await?;

    Ok(row.into_badge())
}

/// Award a badge once. Returns `false` if the player already had it.
pub async fn award_badge(db: &Database, player_id: i64, badge_id: i64) -> anyhow::Result<bool> {
    let player_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM players WHERE id = $1)")
            .bind(player_id)
            .fetch_one(db.pool())
            .await?;
    if !player_exists {
        return Err(ProgressionError::not_found(Entity::Player, player_id).into());
    }

    let badge_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM badges WHERE id = $1)")
            .bind(badge_id)
            .fetch_one(db.pool())
            .await?;
    if !badge_exists {
        return Err(ProgressionError::InvalidInput(format!("badge {badge_id} does not exist")).into());
    }

    let inserted = sqlx::query(
        "INSERT INTO badge_awards (player_id, badge_id, awarded_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (player_id, badge_id) DO NOTHING",
    )
    .bind(player_id)
    .bind(badge_id)
    .bind(now_i64()?)
    .execute(db.pool())
    .await?
    .rows_affected();

    if inserted > 0 {
        info!(player_id, badge_id, "badge awarded");
    }
    Ok(inserted > 0)
}

pub async fn list_player_badges(db: &Database, player_id: i64) -> anyhow::Result<Vec<Badge>> {
    let rows: Vec<BadgeRow> = sqlx::query_as(
        "SELECT b.id, b.name, b.description, b.requirement
         FROM badge_awards ba
         JOIN badges b ON b.id = ba.badge_id
         WHERE ba.player_id = $1
         ORDER BY ba.awarded_at ASC, b.id ASC",
    )
    .bind(player_id)
    .fetch_all(db.pool())
    .await?;

    Ok(rows.into_iter().map(BadgeRow::into_badge).collect())
}
