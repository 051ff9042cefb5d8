use anyhow::Context as _;
use playerhub_core::{Entity, ProgressionError};

use crate::database::Database;
use crate::impls::now_i64;
use crate::model::review::{GameReview, ReviewDraft};

pub const MAX_TITLE_LEN: usize = 200;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    game_id: i64,
    player_id: i64,
    username: String,
    rating: i16,
    title: String,
    body: String,
    created_at: i64,
    updated_at: i64,
}

impl ReviewRow {
    fn into_review(self) -> anyhow::Result<GameReview> {
        Ok(GameReview {
            id: self.id,
            game_id: self.game_id,
            player_id: self.player_id,
            username: self.username,
            rating: self.rating,
            title: self.title,
            body: self.body,
            created_at: u64::try_from(self.created_at).context("review created_at out of u64 range")?,
            updated_at: u64::try_from(self.updated_at).context("review updated_at out of u64 range")?,
        })
    }
}

const SELECT_REVIEW: &str = "SELECT r.id, r.game_id, r.player_id, a.username, r.rating, r.title, r.body,
        r.created_at, r.updated_at
 FROM game_reviews r
 JOIN players p ON p.id = r.player_id
 JOIN accounts a ON a.id = p.account_id";

fn validate_draft(draft: &ReviewDraft<'_>) -> Result<(), ProgressionError> {
    if !(1..=5).contains(&draft.rating) {
        return Err(ProgressionError::InvalidInput(format!(
            "rating must be 1-5 (got {})",
            draft.rating
        )));
    }
    let title = draft.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(ProgressionError::InvalidInput(format!(
            "title must be 1-{MAX_TITLE_LEN} characters"
        )));
    }
    if draft.body.trim().is_empty() {
        return Err(ProgressionError::InvalidInput(
            "review text is required".to_owned(),
        ));
    }
    Ok(())
}

/// Create or replace the player's single review of a game.
pub async fn upsert_review(
    db: &Database,
    game_id: i64,
    player_id: i64,
    draft: ReviewDraft<'_>,
) -> anyhow::Result<GameReview> {
    validate_draft(&draft)?;
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

    let review_id: i64 = sqlx::query_scalar(
        "INSERT INTO game_reviews (game_id, player_id, rating, title, body, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)
         ON CONFLICT (game_id, player_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                title = EXCLUDED.title,
                body = EXCLUDED.body,
                updated_at = EXCLUDED.updated_at
         RETURNING id",
    )
    .bind(game_id)
    .bind(player_id)
    .bind(draft.rating)
    .bind(draft.title.trim())
    .bind(draft.body.trim())
    .bind(now)
    .fetch_one(db.pool())
    .await?;

    let row: ReviewRow = sqlx::query_as(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
        .bind(review_id)
        .fetch_one(db.pool())
        .await?;

    row.into_review()
}

pub async fn get_review(
    db: &Database,
    game_id: i64,
    player_id: i64,
) -> anyhow::Result<Option<GameReview>> {
    let row: Option<ReviewRow> = sqlx::query_as(&format!(
        "{SELECT_REVIEW} WHERE r.game_id = $1 AND r.player_id = $2"
    ))
    .bind(game_id)
    .bind(player_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(ReviewRow::into_review).transpose()
}

/// Reviews for a game, newest first.
pub async fn list_game_reviews(db: &Database, game_id: i64) -> anyhow::Result<Vec<GameReview>> {
    let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
        "{SELECT_REVIEW} WHERE r.game_id = $1 ORDER BY r.created_at DESC, r.id DESC"
    ))
    .bind(game_id)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(ReviewRow::into_review).collect()
}

#[cfg(test)]
mod tests {
    use super::validate_draft;
    use crate::model::review::ReviewDraft;

    fn draft(rating: i16, title: &'static str, body: &'static str) -> ReviewDraft<'static> {
        ReviewDraft { rating, title, body }
    }

    #[test]
    fn accepts_a_complete_review() {
        assert!(validate_draft(&draft(4, "Great", "Loved the story.")).is_ok());
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        assert!(validate_draft(&draft(0, "Meh", "text")).is_err());
        assert!(validate_draft(&draft(6, "Wow", "text")).is_err());
    }

    #[test]
    fn rejects_blank_title_or_body() {
        assert!(validate_draft(&draft(3, "   ", "text")).is_err());
        assert!(validate_draft(&draft(3, "Title", "")).is_err());
    }
}
