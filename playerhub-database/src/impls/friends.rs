use anyhow::Context as _;
use playerhub_core::model::friend::{FriendDecision, FriendRequest, FriendStatus};
use playerhub_core::{Entity, ProgressionError};

use crate::database::Database;
use crate::model::friend::IncomingRequest;

#[derive(sqlx::FromRow)]
struct FriendRequestRow {
    id: i64,
    from_player: i64,
    to_player: i64,
    status: String,
    created_at: i64,
}

impl FriendRequestRow {
    fn into_request(self) -> anyhow::Result<FriendRequest> {
        Ok(FriendRequest {
            id: self.id,
            from_player: self.from_player,
            to_player: self.to_player,
            status: self
                .status
                .parse::<FriendStatus>()
                .map_err(anyhow::Error::msg)?,
            created_at: u64::try_from(self.created_at)
                .context("friend request created_at row out of u64 range")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct IncomingRow {
    #[sqlx(flatten)]
    request: FriendRequestRow,
    from_username: String,
}

/// Get or create the request between two players.
pub async fn send_friend_request(
    db: &Database,
    from_player: i64,
    to_player: i64,
    now: u64,
) -> anyhow::Result<FriendRequest> {
    let now_i64 = i64::try_from(now).context("now out of i64 range")?;

    let mut tx = db.pool().begin().await?;

    let known: Vec<i64> = sqlx::query_scalar("SELECT id FROM players WHERE id = ANY($1)")
        .bind(vec![from_player, to_player])
        .fetch_all(&mut *tx)
        .await?;
    for player_id in [from_player, to_player] {
        if !known.contains(&player_id) {
            tx.rollback().await?;
            return Err(ProgressionError::not_found(Entity::Player, player_id).into());
        }
    }

    sqlx::query(
        "INSERT INTO friend_requests (from_player, to_player, status, created_at)
         VALUES ($1, $2, 'pending', $3)
         ON CONFLICT (from_player, to_player) DO NOTHING",
    )
    .bind(from_player)
    .bind(to_player)
    .bind(now_i64)
    .execute(&mut *tx)
    .await?;

    let row: FriendRequestRow = sqlx::query_as(
        "SELECT id, from_player, to_player, status, created_at
         FROM friend_requests
         WHERE from_player = $1 AND to_player = $2",
    )
    .bind(from_player)
    .bind(to_player)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    row.into_request()
}

/// Apply a decision to a request addressed to `acting_player`.
pub async fn resolve_friend_request(
    db: &Database,
    request_id: i64,
    acting_player: i64,
    decision: FriendDecision,
) -> anyhow::Result<FriendRequest> {
    let mut tx = db.pool().begin().await?;

    let row: Option<FriendRequestRow> = sqlx::query_as(
        "SELECT id, from_player, to_player, status, created_at
         FROM friend_requests
         WHERE id = $1 AND to_player = $2
         FOR UPDATE",
    )
    .bind(request_id)
    .bind(acting_player)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Err(ProgressionError::not_found(Entity::FriendRequest, request_id).into());
    };

    let mut request = row.into_request()?;
    if let Err(e) = request.resolve(decision) {
        tx.rollback().await?;
        return Err(e.into());
    }

    sqlx::query("UPDATE friend_requests SET status = $1 WHERE id = $2")
        .bind(request.status.as_str())
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(request)
}

/// Pending requests waiting on `player_id`, oldest first.
pub async fn pending_requests(
    db: &Database,
    player_id: i64,
) -> anyhow::Result<Vec<IncomingRequest>> {
    let rows: Vec<IncomingRow> = sqlx::query_as(
        "SELECT fr.id, fr.from_player, fr.to_player, fr.status, fr.created_at,
                a.username AS from_username
         FROM friend_requests fr
         JOIN players p ON p.id = fr.from_player
         JOIN accounts a ON a.id = p.account_id
         WHERE fr.to_player = $1 AND fr.status = 'pending'
         ORDER BY fr.created_at ASC, fr.id ASC",
    )
    .bind(player_id)
    .fetch_all(db.pool())
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(IncomingRequest {
            request: row.request.into_request()?,
            from_username: row.from_username,
        });
    }
    Ok(out)
}

/// Players on either side of an accepted request.
pub async fn list_friends(db: &Database, player_id: i64) -> anyhow::Result<Vec<(i64, String)>> {
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT DISTINCT p.id, a.username
         FROM friend_requests fr
         JOIN players p ON p.id = CASE WHEN fr.from_player = $1 THEN fr.to_player ELSE fr.from_player END
         JOIN accounts a ON a.id = p.account_id
         WHERE (fr.from_player = $1 OR fr.to_player = $1) AND fr.status = 'accepted'
         ORDER BY a.username ASC",
    )
    .bind(player_id)
    .fetch_all(db.pool())
    .await?;

    Ok(rows)
}
