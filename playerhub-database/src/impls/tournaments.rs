use anyhow::Context as _;
use playerhub_core::model::tournament::{
    Membership, ResultRecord, Tournament, TournamentResult, TournamentStatus, admit, release,
};
use playerhub_core::{Entity, ProgressionError};
use sqlx::PgConnection;

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::impls::now_i64;
use crate::impls::players::{lock_player, reward_locked};
use crate::model::tournament::{Placement, TournamentDetail, TournamentSummary};

const TOURNAMENT_COLUMNS: &str =
    "id, game_id, name, description, prize_pool, status, start_date, end_date, max_participants";

#[derive(sqlx::FromRow)]
struct TournamentRow {
    id: i64,
    game_id: i64,
    name: String,
    description: String,
    prize_pool: i64,
    status: String,
    start_date: i64,
    end_date: i64,
    max_participants: i64,
}

impl TournamentRow {
    fn into_tournament(self) -> anyhow::Result<Tournament> {
        Ok(Tournament {
            id: self.id,
            game_id: self.game_id,
            name: self.name,
            description: self.description,
            prize_pool: self.prize_pool,
            status: self
                .status
                .parse::<TournamentStatus>()
                .map_err(anyhow::Error::msg)?,
            start_date: u64::try_from(self.start_date).context("start_date row out of u64 range")?,
            end_date: u64::try_from(self.end_date).context("end_date row out of u64 range")?,
            max_participants: self.max_participants,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    tournament: TournamentRow,
    participants_count: i64,
}

#[derive(sqlx::FromRow)]
struct PlacementRow {
    player_id: i64,
    username: String,
    position: i64,
    prize: i64,
    score: i64,
}

pub struct NewTournament<'a> {
    pub game_id: i64,
    pub name: &'a str,
    pub description: &'a str,
    pub prize_pool: i64,
    pub start_date: u64,
    pub end_date: u64,
    pub max_participants: i64,
}

pub async fn create_tournament(
    db: &Database,
    new_tournament: NewTournament<'_>,
) -> anyhow::Result<Tournament> {
    if new_tournament.max_participants < 1 {
        return Err(ProgressionError::InvalidInput(
            "max participants must be at least 1".to_owned(),
        )
        .into());
    }
    if new_tournament.end_date < new_tournament.start_date {
        return Err(ProgressionError::InvalidInput(
            "tournament cannot end before it starts".to_owned(),
        )
        .into());
    }

    let start_i64 = i64::try_from(new_tournament.start_date).context("start_date out of i64 range")?;
    let end_i64 = i64::try_from(new_tournament.end_date).context("end_date out of i64 range")?;

    let row: TournamentRow = sqlx::query_as(&format!(
        "INSERT INTO tournaments (game_id, name, description, prize_pool, start_date, end_date, max_participants, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {TOURNAMENT_COLUMNS}"
    ))
    .bind(new_tournament.game_id)
    .bind(new_tournament.name)
    .bind(new_tournament.description)
    .bind(new_tournament.prize_pool)
    .bind(start_i64)
    .bind(end_i64)
    .bind(new_tournament.max_participants)
    .bind(now_i64()?)
    .fetch_one(db.pool())
    .await?;

    row.into_tournament()
}

pub async fn set_tournament_status(
    db: &Database,
    tournament_id: i64,
    status: TournamentStatus,
) -> anyhow::Result<bool> {
    let updated = sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(tournament_id)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(updated > 0)
}

pub async fn get_tournament(
    db: &Database,
    tournament_id: i64,
) -> anyhow::Result<Option<Tournament>> {
    let row: Option<TournamentRow> = sqlx::query_as(&format!(
        "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
    ))
    .bind(tournament_id)
    .fetch_optional(db.pool())
    .await?;

    row.map(TournamentRow::into_tournament).transpose()
}

/// All tournaments, latest start first.
pub async fn list_tournaments(db: &Database) -> anyhow::Result<Vec<TournamentSummary>> {
    let rows: Vec<SummaryRow> = sqlx::query_as(
        "SELECT t.id, t.game_id, t.name, t.description, t.prize_pool, t.status,
                t.start_date, t.end_date, t.max_participants,
                (SELECT COUNT(*) FROM tournament_participants tp WHERE tp.tournament_id = t.id)
                    AS participants_count
         FROM tournaments t
         ORDER BY t.start_date DESC, t.id DESC",
    )
    .fetch_all(db.pool())
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(TournamentSummary {
            tournament: row.tournament.into_tournament()?,
            participants_count: row.participants_count,
        });
    }
    Ok(out)
}

pub async fn tournament_detail(
    db: &Database,
    tournament_id: i64,
    viewer: Option<i64>,
) -> anyhow::Result<Option<TournamentDetail>> {
    let Some(tournament) = get_tournament(db, tournament_id).await? else {
        return Ok(None);
    };

    let participants_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tournament_participants WHERE tournament_id = $1",
    )
    .bind(tournament_id)
    .fetch_one(db.pool())
    .await?;

    let is_participant = match viewer {
        Some(player_id) => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM tournament_participants WHERE tournament_id = $1 AND player_id = $2
                 )",
            )
            .bind(tournament_id)
            .bind(player_id)
            .fetch_one(db.pool())
            .await?
        }
        None => false,
    };

    let rows: Vec<PlacementRow> = sqlx::query_as(
        "SELECT r.player_id, a.username, r.position, r.prize, r.score
         FROM tournament_results r
         JOIN players p ON p.id = r.player_id
         JOIN accounts a ON a.id = p.account_id
         WHERE r.tournament_id = $1
         ORDER BY r.position ASC, a.username ASC",
    )
    .bind(tournament_id)
    .fetch_all(db.pool())
    .await?;

    let results = rows
        .into_iter()
        .map(|row| Placement {
            player_id: row.player_id,
            username: row.username,
            position: row.position,
            prize: row.prize,
            score: row.score,
        })
        .collect();

    Ok(Some(TournamentDetail {
        tournament,
        participants_count,
        results,
        is_participant,
    }))
}

/// Lock the tournament row and read its roster state for `player_id`.
async fn lock_roster(
    conn: &mut PgConnection,
    tournament_id: i64,
    player_id: i64,
) -> anyhow::Result<(Tournament, i64, bool)> {
    let row: Option<TournamentRow> = sqlx::query_as(&format!(
        "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
    ))
    .bind(tournament_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Err(ProgressionError::not_found(Entity::Tournament, tournament_id).into());
    };
    let tournament = row.into_tournament()?;

    let player_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM players WHERE id = $1)")
            .bind(player_id)
            .fetch_one(&mut *conn)
            .await?;
    if !player_exists {
        return Err(ProgressionError::not_found(Entity::Player, player_id).into());
    }

    let (participants, is_member): (i64, bool) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(BOOL_OR(player_id = $2), FALSE)
         FROM tournament_participants
         WHERE tournament_id = $1",
    )
    .bind(tournament_id)
    .bind(player_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok((tournament, participants, is_member))
}

pub async fn join_tournament(
    db: &Database,
    tournament_id: i64,
    player_id: i64,
) -> anyhow::Result<Membership> {
    let mut tx = db.pool().begin().await?;

    let (tournament, participants, is_member) =
        match lock_roster(&mut tx, tournament_id, player_id).await {
            Ok(state) => state,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };

    let outcome = match admit(&tournament, participants, is_member) {
        Ok(outcome) => outcome,
        Err(e) => {
            tx.rollback().await?;
            return Err(e.into());
        }
    };

    if outcome.changed() {
        sqlx::query(
            "INSERT INTO tournament_participants (tournament_id, player_id, joined_at)
             VALUES ($1, $2, $3)",
        )
        .bind(tournament_id)
        .bind(player_id)
        .bind(now_i64()?)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(outcome)
}

pub async fn leave_tournament(
    db: &Database,
    tournament_id: i64,
    player_id: i64,
) -> anyhow::Result<Membership> {
    let mut tx = db.pool().begin().await?;

    let (_, participants, is_member) = match lock_roster(&mut tx, tournament_id, player_id).await {
        Ok(state) => state,
        Err(e) => {
            tx.rollback().await?;
            return Err(e);
        }
    };

    let outcome = release(participants, is_member);
    if outcome.changed() {
        sqlx::query(
            "DELETE FROM tournament_participants WHERE tournament_id = $1 AND player_id = $2",
        )
        .bind(tournament_id)
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(outcome)
}

/// Upsert a placement. The reward is paid only when the row is new.
pub async fn record_tournament_result(
    db: &Database,
    result: TournamentResult,
) -> anyhow::Result<ResultRecord> {
    let mut tx = db.pool().begin().await?;

    let tournament_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tournaments WHERE id = $1)")
            .bind(result.tournament_id)
            .fetch_one(&mut *tx)
            .await?;
    if !tournament_exists {
        tx.rollback().await?;
        return Err(ProgressionError::not_found(Entity::Tournament, result.tournament_id).into());
    }

    let player = lock_player(&mut tx, result.player_id).await?;

    // xmax is zero only for freshly inserted rows
    let inserted: bool = sqlx::query_scalar(
        "INSERT INTO tournament_results (tournament_id, player_id, position, prize, score)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (tournament_id, player_id) DO UPDATE
            SET position = EXCLUDED.position, prize = EXCLUDED.prize, score = EXCLUDED.score
         RETURNING (xmax = 0)",
    )
    .bind(result.tournament_id)
    .bind(result.player_id)
    .bind(result.position)
    .bind(result.prize)
    .bind(result.score)
    .fetch_one(&mut *tx)
    .await?;

    if !inserted {
        tx.commit().await?;
        return Ok(ResultRecord::Updated { result, player });
    }

    let applied = reward_locked(&mut tx, result.player_id, result.reward()).await?;

    tx.commit().await?;

    invalidate_leaderboard(db.cache()).await;

    Ok(ResultRecord::Rewarded {
        result,
        player: applied.player,
        levels_gained: applied.levels_gained,
    })
}
