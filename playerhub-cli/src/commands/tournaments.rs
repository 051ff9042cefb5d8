use anyhow::bail;
use playerhub_core::model::tournament::{Membership, MembershipAction, ResultRecord};
use playerhub_database::impls::tournaments::{self, NewTournament};
use playerhub_utils::formatting::format_ordinal;
use playerhub_utils::time::{format_unix_date, unix_from_iso_date};

use crate::cli::TournamentCommands;
use crate::commands::Context;
use crate::commands::render::{levels_note, player_line};

pub async fn join(ctx: &Context, tournament_id: i64, player_id: i64) -> anyhow::Result<()> {
    let membership = ctx
        .service
        .tournament_membership(tournament_id, player_id, MembershipAction::Join)
        .await?;
    report_membership(tournament_id, player_id, membership);
    Ok(())
}

pub async fn leave(ctx: &Context, tournament_id: i64, player_id: i64) -> anyhow::Result<()> {
    let membership = ctx
        .service
        .tournament_membership(tournament_id, player_id, MembershipAction::Leave)
        .await?;
    report_membership(tournament_id, player_id, membership);
    Ok(())
}

fn report_membership(tournament_id: i64, player_id: i64, membership: Membership) {
    let message = match membership {
        Membership::Joined { .. } => format!("Player {player_id} joined tournament {tournament_id}"),
        Membership::AlreadyMember { .. } => {
            format!("Player {player_id} is already in tournament {tournament_id}")
        }
        Membership::Left { .. } => format!("Player {player_id} left tournament {tournament_id}"),
        Membership::NotMember { .. } => {
            format!("Player {player_id} was not in tournament {tournament_id}")
        }
    };
    println!("{message} ({} participants).", membership.participants());
}

pub async fn record_result(
    ctx: &Context,
    tournament_id: i64,
    player_id: i64,
    position: i64,
    prize: i64,
    score: i64,
) -> anyhow::Result<()> {
    let record = ctx
        .service
        .record_tournament_result(tournament_id, player_id, position, prize, score)
        .await?;

    match &record {
        ResultRecord::Rewarded {
            result,
            levels_gained,
            ..
        } => println!(
            "Player {player_id} placed {} in tournament {tournament_id}: +{} XP +{} pts{}.",
            format_ordinal(result.position),
            result.score,
            result.prize,
            levels_note(*levels_gained)
        ),
        ResultRecord::Updated { result, .. } => println!(
            "Updated placement to {}; the reward was already granted.",
            format_ordinal(result.position)
        ),
    }
    println!("{}", player_line(record.player()));
    Ok(())
}

pub async fn run(ctx: &Context, command: TournamentCommands) -> anyhow::Result<()> {
    match command {
        TournamentCommands::List => {
            let summaries = tournaments::list_tournaments(&ctx.db).await?;
            if summaries.is_empty() {
                println!("No tournaments.");
            }
            for summary in summaries {
                let tournament = &summary.tournament;
                println!(
                    "{:>5}  {:<32} {:<9} {} to {}  {}/{} players  prize pool {}",
                    tournament.id,
                    tournament.name,
                    tournament.status.as_str(),
                    format_unix_date(tournament.start_date),
                    format_unix_date(tournament.end_date),
                    summary.participants_count,
                    tournament.max_participants,
                    tournament.prize_pool
                );
            }
        }
        TournamentCommands::Show {
            tournament_id,
            player,
        } => {
            let Some(detail) = tournaments::tournament_detail(&ctx.db, tournament_id, player).await?
            else {
                println!("No tournament with id {tournament_id}.");
                return Ok(());
            };

            let tournament = &detail.tournament;
            println!("{} [{}]", tournament.name, tournament.status.as_str());
            if !tournament.description.is_empty() {
                println!("{}", tournament.description);
            }
            println!(
                "{} to {}, {}/{} players, prize pool {}",
                format_unix_date(tournament.start_date),
                format_unix_date(tournament.end_date),
                detail.participants_count,
                tournament.max_participants,
                tournament.prize_pool
            );
            if player.is_some() {
                let joined = if detail.is_participant { "joined" } else { "not joined" };
                println!("Viewer: {joined}");
            }
            for placement in &detail.results {
                println!(
                    "  {:>5}  {:<20} score {:<6} prize {}",
                    format_ordinal(placement.position),
                    placement.username,
                    placement.score,
                    placement.prize
                );
            }
        }
        TournamentCommands::Create {
            game_id,
            name,
            starts,
            ends,
            description,
            prize_pool,
            max_participants,
        } => {
            let Some(start_date) = unix_from_iso_date(&starts) else {
                bail!("start date `{starts}` is not YYYY-MM-DD");
            };
            let Some(end_date) = unix_from_iso_date(&ends) else {
                bail!("end date `{ends}` is not YYYY-MM-DD");
            };

            let tournament = tournaments::create_tournament(
                &ctx.db,
                NewTournament {
                    game_id,
                    name: &name,
                    description: &description,
                    prize_pool,
                    start_date,
                    end_date,
                    max_participants,
                },
            )
            .await?;
            println!("Created tournament {} ({}).", tournament.id, tournament.name);
        }
        TournamentCommands::SetStatus {
            tournament_id,
            status,
        } => {
            if tournaments::set_tournament_status(&ctx.db, tournament_id, status).await? {
                println!("Tournament {tournament_id} is now {}.", status.as_str());
            } else {
                println!("No tournament with id {tournament_id}.");
            }
        }
    }
    Ok(())
}
