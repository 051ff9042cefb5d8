mod catalog;
mod players;
mod quests;
mod render;
mod social;
mod tournaments;

use playerhub_core::PlayerProgressionService;
use playerhub_database::{Database, MIGRATOR};
use tracing::info;

use crate::cli::Commands;

/// Shared state for one command invocation.
pub struct Context {
    pub db: Database,
    pub service: PlayerProgressionService<Database>,
}

impl Context {
    pub fn new(db: Database) -> Self {
        let service = PlayerProgressionService::new(db.clone());
        Self { db, service }
    }
}

pub async fn run(ctx: &Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => {
            MIGRATOR.run(ctx.db.pool()).await?;
            info!("Database migrations applied.");
            println!("Migrations are up to date.");
            Ok(())
        }
        Commands::SeedGames => catalog::seed_games(ctx).await,
        Commands::Register { username, email } => players::register(ctx, &username, &email).await,
        Commands::AddExperience { player_id, amount } => {
            players::add_experience(ctx, player_id, amount).await
        }
        Commands::AddPoints { player_id, amount } => {
            players::add_points(ctx, player_id, amount).await
        }
        Commands::GrantAchievement {
            player_id,
            achievement_id,
        } => players::grant_achievement(ctx, player_id, achievement_id).await,
        Commands::Quests { player_id } => quests::board(ctx, player_id).await,
        Commands::CompleteQuest {
            player_id,
            quest_id,
        } => quests::complete(ctx, player_id, quest_id).await,
        Commands::JoinTournament {
            tournament_id,
            player_id,
        } => tournaments::join(ctx, tournament_id, player_id).await,
        Commands::LeaveTournament {
            tournament_id,
            player_id,
        } => tournaments::leave(ctx, tournament_id, player_id).await,
        Commands::RecordResult {
            tournament_id,
            player_id,
            position,
            prize,
            score,
        } => tournaments::record_result(ctx, tournament_id, player_id, position, prize, score).await,
        Commands::Leaderboard { limit } => players::leaderboard(ctx, limit).await,
        Commands::Profile { username, recent } => players::profile(ctx, &username, recent).await,
        Commands::Search { query, limit } => players::search(ctx, query.as_deref(), limit).await,
        Commands::Stats => players::stats(ctx).await,
        Commands::Friend { command } => social::run(ctx, command).await,
        Commands::Game { command } => catalog::run_game(ctx, command).await,
        Commands::Tournament { command } => tournaments::run(ctx, command).await,
        Commands::Badge { command } => catalog::run_badge(ctx, command).await,
    }
}
