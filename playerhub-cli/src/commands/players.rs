use playerhub_core::GrantOutcome;
use playerhub_database::impls::players;
use playerhub_utils::formatting::format_hours;
use playerhub_utils::parse::normalize_search;
use playerhub_utils::time::format_unix_date;

use crate::commands::Context;
use crate::commands::render::{levels_note, player_line};

pub async fn register(ctx: &Context, username: &str, email: &str) -> anyhow::Result<()> {
    let (account, player) = ctx.service.register_player(username, email).await?;
    println!(
        "Registered {} (account {}, player {}).",
        account.username, account.id, player.id
    );
    println!("{}", player_line(&player));
    Ok(())
}

pub async fn add_experience(ctx: &Context, player_id: i64, amount: i64) -> anyhow::Result<()> {
    let applied = ctx.service.add_experience(player_id, amount).await?;
    println!(
        "Added {amount} XP to player {player_id}{}.",
        levels_note(applied.levels_gained)
    );
    println!("{}", player_line(&applied.player));
    Ok(())
}

pub async fn add_points(ctx: &Context, player_id: i64, amount: i64) -> anyhow::Result<()> {
    let player = ctx.service.add_points(player_id, amount).await?;
    println!("Added {amount} points to player {player_id}.");
    println!("{}", player_line(&player));
    Ok(())
}

pub async fn grant_achievement(
    ctx: &Context,
    player_id: i64,
    achievement_id: i64,
) -> anyhow::Result<()> {
    match ctx.service.grant_achievement(player_id, achievement_id).await? {
        GrantOutcome::Granted {
            player,
            levels_gained,
        } => {
            println!(
                "Achievement {achievement_id} granted to player {player_id}{}.",
                levels_note(levels_gained)
            );
            println!("{}", player_line(&player));
        }
        GrantOutcome::AlreadyCredited { player } => {
            println!("Player {player_id} already has achievement {achievement_id}; nothing changed.");
            println!("{}", player_line(&player));
        }
    }
    Ok(())
}

pub async fn leaderboard(ctx: &Context, limit: u32) -> anyhow::Result<()> {
    let entries = players::leaderboard(&ctx.db, limit).await?;
    if entries.is_empty() {
        println!("No players yet.");
        return Ok(());
    }

    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:<20} Lv. {:<3} {:>5} XP {:>7} pts",
            rank + 1,
            entry.username,
            entry.level,
            entry.experience,
            entry.total_points
        );
    }
    Ok(())
}

pub async fn profile(ctx: &Context, username: &str, recent: Option<u32>) -> anyhow::Result<()> {
    let Some(profile) = players::player_profile(&ctx.db, username, recent).await? else {
        println!("No player named `{username}`.");
        return Ok(());
    };

    println!(
        "{} (player {}), joined {}",
        profile.account.username,
        profile.player.id,
        format_unix_date(profile.account.created_at)
    );
    println!("{}", player_line(&profile.player));

    if !profile.games.is_empty() {
        println!("\nGames:");
        for game in &profile.games {
            println!(
                "  {:<32} {:>6} h  Lv. {:<3} {} pts  last played {}",
                game.game_name,
                format_hours(game.hours_tenths),
                game.game_level,
                game.game_points,
                format_unix_date(game.last_played)
            );
        }
    }

    if !profile.achievements.is_empty() {
        println!("\nAchievements:");
        for achievement in &profile.achievements {
            println!(
                "  {} [{}] +{} pts",
                achievement.name,
                achievement.difficulty.as_str(),
                achievement.points
            );
        }
    }

    if !profile.badges.is_empty() {
        println!("\nBadges:");
        for badge in &profile.badges {
            println!("  {}: {}", badge.name, badge.description);
        }
    }
    Ok(())
}

pub async fn search(ctx: &Context, query: Option<&str>, limit: u32) -> anyhow::Result<()> {
    let term = query.and_then(normalize_search);
    let entries = players::search_players(&ctx.db, term.as_deref(), limit).await?;
    if entries.is_empty() {
        println!("No matching players.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{:>6}  {:<20} Lv. {:<3} {:>7} pts",
            entry.player_id, entry.username, entry.level, entry.total_points
        );
    }
    Ok(())
}

pub async fn stats(ctx: &Context) -> anyhow::Result<()> {
    let stats = players::home_stats(&ctx.db).await?;
    println!("Games:   {}", stats.total_games);
    println!("Players: {}", stats.total_players);
    Ok(())
}
