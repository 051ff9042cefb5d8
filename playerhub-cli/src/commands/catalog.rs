use anyhow::bail;
use playerhub_database::impls::achievements::{self, NewAchievement};
use playerhub_database::impls::quests::{self, NewQuest};
use playerhub_database::impls::{badges, games, player_games, reviews};
use playerhub_database::model::game::NewGame;
use playerhub_database::model::review::ReviewDraft;
use playerhub_utils::formatting::{format_hours, rating_stars};
use playerhub_utils::parse::{parse_hours_tenths, parse_review_rating};
use tracing::info;

use crate::cli::{BadgeCommands, GameCommands};
use crate::commands::Context;

pub async fn seed_games(ctx: &Context) -> anyhow::Result<()> {
    let (created, existing) = games::seed_catalog(&ctx.db).await?;
    info!(created, existing, "catalog seeded");
    println!("Added {created} games ({existing} already present).");
    Ok(())
}

pub async fn run_game(ctx: &Context, command: GameCommands) -> anyhow::Result<()> {
    match command {
        GameCommands::List { genre, limit } => {
            let games = games::list_games(&ctx.db, genre.as_deref(), limit).await?;
            if games.is_empty() {
                println!("No games found.");
            }
            for game in games {
                println!(
                    "{:>5}  {:<36} {:<12} {}  {:.1}",
                    game.id, game.name, game.genre, game.release_date, game.rating
                );
            }
        }
        GameCommands::Genres => {
            for genre in games::list_genres(&ctx.db).await? {
                println!("{genre}");
            }
        }
        GameCommands::Show { game_id, player } => {
            let Some(detail) = games::game_detail(&ctx.db, game_id, player).await? else {
                println!("No game with id {game_id}.");
                return Ok(());
            };

            let game = &detail.game;
            println!(
                "{} ({}, released {}, rated {:.1})",
                game.name, game.genre, game.release_date, game.rating
            );
            if !game.description.is_empty() {
                println!("{}", game.description);
            }
            println!("{} players", detail.players_count);

            if let Some(progress) = &detail.player_game {
                println!(
                    "You: {} h, game level {}, {} pts",
                    format_hours(progress.hours_tenths),
                    progress.game_level,
                    progress.game_points
                );
            }

            if let Some(player_id) = player
                && let Some(review) = reviews::get_review(&ctx.db, game_id, player_id).await?
            {
                println!("Your review: {} {}", rating_stars(review.rating), review.title);
            }

            if !detail.achievements.is_empty() {
                println!("\nAchievements:");
                for achievement in &detail.achievements {
                    println!(
                        "  {:>5}  {} [{}] +{} pts +{} XP",
                        achievement.id,
                        achievement.name,
                        achievement.difficulty.as_str(),
                        achievement.points,
                        achievement.experience_reward
                    );
                }
            }

            if !detail.reviews.is_empty() {
                println!("\nReviews:");
                for review in &detail.reviews {
                    println!(
                        "  {} {} by {}",
                        rating_stars(review.rating),
                        review.title,
                        review.username
                    );
                }
            }
        }
        GameCommands::Add {
            name,
            genre,
            released,
            description,
            rating,
        } => {
            let new_game = NewGame {
                name: &name,
                description: &description,
                genre: &genre,
                release_date: &released,
                rating,
            };
            let (game, created) = games::get_or_create_game(&ctx.db, &new_game).await?;
            if created {
                println!("Added game {} ({}).", game.id, game.name);
            } else {
                println!("Game {} already exists as {}.", game.name, game.id);
            }
        }
        GameCommands::AddAchievement {
            game_id,
            name,
            description,
            difficulty,
            points,
            experience,
        } => {
            let achievement = achievements::create_achievement(
                &ctx.db,
                NewAchievement {
                    game_id,
                    name: &name,
                    description: &description,
                    difficulty,
                    points,
                    experience_reward: experience,
                },
            )
            .await?;
            println!("Created achievement {} ({}).", achievement.id, achievement.name);
        }
        GameCommands::AddQuest {
            game_id,
            title,
            description,
            points,
            experience,
        } => {
            let quest = quests::create_quest(
                &ctx.db,
                NewQuest {
                    game_id,
                    title: &title,
                    description: &description,
                    reward_points: points,
                    reward_experience: experience,
                },
            )
            .await?;
            println!("Created quest {} ({}).", quest.id, quest.title);
        }
        GameCommands::SetQuestActive { quest_id, active } => {
            if quests::set_quest_active(&ctx.db, quest_id, active).await? {
                let state = if active { "active" } else { "inactive" };
                println!("Quest {quest_id} is now {state}.");
            } else {
                println!("No quest with id {quest_id}.");
            }
        }
        GameCommands::Play { player_id, game_id } => {
            let progress = player_games::start_game(&ctx.db, player_id, game_id).await?;
            println!(
                "Player {player_id} is tracking {} ({} h so far).",
                progress.game_name,
                format_hours(progress.hours_tenths)
            );
        }
        GameCommands::LogSession {
            player_id,
            game_id,
            hours,
            points,
        } => {
            let Some(hours_tenths) = parse_hours_tenths(&hours) else {
                bail!("hours `{hours}` must be a number with at most one decimal");
            };
            let progress =
                player_games::log_session(&ctx.db, player_id, game_id, hours_tenths, points)
                    .await?;
            println!(
                "{}: {} h total, game level {}, {} pts.",
                progress.game_name,
                format_hours(progress.hours_tenths),
                progress.game_level,
                progress.game_points
            );
        }
        GameCommands::Review {
            game_id,
            player_id,
            rating,
            title,
            body,
        } => {
            let Some(rating) = parse_review_rating(&rating) else {
                bail!("rating `{rating}` must be a whole number from 1 to 5");
            };
            let review = reviews::upsert_review(
                &ctx.db,
                game_id,
                player_id,
                ReviewDraft {
                    rating,
                    title: &title,
                    body: &body,
                },
            )
            .await?;
            println!(
                "Saved review {} {} \"{}\".",
                review.id,
                rating_stars(review.rating),
                review.title
            );
        }
    }
    Ok(())
}

pub async fn run_badge(ctx: &Context, command: BadgeCommands) -> anyhow::Result<()> {
    match command {
        BadgeCommands::Create {
            name,
            description,
            requirement,
        } => {
            let badge = badges::get_or_create_badge(&ctx.db, &name, &description, &requirement)
                .await?;
            println!("Badge {} ({}).", badge.id, badge.name);
        }
        BadgeCommands::Award {
            player_id,
            badge_id,
        } => {
            if badges::award_badge(&ctx.db, player_id, badge_id).await? {
                println!("Awarded badge {badge_id} to player {player_id}.");
            } else {
                println!("Player {player_id} already has badge {badge_id}.");
            }
        }
    }
    Ok(())
}
