use playerhub_core::model::quest::QuestCompletion;
use playerhub_utils::time::format_unix_datetime;

use crate::commands::Context;
use crate::commands::render::{levels_note, player_line};

pub async fn board(ctx: &Context, player_id: i64) -> anyhow::Result<()> {
    let board = ctx.service.quest_board(player_id).await?;
    if board.is_empty() {
        println!("No active quests.");
        return Ok(());
    }

    for (quest, progress) in board {
        let state = match progress.completed_at {
            Some(at) if progress.completed => format!("done {}", format_unix_datetime(at)),
            _ => format!("{}%", progress.progress),
        };
        println!(
            "{:>5}  {:<40} +{} XP +{} pts  [{state}]",
            quest.id, quest.title, quest.reward_experience, quest.reward_points
        );
    }
    Ok(())
}

pub async fn complete(ctx: &Context, player_id: i64, quest_id: i64) -> anyhow::Result<()> {
    match ctx.service.complete_quest(player_id, quest_id).await? {
        QuestCompletion::Completed {
            player,
            levels_gained,
            ..
        } => {
            println!(
                "Quest {quest_id} completed by player {player_id}{}.",
                levels_note(levels_gained)
            );
            println!("{}", player_line(&player));
        }
        QuestCompletion::AlreadyCompleted { player, .. } => {
            println!("Quest {quest_id} was already completed; nothing changed.");
            println!("{}", player_line(&player));
        }
    }
    Ok(())
}
