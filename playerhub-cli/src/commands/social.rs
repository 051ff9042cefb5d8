use playerhub_database::impls::friends;
use playerhub_utils::time::format_unix_date;

use crate::cli::FriendCommands;
use crate::commands::Context;

pub async fn run(ctx: &Context, command: FriendCommands) -> anyhow::Result<()> {
    match command {
        FriendCommands::Send {
            from_player,
            to_player,
        } => {
            let request = ctx.service.send_friend_request(from_player, to_player).await?;
            println!(
                "Friend request {} from player {} to player {} is {}.",
                request.id, request.from_player, request.to_player, request.status
            );
        }
        FriendCommands::Resolve {
            player_id,
            request_id,
            decision,
        } => {
            let request = ctx
                .service
                .resolve_friend_request(player_id, request_id, decision)
                .await?;
            println!("Friend request {} is now {}.", request.id, request.status);
        }
        FriendCommands::Pending { player_id } => {
            let pending = friends::pending_requests(&ctx.db, player_id).await?;
            if pending.is_empty() {
                println!("No pending friend requests.");
            }
            for incoming in pending {
                println!(
                    "{:>6}  from {} (player {}) on {}",
                    incoming.request.id,
                    incoming.from_username,
                    incoming.request.from_player,
                    format_unix_date(incoming.request.created_at)
                );
            }
        }
        FriendCommands::List { player_id } => {
            let friends = friends::list_friends(&ctx.db, player_id).await?;
            if friends.is_empty() {
                println!("No friends yet.");
            }
            for (friend_id, username) in friends {
                println!("{friend_id:>6}  {username}");
            }
        }
    }
    Ok(())
}
