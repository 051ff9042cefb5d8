use playerhub_core::model::achievement::Achievement;
use playerhub_core::model::friend::{FriendDecision, FriendRequest};
use playerhub_core::model::quest::{DailyQuest, QuestCompletion, QuestProgress};
use playerhub_core::model::tournament::{Membership, ResultRecord, Tournament, TournamentResult};
use playerhub_core::{
    Account, GrantOutcome, Player, ProgressionError, ProgressionStore, Reward, RewardApplied,
};

use crate::database::Database;
use crate::impls::{achievements, friends, players, quests, tournaments};

type Result<T> = std::result::Result<T, ProgressionError>;

impl ProgressionStore for Database {
    async fn create_account(&self, username: &str, email: &str, now: u64) -> Result<(Account, Player)> {
        players::create_account(self, username, email, now)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn player(&self, player_id: i64) -> Result<Option<Player>> {
        players::get_player(self, player_id)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn achievement(&self, achievement_id: i64) -> Result<Option<Achievement>> {
        achievements::get_achievement(self, achievement_id)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn quest(&self, quest_id: i64) -> Result<Option<DailyQuest>> {
        quests::get_quest(self, quest_id)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn tournament(&self, tournament_id: i64) -> Result<Option<Tournament>> {
        tournaments::get_tournament(self, tournament_id)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn apply_reward(&self, player_id: i64, reward: Reward) -> Result<RewardApplied> {
        players::apply_reward(self, player_id, reward)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn credit_achievement(
        &self,
        player_id: i64,
        achievement: &Achievement,
        now: u64,
    ) -> Result<GrantOutcome> {
        achievements::credit_achievement(self, player_id, achievement, now)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn quest_board(&self, player_id: i64) -> Result<Vec<(DailyQuest, QuestProgress)>> {
        quests::quest_board(self, player_id)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn complete_quest(
        &self,
        player_id: i64,
        quest: &DailyQuest,
        now: u64,
    ) -> Result<QuestCompletion> {
        quests::complete_quest(self, player_id, quest, now)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn send_friend_request(
        &self,
        from_player: i64,
        to_player: i64,
        now: u64,
    ) -> Result<FriendRequest> {
        friends::send_friend_request(self, from_player, to_player, now)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn resolve_friend_request(
        &self,
        request_id: i64,
        acting_player: i64,
        decision: FriendDecision,
    ) -> Result<FriendRequest> {
        friends::resolve_friend_request(self, request_id, acting_player, decision)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn join_tournament(&self, tournament_id: i64, player_id: i64) -> Result<Membership> {
        tournaments::join_tournament(self, tournament_id, player_id)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn leave_tournament(&self, tournament_id: i64, player_id: i64) -> Result<Membership> {
        tournaments::leave_tournament(self, tournament_id, player_id)
            .await
            .map_err(ProgressionError::from_anyhow)
    }

    async fn record_tournament_result(&self, result: TournamentResult) -> Result<ResultRecord> {
        tournaments::record_tournament_result(self, result)
            .await
            .map_err(ProgressionError::from_anyhow)
    }
}

#[cfg(test)]
mod tests {
    use playerhub_core::model::achievement::Difficulty;
    use playerhub_core::model::friend::{FriendDecision, FriendStatus};
    use playerhub_core::model::quest::QuestCompletion;
    use playerhub_core::model::tournament::{Membership, MembershipAction, ResultRecord};
    use playerhub_core::{Entity, GrantOutcome, PlayerProgressionService, ProgressionError};
    use sqlx::PgPool;

    use crate::database::Database;
    use crate::impls::achievements::{self, NewAchievement};
    use crate::impls::games::{self, SEED_GAMES};
    use crate::impls::quests::{self, NewQuest};
    use crate::impls::tournaments::{self, NewTournament};

    type Service = PlayerProgressionService<Database>;

    async fn service_with_game(pool: PgPool) -> anyhow::Result<(Service, i64)> {
        let db = Database::new(pool);
        let (game, _) = games::get_or_create_game(&db, &SEED_GAMES[0]).await?;
        Ok((PlayerProgressionService::new(db), game.id))
    }

    async fn tournament_for(
        service: &Service,
        game_id: i64,
        max_participants: i64,
    ) -> anyhow::Result<i64> {
        let tournament = tournaments::create_tournament(
            service.store(),
            NewTournament {
                game_id,
                name: "Kaer Morhen Cup",
                description: "",
                prize_pool: 1_000,
                start_date: 1_700_000_000,
                end_date: 1_700_086_400,
                max_participants,
            },
        )
        .await?;
        Ok(tournament.id)
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn case_variant_username_is_taken(pool: PgPool) -> anyhow::Result<()> {
        let (service, _) = service_with_game(pool).await?;
        service.register_player("Geralt", "geralt@example.com").await?;

        let err = service
            .register_player("geralt", "other@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::UsernameTaken(_)));
        Ok(())
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn achievement_credit_changes_state_once(pool: PgPool) -> anyhow::Result<()> {
        let (service, game_id) = service_with_game(pool).await?;
        let (_, player) = service.register_player("ciri", "ciri@example.com").await?;
        let achievement = achievements::create_achievement(
            service.store(),
            NewAchievement {
                game_id,
                name: "Monster Slayer",
                description: "",
                difficulty: Difficulty::Hard,
                points: 10,
                experience_reward: 150,
            },
        )
        .await?;

        let first = service.grant_achievement(player.id, achievement.id).await?;
        assert!(first.was_granted());
        assert_eq!(
            (first.player().level, first.player().experience, first.player().total_points),
            (2, 50, 10)
        );

        let second = service.grant_achievement(player.id, achievement.id).await?;
        assert!(matches!(second, GrantOutcome::AlreadyCredited { .. }));
        assert_eq!(service.player(player.id).await?, *first.player());
        Ok(())
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn second_quest_completion_is_a_no_op(pool: PgPool) -> anyhow::Result<()> {
        let (service, game_id) = service_with_game(pool).await?;
        let (_, player) = service.register_player("yennefer", "yen@example.com").await?;
        let quest = quests::create_quest(
            service.store(),
            NewQuest {
                game_id,
                title: "Win three matches",
                description: "",
                reward_points: 50,
                reward_experience: 100,
            },
        )
        .await?;

        let err = service.complete_quest(player.id, quest.id).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::NotFound {
                entity: Entity::QuestProgress,
                ..
            }
        ));

        let board = service.quest_board(player.id).await?;
        assert_eq!(board.len(), 1);
        assert!(!board[0].1.completed);

        let first = service.complete_quest(player.id, quest.id).await?;
        assert!(matches!(first, QuestCompletion::Completed { .. }));
        assert_eq!((first.player().level, first.player().total_points), (2, 50));

        let second = service.complete_quest(player.id, quest.id).await?;
        assert!(matches!(second, QuestCompletion::AlreadyCompleted { .. }));
        assert_eq!(second.progress().completed_at, first.progress().completed_at);
        assert_eq!(service.player(player.id).await?, *first.player());
        Ok(())
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn join_at_capacity_is_rejected(pool: PgPool) -> anyhow::Result<()> {
        let (service, game_id) = service_with_game(pool).await?;
        let (_, first) = service.register_player("lambert", "lambert@example.com").await?;
        let (_, second) = service.register_player("eskel", "eskel@example.com").await?;
        let tournament_id = tournament_for(&service, game_id, 1).await?;

        let joined = service
            .tournament_membership(tournament_id, first.id, MembershipAction::Join)
            .await?;
        assert_eq!(joined, Membership::Joined { participants: 1 });

        let repeat = service
            .tournament_membership(tournament_id, first.id, MembershipAction::Join)
            .await?;
        assert_eq!(repeat, Membership::AlreadyMember { participants: 1 });

        let err = service
            .tournament_membership(tournament_id, second.id, MembershipAction::Join)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::CapacityExceeded {
                max_participants: 1,
                ..
            }
        ));

        let detail = tournaments::tournament_detail(service.store(), tournament_id, Some(second.id))
            .await?
            .expect("tournament exists");
        assert_eq!(detail.participants_count, 1);
        assert!(!detail.is_participant);
        Ok(())
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn rerecorded_result_pays_no_second_reward(pool: PgPool) -> anyhow::Result<()> {
        let (service, game_id) = service_with_game(pool).await?;
        let (_, player) = service.register_player("vesemir", "vesemir@example.com").await?;
        let tournament_id = tournament_for(&service, game_id, 8).await?;

        let first = service
            .record_tournament_result(tournament_id, player.id, 1, 500, 120)
            .await?;
        assert!(matches!(first, ResultRecord::Rewarded { .. }));
        assert_eq!(
            (first.player().level, first.player().experience, first.player().total_points),
            (2, 20, 500)
        );

        let second = service
            .record_tournament_result(tournament_id, player.id, 2, 500, 120)
            .await?;
        assert!(matches!(second, ResultRecord::Updated { .. }));
        assert_eq!(service.player(player.id).await?, *first.player());

        let detail = tournaments::tournament_detail(service.store(), tournament_id, None)
            .await?
            .expect("tournament exists");
        assert_eq!(detail.results.len(), 1);
        assert_eq!(detail.results[0].position, 2);
        Ok(())
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn decided_friend_request_stays_decided(pool: PgPool) -> anyhow::Result<()> {
        let (service, _) = service_with_game(pool).await?;
        let (_, from) = service.register_player("dandelion", "jaskier@example.com").await?;
        let (_, to) = service.register_player("zoltan", "zoltan@example.com").await?;

        let sent = service.send_friend_request(from.id, to.id).await?;
        assert_eq!(service.send_friend_request(from.id, to.id).await?.id, sent.id);

        let err = service
            .resolve_friend_request(from.id, sent.id, FriendDecision::Accept)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let declined = service
            .resolve_friend_request(to.id, sent.id, FriendDecision::Decline)
            .await?;
        assert_eq!(declined.status, FriendStatus::Declined);

        let err = service
            .resolve_friend_request(to.id, sent.id, FriendDecision::Accept)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::InvalidTransition {
                from: FriendStatus::Declined,
                ..
            }
        ));
        Ok(())
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn concurrent_rewards_are_serialized_by_the_row_lock(pool: PgPool) -> anyhow::Result<()> {
        let (service, _) = service_with_game(pool).await?;
        let (_, player) = service.register_player("triss", "triss@example.com").await?;
        let player_id = player.id;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.add_experience(player_id, 30).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await??;
        }

        // 300 XP from level 1: 100 for level 2, 200 for level 3
        let player = service.player(player_id).await?;
        assert_eq!((player.level, player.experience), (3, 0));
        Ok(())
    }
}
