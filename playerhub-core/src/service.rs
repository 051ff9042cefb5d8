use tracing::{debug, info};

use playerhub_utils::parse::{normalize_email, normalize_username};
use playerhub_utils::time::now_unix_secs;

use crate::error::{Entity, ProgressionError, Result};
use crate::model::friend::{FriendDecision, FriendRequest};
use crate::model::player::{Account, Player, Reward};
use crate::model::quest::{DailyQuest, QuestCompletion, QuestProgress};
use crate::model::tournament::{Membership, MembershipAction, ResultRecord, TournamentResult};
use crate::store::{GrantOutcome, ProgressionStore, RewardApplied};

/// Applies rewards to players and drives the idempotent grant operations.
///
/// Validation and logging happen here; atomicity is the store's job.
#[derive(Clone, Debug)]
pub struct PlayerProgressionService<S> {
    store: S,
}

impl<S: ProgressionStore> PlayerProgressionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an account together with its level 1 player profile.
    pub async fn register_player(&self, username: &str, email: &str) -> Result<(Account, Player)> {
        let username = normalize_username(username).ok_or_else(|| {
            ProgressionError::InvalidInput(
                "username must be 1-150 letters, digits or @.+-_".to_owned(),
            )
        })?;
        let email = normalize_email(email)
            .ok_or_else(|| ProgressionError::InvalidInput("email address is malformed".to_owned()))?;

        let (account, player) = self
            .store
            .create_account(&username, &email, now_unix_secs())
            .await?;
        info!(
            account_id = account.id,
            player_id = player.id,
            username = %account.username,
            "registered player"
        );
        Ok((account, player))
    }

    pub async fn player(&self, player_id: i64) -> Result<Player> {
        self.store
            .player(player_id)
            .await?
            .ok_or_else(|| ProgressionError::not_found(Entity::Player, player_id))
    }

    pub async fn add_experience(&self, player_id: i64, amount: i64) -> Result<RewardApplied> {
        let reward = Reward::experience(amount)?;
        let applied = self.store.apply_reward(player_id, reward).await?;
        log_level_change(&applied.player, applied.levels_gained, "experience added");
        Ok(applied)
    }

    pub async fn add_points(&self, player_id: i64, amount: i64) -> Result<Player> {
        let reward = Reward::points(amount)?;
        let applied = self.store.apply_reward(player_id, reward).await?;
        debug!(
            player_id,
            amount,
            total_points = applied.player.total_points,
            "points added"
        );
        Ok(applied.player)
    }

    /// Credit an achievement once. A repeat grant returns `AlreadyCredited`.
    pub async fn grant_achievement(
        &self,
        player_id: i64,
        achievement_id: i64,
    ) -> Result<GrantOutcome> {
        let achievement = self
            .store
            .achievement(achievement_id)
            .await?
            .ok_or_else(|| ProgressionError::not_found(Entity::Achievement, achievement_id))?;

        let outcome = self
            .store
            .credit_achievement(player_id, &achievement, now_unix_secs())
            .await?;

        match &outcome {
            GrantOutcome::Granted {
                player,
                levels_gained,
            } => {
                info!(
                    player_id,
                    achievement_id,
                    achievement = %achievement.name,
                    points = achievement.points,
                    experience = achievement.experience_reward,
                    "achievement granted"
                );
                log_level_change(player, *levels_gained, "achievement reward applied");
            }
            GrantOutcome::AlreadyCredited { .. } => {
                debug!(player_id, achievement_id, "achievement already credited");
            }
        }

        Ok(outcome)
    }

    /// Active quests with this player's progress. Viewing the board is what
    /// creates progress records.
    pub async fn quest_board(&self, player_id: i64) -> Result<Vec<(DailyQuest, QuestProgress)>> {
        self.store.quest_board(player_id).await
    }

    pub async fn complete_quest(&self, player_id: i64, quest_id: i64) -> Result<QuestCompletion> {
        let quest = self
            .store
            .quest(quest_id)
            .await?
            .ok_or_else(|| ProgressionError::not_found(Entity::Quest, quest_id))?;

        let completion = self
            .store
            .complete_quest(player_id, &quest, now_unix_secs())
            .await?;

        match &completion {
            QuestCompletion::Completed {
                player,
                levels_gained,
                ..
            } => {
                info!(player_id, quest_id, quest = %quest.title, "quest completed");
                log_level_change(player, *levels_gained, "quest reward applied");
            }
            QuestCompletion::AlreadyCompleted { .. } => {
                debug!(player_id, quest_id, "quest already completed");
            }
        }

        Ok(completion)
    }

    pub async fn send_friend_request(
        &self,
        from_player: i64,
        to_player: i64,
    ) -> Result<FriendRequest> {
        if from_player == to_player {
            return Err(ProgressionError::InvalidInput(
                "cannot send a friend request to yourself".to_owned(),
            ));
        }

        let request = self
            .store
            .send_friend_request(from_player, to_player, now_unix_secs())
            .await?;
        debug!(
            request_id = request.id,
            from_player,
            to_player,
            status = %request.status,
            "friend request sent"
        );
        Ok(request)
    }

    /// Accept or decline a pending request addressed to `acting_player`.
    pub async fn resolve_friend_request(
        &self,
        acting_player: i64,
        request_id: i64,
        decision: FriendDecision,
    ) -> Result<FriendRequest> {
        let request = self
            .store
            .resolve_friend_request(request_id, acting_player, decision)
            .await?;
        info!(
            request_id,
            from_player = request.from_player,
            to_player = request.to_player,
            status = %request.status,
            "friend request resolved"
        );
        Ok(request)
    }

    pub async fn tournament_membership(
        &self,
        tournament_id: i64,
        player_id: i64,
        action: MembershipAction,
    ) -> Result<Membership> {
        let outcome = match action {
            MembershipAction::Join => self.store.join_tournament(tournament_id, player_id).await?,
            MembershipAction::Leave => {
                self.store
                    .leave_tournament(tournament_id, player_id)
                    .await?
            }
        };

        if outcome.changed() {
            info!(
                tournament_id,
                player_id,
                ?outcome,
                "tournament roster changed"
            );
        } else {
            debug!(tournament_id, player_id, ?outcome, "tournament roster unchanged");
        }
        Ok(outcome)
    }

    /// Record a placement. The first placement per player grants
    /// `score` experience and `prize` points.
    pub async fn record_tournament_result(
        &self,
        tournament_id: i64,
        player_id: i64,
        position: i64,
        prize: i64,
        score: i64,
    ) -> Result<ResultRecord> {
        if position < 1 {
            return Err(ProgressionError::InvalidInput(format!(
                "position must be at least 1 (got {position})"
            )));
        }
        Reward::new(score, prize)?;

        let record = self
            .store
            .record_tournament_result(TournamentResult {
                tournament_id,
                player_id,
                position,
                prize,
                score,
            })
            .await?;

        match &record {
            ResultRecord::Rewarded {
                player,
                levels_gained,
                ..
            } => {
                info!(tournament_id, player_id, position, "tournament result rewarded");
                log_level_change(player, *levels_gained, "tournament reward applied");
            }
            ResultRecord::Updated { .. } => {
                debug!(tournament_id, player_id, position, "tournament result updated");
            }
        }
        Ok(record)
    }
}

fn log_level_change(player: &Player, levels_gained: i64, message: &'static str) {
    if levels_gained > 0 {
        info!(
            player_id = player.id,
            level = player.level,
            levels_gained,
            experience = player.experience,
            "level up"
        );
    }
    debug!(
        player_id = player.id,
        level = player.level,
        experience = player.experience,
        total_points = player.total_points,
        "{message}"
    );
}

#[cfg(test)]
mod tests {
    use super::PlayerProgressionService;
    use crate::error::{Entity, ProgressionError};
    use crate::leveling::exp_to_next_level;
    use crate::model::achievement::Difficulty;
    use crate::model::friend::{FriendDecision, FriendStatus};
    use crate::model::player::Player;
    use crate::model::quest::QuestCompletion;
    use crate::model::tournament::{Membership, MembershipAction, ResultRecord};
    use crate::store::{GrantOutcome, MemoryStore};

    async fn service_with_player() -> (PlayerProgressionService<MemoryStore>, Player) {
        let service = PlayerProgressionService::new(MemoryStore::new());
        let (_, player) = service
            .register_player("geralt", "geralt@kaer.morhen")
            .await
            .unwrap();
        (service, player)
    }

    #[tokio::test]
    async fn registration_creates_a_fresh_player() {
        let (service, player) = service_with_player().await;
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 0);
        assert_eq!(player.total_points, 0);
        assert_eq!(service.player(player.id).await.unwrap(), player);
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let (service, _) = service_with_player().await;
        let err = service
            .register_player("Geralt", "other@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::UsernameTaken(_)));
    }

    #[tokio::test]
    async fn experience_jump_from_level_one() {
        let (service, player) = service_with_player().await;
        let applied = service.add_experience(player.id, 250).await.unwrap();
        assert_eq!(applied.player.level, 2);
        assert_eq!(applied.player.experience, 150);
        assert_eq!(applied.levels_gained, 1);
    }

    #[tokio::test]
    async fn invariant_holds_after_every_grant() {
        let (service, player) = service_with_player().await;
        for amount in [5, 95, 100, 333, 1_000, 0, 7_777] {
            let applied = service.add_experience(player.id, amount).await.unwrap();
            let player = applied.player;
            assert!(player.experience >= 0);
            assert!(player.experience < exp_to_next_level(player.level));
        }
    }

    #[tokio::test]
    async fn negative_amounts_are_rejected_and_change_nothing() {
        let (service, player) = service_with_player().await;
        service.add_experience(player.id, 40).await.unwrap();

        assert!(matches!(
            service.add_experience(player.id, -10).await,
            Err(ProgressionError::InvalidAmount { .. })
        ));
        assert!(matches!(
            service.add_points(player.id, -1).await,
            Err(ProgressionError::InvalidAmount { .. })
        ));

        let after = service.player(player.id).await.unwrap();
        assert_eq!(after.experience, 40);
        assert_eq!(after.total_points, 0);
    }

    #[tokio::test]
    async fn points_split_or_whole_end_up_equal() {
        let service = PlayerProgressionService::new(MemoryStore::new());
        let (_, a) = service.register_player("ciri", "ciri@example.com").await.unwrap();
        let (_, b) = service
            .register_player("yennefer", "yen@example.com")
            .await
            .unwrap();

        service.add_points(a.id, 30).await.unwrap();
        let split = service.add_points(a.id, 12).await.unwrap();
        let whole = service.add_points(b.id, 42).await.unwrap();

        assert_eq!(split.total_points, whole.total_points);
        assert_eq!(split.level, 1);
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let service = PlayerProgressionService::new(MemoryStore::new());
        let err = service.add_points(404, 10).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::NotFound {
                entity: Entity::Player,
                id: 404
            }
        ));
    }

    #[tokio::test]
    async fn achievement_is_credited_once() {
        let (service, player) = service_with_player().await;
        let achievement = service
            .store()
            .insert_achievement(1, "Monster Slayer", Difficulty::Hard, 10, 150)
            .await;

        let first = service
            .grant_achievement(player.id, achievement.id)
            .await
            .unwrap();
        assert!(first.was_granted());
        assert_eq!(first.player().level, 2);
        assert_eq!(first.player().experience, 50);
        assert_eq!(first.player().total_points, 10);

        let second = service
            .grant_achievement(player.id, achievement.id)
            .await
            .unwrap();
        assert!(matches!(second, GrantOutcome::AlreadyCredited { .. }));
        assert_eq!(second.player(), first.player());
    }

    #[tokio::test]
    async fn missing_achievement_is_not_found() {
        let (service, player) = service_with_player().await;
        let err = service.grant_achievement(player.id, 999).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::NotFound {
                entity: Entity::Achievement,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn quest_needs_board_view_before_completion() {
        let (service, player) = service_with_player().await;
        let quest = service
            .store()
            .insert_quest(1, "Win three matches", 50, 100, true)
            .await;

        let err = service.complete_quest(player.id, quest.id).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::NotFound {
                entity: Entity::QuestProgress,
                ..
            }
        ));

        let board = service.quest_board(player.id).await.unwrap();
        assert_eq!(board.len(), 1);
        assert!(!board[0].1.completed);

        let completion = service.complete_quest(player.id, quest.id).await.unwrap();
        assert!(matches!(completion, QuestCompletion::Completed { .. }));
        assert_eq!(completion.progress().progress, 100);
        assert_eq!(completion.player().level, 2);
        assert_eq!(completion.player().total_points, 50);
    }

    #[tokio::test]
    async fn completing_twice_changes_nothing() {
        let (service, player) = service_with_player().await;
        let quest = service
            .store()
            .insert_quest(1, "Daily login", 20, 30, true)
            .await;
        service.quest_board(player.id).await.unwrap();

        let first = service.complete_quest(player.id, quest.id).await.unwrap();
        let second = service.complete_quest(player.id, quest.id).await.unwrap();

        assert!(matches!(second, QuestCompletion::AlreadyCompleted { .. }));
        assert_eq!(second.progress(), first.progress());
        assert_eq!(second.player(), first.player());
        assert_eq!(
            service
                .store()
                .quest_progress(player.id, quest.id)
                .await
                .and_then(|progress| progress.completed_at),
            first.progress().completed_at
        );
    }

    #[tokio::test]
    async fn inactive_quests_stay_off_the_board() {
        let (service, player) = service_with_player().await;
        service
            .store()
            .insert_quest(1, "Retired quest", 10, 10, false)
            .await;
        assert!(service.quest_board(player.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn friend_requests_follow_their_state_machine() {
        let (service, geralt) = service_with_player().await;
        let (_, bob) = service
            .register_player("bob", "bob@example.com")
            .await
            .unwrap();

        let sent = service.send_friend_request(geralt.id, bob.id).await.unwrap();
        let again = service.send_friend_request(geralt.id, bob.id).await.unwrap();
        assert_eq!(sent.id, again.id);
        assert_eq!(sent.status, FriendStatus::Pending);

        // only the addressee can see the request
        let err = service
            .resolve_friend_request(geralt.id, sent.id, FriendDecision::Accept)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let accepted = service
            .resolve_friend_request(bob.id, sent.id, FriendDecision::Accept)
            .await
            .unwrap();
        assert_eq!(accepted.status, FriendStatus::Accepted);

        let err = service
            .resolve_friend_request(bob.id, sent.id, FriendDecision::Decline)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn self_friend_request_is_invalid() {
        let (service, player) = service_with_player().await;
        assert!(matches!(
            service.send_friend_request(player.id, player.id).await,
            Err(ProgressionError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn tournament_capacity_is_enforced() {
        let (service, geralt) = service_with_player().await;
        let (_, bob) = service
            .register_player("bob", "bob@example.com")
            .await
            .unwrap();
        let tournament = service.store().insert_tournament(1, "Duel Cup", 1).await;

        let joined = service
            .tournament_membership(tournament.id, geralt.id, MembershipAction::Join)
            .await
            .unwrap();
        assert_eq!(joined, Membership::Joined { participants: 1 });

        let repeat = service
            .tournament_membership(tournament.id, geralt.id, MembershipAction::Join)
            .await
            .unwrap();
        assert_eq!(repeat, Membership::AlreadyMember { participants: 1 });

        let err = service
            .tournament_membership(tournament.id, bob.id, MembershipAction::Join)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressionError::CapacityExceeded { .. }));
        assert_eq!(service.store().participant_count(tournament.id).await, 1);

        let left = service
            .tournament_membership(tournament.id, geralt.id, MembershipAction::Leave)
            .await
            .unwrap();
        assert_eq!(left, Membership::Left { participants: 0 });

        let not_member = service
            .tournament_membership(tournament.id, geralt.id, MembershipAction::Leave)
            .await
            .unwrap();
        assert_eq!(not_member, Membership::NotMember { participants: 0 });
    }

    #[tokio::test]
    async fn tournament_result_rewards_only_first_recording() {
        let (service, player) = service_with_player().await;
        let tournament = service.store().insert_tournament(1, "Finals", 8).await;

        let first = service
            .record_tournament_result(tournament.id, player.id, 1, 500, 120)
            .await
            .unwrap();
        assert!(matches!(first, ResultRecord::Rewarded { .. }));
        assert_eq!(first.player().total_points, 500);
        assert_eq!(first.player().level, 2);
        assert_eq!(first.player().experience, 20);

        let second = service
            .record_tournament_result(tournament.id, player.id, 2, 500, 120)
            .await
            .unwrap();
        assert!(matches!(second, ResultRecord::Updated { .. }));
        assert_eq!(second.player(), first.player());
    }

    #[tokio::test]
    async fn concurrent_grants_do_not_lose_updates() {
        let (service, player) = service_with_player().await;
        let service = std::sync::Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.add_points(player.id, 5).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.player(player.id).await.unwrap().total_points, 100);
    }
}
