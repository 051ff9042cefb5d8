//! Persistence seam for progression operations.
//!
//! Every method is one atomic unit of work: the store is responsible for
//! holding whatever lock or transaction keeps a single player's
//! read-modify-write from interleaving with another request.

mod memory;

use std::future::Future;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::achievement::Achievement;
use crate::model::friend::{FriendDecision, FriendRequest};
use crate::model::player::{Account, Player, Reward};
use crate::model::quest::{DailyQuest, QuestCompletion, QuestProgress};
use crate::model::tournament::{Membership, ResultRecord, Tournament, TournamentResult};

/// Player state after a reward was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardApplied {
    pub player: Player,
    pub levels_gained: i64,
}

/// Result of crediting an achievement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted { player: Player, levels_gained: i64 },
    AlreadyCredited { player: Player },
}

impl GrantOutcome {
    pub fn player(&self) -> &Player {
        match self {
            GrantOutcome::Granted { player, .. } | GrantOutcome::AlreadyCredited { player } => {
                player
            }
        }
    }

    pub fn was_granted(&self) -> bool {
        matches!(self, GrantOutcome::Granted { .. })
    }
}

pub trait ProgressionStore: Send + Sync {
    /// Create an account and its one player profile together.
    fn create_account(
        &self,
        username: &str,
        email: &str,
        now: u64,
    ) -> impl Future<Output = Result<(Account, Player)>> + Send;

    fn player(&self, player_id: i64) -> impl Future<Output = Result<Option<Player>>> + Send;

    fn achievement(
        &self,
        achievement_id: i64,
    ) -> impl Future<Output = Result<Option<Achievement>>> + Send;

    fn quest(&self, quest_id: i64) -> impl Future<Output = Result<Option<DailyQuest>>> + Send;

    fn tournament(
        &self,
        tournament_id: i64,
    ) -> impl Future<Output = Result<Option<Tournament>>> + Send;

    /// Apply an unkeyed reward to a player.
    fn apply_reward(
        &self,
        player_id: i64,
        reward: Reward,
    ) -> impl Future<Output = Result<RewardApplied>> + Send;

    /// Credit an achievement once per player and apply its reward with the credit.
    fn credit_achievement(
        &self,
        player_id: i64,
        achievement: &Achievement,
        now: u64,
    ) -> impl Future<Output = Result<GrantOutcome>> + Send;

    /// Active quests paired with the player's progress, creating missing progress records.
    fn quest_board(
        &self,
        player_id: i64,
    ) -> impl Future<Output = Result<Vec<(DailyQuest, QuestProgress)>>> + Send;

    fn complete_quest(
        &self,
        player_id: i64,
        quest: &DailyQuest,
        now: u64,
    ) -> impl Future<Output = Result<QuestCompletion>> + Send;

    /// Get or create the request from `from_player` to `to_player`.
    fn send_friend_request(
        &self,
        from_player: i64,
        to_player: i64,
        now: u64,
    ) -> impl Future<Output = Result<FriendRequest>> + Send;

    /// Resolve a request addressed to `acting_player`.
    fn resolve_friend_request(
        &self,
        request_id: i64,
        acting_player: i64,
        decision: FriendDecision,
    ) -> impl Future<Output = Result<FriendRequest>> + Send;

    fn join_tournament(
        &self,
        tournament_id: i64,
        player_id: i64,
    ) -> impl Future<Output = Result<Membership>> + Send;

    fn leave_tournament(
        &self,
        tournament_id: i64,
        player_id: i64,
    ) -> impl Future<Output = Result<Membership>> + Send;

    /// Upsert a placement; the reward is applied only on first insert.
    fn record_tournament_result(
        &self,
        result: TournamentResult,
    ) -> impl Future<Output = Result<ResultRecord>> + Send;
}
