use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tokio::sync::Mutex;

use crate::error::{Entity, ProgressionError, Result};
use crate::model::achievement::{Achievement, Difficulty};
use crate::model::friend::{FriendDecision, FriendRequest, FriendStatus};
use crate::model::player::{Account, Player, Reward};
use crate::model::quest::{DailyQuest, QuestCompletion, QuestProgress};
use crate::model::tournament::{
    Membership, ResultRecord, Tournament, TournamentResult, TournamentStatus, admit, release,
};
use crate::store::{GrantOutcome, ProgressionStore, RewardApplied};

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    accounts: BTreeMap<i64, Account>,
    players: BTreeMap<i64, Player>,
    achievements: BTreeMap<i64, Achievement>,
    credits: HashSet<(i64, i64)>,
    quests: BTreeMap<i64, DailyQuest>,
    quest_progress: HashMap<(i64, i64), QuestProgress>,
    friend_requests: BTreeMap<i64, FriendRequest>,
    tournaments: BTreeMap<i64, Tournament>,
    participants: HashMap<i64, BTreeSet<i64>>,
    results: HashMap<(i64, i64), TournamentResult>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn player_mut(&mut self, player_id: i64) -> Result<&mut Player> {
        self.players
            .get_mut(&player_id)
            .ok_or_else(|| ProgressionError::not_found(Entity::Player, player_id))
    }

    fn require_player(&self, player_id: i64) -> Result<()> {
        if self.players.contains_key(&player_id) {
            Ok(())
        } else {
            Err(ProgressionError::not_found(Entity::Player, player_id))
        }
    }

    fn require_tournament(&self, tournament_id: i64) -> Result<Tournament> {
        self.tournaments
            .get(&tournament_id)
            .cloned()
            .ok_or_else(|| ProgressionError::not_found(Entity::Tournament, tournament_id))
    }

    fn reward_player(&mut self, player_id: i64, reward: Reward) -> Result<RewardApplied> {
        let player = self.player_mut(player_id)?;
        let levels_gained = player.apply_reward(reward);
        Ok(RewardApplied {
            player: player.clone(),
            levels_gained,
        })
    }
}

/// Process-local store. A single async mutex serializes every operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_achievement(
        &self,
        game_id: i64,
        name: &str,
        difficulty: Difficulty,
        points: i64,
        experience_reward: i64,
    ) -> Achievement {
        let mut tables = self.tables.lock().await;
        let achievement = Achievement {
            id: tables.next_id(),
            game_id,
            name: name.to_owned(),
            description: String::new(),
            difficulty,
            points,
            experience_reward,
        };
        tables
            .achievements
            .insert(achievement.id, achievement.clone());
        achievement
    }

    pub async fn insert_quest(
        &self,
        game_id: i64,
        title: &str,
        reward_points: i64,
        reward_experience: i64,
        is_active: bool,
    ) -> DailyQuest {
        let mut tables = self.tables.lock().await;
        let quest = DailyQuest {
            id: tables.next_id(),
            game_id,
            title: title.to_owned(),
            description: String::new(),
            reward_points,
            reward_experience,
            is_active,
        };
        tables.quests.insert(quest.id, quest.clone());
        quest
    }

    pub async fn insert_tournament(
        &self,
        game_id: i64,
        name: &str,
        max_participants: i64,
    ) -> Tournament {
        let mut tables = self.tables.lock().await;
        let tournament = Tournament {
            id: tables.next_id(),
            game_id,
            name: name.to_owned(),
            description: String::new(),
            prize_pool: 0,
            status: TournamentStatus::Upcoming,
            start_date: 0,
            end_date: 0,
            max_participants,
        };
        tables.tournaments.insert(tournament.id, tournament.clone());
        tournament
    }

    pub async fn participant_count(&self, tournament_id: i64) -> i64 {
        let tables = self.tables.lock().await;
        tables
            .participants
            .get(&tournament_id)
            .map_or(0, |members| members.len() as i64)
    }

    pub async fn quest_progress(&self, player_id: i64, quest_id: i64) -> Option<QuestProgress> {
        let tables = self.tables.lock().await;
        tables.quest_progress.get(&(player_id, quest_id)).cloned()
    }
}

impl ProgressionStore for MemoryStore {
    async fn create_account(
        &self,
        username: &str,
        email: &str,
        now: u64,
    ) -> Result<(Account, Player)> {
        let mut tables = self.tables.lock().await;
        if tables
            .accounts
            .values()
            .any(|account| account.username.eq_ignore_ascii_case(username))
        {
            return Err(ProgressionError::UsernameTaken(username.to_owned()));
        }

        let account = Account {
            id: tables.next_id(),
            username: username.to_owned(),
            email: email.to_owned(),
            created_at: now,
        };
        let player = Player::new(tables.next_id(), account.id, now);

        tables.accounts.insert(account.id, account.clone());
        tables.players.insert(player.id, player.clone());
        Ok((account, player))
    }

    async fn player(&self, player_id: i64) -> Result<Option<Player>> {
        Ok(self.tables.lock().await.players.get(&player_id).cloned())
    }

    async fn achievement(&self, achievement_id: i64) -> Result<Option<Achievement>> {
        Ok(self
            .tables
            .lock()
            .await
            .achievements
            .get(&achievement_id)
            .cloned())
    }

    async fn quest(&self, quest_id: i64) -> Result<Option<DailyQuest>> {
        Ok(self.tables.lock().await.quests.get(&quest_id).cloned())
    }

    async fn tournament(&self, tournament_id: i64) -> Result<Option<Tournament>> {
        Ok(self
            .tables
            .lock()
            .await
            .tournaments
            .get(&tournament_id)
            .cloned())
    }

    async fn apply_reward(&self, player_id: i64, reward: Reward) -> Result<RewardApplied> {
        self.tables.lock().await.reward_player(player_id, reward)
    }

    async fn credit_achievement(
        &self,
        player_id: i64,
        achievement: &Achievement,
        _now: u64,
    ) -> Result<GrantOutcome> {
        let mut tables = self.tables.lock().await;
        tables.require_player(player_id)?;

        if !tables.credits.insert((player_id, achievement.id)) {
            let player = tables.player_mut(player_id)?.clone();
            return Ok(GrantOutcome::AlreadyCredited { player });
        }

        let applied = tables.reward_player(player_id, achievement.reward())?;
        Ok(GrantOutcome::Granted {
            player: applied.player,
            levels_gained: applied.levels_gained,
        })
    }

    async fn quest_board(&self, player_id: i64) -> Result<Vec<(DailyQuest, QuestProgress)>> {
        let mut tables = self.tables.lock().await;
        tables.require_player(player_id)?;

        let active: Vec<DailyQuest> = tables
            .quests
            .values()
            .filter(|quest| quest.is_active)
            .cloned()
            .collect();

        let mut board = Vec::with_capacity(active.len());
        for quest in active {
            let progress = tables
                .quest_progress
                .entry((player_id, quest.id))
                .or_insert_with(|| QuestProgress::new(player_id, quest.id))
                .clone();
            board.push((quest, progress));
        }
        Ok(board)
    }

    async fn complete_quest(
        &self,
        player_id: i64,
        quest: &DailyQuest,
        now: u64,
    ) -> Result<QuestCompletion> {
        let mut tables = self.tables.lock().await;
        tables.require_player(player_id)?;

        let Some(progress) = tables.quest_progress.get_mut(&(player_id, quest.id)) else {
            return Err(ProgressionError::not_found(Entity::QuestProgress, quest.id));
        };

        if !progress.complete(now) {
            let progress = progress.clone();
            let player = tables.player_mut(player_id)?.clone();
            return Ok(QuestCompletion::AlreadyCompleted { progress, player });
        }

        let progress = progress.clone();
        let applied = tables.reward_player(player_id, quest.reward())?;
        Ok(QuestCompletion::Completed {
            progress,
            player: applied.player,
            levels_gained: applied.levels_gained,
        })
    }

    async fn send_friend_request(
        &self,
        from_player: i64,
        to_player: i64,
        now: u64,
    ) -> Result<FriendRequest> {
        let mut tables = self.tables.lock().await;
        tables.require_player(from_player)?;
        tables.require_player(to_player)?;

        if let Some(existing) = tables
            .friend_requests
            .values()
            .find(|request| request.from_player == from_player && request.to_player == to_player)
        {
            return Ok(existing.clone());
        }

        let request = FriendRequest {
            id: tables.next_id(),
            from_player,
            to_player,
            status: FriendStatus::Pending,
            created_at: now,
        };
        tables.friend_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn resolve_friend_request(
        &self,
        request_id: i64,
        acting_player: i64,
        decision: FriendDecision,
    ) -> Result<FriendRequest> {
        let mut tables = self.tables.lock().await;
        let request = tables
            .friend_requests
            .get_mut(&request_id)
            .filter(|request| request.to_player == acting_player)
            .ok_or_else(|| ProgressionError::not_found(Entity::FriendRequest, request_id))?;

        request.resolve(decision)?;
        Ok(request.clone())
    }

    async fn join_tournament(&self, tournament_id: i64, player_id: i64) -> Result<Membership> {
        let mut tables = self.tables.lock().await;
        let tournament = tables.require_tournament(tournament_id)?;
        tables.require_player(player_id)?;

        let members = tables.participants.entry(tournament_id).or_default();
        let outcome = admit(
            &tournament,
            members.len() as i64,
            members.contains(&player_id),
        )?;
        if outcome.changed() {
            members.insert(player_id);
        }
        Ok(outcome)
    }

    async fn leave_tournament(&self, tournament_id: i64, player_id: i64) -> Result<Membership> {
        let mut tables = self.tables.lock().await;
        tables.require_tournament(tournament_id)?;
        tables.require_player(player_id)?;

        let members = tables.participants.entry(tournament_id).or_default();
        let outcome = release(members.len() as i64, members.contains(&player_id));
        if outcome.changed() {
            members.remove(&player_id);
        }
        Ok(outcome)
    }

    async fn record_tournament_result(&self, result: TournamentResult) -> Result<ResultRecord> {
        let mut tables = self.tables.lock().await;
        tables.require_tournament(result.tournament_id)?;
        tables.require_player(result.player_id)?;

        let key = (result.tournament_id, result.player_id);
        if tables.results.insert(key, result.clone()).is_some() {
            let player = tables.player_mut(result.player_id)?.clone();
            return Ok(ResultRecord::Updated { result, player });
        }

        let applied = tables.reward_player(result.player_id, result.reward())?;
        Ok(ResultRecord::Rewarded {
            result,
            player: applied.player,
            levels_gained: applied.levels_gained,
        })
    }
}
