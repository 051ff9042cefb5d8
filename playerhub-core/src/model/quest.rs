use serde::{Deserialize, Serialize};

use crate::model::player::{Player, Reward};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuest {
    pub id: i64,
    pub game_id: i64,
    pub title: String,
    pub description: String,
    pub reward_points: i64,
    pub reward_experience: i64,
    pub is_active: bool,
}

impl DailyQuest {
    pub const DEFAULT_REWARD_POINTS: i64 = 50;
    pub const DEFAULT_REWARD_EXPERIENCE: i64 = 100;

    pub fn reward(&self) -> Reward {
        Reward {
            experience: self.reward_experience.max(0),
            points: self.reward_points.max(0),
        }
    }
}

/// One player's progress on one quest. Created the first time the player
/// sees the quest, completed at most once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub player_id: i64,
    pub quest_id: i64,
    pub completed: bool,
    pub completed_at: Option<u64>,
    pub progress: i64,
}

impl QuestProgress {
    pub fn new(player_id: i64, quest_id: i64) -> Self {
        Self {
            player_id,
            quest_id,
            completed: false,
            completed_at: None,
            progress: 0,
        }
    }

    /// Mark the quest finished. Returns `false` and leaves the record alone
    /// if it was already completed.
    pub fn complete(&mut self, now: u64) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.progress = 100;
        self.completed_at = Some(now);
        true
    }
}

/// Result of a quest completion attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestCompletion {
    Completed {
        progress: QuestProgress,
        player: Player,
        levels_gained: i64,
    },
    AlreadyCompleted {
        progress: QuestProgress,
        player: Player,
    },
}

impl QuestCompletion {
    pub fn player(&self) -> &Player {
        match self {
            QuestCompletion::Completed { player, .. }
            | QuestCompletion::AlreadyCompleted { player, .. } => player,
        }
    }

    pub fn progress(&self) -> &QuestProgress {
        match self {
            QuestCompletion::Completed { progress, .. }
            | QuestCompletion::AlreadyCompleted { progress, .. } => progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QuestProgress;

    #[test]
    fn completion_stamps_once() {
        let mut progress = QuestProgress::new(1, 2);
        assert!(progress.complete(1_000));
        assert_eq!(progress.progress, 100);
        assert_eq!(progress.completed_at, Some(1_000));

        assert!(!progress.complete(2_000));
        assert_eq!(progress.completed_at, Some(1_000));
    }
}
