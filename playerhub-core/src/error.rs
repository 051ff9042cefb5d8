use std::fmt;

use crate::model::friend::FriendStatus;

/// Kinds of records a progression operation can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Account,
    Player,
    Achievement,
    Quest,
    QuestProgress,
    Tournament,
    FriendRequest,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Account => "account",
            Entity::Player => "player",
            Entity::Achievement => "achievement",
            Entity::Quest => "quest",
            Entity::QuestProgress => "quest progress",
            Entity::Tournament => "tournament",
            Entity::FriendRequest => "friend request",
        };
        f.write_str(name)
    }
}

/// Which reward field an invalid amount was aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountKind {
    Experience,
    Points,
}

impl fmt::Display for AmountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountKind::Experience => f.write_str("experience"),
            AmountKind::Points => f.write_str("points"),
        }
    }
}

/// Errors surfaced by progression operations.
///
/// Duplicate grants, completions and memberships are not errors; they come
/// back as outcome variants on the success path.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("tournament {tournament_id} is full ({max_participants} participants)")]
    CapacityExceeded {
        tournament_id: i64,
        max_participants: i64,
    },

    #[error("friend request {request_id} is already {from}, cannot mark it {to}")]
    InvalidTransition {
        request_id: i64,
        from: FriendStatus,
        to: FriendStatus,
    },

    #[error("{kind} amount must not be negative (got {amount})")]
    InvalidAmount { kind: AmountKind, amount: i64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("username `{0}` is already taken")]
    UsernameTaken(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ProgressionError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Recover a domain error that travelled through `anyhow`, or wrap the
    /// rest as a storage failure.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<ProgressionError>() {
            Ok(domain) => domain,
            Err(other) => Self::Storage(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T, E = ProgressionError> = std::result::Result<T, E>;
