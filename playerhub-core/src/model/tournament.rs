use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProgressionError, Result};
use crate::model::player::{Player, Reward};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    #[default]
    Upcoming,
    Active,
    Finished,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Active => "active",
            TournamentStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw {
            "upcoming" => Ok(TournamentStatus::Upcoming),
            "active" => Ok(TournamentStatus::Active),
            "finished" => Ok(TournamentStatus::Finished),
            other => Err(format!("unknown tournament status `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub description: String,
    pub prize_pool: i64,
    pub status: TournamentStatus,
    pub start_date: u64,
    pub end_date: u64,
    pub max_participants: i64,
}

impl Tournament {
    pub const DEFAULT_MAX_PARTICIPANTS: i64 = 100;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipAction {
    Join,
    Leave,
}

/// Outcome of a join or leave. Only `Joined` and `Left` change the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    Joined { participants: i64 },
    AlreadyMember { participants: i64 },
    Left { participants: i64 },
    NotMember { participants: i64 },
}

impl Membership {
    pub fn participants(&self) -> i64 {
        match *self {
            Membership::Joined { participants }
            | Membership::AlreadyMember { participants }
            | Membership::Left { participants }
            | Membership::NotMember { participants } => participants,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, Membership::Joined { .. } | Membership::Left { .. })
    }
}

/// Decide whether a player may join a roster of `participants` members.
pub fn admit(tournament: &Tournament, participants: i64, already_member: bool) -> Result<Membership> {
    if already_member {
        return Ok(Membership::AlreadyMember { participants });
    }
    if participants >= tournament.max_participants {
        return Err(ProgressionError::CapacityExceeded {
            tournament_id: tournament.id,
            max_participants: tournament.max_participants,
        });
    }
    Ok(Membership::Joined {
        participants: participants + 1,
    })
}

/// Decide what leaving does to a roster of `participants` members.
pub fn release(participants: i64, is_member: bool) -> Membership {
    if is_member {
        Membership::Left {
            participants: participants - 1,
        }
    } else {
        Membership::NotMember { participants }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResult {
    pub tournament_id: i64,
    pub player_id: i64,
    pub position: i64,
    pub prize: i64,
    pub score: i64,
}

impl TournamentResult {
    /// Score feeds experience, prize feeds points.
    pub fn reward(&self) -> Reward {
        Reward {
            experience: self.score.max(0),
            points: self.prize.max(0),
        }
    }
}

/// Result of recording a placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultRecord {
    /// First placement for this player; the reward was applied.
    Rewarded {
        result: TournamentResult,
        player: Player,
        levels_gained: i64,
    },
    /// Placement already existed; the row was updated, no reward applied.
    Updated {
        result: TournamentResult,
        player: Player,
    },
}

impl ResultRecord {
    pub fn player(&self) -> &Player {
        match self {
            ResultRecord::Rewarded { player, .. } | ResultRecord::Updated { player, .. } => player,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Membership, Tournament, TournamentStatus, admit, release};
    use crate::error::ProgressionError;

    fn tournament(max_participants: i64) -> Tournament {
        Tournament {
            id: 4,
            game_id: 1,
            name: "Spring Cup".to_owned(),
            description: String::new(),
            prize_pool: 0,
            status: TournamentStatus::Upcoming,
            start_date: 0,
            end_date: 0,
            max_participants,
        }
    }

    #[test]
    fn admits_below_capacity() {
        assert_eq!(
            admit(&tournament(2), 1, false).unwrap(),
            Membership::Joined { participants: 2 }
        );
    }

    #[test]
    fn rejects_at_capacity() {
        let err = admit(&tournament(2), 2, false).unwrap_err();
        assert!(matches!(
            err,
            ProgressionError::CapacityExceeded {
                tournament_id: 4,
                max_participants: 2
            }
        ));
    }

    #[test]
    fn existing_member_is_a_no_op_even_when_full() {
        let outcome = admit(&tournament(2), 2, true).unwrap();
        assert_eq!(outcome, Membership::AlreadyMember { participants: 2 });
        assert!(!outcome.changed());
    }

    #[test]
    fn leaving_only_shrinks_for_members() {
        assert_eq!(release(3, true), Membership::Left { participants: 2 });
        assert_eq!(release(3, false), Membership::NotMember { participants: 3 });
    }
}
