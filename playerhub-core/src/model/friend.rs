use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProgressionError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl FriendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendStatus::Pending => "pending",
            FriendStatus::Accepted => "accepted",
            FriendStatus::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, FriendStatus::Pending)
    }
}

impl fmt::Display for FriendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendStatus {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(FriendStatus::Pending),
            "accepted" => Ok(FriendStatus::Accepted),
            "declined" => Ok(FriendStatus::Declined),
            other => Err(format!("unknown friend request status `{other}`")),
        }
    }
}

/// What the addressee decided to do with a pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FriendDecision {
    Accept,
    Decline,
}

impl FriendDecision {
    pub fn target(&self) -> FriendStatus {
        match self {
            FriendDecision::Accept => FriendStatus::Accepted,
            FriendDecision::Decline => FriendStatus::Declined,
        }
    }
}

impl FromStr for FriendDecision {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(FriendDecision::Accept),
            "decline" => Ok(FriendDecision::Decline),
            other => Err(format!("unknown friend request action `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: i64,
    pub from_player: i64,
    pub to_player: i64,
    pub status: FriendStatus,
    pub created_at: u64,
}

impl FriendRequest {
    /// Move a pending request to its terminal state.
    pub fn resolve(&mut self, decision: FriendDecision) -> Result<()> {
        let target = decision.target();
        if self.status.is_terminal() {
            return Err(ProgressionError::InvalidTransition {
                request_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FriendDecision, FriendRequest, FriendStatus};
    use crate::error::ProgressionError;

    fn pending() -> FriendRequest {
        FriendRequest {
            id: 9,
            from_player: 1,
            to_player: 2,
            status: FriendStatus::Pending,
            created_at: 0,
        }
    }

    #[test]
    fn pending_can_be_accepted_or_declined() {
        let mut accepted = pending();
        accepted.resolve(FriendDecision::Accept).unwrap();
        assert_eq!(accepted.status, FriendStatus::Accepted);

        let mut declined = pending();
        declined.resolve(FriendDecision::Decline).unwrap();
        assert_eq!(declined.status, FriendStatus::Declined);
    }

    #[test]
    fn terminal_states_reject_new_decisions() {
        let mut request = pending();
        request.resolve(FriendDecision::Accept).unwrap();

        for decision in [FriendDecision::Accept, FriendDecision::Decline] {
            let err = request.resolve(decision).unwrap_err();
            assert!(matches!(
                err,
                ProgressionError::InvalidTransition {
                    request_id: 9,
                    from: FriendStatus::Accepted,
                    ..
                }
            ));
            assert_eq!(request.status, FriendStatus::Accepted);
        }
    }

    #[test]
    fn statuses_round_trip_through_text() {
        for status in [
            FriendStatus::Pending,
            FriendStatus::Accepted,
            FriendStatus::Declined,
        ] {
            assert_eq!(status.as_str().parse::<FriendStatus>(), Ok(status));
        }
        assert_eq!("ACCEPT".parse::<FriendDecision>(), Ok(FriendDecision::Accept));
    }
}
