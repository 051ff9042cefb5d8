use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::player::Reward;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub game_id: i64,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub points: i64,
    pub experience_reward: i64,
}

impl Achievement {
    pub const DEFAULT_POINTS: i64 = 10;
    pub const DEFAULT_EXPERIENCE: i64 = 50;

    pub fn reward(&self) -> Reward {
        Reward {
            experience: self.experience_reward.max(0),
            points: self.points.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Difficulty;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" easy ".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert!("legendary".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }
}
