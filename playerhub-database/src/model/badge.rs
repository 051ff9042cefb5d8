use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub requirement: String,
}
