use serde::{Deserialize, Serialize};

use super::ManagerId;

/// A league participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub id: ManagerId,
    pub username: String,
    pub team_name: String,
    pub short_team_name: String,
    /// Position in the rotating tiebreaker order; `None` until ranked.
    pub tiebreaker_rank: Option<i64>,
    pub slack_id: Option<String>,
    pub discord_id: Option<String>,
    pub is_league_manager: bool,
}

impl std::fmt::Display for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.username.is_empty() {
            write!(f, "{}", self.team_name)
        } else {
            write!(f, "{}", self.username)
        }
    }
}

/// Registration payload for a manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManager {
    pub username: String,
    pub team_name: String,
    pub short_team_name: String,
    #[serde(default)]
    pub tiebreaker_rank: Option<i64>,
    #[serde(default)]
    pub slack_id: Option<String>,
    #[serde(default)]
    pub discord_id: Option<String>,
    #[serde(default)]
    pub is_league_manager: bool,
}
