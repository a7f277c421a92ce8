use serde::{Deserialize, Serialize};

use super::{ManagerId, PlayerId};

/// An auctionable player and its settlement fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    /// Identifier from the league host the player list was imported from.
    pub external_id: String,
    pub name: String,
    pub team: String,
    pub position: String,
    pub hometown_discount: bool,
    /// `None` while the player is a free agent.
    pub owner: Option<ManagerId>,
    pub match_right_holder: Option<ManagerId>,
    pub contract_length: Option<i64>,
    pub salary: Option<i64>,
}

impl Player {
    pub fn is_free_agent(&self) -> bool {
        self.owner.is_none()
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.position, self.team)
    }
}

/// Import payload for a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub external_id: String,
    pub name: String,
    pub team: String,
    pub position: String,
    #[serde(default)]
    pub hometown_discount: bool,
    #[serde(default)]
    pub match_right_holder: Option<ManagerId>,
}
