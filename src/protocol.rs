//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Wire casing is camelCase (`visitorId`, `newlyCompleted`, ...); challenge
//! sets serialize straight from the domain structs, which carry the same
//! renames as the persisted shape.

use serde::{Deserialize, Serialize};

use crate::domain::{DailyChallengeSet, ProgressUpdate};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// Read-only lookup of today's set; no creation side effect.
    DailyChallenges {
        #[serde(rename = "visitorId")]
        visitor_id: String,
    },
    /// Get-or-create for today's set.
    GenerateChallenges {
        #[serde(rename = "visitorId")]
        visitor_id: String,
    },
    UpdateProgress {
        #[serde(rename = "visitorId")]
        visitor_id: String,
        updates: Vec<ProgressUpdate>,
    },
    ClaimBonus {
        #[serde(rename = "visitorId")]
        visitor_id: String,
    },
    History {
        #[serde(rename = "visitorId")]
        visitor_id: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    Streak {
        #[serde(rename = "visitorId")]
        visitor_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    /// Reply to both DailyChallenges (set may be null) and
    /// GenerateChallenges (set always present).
    DailyChallenges {
        set: Option<DailyChallengeSet>,
    },
    Progress {
        #[serde(rename = "newlyCompleted")]
        newly_completed: Vec<String>,
        #[serde(rename = "allCompleted")]
        all_completed: bool,
    },
    Bonus {
        success: bool,
        bonus: u32,
    },
    History {
        sets: Vec<DailyChallengeSet>,
    },
    Streak {
        streak: u32,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct VisitorQuery {
    #[serde(rename = "visitorId")]
    pub visitor_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "visitorId")]
    pub visitor_id: String,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct GenerateIn {
    #[serde(rename = "visitorId")]
    pub visitor_id: String,
}

#[derive(Deserialize)]
pub struct ProgressIn {
    #[serde(rename = "visitorId")]
    pub visitor_id: String,
    pub updates: Vec<ProgressUpdate>,
}
#[derive(Serialize)]
pub struct ProgressOut {
    #[serde(rename = "newlyCompleted")]
    pub newly_completed: Vec<String>,
    #[serde(rename = "allCompleted")]
    pub all_completed: bool,
}

#[derive(Deserialize)]
pub struct ClaimIn {
    #[serde(rename = "visitorId")]
    pub visitor_id: String,
}
#[derive(Serialize)]
pub struct ClaimOut {
    pub success: bool,
    pub bonus: u32,
}

#[derive(Serialize)]
pub struct StreakOut {
    pub streak: u32,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
