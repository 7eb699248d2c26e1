//! Query DTOs - query string parameters

use serde::{Deserialize, Serialize};

/// Which events `GET /events` returns
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventFilter {
    #[default]
    All,
    /// Events where the caller is invited and has not declined
    MyEvents,
    /// Events created by the caller
    Created,
    /// Events of the active WIP window
    #[serde(alias = "current-vip")]
    CurrentWip,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct EventsQuery {
    #[serde(default)]
    pub filter: EventFilter,
    #[serde(default)]
    pub search: Option<String>,
}

/// `?force=true` on destructive endpoints
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}
