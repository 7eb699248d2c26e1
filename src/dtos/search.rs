//! Search DTOs

use serde::{Deserialize, Serialize};

/// One hit of the command search, tagged by `type`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchResultDTO {
    Event {
        id: i64,
        title: String,
        subtitle: Option<String>,
        date: String,
        location: Option<String>,
        href: String,
    },
    Person {
        id: String,
        title: String,
        subtitle: String,
        href: String,
    },
}
