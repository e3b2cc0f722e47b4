use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub position: String,
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nationality: String,
    /// Display string as delivered by the backend, e.g. "10M €" or "500K €".
    /// Empty when the backend has no value for the player.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Pixel offset relative to the top-left corner of the pitch container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Formation {
    #[serde(default)]
    pub players: BTreeMap<String, Coordinate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Favorites,
    Formation,
    Preferences,
    AuthToken,
}

impl RecordKind {
    pub fn storage_key(self) -> &'static str {
        match self {
            RecordKind::Favorites => "football_app_favorites",
            RecordKind::Formation => "football_app_formation",
            RecordKind::Preferences => "football_app_preferences",
            RecordKind::AuthToken => "football_app_token",
        }
    }
}

pub fn contains_player(players: &[Player], player_id: &str) -> bool {
    players.iter().any(|p| p.id == player_id)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Float(f64),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Int(n)) => Some(n),
        Some(Raw::Float(n)) if n.is_finite() && n >= 0.0 => Some(n.trunc() as u32),
        Some(Raw::Text(s)) => leading_int(&s),
        _ => None,
    })
}

// Mirrors the usual "parse the leading integer" behaviour: "27 (1997)" -> 27.
fn leading_int(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
