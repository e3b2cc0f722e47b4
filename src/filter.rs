use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::Player;
use crate::value::{parse_million_bound, parse_value};

/// Inclusive bounds, each side optional. An inverted range simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: Copy> Bounds<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterState {
    #[serde(default)]
    pub position: BTreeSet<String>,
    #[serde(default)]
    pub age: Bounds<u32>,
    #[serde(default)]
    pub country: BTreeSet<String>,
    /// In millions.
    #[serde(default)]
    pub value: Bounds<f64>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
            && self.country.is_empty()
            && !self.age.is_active()
            && !self.value.is_active()
    }

    pub fn toggle_position(&mut self, position: &str) {
        toggle(&mut self.position, position);
    }

    pub fn toggle_country(&mut self, country: &str) {
        toggle(&mut self.country, country);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Short labels for the active dimensions, e.g. `Age: 18-∞`.
    pub fn active_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        for pos in &self.position {
            labels.push(format!("Position: {pos}"));
        }
        for country in &self.country {
            labels.push(format!("Country: {country}"));
        }
        if self.age.is_active() {
            labels.push(format!(
                "Age: {}-{}",
                self.age.min.unwrap_or(0),
                self.age.max.map(|v| v.to_string()).unwrap_or_else(|| "∞".to_string())
            ));
        }
        if self.value.is_active() {
            labels.push(format!(
                "Value: {}M€-{}",
                self.value.min.unwrap_or(0.0),
                self.value
                    .max
                    .map(|v| format!("{v}M€"))
                    .unwrap_or_else(|| "∞".to_string())
            ));
        }
        labels
    }
}

fn toggle(set: &mut BTreeSet<String>, item: &str) {
    if !set.remove(item) {
        set.insert(item.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Domains {
    pub positions: Vec<String>,
    pub countries: Vec<String>,
}

pub fn derive_domains(players: &[Player]) -> Domains {
    let positions: BTreeSet<&str> = players.iter().map(|p| p.position.as_str()).collect();
    let countries: BTreeSet<&str> = players.iter().map(|p| p.nationality.as_str()).collect();
    Domains {
        positions: positions.into_iter().map(str::to_string).collect(),
        countries: countries.into_iter().map(str::to_string).collect(),
    }
}

pub fn apply_filters(players: &[Player], state: &FilterState) -> Vec<Player> {
    players
        .iter()
        .filter(|p| matches_filters(p, state))
        .cloned()
        .collect()
}

pub fn matches_filters(player: &Player, state: &FilterState) -> bool {
    if !state.position.is_empty() && !state.position.contains(&player.position) {
        return false;
    }

    if state.age.is_active() {
        let Some(age) = player.age else {
            return false;
        };
        if state.age.min.is_some_and(|min| age < min) {
            return false;
        }
        if state.age.max.is_some_and(|max| age > max) {
            return false;
        }
    }

    if !state.country.is_empty() && !state.country.contains(&player.nationality) {
        return false;
    }

    if state.value.is_active() {
        let raw = Some(player.value.as_str()).filter(|v| !v.is_empty());
        let value = parse_value(raw);
        if value.is_nan() {
            return false;
        }
        if state.value.min.is_some_and(|min| value < parse_million_bound(min)) {
            return false;
        }
        if state.value.max.is_some_and(|max| value > parse_million_bound(max)) {
            return false;
        }
    }

    true
}

type Subscriber = Box<dyn FnMut(&[Player])>;

/// Holds the current players and filters and publishes the filtered list to a
/// single subscriber whenever it changes.
pub struct FilterEngine {
    players: Vec<Player>,
    state: FilterState,
    published: Option<Vec<Player>>,
    subscriber: Option<Subscriber>,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEngine {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            state: FilterState::default(),
            published: None,
            subscriber: None,
        }
    }

    /// Replaces any previous subscriber. The new one receives the current
    /// result immediately if one has been computed.
    pub fn subscribe(&mut self, mut callback: impl FnMut(&[Player]) + 'static) {
        if let Some(current) = self.published.as_deref() {
            callback(current);
        }
        self.subscriber = Some(Box::new(callback));
    }

    pub fn unsubscribe(&mut self) {
        self.subscriber = None;
    }

    pub fn set_players(&mut self, players: Vec<Player>) {
        self.players = players;
        self.recompute();
    }

    pub fn set_filters(&mut self, state: FilterState) {
        self.state = state;
        self.recompute();
    }

    pub fn update_filters(&mut self, edit: impl FnOnce(&mut FilterState)) {
        edit(&mut self.state);
        self.recompute();
    }

    pub fn filters(&self) -> &FilterState {
        &self.state
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn filtered(&self) -> &[Player] {
        self.published.as_deref().unwrap_or(&[])
    }

    pub fn domains(&self) -> Domains {
        derive_domains(&self.players)
    }

    fn recompute(&mut self) {
        let next = apply_filters(&self.players, &self.state);
        if self.published.as_ref() == Some(&next) {
            return;
        }
        if let Some(callback) = self.subscriber.as_mut() {
            callback(&next);
        }
        self.published = Some(next);
    }
}
