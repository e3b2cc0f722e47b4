use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::info;

use crate::filter::{Bounds, Domains, FilterEngine, FilterState};
use crate::formation::{FormationTracker, Placement};
use crate::model::{Coordinate, Player, User, contains_player};
use crate::preferences::{Preferences, SearchMode, Tab};
use crate::search::SearchResolver;
use crate::sync::{SyncCoordinator, Synced};

pub const PITCH_WIDTH: f64 = 600.0;
pub const PITCH_HEIGHT: f64 = 400.0;
pub const CURSOR_STEP: f64 = 10.0;
/// Favorites are stored locally under this id when nobody is signed in.
pub const GUEST_USER_ID: &str = "guest";

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Query,
    AgeMin,
    AgeMax,
    ValueMin,
    ValueMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoritesFocus {
    List,
    Filters,
}

/// One selectable row of the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facet {
    Position(String),
    Country(String),
}

pub struct AppState {
    pub tab: Tab,
    pub search_mode: SearchMode,
    pub query: String,
    pub editing: Option<EditField>,
    pub input: String,
    pub results: Vec<Player>,
    pub results_title: String,
    pub results_selected: usize,
    pub favorites: Vec<Player>,
    pub favorites_selected: usize,
    pub favorites_focus: FavoritesFocus,
    pub facet_selected: usize,
    pub team_selected: usize,
    pub cursor: Coordinate,
    pub formation: FormationTracker,
    pub notice: Option<String>,
    pub logs: VecDeque<String>,
    pub user: Option<User>,
    pub loading: bool,
    pub should_quit: bool,
    filter: FilterEngine,
    filtered: Rc<RefCell<Vec<Player>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

impl AppState {
    pub fn new(prefs: Preferences) -> Self {
        let filtered = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&filtered);
        let mut filter = FilterEngine::new();
        filter.subscribe(move |players| {
            *sink.borrow_mut() = players.to_vec();
        });
        filter.set_filters(prefs.favorites_filter);

        Self {
            tab: prefs.tab,
            search_mode: prefs.search_mode,
            query: String::new(),
            editing: None,
            input: String::new(),
            results: Vec::new(),
            results_title: "Results".to_string(),
            results_selected: 0,
            favorites: Vec::new(),
            favorites_selected: 0,
            favorites_focus: FavoritesFocus::List,
            facet_selected: 0,
            team_selected: 0,
            cursor: Coordinate::new(PITCH_WIDTH / 2.0, PITCH_HEIGHT / 2.0),
            formation: FormationTracker::default(),
            notice: None,
            logs: VecDeque::new(),
            user: None,
            loading: false,
            should_quit: false,
            filter,
            filtered,
        }
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            search_mode: self.search_mode,
            tab: self.tab,
            favorites_filter: self.filter.filters().clone(),
        }
    }

    pub fn user_id(&self) -> &str {
        self.user.as_ref().map(|u| u.id.as_str()).unwrap_or(GUEST_USER_ID)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.push_log(format!("[WARN] {msg}"));
        self.notice = Some(msg);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn toggle_search_mode(&mut self) {
        self.search_mode = match self.search_mode {
            SearchMode::Name => SearchMode::Url,
            SearchMode::Url => SearchMode::Name,
        };
    }

    // ----- data loading -----

    pub fn load_user_data(&mut self, sync: &SyncCoordinator<'_>) {
        self.loading = true;
        let user_id = self.user_id().to_string();
        let (favorites, formation) = sync.sync_all(&user_id);

        let mut offline = false;
        for err in [favorites.error(), formation.error()].into_iter().flatten() {
            if !err.is_unauthorized() {
                offline = true;
            }
            self.push_log(format!("[INFO] Using local data: {err}"));
        }
        self.set_favorites(favorites.into_value());
        self.formation.replace(formation.into_value());
        if offline {
            self.set_notice("Could not load your data from the server, showing the saved copy");
        }
        self.loading = false;
    }

    pub fn set_favorites(&mut self, favorites: Vec<Player>) {
        self.favorites = favorites.clone();
        self.filter.set_players(favorites);
        self.clamp_selection();
    }

    // ----- search -----

    pub fn run_search(&mut self, resolver: &SearchResolver<'_>) {
        if self.query.trim().is_empty() {
            return;
        }
        self.dismiss_notice();
        self.loading = true;
        match resolver.search(&self.query) {
            Ok(players) => {
                self.push_log(format!("[INFO] {} result(s) for '{}'", players.len(), self.query.trim()));
                self.results = players;
                self.results_title = "Results".to_string();
                self.results_selected = 0;
            }
            Err(err) => self.set_notice(err.to_string()),
        }
        self.loading = false;
    }

    pub fn show_similar(&mut self, resolver: &SearchResolver<'_>) {
        let Some(player) = self.results.get(self.results_selected).cloned() else {
            return;
        };
        self.dismiss_notice();
        match resolver.similar(&player.id) {
            Ok(players) => {
                self.results = players;
                self.results_title = format!("Similar to {}", player.name);
                self.results_selected = 0;
            }
            Err(err) => self.set_notice(err.to_string()),
        }
    }

    pub fn selected_result(&self) -> Option<&Player> {
        self.results.get(self.results_selected)
    }

    pub fn is_favorite(&self, player_id: &str) -> bool {
        contains_player(&self.favorites, player_id)
    }

    // ----- favorites -----

    pub fn add_selected_favorite(&mut self, sync: &SyncCoordinator<'_>) {
        let Some(player) = self.selected_result().cloned() else {
            return;
        };
        if self.is_favorite(&player.id) {
            return;
        }
        let outcome = sync.add_favorite(self.user_id(), &player);
        self.apply_favorites_outcome(outcome, "Could not add favorite to the server");
        info!(player = %player.id, "favorite added");
    }

    pub fn remove_selected_favorite(&mut self, sync: &SyncCoordinator<'_>) {
        let Some(player) = self.filtered_favorites().get(self.favorites_selected).cloned() else {
            return;
        };
        let outcome = sync.remove_favorite(self.user_id(), &player.id);
        self.apply_favorites_outcome(outcome, "Could not remove favorite from the server");
    }

    fn apply_favorites_outcome(&mut self, outcome: Synced<Vec<Player>>, message: &str) {
        let failed = outcome.error().filter(|err| !err.is_unauthorized()).is_some();
        if let Some(err) = outcome.error() {
            self.push_log(format!("[INFO] Favorites kept locally: {err}"));
        }
        self.set_favorites(outcome.into_value());
        if failed {
            self.set_notice(message);
        }
    }

    /// Favorites that pass the current filters, as last published by the engine.
    pub fn filtered_favorites(&self) -> Vec<Player> {
        self.filtered.borrow().clone()
    }

    pub fn filters(&self) -> &FilterState {
        self.filter.filters()
    }

    pub fn domains(&self) -> Domains {
        self.filter.domains()
    }

    pub fn facets(&self) -> Vec<Facet> {
        let domains = self.domains();
        domains
            .positions
            .into_iter()
            .map(Facet::Position)
            .chain(domains.countries.into_iter().map(Facet::Country))
            .collect()
    }

    pub fn toggle_selected_facet(&mut self) {
        let Some(facet) = self.facets().into_iter().nth(self.facet_selected) else {
            return;
        };
        self.filter.update_filters(|state| match &facet {
            Facet::Position(pos) => state.toggle_position(pos),
            Facet::Country(country) => state.toggle_country(country),
        });
        self.clamp_selection();
    }

    pub fn clear_filters(&mut self) {
        self.filter.update_filters(FilterState::clear);
        self.clamp_selection();
    }

    pub fn set_age_bounds(&mut self, bounds: Bounds<u32>) {
        self.filter.update_filters(|state| state.age = bounds);
        self.clamp_selection();
    }

    pub fn set_value_bounds(&mut self, bounds: Bounds<f64>) {
        self.filter.update_filters(|state| state.value = bounds);
        self.clamp_selection();
    }

    // ----- text input -----

    pub fn begin_edit(&mut self, field: EditField) {
        self.input = match field {
            EditField::Query => self.query.clone(),
            EditField::AgeMin => opt_to_string(self.filters().age.min),
            EditField::AgeMax => opt_to_string(self.filters().age.max),
            EditField::ValueMin => opt_to_string(self.filters().value.min),
            EditField::ValueMax => opt_to_string(self.filters().value.max),
        };
        self.editing = Some(field);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.input.clear();
    }

    /// Applies the input buffer to the edited field. Returns the field that
    /// was committed so the caller can react (e.g. run the search).
    pub fn commit_edit(&mut self) -> Option<EditField> {
        let field = self.editing.take()?;
        let raw = std::mem::take(&mut self.input);
        let trimmed = raw.trim();
        match field {
            EditField::Query => self.query = raw,
            EditField::AgeMin | EditField::AgeMax => {
                let Ok(value) = parse_optional::<u32>(trimmed) else {
                    self.set_notice(format!("'{trimmed}' is not a valid age"));
                    return None;
                };
                let mut bounds = self.filters().age;
                if field == EditField::AgeMin {
                    bounds.min = value;
                } else {
                    bounds.max = value;
                }
                self.set_age_bounds(bounds);
            }
            EditField::ValueMin | EditField::ValueMax => {
                let value = match parse_optional::<f64>(trimmed) {
                    Ok(value) if value.is_none_or(f64::is_finite) => value,
                    _ => {
                        self.set_notice(format!("'{trimmed}' is not a valid amount"));
                        return None;
                    }
                };
                let mut bounds = self.filters().value;
                if field == EditField::ValueMin {
                    bounds.min = value;
                } else {
                    bounds.max = value;
                }
                self.set_value_bounds(bounds);
            }
        }
        Some(field)
    }

    // ----- team builder -----

    pub fn move_cursor(&mut self, dx: f64, dy: f64) {
        self.cursor.x = (self.cursor.x + dx).clamp(0.0, PITCH_WIDTH);
        self.cursor.y = (self.cursor.y + dy).clamp(0.0, PITCH_HEIGHT);
    }

    /// Drops the selected favorite at the pitch cursor and saves the formation.
    pub fn drop_selected_at_cursor(&mut self, sync: &SyncCoordinator<'_>) {
        let Some(player_id) = self.favorites.get(self.team_selected).map(|p| p.id.clone()) else {
            return;
        };
        self.formation.place_player(&player_id, self.cursor);
        self.save_formation(sync);
    }

    pub fn lift_selected(&mut self, sync: &SyncCoordinator<'_>) {
        let Some(player_id) = self.favorites.get(self.team_selected).map(|p| p.id.clone()) else {
            return;
        };
        if self.formation.remove_placement(&player_id).is_some() {
            self.save_formation(sync);
        }
    }

    fn save_formation(&mut self, sync: &SyncCoordinator<'_>) {
        let outcome = self.formation.save(sync, self.user_id());
        if let Some(err) = outcome.error() {
            self.push_log(format!("[INFO] Formation kept locally: {err}"));
        }
    }

    pub fn placements(&self) -> Vec<Placement<'_>> {
        self.formation.renderable_entries(&self.favorites)
    }

    // ----- selection -----

    pub fn select_next(&mut self) {
        let (selected, len) = self.selection_mut();
        if len > 0 && *selected + 1 < len {
            *selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        let (selected, _) = self.selection_mut();
        *selected = selected.saturating_sub(1);
    }

    fn selection_mut(&mut self) -> (&mut usize, usize) {
        match self.tab {
            Tab::Search => (&mut self.results_selected, self.results.len()),
            Tab::Favorites => match self.favorites_focus {
                FavoritesFocus::List => {
                    let len = self.filtered.borrow().len();
                    (&mut self.favorites_selected, len)
                }
                FavoritesFocus::Filters => {
                    let len = self.facets().len();
                    (&mut self.facet_selected, len)
                }
            },
            Tab::Team => (&mut self.team_selected, self.favorites.len()),
        }
    }

    pub fn clamp_selection(&mut self) {
        let filtered_len = self.filtered.borrow().len();
        let facets_len = self.facets().len();
        self.results_selected = clamp_index(self.results_selected, self.results.len());
        self.favorites_selected = clamp_index(self.favorites_selected, filtered_len);
        self.facet_selected = clamp_index(self.facet_selected, facets_len);
        self.team_selected = clamp_index(self.team_selected, self.favorites.len());
    }
}

fn clamp_index(idx: usize, len: usize) -> usize {
    if len == 0 { 0 } else { idx.min(len - 1) }
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_optional<T: std::str::FromStr>(raw: &str) -> Result<Option<T>, T::Err> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some)
}
