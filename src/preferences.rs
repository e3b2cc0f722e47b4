use serde::{Deserialize, Serialize};

use crate::filter::FilterState;
use crate::local_store::{LocalStore, read_record, write_record};
use crate::model::RecordKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Name,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Search,
    Favorites,
    Team,
}

/// UI preferences. Local only, never sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Preferences {
    #[serde(default)]
    pub search_mode: SearchMode,
    #[serde(default)]
    pub tab: Tab,
    #[serde(default)]
    pub favorites_filter: FilterState,
}

impl Preferences {
    pub fn load(store: &dyn LocalStore) -> Self {
        read_record(store, RecordKind::Preferences).unwrap_or_default()
    }

    pub fn save(&self, store: &dyn LocalStore) {
        write_record(store, RecordKind::Preferences, self);
    }
}
