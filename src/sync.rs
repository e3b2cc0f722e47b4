//! Local-first synchronisation of favorites and formation.
//!
//! Reads prefer the server and refresh the local copy; writes land locally
//! before any network call. Remote failures are logged and answered with the
//! local value. Nothing is retried, so the two copies can drift apart until
//! the next successful read overwrites the local one.

use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::local_store::{LocalStore, read_record, write_record};
use crate::model::{Formation, Player, RecordKind};
use crate::remote::RemoteStore;
use crate::session::Session;

/// Outcome of a sync operation. Never an error: the value is always usable.
#[derive(Debug)]
pub enum Synced<T> {
    /// The remote confirmed (or supplied) this value.
    Remote(T),
    /// The remote was unavailable; this is the best local value.
    Local { value: T, error: RemoteError },
}

impl<T> Synced<T> {
    pub fn value(&self) -> &T {
        match self {
            Synced::Remote(value) | Synced::Local { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Synced::Remote(value) | Synced::Local { value, .. } => value,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Synced::Remote(_))
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            Synced::Remote(_) => None,
            Synced::Local { error, .. } => Some(error),
        }
    }
}

pub struct SyncCoordinator<'a> {
    store: &'a dyn LocalStore,
    remote: &'a dyn RemoteStore,
    session: &'a Session<'a>,
}

impl<'a> SyncCoordinator<'a> {
    pub fn new(
        store: &'a dyn LocalStore,
        remote: &'a dyn RemoteStore,
        session: &'a Session<'a>,
    ) -> Self {
        Self {
            store,
            remote,
            session,
        }
    }

    pub fn local_favorites(&self) -> Vec<Player> {
        read_record(self.store, RecordKind::Favorites).unwrap_or_default()
    }

    pub fn local_formation(&self) -> Formation {
        read_record(self.store, RecordKind::Formation).unwrap_or_default()
    }

    pub fn favorites(&self, user_id: &str) -> Synced<Vec<Player>> {
        let local = self.local_favorites();
        match self.authorized(|token| self.remote.fetch_favorites(token, user_id)) {
            Ok(server) => {
                debug!(count = server.len(), "favorites refreshed from server");
                write_record(self.store, RecordKind::Favorites, &server);
                Synced::Remote(server)
            }
            Err(error) => {
                warn!(error = %error, "fetching favorites failed, using local copy");
                Synced::Local {
                    value: local,
                    error,
                }
            }
        }
    }

    /// Appends the player locally (once per id) and then tells the server.
    pub fn add_favorite(&self, user_id: &str, player: &Player) -> Synced<Vec<Player>> {
        let mut updated = self.local_favorites();
        if !updated.iter().any(|p| p.id == player.id) {
            updated.push(player.clone());
        }
        write_record(self.store, RecordKind::Favorites, &updated);

        match self.authorized(|token| self.remote.add_favorite(token, user_id, player)) {
            Ok(()) => Synced::Remote(updated),
            Err(error) => {
                warn!(player = %player.id, error = %error, "adding favorite remotely failed");
                Synced::Local {
                    value: updated,
                    error,
                }
            }
        }
    }

    pub fn remove_favorite(&self, user_id: &str, player_id: &str) -> Synced<Vec<Player>> {
        let mut updated = self.local_favorites();
        updated.retain(|p| p.id != player_id);
        write_record(self.store, RecordKind::Favorites, &updated);

        match self.authorized(|token| self.remote.remove_favorite(token, user_id, player_id)) {
            Ok(()) => Synced::Remote(updated),
            Err(error) => {
                warn!(player = player_id, error = %error, "removing favorite remotely failed");
                Synced::Local {
                    value: updated,
                    error,
                }
            }
        }
    }

    pub fn formation(&self, user_id: &str) -> Synced<Formation> {
        let local = self.local_formation();
        match self.authorized(|token| self.remote.fetch_formation(token, user_id)) {
            Ok(server) => {
                write_record(self.store, RecordKind::Formation, &server);
                Synced::Remote(server)
            }
            Err(error) => {
                warn!(error = %error, "fetching formation failed, using local copy");
                Synced::Local {
                    value: local,
                    error,
                }
            }
        }
    }

    pub fn save_formation(&self, user_id: &str, formation: &Formation) -> Synced<Formation> {
        write_record(self.store, RecordKind::Formation, formation);

        match self.authorized(|token| self.remote.save_formation(token, user_id, formation)) {
            Ok(()) => Synced::Remote(formation.clone()),
            Err(error) => {
                warn!(error = %error, "saving formation remotely failed");
                Synced::Local {
                    value: formation.clone(),
                    error,
                }
            }
        }
    }

    /// Startup load of both record kinds.
    pub fn sync_all(&self, user_id: &str) -> (Synced<Vec<Player>>, Synced<Formation>) {
        (self.favorites(user_id), self.formation(user_id))
    }

    fn authorized<T>(
        &self,
        call: impl FnOnce(&str) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let token = self
            .session
            .bearer()
            .map_err(|_| RemoteError::NotAuthenticated)?;
        call(&token)
    }
}
