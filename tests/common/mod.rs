#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use scout_xi::error::RemoteError;
use scout_xi::local_store::{MemoryStore, read_record};
use scout_xi::model::{Formation, Player, RecordKind, User};
use scout_xi::remote::{AuthApi, AuthResponse, PlayerDirectory, RemoteStore};

pub fn player(id: &str, position: &str, age: u32, nationality: &str, value: &str) -> Player {
    Player {
        id: id.to_string(),
        name: format!("Player {id}"),
        position: position.to_string(),
        age: Some(age),
        nationality: nationality.to_string(),
        value: value.to_string(),
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        username: Some(format!("user{id}")),
    }
}

pub fn token_expiring_at(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}

pub fn valid_token() -> String {
    token_expiring_at(chrono::Utc::now().timestamp() + 3600)
}

fn unavailable() -> RemoteError {
    RemoteError::Status {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

/// Auth backend that hands out a fixed token.
pub struct FakeAuth {
    pub token: String,
    pub user: User,
    pub me_fails: Cell<bool>,
    pub logins: Cell<usize>,
}

impl FakeAuth {
    pub fn new(token: String) -> Self {
        Self {
            token,
            user: user("u1"),
            me_fails: Cell::new(false),
            logins: Cell::new(0),
        }
    }
}

impl AuthApi for FakeAuth {
    fn login(&self, email: &str, password: &str) -> Result<AuthResponse, RemoteError> {
        self.logins.set(self.logins.get() + 1);
        if password != "secret" {
            return Err(RemoteError::Status {
                status: 401,
                message: format!("Invalid credentials for {email}"),
            });
        }
        Ok(AuthResponse {
            token: self.token.clone(),
            user: self.user.clone(),
        })
    }

    fn register(
        &self,
        email: &str,
        _password: &str,
        username: &str,
    ) -> Result<AuthResponse, RemoteError> {
        Ok(AuthResponse {
            token: self.token.clone(),
            user: User {
                id: "u2".to_string(),
                email: email.to_string(),
                username: Some(username.to_string()),
            },
        })
    }

    fn me(&self, token: &str) -> Result<User, RemoteError> {
        if self.me_fails.get() || token != self.token {
            return Err(RemoteError::Status {
                status: 401,
                message: "Unauthorized".to_string(),
            });
        }
        Ok(self.user.clone())
    }
}

/// In-memory stand-in for `/api/storage/*` that can be switched offline.
#[derive(Default)]
pub struct FakeRemote {
    pub offline: Cell<bool>,
    pub favorites: RefCell<Vec<Player>>,
    pub formation: RefCell<Formation>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeRemote {
    pub fn offline() -> Self {
        let remote = Self::default();
        remote.offline.set(true);
        remote
    }

    fn enter(&self, call: String) -> Result<(), RemoteError> {
        self.calls.borrow_mut().push(call);
        if self.offline.get() {
            return Err(unavailable());
        }
        Ok(())
    }
}

impl RemoteStore for FakeRemote {
    fn fetch_favorites(&self, _token: &str, user_id: &str) -> Result<Vec<Player>, RemoteError> {
        self.enter(format!("GET favorites/{user_id}"))?;
        Ok(self.favorites.borrow().clone())
    }

    fn add_favorite(&self, _token: &str, user_id: &str, player: &Player) -> Result<(), RemoteError> {
        self.enter(format!("POST favorites/{user_id}"))?;
        let mut favorites = self.favorites.borrow_mut();
        if !favorites.iter().any(|p| p.id == player.id) {
            favorites.push(player.clone());
        }
        Ok(())
    }

    fn remove_favorite(
        &self,
        _token: &str,
        user_id: &str,
        player_id: &str,
    ) -> Result<(), RemoteError> {
        self.enter(format!("DELETE favorites/{user_id}/{player_id}"))?;
        self.favorites.borrow_mut().retain(|p| p.id != player_id);
        Ok(())
    }

    fn fetch_formation(&self, _token: &str, user_id: &str) -> Result<Formation, RemoteError> {
        self.enter(format!("GET formation/{user_id}"))?;
        Ok(self.formation.borrow().clone())
    }

    fn save_formation(
        &self,
        _token: &str,
        user_id: &str,
        formation: &Formation,
    ) -> Result<(), RemoteError> {
        self.enter(format!("PUT formation/{user_id}"))?;
        *self.formation.borrow_mut() = formation.clone();
        Ok(())
    }
}

/// Player directory that records which endpoint was used.
#[derive(Default)]
pub struct FakeDirectory {
    pub players: Vec<Player>,
    pub calls: RefCell<Vec<String>>,
}

impl PlayerDirectory for FakeDirectory {
    fn search(&self, query: &str) -> Result<Vec<Player>, RemoteError> {
        self.calls.borrow_mut().push(format!("search:{query}"));
        let needle = query.to_lowercase();
        Ok(self
            .players
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn player(&self, player_id: &str) -> Result<Player, RemoteError> {
        self.calls.borrow_mut().push(format!("player:{player_id}"));
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .cloned()
            .ok_or(RemoteError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    fn similar(&self, player_id: &str) -> Result<Vec<Player>, RemoteError> {
        self.calls.borrow_mut().push(format!("similar:{player_id}"));
        Ok(self
            .players
            .iter()
            .filter(|p| p.id != player_id)
            .cloned()
            .collect())
    }
}

/// Remote that records what the local store held at the moment each write
/// arrived, so tests can tell local-then-remote from remote-then-local.
pub struct LocalFirstRemote<'s> {
    pub store: &'s MemoryStore,
    pub seen_favorites: RefCell<Vec<Vec<Player>>>,
    pub seen_formation: RefCell<Vec<Formation>>,
}

impl<'s> LocalFirstRemote<'s> {
    pub fn new(store: &'s MemoryStore) -> Self {
        Self {
            store,
            seen_favorites: RefCell::default(),
            seen_formation: RefCell::default(),
        }
    }

    fn snapshot_favorites(&self) {
        let local = read_record(self.store, RecordKind::Favorites).unwrap_or_default();
        self.seen_favorites.borrow_mut().push(local);
    }
}

impl RemoteStore for LocalFirstRemote<'_> {
    fn fetch_favorites(&self, _token: &str, _user_id: &str) -> Result<Vec<Player>, RemoteError> {
        Err(unavailable())
    }

    fn add_favorite(&self, _token: &str, _user_id: &str, _player: &Player) -> Result<(), RemoteError> {
        self.snapshot_favorites();
        Ok(())
    }

    fn remove_favorite(
        &self,
        _token: &str,
        _user_id: &str,
        _player_id: &str,
    ) -> Result<(), RemoteError> {
        self.snapshot_favorites();
        Ok(())
    }

    fn fetch_formation(&self, _token: &str, _user_id: &str) -> Result<Formation, RemoteError> {
        Err(unavailable())
    }

    fn save_formation(
        &self,
        _token: &str,
        _user_id: &str,
        _formation: &Formation,
    ) -> Result<(), RemoteError> {
        let local = read_record(self.store, RecordKind::Formation).unwrap_or_default();
        self.seen_formation.borrow_mut().push(local);
        Ok(())
    }
}
