use reqwest::{StatusCode, Url};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RemoteError;
use crate::model::{Formation, Player, User};

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// `/api/auth/*`
pub trait AuthApi {
    fn login(&self, email: &str, password: &str) -> Result<AuthResponse, RemoteError>;
    fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<AuthResponse, RemoteError>;
    fn me(&self, token: &str) -> Result<User, RemoteError>;
}

/// `/api/search` and `/api/player/*`
pub trait PlayerDirectory {
    fn search(&self, query: &str) -> Result<Vec<Player>, RemoteError>;
    fn player(&self, player_id: &str) -> Result<Player, RemoteError>;
    fn similar(&self, player_id: &str) -> Result<Vec<Player>, RemoteError>;
}

/// `/api/storage/*`. Every call is authorized with the given bearer token.
pub trait RemoteStore {
    fn fetch_favorites(&self, token: &str, user_id: &str) -> Result<Vec<Player>, RemoteError>;
    fn add_favorite(&self, token: &str, user_id: &str, player: &Player)
    -> Result<(), RemoteError>;
    fn remove_favorite(&self, token: &str, user_id: &str, player_id: &str)
    -> Result<(), RemoteError>;
    fn fetch_formation(&self, token: &str, user_id: &str) -> Result<Formation, RemoteError>;
    fn save_formation(
        &self,
        token: &str,
        user_id: &str,
        formation: &Formation,
    ) -> Result<(), RemoteError>;
}

/// reqwest-backed client for the whole REST surface.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Joins path segments onto the base url, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let invalid = || RemoteError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, RemoteError> {
        let resp = req.send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, RemoteError> {
        let body = self.send(req)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

#[derive(Serialize)]
struct FavoriteBody<'a> {
    player: &'a Player,
}

impl AuthApi for ApiClient {
    fn login(&self, email: &str, password: &str) -> Result<AuthResponse, RemoteError> {
        debug!("POST /api/auth/login");
        let req = self.client.post(self.url(&["api", "auth", "login"])?).json(&Credentials {
            email,
            password,
            username: None,
        });
        self.get_json(req)
    }

    fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<AuthResponse, RemoteError> {
        debug!("POST /api/auth/register");
        let req = self
            .client
            .post(self.url(&["api", "auth", "register"])?)
            .json(&Credentials {
                email,
                password,
                username: Some(username),
            });
        self.get_json(req)
    }

    fn me(&self, token: &str) -> Result<User, RemoteError> {
        let req = self
            .client
            .get(self.url(&["api", "auth", "me"])?)
            .header(AUTHORIZATION, bearer(token));
        self.get_json(req)
    }
}

impl PlayerDirectory for ApiClient {
    fn search(&self, query: &str) -> Result<Vec<Player>, RemoteError> {
        debug!(query, "GET /api/search");
        let req = self
            .client
            .get(self.url(&["api", "search"])?)
            .query(&[("q", query)]);
        self.get_json(req)
    }

    fn player(&self, player_id: &str) -> Result<Player, RemoteError> {
        let req = self.client.get(self.url(&["api", "player", player_id])?);
        self.get_json(req)
    }

    fn similar(&self, player_id: &str) -> Result<Vec<Player>, RemoteError> {
        let req = self
            .client
            .get(self.url(&["api", "player", player_id, "similar"])?);
        self.get_json(req)
    }
}

impl RemoteStore for ApiClient {
    fn fetch_favorites(&self, token: &str, user_id: &str) -> Result<Vec<Player>, RemoteError> {
        let req = self
            .client
            .get(self.url(&["api", "storage", "favorites", user_id])?)
            .header(AUTHORIZATION, bearer(token));
        self.get_json(req)
    }

    fn add_favorite(
        &self,
        token: &str,
        user_id: &str,
        player: &Player,
    ) -> Result<(), RemoteError> {
        let req = self
            .client
            .post(self.url(&["api", "storage", "favorites", user_id])?)
            .header(AUTHORIZATION, bearer(token))
            .json(&FavoriteBody { player });
        self.send(req).map(|_| ())
    }

    fn remove_favorite(
        &self,
        token: &str,
        user_id: &str,
        player_id: &str,
    ) -> Result<(), RemoteError> {
        let req = self
            .client
            .delete(self.url(&["api", "storage", "favorites", user_id, player_id])?)
            .header(AUTHORIZATION, bearer(token));
        self.send(req).map(|_| ())
    }

    fn fetch_formation(&self, token: &str, user_id: &str) -> Result<Formation, RemoteError> {
        let req = self
            .client
            .get(self.url(&["api", "storage", "formation", user_id])?)
            .header(AUTHORIZATION, bearer(token));
        self.get_json(req)
    }

    fn save_formation(
        &self,
        token: &str,
        user_id: &str,
        formation: &Formation,
    ) -> Result<(), RemoteError> {
        let req = self
            .client
            .put(self.url(&["api", "storage", "formation", user_id])?)
            .header(AUTHORIZATION, bearer(token))
            .json(formation);
        self.send(req).map(|_| ())
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Prefers the backend's `{"message": ...}` body, else the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
