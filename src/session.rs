use std::cell::RefCell;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::local_store::{LocalStore, clear_record, read_record, write_record};
use crate::model::{RecordKind, User};
use crate::remote::AuthApi;

/// Owns the bearer token (persisted in the local store) and the signed-in user.
pub struct Session<'a> {
    store: &'a dyn LocalStore,
    auth: &'a dyn AuthApi,
    user: RefCell<Option<User>>,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a dyn LocalStore, auth: &'a dyn AuthApi) -> Self {
        Self {
            store,
            auth,
            user: RefCell::new(None),
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let resp = self.auth.login(email, password)?;
        self.set_token(&resp.token);
        info!(user = %resp.user.id, "logged in");
        self.user.replace(Some(resp.user.clone()));
        Ok(resp.user)
    }

    pub fn register(&self, email: &str, password: &str, username: &str) -> Result<User, AuthError> {
        let resp = self.auth.register(email, password, username)?;
        self.set_token(&resp.token);
        info!(user = %resp.user.id, "registered");
        self.user.replace(Some(resp.user.clone()));
        Ok(resp.user)
    }

    pub fn logout(&self) {
        clear_record(self.store, RecordKind::AuthToken);
        self.user.replace(None);
    }

    /// Raw stored token, without any validity check.
    pub fn token(&self) -> Option<String> {
        read_record::<String>(self.store, RecordKind::AuthToken).filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_ok()
    }

    /// Token for an authorized call. A token that cannot be decoded or has
    /// expired ends the session.
    pub fn bearer(&self) -> Result<String, AuthError> {
        let Some(token) = self.token() else {
            return Err(AuthError::NotAuthenticated);
        };
        match token_expiry(&token) {
            Some(exp) if exp > Utc::now().timestamp() => Ok(token),
            Some(_) => {
                warn!("auth token expired, logging out");
                self.logout();
                Err(AuthError::NotAuthenticated)
            }
            None => {
                warn!("auth token could not be decoded, logging out");
                self.logout();
                Err(AuthError::NotAuthenticated)
            }
        }
    }

    /// Cached user if known, otherwise asks the backend. Any failure logs out.
    pub fn current_user(&self) -> Result<User, AuthError> {
        if let Some(user) = self.user.borrow().clone() {
            return Ok(user);
        }
        let token = self.bearer()?;
        match self.auth.me(&token) {
            Ok(user) => {
                self.user.replace(Some(user.clone()));
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "session check failed, logging out");
                self.logout();
                Err(AuthError::NotAuthenticated)
            }
        }
    }

    pub fn user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    fn set_token(&self, token: &str) {
        write_record(self.store, RecordKind::AuthToken, &token);
    }
}

/// `exp` claim (unix seconds) of a JWT-shaped token.
pub fn token_expiry(token: &str) -> Option<i64> {
    #[derive(Deserialize)]
    struct Claims {
        exp: f64,
    }

    let payload = token.split('.').nth(1)?;
    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    Some(claims.exp as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn reads_exp_claim() {
        assert_eq!(token_expiry(&token_with(r#"{"exp":1700000000}"#)), Some(1_700_000_000));
    }

    #[test]
    fn garbage_has_no_expiry() {
        assert_eq!(token_expiry("not-a-jwt"), None);
        assert_eq!(token_expiry(&token_with(r#"{"sub":"1"}"#)), None);
        assert_eq!(token_expiry("a.%%%.c"), None);
    }
}
