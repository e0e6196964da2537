//! The session manager
//!
//! One [`SessionManager`] per application context, passed around explicitly.
//! Token, identity and cookie mirror are persisted as a single record under
//! a single storage key, so they appear and disappear together.

use crate::claims::{decode_claims, TokenClaims};
use crate::cookie::CookieMirror;
use ::cookie::Cookie;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use waybill_core::{
    validation_error, AuthResponse, Identity, Role, SessionConfig, SessionStorage, WaybillResult,
};

use crate::storage::MemoryStorage;

/// Everything that makes up a signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub token: String,
    pub identity: Identity,
    pub cookie: CookieMirror,
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    storage: Arc<dyn SessionStorage>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn SessionStorage>, config: SessionConfig) -> Self {
        Self { storage, config }
    }

    /// A manager over fresh in-memory storage
    pub fn in_memory(config: SessionConfig) -> Self {
        Self::new(Arc::new(MemoryStorage::new()), config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Persist the result of a successful sign-in or sign-up.
    ///
    /// All six response fields must be present and non-empty, and the token
    /// must be sendable as a header. Otherwise nothing is written and the
    /// existing session, if any, is untouched. Values are stored as received.
    pub fn store_session(&self, response: &AuthResponse) -> WaybillResult<Identity> {
        let token = usable_token("accessToken", response.access_token.as_deref())?;
        let role = required("role", response.role.as_deref())?;
        let first_name = required("firstName", response.first_name.as_deref())?;
        let last_name = required("lastName", response.last_name.as_deref())?;
        let email = required("email", response.email.as_deref())?;
        let user_id = response
            .user_id
            .ok_or_else(|| {
                validation_error!("auth response is missing userId", "userId", "session")
            })?;

        let identity = Identity {
            user_id: Some(user_id),
            role: Some(Role::from(role)),
            display_name: Some(format!("{} {}", first_name, last_name)),
            email: Some(email.to_string()),
        };

        self.persist(token, identity.clone())?;
        info!(user_id, role, "Session stored");
        Ok(identity)
    }

    /// Persist a bare token, deriving the identity from its claims.
    ///
    /// A token whose claims cannot be decoded is still stored: the backend is
    /// the judge of its validity. The identity is then left empty.
    pub fn store_token(&self, token: &str) -> WaybillResult<Identity> {
        let token = usable_token("token", Some(token))?;

        let identity = match decode_claims(token) {
            Ok(claims) => claims.to_identity(),
            Err(e) => {
                warn!(
                    token = %token_preview(token),
                    error = %e,
                    "Token claims could not be decoded, storing token without identity"
                );
                Identity::default()
            }
        };

        self.persist(token, identity.clone())?;
        info!(user_id = ?identity.user_id, "Session stored from token");
        Ok(identity)
    }

    fn persist(&self, token: &str, identity: Identity) -> WaybillResult<()> {
        let record = SessionRecord {
            token: token.to_string(),
            identity,
            cookie: CookieMirror::new(
                &self.config.cookie_name,
                token,
                self.config.cookie_max_age_secs,
            ),
        };
        let json = serde_json::to_string(&record)?;
        self.storage.write(&self.config.storage_key, &json)
    }

    /// The stored record. Unreadable or corrupt storage reads as no session.
    pub fn record(&self) -> Option<SessionRecord> {
        let raw = match self.storage.read(&self.config.storage_key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Session storage unreadable, treating as signed out");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) if !record.token.is_empty() => Some(record),
            Ok(_) => {
                warn!("Stored session has an empty token, treating as signed out");
                None
            }
            Err(e) => {
                warn!(error = %e, "Stored session is corrupt, treating as signed out");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.record().map(|record| record.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.record().map(|record| record.identity)
    }

    /// Role from the stored identity. Never re-derived from the token.
    pub fn role(&self) -> Option<Role> {
        self.identity().and_then(|identity| identity.role)
    }

    /// Claims of the stored token, for display
    pub fn token_claims(&self) -> Option<TokenClaims> {
        let token = self.token()?;
        match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!(
                    token = %token_preview(&token),
                    error = %e,
                    "Stored token has no readable claims"
                );
                None
            }
        }
    }

    /// Cookie to present on plain page navigations, while it is still live
    pub fn navigation_cookie(&self) -> Option<Cookie<'static>> {
        self.record()
            .map(|record| record.cookie)
            .filter(|mirror| !mirror.is_expired())
            .map(|mirror| mirror.to_cookie())
    }

    /// Remove token, identity and cookie mirror. Safe to call when signed out.
    pub fn clear_session(&self) -> WaybillResult<()> {
        self.storage.remove(&self.config.storage_key)?;
        debug!("Session cleared");
        Ok(())
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> WaybillResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(validation_error!(
            format!("{} is missing or empty", field),
            field,
            "session"
        )),
    }
}

/// A non-blank token that can travel in an Authorization header
fn usable_token<'a>(field: &str, value: Option<&'a str>) -> WaybillResult<&'a str> {
    let token = required(field, value)?;
    if HeaderValue::from_str(&format!("Bearer {}", token)).is_err() {
        return Err(validation_error!(
            format!("{} contains characters that cannot be sent in a header", field),
            field,
            "session"
        ));
    }
    Ok(token)
}

/// First few characters of a token, safe for logs
pub(crate) fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}...", prefix)
}
