//! Navigation cookie mirroring the bearer token
//!
//! Plain page navigations cannot carry an Authorization header, so the token
//! also travels as a same-site cookie scoped to the whole site.

use chrono::{DateTime, Duration, Utc};
use ::cookie::{time, Cookie, SameSite};
use serde::{Deserialize, Serialize};

/// Persisted description of the cookie, stored inside the session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieMirror {
    pub name: String,
    pub value: String,
    pub path: String,
    pub expires_at: DateTime<Utc>,
}

impl CookieMirror {
    pub fn new(name: &str, value: &str, max_age_secs: i64) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            expires_at: Utc::now() + Duration::seconds(max_age_secs),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// The cookie as it should be handed to a cookie jar, with the remaining
    /// lifetime as its max-age
    pub fn to_cookie(&self) -> Cookie<'static> {
        let remaining = (self.expires_at - Utc::now()).num_seconds().max(0);
        Cookie::build((self.name.clone(), self.value.clone()))
            .path(self.path.clone())
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(remaining))
            .build()
    }

    /// A cookie that removes `name` from any jar it is added to
    pub fn removal(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new()))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(time::Duration::ZERO)
            .build()
    }
}
