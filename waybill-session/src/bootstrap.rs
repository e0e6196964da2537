//! One-time bootstrap tokens
//!
//! An external flow (an emailed link, another app) can hand over a session by
//! opening a page with `?token=<jwt>`. The token is stored and immediately
//! removed from the visible URL so it does not linger in history or get
//! copied along with the link.

use crate::manager::{token_preview, SessionManager};
use tracing::{debug, info, warn};
use url::Url;
use waybill_core::{Identity, WaybillError, WaybillResult};

/// What happened to a URL on page load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOutcome {
    /// The URL to display: the input with the bootstrap parameter removed
    pub url: Url,
    /// Identity derived from a consumed token
    pub identity: Option<Identity>,
}

impl BootstrapOutcome {
    pub fn consumed(&self) -> bool {
        self.identity.is_some()
    }
}

/// Remove every `name` parameter from the query, keeping the others in
/// order. Returns the cleaned URL and the first value found.
pub fn strip_query_param(url: &Url, name: &str) -> (Url, Option<String>) {
    let mut value = None;
    let mut kept = Vec::new();
    for (key, val) in url.query_pairs() {
        if key == name {
            if value.is_none() {
                value = Some(val.into_owned());
            }
        } else {
            kept.push((key.into_owned(), val.into_owned()));
        }
    }

    let mut cleaned = url.clone();
    if value.is_none() {
        return (cleaned, None);
    }

    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    (cleaned, value)
}

impl SessionManager {
    /// Store a token passed in the page URL and return the cleaned URL.
    ///
    /// An empty or unusable token value is stripped without touching the
    /// session.
    pub fn consume_bootstrap_token(&self, url: &Url) -> WaybillResult<BootstrapOutcome> {
        let (cleaned, token) = strip_query_param(url, &self.config().bootstrap_param);

        let identity = match token.as_deref() {
            Some(token) if !token.trim().is_empty() => match self.store_token(token) {
                Ok(identity) => {
                    info!(
                        path = cleaned.path(),
                        token = %token_preview(token),
                        "Consumed bootstrap token"
                    );
                    Some(identity)
                }
                Err(WaybillError::Validation { message, .. }) => {
                    warn!(path = cleaned.path(), %message, "Ignoring unusable bootstrap token");
                    None
                }
                Err(e) => return Err(e),
            },
            Some(_) => {
                debug!(path = cleaned.path(), "Ignoring empty bootstrap token");
                None
            }
            None => None,
        };

        Ok(BootstrapOutcome {
            url: cleaned,
            identity,
        })
    }
}
