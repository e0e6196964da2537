//! Unverified JWT claim decoding
//!
//! The client never checks signatures. Claims are display hints only: the
//! backend validates the token on every request, and the role used for
//! gating comes from the sign-in response, not from here.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use waybill_core::{ErrorContext, Identity, Role, WaybillError, WaybillResult};

/// The claims the delivery backend puts in its tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the user's email
    pub sub: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
    pub role: Option<String>,
    /// Expiry, seconds since the epoch
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Whether `exp` has passed. Tokens without `exp` never expire here.
    pub fn is_expired(&self) -> bool {
        self.expires_at()
            .map(|at| at <= Utc::now())
            .unwrap_or(false)
    }

    /// Identity built purely from the claims. Tokens carry no names.
    pub fn to_identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            role: self.role.as_deref().map(Role::from),
            display_name: None,
            email: self.sub.clone(),
        }
    }
}

/// Decode the claims of a compact JWT without verifying it.
///
/// Signature, expiry and audience are left to the backend.
pub fn decode_claims(token: &str) -> WaybillResult<TokenClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| claims_error(format!("token claims are unreadable: {}", e)))
}

fn claims_error(message: String) -> WaybillError {
    WaybillError::Claims {
        message,
        context: ErrorContext::new("claims").with_operation("decode"),
    }
}
