//! Waybill Session - the single source of truth for "who is signed in and how
//! do we prove it to the backend"
//!
//! The [`SessionManager`] owns the bearer token and the identity derived from
//! it, persists both through a [`SessionStorage`](waybill_core::SessionStorage)
//! backend, mirrors the token into a navigation cookie, consumes one-time
//! bootstrap tokens from page URLs and computes role-based routing and view
//! visibility. [`AuthorizedClient`] is the one outbound HTTP path; it attaches
//! the token to every request through [`augment`].

pub mod bootstrap;
pub mod claims;
pub mod cookie;
pub mod interceptor;
pub mod manager;
pub mod navigation;
pub mod storage;
pub mod visibility;

pub use bootstrap::{strip_query_param, BootstrapOutcome};
pub use claims::{decode_claims, TokenClaims};
pub use self::cookie::CookieMirror;
pub use interceptor::{augment, AuthorizedClient};
pub use manager::{SessionManager, SessionRecord};
pub use navigation::{paths, redirect_target_for_role, requires_authentication, PageLoad};
pub use storage::{FileStorage, MemoryStorage};
pub use visibility::{apply_role_visibility, ViewRegion};
