//! Role-based view gating
//!
//! Hiding a region is a convenience, not a security boundary: the backend
//! re-checks every request.

use crate::manager::SessionManager;
use waybill_core::Role;

/// Attribute marking a region as visible only to signed-in users
pub const AUTH_ATTRIBUTE: &str = "data-auth-required";
/// Attribute naming the single role a region is shown to
pub const ROLE_ATTRIBUTE: &str = "data-role";

/// A tagged region of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRegion {
    pub id: String,
    pub requires_auth: bool,
    pub required_role: Option<String>,
    pub visible: bool,
}

impl ViewRegion {
    pub fn public(id: &str) -> Self {
        Self {
            id: id.to_string(),
            requires_auth: false,
            required_role: None,
            visible: true,
        }
    }

    pub fn authenticated(id: &str) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(id)
        }
    }

    pub fn for_role(id: &str, role: &str) -> Self {
        Self {
            required_role: Some(role.to_string()),
            ..Self::public(id)
        }
    }

    /// Build a region from markup attributes
    pub fn from_attributes<'a, I>(id: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut region = Self::public(id);
        for (name, value) in attributes {
            match name {
                AUTH_ATTRIBUTE => region.requires_auth = value != "false",
                ROLE_ATTRIBUTE if !value.is_empty() => {
                    region.required_role = Some(value.to_string())
                }
                _ => {}
            }
        }
        region
    }
}

/// Recompute visibility of every region from the session state alone.
///
/// A role tag matches only the identical role string, case-sensitive and
/// without any hierarchy. An auth tag needs any signed-in user. Untagged
/// regions are always shown.
pub fn apply_role_visibility(regions: &mut [ViewRegion], authenticated: bool, role: Option<&Role>) {
    for region in regions.iter_mut() {
        region.visible = match &region.required_role {
            Some(tag) => authenticated && role.is_some_and(|r| r.as_str() == tag),
            None if region.requires_auth => authenticated,
            None => true,
        };
    }
}

impl SessionManager {
    /// [`apply_role_visibility`] with the stored session
    pub fn apply_visibility(&self, regions: &mut [ViewRegion]) {
        let identity = self.identity();
        let role = identity.as_ref().and_then(|i| i.role.as_ref());
        apply_role_visibility(regions, identity.is_some(), role);
    }
}
