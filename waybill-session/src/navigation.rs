//! Routing decisions that depend on the session

use crate::manager::SessionManager;
use crate::visibility::ViewRegion;
use tracing::{debug, info};
use url::Url;
use waybill_core::{Role, WaybillResult, SIGN_IN_PATH};

/// Client-side page paths
pub mod paths {
    pub const HOME: &str = "/";
    pub const LOGIN: &str = waybill_core::SIGN_IN_PATH;
    pub const REGISTER: &str = "/register";
    pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
    pub const CUSTOMER_ORDER_CREATE: &str = "/customer/orders/create";
    pub const DRIVER_ORDERS: &str = "/driver/orders";
    pub const SUPPORT_DASHBOARD: &str = "/support/dashboard";
    pub const NOTIFICATIONS: &str = "/notifications";
}

/// Sections of the site that are only rendered for a signed-in user
const PROTECTED_PREFIXES: [&str; 5] = [
    "/customer",
    "/driver",
    "/admin",
    "/support",
    "/notifications",
];

/// Landing page after sign-in. Unknown or missing roles go home.
pub fn redirect_target_for_role(role: Option<&Role>) -> &'static str {
    match role {
        Some(Role::Admin) => paths::ADMIN_DASHBOARD,
        Some(Role::Customer) => paths::CUSTOMER_ORDER_CREATE,
        Some(Role::Driver) => paths::DRIVER_ORDERS,
        Some(Role::SupportAgent) => paths::SUPPORT_DASHBOARD,
        Some(Role::Other(_)) | None => paths::HOME,
    }
}

/// Whether `path` lies in a protected section. Matches whole segments, so
/// `/drivers-faq` is public while `/driver/orders` is not.
pub fn requires_authentication(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Result of loading a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    /// Show the page at `url` with regions already gated
    Render {
        url: Url,
        authenticated: bool,
        role: Option<Role>,
    },
    /// Do not render anything, go to `to` instead
    Redirect { from: Url, to: &'static str },
}

impl SessionManager {
    /// Where to go right after signing in
    pub fn post_login_target(&self) -> &'static str {
        redirect_target_for_role(self.role().as_ref())
    }

    /// Run the page-load sequence: consume a bootstrap token, gate protected
    /// sections, then apply role visibility to `regions`.
    pub fn load_page(&self, url: &Url, regions: &mut [ViewRegion]) -> WaybillResult<PageLoad> {
        let outcome = self.consume_bootstrap_token(url)?;
        let url = outcome.url;

        if requires_authentication(url.path()) && !self.is_authenticated() {
            info!(path = url.path(), "Protected page without a session, redirecting");
            return Ok(PageLoad::Redirect {
                from: url,
                to: SIGN_IN_PATH,
            });
        }

        self.apply_visibility(regions);
        let role = self.role();
        debug!(path = url.path(), role = ?role, "Rendering page");

        Ok(PageLoad::Render {
            authenticated: self.is_authenticated(),
            role,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waybill_core::SessionConfig;

    #[test]
    fn test_redirect_targets() {
        assert_eq!(redirect_target_for_role(Some(&Role::Admin)), "/admin/dashboard");
        assert_eq!(
            redirect_target_for_role(Some(&Role::Customer)),
            "/customer/orders/create"
        );
        assert_eq!(redirect_target_for_role(Some(&Role::Driver)), "/driver/orders");
        assert_eq!(
            redirect_target_for_role(Some(&Role::SupportAgent)),
            "/support/dashboard"
        );
        assert_eq!(redirect_target_for_role(Some(&Role::from("GUEST"))), "/");
        assert_eq!(redirect_target_for_role(Some(&Role::from("admin"))), "/");
        assert_eq!(redirect_target_for_role(None), "/");
    }

    #[test]
    fn test_protected_paths() {
        assert!(requires_authentication("/driver/orders"));
        assert!(requires_authentication("/admin"));
        assert!(requires_authentication("/notifications"));
        assert!(!requires_authentication("/"));
        assert!(!requires_authentication("/login"));
        assert!(!requires_authentication("/drivers-faq"));
    }

    #[test]
    fn test_protected_page_without_session_redirects() {
        let session = SessionManager::in_memory(SessionConfig::default());
        let mut regions = vec![ViewRegion::for_role("orders", "CUSTOMER")];

        let load = session
            .load_page(&Url::parse("http://app/customer/orders").unwrap(), &mut regions)
            .unwrap();
        assert!(matches!(load, PageLoad::Redirect { to: "/login", .. }));
    }

    #[test]
    fn test_bootstrap_token_unlocks_protected_page() {
        let session = SessionManager::in_memory(SessionConfig::default());
        let mut regions = vec![ViewRegion::authenticated("inbox")];

        let load = session
            .load_page(
                &Url::parse("http://app/notifications?token=abc123").unwrap(),
                &mut regions,
            )
            .unwrap();

        match load {
            PageLoad::Render {
                url,
                authenticated,
                role,
            } => {
                assert_eq!(url.as_str(), "http://app/notifications");
                assert!(authenticated);
                assert_eq!(role, None);
            }
            other => panic!("Expected render, got {:?}", other),
        }
        assert!(regions[0].visible);
    }
}
