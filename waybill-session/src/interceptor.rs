//! Outbound request authorization
//!
//! [`augment`] is the whole policy: attach the bearer token if one is
//! stored, otherwise leave the request alone. [`AuthorizedClient`] is the only
//! path through which the workspace talks to the backend.

use crate::cookie::CookieMirror;
use crate::manager::{token_preview, SessionManager};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, Request, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use waybill_core::{ApiConfig, ErrorContext, WaybillError, WaybillResult};

/// Attach `Authorization: Bearer <token>` when a session token exists.
///
/// Any existing Authorization header is replaced. Without a token the
/// request is returned as it came in.
pub fn augment(mut request: Request, session: &SessionManager) -> Request {
    let Some(token) = session.token() else {
        return request;
    };

    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(e) => {
            warn!(
                token = %token_preview(&token),
                error = %e,
                "Stored token is not a valid header value, sending request without it"
            );
        }
    }
    request
}

/// HTTP client bound to one backend origin and one session
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    client: reqwest::Client,
    jar: Arc<Jar>,
    session: Arc<SessionManager>,
    base_url: Url,
}

impl AuthorizedClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionManager>) -> WaybillResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| WaybillError::Config {
            message: format!("Invalid base URL '{}': {}", config.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| WaybillError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?,
        );

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| WaybillError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        debug!(base_url = %base_url, "Created authorized HTTP client");

        Ok(Self {
            client,
            jar,
            session,
            base_url,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a backend path such as `/api/customer/orders`
    pub fn url(&self, path: &str) -> WaybillResult<Url> {
        self.base_url.join(path).map_err(|e| WaybillError::Validation {
            message: format!("Invalid request path '{}': {}", path, e),
            field: Some("path".to_string()),
            context: ErrorContext::new("http_client").with_operation("resolve_url"),
        })
    }

    /// Start a request. Credentials are attached when it is sent, not here.
    pub fn request(&self, method: Method, path: &str) -> WaybillResult<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// Send `request` with the current session's credentials.
    /// Transport errors are returned exactly as reqwest reports them.
    pub async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        let request = augment(request, &self.session);
        debug!(method = %request.method(), url = %request.url(), "Sending request");
        self.client.execute(request).await
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        let request = builder.build()?;
        self.execute(request).await
    }

    /// Bring the jar's navigation cookie in line with the stored session
    pub fn sync_navigation_cookie(&self) {
        let cookie = match self.session.navigation_cookie() {
            Some(cookie) => cookie,
            None => CookieMirror::removal(&self.session.config().cookie_name),
        };
        self.jar.add_cookie_str(&cookie.to_string(), &self.base_url);
    }

    /// A plain page load. No Authorization header is attached; the
    /// navigation cookie is the only credential carried.
    pub async fn navigate(&self, path: &str) -> WaybillResult<Response> {
        self.sync_navigation_cookie();
        let url = self.url(path)?;
        debug!(url = %url, "Navigating");

        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| WaybillError::Network {
                message: format!("Failed to load page {}: {}", path, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client")
                    .with_operation("navigate")
                    .with_suggestion("Check that the backend is running and reachable"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waybill_core::{AuthResponse, SessionConfig};

    fn signed_in() -> SessionManager {
        let session = SessionManager::in_memory(SessionConfig::default());
        session
            .store_session(&AuthResponse {
                access_token: Some("t0k3n".to_string()),
                role: Some("ADMIN".to_string()),
                user_id: Some(1),
                first_name: Some("Grace".to_string()),
                last_name: Some("Hopper".to_string()),
                email: Some("grace@example.com".to_string()),
            })
            .unwrap();
        session
    }

    fn get(url: &str) -> Request {
        Request::new(Method::GET, Url::parse(url).unwrap())
    }

    #[test]
    fn test_augment_adds_bearer_header() {
        let session = signed_in();
        let request = augment(get("http://localhost/api/admin/users/roles"), &session);

        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer t0k3n"
        );
        assert!(request.headers().get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn test_augment_without_session_is_identity() {
        let session = SessionManager::in_memory(SessionConfig::default());
        let mut original = get("http://localhost/api/auth/sign-in");
        original
            .headers_mut()
            .insert("x-trace", HeaderValue::from_static("1"));

        let request = augment(original, &session);
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.url().path(), "/api/auth/sign-in");
    }

    #[test]
    fn test_augment_replaces_stale_header() {
        let session = signed_in();
        let mut original = get("http://localhost/api/driver/orders");
        original
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer old"));

        let request = augment(original, &session);
        assert_eq!(request.headers().get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer t0k3n"
        );
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        let session = Arc::new(SessionManager::in_memory(SessionConfig::default()));
        assert!(matches!(
            AuthorizedClient::new(&config, session),
            Err(WaybillError::Config { .. })
        ));
    }

    #[test]
    fn test_url_resolution() {
        let session = Arc::new(SessionManager::in_memory(SessionConfig::default()));
        let client = AuthorizedClient::new(&ApiConfig::default(), session).unwrap();
        assert_eq!(
            client.url("/api/notifications/unread/count").unwrap().as_str(),
            "http://localhost:8080/api/notifications/unread/count"
        );
    }
}
