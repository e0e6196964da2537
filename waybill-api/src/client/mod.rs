//! Backend API client
//!
//! [`WaybillApi`] owns the session's [`AuthorizedClient`] and hands out one
//! lightweight sub-client per backend area. Every request, public or not,
//! goes through that client, so credentials are attached in exactly one place.

pub mod admin;
pub mod auth;
pub mod customer;
pub mod driver;
pub mod notifications;
pub mod orders;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use waybill_core::performance::measure_async;
use waybill_core::{ApiConfig, ErrorContext, WaybillError, WaybillResult};
use waybill_session::{AuthorizedClient, SessionManager};

pub use admin::AdminApi;
pub use auth::{AuthApi, SignInOutcome};
pub use customer::CustomerApi;
pub use driver::DriverApi;
pub use notifications::NotificationsApi;
pub use orders::{OrdersApi, TrackingApi};

#[derive(Debug, Clone)]
pub struct WaybillApi {
    http: AuthorizedClient,
}

impl WaybillApi {
    pub fn new(config: &ApiConfig, session: Arc<SessionManager>) -> WaybillResult<Self> {
        Ok(Self::from_client(AuthorizedClient::new(config, session)?))
    }

    pub fn from_client(http: AuthorizedClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &AuthorizedClient {
        &self.http
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        self.http.session()
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn admin(&self) -> AdminApi<'_> {
        AdminApi::new(self)
    }

    pub fn customer(&self) -> CustomerApi<'_> {
        CustomerApi::new(self)
    }

    pub fn driver(&self) -> DriverApi<'_> {
        DriverApi::new(self)
    }

    pub fn orders(&self) -> OrdersApi<'_> {
        OrdersApi::new(self)
    }

    pub fn tracking(&self) -> TrackingApi<'_> {
        TrackingApi::new(self)
    }

    pub fn notifications(&self) -> NotificationsApi<'_> {
        NotificationsApi::new(self)
    }

    /// Fail locally instead of sending a protected request without a token
    pub(crate) fn ensure_authenticated(&self, operation: &str) -> WaybillResult<()> {
        if self.session().is_authenticated() {
            Ok(())
        } else {
            debug!(operation, "No session, refusing to call protected endpoint");
            Err(WaybillError::authentication_required("api_client", operation))
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> WaybillResult<RequestBuilder> {
        self.http.request(method, path)
    }

    /// Send through the authorized client and turn failures into
    /// [`WaybillError`]s
    pub(crate) async fn send(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> WaybillResult<Response> {
        let response = measure_async(operation, self.http.send(builder))
            .await
            .map_err(|e| network_error(e, operation))?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, operation).await);
        }
        Ok(response)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &str,
    ) -> WaybillResult<T> {
        let response = self.send(self.request(Method::GET, path)?, operation).await?;
        decode_json(response, operation).await
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        operation: &str,
    ) -> WaybillResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path)?.json(body);
        let response = self.send(builder, operation).await?;
        decode_json(response, operation).await
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> WaybillResult<T> {
    response.json::<T>().await.map_err(|e| WaybillError::Internal {
        message: format!("Unexpected response body: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion("The backend may be a different version than this client expects"),
    })
}

pub(crate) fn network_error(error: reqwest::Error, operation: &str) -> WaybillError {
    let suggestion = if error.is_timeout() {
        "The backend took too long to answer, try again"
    } else {
        "Check that the backend is running and reachable"
    };

    WaybillError::Network {
        message: format!("Request failed: {}", error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion(suggestion),
    }
}

/// Turn a non-success response into an error carrying the status and a
/// short excerpt of the body
pub(crate) async fn handle_response_error(response: Response, operation: &str) -> WaybillError {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();

    let detail = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        excerpt(&body, 200)
    };

    WaybillError::Http {
        status: status.as_u16(),
        message: format!("{} {}: {}", status.as_u16(), url.path(), detail),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_metadata("url", url.as_str())
            .with_suggestion(match status.as_u16() {
                400 => "Check the values you entered",
                401 => "Your session has expired, sign in again",
                403 => "Your role does not allow this action",
                404 => "The requested item does not exist or is not yours",
                409 => "The item was changed by someone else, reload and retry",
                429 => "Too many requests, wait a moment and retry",
                s if s >= 500 => "The backend failed, retry shortly",
                _ => "Check network connectivity and backend status",
            }),
    }
}

fn excerpt(body: &str, max_chars: usize) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        assert_eq!(excerpt("  short  ", 10), "short");
        assert_eq!(excerpt("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_protected_call_without_session_fails_locally() {
        let session = Arc::new(SessionManager::in_memory(Default::default()));
        let api = WaybillApi::new(&ApiConfig::default(), session).unwrap();

        let error = api.ensure_authenticated("list_orders").unwrap_err();
        assert_eq!(error.redirect_target(), Some("/login"));
    }
}
