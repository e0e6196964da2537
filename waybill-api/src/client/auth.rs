//! Sign-in and sign-up

use super::WaybillApi;
use reqwest::Method;
use tracing::info;
use waybill_core::{
    log_operation_start, log_operation_success, validation_error, AuthResponse, Identity,
    SignInRequest, SignUpRequest, WaybillResult,
};

/// Result of a successful sign-in: who is now signed in and where to go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    pub identity: Identity,
    pub redirect_to: &'static str,
}

pub struct AuthApi<'a> {
    api: &'a WaybillApi,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(api: &'a WaybillApi) -> Self {
        Self { api }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> WaybillResult<SignInOutcome> {
        log_operation_start!("sign_in", email = email);
        if email.trim().is_empty() {
            return Err(validation_error!("Email is required", "email", "auth_api"));
        }
        if password.is_empty() {
            return Err(validation_error!("Password is required", "password", "auth_api"));
        }

        let request = SignInRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .api
            .send_json(Method::POST, "/api/auth/sign-in", &request, "sign_in")
            .await?;

        let outcome = self.establish(&response)?;
        log_operation_success!("sign_in", redirect_to = outcome.redirect_to);
        Ok(outcome)
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> WaybillResult<SignInOutcome> {
        log_operation_start!("sign_up", email = request.email.as_str());
        for (field, value) in [
            ("firstName", &request.first_name),
            ("lastName", &request.last_name),
            ("email", &request.email),
            ("password", &request.password),
        ] {
            if value.trim().is_empty() {
                return Err(validation_error!(format!("{} is required", field), field, "auth_api"));
            }
        }

        let response: AuthResponse = self
            .api
            .send_json(Method::POST, "/api/auth/sign-up", request, "sign_up")
            .await?;

        let outcome = self.establish(&response)?;
        log_operation_success!("sign_up", redirect_to = outcome.redirect_to);
        Ok(outcome)
    }

    /// Forget the local session. The backend keeps no server-side session.
    pub fn sign_out(&self) -> WaybillResult<()> {
        self.api.session().clear_session()?;
        info!("Signed out");
        Ok(())
    }

    fn establish(&self, response: &AuthResponse) -> WaybillResult<SignInOutcome> {
        let session = self.api.session();
        let identity = session.store_session(response)?;
        Ok(SignInOutcome {
            redirect_to: session.post_login_target(),
            identity,
        })
    }
}
