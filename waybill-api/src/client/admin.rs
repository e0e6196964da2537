//! Role administration (ADMIN only, enforced by the backend)

use super::WaybillApi;
use crate::models::{RoleAssignment, RoleAssignmentRequest};
use reqwest::Method;
use tracing::info;
use waybill_core::{validation_error, Role, WaybillResult};

const ROLES_PATH: &str = "/api/admin/users/roles";

pub struct AdminApi<'a> {
    api: &'a WaybillApi,
}

impl<'a> AdminApi<'a> {
    pub(crate) fn new(api: &'a WaybillApi) -> Self {
        Self { api }
    }

    pub async fn list_role_assignments(&self) -> WaybillResult<Vec<RoleAssignment>> {
        self.api.ensure_authenticated("list_role_assignments")?;
        self.api.get_json(ROLES_PATH, "list_role_assignments").await
    }

    pub async fn assign_role(&self, email: &str, role: &Role) -> WaybillResult<RoleAssignment> {
        self.api.ensure_authenticated("assign_role")?;
        let email = required_email(email)?;

        let body = RoleAssignmentRequest {
            email: email.to_string(),
            role_name: role.as_str().to_string(),
        };
        let assignment: RoleAssignment = self
            .api
            .send_json(Method::POST, ROLES_PATH, &body, "assign_role")
            .await?;

        info!(email, role = %role, "Role assigned");
        Ok(assignment)
    }

    pub async fn remove_role(&self, email: &str) -> WaybillResult<()> {
        self.api.ensure_authenticated("remove_role")?;
        let email = required_email(email)?;

        let builder = self
            .api
            .request(Method::DELETE, ROLES_PATH)?
            .query(&[("email", email)]);
        self.api.send(builder, "remove_role").await?;

        info!(email, "Role removed");
        Ok(())
    }
}

fn required_email(email: &str) -> WaybillResult<&str> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(validation_error!(
            format!("Not an email address: {:?}", email),
            "email",
            "admin_api"
        ));
    }
    Ok(email)
}
