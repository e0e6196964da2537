//! Notification inbox

use super::WaybillApi;
use crate::models::{Notification, UnreadCount};
use reqwest::Method;
use tracing::debug;
use waybill_core::WaybillResult;

pub struct NotificationsApi<'a> {
    api: &'a WaybillApi,
}

impl<'a> NotificationsApi<'a> {
    pub(crate) fn new(api: &'a WaybillApi) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> WaybillResult<Vec<Notification>> {
        self.api.ensure_authenticated("list_notifications")?;
        self.api
            .get_json("/api/notifications", "list_notifications")
            .await
    }

    pub async fn unread(&self) -> WaybillResult<Vec<Notification>> {
        self.api.ensure_authenticated("list_unread_notifications")?;
        self.api
            .get_json("/api/notifications/unread", "list_unread_notifications")
            .await
    }

    pub async fn mark_read(&self, notification_id: i64) -> WaybillResult<Notification> {
        self.api.ensure_authenticated("mark_notification_read")?;
        let builder = self.api.request(
            Method::PATCH,
            &format!("/api/notifications/{}/read", notification_id),
        )?;
        let response = self.api.send(builder, "mark_notification_read").await?;
        debug!(notification_id, "Notification marked read");
        super::decode_json(response, "mark_notification_read").await
    }

    pub async fn mark_all_read(&self) -> WaybillResult<()> {
        self.api.ensure_authenticated("mark_all_notifications_read")?;
        let builder = self
            .api
            .request(Method::PATCH, "/api/notifications/read-all")?;
        self.api.send(builder, "mark_all_notifications_read").await?;
        debug!("All notifications marked read");
        Ok(())
    }

    pub async fn unread_count(&self) -> WaybillResult<u64> {
        self.api.ensure_authenticated("unread_count")?;
        let count: UnreadCount = self
            .api
            .get_json("/api/notifications/unread/count", "unread_count")
            .await?;
        Ok(count.count)
    }
}
