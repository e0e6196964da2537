//! Driver-scoped orders, vehicle and status reporting

use super::WaybillApi;
use crate::models::{DriverStatusUpdate, Order, OrderLocation, StatusEntry, Vehicle};
use reqwest::Method;
use tracing::info;
use waybill_core::{validation_error, WaybillResult};

pub struct DriverApi<'a> {
    api: &'a WaybillApi,
}

impl<'a> DriverApi<'a> {
    pub(crate) fn new(api: &'a WaybillApi) -> Self {
        Self { api }
    }

    pub async fn list_orders(&self) -> WaybillResult<Vec<Order>> {
        self.api.ensure_authenticated("list_driver_orders")?;
        self.api
            .get_json("/api/driver/orders", "list_driver_orders")
            .await
    }

    pub async fn get_order(&self, order_id: i64) -> WaybillResult<Order> {
        self.api.ensure_authenticated("get_driver_order")?;
        self.api
            .get_json(&format!("/api/driver/orders/{}", order_id), "get_driver_order")
            .await
    }

    pub async fn vehicle(&self) -> WaybillResult<Vehicle> {
        self.api.ensure_authenticated("get_vehicle")?;
        self.api.get_json("/api/driver/vehicle", "get_vehicle").await
    }

    /// Status rows with the ids that [`DriverStatusUpdate::status_id`] expects
    pub async fn statuses(&self) -> WaybillResult<Vec<StatusEntry>> {
        self.api.ensure_authenticated("list_statuses")?;
        self.api
            .get_json("/api/driver/orders/statuses", "list_statuses")
            .await
    }

    pub async fn update_status(
        &self,
        order_id: i64,
        update: &DriverStatusUpdate,
    ) -> WaybillResult<Order> {
        self.api.ensure_authenticated("update_order_status")?;
        if update.latitude.is_some() != update.longitude.is_some() {
            return Err(validation_error!(
                "Latitude and longitude must be given together",
                "latitude",
                "driver_api"
            ));
        }

        let order: Order = self
            .api
            .send_json(
                Method::PUT,
                &format!("/api/driver/orders/{}/status", order_id),
                update,
                "update_order_status",
            )
            .await?;

        info!(order_id, status_id = update.status_id, "Order status updated");
        Ok(order)
    }

    pub async fn location_history(&self, order_id: i64) -> WaybillResult<Vec<OrderLocation>> {
        self.api.ensure_authenticated("get_location_history")?;
        self.api
            .get_json(
                &format!("/api/driver/orders/{}/location/history", order_id),
                "get_location_history",
            )
            .await
    }
}
