//! Order sub-resources shared by all roles, and live tracking

use super::WaybillApi;
use crate::models::{Cargo, OrderLocation, Route};
use waybill_core::WaybillResult;

pub struct OrdersApi<'a> {
    api: &'a WaybillApi,
}

impl<'a> OrdersApi<'a> {
    pub(crate) fn new(api: &'a WaybillApi) -> Self {
        Self { api }
    }

    pub async fn route(&self, order_id: i64) -> WaybillResult<Route> {
        self.api.ensure_authenticated("get_route")?;
        self.api
            .get_json(&format!("/api/orders/{}/route", order_id), "get_route")
            .await
    }

    pub async fn cargo(&self, order_id: i64) -> WaybillResult<Cargo> {
        self.api.ensure_authenticated("get_cargo")?;
        self.api
            .get_json(&format!("/api/orders/{}/cargo", order_id), "get_cargo")
            .await
    }
}

pub struct TrackingApi<'a> {
    api: &'a WaybillApi,
}

impl<'a> TrackingApi<'a> {
    pub(crate) fn new(api: &'a WaybillApi) -> Self {
        Self { api }
    }

    /// Most recent reported position of an order
    pub async fn current_location(&self, order_id: i64) -> WaybillResult<OrderLocation> {
        self.api.ensure_authenticated("track_order")?;
        self.api
            .get_json(
                &format!("/api/tracking/orders/{}/location", order_id),
                "track_order",
            )
            .await
    }

    pub async fn history(&self, order_id: i64) -> WaybillResult<Vec<OrderLocation>> {
        self.api.ensure_authenticated("track_order_history")?;
        self.api
            .get_json(
                &format!("/api/tracking/orders/{}/location/history", order_id),
                "track_order_history",
            )
            .await
    }
}
