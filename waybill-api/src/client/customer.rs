//! Customer order management

use super::WaybillApi;
use crate::models::{Order, OrderPrice, OrderRequest};
use reqwest::Method;
use tracing::info;
use waybill_core::WaybillResult;

pub struct CustomerApi<'a> {
    api: &'a WaybillApi,
}

impl<'a> CustomerApi<'a> {
    pub(crate) fn new(api: &'a WaybillApi) -> Self {
        Self { api }
    }

    pub async fn list_orders(&self) -> WaybillResult<Vec<Order>> {
        self.api.ensure_authenticated("list_customer_orders")?;
        self.api
            .get_json("/api/customer/orders", "list_customer_orders")
            .await
    }

    pub async fn get_order(&self, order_id: i64) -> WaybillResult<Order> {
        self.api.ensure_authenticated("get_customer_order")?;
        self.api
            .get_json(&format!("/api/customer/orders/{}", order_id), "get_customer_order")
            .await
    }

    /// Quote a price without creating anything
    pub async fn calculate_price(&self, request: &OrderRequest) -> WaybillResult<OrderPrice> {
        self.api.ensure_authenticated("calculate_price")?;
        request.validate()?;
        self.api
            .send_json(
                Method::POST,
                "/api/customer/orders/calculate-price",
                request,
                "calculate_price",
            )
            .await
    }

    pub async fn create_order(&self, request: &OrderRequest) -> WaybillResult<Order> {
        self.api.ensure_authenticated("create_order")?;
        request.validate()?;
        let order: Order = self
            .api
            .send_json(
                Method::POST,
                "/api/customer/orders/create",
                request,
                "create_order",
            )
            .await?;

        info!(order_id = order.id, "Order created");
        Ok(order)
    }
}
