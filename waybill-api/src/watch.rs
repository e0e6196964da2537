//! Periodic refreshes built on [`spawn_poller`]

use crate::client::WaybillApi;
use crate::models::OrderLocation;
use std::time::Duration;
use waybill_core::{spawn_poller, PollerHandle, PollingConfig};

/// Refresh the unread notification badge every `period`
pub fn watch_unread_count(api: WaybillApi, period: Duration) -> PollerHandle<u64> {
    spawn_poller("unread_count", period, move || {
        let api = api.clone();
        async move { api.notifications().unread_count().await }
    })
}

/// Follow the live position of one order every `period`
pub fn watch_location(
    api: WaybillApi,
    order_id: i64,
    period: Duration,
) -> PollerHandle<OrderLocation> {
    spawn_poller("order_location", period, move || {
        let api = api.clone();
        async move { api.tracking().current_location(order_id).await }
    })
}

/// Intervals from configuration
pub fn intervals(config: &PollingConfig) -> (Duration, Duration) {
    (
        Duration::from_secs(config.notifications_interval_secs),
        Duration::from_secs(config.location_interval_secs),
    )
}
