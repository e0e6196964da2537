//! Waybill API - typed access to the delivery backend
//!
//! All requests go through the session's authorized client. Protected calls
//! fail locally with a sign-in redirect when no session exists.

pub mod client;
pub mod models;
pub mod watch;

pub use client::{
    AdminApi, AuthApi, CustomerApi, DriverApi, NotificationsApi, OrdersApi, SignInOutcome,
    TrackingApi, WaybillApi,
};
pub use models::*;
pub use watch::{watch_location, watch_unread_count};
