//! Wire types of the delivery backend
//!
//! Field names follow the backend's camelCase JSON. Most fields are optional
//! because the backend omits whatever is not known yet (an order without a
//! driver, a route without an estimate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use waybill_core::{validation_error, WaybillError, WaybillResult};

/// Lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Assigned,
    InTransit,
    WaitingUnloading,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Assigned,
        OrderStatus::InTransit,
        OrderStatus::WaitingUnloading,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::WaitingUnloading => "WAITING_UNLOADING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// No further transitions happen from here
    pub fn is_final(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive, as the backend compares status names
impl FromStr for OrderStatus {
    type Err = WaybillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                validation_error!(format!("Unknown order status: {}", s), "status", "models")
            })
    }
}

/// Cargo categories the pricing service knows
pub const CARGO_TYPES: [&str; 13] = [
    "GRAIN",
    "WHEAT",
    "CORN",
    "BARLEY",
    "SAND",
    "GRAVEL",
    "CONSTRUCTION",
    "BUILDING_MATERIALS",
    "METAL",
    "STEEL",
    "HAZARDOUS",
    "CHEMICALS",
    "OTHER",
];

/// A row of the status table, as referenced by orders and status updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub id: Option<i64>,
    pub status_name: String,
}

impl StatusEntry {
    pub fn status(&self) -> WaybillResult<OrderStatus> {
        self.status_name.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub license_plate: Option<String>,
    /// Capacity in kilograms
    pub capacity: Option<f64>,
    pub photo_url: Option<String>,
    pub driver: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub status: Option<StatusEntry>,
    pub price: Option<f64>,
    pub cargo_type: Option<String>,
    pub cargo_weight: Option<f64>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub distance: Option<f64>,
    pub driver_name: Option<String>,
    pub vehicle_license_plate: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub customer: Option<UserSummary>,
    pub driver: Option<UserSummary>,
    pub vehicle: Option<Vehicle>,
}

impl Order {
    /// Parsed status, if the backend sent a known one
    pub fn order_status(&self) -> Option<OrderStatus> {
        self.status.as_ref().and_then(|s| s.status().ok())
    }
}

/// Body of price calculation and order creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub cargo_type: String,
    /// Weight in kilograms
    pub cargo_weight: f64,
    pub start_location: String,
    pub end_location: String,
}

impl OrderRequest {
    /// Reject requests the backend would refuse anyway
    pub fn validate(&self) -> WaybillResult<()> {
        if !CARGO_TYPES.contains(&self.cargo_type.as_str()) {
            return Err(validation_error!(
                format!("Unknown cargo type: {}", self.cargo_type),
                "cargoType",
                "models"
            ));
        }
        if !(self.cargo_weight.is_finite() && self.cargo_weight > 0.0) {
            return Err(validation_error!(
                "Cargo weight must be a positive number of kilograms",
                "cargoWeight",
                "models"
            ));
        }
        if self.start_location.trim().is_empty() {
            return Err(validation_error!("Start location is required", "startLocation", "models"));
        }
        if self.end_location.trim().is_empty() {
            return Err(validation_error!("End location is required", "endLocation", "models"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPrice {
    pub price: f64,
    pub distance: Option<f64>,
    pub cargo_type: Option<String>,
    pub cargo_weight: Option<f64>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Option<i64>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub distance: Option<f64>,
    pub estimated_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub cargo_type: Option<String>,
    pub weight: Option<f64>,
}

/// A position report for an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLocation {
    pub id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub status_comment: Option<String>,
}

/// Body of `PUT /api/driver/orders/{id}/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStatusUpdate {
    pub status_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub order_id: Option<i64>,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: u64,
}

/// One user's role as listed by the admin endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub role_name: String,
}

/// Body of `POST /api/admin/users/roles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignmentRequest {
    pub email: String,
    pub role_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("IN_TRANSIT".parse::<OrderStatus>().unwrap(), OrderStatus::InTransit);
        assert_eq!("delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert!("LOST".parse::<OrderStatus>().is_err());
        assert!(OrderStatus::Cancelled.is_final());
        assert!(!OrderStatus::Pending.is_final());
    }

    #[test]
    fn test_order_from_backend_json() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 12,
            "status": {"id": 3, "statusName": "IN_TRANSIT"},
            "price": 1520.5,
            "cargoType": "GRAIN",
            "cargoWeight": 8000.0,
            "startLocation": "Kyiv",
            "endLocation": "Lviv",
            "driverName": "Taras Shevchenko",
            "createdAt": "2025-03-01T08:30:00Z"
        }))
        .unwrap();

        assert_eq!(order.order_status(), Some(OrderStatus::InTransit));
        assert_eq!(order.driver, None);
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_order_request_validation() {
        let mut request = OrderRequest {
            cargo_type: "SAND".to_string(),
            cargo_weight: 1200.0,
            start_location: "Odesa".to_string(),
            end_location: "Dnipro".to_string(),
        };
        assert!(request.validate().is_ok());

        request.cargo_weight = 0.0;
        assert!(request.validate().is_err());

        request.cargo_weight = 10.0;
        request.cargo_type = "sand".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_status_update_omits_missing_fields() {
        let update = DriverStatusUpdate {
            status_id: 5,
            latitude: None,
            longitude: None,
            status_comment: Some("Unloaded at dock 4".to_string()),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"statusId": 5, "statusComment": "Unloaded at dock 4"})
        );
    }

    #[test]
    fn test_cargo_uses_type_field() {
        let cargo: Cargo =
            serde_json::from_str(r#"{"id":1,"type":"STEEL","weight":500.0}"#).unwrap();
        assert_eq!(cargo.cargo_type.as_deref(), Some("STEEL"));
    }
}
