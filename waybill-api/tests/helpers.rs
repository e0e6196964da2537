//! Test helpers: an in-process stand-in for the delivery backend

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use tokio::net::TcpListener;
use uuid::Uuid;
use waybill_api::WaybillApi;
use waybill_core::{ApiConfig, SessionConfig};
use waybill_session::SessionManager;

static TRACING: LazyLock<()> = LazyLock::new(|| {
    let level = if std::env::var("TEST_LOG").is_ok() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
});

pub const PASSWORD: &str = "correct horse";

/// What the fake backend has seen and how it should behave
#[derive(Debug, Default)]
pub struct BackendState {
    /// token -> (role, user id)
    pub tokens: HashMap<String, (String, i64)>,
    /// Authorization header of every request, in arrival order
    pub seen_authorization: Vec<Option<String>>,
    pub unread: u64,
    pub read_ids: Vec<i64>,
    pub removed_emails: Vec<String>,
    pub status_updates: Vec<Value>,
    pub fail_unread_count: bool,
}

pub type SharedState = Arc<Mutex<BackendState>>;

pub struct TestApp {
    pub address: String,
    pub state: SharedState,
    pub api: WaybillApi,
    pub session: Arc<SessionManager>,
}

impl TestApp {
    /// A second client sharing nothing with `self.api`
    pub fn fresh_api(&self) -> WaybillApi {
        let session = Arc::new(SessionManager::in_memory(SessionConfig::default()));
        api_for(&self.address, session)
    }

    pub fn seen_authorization(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().seen_authorization.clone()
    }
}

pub fn api_for(address: &str, session: Arc<SessionManager>) -> WaybillApi {
    let config = ApiConfig {
        base_url: address.to_string(),
        timeout_seconds: 5,
        ..ApiConfig::default()
    };
    WaybillApi::new(&config, session).unwrap()
}

pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);

    let state: SharedState = Arc::new(Mutex::new(BackendState {
        unread: 3,
        ..BackendState::default()
    }));

    let app = Router::new()
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-up", post(sign_up))
        .route(
            "/api/admin/users/roles",
            get(list_roles).post(assign_role).delete(remove_role),
        )
        .route("/api/customer/orders", get(list_orders))
        .route("/api/customer/orders/{id}", get(get_order))
        .route("/api/customer/orders/calculate-price", post(calculate_price))
        .route("/api/customer/orders/create", post(create_order))
        .route("/api/driver/orders", get(list_orders))
        .route("/api/driver/orders/{id}", get(get_order))
        .route("/api/driver/orders/{id}/status", put(update_status))
        .route("/api/driver/orders/{id}/location/history", get(location_history))
        .route("/api/driver/vehicle", get(vehicle))
        .route("/api/orders/{id}/route", get(route))
        .route("/api/orders/{id}/cargo", get(cargo))
        .route("/api/tracking/orders/{id}/location", get(location))
        .route("/api/notifications", get(notifications))
        .route("/api/notifications/{id}/read", patch(mark_read))
        .route("/api/notifications/read-all", patch(mark_all_read))
        .route("/api/notifications/unread/count", get(unread_count))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let address = format!("http://127.0.0.1:{}", port);
    let session = Arc::new(SessionManager::in_memory(SessionConfig::default()));
    let api = api_for(&address, session.clone());

    TestApp {
        address,
        state,
        api,
        session,
    }
}

type ApiResult = Result<Json<Value>, (StatusCode, String)>;

/// Record the header and resolve it to (role, user id)
fn authorize(
    state: &SharedState,
    headers: &HeaderMap,
) -> Result<(String, i64), (StatusCode, String)> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut state = state.lock().unwrap();
    state.seen_authorization.push(header.clone());

    header
        .as_deref()
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|token| state.tokens.get(token).cloned())
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid or missing token".to_string()))
}

fn require_role(actual: &str, expected: &str) -> Result<(), (StatusCode, String)> {
    if actual == expected {
        Ok(())
    } else {
        Err((StatusCode::FORBIDDEN, format!("{} only", expected)))
    }
}

/// Emails map to roles by prefix: admin@, driver@, support@, anything else
/// is a customer
fn role_for(email: &str) -> &'static str {
    match email.split('@').next().unwrap_or_default() {
        "admin" => "ADMIN",
        "driver" => "DRIVER",
        "support" => "SUPPORT_AGENT",
        _ => "CUSTOMER",
    }
}

fn issue_token(state: &SharedState, email: &str, first: &str, last: &str) -> Value {
    let role = role_for(email);
    let token = format!("tok-{}", Uuid::new_v4().simple());
    let user_id = {
        let mut state = state.lock().unwrap();
        let user_id = state.tokens.len() as i64 + 100;
        state.tokens.insert(token.clone(), (role.to_string(), user_id));
        user_id
    };

    json!({
        "accessToken": token,
        "role": role,
        "userId": user_id,
        "firstName": first,
        "lastName": last,
        "email": email,
    })
}

async fn sign_in(State(state): State<SharedState>, Json(body): Json<Value>) -> ApiResult {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        return Err((StatusCode::UNAUTHORIZED, "Bad credentials".to_string()));
    }
    if email == "broken@example.com" {
        // A response without a role must not produce a session
        return Ok(Json(json!({"accessToken": "x", "userId": 1})));
    }
    Ok(Json(issue_token(&state, email, "Test", "User")))
}

async fn sign_up(State(state): State<SharedState>, Json(body): Json<Value>) -> ApiResult {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let first = body["firstName"].as_str().unwrap_or_default().to_string();
    let last = body["lastName"].as_str().unwrap_or_default().to_string();
    Ok(Json(issue_token(&state, &email, &first, &last)))
}

async fn list_roles(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    let (role, _) = authorize(&state, &headers)?;
    require_role(&role, "ADMIN")?;
    Ok(Json(json!([
        {"id": 1, "email": "admin@example.com", "roleName": "ADMIN"},
        {"id": 2, "email": "driver@example.com", "roleName": "DRIVER"},
    ])))
}

async fn assign_role(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let (role, _) = authorize(&state, &headers)?;
    require_role(&role, "ADMIN")?;
    Ok(Json(json!({"id": 9, "email": body["email"], "roleName": body["roleName"]})))
}

async fn remove_role(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, (StatusCode, String)> {
    let (role, _) = authorize(&state, &headers)?;
    require_role(&role, "ADMIN")?;
    let email = query
        .get("email")
        .cloned()
        .ok_or((StatusCode::BAD_REQUEST, "email is required".to_string()))?;
    state.lock().unwrap().removed_emails.push(email);
    Ok(StatusCode::NO_CONTENT)
}

fn order_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "status": {"id": 2, "statusName": status},
        "price": 999.5,
        "cargoType": "GRAIN",
        "cargoWeight": 1000.0,
        "startLocation": "Kyiv",
        "endLocation": "Lviv",
        "createdAt": "2025-05-01T12:00:00Z"
    })
}

async fn list_orders(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    authorize(&state, &headers)?;
    Ok(Json(json!([order_json(1, "PENDING"), order_json(2, "IN_TRANSIT")])))
}

async fn get_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    authorize(&state, &headers)?;
    if id == 404 {
        return Err((StatusCode::NOT_FOUND, "Order not found".to_string()));
    }
    Ok(Json(order_json(id, "ASSIGNED")))
}

async fn calculate_price(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let weight = body["cargoWeight"].as_f64().unwrap_or_default();
    Ok(Json(json!({
        "price": weight * 0.5,
        "distance": 540.0,
        "cargoType": body["cargoType"],
        "cargoWeight": weight,
        "startLocation": body["startLocation"],
        "endLocation": body["endLocation"],
    })))
}

async fn create_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> ApiResult {
    let (role, _) = authorize(&state, &headers)?;
    require_role(&role, "CUSTOMER")?;
    Ok(Json(order_json(77, "PENDING")))
}

async fn update_status(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult {
    let (role, _) = authorize(&state, &headers)?;
    require_role(&role, "DRIVER")?;
    state.lock().unwrap().status_updates.push(body);
    Ok(Json(order_json(id, "DELIVERED")))
}

async fn location_history(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> ApiResult {
    authorize(&state, &headers)?;
    Ok(Json(json!([
        {"id": 1, "latitude": 50.45, "longitude": 30.52, "timestamp": "2025-05-01T12:00:00Z"},
        {"id": 2, "latitude": 49.84, "longitude": 24.03, "timestamp": "2025-05-01T18:00:00Z", "statusComment": "Arrived"},
    ])))
}

async fn vehicle(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    authorize(&state, &headers)?;
    Ok(Json(json!({"id": 5, "licensePlate": "AA1234BB", "capacity": 20000.0})))
}

async fn route(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    authorize(&state, &headers)?;
    Ok(Json(json!({"id": id, "startLocation": "Kyiv", "endLocation": "Lviv", "distance": 540.0})))
}

async fn cargo(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    authorize(&state, &headers)?;
    Ok(Json(json!({"id": id, "type": "GRAIN", "weight": 1000.0})))
}

async fn location(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> ApiResult {
    authorize(&state, &headers)?;
    Ok(Json(json!({"id": 3, "latitude": 50.0, "longitude": 30.0})))
}

async fn notifications(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    authorize(&state, &headers)?;
    Ok(Json(json!([
        {"id": 1, "orderId": 2, "message": "Order 2 is in transit", "isRead": false, "createdAt": "2025-05-01T12:00:00Z"},
        {"id": 2, "orderId": null, "message": "Welcome", "isRead": true},
    ])))
}

async fn mark_read(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult {
    authorize(&state, &headers)?;
    state.lock().unwrap().read_ids.push(id);
    Ok(Json(json!({"id": id, "message": "read", "isRead": true})))
}

async fn mark_all_read(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    authorize(&state, &headers)?;
    state.lock().unwrap().unread = 0;
    Ok(StatusCode::OK)
}

async fn unread_count(State(state): State<SharedState>, headers: HeaderMap) -> ApiResult {
    authorize(&state, &headers)?;
    let state = state.lock().unwrap();
    if state.fail_unread_count {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "try later".to_string()));
    }
    Ok(Json(json!({"count": state.unread})))
}
