//! Integration tests for the Shopper cart client.
//!
//! [`MockBackend`] is an in-process axum server implementing the storefront
//! routes the client talks to, so the tests exercise the real `reqwest`
//! client, cookie handling and JSON wire format without a live backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopper-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_api` - Request/response contract of `ShopperClient`
//! - `session_flow` - Guest cart, sign-in merge and rollback end to end

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::{Body, to_bytes};
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use shopper_cart::ShopperConfig;
use shopper_cart::api::ShopperClient;

/// Cart owner as the backend keys it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartKey {
    User(String),
    Guest(String),
}

/// A product in the mock catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub stock: i64,
}

impl CatalogEntry {
    /// A product with `stock` units priced at `price_cents / 100`.
    #[must_use]
    pub fn new(id: i32, name: &str, price_cents: i64, stock: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            price: Decimal::new(price_cents, 2),
            description: None,
            image_url: Some(format!("https://cdn.example/{id}.jpg")),
            stock,
        }
    }
}

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Parsed JSON body, `Null` when absent or not JSON.
    pub body: Value,
}

#[derive(Debug, Clone)]
struct Account {
    id: i64,
    email: String,
    username: String,
    password: String,
}

#[derive(Debug, Clone)]
struct OrderRecord {
    id: i32,
    key: CartKey,
    /// `(product_id, name, quantity, unit price)`
    items: Vec<(i32, String, i64, Decimal)>,
    total: Decimal,
    status: &'static str,
    payer: Option<String>,
}

impl OrderRecord {
    fn tx_ref(&self) -> String {
        format!("tx-{}", self.id)
    }
}

#[derive(Default)]
struct BackendState {
    accounts: Vec<Account>,
    carts: HashMap<CartKey, Vec<(i32, i64)>>,
    catalog: HashMap<i32, CatalogEntry>,
    orders: Vec<OrderRecord>,
    addresses: Vec<(CartKey, Value)>,
    failing: Vec<(Method, String)>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<BackendState>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process storefront backend on an ephemeral port.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Shared,
}

impl MockBackend {
    /// Bind to `127.0.0.1:0` and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let shared = Shared::default();
        let app = router(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, shared }
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend, with state in a fresh
    /// temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the URL does not parse.
    #[must_use]
    pub fn config(&self) -> ShopperConfig {
        let mut config = ShopperConfig::new(self.url().parse().expect("Invalid backend URL"));
        config.state_dir = temp_state_dir();
        config
    }

    /// A new client with its own cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> ShopperClient {
        ShopperClient::new(&self.config()).expect("Failed to create client")
    }

    pub fn add_product(&self, entry: CatalogEntry) {
        self.shared.lock().catalog.insert(entry.id, entry);
    }

    /// Delete a product; cart lines referencing it stay.
    pub fn remove_product(&self, id: i32) {
        self.shared.lock().catalog.remove(&id);
    }

    /// Create an account and return its user id.
    ///
    /// Ids are numeric, as the backend issues them.
    pub fn add_account(&self, username: &str, email: &str, password: &str) -> String {
        let mut state = self.shared.lock();
        let id = next_account_id(&state);
        state.accounts.push(Account {
            id,
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        });
        id.to_string()
    }

    pub fn seed_cart(&self, key: CartKey, items: &[(i32, i64)]) {
        self.shared.lock().carts.insert(key, items.to_vec());
    }

    /// Current server cart for `key`.
    #[must_use]
    pub fn cart(&self, key: &CartKey) -> Vec<(i32, i64)> {
        self.shared.lock().carts.get(key).cloned().unwrap_or_default()
    }

    /// Answer 500 to every `method` request whose path starts with `prefix`.
    pub fn fail(&self, method: Method, prefix: &str) {
        self.shared.lock().failing.push((method, prefix.to_string()));
    }

    /// Status of an order, if it exists.
    #[must_use]
    pub fn order_status(&self, order_id: i32) -> Option<&'static str> {
        self.shared
            .lock()
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.status)
    }

    pub fn recover(&self) {
        self.shared.lock().failing.clear();
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.lock().requests.clone()
    }

    /// Requests matching `method` and exact `path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == *method && r.path == path)
            .collect()
    }
}

/// A unique directory under the system temp dir.
#[must_use]
pub fn temp_state_dir() -> PathBuf {
    std::env::temp_dir().join(format!(
        "shopper-it-{}",
        shopper_core::GuestId::generate()
    ))
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/user/decode", get(decode))
        .route("/user/signin", post(sign_in))
        .route("/user/", post(register))
        .route("/cart/getcart", get(get_cart))
        .route("/cart/addItem", post(add_item))
        .route(
            "/cart/guest/item/{product_id}",
            patch(update_guest_item).delete(delete_guest_item),
        )
        .route(
            "/cart/{user_id}/items/{product_id}",
            patch(update_user_item).delete(delete_user_item),
        )
        .route("/cart/remove/{user_id}", delete(clear_user_cart))
        .route("/cart/clear/guest", delete(clear_guest_cart))
        .route("/cart/merge/", post(merge))
        .route("/product/search", post(search))
        .route("/product/paginate", get(paginate))
        .route("/product/{id}", get(product))
        .route("/order", post(create_guest_order))
        .route("/order/{user_id}", post(create_user_order))
        .route("/order/pay/{order_id}/payment", post(initiate_payment))
        .route("/order/confirmpayment", get(confirm_payment))
        .route("/order/history/{user_id}", get(order_history))
        .route("/address", get(get_address).post(save_address))
        .layer(from_fn_with_state(shared.clone(), record_and_inject))
        .with_state(shared)
}

// =============================================================================
// Middleware
// =============================================================================

async fn record_and_inject(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(bytes) = to_bytes(body, 1024 * 1024).await else {
        return error(StatusCode::BAD_REQUEST, "unreadable body");
    };

    let recorded = RecordedRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    };

    let fail = {
        let mut state = shared.lock();
        let fail = state
            .failing
            .iter()
            .any(|(method, prefix)| *method == recorded.method && recorded.path.starts_with(prefix));
        state.requests.push(recorded);
        fail
    };
    if fail {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "injected failure");
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// =============================================================================
// Helpers
// =============================================================================

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn user_json(account: &Account) -> Value {
    json!({
        "id": account.id,
        "email": account.email,
        "username": account.username,
    })
}

fn session_account<'a>(state: &'a BackendState, headers: &HeaderMap) -> Option<&'a Account> {
    let token = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| pair.trim().strip_prefix("token="))?;
    state.accounts.iter().find(|a| a.id.to_string() == token)
}

fn next_account_id(state: &BackendState) -> i64 {
    i64::try_from(state.accounts.len()).map_or(i64::MAX, |n| n + 1)
}

/// Accept an id sent either as a JSON number or a string.
fn id_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn add_quantity(items: &mut Vec<(i32, i64)>, product_id: i32, quantity: i64) {
    match items.iter_mut().find(|(id, _)| *id == product_id) {
        Some((_, existing)) => *existing += quantity,
        None => items.push((product_id, quantity)),
    }
}

fn set_quantity(state: &mut BackendState, key: &CartKey, product_id: i32, quantity: i64) -> Response {
    let line = state
        .carts
        .get_mut(key)
        .and_then(|items| items.iter_mut().find(|(id, _)| *id == product_id));
    match line {
        Some((_, existing)) => {
            *existing = quantity;
            Json(json!({ "message": "updated" })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Cart item not found"),
    }
}

fn remove_line(state: &mut BackendState, key: &CartKey, product_id: i32) -> Response {
    if let Some(items) = state.carts.get_mut(key) {
        items.retain(|(id, _)| *id != product_id);
    }
    Json(json!({ "message": "removed" })).into_response()
}

// =============================================================================
// User Routes
// =============================================================================

#[derive(Deserialize)]
struct SignInBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn decode(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let state = shared.lock();
    session_account(&state, &headers).map_or_else(
        || error(StatusCode::UNAUTHORIZED, "Not authenticated"),
        |account| Json(user_json(account)).into_response(),
    )
}

async fn sign_in(State(shared): State<Shared>, Json(body): Json<SignInBody>) -> Response {
    let state = shared.lock();
    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.email == body.email && a.password == body.password)
    else {
        return error(StatusCode::BAD_REQUEST, "Invalid credentials");
    };

    (
        [(
            header::SET_COOKIE,
            format!("token={}; Path=/; HttpOnly", account.id),
        )],
        Json(json!({ "user": user_json(account) })),
    )
        .into_response()
}

async fn register(State(shared): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let mut state = shared.lock();
    if state.accounts.iter().any(|a| a.email == body.email) {
        return error(StatusCode::CONFLICT, "User already exists");
    }

    let account = Account {
        id: next_account_id(&state),
        email: body.email,
        username: body.username,
        password: body.password,
    };
    let response = (
        StatusCode::CREATED,
        Json(json!({ "user": user_json(&account) })),
    )
        .into_response();
    state.accounts.push(account);
    response
}

// =============================================================================
// Cart Routes
// =============================================================================

#[derive(Deserialize)]
struct OwnerQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "guestId")]
    guest_id: Option<String>,
}

#[derive(Deserialize)]
struct AddItemBody {
    #[serde(default, deserialize_with = "id_text")]
    user_id: Option<String>,
    guest_id: Option<String>,
    product_id: i32,
    quantity: i64,
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: i64,
}

#[derive(Deserialize)]
struct GuestQuantityBody {
    quantity: i64,
    #[serde(rename = "guestId")]
    guest_id: String,
}

#[derive(Deserialize)]
struct GuestBody {
    #[serde(rename = "guestId")]
    guest_id: String,
}

fn owner_key(user_id: Option<String>, guest_id: Option<String>) -> Option<CartKey> {
    user_id
        .map(CartKey::User)
        .or_else(|| guest_id.map(CartKey::Guest))
}

async fn get_cart(State(shared): State<Shared>, Query(query): Query<OwnerQuery>) -> Response {
    let Some(key) = owner_key(query.user_id, query.guest_id) else {
        return error(StatusCode::BAD_REQUEST, "userId or guestId is required");
    };

    let state = shared.lock();
    let items: Vec<Value> = state
        .carts
        .get(&key)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|&(product_id, quantity)| {
            let product = state.catalog.get(&product_id).map(|p| {
                json!({
                    "name": p.name,
                    "price": p.price,
                    "image_url": p.image_url,
                    "inventory": { "quantity_available": p.stock },
                })
            });
            json!({
                "product_id": product_id,
                "quantity": quantity,
                "product": product,
            })
        })
        .collect();

    Json(json!({ "cart_items": items })).into_response()
}

async fn add_item(State(shared): State<Shared>, Json(body): Json<AddItemBody>) -> Response {
    let Some(key) = owner_key(body.user_id, body.guest_id) else {
        return error(StatusCode::BAD_REQUEST, "user_id or guest_id is required");
    };

    let mut state = shared.lock();
    if !state.catalog.contains_key(&body.product_id) {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    add_quantity(
        state.carts.entry(key).or_default(),
        body.product_id,
        body.quantity,
    );
    (StatusCode::CREATED, Json(json!({ "message": "added" }))).into_response()
}

async fn update_user_item(
    State(shared): State<Shared>,
    Path((user_id, product_id)): Path<(String, i32)>,
    Json(body): Json<QuantityBody>,
) -> Response {
    set_quantity(
        &mut shared.lock(),
        &CartKey::User(user_id),
        product_id,
        body.quantity,
    )
}

async fn update_guest_item(
    State(shared): State<Shared>,
    Path(product_id): Path<i32>,
    Json(body): Json<GuestQuantityBody>,
) -> Response {
    set_quantity(
        &mut shared.lock(),
        &CartKey::Guest(body.guest_id),
        product_id,
        body.quantity,
    )
}

async fn delete_user_item(
    State(shared): State<Shared>,
    Path((user_id, product_id)): Path<(String, i32)>,
) -> Response {
    remove_line(&mut shared.lock(), &CartKey::User(user_id), product_id)
}

async fn delete_guest_item(
    State(shared): State<Shared>,
    Path(product_id): Path<i32>,
    Json(body): Json<GuestBody>,
) -> Response {
    remove_line(&mut shared.lock(), &CartKey::Guest(body.guest_id), product_id)
}

async fn clear_user_cart(State(shared): State<Shared>, Path(user_id): Path<String>) -> Response {
    shared.lock().carts.remove(&CartKey::User(user_id));
    Json(json!({ "message": "cleared" })).into_response()
}

async fn clear_guest_cart(State(shared): State<Shared>, Query(query): Query<OwnerQuery>) -> Response {
    let Some(guest_id) = query.guest_id else {
        return error(StatusCode::BAD_REQUEST, "guestId is required");
    };
    shared.lock().carts.remove(&CartKey::Guest(guest_id));
    Json(json!({ "message": "cleared" })).into_response()
}

async fn merge(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
    Json(body): Json<GuestBody>,
) -> Response {
    let mut state = shared.lock();
    let Some(user_id) = session_account(&state, &headers).map(|a| a.id.to_string()) else {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    if query.guest_id.as_deref() != Some(body.guest_id.as_str()) {
        return error(StatusCode::BAD_REQUEST, "guestId mismatch");
    }

    let guest_items = state
        .carts
        .remove(&CartKey::Guest(body.guest_id))
        .unwrap_or_default();
    let items = state.carts.entry(CartKey::User(user_id)).or_default();
    for (product_id, quantity) in guest_items {
        add_quantity(items, product_id, quantity);
    }
    Json(json!({ "message": "merged" })).into_response()
}

// =============================================================================
// Product Routes
// =============================================================================

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "productName")]
    product_name: String,
}

async fn product(State(shared): State<Shared>, Path(id): Path<i32>) -> Response {
    let state = shared.lock();
    let Some(p) = state.catalog.get(&id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };

    Json(json!({
        "data": {
            "id": p.id,
            "name": p.name,
            "price": p.price,
            "description": p.description,
            "image_url": p.image_url,
            "outOfStock": p.stock <= 0,
            "inventory": { "quantity_available": p.stock },
        }
    }))
    .into_response()
}

async fn search(State(shared): State<Shared>, Json(body): Json<SearchBody>) -> Response {
    let needle = body.product_name.to_lowercase();
    let state = shared.lock();
    let mut hits: Vec<&CatalogEntry> = state
        .catalog
        .values()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect();
    hits.sort_by_key(|p| p.id);

    let hits: Vec<Value> = hits
        .into_iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "price": p.price,
                "image_url": p.image_url,
            })
        })
        .collect();
    Json(hits).into_response()
}

#[derive(Deserialize)]
struct PageQuery {
    page: usize,
    limit: usize,
}

async fn paginate(State(shared): State<Shared>, Query(query): Query<PageQuery>) -> Response {
    if query.page == 0 || query.limit == 0 {
        return error(StatusCode::BAD_REQUEST, "page and limit must be positive");
    }

    let state = shared.lock();
    let mut products: Vec<&CatalogEntry> = state.catalog.values().collect();
    products.sort_by_key(|p| p.id);
    let total_pages = products.len().div_ceil(query.limit);

    let page: Vec<Value> = products
        .into_iter()
        .skip((query.page - 1) * query.limit)
        .take(query.limit)
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "image_url": p.image_url,
                "price": p.price,
                "maxQuantity": p.stock,
            })
        })
        .collect();

    Json(json!({ "products": page, "totalPages": total_pages })).into_response()
}

// =============================================================================
// Order Routes
// =============================================================================

/// Fixed delivery charge added to every payment.
const DELIVERY_AMOUNT: i64 = 1500;

const PAID_AT: &str = "2025-01-15T10:00:00.000Z";

#[derive(Deserialize)]
struct PaymentBody {
    email: String,
}

#[derive(Deserialize)]
struct TxQuery {
    tx_ref: String,
}

fn order_json(order: &OrderRecord) -> Value {
    let items: Vec<Value> = order
        .items
        .iter()
        .map(|(_, name, quantity, price)| {
            json!({
                "quantity": quantity,
                "created_at": PAID_AT,
                "product_name": name,
                "price": price,
            })
        })
        .collect();
    json!({
        "id": order.id,
        "total_price": order.total,
        "status": order.status,
        "Order_items": items,
    })
}

fn create_order(shared: &Shared, key: CartKey) -> Response {
    let mut state = shared.lock();
    let items: Vec<(i32, String, i64, Decimal)> = state
        .carts
        .get(&key)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|&(product_id, quantity)| {
            let p = state.catalog.get(&product_id)?;
            Some((product_id, p.name.clone(), quantity, p.price))
        })
        .collect();
    if items.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let order = OrderRecord {
        id: i32::try_from(state.orders.len()).map_or(i32::MAX, |n| n + 1),
        key,
        total: items
            .iter()
            .map(|(_, _, quantity, price)| *price * Decimal::from(*quantity))
            .sum(),
        items,
        status: "pending",
        payer: None,
    };
    let response = (StatusCode::CREATED, Json(order_json(&order))).into_response();
    state.orders.push(order);
    response
}

async fn create_user_order(State(shared): State<Shared>, Path(user_id): Path<String>) -> Response {
    create_order(&shared, CartKey::User(user_id))
}

async fn create_guest_order(State(shared): State<Shared>, Query(query): Query<OwnerQuery>) -> Response {
    let Some(guest_id) = query.guest_id else {
        return error(StatusCode::BAD_REQUEST, "guestId is required");
    };
    create_order(&shared, CartKey::Guest(guest_id))
}

async fn initiate_payment(
    State(shared): State<Shared>,
    Path(order_id): Path<i32>,
    Json(body): Json<PaymentBody>,
) -> Response {
    let mut state = shared.lock();
    let Some(order) = state.orders.iter_mut().find(|o| o.id == order_id) else {
        return error(StatusCode::NOT_FOUND, "Order not found");
    };
    order.payer = Some(body.email);

    Json(json!({
        "id": order.id,
        "amount": order.total,
        "deliveryamount": Decimal::new(DELIVERY_AMOUNT, 2),
        "redirectUrl": format!("https://checkout.example/pay/{}", order.tx_ref()),
    }))
    .into_response()
}

async fn confirm_payment(State(shared): State<Shared>, Query(query): Query<TxQuery>) -> Response {
    let mut state = shared.lock();
    let Some(order) = state
        .orders
        .iter_mut()
        .find(|o| o.tx_ref() == query.tx_ref && o.payer.is_some())
    else {
        return Json(json!({ "error": "Transaction not found" })).into_response();
    };
    order.status = "paid";

    Json(json!({
        "id": order.id,
        "amount": order.total,
        "status": "successful",
        "orderId": order.id,
        "userEmail": order.payer,
        "date": PAID_AT,
        "processorReference": format!("proc-{}", order.id),
        "transactionReference": order.tx_ref(),
        "remarks": null,
        "deliveryamount": Decimal::new(DELIVERY_AMOUNT, 2),
    }))
    .into_response()
}

async fn order_history(State(shared): State<Shared>, Path(user_id): Path<String>) -> Response {
    let key = CartKey::User(user_id);
    let state = shared.lock();
    let history: Vec<Value> = state
        .orders
        .iter()
        .filter(|o| o.key == key && o.status == "paid")
        .map(|o| {
            let items: Vec<Value> = o
                .items
                .iter()
                .map(|(product_id, name, quantity, price)| {
                    json!({
                        "product_id": product_id,
                        "product_name": name,
                        "quantity": quantity,
                        "price": price,
                    })
                })
                .collect();
            json!({
                "status": o.status,
                "totalAmountPaid": o.total + Decimal::new(DELIVERY_AMOUNT, 2),
                "date": PAID_AT,
                "transactionRef": o.tx_ref(),
                "Order_items": items,
            })
        })
        .collect();
    Json(history).into_response()
}

// =============================================================================
// Address Routes
// =============================================================================

#[derive(Deserialize)]
struct AddressBody {
    name: String,
    email: String,
    phone: String,
    address: String,
    #[serde(default, deserialize_with = "id_text")]
    user_id: Option<String>,
    guest_id: Option<String>,
}

async fn get_address(State(shared): State<Shared>, Query(query): Query<OwnerQuery>) -> Response {
    let Some(user_id) = query.user_id else {
        return error(StatusCode::BAD_REQUEST, "userId is required");
    };
    let key = CartKey::User(user_id);
    let state = shared.lock();
    let address = state
        .addresses
        .iter()
        .rev()
        .find(|(owner, _)| *owner == key)
        .map(|(_, address)| address.clone());
    Json(address).into_response()
}

async fn save_address(State(shared): State<Shared>, Json(body): Json<AddressBody>) -> Response {
    if [&body.name, &body.email, &body.phone, &body.address]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return error(StatusCode::BAD_REQUEST, "All fields are required");
    }
    let Some(key) = owner_key(body.user_id.clone(), body.guest_id.clone()) else {
        return error(StatusCode::BAD_REQUEST, "user_id or guest_id is required");
    };

    let mut state = shared.lock();
    let address = json!({
        "id": state.addresses.len() + 1,
        "name": body.name,
        "email": body.email,
        "phone": body.phone,
        "address": body.address,
        "user_id": body.user_id.and_then(|id| id.parse::<i64>().ok()),
        "guest_id": body.guest_id,
    });
    state.addresses.push((key, address.clone()));
    (StatusCode::CREATED, Json(address)).into_response()
}
