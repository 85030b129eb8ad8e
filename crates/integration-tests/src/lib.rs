//! Integration tests for Kaimono.
//!
//! The tests in `tests/` drive the storefront library against [`MockApi`], an
//! in-process stand-in for the ProductAPI served by `axum` on an ephemeral
//! port. It implements just enough of the real API (same paths, same
//! FastAPI-style `{"detail": ...}` errors, same token handling) to exercise
//! the full shopping flow.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kaimono-integration-tests
//! ```
//!
//! # Fixtures
//!
//! | User | Password | Role |
//! |---|---|---|
//! | `admin` | `adminpass` | admin |
//! | `mika` | `secret` | user |
//! | `ken` | `hunter2` | user |
//!
//! Products 1-3 are available; product 4 is sold out. See [`MockApi::start`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use kaimono_storefront::StorefrontConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Timestamp stamped on every order the mock creates.
pub const ORDER_CREATED_AT: &str = "2025-04-02T09:30:15";

// =============================================================================
// Mock data
// =============================================================================

#[derive(Debug, Clone)]
struct MockUser {
    id: i64,
    username: String,
    email: String,
    password: String,
    role: &'static str,
    is_active: bool,
}

impl MockUser {
    fn new(id: i64, username: &str, password: &str, role: &'static str) -> Self {
        Self {
            id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password: password.to_owned(),
            role,
            is_active: true,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "role": self.role,
            "is_active": self.is_active,
            "created_at": "2025-01-01T00:00:00",
        })
    }
}

#[derive(Debug, Clone)]
struct MockProduct {
    id: i64,
    name: String,
    price: f64,
    category_id: i64,
    seller_id: i64,
    stock: i64,
    status: &'static str,
}

#[derive(Debug, Default)]
struct MockData {
    categories: Vec<(i64, &'static str, &'static str)>,
    users: Vec<MockUser>,
    products: Vec<MockProduct>,
    orders: Vec<Value>,
    submitted: Vec<Value>,
    hits: HashMap<&'static str, usize>,
    fail_orders: bool,
}

impl MockData {
    fn seeded() -> Self {
        let product = |id, name: &str, price, category_id, stock, status| MockProduct {
            id,
            name: name.to_owned(),
            price,
            category_id,
            seller_id: 2,
            stock,
            status,
        };

        Self {
            categories: vec![(1, "tops", "Tops"), (2, "bottoms", "Bottoms"), (3, "outer", "Outerwear")],
            users: vec![
                MockUser::new(1, "admin", "adminpass", "admin"),
                MockUser::new(2, "mika", "secret", "user"),
                MockUser::new(3, "ken", "hunter2", "user"),
            ],
            products: vec![
                product(1, "Linen tee", 1000.0, 1, 10, "available"),
                product(2, "Wide pants", 2500.0, 2, 5, "available"),
                product(3, "Denim jacket", 8900.0, 3, 1, "available"),
                product(4, "Striped shirt", 1500.0, 1, 0, "sold"),
            ],
            ..Self::default()
        }
    }

    fn hit(&mut self, endpoint: &'static str) {
        *self.hits.entry(endpoint).or_default() += 1;
    }

    fn product_json(&self, product: &MockProduct) -> Value {
        let category = self
            .categories
            .iter()
            .find(|(id, ..)| *id == product.category_id)
            .map(|(id, slug, name)| json!({"id": id, "slug": slug, "name": name}));
        let seller = self
            .users
            .iter()
            .find(|u| u.id == product.seller_id)
            .map(MockUser::to_json);

        json!({
            "id": product.id,
            "name": product.name,
            "description": format!("{} from the mock catalog", product.name),
            "price": product.price,
            "category_id": product.category_id,
            "seller_id": product.seller_id,
            "image_url": format!("/images/{}.jpg", product.id),
            "stock": product.stock,
            "is_active": true,
            "status": product.status,
            "category": category,
            "seller": seller,
        })
    }

    fn products_json<'a>(&self, products: impl Iterator<Item = &'a MockProduct>) -> Value {
        Value::Array(products.map(|p| self.product_json(p)).collect())
    }

    fn user_by_token(&self, token: &str) -> Result<MockUser, Detail> {
        token
            .strip_prefix("token-")
            .and_then(|name| self.users.iter().find(|u| u.username == name))
            .cloned()
            .ok_or_else(|| Detail::new(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }

    fn user_by_bearer(&self, headers: &HeaderMap) -> Result<MockUser, Detail> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| Detail::new(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
        self.user_by_token(token)
    }

    fn admin_by_bearer(&self, headers: &HeaderMap) -> Result<MockUser, Detail> {
        let user = self.user_by_bearer(headers)?;
        if user.role == "admin" {
            Ok(user)
        } else {
            Err(Detail::new(StatusCode::FORBIDDEN, "Admin access required"))
        }
    }
}

type Shared = Arc<Mutex<MockData>>;

fn lock(data: &Shared) -> MutexGuard<'_, MockData> {
    data.lock().expect("mock ProductAPI state poisoned")
}

/// FastAPI-style error body.
#[derive(Debug)]
struct Detail(StatusCode, String);

impl Detail {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self(status, detail.into())
    }
}

impl IntoResponse for Detail {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

type Reply = Result<Json<Value>, Detail>;

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct TokenQuery {
    token: String,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct OrderItemBody {
    product_id: i64,
    quantity: i64,
    price: f64,
}

#[derive(Deserialize)]
struct OrderBody {
    shipping_name: String,
    shipping_phone: String,
    shipping_address: String,
    items: Vec<OrderItemBody>,
}

#[derive(Deserialize)]
struct UserUpdateBody {
    username: Option<String>,
    email: Option<String>,
    role: Option<String>,
    is_active: Option<bool>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct ProductUpdateBody {
    name: Option<String>,
    price: Option<f64>,
    category_id: Option<i64>,
    stock: Option<i64>,
    status: Option<String>,
}

fn role_name(role: &str) -> Result<&'static str, Detail> {
    match role {
        "user" => Ok("user"),
        "admin" => Ok("admin"),
        other => Err(Detail::new(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid role: {other}"))),
    }
}

fn status_name(status: &str) -> Result<&'static str, Detail> {
    match status {
        "available" => Ok("available"),
        "sold" => Ok("sold"),
        "deleted" => Ok("deleted"),
        other => Err(Detail::new(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid status: {other}"))),
    }
}

#[derive(Deserialize)]
struct NewProductBody {
    name: String,
    price: f64,
    category_id: i64,
    #[serde(default)]
    stock: i64,
}

async fn list_products(State(data): State<Shared>) -> Json<Value> {
    let mut data = lock(&data);
    data.hit("list_products");
    let products = data.products.iter().filter(|p| p.status != "deleted");
    Json(data.products_json(products))
}

async fn get_product(State(data): State<Shared>, UrlPath(id): UrlPath<i64>) -> Reply {
    let data = lock(&data);
    data.products
        .iter()
        .find(|p| p.id == id && p.status != "deleted")
        .map(|p| Json(data.product_json(p)))
        .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "Product not found"))
}

async fn list_categories(State(data): State<Shared>) -> Json<Value> {
    let data = lock(&data);
    Json(Value::Array(
        data.categories
            .iter()
            .map(|(id, slug, name)| json!({"id": id, "slug": slug, "name": name}))
            .collect(),
    ))
}

async fn get_user(State(data): State<Shared>, UrlPath(id): UrlPath<i64>) -> Reply {
    let data = lock(&data);
    data.users
        .iter()
        .find(|u| u.id == id)
        .map(|u| Json(u.to_json()))
        .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "User not found"))
}

async fn user_products(State(data): State<Shared>, UrlPath(user_id): UrlPath<i64>) -> Json<Value> {
    let data = lock(&data);
    let products = data
        .products
        .iter()
        .filter(|p| p.seller_id == user_id && p.status == "available");
    Json(data.products_json(products))
}

async fn login(State(data): State<Shared>, Form(form): Form<LoginForm>) -> Reply {
    let data = lock(&data);
    let user = data
        .users
        .iter()
        .find(|u| u.username == form.username && u.password == form.password)
        .ok_or_else(|| Detail::new(StatusCode::UNAUTHORIZED, "Incorrect username or password"))?;
    if !user.is_active {
        return Err(Detail::new(StatusCode::BAD_REQUEST, "Inactive user"));
    }
    Ok(Json(json!({
        "access_token": format!("token-{}", user.username),
        "token_type": "bearer",
        "username": user.username,
        "role": user.role,
        "user_id": user.id,
    })))
}

async fn register(State(data): State<Shared>, Json(body): Json<RegisterBody>) -> Reply {
    let mut data = lock(&data);
    if data.users.iter().any(|u| u.username == body.username) {
        return Err(Detail::new(StatusCode::BAD_REQUEST, "Username already registered"));
    }
    let id = data.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
    let user = MockUser {
        id,
        username: body.username,
        email: body.email,
        password: body.password,
        role: "user",
        is_active: true,
    };
    let json = user.to_json();
    data.users.push(user);
    Ok(Json(json))
}

async fn me(State(data): State<Shared>, headers: HeaderMap) -> Reply {
    let data = lock(&data);
    Ok(Json(data.user_by_bearer(&headers)?.to_json()))
}

async fn create_order(
    State(data): State<Shared>,
    Query(query): Query<TokenQuery>,
    Json(raw): Json<Value>,
) -> Reply {
    let mut data = lock(&data);
    data.hit("create_order");
    let user = data.user_by_token(&query.token)?;

    if data.fail_orders {
        return Err(Detail::new(StatusCode::SERVICE_UNAVAILABLE, "Order service unavailable"));
    }

    let order: OrderBody = serde_json::from_value(raw.clone())
        .map_err(|e| Detail::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    if order.items.is_empty() {
        return Err(Detail::new(StatusCode::BAD_REQUEST, "Order has no items"));
    }
    for item in &order.items {
        let product = data
            .products
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "Product not found"))?;
        if product.stock < item.quantity {
            return Err(Detail::new(
                StatusCode::BAD_REQUEST,
                format!("Insufficient stock for {}", product.name),
            ));
        }
    }

    for item in &order.items {
        if let Some(product) = data.products.iter_mut().find(|p| p.id == item.product_id) {
            product.stock -= item.quantity;
            if product.stock == 0 {
                product.status = "sold";
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let total: f64 = order.items.iter().map(|i| i.price * i.quantity as f64).sum();
    let id = i64::try_from(data.orders.len()).unwrap_or(i64::MAX) + 1;
    let created = json!({
        "id": id,
        "user_id": user.id,
        "total_amount": total,
        "status": "pending",
        "shipping_name": order.shipping_name,
        "shipping_phone": order.shipping_phone,
        "shipping_address": order.shipping_address,
        "created_at": ORDER_CREATED_AT,
        "order_items": order.items.iter().enumerate().map(|(n, i)| json!({
            "id": n + 1,
            "product_id": i.product_id,
            "quantity": i.quantity,
            "price": i.price,
        })).collect::<Vec<_>>(),
    });

    data.submitted.push(raw);
    data.orders.push(created.clone());
    Ok(Json(created))
}

async fn list_orders(State(data): State<Shared>, Query(query): Query<TokenQuery>) -> Reply {
    let data = lock(&data);
    let user = data.user_by_token(&query.token)?;
    let orders: Vec<Value> = data
        .orders
        .iter()
        .rev()
        .filter(|o| o["user_id"] == user.id)
        .cloned()
        .collect();
    Ok(Json(Value::Array(orders)))
}

async fn get_order(
    State(data): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    Query(query): Query<TokenQuery>,
) -> Reply {
    let data = lock(&data);
    let user = data.user_by_token(&query.token)?;
    data.orders
        .iter()
        .find(|o| o["id"] == id && o["user_id"] == user.id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "Order not found"))
}

async fn my_products(State(data): State<Shared>, Query(query): Query<TokenQuery>) -> Reply {
    let data = lock(&data);
    let user = data.user_by_token(&query.token)?;
    let products = data
        .products
        .iter()
        .filter(|p| p.seller_id == user.id && p.status != "deleted");
    Ok(Json(data.products_json(products)))
}

async fn create_product(
    State(data): State<Shared>,
    Query(query): Query<TokenQuery>,
    Json(body): Json<NewProductBody>,
) -> Reply {
    let mut data = lock(&data);
    let user = data.user_by_token(&query.token)?;
    let product = MockProduct {
        id: data.products.iter().map(|p| p.id).max().unwrap_or(0) + 1,
        name: body.name,
        price: body.price,
        category_id: body.category_id,
        seller_id: user.id,
        stock: body.stock,
        status: "available",
    };
    let json = data.product_json(&product);
    data.products.push(product);
    Ok(Json(json))
}

async fn update_product(
    State(data): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    Query(query): Query<TokenQuery>,
    Json(body): Json<ProductUpdateBody>,
) -> Reply {
    let mut data = lock(&data);
    data.hit("update_product");
    let user = data.user_by_token(&query.token)?;
    let status = body.status.as_deref().map(status_name).transpose()?;
    let product = data
        .products
        .iter_mut()
        .find(|p| p.id == id && p.status != "deleted")
        .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "Product not found"))?;
    if product.seller_id != user.id && user.role != "admin" {
        return Err(Detail::new(StatusCode::FORBIDDEN, "Not enough permissions"));
    }

    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(category_id) = body.category_id {
        product.category_id = category_id;
    }
    if let Some(stock) = body.stock {
        product.stock = stock;
    }
    if let Some(status) = status {
        product.status = status;
    }

    let product = product.clone();
    Ok(Json(data.product_json(&product)))
}

async fn delete_product(
    State(data): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    Query(query): Query<TokenQuery>,
) -> Reply {
    let mut data = lock(&data);
    let user = data.user_by_token(&query.token)?;
    let product = data
        .products
        .iter_mut()
        .find(|p| p.id == id && p.status != "deleted")
        .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "Product not found"))?;
    if product.seller_id != user.id && user.role != "admin" {
        return Err(Detail::new(StatusCode::FORBIDDEN, "Not enough permissions"));
    }
    product.status = "deleted";
    Ok(Json(json!({ "message": "Product deleted" })))
}

async fn admin_users(State(data): State<Shared>, headers: HeaderMap) -> Reply {
    let data = lock(&data);
    data.admin_by_bearer(&headers)?;
    Ok(Json(Value::Array(data.users.iter().map(MockUser::to_json).collect())))
}

async fn admin_update_user(
    State(data): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    headers: HeaderMap,
    Json(body): Json<UserUpdateBody>,
) -> Reply {
    let mut data = lock(&data);
    data.admin_by_bearer(&headers)?;
    let role = body.role.as_deref().map(role_name).transpose()?;
    let user = data
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "User not found"))?;

    if let Some(username) = body.username {
        user.username = username;
    }
    if let Some(email) = body.email {
        user.email = email;
    }
    if let Some(role) = role {
        user.role = role;
    }
    if let Some(is_active) = body.is_active {
        user.is_active = is_active;
    }
    if let Some(password) = body.password {
        user.password = password;
    }
    Ok(Json(json!({ "message": "User updated" })))
}

async fn admin_delete_user(
    State(data): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    headers: HeaderMap,
) -> Reply {
    let mut data = lock(&data);
    data.admin_by_bearer(&headers)?;
    let index = data
        .users
        .iter()
        .position(|u| u.id == id)
        .ok_or_else(|| Detail::new(StatusCode::NOT_FOUND, "User not found"))?;
    if data.users.get(index).is_some_and(|u| u.role == "admin") {
        return Err(Detail::new(StatusCode::BAD_REQUEST, "Cannot delete an admin user"));
    }
    data.users.remove(index);
    for product in data.products.iter_mut().filter(|p| p.seller_id == id) {
        product.status = "deleted";
    }
    Ok(Json(json!({ "message": "User deleted" })))
}

fn router(data: Shared) -> Router {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/categories", get(list_categories))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/products", get(user_products))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/me", get(me))
        .route("/api/orders/", get(list_orders).post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/my-products", get(my_products))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/users/{id}", put(admin_update_user).delete(admin_delete_user))
        .with_state(data)
}

// =============================================================================
// MockApi
// =============================================================================

/// A running mock ProductAPI. The server stops when this is dropped.
pub struct MockApi {
    base_url: String,
    data: Shared,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Start the server on an ephemeral localhost port with the fixture data.
    ///
    /// # Panics
    ///
    /// Panics if the port cannot be bound.
    pub async fn start() -> Self {
        let data: Shared = Arc::new(Mutex::new(MockData::seeded()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock ProductAPI");
        let addr = listener.local_addr().expect("Mock ProductAPI has no address");

        let app = router(Arc::clone(&data));
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock ProductAPI stopped");
        });

        Self {
            base_url: format!("http://{addr}"),
            data,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this server, with local slots under
    /// `data_dir`.
    ///
    /// # Panics
    ///
    /// Panics if the generated configuration is rejected.
    #[must_use]
    pub fn config(&self, data_dir: &Path) -> StorefrontConfig {
        let data_dir = data_dir.display().to_string();
        StorefrontConfig::from_lookup(|key| match key {
            "KAIMONO_API_URL" => Some(self.base_url.clone()),
            "KAIMONO_DATA_DIR" => Some(data_dir.clone()),
            _ => None,
        })
        .expect("Mock configuration is valid")
    }

    /// Make every following order submission fail with 503.
    pub fn fail_orders(&self, fail: bool) {
        lock(&self.data).fail_orders = fail;
    }

    /// Raw JSON bodies of every accepted order submission, oldest first.
    #[must_use]
    pub fn submitted_orders(&self) -> Vec<Value> {
        lock(&self.data).submitted.clone()
    }

    /// How often an endpoint was called (`list_products`, `update_product`,
    /// `create_order`).
    #[must_use]
    pub fn hits(&self, endpoint: &str) -> usize {
        lock(&self.data).hits.get(endpoint).copied().unwrap_or(0)
    }

    /// Current stock of a product.
    #[must_use]
    pub fn stock(&self, product_id: i64) -> Option<i64> {
        lock(&self.data)
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock)
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}
