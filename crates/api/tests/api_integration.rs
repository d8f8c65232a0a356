//! Integration tests for the storefront HTTP surface.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use common::{Money, OrderId, OrderItemId, OrderStatus, ProductId};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::InMemoryPaymentGateway;
use store::{InMemoryStore, NewProduct, Order, OrderItem, Product, Store, StoreError};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

const BASE_URL: &str = "http://shop.test";

struct TestApp {
    router: axum::Router,
    store: InMemoryStore,
    gateway: InMemoryPaymentGateway,
    state: Arc<api::AppState<InMemoryStore, InMemoryPaymentGateway>>,
}

async fn setup_with(gateway: InMemoryPaymentGateway) -> TestApp {
    let store = InMemoryStore::new();
    store
        .create_product(NewProduct::new("Mug", "Ceramic mug", Money::from_cents(899)))
        .await
        .unwrap();
    store
        .create_product(NewProduct::new("Cap", "Cotton cap", Money::from_cents(1500)))
        .await
        .unwrap();

    let state = api::create_state(store.clone(), gateway.clone(), BASE_URL);
    let router = api::create_app(state.clone(), get_metrics_handle());
    TestApp {
        router,
        store,
        gateway,
        state,
    }
}

async fn setup() -> TestApp {
    setup_with(InMemoryPaymentGateway::new()).await
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Returns the `name=value` part of the session cookie set by a response.
fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Adds the given quantity of a product and returns the session cookie.
async fn add_item(app: &TestApp, product_id: i64, quantity: u32, cookie: Option<&str>) -> String {
    let response = app
        .router
        .clone()
        .oneshot(post_form(
            &format!("/add_or_update_order_item/{product_id}/"),
            &format!("quantity={quantity}"),
            cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products/");

    match cookie {
        Some(cookie) => cookie.to_string(),
        None => session_cookie(&response),
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let response = app.router.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["payments"], "enabled");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;

    let response = app.router.oneshot(get("/metrics", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_catalog_for_new_visitor() {
    let app = setup().await;

    let response = app.router.oneshot(get("/products/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    let json = json_body(response).await;
    let products = json["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], "Mug");
    assert_eq!(products[0]["price"], "8.99");
    assert!(products[0]["quantity"].is_null());
    assert!(json["order"].is_null());
}

#[tokio::test]
async fn test_root_serves_catalog() {
    let app = setup().await;
    let response = app.router.oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_add_item_binds_order_to_session() {
    let app = setup().await;

    let cookie = add_item(&app, 1, 3, None).await;

    let response = app
        .router
        .clone()
        .oneshot(get("/products/", Some(&cookie)))
        .await
        .unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let json = json_body(response).await;
    assert_eq!(json["products"][0]["quantity"], 3);
    assert!(json["products"][1]["quantity"].is_null());
    assert_eq!(json["order"]["status"], "pending");
    assert_eq!(json["order"]["item_count"], 1);
    assert_eq!(json["order"]["total_cents"], 3 * 899);
    assert_eq!(app.store.order_count().await, 1);
}

#[tokio::test]
async fn test_other_visitors_do_not_see_cart() {
    let app = setup().await;
    add_item(&app, 1, 2, None).await;

    let response = app.router.oneshot(get("/products/", None)).await.unwrap();
    let json = json_body(response).await;
    assert!(json["order"].is_null());
    assert!(json["products"][0]["quantity"].is_null());
}

#[tokio::test]
async fn test_update_then_remove_last_item_deletes_order() {
    let app = setup().await;
    let cookie = add_item(&app, 2, 1, None).await;
    add_item(&app, 2, 4, Some(&cookie)).await;
    assert_eq!(app.store.order_item_count().await, 1);

    add_item(&app, 2, 0, Some(&cookie)).await;

    assert_eq!(app.store.order_count().await, 0);
    assert_eq!(app.state.sessions.bound_count().await, 0);
    let response = app
        .router
        .oneshot(get("/products/", Some(&cookie)))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert!(json["order"].is_null());
}

#[tokio::test]
async fn test_missing_quantity_defaults_to_zero() {
    let app = setup().await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/add_or_update_order_item/1/", "", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_non_integer_quantity_is_rejected() {
    let app = setup().await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/add_or_update_order_item/1/", "quantity=lots", None))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(post_form("/add_or_update_order_item/99/", "quantity=1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn test_order_details() {
    let app = setup().await;
    let cookie = add_item(&app, 1, 2, None).await;
    add_item(&app, 2, 1, Some(&cookie)).await;

    let response = app
        .router
        .oneshot(get("/order_details/1/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][0]["product_name"], "Mug");
    assert_eq!(json["items"][0]["line_total_cents"], 2 * 899);
    assert_eq!(json["total_cents"], 2 * 899 + 1500);
    assert_eq!(json["total"], "32.98");
}

#[tokio::test]
async fn test_order_details_not_found() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(get("/order_details/12345/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_process_payment_redirects_to_gateway() {
    let app = setup().await;
    let cookie = add_item(&app, 1, 2, None).await;
    add_item(&app, 2, 1, Some(&cookie)).await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/process_payment/", "", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "https://checkout.example.test/cs_test_0001"
    );
    let request = app.gateway.last_request().unwrap();
    assert_eq!(request.amount_minor, 2 * 899 + 1500);
    assert_eq!(request.success_url, "http://shop.test/successful_payment/");

    let order = app.store.get_order(OrderId::new(1)).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Active);
}

#[tokio::test]
async fn test_process_payment_without_gateway_shows_order() {
    let app = setup_with(InMemoryPaymentGateway::unconfigured()).await;
    let cookie = add_item(&app, 1, 1, None).await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/process_payment/", "", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "http://shop.test/order_details/1/");
    let order = app.store.get_order(OrderId::new(1)).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_process_payment_without_cart_is_bad_request() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(post_form("/process_payment/", "", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gateway_failure_is_bad_gateway() {
    let app = setup().await;
    app.gateway.set_fail_on_checkout(true);
    let cookie = add_item(&app, 1, 1, None).await;

    let response = app
        .router
        .oneshot(post_form("/process_payment/", "", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_successful_payment_completes_order() {
    let app = setup().await;
    let cookie = add_item(&app, 2, 1, None).await;
    app.router
        .clone()
        .oneshot(post_form("/process_payment/", "", Some(&cookie)))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/successful_payment/", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["order_id"], 1);
    assert_eq!(json["outcome"], "completed");

    let order = app.store.get_order(OrderId::new(1)).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(app.state.sessions.bound_count().await, 0);

    // the next add starts a fresh cart
    add_item(&app, 1, 1, Some(&cookie)).await;
    assert_eq!(app.store.order_count().await, 2);
}

#[tokio::test]
async fn test_cancelled_payment_keeps_status() {
    let app = setup().await;
    let cookie = add_item(&app, 1, 1, None).await;
    app.router
        .clone()
        .oneshot(post_form("/process_payment/", "", Some(&cookie)))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/cancelled_payment/", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["order_id"], 1);
    assert_eq!(json["outcome"], "cancelled");

    let order = app.store.get_order(OrderId::new(1)).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Active);
    assert_eq!(app.state.sessions.bound_count().await, 0);
}

#[tokio::test]
async fn test_return_urls_without_session() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(get("/successful_payment/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["order_id"].is_null());
}

#[tokio::test]
async fn test_quantity_above_line_limit_is_rejected() {
    let app = setup().await;

    let response = app
        .router
        .clone()
        .oneshot(post_form(
            "/add_or_update_order_item/1/",
            "quantity=2147483648",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_overflowing_total_is_unprocessable() {
    let app = setup().await;
    let yacht = app
        .store
        .create_product(NewProduct::new("Yacht", "", Money::from_cents(9_999_999_999)))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(post_form(
            &format!("/add_or_update_order_item/{}/", yacht.id),
            "quantity=1000000000",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.store.order_count().await, 0);

    let response = app.router.oneshot(get("/products/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Store whose item inserts always fail, after the order row exists.
#[derive(Clone, Default)]
struct FailingItemStore {
    inner: InMemoryStore,
}

#[async_trait]
impl Store for FailingItemStore {
    async fn list_products(&self) -> store::Result<Vec<Product>> {
        self.inner.list_products().await
    }

    async fn get_product(&self, product_id: ProductId) -> store::Result<Option<Product>> {
        self.inner.get_product(product_id).await
    }

    async fn create_product(&self, product: NewProduct) -> store::Result<Product> {
        self.inner.create_product(product).await
    }

    async fn create_order(&self) -> store::Result<Order> {
        self.inner.create_order().await
    }

    async fn get_order(&self, order_id: OrderId) -> store::Result<Option<Order>> {
        self.inner.get_order(order_id).await
    }

    async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> store::Result<bool> {
        self.inner.set_order_status(order_id, status).await
    }

    async fn delete_order(&self, order_id: OrderId) -> store::Result<bool> {
        self.inner.delete_order(order_id).await
    }

    async fn list_order_items(&self, order_id: OrderId) -> store::Result<Vec<OrderItem>> {
        self.inner.list_order_items(order_id).await
    }

    async fn find_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> store::Result<Option<OrderItem>> {
        self.inner.find_order_item(order_id, product_id).await
    }

    async fn create_order_item(
        &self,
        _order_id: OrderId,
        _product_id: ProductId,
        _quantity: u32,
    ) -> store::Result<OrderItem> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn update_order_item_quantity(
        &self,
        item_id: OrderItemId,
        quantity: u32,
    ) -> store::Result<bool> {
        self.inner.update_order_item_quantity(item_id, quantity).await
    }

    async fn delete_order_item(&self, item_id: OrderItemId) -> store::Result<bool> {
        self.inner.delete_order_item(item_id).await
    }

    async fn count_order_items(&self, order_id: OrderId) -> store::Result<u64> {
        self.inner.count_order_items(order_id).await
    }

    async fn order_total(&self, order_id: OrderId) -> store::Result<Money> {
        self.inner.order_total(order_id).await
    }
}

#[tokio::test]
async fn test_failed_first_add_still_hands_out_cookie() {
    let store = FailingItemStore::default();
    store
        .create_product(NewProduct::new("Mug", "Ceramic mug", Money::from_cents(899)))
        .await
        .unwrap();
    let state = api::create_state(store.clone(), InMemoryPaymentGateway::new(), BASE_URL);
    let router = api::create_app(state.clone(), get_metrics_handle());

    let response = router
        .clone()
        .oneshot(post_form("/add_or_update_order_item/1/", "quantity=2", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let cookie = session_cookie(&response);
    assert_eq!(state.sessions.bound_count().await, 1);

    // the order created before the failure is reachable through the cookie
    let response = router
        .oneshot(get("/products/", Some(&cookie)))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["order"]["id"], 1);
    assert_eq!(json["order"]["item_count"], 0);
}
