#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use stockdash_api::{
    clock::ManualClock,
    config::AppConfig,
    events::{process_events, EventSender},
    store::EntityStore,
    AppState,
};
use tower::ServiceExt;

/// Noon UTC on a fixed day, so "today" and "yesterday" are stable.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new("127.0.0.1".into(), 18_080, "test".into());
    cfg.consumption.utc_offset_minutes = Some(0);
    cfg
}

/// Router plus handles on its state and clock, backed by an empty store.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub clock: ManualClock,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(cfg: AppConfig) -> Self {
        let clock = ManualClock::new(fixed_now());
        let (events, rx) = EventSender::channel(1024);
        let event_task = tokio::spawn(process_events(rx));
        let state = AppState::new(cfg, EntityStore::new(), Arc::new(clock.clone()), events);
        Self {
            router: stockdash_api::app(state.clone()),
            state,
            clock,
            _event_task: event_task,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Posts and returns the new record's id, asserting 201.
    pub async fn create(&self, uri: &str, body: Value) -> u64 {
        let (status, created) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {created}");
        created["id"].as_u64().expect("created record has an id")
    }
}

/// Ids of a minimal catalog: one store, caliber, tool, client and product.
pub struct Catalog {
    pub store: u64,
    pub caliber: u64,
    pub tool: u64,
    pub client: u64,
    pub product: u64,
}

pub async fn seed_catalog(app: &TestApp, cap: u64, stock: u64) -> Catalog {
    use serde_json::json;

    let store = app
        .create("/api/stores", json!({ "name": "Magasin 1", "location": "Paris" }))
        .await;
    let caliber = app
        .create("/api/calibers", json!({ "name": "Calibre A" }))
        .await;
    let tool = app
        .create(
            "/api/tools",
            json!({ "code": "XYZ-123", "name": "Tool XYZ", "maxDailyConsumption": cap }),
        )
        .await;
    let client = app
        .create(
            "/api/clients",
            json!({ "name": "Client A", "email": "clienta@example.com", "storeId": store }),
        )
        .await;
    let product = app
        .create(
            "/api/products",
            json!({
                "name": "Product A1",
                "caliberId": caliber,
                "storeId": store,
                "stock": stock
            }),
        )
        .await;
    Catalog {
        store,
        caliber,
        tool,
        client,
        product,
    }
}

pub fn consumption_body(catalog: &Catalog, quantity: u64) -> Value {
    serde_json::json!({
        "clientId": catalog.client,
        "productId": catalog.product,
        "toolId": catalog.tool,
        "storeId": catalog.store,
        "quantity": quantity
    })
}
