use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use sha2::Sha512;
use storefront_api::{
    auth::{self, AuthService},
    config::AppConfig,
    db,
    entities::{
        category, product,
        user::{self, UserRole},
        OrderModel, ProductModel,
    },
    events,
    handlers::AppServices,
    services::payments::PaymentGateway,
    AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const TEST_GATEWAY_SECRET: &str = "sk_test_webhook_secret";

/// Test harness: the full application router over a fresh SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: tempfile::TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a test application with a throwaway database and a gateway
    /// client pointing nowhere. Use [`TestApp::with_gateway`] when the test
    /// exercises outbound gateway calls.
    pub async fn new() -> Self {
        Self::with_gateway("http://127.0.0.1:9").await
    }

    /// Construct a test application whose payment gateway client targets
    /// `gateway_base_url` (typically a wiremock server).
    pub async fn with_gateway(gateway_base_url: &str) -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test db");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.paystack_secret_key = Some(TEST_GATEWAY_SECRET.to_string());
        cfg.paystack_base_url = gateway_base_url.to_string();
        cfg.payment_gateway_timeout_secs = 5;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_sender, event_rx) = events::event_channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(
            cfg.jwt_secret.clone(),
            cfg.jwt_expiration as i64,
        ));
        let gateway = PaymentGateway::new(
            cfg.paystack_base_url.clone(),
            TEST_GATEWAY_SECRET.to_string(),
            Duration::from_secs(cfg.payment_gateway_timeout_secs),
        );

        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            gateway,
            auth_service.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            auth: auth_service,
            event_sender,
            services,
        };

        let router = storefront_api::app_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Raw-body POST with arbitrary headers, for webhook delivery.
    pub async fn post_raw(&self, uri: &str, body: Vec<u8>, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body)).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Insert a user directly and mint a token for them.
    pub async fn seed_user(&self, email: &str, role: UserRole) -> (user::Model, String) {
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Test User".to_string()),
            email: Set(email.to_string()),
            password_hash: Set(auth::hash_password("password123").expect("hash test password")),
            phone: Set(None),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user");

        let token = self
            .state
            .auth
            .generate_token(model.id, &model.email, model.role)
            .expect("mint test token");
        (model, token)
    }

    pub async fn seed_category(&self, name: &str, slug: &str) -> category::Model {
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed category")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        stock: i32,
        category_id: Uuid,
    ) -> ProductModel {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(format!("{} description", name)),
            price: Set(price),
            price_usd: Set(None),
            category_id: Set(category_id),
            images: Set(serde_json::json!([])),
            sizes: Set(serde_json::json!(["S", "M", "L"])),
            colors: Set(serde_json::json!(["black"])),
            stock: Set(stock),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn reload_product(&self, id: Uuid) -> ProductModel {
        storefront_api::entities::Product::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query product")
            .expect("product exists")
    }

    pub async fn reload_order(&self, id: Uuid) -> OrderModel {
        storefront_api::entities::Order::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query order")
            .expect("order exists")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Hex-encoded HMAC-SHA512 of `body` under the test gateway secret, the way
/// the gateway signs webhook deliveries.
pub fn sign_webhook(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(TEST_GATEWAY_SECRET.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
