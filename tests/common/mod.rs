#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware, Router,
};
use chrono::Utc;
use mainstreet_api::{
    auth::{AuthConfig, AuthService, Claims, Role},
    config::AppConfig,
    db::{self, DbConfig},
    entities::user,
    events::{self, EventSender},
    handlers::AppServices,
    logging, AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "test_secret_key_for_testing_purposes_only_0123456789abcdef0123456789";
const ISSUER: &str = "mainstreet-auth";
const AUDIENCE: &str = "mainstreet-api";

/// Test harness spinning up the application against an in-memory SQLite
/// database with migrations applied.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;

        // A single pooled connection keeps the in-memory database alive and
        // shared across requests.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            TEST_JWT_SECRET.to_string(),
            ISSUER.to_string(),
            AUDIENCE.to_string(),
            Duration::from_secs(cfg.jwt_expiration as u64),
            Duration::from_secs(cfg.refresh_token_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            cfg.max_photos_per_business,
            logging::discard_logger(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            auth_service: auth_service.clone(),
            services,
        };

        let router = Router::new()
            .nest("/api/v1", mainstreet_api::api_v1_routes())
            .nest(
                "/auth",
                mainstreet_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(middleware::from_fn_with_state(
                auth_service,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Inserts an account row and returns it
    pub async fn seed_user(&self, email: &str, role: Role, business_id: Option<i64>) -> user::Model {
        user::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(String::new()),
            display_name: Set(email.split('@').next().unwrap_or("user").to_string()),
            role: Set(role),
            business_id: Set(business_id),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user")
    }

    /// Mints an access token for the given identity, mirroring what
    /// refreshSession would hand back after the linkage changed.
    pub fn token_for(&self, user_id: i64, role: Role, business_id: Option<i64>) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: None,
            role,
            business_id,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(1)).timestamp(),
            nbf: now.timestamp(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        };

        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("encode access token")
    }

    /// Seeds an admin account and mints its token
    pub async fn admin(&self) -> (user::Model, String) {
        let account = self
            .seed_user(&format!("admin-{}@example.com", Uuid::new_v4()), Role::Admin, None)
            .await;
        let token = self.token_for(account.id, Role::Admin, None);
        (account, token)
    }

    /// Seeds an owner account (no business yet) and mints its token
    pub async fn owner(&self) -> (user::Model, String) {
        let account = self
            .seed_user(&format!("owner-{}@example.com", Uuid::new_v4()), Role::Owner, None)
            .await;
        let token = self.token_for(account.id, Role::Owner, None);
        (account, token)
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Reads a JSON response body, asserting the expected status first
    pub async fn read_json(response: axum::response::Response, expected: StatusCode) -> Value {
        assert_eq!(
            response.status(),
            expected,
            "unexpected status for response"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is json")
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Creates a business through the API as the given owner and returns
/// (business id, refreshed owner token).
pub async fn create_business_for(
    app: &TestApp,
    owner: &user::Model,
    owner_token: &str,
    username: &str,
    name: &str,
) -> (i64, String) {
    let response = app
        .request(
            Method::POST,
            "/api/v1/businesses",
            Some(serde_json::json!({
                "username": username,
                "name": name,
                "category": "restaurant",
            })),
            Some(owner_token),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let business_id = body["id"].as_i64().expect("business id");

    // The owner's linkage changed; a fresh token mirrors refreshSession
    let token = app.token_for(owner.id, Role::Owner, Some(business_id));
    (business_id, token)
}
