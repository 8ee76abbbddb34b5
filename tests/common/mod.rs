// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chess_coach::config::Config;
use chess_coach::db::{Db, FirestoreDb};
use chess_coach::routes::create_router;
use chess_coach::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test app on the in-memory store. The engine URL points nowhere.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Test app whose engine proxy talks to `engine`.
#[allow(dead_code)]
pub fn create_test_app_with_engine(engine: &FakeEngine) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.engine_api_url = engine.url.clone();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Db::memory()).expect("state"));
    (create_router(state.clone()), state)
}

/// Serve the router on an ephemeral port and return its base URL.
#[allow(dead_code)]
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Build a JSON request, optionally with a bearer token.
#[allow(dead_code)]
pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Run one request; the body is parsed as JSON (`Null` when empty).
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, body)
}

/// Register `username` and return its bearer token.
#[allow(dead_code)]
pub async fn register(app: &Router, username: &str) -> String {
    let (status, _, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/auth/register",
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "correct-horse",
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Engine response in the remote service's format.
#[allow(dead_code)]
pub fn engine_body(bestmove: &str, evaluation: Option<f64>, mate: Option<i32>) -> Value {
    json!({
        "success": true,
        "evaluation": evaluation,
        "mate": mate,
        "bestmove": format!("bestmove {} ponder e7e5", bestmove),
        "continuation": bestmove,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineQuery {
    pub fen: String,
    pub depth: String,
}

type Responder = Arc<dyn Fn(&EngineQuery) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct FakeEngineState {
    queries: Arc<Mutex<Vec<EngineQuery>>>,
    respond: Responder,
}

/// Stand-in for the remote engine service that records every query.
#[allow(dead_code)]
pub struct FakeEngine {
    pub url: String,
    queries: Arc<Mutex<Vec<EngineQuery>>>,
}

#[allow(dead_code)]
impl FakeEngine {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&EngineQuery) -> (StatusCode, Value) + Send + Sync + 'static,
    {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let state = FakeEngineState {
            queries: queries.clone(),
            respond: Arc::new(respond),
        };
        let app = Router::new()
            .route("/engine", get(fake_engine_handler))
            .with_state(state);
        let base = serve(app).await;

        Self {
            url: format!("{}/engine", base),
            queries,
        }
    }

    /// Engine that always answers `bestmove` with the given score.
    pub async fn fixed(bestmove: &'static str, evaluation: f64) -> Self {
        Self::start(move |_| (StatusCode::OK, engine_body(bestmove, Some(evaluation), None))).await
    }

    pub fn queries(&self) -> Vec<EngineQuery> {
        self.queries.lock().unwrap().clone()
    }
}

async fn fake_engine_handler(
    State(state): State<FakeEngineState>,
    Query(query): Query<EngineQuery>,
) -> (StatusCode, Json<Value>) {
    state.queries.lock().unwrap().push(query.clone());
    let (status, body) = (state.respond)(&query);
    (status, Json(body))
}
