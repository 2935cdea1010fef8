//! End-to-end behavior of the session-scoped client against a stub service.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use paylater_core::api::ApiError;
use paylater_core::auth::{Credential, CredentialStore, MemoryCredentialStore};
use paylater_core::models::UserIdentity;
use paylater_core::{ApiClient, Session, SessionEvent};

const GOOD_TOKEN: &str = "tok123";

/// Authorization headers seen by the stub, in arrival order
#[derive(Clone, Default)]
struct Recorded {
    authorization: Arc<Mutex<Vec<Option<String>>>>,
}

impl Recorded {
    fn record(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorization
            .lock()
            .expect("recorder lock")
            .push(value.clone());
        value
    }

    fn last(&self) -> Option<Option<String>> {
        self.authorization.lock().expect("recorder lock").last().cloned()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

fn authorized(recorded: &Recorded, headers: &HeaderMap) -> bool {
    recorded.record(headers).as_deref() == Some(format!("Bearer {}", GOOD_TOKEN).as_str())
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == "a@b.com" && body["password"] == "x" {
        Json(json!({"access_token": GOOD_TOKEN, "token_type": "bearer"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid email or password"})),
        )
            .into_response()
    }
}

async fn me(State(recorded): State<Recorded>, headers: HeaderMap) -> Response {
    if !authorized(&recorded, &headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 1,
        "name": "alice",
        "email": "a@b.com",
        "credit_limit": 1000.0,
        "created_at": "2024-01-01T00:00:00"
    }))
    .into_response()
}

async fn list_merchants(State(recorded): State<Recorded>, headers: HeaderMap) -> Response {
    if !authorized(&recorded, &headers) {
        return unauthorized();
    }
    Json(json!([
        {"id": 1, "name": "Amazon", "fee_percentage": 2.5, "created_at": "2024-01-01T00:00:00"}
    ]))
    .into_response()
}

async fn create_merchant(State(recorded): State<Recorded>, headers: HeaderMap) -> Response {
    if !authorized(&recorded, &headers) {
        return unauthorized();
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"detail": "Merchant 'Amazon' already exists"})),
    )
        .into_response()
}

async fn update_fee(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&recorded, &headers) {
        return unauthorized();
    }
    Json(json!({"name": name, "fee_percentage": body["fee_percentage"]})).into_response()
}

async fn my_transactions(State(recorded): State<Recorded>, headers: HeaderMap) -> Response {
    if !authorized(&recorded, &headers) {
        return unauthorized();
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn total_dues(State(recorded): State<Recorded>, headers: HeaderMap) -> Response {
    if !authorized(&recorded, &headers) {
        return unauthorized();
    }
    (StatusCode::OK, "not json").into_response()
}

async fn spawn_stub() -> Result<(String, Recorded)> {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/users/me", get(me))
        .route("/merchants/", get(list_merchants).post(create_merchant))
        .route("/merchants/{name}", patch(update_fee))
        .route("/transactions/my", get(my_transactions))
        .route("/reports/total-dues", get(total_dues))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{}", addr), recorded))
}

/// Memory store that counts `clear` calls
#[derive(Default)]
struct CountingStore {
    inner: MemoryCredentialStore,
    clears: AtomicUsize,
}

impl CredentialStore for CountingStore {
    fn save(&self, credential: &Credential) -> Result<()> {
        self.inner.save(credential)
    }

    fn load(&self) -> Result<Option<Credential>> {
        self.inner.load()
    }

    fn clear(&self) -> Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

fn identity() -> UserIdentity {
    UserIdentity {
        name: "alice".to_string(),
        email: "a@b.com".to_string(),
        credit_limit: Some(1000.0),
    }
}

#[tokio::test]
async fn test_login_stores_identity_and_sends_bearer() -> Result<()> {
    let (base, recorded) = spawn_stub().await?;
    let session = Session::init(Arc::new(MemoryCredentialStore::new()));
    let api = ApiClient::new(&base, session.clone())?;

    let credential = api.authenticate("a@b.com", "x").await?;
    session.login_user(credential).await?;

    assert_eq!(session.current_user().await, Some(identity()));

    let merchants = api.list_merchants().await?;
    assert_eq!(merchants.len(), 1);
    assert_eq!(merchants[0].name, "Amazon");
    assert_eq!(recorded.last(), Some(Some("Bearer tok123".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_anonymous_request_omits_header_and_redirects_once() -> Result<()> {
    let (base, recorded) = spawn_stub().await?;
    let store = Arc::new(CountingStore::default());
    let session = Session::init(store.clone());
    let mut events = session.subscribe();
    let api = ApiClient::new(&base, session.clone())?;

    let err = api.list_merchants().await.expect_err("anonymous request must fail");
    assert!(matches!(err, ApiError::AuthenticationExpired));
    assert_eq!(recorded.last(), Some(None));

    assert_eq!(events.try_recv().ok(), Some(SessionEvent::Expired));
    assert!(events.try_recv().is_err());
    assert_eq!(store.clears.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_is_a_validation_error() -> Result<()> {
    let (base, _recorded) = spawn_stub().await?;
    let store = Arc::new(CountingStore::default());
    let session = Session::init(store.clone());
    let mut events = session.subscribe();
    let api = ApiClient::new(&base, session.clone())?;

    let err = api
        .authenticate("a@b.com", "wrong")
        .await
        .expect_err("bad password must fail");
    match err {
        ApiError::ValidationRejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(events.try_recv().is_err());
    assert_eq!(store.clears.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_rejected_token_clears_session() -> Result<()> {
    let (base, _recorded) = spawn_stub().await?;
    let store = Arc::new(CountingStore::default());
    let session = Session::init(store.clone());
    session
        .login_user(Credential::new("revoked", identity()))
        .await?;
    let api = ApiClient::new(&base, session.clone())?;

    let err = api.me().await.expect_err("revoked token must fail");
    assert!(matches!(err, ApiError::AuthenticationExpired));
    assert!(!session.is_authenticated().await);
    assert!(store.load()?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_rejections_expire_once() -> Result<()> {
    let (base, _recorded) = spawn_stub().await?;
    let store = Arc::new(CountingStore::default());
    let session = Session::init(store.clone());
    session
        .login_user(Credential::new("revoked", identity()))
        .await?;
    let mut events = session.subscribe();
    let api = ApiClient::new(&base, session.clone())?;

    let results = futures::future::join_all((0..6).map(|_| api.list_merchants())).await;
    assert!(results
        .iter()
        .all(|r| matches!(r, Err(ApiError::AuthenticationExpired))));

    assert_eq!(store.clears.load(Ordering::SeqCst), 1);
    assert_eq!(events.try_recv().ok(), Some(SessionEvent::Expired));
    assert!(events.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_non_auth_failures_keep_session() -> Result<()> {
    let (base, _recorded) = spawn_stub().await?;
    let session = Session::init(Arc::new(MemoryCredentialStore::new()));
    session
        .login_user(Credential::new(GOOD_TOKEN, identity()))
        .await?;
    let api = ApiClient::new(&base, session.clone())?;

    let err = api.create_merchant("Amazon", 2.0).await.expect_err("duplicate");
    assert_eq!(err.to_string(), "Merchant 'Amazon' already exists");

    let err = api.my_transactions().await.expect_err("server fault");
    assert!(matches!(err, ApiError::ServerFault { status: 500, .. }));

    let err = api.total_dues_report().await.expect_err("bad body");
    assert!(matches!(err, ApiError::InvalidResponse(_)));

    assert!(session.is_authenticated().await);
    Ok(())
}

#[tokio::test]
async fn test_network_failure_keeps_session() -> Result<()> {
    // Reserve a port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    drop(listener);

    let session = Session::init(Arc::new(MemoryCredentialStore::new()));
    session
        .login_user(Credential::new(GOOD_TOKEN, identity()))
        .await?;
    let mut events = session.subscribe();
    let api = ApiClient::new(&format!("http://{}", addr), session.clone())?;

    let err = api.list_merchants().await.expect_err("nothing listening");
    assert!(matches!(err, ApiError::NetworkUnavailable(_)));
    assert!(session.is_authenticated().await);
    assert!(events.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn test_names_are_path_encoded() -> Result<()> {
    let (base, _recorded) = spawn_stub().await?;
    let session = Session::init(Arc::new(MemoryCredentialStore::new()));
    session
        .login_user(Credential::new(GOOD_TOKEN, identity()))
        .await?;
    let api = ApiClient::new(&base, session)?;

    let updated = api.update_merchant_fee("Corner Shop", 3.5).await?;
    assert_eq!(updated.name, "Corner Shop");
    assert_eq!(updated.fee_percentage, 3.5);
    Ok(())
}
