use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, FromRef, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{self, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::{DateTime, FixedOffset, Utc};
use entity::accounts::{self, Role};
use entity::notifications::{Kind, Status};
use platform_api::{ApiError, ApiResult};
use platform_authn::AuthnError;
use platform_authz::Subject;
use platform_db::NewAccount;
use products_hr::{
    DecisionOutcome, DecisionRequest, HrError, HrModule, NotificationFilter, NotificationScope,
    OnboardingPayload, Page, RegistrationStatus,
};
use sea_orm::{ConnectionTrait, DbErr, Statement, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Duration as TimeDuration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{config::AppConfig, graphql::SchemaType};

const SESSION_COOKIE: &str = "__Host-hr_session";
/// Onboarding payloads carry base64 documents.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub hr: HrModule,
    pub schema: SchemaType,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.config.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hr server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    let cors = CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_origin(allow_origin);
    // Credentialed CORS is not allowed together with a wildcard origin.
    if origins.is_empty() {
        cors
    } else {
        cors.allow_credentials(true)
    }
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/registrations", post(submit_registration_handler))
        .route("/api/registrations/me", get(registration_status_handler))
        .route("/api/pending-registrations", get(pending_list_handler))
        .route("/api/pending-registrations/{id}", get(pending_detail_handler))
        .route("/api/notifications", get(notifications_handler))
        .route("/api/notifications/decide", post(decide_handler))
        .route("/api/notifications/{id}/read", patch(mark_read_handler))
        .route("/api/employees", get(employees_handler))
        .route("/api/employees/{identifier}", get(employee_handler))
        .route("/api/accounts/{id}/role", patch(change_role_handler))
        .route("/graphql", post(graphql_handler));
    // Uploaded blobs are served from disk when they live under this host.
    let blob_mount = state.config.blob_public_url.trim_end_matches('/');
    if blob_mount.starts_with('/') && blob_mount.len() > 1 {
        router = router.nest_service(blob_mount, ServeDir::new(&state.config.blob_root));
    }
    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountView {
    id: Uuid,
    email: String,
    display_name: String,
    role: Role,
    created_at: DateTime<FixedOffset>,
}

impl From<accounts::Model> for AccountView {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[instrument(name = "http.auth.register", skip_all)]
async fn register_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, PrivateCookieJar, Json<AccountView>)> {
    let request = body(payload)?;
    let email = platform_authn::normalize_email(&request.email).map_err(authn_error)?;
    let display_name = request
        .display_name
        .as_deref()
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default());
    let display_name = platform_authn::validate_display_name(display_name).map_err(authn_error)?;
    let password_hash = platform_authn::hash_password(&request.password).map_err(authn_error)?;

    let db = state.hr.db();
    if platform_db::find_account_by_email(db, &email)
        .await
        .map_err(db_error)?
        .is_some()
    {
        return Err(ApiError::conflict("email is already registered", Some("email")));
    }

    let txn = db.begin().await.map_err(db_error)?;
    let existing = platform_db::account_count(&txn).await.map_err(db_error)?;
    let account = platform_db::create_account(
        &txn,
        NewAccount {
            email,
            display_name,
            password_hash,
        },
        platform_db::initial_role(existing),
    )
    .await
    .map_err(db_error)?;
    let session = platform_db::create_session(
        &txn,
        account.id,
        state.config.session.expires_at(Utc::now()),
        user_agent(&headers),
    )
    .await
    .map_err(db_error)?;
    txn.commit().await.map_err(db_error)?;

    info!(account_id = %account.id, role = account.role.as_str(), "account registered");
    let jar = jar.add(session_cookie(session.id, &state.config));
    Ok((StatusCode::CREATED, jar, Json(account.into())))
}

#[instrument(name = "http.auth.login", skip_all)]
async fn login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(PrivateCookieJar, Json<AccountView>)> {
    let request = body(payload)?;
    let email =
        platform_authn::normalize_email(&request.email).map_err(|_| ApiError::Unauthorized)?;
    let db = state.hr.db();
    let Some(account) = platform_db::find_account_by_email(db, &email)
        .await
        .map_err(db_error)?
    else {
        return Err(ApiError::Unauthorized);
    };
    if !platform_authn::verify_password(&request.password, &account.password_hash)
        .map_err(authn_error)?
    {
        tracing::warn!(account_id = %account.id, "login rejected");
        return Err(ApiError::Unauthorized);
    }

    let session = platform_db::create_session(
        db,
        account.id,
        state.config.session.expires_at(Utc::now()),
        user_agent(&headers),
    )
    .await
    .map_err(db_error)?;
    info!(account_id = %account.id, "login succeeded");
    let jar = jar.add(session_cookie(session.id, &state.config));
    Ok((jar, Json(account.into())))
}

async fn logout_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<(PrivateCookieJar, StatusCode)> {
    if let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        platform_db::delete_session(state.hr.db(), session_id)
            .await
            .map_err(db_error)?;
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}

#[derive(Serialize)]
struct MeResponse {
    account: AccountView,
    registration: RegistrationStatus,
}

async fn me_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<Json<MeResponse>> {
    let account = load_session(&state, &jar).await?;
    let subject = Subject::new(account.id, account.role);
    let registration = state.hr.registration_status(&subject).await?;
    Ok(Json(MeResponse {
        account: account.into(),
        registration,
    }))
}

async fn submit_registration_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    payload: Result<Json<OnboardingPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let payload = body(payload)?;
    let submission = state.hr.submit_registration(&subject, payload).await?;
    Ok((StatusCode::CREATED, Json(submission)).into_response())
}

async fn registration_status_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<Json<RegistrationStatus>> {
    let subject = viewer(&state, &jar).await?;
    Ok(Json(state.hr.registration_status(&subject).await?))
}

async fn pending_list_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    page: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let page = query(page)?;
    let rows = state.hr.pending_registrations(&subject, page).await?;
    Ok(Json(rows).into_response())
}

async fn pending_detail_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let id = parse_id(&id)?;
    let pending = state.hr.pending_registration(&subject, id).await?;
    Ok(Json(pending).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct NotificationsQuery {
    status: Option<Status>,
    #[serde(rename = "type")]
    kind: Option<Kind>,
    read: Option<bool>,
    scope: Option<NotificationScope>,
    first: Option<i64>,
    offset: Option<i64>,
}

async fn notifications_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    params: Result<Query<NotificationsQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let params = query(params)?;
    let filter = NotificationFilter {
        status: params.status,
        kind: params.kind,
        read: params.read,
        scope: params.scope.unwrap_or_default(),
    };
    let rows = state
        .hr
        .notifications(&subject, filter, Page::new(params.first, params.offset))
        .await?;
    Ok(Json(rows).into_response())
}

async fn decide_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let request = body(payload)?;
    let response = match state.hr.decide(&subject, request).await? {
        DecisionOutcome::Approved { notification, .. } => Json(notification).into_response(),
        DecisionOutcome::Rejected { message } => Json(json!({ "message": message })).into_response(),
    };
    Ok(response)
}

#[derive(Deserialize)]
struct MarkReadRequest {
    #[serde(default)]
    read: Option<bool>,
}

async fn mark_read_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<String>,
    payload: Result<Json<MarkReadRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let id = parse_id(&id)?;
    let read = body(payload)?.read.unwrap_or(true);
    let notification = state.hr.mark_notification_read(&subject, id, read).await?;
    Ok(Json(notification).into_response())
}

async fn employees_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    page: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let page = query(page)?;
    let rows = state.hr.employees(&subject, page).await?;
    Ok(Json(rows).into_response())
}

async fn employee_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(identifier): Path<String>,
) -> ApiResult<Response> {
    let subject = viewer(&state, &jar).await?;
    let employee = state.hr.find_employee(&subject, &identifier).await?;
    Ok(Json(employee).into_response())
}

#[derive(Deserialize)]
struct RoleChangeRequest {
    role: Role,
}

async fn change_role_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(id): Path<String>,
    payload: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> ApiResult<Json<AccountView>> {
    let subject = viewer(&state, &jar).await?;
    let id = parse_id(&id)?;
    let request = body(payload)?;
    let account = state.hr.change_role(&subject, id, request.role).await?;
    Ok(Json(account.into()))
}

async fn graphql_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    request: GraphQLRequest,
) -> ApiResult<GraphQLResponse> {
    let subject = viewer(&state, &jar).await?;
    let request = request.into_inner().data(subject);
    let response = state.schema.execute(request).await;
    Ok(GraphQLResponse::from(response))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.hr.db();
    let db_ok = db
        .execute(Statement::from_string(
            db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

/// Resolves the session cookie to the current account. The role is read
/// fresh from the database on every request.
async fn load_session(state: &AppState, jar: &PrivateCookieJar) -> ApiResult<accounts::Model> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
    let session_id = Uuid::parse_str(cookie.value()).map_err(|_| ApiError::Unauthorized)?;
    let (_, account) = platform_db::load_session(state.hr.db(), session_id)
        .await
        .map_err(db_error)?
        .ok_or(ApiError::Unauthorized)?;
    Ok(account)
}

async fn viewer(state: &AppState, jar: &PrivateCookieJar) -> ApiResult<Subject> {
    let account = load_session(state, jar).await?;
    Ok(Subject::new(account.id, account.role))
}

fn session_cookie(session_id: Uuid, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(config.session.ttl.num_seconds()))
        .build()
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.chars().take(512).collect())
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid(rejection.body_text(), None))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::invalid(rejection.body_text(), None))
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid(format!("`{raw}` is not a valid id"), Some("id")))
}

fn db_error(err: DbErr) -> ApiError {
    HrError::from(err).into()
}

fn authn_error(err: AuthnError) -> ApiError {
    match err {
        AuthnError::InvalidEmail => ApiError::invalid(err.to_string(), Some("email")),
        AuthnError::WeakPassword => ApiError::invalid(err.to_string(), Some("password")),
        AuthnError::InvalidDisplayName => ApiError::invalid(err.to_string(), Some("displayName")),
        AuthnError::MalformedHash | AuthnError::Hashing(_) => ApiError::internal(err.into()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use platform_authn::SessionPolicy;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{graphql, test_support};

    async fn app() -> Router {
        let hr = test_support::hr_module().await;
        let config = AppConfig {
            cookie_key: Key::generate(),
            cors_allowed_origins: Vec::new(),
            session: SessionPolicy::default(),
            blob_root: std::env::temp_dir(),
            blob_public_url: "/uploads".into(),
        };
        build_router(AppState {
            schema: graphql::build_schema(hr.clone()),
            hr,
            config: Arc::new(config),
        })
    }

    struct Reply {
        status: StatusCode,
        cookie: Option<String>,
        body: Value,
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            cookie,
            body,
        }
    }

    async fn register(app: &Router, email: &str) -> (String, Value) {
        let reply = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": email, "password": "correct horse"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        (reply.cookie.expect("session cookie"), reply.body)
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = app().await;
        let reply = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["ok"], true);
        assert_eq!(reply.body["dbOk"], true);
    }

    #[tokio::test]
    async fn first_account_administers_and_emails_are_unique() {
        let app = app().await;
        let (_, admin) = register(&app, "boss@example.com").await;
        assert_eq!(admin["role"], "ADMIN");
        let (_, user) = register(&app, "staff@example.com").await;
        assert_eq!(user["role"], "USER");

        let reply = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "Staff@Example.com", "password": "another secret"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert_eq!(reply.body["error"]["code"], "CONFLICT");
        assert_eq!(reply.body["error"]["field"], "email");
    }

    #[tokio::test]
    async fn login_and_logout_manage_the_session() {
        let app = app().await;
        register(&app, "boss@example.com").await;

        let reply = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "boss@example.com", "password": "wrong password"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        let reply = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "BOSS@example.com", "password": "correct horse"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        let cookie = reply.cookie.expect("session cookie");

        let me = send(&app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body["account"]["email"], "boss@example.com");

        let out = send(&app, Method::POST, "/api/auth/logout", Some(&cookie), None).await;
        assert_eq!(out.status, StatusCode::NO_CONTENT);
        let me = send(&app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn submissions_require_a_session() {
        let app = app().await;
        let reply = send(
            &app,
            Method::POST,
            "/api/registrations",
            None,
            Some(json!({"employeeId": "EMP001"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn registration_round_trip_over_rest() {
        let app = app().await;
        let (admin, _) = register(&app, "boss@example.com").await;
        let (user, _) = register(&app, "ada@example.com").await;

        let reply = send(
            &app,
            Method::POST,
            "/api/registrations",
            Some(&user),
            Some(json!({
                "employeeId": "EMP001",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "documents": [{"name": "cv", "data": "not base64!"}]
            })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        assert_eq!(reply.body["pendingApproval"], true);
        assert_eq!(
            reply.body["uploadStats"],
            json!({"total": 1, "successful": 0, "failed": ["documents.cv"]})
        );

        let again = send(
            &app,
            Method::POST,
            "/api/registrations",
            Some(&user),
            Some(json!({
                "employeeId": "EMP002",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com"
            })),
        )
        .await;
        assert_eq!(again.status, StatusCode::CONFLICT);

        let forbidden = send(
            &app,
            Method::POST,
            "/api/notifications/decide",
            Some(&user),
            Some(json!({"notificationId": Uuid::new_v4(), "action": "approve"})),
        )
        .await;
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let queue = send(
            &app,
            Method::GET,
            "/api/notifications?status=PENDING&type=EMPLOYEE_REQUEST",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(queue.status, StatusCode::OK);
        let items = queue.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        let notification_id = items[0]["id"].as_str().unwrap().to_string();

        let decided = send(
            &app,
            Method::POST,
            "/api/notifications/decide",
            Some(&admin),
            Some(json!({"notificationId": notification_id, "action": "approve", "read": true})),
        )
        .await;
        assert_eq!(decided.status, StatusCode::OK, "{}", decided.body);
        assert_eq!(decided.body["status"], "APPROVED");
        assert_eq!(decided.body["read"], true);

        let status = send(&app, Method::GET, "/api/registrations/me", Some(&user), None).await;
        assert_eq!(status.body["role"], "EMPLOYEE");
        assert_eq!(status.body["pending"], Value::Null);
        assert_eq!(status.body["employee"]["employeeId"], "EMP001");

        let found = send(&app, Method::GET, "/api/employees/emp001", Some(&user), None).await;
        assert_eq!(found.status, StatusCode::OK);
        assert_eq!(found.body["email"], "ada@example.com");

        let inbox = send(&app, Method::GET, "/api/notifications", Some(&user), None).await;
        assert_eq!(inbox.body[0]["type"], "REQUEST_APPROVED");
    }

    #[tokio::test]
    async fn pending_registrations_are_admin_only() {
        let app = app().await;
        let (admin, _) = register(&app, "boss@example.com").await;
        let (user, _) = register(&app, "ada@example.com").await;
        let submitted = send(
            &app,
            Method::POST,
            "/api/registrations",
            Some(&user),
            Some(json!({
                "employeeId": "EMP001",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "department": "Research"
            })),
        )
        .await;
        assert_eq!(submitted.status, StatusCode::CREATED, "{}", submitted.body);
        let pending_id = submitted.body["pendingEmployee"]["id"].as_str().unwrap().to_string();

        let listed = send(
            &app,
            Method::GET,
            "/api/pending-registrations?first=10",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.body.as_array().unwrap().len(), 1);
        assert_eq!(listed.body[0]["id"], pending_id.as_str());

        let detail = send(
            &app,
            Method::GET,
            &format!("/api/pending-registrations/{pending_id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(detail.status, StatusCode::OK);
        assert_eq!(detail.body["employeeId"], "EMP001");
        assert_eq!(detail.body["department"], "Research");

        for uri in [
            "/api/pending-registrations".to_string(),
            format!("/api/pending-registrations/{pending_id}"),
        ] {
            let denied = send(&app, Method::GET, &uri, Some(&user), None).await;
            assert_eq!(denied.status, StatusCode::FORBIDDEN, "{uri}");
        }

        let missing = send(
            &app,
            Method::GET,
            &format!("/api/pending-registrations/{}", Uuid::new_v4()),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn role_changes_are_admin_only_and_keep_an_admin() {
        let app = app().await;
        let (admin, admin_body) = register(&app, "boss@example.com").await;
        let (user, user_body) = register(&app, "staff@example.com").await;
        let admin_id = admin_body["id"].as_str().unwrap();
        let user_id = user_body["id"].as_str().unwrap();

        let denied = send(
            &app,
            Method::PATCH,
            &format!("/api/accounts/{admin_id}/role"),
            Some(&user),
            Some(json!({"role": "USER"})),
        )
        .await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN);

        let last = send(
            &app,
            Method::PATCH,
            &format!("/api/accounts/{admin_id}/role"),
            Some(&admin),
            Some(json!({"role": "USER"})),
        )
        .await;
        assert_eq!(last.status, StatusCode::CONFLICT);

        let promoted = send(
            &app,
            Method::PATCH,
            &format!("/api/accounts/{user_id}/role"),
            Some(&admin),
            Some(json!({"role": "ADMIN"})),
        )
        .await;
        assert_eq!(promoted.status, StatusCode::OK);
        assert_eq!(promoted.body["role"], "ADMIN");

        let bad_id = send(
            &app,
            Method::PATCH,
            "/api/accounts/not-an-id/role",
            Some(&admin),
            Some(json!({"role": "ADMIN"})),
        )
        .await;
        assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad_id.body["error"]["field"], "id");
    }
}
