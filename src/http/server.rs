//! HTTP listener for the auth boundary.
//!
//! A single endpoint accepts POST JSON bodies and dispatches on the
//! `action` field. CORS headers are attached to every response and the
//! preflight OPTIONS request is answered with an empty 200.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::config::{Secrets, Settings};
use crate::error::{GateError, GateResult, ValidationErrorKind};

use super::request::AuthRequest;
use super::response::{ErrorBody, LoginBody, VerifyBody};

/// Path of the single auth endpoint.
pub const AUTH_ENDPOINT: &str = "/api/auth";

/// Shared handler state.
pub struct AppState {
    pub service: AuthService,
    pub production: bool,
}

/// HTTP server for the auth boundary.
pub struct GateServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl GateServer {
    /// Bind the listener and build the router.
    pub async fn bind(settings: &Settings, secrets: &Secrets) -> GateResult<Self> {
        let listener = TcpListener::bind(settings.server.bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let state = Arc::new(AppState {
            service: AuthService::new(secrets, settings.security.token_ttl_seconds),
            production: settings.server.production,
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        let router = Router::new()
            .route(AUTH_ENDPOINT, any(handle_auth))
            .with_state(state)
            .layer(cors)
            .layer(RequestBodyLimitLayer::new(settings.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                settings.limits.request_timeout_seconds,
            )));

        info!(addr = %local_addr, "Auth boundary bound");

        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until `shutdown` is notified.
    pub async fn run(self, shutdown: Arc<Notify>) -> GateResult<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.notified().await;
            })
            .await?;
        Ok(())
    }
}

/// Entry point for all methods on the auth endpoint.
///
/// Preflight OPTIONS requests are answered by the CORS layer before they
/// reach this handler; a plain OPTIONS still gets an empty 200 here.
async fn handle_auth(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Result<Json<AuthRequest>, JsonRejection>,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    if method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(ErrorBody::new("Method not allowed")),
        )
            .into_response();
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected malformed auth request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    ErrorBody::new("Invalid request body")
                        .with_detail_unless_production(rejection.body_text(), state.production),
                ),
            )
                .into_response();
        }
    };

    let request_id = Uuid::new_v4();
    match request {
        AuthRequest::Login { password } => handle_login(&state, request_id, password),
        AuthRequest::Verify { token } => handle_verify(&state, request_id, token),
    }
}

fn handle_login(state: &AppState, request_id: Uuid, password: Option<String>) -> Response {
    let password = match required_field(password, ValidationErrorKind::MissingPassword) {
        Ok(password) => password,
        Err(err) => return bad_request(err),
    };

    match state.service.login(&password) {
        Ok(session) => {
            info!(request_id = %request_id, "Login succeeded, token issued");
            (
                StatusCode::OK,
                Json(LoginBody::issued(session.token, session.expires_in_ms)),
            )
                .into_response()
        }
        Err(err) if err.is_auth_failure() => {
            // Same response for both comparison paths.
            info!(request_id = %request_id, "Login rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(LoginBody::rejected("Invalid password")),
            )
                .into_response()
        }
        Err(err) => internal_error(state, request_id, err),
    }
}

fn handle_verify(state: &AppState, request_id: Uuid, token: Option<String>) -> Response {
    let token = match required_field(token, ValidationErrorKind::MissingToken) {
        Ok(token) => token,
        Err(err) => return bad_request(err),
    };

    match state.service.verify(&token) {
        Ok(_claims) => {
            info!(request_id = %request_id, "Token verified");
            (StatusCode::OK, Json(VerifyBody::authenticated())).into_response()
        }
        Err(err) if err.is_auth_failure() => {
            // Expired, tampered, and malformed tokens are indistinguishable
            // to the client.
            info!(request_id = %request_id, error = %err, "Token rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(VerifyBody::rejected("Invalid or expired token")),
            )
                .into_response()
        }
        Err(err) => internal_error(state, request_id, err),
    }
}

/// A required request field, present and non-empty, or a validation error.
fn required_field(value: Option<String>, kind: ValidationErrorKind) -> GateResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(GateError::Validation { kind })
}

fn bad_request(err: GateError) -> Response {
    // Validation kinds carry the client-facing message themselves.
    let message = match err {
        GateError::Validation { kind } => kind.to_string(),
        other => other.to_string(),
    };
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
}

fn internal_error(state: &AppState, request_id: Uuid, err: GateError) -> Response {
    warn!(request_id = %request_id, error = %err, "Auth request failed");

    let body = match err {
        GateError::Config { message, hint } => ErrorBody::new(message).with_hint(hint),
        other => ErrorBody::new("Internal server error")
            .with_detail_unless_production(other.to_string(), state.production),
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
