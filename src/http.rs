//! HTTP API — axum router, response envelope, and the bearer gate
//!
//! Thin translation layer: handlers deserialize the request and hand it
//! to the session handle, wrapping the outcome in the uniform envelope.
//! The only logic that lives here is the bearer gate and the owner check
//! on user lookup.

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::error::{AuthError, Result};
use crate::session::SessionHandle;
use crate::token::TokenIssuer;

/// Shared state for the HTTP layer
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionHandle,
    pub issuer: TokenIssuer,
}

/// Verified identity attached to a request by the bearer gate
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

/// Uniform envelope wrapped around every API reply
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResponse<T> {
    pub data: T,
    pub status_code: u16,
    pub success: bool,
    pub timestamp: String,
}

impl<T: Serialize> ServerResponse<T> {
    fn reply(status: StatusCode, success: bool, data: T) -> Response {
        let body = Self {
            data,
            status_code: status.as_u16(),
            success,
            timestamp: Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }

    /// Wrap a payload in a success envelope
    fn ok(status: StatusCode, data: T) -> Response {
        Self::reply(status, true, data)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            // Full detail stays server-side; the caller sees an opaque body.
            error!(error = ?self, "Internal error");
            return ServerResponse::reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                json!("Server error"),
            );
        }
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ServerResponse::reply(status, false, json!(self.to_string()))
    }
}

// ─── Request Bodies ───

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub user_name: String,
    pub email: String,
    pub role_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

// ─── Bearer Gate ───

/// Verify the access token and attach the principal to the request.
/// Missing, malformed, invalid, and expired tokens all fail here, before
/// any handler runs.
async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let claims = {
        let token = bearer_token(&request)?;
        state.issuer.verify(token)?
    };
    request.extensions_mut().insert(AuthenticatedPrincipal {
        user_id: claims.user_id,
        email: claims.sub,
        role: claims.role,
    });
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Result<&str> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::TokenInvalid("authorization header is not valid UTF-8".into()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::TokenInvalid("expected 'Bearer <token>'".into()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

// ─── Handlers ───

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Response> {
    let details = state
        .sessions
        .register(body.user_name, body.email, body.role_name)
        .await?;
    Ok(ServerResponse::ok(StatusCode::CREATED, details))
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<Response> {
    let pair = state.sessions.login(body.email, body.password).await?;
    Ok(ServerResponse::ok(StatusCode::OK, pair))
}

async fn refresh(State(state): State<AppState>, Json(body): Json<RefreshBody>) -> Result<Response> {
    let pair = state.sessions.refresh(body.refresh_token).await?;
    Ok(ServerResponse::ok(StatusCode::OK, pair))
}

async fn fetch_user(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(user_cred): Path<String>,
) -> Result<Response> {
    // Callers may only look themselves up, by id or by email.
    if principal.user_id.to_string() != user_cred && principal.email != user_cred {
        return Err(AuthError::Forbidden(
            "cannot access another user's details".into(),
        ));
    }
    let details = state.sessions.fetch_user_details(user_cred).await?;
    Ok(ServerResponse::ok(StatusCode::OK, details))
}

async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Result<Response> {
    // Identity comes from the verified token, never from the body.
    let deleted = state.sessions.logout(principal.user_id).await?;
    Ok(ServerResponse::ok(
        StatusCode::OK,
        json!({ "message": "Logged out successfully", "deletedTokens": deleted }),
    ))
}

async fn credentials(State(state): State<AppState>) -> Result<Response> {
    let secrets = state.sessions.fetch_secrets().await?;
    Ok(ServerResponse::ok(StatusCode::OK, secrets))
}

async fn health() -> Response {
    ServerResponse::ok(StatusCode::OK, json!({ "status": "ok" }))
}

// ─── Router ───

/// Build the full API router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/user/{user_cred}", get(fetch_user))
        .route("/logout", post(logout))
        .route("/credentials", get(credentials))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
