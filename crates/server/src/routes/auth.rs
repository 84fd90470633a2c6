use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use common::types::MessageBody;
use service::auth::TokenVerifier;
use service::todo::TodoService;

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub todos: TodoService,
    pub verifier: Arc<TokenVerifier>,
}

impl ServerState {
    pub fn new(todos: TodoService, verifier: TokenVerifier) -> Self {
        Self { todos, verifier: Arc::new(verifier) }
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(MessageBody::new("Unauthorized"))).into_response()
}

/// Gatekeeper for the todo API: verifies `Authorization: Bearer <token>` and injects
/// the caller's `VerifiedIdentity`. Refused requests never reach a handler.
/// CORS preflight passes through unauthenticated.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let verified = state.verifier.verify_header(header.as_deref()).await;

    match verified {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => {
            warn!(path = %req.uri().path(), code = e.code(), err = %e, "request unauthorized");
            unauthorized()
        }
    }
}
