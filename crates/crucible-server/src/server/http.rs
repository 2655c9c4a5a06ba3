//! HTTP front door.
//!
//! Thin axum layer over [`CompileService`]: routing, status-code
//! mapping and permissive CORS. No job-lifecycle logic lives here.
//!
//! | route                 | resolved                     | pending        | unknown         |
//! |-----------------------|------------------------------|----------------|-----------------|
//! | `POST /compile`       | `200` JSON job id            | n/a            | n/a             |
//! | `GET /status/{id}`    | `200` `SUCCESS`/`FAILURE`    | `200` `PENDING`| `404 NOT FOUND` |
//! | `GET /artifacts/{id}` | `200` JSON artifact or error | `202 PENDING`  | `404 NOT FOUND` |
//!
//! A compile failure is still a successful *submission*: the job id
//! comes back `200` and the failure is reported through the job's
//! status and artifact.

use crate::server::service::handler::CompileService;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crucible_core::Error;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

/// Builds the service router, CORS included (the browser-facing
/// clients of this service are cross-origin by default).
pub fn router(service: CompileService) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/compile", post(compile))
        .route("/status/{id}", get(status))
        .route("/artifacts/{id}", get(artifacts))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(service)
}

async fn root() -> String {
    format!("Crucible Compiler. Version: {} \n", env!("CARGO_PKG_VERSION"))
}

async fn compile(
    State(service): State<CompileService>,
    Json(body): Json<Value>,
) -> Result<Json<String>, ApiError> {
    let job_id = service.submit(&body).await?;
    Ok(Json(job_id))
}

async fn status(
    State(service): State<CompileService>,
    Path(id): Path<String>,
) -> Result<&'static str, ApiError> {
    let status = service.status(&id)?;
    Ok(status.as_label())
}

async fn artifacts(
    State(service): State<CompileService>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match service.artifact(&id)? {
        Some(outcome) => Ok(Json(outcome).into_response()),
        None => Ok((StatusCode::ACCEPTED, "PENDING").into_response()),
    }
}

/// Maps service errors onto the wire.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::InvalidRequest { reason } => (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "failed", "message": reason})),
            )
                .into_response(),
            Error::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
            }
            Error::ServiceShutdown => {
                (StatusCode::SERVICE_UNAVAILABLE, "service is shutting down").into_response()
            }
            err @ (Error::DuplicateId { .. } | Error::AlreadyResolved { .. }) => {
                // Invariant violations surface loudly rather than being
                // swallowed into a client error.
                tracing::error!("Invariant violation reached the front door: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
            err @ Error::ChannelError { .. } => {
                tracing::error!("Internal failure: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
