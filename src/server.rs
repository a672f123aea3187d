use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use crate::trading::executor::{ExecutionOutcome, SignalExecutor};

pub fn router(executor: Arc<SignalExecutor>) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .with_state(executor)
}

impl IntoResponse for ExecutionOutcome {
    fn into_response(self) -> Response {
        let status = match &self {
            ExecutionOutcome::Placed { .. }
            | ExecutionOutcome::Duplicate
            | ExecutionOutcome::Skipped { .. } => StatusCode::OK,
            ExecutionOutcome::Unauthorized => StatusCode::UNAUTHORIZED,
            ExecutionOutcome::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self.body())).into_response()
    }
}

// Alert senders do not always set a JSON content type, so the body is read raw.
async fn webhook(State(executor): State<Arc<SignalExecutor>>, body: Bytes) -> ExecutionOutcome {
    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => executor.execute(&payload).await,
        Err(e) => {
            error!("Unreadable webhook body: {}", e);
            ExecutionOutcome::Failed {
                error: format!("invalid JSON body: {}", e),
            }
        }
    }
}
