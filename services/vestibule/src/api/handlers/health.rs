use crate::flow::FlowState;
use crate::store::StoreError;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    documents: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Document store is reachable", body = [Health]),
        (status = 503, description = "Document store is unreachable", body = [Health])
    ),
    tag = "health"
)]
pub async fn health(Extension(flow): Extension<Arc<FlowState>>) -> impl IntoResponse {
    // A missing probe document still proves the store answers.
    let probe = flow
        .documents()
        .get(&["health".to_string()])
        .await;
    let documents_ok = match probe {
        Ok(_) | Err(StoreError::NotFound) => true,
        Err(err) => {
            error!("Document store health probe failed: {}", err);
            false
        }
    };

    let health = Health {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: if documents_ok { "ok" } else { "error" }.to_string(),
    };
    let status = if documents_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}
