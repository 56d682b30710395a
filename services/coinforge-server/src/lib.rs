//! Coinforge Server - the HTTP surface over the billing workflows
//!
//! ## Endpoints
//!
//! - `GET  /health` - Liveness probe
//! - `GET  /api/v1/users` - Roster with current coin counts
//! - `POST /api/v1/coins/emission` - Mint and apportion a coin batch
//! - `POST /api/v1/coins/move` - Move coins between two users
//! - `GET  /api/v1/coins/longest-history` - The most-travelled coin
//!
//! Business failures (under-sized emission, unknown user, short balance)
//! come back as HTTP 200 with `{"status": "failed", "comment": ...}` and a
//! specific comment; internal faults are logged in full server-side and
//! reported with one fixed opaque comment.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use coinforge_billing::{Billing, BillingError, RosterEntry};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;

/// The comment reported for any internal fault
const OPAQUE_COMMENT: &str = "something went wrong on our side";

/// Shared application state
pub struct AppState {
    pub billing: Billing,
}

/// Build the service router over a billing facade
pub fn router(billing: Billing) -> Router {
    let state = Arc::new(AppState { billing });

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/coins/emission", post(coins_emission))
        .route("/api/v1/coins/move", post(move_coins))
        .route("/api/v1/coins/longest-history", get(longest_history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
}

/// Outcome of a mutating call: a status plus a human-readable comment
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponse {
    pub status: Status,
    pub comment: String,
}

impl OperationResponse {
    fn ok(comment: String) -> Self {
        Self {
            status: Status::Ok,
            comment,
        }
    }

    fn failed(comment: String) -> Self {
        Self {
            status: Status::Failed,
            comment,
        }
    }

    /// Render a billing failure as a wire response
    ///
    /// Business failures keep their specific comment; anything else is
    /// logged and flattened to the opaque comment.
    fn from_error(err: BillingError) -> Self {
        if err.is_business_failure() {
            let comment = match err {
                BillingError::InvalidRequest { message } => message,
                BillingError::UserNotFound { name } => {
                    format!("user '{name}' could not be found")
                }
                BillingError::InsufficientBalance {
                    user,
                    available,
                    requested,
                } => format!(
                    "user '{user}' owns only {}, cannot send {requested}",
                    coins(available)
                ),
                // is_business_failure covers exactly the three above
                other => other.to_string(),
            };
            tracing::warn!(%comment, "request rejected");
            Self::failed(comment)
        } else {
            tracing::error!(error = %err, "workflow failed");
            Self::failed(OPAQUE_COMMENT.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EmissionRequest {
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub src_user: String,
    pub dst_user: String,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LongestHistoryResponse {
    /// Coin id, or 0 when no coins exist
    pub id: u64,
    /// Destination names joined by `;`, chronological
    pub history: String,
}

/// Pluralize a coin count for a comment
fn coins(amount: u64) -> String {
    if amount == 1 {
        format!("{amount} coin")
    } else {
        format!("{amount} coins")
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "coinforge-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    let roster = state.billing.roster().await?;
    let entries: Vec<RosterEntry> = roster.collect().await;
    Ok(Json(entries))
}

async fn coins_emission(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmissionRequest>,
) -> Json<OperationResponse> {
    match state.billing.emit(req.amount).await {
        Ok(summary) => Json(OperationResponse::ok(format!(
            "{} distributed successfully",
            coins(summary.total)
        ))),
        Err(err) => Json(OperationResponse::from_error(err)),
    }
}

async fn move_coins(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveRequest>,
) -> Json<OperationResponse> {
    match state
        .billing
        .transfer(&req.src_user, &req.dst_user, req.amount)
        .await
    {
        Ok(summary) => Json(OperationResponse::ok(format!(
            "{} sent {} to {}",
            summary.source,
            coins(summary.amount()),
            summary.destination
        ))),
        Err(err) => Json(OperationResponse::from_error(err)),
    }
}

async fn longest_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LongestHistoryResponse>, AppError> {
    let response = match state.billing.longest_history().await? {
        Some(provenance) => LongestHistoryResponse {
            id: provenance.id.value(),
            history: provenance.history(),
        },
        None => LongestHistoryResponse {
            id: 0,
            history: String::new(),
        },
    };
    Ok(Json(response))
}

// ============================================================================
// Error Handling
// ============================================================================

/// Internal fault escaping a read-only handler
///
/// Mutating handlers fold every billing error into their status body; this
/// type only carries faults out of handlers whose response has no status
/// field.
pub struct AppError(BillingError);

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self.0, "request failed");
        let body = Json(serde_json::json!({
            "status": "failed",
            "comment": OPAQUE_COMMENT,
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_pluralization() {
        assert_eq!(coins(1), "1 coin");
        assert_eq!(coins(0), "0 coins");
        assert_eq!(coins(7), "7 coins");
    }

    #[test]
    fn test_business_failure_keeps_its_comment() {
        let response = OperationResponse::from_error(BillingError::UserNotFound {
            name: "nadia".to_string(),
        });
        assert_eq!(response.status, Status::Failed);
        assert_eq!(response.comment, "user 'nadia' could not be found");
    }

    #[test]
    fn test_internal_fault_is_opaque() {
        let response = OperationResponse::from_error(BillingError::CorruptState {
            message: "secret internals".to_string(),
        });
        assert_eq!(response.status, Status::Failed);
        assert_eq!(response.comment, OPAQUE_COMMENT);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Ok).unwrap();
        assert_eq!(json, "\"ok\"");
        let json = serde_json::to_string(&Status::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }
}
