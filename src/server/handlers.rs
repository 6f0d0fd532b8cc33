use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::log::Log;
use crate::types::{LogError, Offset, Record};

#[derive(Clone)]
pub(super) struct AppState {
    pub(super) log: Arc<Log>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProduceRequest {
    pub record: Record,
}

#[derive(Debug, Serialize)]
pub(super) struct ProduceResponse {
    pub offset: Offset,
}

#[derive(Debug, Deserialize)]
pub(super) struct ConsumeRequest {
    pub offset: Offset,
}

#[derive(Debug, Serialize)]
pub(super) struct ConsumeResponse {
    pub record: Record,
}

pub(super) async fn handle_produce(
    State(state): State<AppState>,
    Json(req): Json<ProduceRequest>,
) -> Result<Json<ProduceResponse>, ApiError> {
    let offset = state.log.append(req.record).await?;
    Ok(Json(ProduceResponse { offset }))
}

pub(super) async fn handle_consume(
    State(state): State<AppState>,
    Json(req): Json<ConsumeRequest>,
) -> Result<Json<ConsumeResponse>, ApiError> {
    let record = state.log.read(req.offset).await?;
    Ok(Json(ConsumeResponse { record }))
}

/// Wrapper mapping log errors onto HTTP statuses: offset-out-of-range is the
/// client's fault, everything else is ours.
#[derive(Debug)]
pub(super) struct ApiError(LogError);

impl From<LogError> for ApiError {
    fn from(e: LogError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LogError::OffsetOutOfRange { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.0.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let log = Log::open(dir.path(), Config::default()).unwrap();
        (dir, AppState { log: Arc::new(log) })
    }

    #[tokio::test]
    async fn produce_then_consume() {
        let (_dir, state) = test_state().await;

        let req = ProduceRequest {
            record: Record::new(b"Hello World!".to_vec()),
        };
        let Json(res) = handle_produce(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(res.offset, 0);

        let req = ConsumeRequest { offset: 0 };
        let Json(res) = handle_consume(State(state), Json(req)).await.unwrap();
        assert_eq!(res.record.value, b"Hello World!");
        assert_eq!(res.record.offset, 0);
    }

    #[tokio::test]
    async fn consume_out_of_range_is_bad_request() {
        let (_dir, state) = test_state().await;

        let err = handle_consume(State(state), Json(ConsumeRequest { offset: 7 }))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_are_500() {
        let err = ApiError(LogError::Closed);
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
