//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::monitor::StatusEntry;

use super::state::AppState;
use super::templates::*;

const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/gtfsrt", get(gtfsrt_feed))
        .route("/status", get(status_page))
        .route("/status.json", get(status_json))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn index_page(State(state): State<AppState>) -> impl IntoResponse {
    let published = state
        .feed
        .latest()
        .map(|p| PublishedView::from_published(&p));
    Html(
        IndexTemplate { published }
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

/// Latest GTFS Realtime document.
///
/// Always serves the last successfully built document, however old; only
/// fails before the first one exists.
async fn gtfsrt_feed(State(state): State<AppState>) -> Result<Response, AppError> {
    let Some(bytes) = state.feed.get() else {
        state.metrics.record_request(StatusCode::SERVICE_UNAVAILABLE.as_u16());
        return Err(AppError::Unavailable {
            message: "feed has not been published yet".to_string(),
        });
    };
    state.metrics.record_request(StatusCode::OK.as_u16());
    Ok(([(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)], bytes).into_response())
}

async fn status_page(State(state): State<AppState>) -> impl IntoResponse {
    let rows = state
        .monitor
        .history()
        .iter()
        .map(StatusRowView::from_entry)
        .collect();
    Html(
        StatusTemplate { rows }
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

/// Status history, newest first.
async fn status_json(State(state): State<AppState>) -> Json<Vec<StatusEntry>> {
    Json(state.monitor.history())
}

async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let text = state.metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], text).into_response())
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Unavailable { message: String },
    Internal { message: String },
}

impl From<prometheus::Error> for AppError {
    fn from(e: prometheus::Error) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Unavailable { message } => {
                warn!(%message, "request while unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, message)
            }
            AppError::Internal { message } => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::to_bytes;
    use chrono::{TimeZone, Utc};

    use crate::clock::MockClock;
    use crate::config::FeedConfig;
    use crate::domain::{Direction, Route, Station, Train};
    use crate::feed::{FeedBuilder, FeedReader};
    use crate::gtfsrt;
    use crate::metrics::FeedMetrics;
    use crate::monitor::StatusMonitor;
    use crate::source::testing::{Reply, ScriptedGateway};

    fn state(feed: FeedReader) -> AppState {
        AppState::new(
            feed,
            StatusMonitor::spawn(10, Duration::from_secs(5)),
            Arc::new(FeedMetrics::new().unwrap()),
        )
    }

    async fn body(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn feed_unavailable_before_first_publish() {
        let state = state(FeedReader::default());
        let response = gtfsrt_feed(State(state.clone())).await.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let text = state.metrics.encode().unwrap();
        assert!(text.contains("path_train_gtfsrt_num_requests{code=\"503\"} 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn serves_published_document() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let gw = Arc::new(ScriptedGateway::new(
            &[(Station::Hoboken, "s1")],
            &[(Route::Hob33, "r1")],
        ));
        gw.set(
            Station::Hoboken,
            Reply::Trains(vec![Train::new(
                Route::Hob33,
                Direction::ToNj,
                Some(t + chrono::Duration::seconds(60)),
                Some(t),
            )]),
        );
        let feed = FeedBuilder::new(FeedConfig::default(), gw, Arc::new(MockClock::new(t)))
            .start()
            .await
            .unwrap();
        let state = state(feed.reader());

        let response = gtfsrt_feed(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            PROTOBUF_CONTENT_TYPE
        );
        let msg = gtfsrt::decode(&body(response).await).unwrap();
        assert_eq!(msg.entity.len(), 1);
        assert_eq!(msg.header.timestamp, Some(t.timestamp() as u64));

        let index = body(index_page(State(state)).await.into_response()).await;
        assert!(String::from_utf8(index).unwrap().contains("1 trip updates"));

        feed.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_serves_nothing() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let gw = Arc::new(ScriptedGateway::new(
            &[(Station::Hoboken, "s1"), (Station::Newport, "s2")],
            &[(Route::Hob33, "r1")],
        ));
        gw.set(
            Station::Hoboken,
            Reply::Trains(vec![Train::new(
                Route::Hob33,
                Direction::ToNy,
                Some(t + chrono::Duration::seconds(60)),
                Some(t),
            )]),
        );
        gw.set(Station::Newport, Reply::Fail(503));

        let builder = FeedBuilder::new(FeedConfig::default(), gw, Arc::new(MockClock::new(t)));
        let state = state(builder.reader());
        assert!(builder.start().await.is_err());

        let response = gtfsrt_feed(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let index = body(index_page(State(state)).await.into_response()).await;
        assert!(String::from_utf8(index).unwrap().contains("not been published"));
    }

    #[tokio::test]
    async fn status_endpoints_reflect_history() {
        let state = state(FeedReader::default());
        let empty = body(status_page(State(state.clone())).await.into_response()).await;
        assert!(String::from_utf8(empty).unwrap().contains("No updates recorded yet"));

        let Json(history) = status_json(State(state)).await;
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn metrics_exposes_text_format() {
        let state = state(FeedReader::default());
        state.metrics.record_request(200);

        let response = metrics(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body(response).await).unwrap();
        assert!(text.contains("path_train_gtfsrt_num_requests"));
    }

    #[test]
    fn app_error_status_codes() {
        let unavailable = AppError::Unavailable {
            message: "x".into(),
        }
        .into_response();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let internal = AppError::Internal {
            message: "x".into(),
        }
        .into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
