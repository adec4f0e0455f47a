use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{sse::Sse, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use isa_invest_core::InvestmentEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;

use crate::bus::{event_keep_alive, event_stream, parse_subject_list, EventBus, SubjectFilter};
use crate::{investments, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    bus: EventBus,
    engine: InvestmentEngine,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, bus: EventBus, engine: InvestmentEngine) -> Self {
        Self {
            metrics,
            bus,
            engine,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn engine(&self) -> &InvestmentEngine {
        &self.engine
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthz))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/events", get(events))
        .route("/investments", post(investments::create))
        .route("/investments/:id", get(investments::get_by_id))
        .route(
            "/investments/customer/:customer_id",
            get(investments::list_by_customer),
        )
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn metrics(State(state): State<AppState>) -> Response {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        Body::from(body),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    #[serde(default)]
    subjects: Option<String>,
}

async fn events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl tokio_stream::Stream<Item = Result<axum::response::sse::Event, serde_json::Error>>> {
    let filter = SubjectFilter::from_subjects(parse_subject_list(query.subjects));
    let stream = event_stream(state.bus().clone(), filter);

    Sse::new(stream).keep_alive(event_keep_alive())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use isa_invest_core::{EventSinkExt, SUBJECT_CREATED};
    use isa_invest_storage::InMemoryInvestmentStore;
    use std::sync::Arc;
    use tokio::time::{self, Duration};
    use tower::ServiceExt;

    pub(crate) fn setup_state() -> AppState {
        let metrics = telemetry::init_metrics().expect("metrics init");
        let bus = EventBus::new(64);
        let store = Arc::new(InMemoryInvestmentStore::new());
        let engine = InvestmentEngine::new(store, Arc::new(bus.clone()));
        AppState::new(metrics, bus, engine)
    }

    pub(crate) async fn read_body(response: Response) -> String {
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8")
    }

    #[tokio::test]
    async fn health_endpoints_return_ok() {
        let app = app_router(setup_state());

        for uri in ["/health", "/healthz"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .expect("handler should respond");

            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert_eq!(read_body(response).await, r#"{"status":"ok"}"#, "{uri}");
        }
    }

    #[tokio::test]
    async fn metrics_exports_build_info() {
        let app = app_router(setup_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert!(body.contains("app_build_info"));
        assert!(body.contains("app_uptime_seconds"));
    }

    #[tokio::test]
    async fn event_stream_emits_filtered_messages() {
        let state = setup_state();
        let bus = state.bus().clone();
        let app = app_router(state);

        let request = Request::builder()
            .uri("/events?subjects=investment.created")
            .body(Body::empty())
            .unwrap();

        let publish = tokio::spawn(async move {
            time::sleep(Duration::from_millis(25)).await;
            bus.publish("investment.processed", &json!({ "id": "skip-me" }))
                .expect("publish processed");
            bus.publish(SUBJECT_CREATED, &json!({ "id": "inv-1" }))
                .expect("publish created");
        });

        let mut response = app.oneshot(request).await.expect("handler should respond");

        let frame = time::timeout(Duration::from_secs(1), response.body_mut().frame())
            .await
            .expect("stream produced chunk")
            .expect("chunk ok")
            .expect("chunk available");

        let data = match frame.into_data() {
            Ok(data) => data,
            Err(_) => panic!("expected data frame"),
        };
        let text = String::from_utf8(data.to_vec()).expect("utf-8");
        assert!(text.contains("event: investment.created"));
        assert!(text.contains("\"id\":\"inv-1\""));
        assert!(!text.contains("skip-me"));

        publish.await.expect("publish task");
    }
}
