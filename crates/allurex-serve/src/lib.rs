use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use allurex_metrics::{MetricStore, Namespace, CONTENT_TYPE};
use allurex_runner::{Health, HealthReporter};

// ── Config ──

pub struct ServeConfig {
    /// `host:port` to bind.
    pub listen_addr: String,
}

// ── App State ──

struct AppState {
    store: Arc<MetricStore>,
    health: HealthReporter,
    namespace: Namespace,
}

// ── Entrypoint ──

/// Bind and serve until `shutdown` resolves. Bind failure is returned.
pub async fn serve(
    config: ServeConfig,
    store: Arc<MetricStore>,
    health: HealthReporter,
    namespace: Namespace,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(store, health, namespace);

    let addr = config.listen_addr;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind {addr}: {e}"))?;
    tracing::info!(%addr, "metrics endpoint listening on http://{addr}/metrics");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Build the router (for testing without binding to a port).
pub fn router(store: Arc<MetricStore>, health: HealthReporter, namespace: Namespace) -> Router {
    let state = Arc::new(AppState {
        store,
        health,
        namespace,
    });
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/health", get(get_health))
        .with_state(state)
}

// ── GET /metrics ──

async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    let body = state.store.render(&state.namespace);
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}

// ── GET /health ──

async fn get_health(State(state): State<Arc<AppState>>) -> Response {
    match state.health.check() {
        Health::Ok => (StatusCode::OK, "OK").into_response(),
        Health::Unhealthy(reason) => {
            tracing::debug!(%reason, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("UNHEALTHY: {reason}"),
            )
                .into_response()
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use allurex_core::source::SUMMARY_PATH;
    use allurex_core::MemorySource;
    use allurex_runner::Orchestrator;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    const SUMMARY: &str = r#"{"statistic": {"passed": 5, "failed": 1, "broken": 0, "skipped": 2}, "time": {"duration": 1500}}"#;

    fn app(store: &Arc<MetricStore>) -> Router {
        let health = HealthReporter::new(store.clone(), Duration::from_secs(300));
        router(
            store.clone(),
            health,
            Namespace::parse("allure").unwrap(),
        )
    }

    fn published_store() -> Arc<MetricStore> {
        let source = Arc::new(MemorySource::new());
        source.insert(SUMMARY_PATH, SUMMARY);
        source.insert(
            "data/test-cases/a.json",
            r#"{"uuid": "a", "name": "a", "status": "passed", "start": 0, "stop": 250}"#,
        );
        let store = Arc::new(MetricStore::new());
        Orchestrator::new(source, store.clone()).run_cycle().unwrap();
        store
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_unavailable_before_first_cycle() {
        let store = Arc::new(MetricStore::new());
        let (status, _, body) = get(app(&store), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.starts_with("UNHEALTHY: "), "{body}");
    }

    #[tokio::test]
    async fn health_ok_after_publish() {
        let store = published_store();
        let (status, _, body) = get(app(&store), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn metrics_exposes_published_snapshot() {
        let store = published_store();
        let (status, content_type, body) = get(app(&store), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(CONTENT_TYPE));
        assert!(body.contains("allure_tests_total{status=\"passed\"} 5\n"), "{body}");
        assert!(body.contains("allure_tests_total{status=\"skipped\"} 2\n"));
        assert!(body.contains("allure_suite_duration_seconds 1.5\n"));
        assert!(body.contains("allure_test_duration_seconds{name=\"a\",suite=\"unknown\"} 0.25\n"));
        assert!(body.contains("allure_update_success_total 1\n"));
        assert!(!body.contains("allure_flaky_tests_ratio"));
    }

    #[tokio::test]
    async fn metrics_before_first_cycle_has_only_exporter_families() {
        let store = Arc::new(MetricStore::new());
        let (status, _, body) = get(app(&store), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("allure_tests_total"));
        assert!(body.contains("allure_update_errors_total 0\n"));
    }

    #[tokio::test]
    async fn serve_reports_bind_failure() {
        let store = Arc::new(MetricStore::new());
        let health = HealthReporter::new(store.clone(), Duration::from_secs(300));
        let err = serve(
            ServeConfig {
                listen_addr: "256.0.0.1:0".to_string(),
            },
            store,
            health,
            Namespace::parse("allure").unwrap(),
            std::future::ready(()),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("cannot bind 256.0.0.1:0"), "{err}");
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let store = Arc::new(MetricStore::new());
        let health = HealthReporter::new(store.clone(), Duration::from_secs(300));
        serve(
            ServeConfig {
                listen_addr: "127.0.0.1:0".to_string(),
            },
            store,
            health,
            Namespace::parse("allure").unwrap(),
            std::future::ready(()),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let store = Arc::new(MetricStore::new());
        let (status, _, _) = get(app(&store), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
