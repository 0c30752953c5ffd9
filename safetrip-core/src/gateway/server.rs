//! HTTP gateway server built on axum.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use super::rate_limit;
use super::state::{AppState, SharedState};
use super::GatewayConfig;
use crate::config::SafeTripConfig;
use crate::error::{ConfigError, SafeTripError};

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
}

/// Build the axum Router with every SafeTrip route.
pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/api/predict-accident", post(handlers::predict_accident))
        .route("/api/weather", get(handlers::weather))
        .route("/api/traffic", get(handlers::traffic))
        .route("/api/traffic/route", get(handlers::traffic_route))
        .route("/api/traffic/incidents", get(handlers::traffic_incidents))
        .route("/api/news", get(handlers::news))
        .route("/api/news/alerts", get(handlers::news_alerts))
        .route("/api/location", post(handlers::location))
        .route("/api/alerts", get(handlers::alerts))
        .route("/api/trip/start", post(handlers::trip_start))
        .route("/api/trip/end", post(handlers::trip_end))
        .route("/api/report-hazard", post(handlers::report_hazard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Start the gateway on the configured address.
///
/// Runs until Ctrl-C.
pub async fn run(state: SharedState) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    if state.weather.is_mock() || state.traffic.is_mock() || state.news.is_mock() {
        warn!(
            weather = state.weather.is_mock(),
            traffic = state.traffic.is_mock(),
            news = state.news.is_mock(),
            "Some providers have no API key and will serve mock data"
        );
    }
    warn!(
        store = state.store.backend(),
        "Trips and hazards are kept in memory and lost on restart"
    );

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    info!(address = %local_addr, "SafeTrip gateway listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

/// Validate the configuration, build the state, and run the gateway.
pub async fn serve(config: &SafeTripConfig) -> Result<(), SafeTripError> {
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ConfigError::Invalid {
            message: problems.join("; "),
        }
        .into());
    }
    let state = AppState::from_config(config)?.into_shared();
    run(state).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(GatewayConfig::default()).into_shared())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 10_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["mode"]["weather"], "mock");
        assert_eq!(json["mode"]["store"], "memory");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app()
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/predict-accident")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_cors_rejects_unknown_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/predict-accident")
                    .header("origin", "http://evil.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_config() {
        let mut config = SafeTripConfig::default();
        config.gateway.port = 0;
        let err = serve(&config).await.unwrap_err();
        assert!(matches!(err, SafeTripError::Config(ConfigError::Invalid { .. })));
    }
}
