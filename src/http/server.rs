//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, asset gate, timeout)
//! - Serve the router on every bound listener
//! - Hand requests on the asset port to the asset pipeline

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{any, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::assets::{AssetService, SetupError};
use crate::config::GatewayConfig;
use crate::http::common;
use crate::http::request::MakeRequestUuidV4;
use crate::net::ConnectionMeta;
use crate::routing::{Gate, PortGate};

/// Application state injected into the gate middleware.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<dyn Gate>,
    pub assets: Arc<AssetService>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, SetupError> {
        let state = AppState {
            gate: Arc::new(PortGate::new(config.asset_server.port)),
            assets: Arc::new(AssetService::from_config(&config)?),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The application routes sit behind the gate as a fallback service, so the
    /// gate sees every request before any path routing happens.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let app_routes = Router::new()
            .route("/AnalyticsWebService.asmx/LogEvent", post(common::log_event))
            .route("/ping", any(common::ping))
            .route("/ContentWebService.asmx", any(common::ping))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .fallback_service(app_routes)
            .layer(middleware::from_fn_with_state(state, asset_gate))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server on every listener until `shutdown` fires.
    pub async fn run(
        self,
        listeners: Vec<TcpListener>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            let _ = stop_tx.send(true);
        });

        let mut servers = JoinSet::new();
        for listener in listeners {
            let addr = listener.local_addr()?;
            let claimed = addr.port() == self.config.asset_server.port;
            tracing::info!(
                address = %addr,
                asset_port = claimed,
                "HTTP server starting"
            );

            let app = self
                .router
                .clone()
                .into_make_service_with_connect_info::<ConnectionMeta>();
            let mut stop = stop_rx.clone();

            servers.spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = stop.wait_for(|stopped| *stopped).await;
                    })
                    .await
            });
        }

        while let Some(joined) = servers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(std::io::Error::other(e)),
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Interceptor: claimed connections go to the asset pipeline, the rest on
/// down the chain.
async fn asset_gate(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let claimed = request
        .extensions()
        .get::<ConnectInfo<ConnectionMeta>>()
        .is_some_and(|ConnectInfo(conn)| state.gate.claims(conn));

    if claimed {
        state.assets.handle(request).await
    } else {
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{self, StatusCode};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn router(asset_port: u16) -> Router {
        let mut config = GatewayConfig::default();
        config.asset_server.port = asset_port;
        HttpServer::new(config).unwrap().router
    }

    fn arriving_on(port: u16, uri: &str) -> Request<Body> {
        let local: SocketAddr = ([127, 0, 0, 1], port).into();
        let remote: SocketAddr = ([127, 0, 0, 1], 40000).into();
        let mut request = http::Request::builder().uri(uri).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(ConnectionMeta::new(Some(local), remote)));
        request
    }

    #[tokio::test]
    async fn unclaimed_port_reaches_ping() {
        let response = router(5001).oneshot(arriving_on(5000, "/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn claimed_port_goes_to_assets() {
        // Serving is disabled by default, so every claimed request is a 400.
        let response = router(5001).oneshot(arriving_on(5001, "/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_connect_info_is_unclaimed() {
        let request = http::Request::builder().uri("/ping").body(Body::empty()).unwrap();
        let response = router(5001).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
