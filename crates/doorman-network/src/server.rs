//! HTTP server for remote door control.
//!
//! # Architecture
//!
//! ```text
//! browser / script ──► HttpDoorServer ──► axum Router ──► DoorService
//!                        (listener)      (trace, request limit)
//! ```
//!
//! Door routes are generated from [`DoorId::all`], so `/door3/on` falls
//! through to the 404 fallback. Methods other than `GET` on a known route are
//! answered with 405 by the router.
//!
//! # Example Usage
//!
//! ```no_run
//! use doorman_network::{DoorService, HttpDoorServer, HttpServerConfig};
//!
//! # async fn example<D: DoorService>(service: D) -> Result<(), Box<dyn std::error::Error>> {
//! let server = HttpDoorServer::bind(HttpServerConfig::default(), service).await?;
//! println!("listening on {}", server.local_addr()?);
//! server.serve().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No authentication**: the door routes are open to anyone who can reach
//!   the port; restricting access is left to the network the node runs on
//! - **No TLS**: plain HTTP on the local network
//! - **Bounded**: at most `max_requests` requests are handled at once; the
//!   rest wait for a slot

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::get;
use doorman_core::DoorId;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::page::INDEX_HTML;
use crate::service::{DoorService, DoorStatus};

/// Configuration for the HTTP door server
///
/// # Example
///
/// ```
/// use doorman_network::HttpServerConfig;
///
/// let config = HttpServerConfig {
///     bind_addr: "127.0.0.1:8080".parse().unwrap(),
///     ..Default::default()
/// };
/// assert_eq!(config.max_requests, 16);
/// ```
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Maximum number of requests handled at once
    pub max_requests: usize,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            max_requests: 16,
        }
    }
}

/// Errors that can occur during HTTP server operations
#[derive(Debug, Error)]
pub enum HttpServerError {
    /// Failed to bind to address
    #[error("Failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Routes of the door surface over `service`.
pub fn router<D: DoorService>(service: D, max_requests: usize) -> Router {
    let mut routes = Router::<Arc<D>>::new()
        .route("/", get(index))
        .route("/status", get(status::<D>));

    for door in DoorId::all() {
        routes = routes
            .route(
                &format!("/door{door}/on"),
                get(move |State(service): State<Arc<D>>| switch(service, door, true)),
            )
            .route(
                &format!("/door{door}/off"),
                get(move |State(service): State<Arc<D>>| switch(service, door, false)),
            );
    }

    routes
        .fallback(not_found)
        .with_state(Arc::new(service))
        .layer(ConcurrencyLimitLayer::new(max_requests))
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn status<D: DoorService>(State(service): State<Arc<D>>) -> Json<Vec<DoorStatus>> {
    Json(service.status().await)
}

async fn switch<D: DoorService>(service: Arc<D>, door: DoorId, open: bool) -> (StatusCode, String) {
    let result = if open {
        service.open(door).await
    } else {
        service.close(door).await
    };

    match result {
        Ok(_) => {
            info!(
                "Door {} {} via network",
                door,
                if open { "opened" } else { "closed" }
            );
            let verb = if open { "aberta" } else { "fechada" };
            (StatusCode::OK, format!("Porta {door} {verb}"))
        }
        Err(e) => {
            error!("Network request on door {} failed: {}", door, e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Erro: {e}"))
        }
    }
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// HTTP server exposing a [`DoorService`]
pub struct HttpDoorServer {
    /// Bound listener; connections queue here until [`serve`](Self::serve) runs
    listener: TcpListener,

    /// Door routes with their middleware
    router: Router,
}

impl HttpDoorServer {
    /// Bind the server to the configured address
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError::BindFailed` if the address is in use or
    /// cannot be bound.
    pub async fn bind<D: DoorService>(
        config: HttpServerConfig,
        service: D,
    ) -> Result<Self, HttpServerError> {
        info!("Binding HTTP door server to {}", config.bind_addr);

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| HttpServerError::BindFailed {
                addr: config.bind_addr,
                source,
            })?;

        info!(
            "HTTP door server listening on {} (max {} requests)",
            listener.local_addr()?,
            config.max_requests
        );

        Ok(Self {
            listener,
            router: router(service, config.max_requests),
        })
    }

    /// Address the listener is bound to
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, HttpServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until the task is dropped
    pub async fn serve(self) {
        if let Err(e) = axum::serve(self.listener, self.router).await {
            error!("HTTP door server stopped: {}", e);
        }
    }
}

impl std::fmt::Debug for HttpDoorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDoorServer")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use doorman_core::{DoorState, Error, Result};
    use rstest::rstest;
    use tower::ServiceExt;

    /// Every door reports closed; door 2 refuses to move.
    struct StuckDoorTwo;

    impl DoorService for StuckDoorTwo {
        async fn open(&self, door: DoorId) -> Result<DoorState> {
            if door == DoorId::TWO {
                return Err(Error::Hardware("stuck".to_string()));
            }
            Ok(DoorState::Open)
        }

        async fn close(&self, _door: DoorId) -> Result<DoorState> {
            Ok(DoorState::Closed)
        }

        async fn status(&self) -> Vec<DoorStatus> {
            DoorId::all()
                .into_iter()
                .map(|door| DoorStatus {
                    door,
                    state: DoorState::Closed,
                })
                .collect()
        }
    }

    async fn call(method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = router(StuckDoorTwo, 4).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[rstest]
    #[case(Method::GET, "/door1/on", StatusCode::OK, "Porta 1 aberta")]
    #[case(Method::GET, "/door1/on?from=page", StatusCode::OK, "Porta 1 aberta")]
    #[case(Method::GET, "/door2/off", StatusCode::OK, "Porta 2 fechada")]
    #[case(Method::GET, "/door3/on", StatusCode::NOT_FOUND, "Not Found")]
    #[case(Method::GET, "/door1/toggle", StatusCode::NOT_FOUND, "Not Found")]
    #[case(Method::GET, "/favicon.ico", StatusCode::NOT_FOUND, "Not Found")]
    #[case(Method::POST, "/door1/on", StatusCode::METHOD_NOT_ALLOWED, "")]
    #[tokio::test]
    async fn test_route_table(
        #[case] method: Method,
        #[case] uri: &str,
        #[case] expected_status: StatusCode,
        #[case] expected_body: &str,
    ) {
        let (status, body) = call(method, uri).await;
        assert_eq!(status, expected_status);
        assert_eq!(body, expected_body);
    }

    #[tokio::test]
    async fn test_door_failure_reports_error() {
        let (status, body) = call(Method::GET, "/door2/on").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Erro: "));
        assert!(body.contains("stuck"));
    }

    #[tokio::test]
    async fn test_status_is_json() {
        let (status, body) = call(Method::GET, "/status").await;
        assert_eq!(status, StatusCode::OK);

        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"door": 1, "state": "closed"},
                {"door": 2, "state": "closed"},
            ])
        );
    }
}
