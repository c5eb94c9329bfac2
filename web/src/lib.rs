//! HTTP and WebSocket surface of the sensor platform.
use axum::http::{header, HeaderValue, Method};
use domain::context::Context;
use domain::Services;
use log::*;
use service::config::Config;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod middleware;
mod params;
pub mod router;
mod stream;

pub use error::{Error, Result};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub services: Services,
    pub live: Arc<live::Manager>,
}

impl AppState {
    pub fn new(config: Config, services: Services) -> Self {
        let live = live::Manager::new(
            services.event_store(),
            live::Config {
                push_interval: config.push_interval(),
                max_consecutive_write_failures: config.max_consecutive_write_failures(),
            },
        );

        Self {
            config,
            services,
            live: Arc::new(live),
        }
    }

    /// Context bounding a single REST request.
    pub fn request_context(&self) -> Context {
        Context::background().with_timeout(self.config.request_timeout())
    }
}

pub async fn init_server<F>(app_state: AppState, shutdown_signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let server_url = format!("{}:{}", app_state.config.interface, app_state.config.port);
    let listener = tokio::net::TcpListener::bind(&server_url).await?;

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .allow_origin(allowed_origins(&app_state.config));

    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, router::define_routes(app_state).layer(cors_layer))
        .with_graceful_shutdown(shutdown_signal)
        .await
}

fn allowed_origins(config: &Config) -> Vec<HeaderValue> {
    config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Ignoring invalid CORS origin {origin}: {err}");
                None
            }
        })
        .collect()
}
