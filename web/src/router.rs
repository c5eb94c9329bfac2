use crate::{
    controller::{
        event_controller, health_check_controller, options_controller, sensor_controller, user,
        user_controller,
    },
    middleware::media_type::require_json,
    params, stream, AppState,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Sensor Platform API"
        ),
        paths(
            health_check_controller::ping,
            sensor_controller::create,
            sensor_controller::index,
            sensor_controller::read,
            sensor_controller::history,
            stream::handler::event_stream,
            event_controller::create,
            user_controller::create,
            user::sensor_controller::index,
            user::sensor_controller::create,
        ),
        components(
            schemas(
                domain::events::Model,
                domain::sensors::Model,
                domain::sensors_users::Model,
                domain::users::Model,
                domain::sensor_type::SensorType,
                params::event::CreateParams,
                params::sensor::CreateParams,
                params::user::CreateParams,
                params::user::SensorBindingParams,
            )
        ),
        tags(
            (name = "sensor_platform", description = "Sensor registration, event ingestion and live streaming API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(sensor_routes(app_state.clone()))
        .merge(event_routes(app_state.clone()))
        .merge(user_routes(app_state))
        .route_layer(from_fn(require_json))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/ping", get(health_check_controller::ping))
}

fn sensor_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/sensors",
            get(sensor_controller::index)
                .post(sensor_controller::create)
                .options(options_controller::sensors),
        )
        .route(
            "/sensors/{id}",
            get(sensor_controller::read).options(options_controller::sensor),
        )
        .route("/sensors/{id}/history", get(sensor_controller::history))
        .route("/sensors/{id}/events", get(stream::handler::event_stream))
        .with_state(app_state)
}

fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/events",
            post(event_controller::create).options(options_controller::events),
        )
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/users",
            post(user_controller::create).options(options_controller::users),
        )
        .route(
            "/users/{user_id}/sensors",
            get(user::sensor_controller::index)
                .post(user::sensor_controller::create)
                .options(options_controller::user_sensors),
        )
        .with_state(app_state)
}
