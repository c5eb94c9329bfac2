use crate::controller::ApiResponse;
use crate::params::{self, user::CreateParams};
use crate::{AppState, Error};
use axum::extract::{rejection::JsonRejection, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::users;

use log::*;

/// POST create a new User
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateParams,
    responses(
        (status = 200, description = "Successfully created a new User", body = users::Model),
        (status = 415, description = "Content-Type is not application/json"),
        (status = 422, description = "Empty user name"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateParams>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let params = params::json_body(payload)?;
    debug!("CREATE new User from: {params:?}");

    let ctx = app_state.request_context();
    let user = app_state.services.users.register(&ctx, &params.name).await?;

    debug!("Newly created User {user:?}");

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}
