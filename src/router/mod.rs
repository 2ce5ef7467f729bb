//! RPC-over-HTTP transport: one `POST /UserService/<Method>` per operation.
pub mod status;
mod users;

use axum::Router;
use axum::extract::{FromRequest, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;

use crate::AppState;
use crate::error::ServerError;
use crate::user::{
    CREATE_USER, GET_USER_BY_EMAIL, GET_USER_BY_ID, UPDATE_USER_NAME,
    UPDATE_USER_PASSWORD,
};

/// JSON body whose rejections become [`ServerError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct Payload<T>(pub T);

/// Routes of the `UserService`.
pub fn user_service() -> Router<AppState> {
    Router::new()
        .route(&format!("/{CREATE_USER}"), post(users::create))
        .route(&format!("/{GET_USER_BY_ID}"), post(users::get_by_id))
        .route(&format!("/{GET_USER_BY_EMAIL}"), post(users::get_by_email))
        .route(
            &format!("/{UPDATE_USER_PASSWORD}"),
            post(users::update_password),
        )
        .route(&format!("/{UPDATE_USER_NAME}"), post(users::update_name))
}

/// Prometheus exposition, when the recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::default()),
    }
}
