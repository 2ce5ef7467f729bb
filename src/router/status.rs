//! Public instance status.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    name: String,
    version: String,
}

/// Instance name and running version.
pub async fn status(State(state): State<AppState>) -> Json<Status> {
    Json(Status {
        name: state.config.name.clone(),
        version: state.config.version.clone(),
    })
}
