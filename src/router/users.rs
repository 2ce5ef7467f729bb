//! Handlers of the `UserService` methods.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::Result;
use crate::router::Payload;
use crate::user::{
    ChangeUserNameRequest, ChangeUserPasswordRequest, GetUserByEmailRequest,
    GetUserByIdRequest, NewUser, OperationResult, User, UserProfile,
};

/// `POST /UserService/CreateUser`.
pub async fn create(
    State(state): State<AppState>,
    Payload(body): Payload<NewUser>,
) -> Result<Json<UserProfile>> {
    state.service.create_user(body).await.map(Json)
}

/// `POST /UserService/GetUserByID`.
pub async fn get_by_id(
    State(state): State<AppState>,
    Payload(body): Payload<GetUserByIdRequest>,
) -> Result<Json<User>> {
    state.service.get_user_by_id(body.id).await.map(Json)
}

/// `POST /UserService/GetUserByEmail`.
pub async fn get_by_email(
    State(state): State<AppState>,
    Payload(body): Payload<GetUserByEmailRequest>,
) -> Result<Json<User>> {
    state.service.get_user_by_email(&body.email).await.map(Json)
}

/// `POST /UserService/UpdateUserPassword`.
pub async fn update_password(
    State(state): State<AppState>,
    Payload(body): Payload<ChangeUserPasswordRequest>,
) -> Result<Json<OperationResult>> {
    state.service.update_user_password(body).await.map(Json)
}

/// `POST /UserService/UpdateUserName`.
pub async fn update_name(
    State(state): State<AppState>,
    Payload(body): Payload<ChangeUserNameRequest>,
) -> Result<Json<OperationResult>> {
    state.service.update_user_name(body).await.map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use crate::router::tests::state;
    use crate::*;

    async fn call(app: axum::Router, method: &str, body: Value) -> (StatusCode, Value) {
        let response = make_request(
            app,
            Method::POST,
            &format!("/UserService/{method}"),
            body.to_string(),
        )
        .await;

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn alice() -> Value {
        json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "secret1",
        })
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = app(state());

        let (status, body) = call(app.clone(), "CreateUser", alice()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["email"], "alice@example.com");
        assert!(body.get("password").is_none());
        let id = body["id"].as_u64().unwrap();
        assert!(id > 0);

        let (status, body) =
            call(app.clone(), "GetUserByID", json!({ "id": id })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "alice@example.com");
        assert!(body["password"].as_str().unwrap().starts_with("$argon2id$"));

        let (status, by_email) = call(
            app,
            "GetUserByEmail",
            json!({ "email": "alice@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_email, body);
    }

    #[tokio::test]
    async fn test_create_invalid() {
        let app = app(state());

        let (status, body) = call(
            app,
            "CreateUser",
            json!({
                "name": "Al",
                "email": "alice@example.com",
                "password": "secret1",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
        assert_eq!(body["errors"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let app = app(state());

        let response = make_request(
            app,
            Method::POST,
            "/UserService/CreateUser",
            "{\"name\":".into(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let app = app(state());

        let (status, body) = call(app.clone(), "GetUserByID", json!({ "id": 0 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");

        let (status, body) = call(app.clone(), "GetUserByID", json!({ "id": 7 })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = call(
            app,
            "GetUserByEmail",
            json!({ "email": "bob@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_password() {
        let app = app(state());
        call(app.clone(), "CreateUser", alice()).await;

        let (status, body) = call(
            app.clone(),
            "UpdateUserPassword",
            json!({
                "email": "alice@example.com",
                "oldPassword": "wrong",
                "newPassword": "secret2",
                "confirmNewPassword": "secret2",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");

        let (status, body) = call(
            app,
            "UpdateUserPassword",
            json!({
                "email": "alice@example.com",
                "oldPassword": "secret1",
                "newPassword": "secret2",
                "confirmNewPassword": "secret2",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Password updated");
    }

    #[tokio::test]
    async fn test_update_name() {
        let app = app(state());
        call(app.clone(), "CreateUser", alice()).await;

        let (status, body) = call(
            app.clone(),
            "UpdateUserName",
            json!({ "email": "alice@example.com", "newName": "Alicia" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = call(
            app.clone(),
            "GetUserByEmail",
            json!({ "email": "alice@example.com" }),
        )
        .await;
        assert_eq!(body["name"], "Alicia");

        let (status, _) = call(
            app,
            "UpdateUserName",
            json!({ "email": "bob@example.com", "newName": "Bobby" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
