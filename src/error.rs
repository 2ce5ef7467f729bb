//! Caller-facing errors for the account service.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Stable kind of a failure, as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    InvalidArgument,
    NotFound,
    Internal,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::NotFound => "NOT_FOUND",
            Code::Internal => "INTERNAL",
        }
    }

    /// HTTP status used by the transport for this kind.
    pub fn status(&self) -> StatusCode {
        match self {
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            Code::NotFound => StatusCode::NOT_FOUND,
            Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enum representing server-side errors.
#[derive(Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("invalid user id")]
    InvalidId,

    #[error("no account is registered with this email")]
    UnknownEmail,

    #[error("old password is wrong")]
    InvalidCredentials,

    #[error("user not found")]
    NotFound,

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    /// Wrap an unexpected failure.
    pub fn internal<E>(details: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            details: details.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Short summary used as problem `title`.
    pub fn title(&self) -> &'static str {
        match self {
            ServerError::Validation(_) => {
                "There were validation errors with your request."
            },
            ServerError::Axum(_) => "Request body could not be parsed.",
            ServerError::InvalidId => "User id must be greater than zero.",
            ServerError::UnknownEmail => "No account matches this email.",
            ServerError::InvalidCredentials => "Credentials are invalid.",
            ServerError::NotFound => "Requested resource does not exist.",
            ServerError::Internal { .. } => "Internal server error.",
        }
    }

    /// Kind reported to the caller.
    pub fn code(&self) -> Code {
        match self {
            ServerError::Validation(_)
            | ServerError::Axum(_)
            | ServerError::InvalidId
            | ServerError::UnknownEmail
            | ServerError::InvalidCredentials => Code::InvalidArgument,
            ServerError::NotFound => Code::NotFound,
            ServerError::Internal { .. } => Code::Internal,
        }
    }
}

// Validation params carry the rejected values, passwords included.
impl std::fmt::Debug for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Validation(errors) => {
                let fields = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, issues)| {
                        let codes = issues
                            .iter()
                            .map(|issue| issue.code.clone())
                            .collect::<Vec<_>>();
                        (field, codes)
                    })
                    .collect::<BTreeMap<_, _>>();
                f.debug_tuple("Validation").field(&fields).finish()
            },
            ServerError::Axum(rejection) => {
                f.debug_tuple("Axum").field(rejection).finish()
            },
            ServerError::InvalidId => f.write_str("InvalidId"),
            ServerError::UnknownEmail => f.write_str("UnknownEmail"),
            ServerError::InvalidCredentials => f.write_str("InvalidCredentials"),
            ServerError::NotFound => f.write_str("NotFound"),
            ServerError::Internal { details, source } => f
                .debug_struct("Internal")
                .field("details", details)
                .field("source", source)
                .finish(),
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
    code: Code,
}

impl ResponseError {
    /// Update error kind and the matching status code.
    pub fn code(mut self, code: Code) -> Self {
        self.status = code.status().as_u16();
        self.code = code;
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/problem+json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
            code: Code::Internal,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect::<Vec<_>>();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title(self.title())
            .details(&self.to_string())
            .code(self.code());

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },

            ServerError::Axum(rejection) => {
                response.details(&rejection.body_text())
            },

            ServerError::Internal { details, source } => {
                tracing::error!(error = ?source, %details, "server returned 500 status");

                ResponseError::default()
            },

            _ => response,
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/problem+json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
                "code": Code::Internal.as_str(),
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
