//! See [`JsonRenderer`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::Render;
use crate::api;

/// Renders `application/json` responses.
#[derive(Clone, Copy, Debug)]
pub(super) struct JsonRenderer;

/// The response body for a verification that didn't error.
#[derive(Serialize, Debug)]
struct SecretResponse<'a> {
    /// Whether the reCAPTCHA was passed.
    success: bool,

    /// The email address, present only if the reCAPTCHA was passed.
    secret: Option<&'a str>,
}

/// The response body for a verification that errored.
#[derive(Serialize, Debug)]
struct ErrorResponse<'a> {
    /// The response's HTTP status code.
    status: u16,

    /// The name of the error's category.
    title: &'a str,

    /// A description of what went wrong.
    detail: String,
}

impl Render for JsonRenderer {
    fn verified(&self, email: &str) -> Response {
        let body = SecretResponse {
            success: true,
            secret: Some(email),
        };

        (StatusCode::OK, Json(body)).into_response()
    }

    fn failed(&self) -> Response {
        let body = SecretResponse {
            success: false,
            secret: None,
        };

        (StatusCode::OK, Json(body)).into_response()
    }

    fn error(&self, error: &api::Error) -> Response {
        let status = error.status();

        let body = ErrorResponse {
            status: status.as_u16(),
            title: error.title(),
            detail: error.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
