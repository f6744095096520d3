//! See [`HtmlRenderer`].

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::Render;
use crate::api;

/// Renders `text/html` fragments from templates.
#[derive(Clone, Copy, Debug)]
pub(super) struct HtmlRenderer;

/// A link to email the disclosed address.
#[derive(Template)]
#[template(path = "verified.html")]
struct VerifiedTemplate<'a> {
    /// The disclosed email address.
    email: &'a str,
}

/// A message telling the user they failed the reCAPTCHA.
#[derive(Template)]
#[template(path = "failed.html")]
struct FailedTemplate;

/// A message telling the user their request couldn't be verified.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    /// The name of the error's category.
    title: &'a str,

    /// A description of what went wrong.
    detail: &'a str,
}

impl Render for HtmlRenderer {
    fn verified(&self, email: &str) -> Response {
        let html = VerifiedTemplate { email }.to_string();

        (StatusCode::OK, Html(html)).into_response()
    }

    fn failed(&self) -> Response {
        (StatusCode::OK, Html(FailedTemplate.to_string())).into_response()
    }

    fn error(&self, error: &api::Error) -> Response {
        let html = ErrorTemplate {
            title: error.title(),
            detail: &error.to_string(),
        }
        .to_string();

        (error.status(), Html(html)).into_response()
    }
}
