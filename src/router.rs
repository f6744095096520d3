//! The HTTP router and its request handler.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Response, routing::post, Router};
use axum_macros::debug_handler;

use crate::{
    api::{self, captcha::Siteverify},
    config::Config,
    render::Variant,
};

/// Everything the request handler needs, built once at startup.
#[derive(Debug)]
pub(crate) struct AppState {
    /// The client for the reCAPTCHA verification endpoint.
    siteverify: Siteverify,

    /// The email address to disclose to users who pass the reCAPTCHA.
    email_address: String,

    /// How responses are rendered.
    variant: Variant,
}

impl AppState {
    /// Builds the handler's state from the server's configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the verification endpoint can't be initialized.
    pub(crate) fn new(config: Config) -> reqwest::Result<Self> {
        Ok(Self {
            siteverify: Siteverify::new(
                config.siteverify_url,
                config.recaptcha_secret_key,
                config.siteverify_timeout,
            )?,
            email_address: config.email_address,
            variant: config.variant,
        })
    }
}

/// Constructs the router for all routes.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/", post(handle)).with_state(state)
}

/// Verifies the reCAPTCHA token in a form submission and responds with the email address if it
/// passes.
#[debug_handler]
async fn handle(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let result = api::verify(&state.siteverify, &body).await;

    if let Err(error) = &result {
        let title = error.title();

        if error.status().is_client_error() {
            tracing::warn!(title, %error, "Rejected request");
        } else {
            tracing::error!(title, %error, "Failed to verify request");
        }
    }

    state.variant.render(&result, &state.email_address)
}
