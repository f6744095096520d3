//! The reCAPTCHA verification pipeline shared by every response variant.

pub(crate) mod captcha;
pub(crate) mod form;

use std::error::Error as _;

use axum::http::StatusCode;
use strum_macros::IntoStaticStr;
use thiserror::Error;

use self::{captcha::Siteverify, form::FormError};

/// The form key holding the reCAPTCHA response token.
pub(crate) const TOKEN_KEY: &str = "g-recaptcha-response";

/// What the verification pipeline concluded about a request that didn't error.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum Outcome {
    /// The reCAPTCHA was passed, so the email address should be disclosed.
    Verified,

    /// The reCAPTCHA was failed.
    Failed,
}

/// An error verifying a request.
///
/// The variant name converts into the error's title (e.g. `BadRequest`).
#[derive(Error, IntoStaticStr, Debug)]
pub(crate) enum Error {
    /// The request body was unusable.
    #[error(transparent)]
    #[strum(serialize = "BadRequest")]
    BadRequest(#[from] BadRequest),

    /// The request to the `siteverify` endpoint failed in transport.
    ///
    /// The message includes every cause in the chain, so a refused connection can be told apart
    /// from a timeout.
    #[error("{}", source_chain(.0))]
    #[strum(serialize = "HttpRequestError")]
    HttpRequest(#[source] reqwest::Error),

    /// The `siteverify` endpoint responded with a status other than `200 OK`.
    #[error("siteverify responded with {}. Body of response: {body}", .status.as_u16())]
    #[strum(serialize = "SiteverifyError")]
    Siteverify {
        /// The status of the response.
        status: StatusCode,

        /// The body of the response, or an empty string if it couldn't be read.
        body: String,
    },

    /// The `siteverify` endpoint's response body couldn't be decoded.
    #[error(transparent)]
    #[strum(serialize = "DeserializationError")]
    Deserialization(serde_json::Error),
}

impl Error {
    /// Gets the HTTP response status corresponding to the error.
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::HttpRequest(_) | Self::Siteverify { .. } | Self::Deserialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Gets the error's title, the name of its category.
    pub(crate) fn title(&self) -> &'static str {
        self.into()
    }
}

/// Why a request body was unusable.
#[derive(Error, Debug)]
pub(crate) enum BadRequest {
    /// The body wasn't valid form data.
    #[error(transparent)]
    Form(#[from] FormError),

    /// The body had no reCAPTCHA token.
    #[error("key `g-recaptcha-response` absent from request data")]
    MissingToken,
}

/// Formats an error followed by each of its sources, separated by `: `.
fn source_chain(error: &reqwest::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }

    chain
}

/// Verifies the reCAPTCHA token in a form request body.
///
/// # Errors
///
/// See [`Error`].
#[tracing::instrument(name = "verify", skip_all)]
pub(crate) async fn verify(siteverify: &Siteverify, body: &[u8]) -> Result<Outcome, Error> {
    let form = form::parse(body).map_err(BadRequest::from)?;

    // An empty token is still forwarded; siteverify answers it with `success: false`.
    let token = form.first(TOKEN_KEY).ok_or(BadRequest::MissingToken)?;

    tracing::debug!(token_length = token.len(), "Received reCAPTCHA token");

    let response = siteverify.verify(token).await?;

    tracing::info!(
        success = response.success,
        hostname = ?response.hostname,
        challenge_ts = ?response.challenge_ts,
        score = ?response.score,
        error_codes = ?response.error_codes,
        "siteverify responded",
    );

    Ok(if response.success {
        Outcome::Verified
    } else {
        Outcome::Failed
    })
}
