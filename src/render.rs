//! Rendering of verification results into HTTP responses.

mod html;
mod json;

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use axum::response::Response;
use thiserror::Error;

use crate::api::{self, Outcome};

/// Renders each kind of verification result into a response.
trait Render {
    /// Renders the response disclosing the email address to a user who passed the reCAPTCHA.
    fn verified(&self, email: &str) -> Response;

    /// Renders the response for a user who failed the reCAPTCHA.
    fn failed(&self) -> Response;

    /// Renders the response for a request that couldn't be verified.
    fn error(&self, error: &api::Error) -> Response;
}

/// How responses are rendered, chosen per deployment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub(crate) enum Variant {
    /// `application/json` responses, for pages that fetch the email address with a script.
    #[default]
    Json,

    /// `text/html` fragments, for forms submitted straight from the browser.
    Html,
}

impl Variant {
    /// Renders the result of verifying a request, disclosing `email` if the reCAPTCHA was passed.
    pub(crate) fn render(self, result: &Result<Outcome, api::Error>, email: &str) -> Response {
        let renderer: &dyn Render = match self {
            Self::Json => &json::JsonRenderer,
            Self::Html => &html::HtmlRenderer,
        };

        match result {
            Ok(Outcome::Verified) => renderer.verified(email),
            Ok(Outcome::Failed) => renderer.failed(),
            Err(error) => renderer.error(error),
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Html => "html",
        })
    }
}

/// An error parsing a [`Variant`].
#[derive(Error, Clone, PartialEq, Eq, Debug)]
#[error("unknown response variant {0:?}, expected \"json\" or \"html\"")]
pub(crate) struct ParseVariantError(String);

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(str: &str) -> Result<Self, Self::Err> {
        if str.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if str.eq_ignore_ascii_case("html") {
            Ok(Self::Html)
        } else {
            Err(ParseVariantError(str.into()))
        }
    }
}
