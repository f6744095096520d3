//! See [`Siteverify`].

use std::{
    fmt::{self, Debug, Formatter},
    time::Duration,
};

use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::api;

/// A decoded response from the reCAPTCHA `siteverify` API.
///
/// Fields missing from the response take their default values, so a response without `success` is
/// treated as a failed verification.
#[derive(Deserialize, Default, Clone, PartialEq, Debug)]
#[serde(default)]
pub(crate) struct SiteverifyResponse {
    /// Whether the token was valid.
    pub(crate) success: bool,

    /// When the challenge was loaded, in ISO 8601 format.
    pub(crate) challenge_ts: Option<String>,

    /// The hostname of the site the challenge was solved on.
    pub(crate) hostname: Option<String>,

    /// The reCAPTCHA v3 score, from 0.0 (likely a bot) to 1.0 (likely a human).
    pub(crate) score: Option<f32>,

    /// Why verification failed, if it did.
    #[serde(rename = "error-codes")]
    pub(crate) error_codes: Vec<String>,
}

/// A client for the reCAPTCHA `siteverify` API.
#[derive(Clone)]
pub(crate) struct Siteverify {
    /// The HTTP client requests are sent with. Its connection pool is shared between requests.
    client: reqwest::Client,

    /// The `siteverify` endpoint.
    url: Url,

    /// The secret key shared with the `siteverify` endpoint.
    secret_key: String,
}

impl Siteverify {
    /// Constructs a new [`Siteverify`] client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be initialized.
    pub(crate) fn new(url: Url, secret_key: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url,
            secret_key,
        })
    }

    /// Asks the `siteverify` endpoint whether a reCAPTCHA token is valid.
    ///
    /// # Errors
    ///
    /// - [`api::Error::HttpRequest`] if the request can't be sent or its response can't be read.
    /// - [`api::Error::Siteverify`] if the endpoint responds with a status other than `200 OK`.
    /// - [`api::Error::Deserialization`] if the response body doesn't start with a
    ///   [`SiteverifyResponse`].
    pub(crate) async fn verify(&self, token: &str) -> Result<SiteverifyResponse, api::Error> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[("secret", self.secret_key.as_str()), ("response", token)])
            .send()
            .await
            // The URL includes the secret key, so it mustn't end up in error messages.
            .map_err(|error| api::Error::HttpRequest(error.without_url()))?;

        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();

            return Err(api::Error::Siteverify { status, body });
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| api::Error::HttpRequest(error.without_url()))?;

        // Anything after the first JSON value is ignored. An empty body still fails to decode.
        serde_json::Deserializer::from_slice(&body)
            .into_iter::<SiteverifyResponse>()
            .next()
            .unwrap_or_else(|| serde_json::from_slice(&body))
            .map_err(api::Error::Deserialization)
    }
}

impl Debug for Siteverify {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Siteverify")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    /// The secret key the mock `siteverify` endpoint expects.
    const SECRET_KEY: &str = "test-secret-key";

    /// Constructs a [`Siteverify`] client for a mock server.
    fn client_for(server: &MockServer) -> anyhow::Result<Siteverify> {
        let url = format!("{}/recaptcha/api/siteverify", server.uri()).parse::<Url>()?;

        Ok(Siteverify::new(
            url,
            SECRET_KEY.into(),
            Duration::from_secs(5),
        )?)
    }

    #[tokio::test]
    async fn sends_secret_and_token_as_query() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/recaptcha/api/siteverify"))
            .and(query_param("secret", SECRET_KEY))
            .and(query_param("response", "a token&more"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "challenge_ts": "2026-10-17T12:00:00Z",
                "hostname": "example.com",
                "score": 0.9,
                "error-codes": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)?.verify("a token&more").await?;

        assert_eq!(
            response,
            SiteverifyResponse {
                success: true,
                challenge_ts: Some("2026-10-17T12:00:00Z".into()),
                hostname: Some("example.com".into()),
                score: Some(0.9),
                error_codes: Vec::new(),
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_take_defaults() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error-codes": ["invalid-input-response"],
            })))
            .mount(&server)
            .await;

        let response = client_for(&server)?.verify("token").await?;

        assert!(!response.success, "missing `success` should mean failure");
        assert_eq!(response.error_codes, ["invalid-input-response"]);

        Ok(())
    }

    #[tokio::test]
    async fn non_ok_status_is_siteverify_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("try again later"))
            .mount(&server)
            .await;

        let error = client_for(&server)?
            .verify("token")
            .await
            .expect_err("non-OK status should be an error");

        assert!(
            matches!(
                &error,
                api::Error::Siteverify { status, body }
                    if *status == StatusCode::SERVICE_UNAVAILABLE && body == "try again later"
            ),
            "unexpected error: {error}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unparsable_body_is_deserialization_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let error = client_for(&server)?
            .verify("token")
            .await
            .expect_err("unparsable body should be an error");

        assert!(
            matches!(error, api::Error::Deserialization(_)),
            "unexpected error: {error}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_request_error() -> anyhow::Result<()> {
        // Nothing listens on port 1, so the connection is refused.
        let client = Siteverify::new(
            "http://127.0.0.1:1/recaptcha/api/siteverify".parse::<Url>()?,
            SECRET_KEY.into(),
            Duration::from_secs(5),
        )?;

        let error = client
            .verify("token")
            .await
            .expect_err("unreachable endpoint should be an error");

        let message = error.to_string();

        assert!(
            matches!(error, api::Error::HttpRequest(_)),
            "unexpected error: {error}"
        );
        assert!(
            message.starts_with("error sending request: "),
            "error message should include its causes: {message}"
        );
        assert!(
            !message.contains(SECRET_KEY),
            "error message should omit the secret key: {message}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = Siteverify::new(
            format!("{}/recaptcha/api/siteverify", server.uri()).parse::<Url>()?,
            SECRET_KEY.into(),
            Duration::from_secs(1),
        )?;

        let error = client
            .verify("token")
            .await
            .expect_err("slow endpoint should time out");

        assert!(
            matches!(&error, api::Error::HttpRequest(source) if source.is_timeout()),
            "unexpected error: {error}"
        );
        assert!(
            error.to_string().contains("timed out"),
            "error message should say the request timed out: {error}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn trailing_bytes_after_response_are_ignored() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"success":true} trailing garbage"#),
            )
            .mount(&server)
            .await;

        let response = client_for(&server)?.verify("token").await?;

        assert!(response.success, "first JSON value should be decoded");

        Ok(())
    }

    #[tokio::test]
    async fn empty_body_is_deserialization_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let error = client_for(&server)?
            .verify("token")
            .await
            .expect_err("empty body should be an error");

        assert!(
            matches!(error, api::Error::Deserialization(_)),
            "unexpected error: {error}"
        );

        Ok(())
    }
}
