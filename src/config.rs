//! See [`Config`].

use std::{
    env::VarError,
    fmt::{self, Debug, Formatter},
    time::Duration,
};

use reqwest::Url;
use thiserror::Error;

use crate::render::Variant;

/// The address to listen on if `ADDRESS` isn't set.
const DEFAULT_ADDRESS: &str = "127.0.0.1:3000";

/// The reCAPTCHA verification endpoint used if `SITEVERIFY_URL` isn't set.
const DEFAULT_SITEVERIFY_URL: &str = "https://www.recaptcha.net/recaptcha/api/siteverify";

/// The number of seconds to wait for the verification endpoint if `SITEVERIFY_TIMEOUT_SECS` isn't
/// set.
const DEFAULT_SITEVERIFY_TIMEOUT_SECS: u64 = 10;

/// The server's configuration, read once at startup and never changed afterward.
#[derive(Clone)]
pub(crate) struct Config {
    /// The socket address to listen on.
    pub(crate) address: String,

    /// The secret key shared with the reCAPTCHA verification endpoint.
    pub(crate) recaptcha_secret_key: String,

    /// The email address to disclose to users who pass the reCAPTCHA.
    pub(crate) email_address: String,

    /// How responses are rendered.
    pub(crate) variant: Variant,

    /// The reCAPTCHA verification endpoint.
    pub(crate) siteverify_url: Url,

    /// How long to wait for the verification endpoint before giving up.
    pub(crate) siteverify_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the environment, including any `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any variable is invalid.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(dotenvy::var)
    }

    /// Reads the configuration using `var` to look up each variable by name.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any variable is invalid.
    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, dotenvy::Error>,
    {
        // A variable that's set but unreadable (e.g. not UTF-8) is invalid rather than missing.
        let optional = |name: &'static str| match var(name) {
            Ok(value) => Ok(Some(value)),
            Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
            Err(error) => Err(ConfigError::Invalid {
                name,
                reason: error.to_string(),
            }),
        };

        let required = |name: &'static str| optional(name)?.ok_or(ConfigError::Missing { name });

        let variant = match optional("RESPONSE_VARIANT")? {
            Some(variant) => variant.parse::<Variant>().map_err(|error| ConfigError::Invalid {
                name: "RESPONSE_VARIANT",
                reason: error.to_string(),
            })?,
            None => Variant::default(),
        };

        let siteverify_url = optional("SITEVERIFY_URL")?
            .as_deref()
            .unwrap_or(DEFAULT_SITEVERIFY_URL)
            .parse::<Url>()
            .map_err(|error| ConfigError::Invalid {
                name: "SITEVERIFY_URL",
                reason: error.to_string(),
            })?;

        let siteverify_timeout_secs = match optional("SITEVERIFY_TIMEOUT_SECS")? {
            Some(secs) => match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SITEVERIFY_TIMEOUT_SECS",
                        reason: format!("expected a positive number of seconds, found {secs:?}"),
                    })
                }
            },
            None => DEFAULT_SITEVERIFY_TIMEOUT_SECS,
        };

        Ok(Self {
            address: optional("ADDRESS")?.unwrap_or_else(|| DEFAULT_ADDRESS.into()),
            recaptcha_secret_key: required("RECAPTCHA_SECRET_KEY")?,
            email_address: required("EMAIL_ADDRESS")?,
            variant,
            siteverify_url,
            siteverify_timeout: Duration::from_secs(siteverify_timeout_secs),
        })
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // The secret key is left out so the config can be logged safely.
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("email_address", &self.email_address)
            .field("variant", &self.variant)
            .field("siteverify_url", &self.siteverify_url.as_str())
            .field("siteverify_timeout", &self.siteverify_timeout)
            .finish_non_exhaustive()
    }
}

/// An error reading the [`Config`].
#[derive(Error, Debug)]
pub(crate) enum ConfigError {
    /// A required variable wasn't set.
    #[error("environment variable `{name}` should be set")]
    Missing {
        /// The variable's name.
        name: &'static str,
    },

    /// A variable was set to an unusable value.
    #[error("environment variable `{name}` is invalid: {reason}")]
    Invalid {
        /// The variable's name.
        name: &'static str,

        /// What's wrong with the value.
        reason: String,
    },
}
