//! Connection settings for a `Session`.

use std::env;
use std::fmt;

use crate::error::ApiError;

/// Host, credentials and the debug flag for one session.
///
/// The password is never printed by the `Debug` implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    base_url: String,
    username: String,
    password: String,
    debug: bool,
}

impl SessionConfig {
    /// Settings for the service at `host`, reached over HTTPS.
    pub fn new(host: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: format!("https://{}", host.trim_end_matches('/')),
            username: username.to_string(),
            password: password.to_string(),
            debug: false,
        }
    }

    /// Replace scheme and host, e.g. `http://127.0.0.1:3000` for a local server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Trace every outgoing request and incoming response at DEBUG level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Read `KAITEN_HOST` (or `KAITEN_BASE_URL`), `KAITEN_USERNAME`,
    /// `KAITEN_PASSWORD` and the optional `KAITEN_DEBUG`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| ApiError::Config(format!("{name} is not set")))
        };

        let username = required("KAITEN_USERNAME")?;
        let password = required("KAITEN_PASSWORD")?;
        let config = match lookup("KAITEN_BASE_URL") {
            Some(base_url) => Self::new("", &username, &password).with_base_url(&base_url),
            None => Self::new(&required("KAITEN_HOST")?, &username, &password),
        };
        let debug = lookup("KAITEN_DEBUG")
            .map(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        Ok(config.with_debug(debug))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("debug", &self.debug)
            .finish()
    }
}
