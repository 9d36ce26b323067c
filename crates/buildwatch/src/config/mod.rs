//! Process-wide run configuration, read once from the environment.

use thiserror::Error;

use crate::upstream::Platform;
use crate::utils::text::split_list;

pub const MISSING_AUTH_MESSAGE: &str = "Couldn't find valid authentication token or credentials.";
pub const DEFAULT_NUMBER_OF_BUILDS: usize = 1;

pub const ENV_API_KEY_ID: &str = "SPACESHIP_CONNECT_API_KEY_ID";
pub const ENV_API_ISSUER_ID: &str = "SPACESHIP_CONNECT_API_ISSUER_ID";
pub const ENV_API_KEY: &str = "SPACESHIP_CONNECT_API_KEY";
pub const ENV_USERNAME: &str = "ITC_USERNAME";
pub const ENV_PASSWORD: &str = "ITC_PASSWORD";
pub const ENV_TEAM_IDS: &str = "ITC_TEAM_IDS";
pub const ENV_BUNDLE_IDS: &str = "BUNDLE_IDENTIFIERS";
pub const ENV_NUMBER_OF_BUILDS: &str = "NUMBER_OF_BUILDS";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{}", MISSING_AUTH_MESSAGE)]
    MissingAuth,

    #[error("invalid NUMBER_OF_BUILDS value `{0}`: expected a non-negative integer")]
    InvalidBuildCount(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyCredentials {
    pub key_id: String,
    pub issuer_id: String,
    pub key: String,
}

impl std::fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("key_id", &self.key_id)
            .field("issuer_id", &self.issuer_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    ApiKey(ApiKeyCredentials),
    Credentials { username: String, password: String },
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(credentials) => f.debug_tuple("ApiKey").field(credentials).finish(),
            Self::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    ApiKey,
    Credentials,
}

impl AuthConfig {
    #[must_use]
    pub const fn mode(&self) -> AuthMode {
        match self {
            Self::ApiKey(_) => AuthMode::ApiKey,
            Self::Credentials { .. } => AuthMode::Credentials,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub auth: AuthConfig,
    /// Empty means "the session's default team only".
    pub team_ids: Vec<String>,
    /// Bundle identifiers; empty means "every app visible to the session".
    pub app_ids: Vec<String>,
    pub number_of_builds: usize,
    pub platform: Platform,
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let auth = resolve_auth(&read).ok_or(ConfigError::MissingAuth)?;
        let number_of_builds = match read(ENV_NUMBER_OF_BUILDS) {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidBuildCount(raw.clone()))?,
            None => DEFAULT_NUMBER_OF_BUILDS,
        };

        Ok(Self {
            auth,
            team_ids: read(ENV_TEAM_IDS).as_deref().map(split_list).unwrap_or_default(),
            app_ids: read(ENV_BUNDLE_IDS).as_deref().map(split_list).unwrap_or_default(),
            number_of_builds,
            platform: Platform::Ios,
        })
    }
}

/// An API key triple wins over username/password when both are complete.
fn resolve_auth(read: &impl Fn(&str) -> Option<String>) -> Option<AuthConfig> {
    if let (Some(key_id), Some(issuer_id), Some(key)) = (
        read(ENV_API_KEY_ID),
        read(ENV_API_ISSUER_ID),
        read(ENV_API_KEY),
    ) {
        return Some(AuthConfig::ApiKey(ApiKeyCredentials {
            key_id,
            issuer_id,
            key,
        }));
    }

    match (read(ENV_USERNAME), read(ENV_PASSWORD)) {
        (Some(username), Some(password)) => Some(AuthConfig::Credentials { username, password }),
        _ => None,
    }
}
