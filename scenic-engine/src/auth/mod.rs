use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::http::HttpError;

mod login;
mod manager;

pub use login::{HttpLoginClient, LoginClient};
pub use manager::AuthManager;

/// One cache slot per project/environment pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthKey {
    pub project: String,
    pub env: String,
}

impl AuthKey {
    pub fn new(project: impl Into<String>, env: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            env: env.into(),
        }
    }
}

/// A cached login token. Cheap to clone; the secret itself is shared.
#[derive(Clone)]
pub struct AuthToken {
    value: Arc<SecretString>,
    pub acquired_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(value: String) -> Self {
        Self {
            value: Arc::new(SecretString::from(value)),
            acquired_at: Utc::now(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<redacted>)")
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("no login configuration for project `{project}` in env `{env}`")]
    MissingConfig { project: String, env: String },
    #[error(transparent)]
    Transport(#[from] HttpError),
    #[error("login response has no token at `{0}`")]
    MissingToken(String),
    #[error("login rejected with status {0}")]
    Rejected(u16),
}
