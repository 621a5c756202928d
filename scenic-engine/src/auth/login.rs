use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scenic_core::types::{AnyValue, LoginConfig};

use crate::assertions::extract_field;
use crate::auth::{AuthError, AuthKey};
use crate::http::{RequestClient, RequestParts};
use crate::request::{headers_to_map, scalar_string};

/// Performs the actual login exchange. Mocked in tests so the cache
/// logic can be exercised without a live endpoint.
#[async_trait]
pub trait LoginClient: Send + Sync {
    async fn login(&self, key: &AuthKey, cfg: &LoginConfig) -> Result<String, AuthError>;
}

pub struct HttpLoginClient {
    http: Arc<dyn RequestClient>,
    timeout: Duration,
}

impl HttpLoginClient {
    pub fn new(http: Arc<dyn RequestClient>, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl LoginClient for HttpLoginClient {
    async fn login(&self, key: &AuthKey, cfg: &LoginConfig) -> Result<String, AuthError> {
        tracing::debug!(project = %key.project, env = %key.env, url = %cfg.url, "logging in");
        let response = self
            .http
            .send(
                RequestParts {
                    method: cfg.method.clone(),
                    url: cfg.url.clone(),
                    headers: headers_to_map(cfg.headers.as_ref()),
                    data: cfg.data.clone(),
                    params: Vec::new(),
                    files: Default::default(),
                },
                self.timeout,
            )
            .await?;

        if !(200..300).contains(&response.status) {
            return Err(AuthError::Rejected(response.status));
        }

        let body = response.body_json();
        match extract_field(&body, &cfg.token_path) {
            Some(AnyValue::String(s)) => Ok(s),
            Some(AnyValue::Null) | None => Err(AuthError::MissingToken(cfg.token_path.clone())),
            Some(other) => Ok(scalar_string(&other)),
        }
    }
}
