use std::collections::HashMap;
use std::sync::Arc;

use scenic_core::types::RunConfig;
use tokio::sync::{Mutex, Notify};

use crate::auth::{AuthError, AuthKey, AuthToken, LoginClient};

/// Process-wide login token cache with single-flight refresh: any
/// number of concurrent scenarios asking for the same project/env token
/// trigger exactly one login request.
pub struct AuthManager {
    config: Arc<RunConfig>,
    login: Arc<dyn LoginClient>,
    state: Mutex<State>,
}

struct State {
    cache: HashMap<AuthKey, AuthToken>,
    inflight: HashMap<AuthKey, Arc<Notify>>,
    // Failures from the most recent in-flight login, so every waiter of
    // that flight sees the same error instead of piling on retries.
    failed: HashMap<AuthKey, AuthError>,
}

impl AuthManager {
    pub fn new(config: Arc<RunConfig>, login: Arc<dyn LoginClient>) -> Self {
        Self {
            config,
            login,
            state: Mutex::new(State {
                cache: HashMap::new(),
                inflight: HashMap::new(),
                failed: HashMap::new(),
            }),
        }
    }

    pub async fn get_token(&self, key: &AuthKey) -> Result<AuthToken, AuthError> {
        loop {
            let notify = {
                let mut s = self.state.lock().await;
                if let Some(token) = s.cache.get(key) {
                    return Ok(token.clone());
                }
                if let Some(n) = s.inflight.get(key) {
                    n.clone()
                } else {
                    // This task becomes the leader for this key.
                    s.failed.remove(key);
                    s.inflight.insert(key.clone(), Arc::new(Notify::new()));
                    drop(s);
                    return self.login_as_leader(key).await;
                }
            };

            // The leader may publish its outcome and notify between the
            // unlock above and this await. Arm the waiter first, then
            // re-check under the lock: an outcome recorded before the
            // arming is seen here, one recorded after it wakes the
            // armed waiter.
            let mut notified = Box::pin(notify.notified());
            notified.as_mut().enable();
            {
                let s = self.state.lock().await;
                if let Some(token) = s.cache.get(key) {
                    return Ok(token.clone());
                }
                if let Some(e) = s.failed.get(key) {
                    return Err(e.clone());
                }
                if !s.inflight.contains_key(key) {
                    // Leader gone without an outcome for this key; take
                    // over on the next pass.
                    continue;
                }
            }
            notified.await;

            let s = self.state.lock().await;
            if let Some(token) = s.cache.get(key) {
                return Ok(token.clone());
            }
            if let Some(e) = s.failed.get(key) {
                return Err(e.clone());
            }
            // Neither outcome recorded yet; loop and re-check.
        }
    }

    /// Drop the cached token so the next `get_token` performs exactly
    /// one fresh login. Called after a request comes back unauthorized.
    pub async fn invalidate(&self, key: &AuthKey) {
        let mut s = self.state.lock().await;
        s.cache.remove(key);
    }

    async fn login_as_leader(&self, key: &AuthKey) -> Result<AuthToken, AuthError> {
        let result = self.login_once(key).await;

        let notify = {
            let mut s = self.state.lock().await;
            let notify = s
                .inflight
                .remove(key)
                .unwrap_or_else(|| Arc::new(Notify::new()));
            match &result {
                Ok(token) => {
                    s.cache.insert(key.clone(), token.clone());
                }
                Err(e) => {
                    s.failed.insert(key.clone(), e.clone());
                }
            }
            notify
        };

        notify.notify_waiters();
        result
    }

    async fn login_once(&self, key: &AuthKey) -> Result<AuthToken, AuthError> {
        let cfg = self
            .config
            .project_env(&key.project, &key.env)
            .and_then(|pe| pe.login.as_ref())
            .ok_or_else(|| AuthError::MissingConfig {
                project: key.project.clone(),
                env: key.env.clone(),
            })?;

        tracing::debug!(project = %key.project, env = %key.env, "acquiring login token");
        let raw = self.login.login(key, cfg).await?;
        Ok(AuthToken::new(raw))
    }
}
