use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use scenic_core::types::AnyValue;

use crate::request::scalar_string;

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error("timeout")]
    Timeout,
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("http error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub data: Option<AnyValue>,
    pub params: Vec<(String, String)>,
    /// Multipart uploads: field name -> file path.
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ResponseParts {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl ResponseParts {
    /// Parsed JSON body; non-JSON bodies surface as a JSON string so
    /// assertions and references still have something to address.
    pub fn body_json(&self) -> AnyValue {
        let text = String::from_utf8_lossy(&self.body);
        serde_json::from_str(&text).unwrap_or_else(|_| AnyValue::String(text.into_owned()))
    }
}

#[async_trait]
pub trait RequestClient: Send + Sync {
    async fn send(&self, req: RequestParts, timeout: Duration) -> Result<ResponseParts, HttpError>;
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl Default for ReqwestClient {
    fn default() -> Self {
        // Client creation should never fail in practice; if it does we
        // cannot do anything useful without an HTTP stack.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("scenic-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                panic!("failed to create reqwest HTTP client: {e}. This is a bug - please report it.");
            });
        Self { client }
    }
}

#[async_trait]
impl RequestClient for ReqwestClient {
    async fn send(&self, req: RequestParts, timeout: Duration) -> Result<ResponseParts, HttpError> {
        let method: reqwest::Method = req
            .method
            .to_uppercase()
            .parse()
            .map_err(|_| HttpError::UnsupportedMethod(req.method.clone()))?;
        let is_get = method == reqwest::Method::GET;

        let mut rb = self.client.request(method, &req.url).timeout(timeout);
        for (k, v) in &req.headers {
            rb = rb.header(k, v);
        }

        if !req.params.is_empty() {
            rb = rb.query(&req.params);
        } else if is_get {
            // GET carries `data` as query parameters when no explicit
            // params were declared.
            if let Some(AnyValue::Object(map)) = &req.data {
                let pairs: Vec<(String, String)> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), scalar_string(v)))
                    .collect();
                rb = rb.query(&pairs);
            }
        }

        if !is_get {
            if !req.files.is_empty() {
                let mut form = reqwest::multipart::Form::new();
                for (name, path) in &req.files {
                    let bytes = tokio::fs::read(path)
                        .await
                        .map_err(|e| HttpError::Other(format!("cannot read {path}: {e}")))?;
                    let file_name = std::path::Path::new(path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    form = form.part(name.clone(), reqwest::multipart::Part::bytes(bytes).file_name(file_name));
                }
                rb = rb.multipart(form);
            } else if let Some(data) = &req.data {
                if is_form_urlencoded(&req.headers) {
                    if let AnyValue::Object(map) = data {
                        let pairs: Vec<(String, String)> = map
                            .iter()
                            .map(|(k, v)| (k.clone(), scalar_string(v)))
                            .collect();
                        rb = rb.form(&pairs);
                    }
                } else {
                    rb = rb.json(data);
                }
            }
        }

        tracing::debug!(method = %req.method, url = %req.url, "sending request");
        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        let mut headers = BTreeMap::new();
        for (k, v) in resp.headers().iter() {
            if let Ok(s) = v.to_str() {
                headers.insert(k.to_string(), s.to_string());
            }
        }

        let body = resp.bytes().await.map_err(map_reqwest_error)?.to_vec();
        Ok(ResponseParts {
            status,
            headers,
            body,
        })
    }
}

fn is_form_urlencoded(headers: &BTreeMap<String, String>) -> bool {
    headers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("content-type") && v.contains("application/x-www-form-urlencoded"))
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        return HttpError::Timeout;
    }
    if e.is_connect() || e.is_request() {
        return HttpError::Network(e.to_string());
    }
    HttpError::Other(e.to_string())
}
