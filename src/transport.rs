use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::config::{BodyEncoding, ClientConfig};
use crate::error::TransportError;

/// The HTTP collaborator used by [`LabelbaseClient`](crate::LabelbaseClient).
///
/// `path` is relative to the API root without leading or trailing slashes,
/// e.g. `labelbase/7/label`. A successful response yields the parsed body,
/// or `None` when the body is empty.
pub trait Transport {
    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, TransportError> {
        (**self).send(method, path, body)
    }
}

/// Blocking reqwest transport carrying `Authorization: Token <api_key>`.
pub struct HttpTransport {
    base_url: String,
    encoding: BodyEncoding,
    http: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut token = HeaderValue::from_str(&format!("Token {}", config.api_key))?;
        token.set_sensitive(true);
        headers.insert(AUTHORIZATION, token);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            encoding: config.encoding,
            http: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for a given endpoint path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}/", self.base_url, path.trim_matches('/'))
    }

    /// Map the response status to an error, or parse a non-empty body.
    fn handle_response(&self, response: Response) -> Result<Option<Value>, TransportError> {
        let status = response.status().as_u16();
        let text = response.text()?;

        if (200..300).contains(&status) {
            if text.trim().is_empty() {
                return Ok(None);
            }
            return serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| TransportError::Decode {
                    message: e.to_string(),
                });
        }

        // Error bodies are best-effort; DRF puts the reason under `detail`.
        let data: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        let msg = data
            .get("detail")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let or_default = |default: &str| {
            if msg.is_empty() {
                default.to_string()
            } else {
                msg.clone()
            }
        };

        match status {
            401 => Err(TransportError::Authentication {
                message: or_default("Unauthenticated"),
            }),
            403 => Err(TransportError::PermissionDenied {
                message: or_default("Permission denied"),
            }),
            404 => Err(TransportError::NotFound {
                message: or_default("Not found"),
            }),
            400 | 422 => Err(TransportError::Validation {
                message: or_default("Invalid request"),
                errors: (!data.is_null()).then_some(data.clone()),
            }),
            _ => Err(TransportError::Api {
                status,
                message: or_default(&format!("HTTP {status}")),
            }),
        }
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, TransportError> {
        let url = self.url(path);
        debug!(%method, %url, "sending labelbase request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = match self.encoding {
                BodyEncoding::Json => request.json(body),
                BodyEncoding::Form => request.form(body),
            };
        }
        let response = request.send()?;
        self.handle_response(response)
    }
}
