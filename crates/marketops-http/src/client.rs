//! HTTP client implementation
//!
//! One call walks Building → InFlight → settled. Building merges config with
//! per-call options, resolves the URL and serializes the body. InFlight
//! registers a cancellation handle and races the transfer against the
//! handle's token and the effective deadline. A cancelled call settles as
//! the [`Outcome::Aborted`] sentinel rather than an error; a timed-out call
//! surfaces [`HttpError::Timeout`] so it never classifies as a plain abort.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::{HttpConfig, RequestBody, RequestOptions, ResponseKind};
use crate::error::{preview, ErrorContext, HttpError, Result};
use crate::error_log::ErrorLog;
use crate::registry::RequestRegistry;
use crate::response::{AbortInfo, HttpResponse, Outcome, ResponseMeta};
use crate::scope::RequestScope;

/// Mockable seam for layers built on top of the client
#[async_trait]
pub trait HttpClientTrait: Send + Sync {
    /// Execute a request and decode the body as a JSON value
    async fn request_value(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<serde_json::Value>>;
}

/// Abortable, timed HTTP client
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
    registry: Arc<RequestRegistry>,
    errors: Arc<ErrorLog>,
}

pub(crate) enum RawBody {
    Text(String),
    Bytes(Vec<u8>),
}

struct RawResponse {
    status: StatusCode,
    status_text: String,
    headers: HeaderMap,
    body: RawBody,
}

enum Settled {
    Finished(Result<RawResponse>),
    Aborted,
    TimedOut,
}

impl HttpClient {
    /// Create a client with its own registry and error log
    pub fn new(config: HttpConfig) -> Result<Self> {
        Self::with_parts(
            config,
            Arc::new(RequestRegistry::new()),
            Arc::new(ErrorLog::default()),
        )
    }

    /// Create a client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Create a client sharing an existing registry and error log
    pub fn with_parts(
        config: HttpConfig,
        registry: Arc<RequestRegistry>,
        errors: Arc<ErrorLog>,
    ) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .default_headers(header_map(&config.headers)?)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            inner,
            config,
            registry,
            errors,
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    pub fn errors(&self) -> &Arc<ErrorLog> {
        &self.errors
    }

    /// Underlying reqwest client (for advanced usage)
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// A scope that cancels every request of this client when dropped
    pub fn scope(&self) -> RequestScope {
        RequestScope::new(Arc::clone(&self.registry))
    }

    /// Execute a request and decode the body as JSON into `T`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        let options = options.with_response(ResponseKind::Json);
        let (outcome, context) = self.execute(path, options).await?;
        match outcome {
            Outcome::Aborted(info) => Ok(Outcome::Aborted(info)),
            Outcome::Completed(raw) => {
                let text = match raw.data {
                    RawBody::Text(text) => text,
                    RawBody::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                };
                // Best-effort parse regardless of the declared content-type
                let data = match serde_json::from_str::<T>(&text) {
                    Ok(data) => data,
                    Err(_) => {
                        let error = HttpError::Decode {
                            preview: preview(&text),
                        };
                        self.errors.capture(&error, context);
                        if let Some(hook) = &self.config.interceptor {
                            hook.on_error(&error);
                        }
                        return Err(error);
                    }
                };
                Ok(Outcome::Completed(HttpResponse {
                    data,
                    status: raw.status,
                    status_text: raw.status_text,
                    headers: raw.headers,
                }))
            }
        }
    }

    /// Execute a request and return the body as text
    pub async fn request_text(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<String>> {
        let options = options.with_response(ResponseKind::Text);
        let (outcome, _context) = self.execute(path, options).await?;
        Ok(outcome.map_data(|body| match body {
            RawBody::Text(text) => text,
            RawBody::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }))
    }

    /// Execute a request and return the raw body bytes
    pub async fn request_bytes(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<Vec<u8>>> {
        let options = options.with_response(ResponseKind::Bytes);
        let (outcome, _context) = self.execute(path, options).await?;
        Ok(outcome.map_data(|body| match body {
            RawBody::Bytes(bytes) => bytes,
            RawBody::Text(text) => text.into_bytes(),
        }))
    }

    /// GET returning JSON
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.request_json(path, options.with_method(Method::GET)).await
    }

    /// POST with a JSON body
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.request_json(path, options.with_method(Method::POST).with_json(body))
            .await
    }

    /// PUT with a JSON body
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.request_json(path, options.with_method(Method::PUT).with_json(body))
            .await
    }

    /// DELETE returning JSON
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.request_json(path, options.with_method(Method::DELETE)).await
    }

    /// PATCH with a JSON body
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.request_json(path, options.with_method(Method::PATCH).with_json(body))
            .await
    }

    /// POST multipart form data; the transport sets the boundary
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.request_json(
            path,
            options
                .with_method(Method::POST)
                .with_body(RequestBody::Multipart(form)),
        )
        .await
    }

    /// GET returning raw bytes
    pub async fn download(&self, path: &str, options: RequestOptions) -> Result<Outcome<Vec<u8>>> {
        self.request_bytes(path, options.with_method(Method::GET)).await
    }

    /// Core state machine for one call.
    ///
    /// Returns the call's [`ErrorContext`] alongside the outcome so decode
    /// failures after a completed transfer log with the same context.
    async fn execute(
        &self,
        path: &str,
        mut options: RequestOptions,
    ) -> Result<(Outcome<RawBody>, ErrorContext)> {
        if let Some(hook) = &self.config.interceptor {
            hook.before_request(&mut options);
        }

        let method = options.method.clone().unwrap_or(Method::GET);

        let url = match self.build_url(path, &options.query) {
            Ok(url) => url,
            Err(error) => {
                let context = ErrorContext::new()
                    .with_url(path)
                    .with_method(method.as_str());
                self.errors.capture(&error, context);
                if let Some(hook) = &self.config.interceptor {
                    hook.on_error(&error);
                }
                return Err(error);
            }
        };

        let request_id = options
            .request_id
            .take()
            .unwrap_or_else(|| self.registry.next_request_id(method.as_str(), url.as_str()));
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let headers = std::mem::take(&mut options.headers);
        let body = std::mem::take(&mut options.body);
        let kind = options.response;

        debug!(method = %method, url = %url, request_id = %request_id, "HTTP request");

        let handle = self.registry.register(&request_id);
        let token = handle.token().clone();
        let context = ErrorContext::new()
            .with_url(url.as_str())
            .with_method(method.as_str())
            .with_request_id(&request_id);

        let settled = tokio::select! {
            result = self.dispatch(method, url.clone(), headers, body, kind) => {
                Settled::Finished(result)
            }
            _ = token.cancelled() => Settled::Aborted,
            _ = tokio::time::sleep(timeout) => Settled::TimedOut,
        };

        match settled {
            Settled::Aborted => {
                // Handle was already removed by cancel/cancel_all or
                // replaced by a superseding call; deregistering here could
                // drop the newer call's handle.
                let error = HttpError::Aborted("cancellation token triggered".to_string());
                self.errors.capture(&error, context.clone());
                Ok((Outcome::Aborted(AbortInfo::new(request_id)), context))
            }
            Settled::TimedOut => {
                self.registry.deregister(&request_id, handle.generation());
                token.cancel();
                let error = HttpError::Timeout(timeout);
                self.errors
                    .capture(&error, context.with_timeout_flag(true));
                if let Some(hook) = &self.config.interceptor {
                    hook.on_error(&error);
                }
                Err(error)
            }
            Settled::Finished(Ok(raw)) => {
                self.registry.deregister(&request_id, handle.generation());
                if let Some(hook) = &self.config.interceptor {
                    hook.after_response(&ResponseMeta {
                        url: url.to_string(),
                        status: raw.status,
                        status_text: raw.status_text.clone(),
                    });
                }
                Ok((
                    Outcome::Completed(HttpResponse {
                        data: raw.body,
                        status: raw.status,
                        status_text: raw.status_text,
                        headers: raw.headers,
                    }),
                    context,
                ))
            }
            Settled::Finished(Err(error)) => {
                self.registry.deregister(&request_id, handle.generation());
                self.errors.capture(&error, context);
                if let Some(hook) = &self.config.interceptor {
                    hook.on_error(&error);
                }
                Err(error)
            }
        }
    }

    /// Perform the transfer and read the body
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        headers: HashMap<String, String>,
        body: RequestBody,
        kind: ResponseKind,
    ) -> Result<RawResponse> {
        let mut request = self.inner.request(method, url);
        if !headers.is_empty() {
            request = request.headers(header_map(&headers)?);
        }
        request = match body {
            RequestBody::None => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Form(pairs) => request.form(&pairs),
            RequestBody::Multipart(form) => request.multipart(form),
            RequestBody::Text(text) => request.body(text),
            RequestBody::Raw(bytes) => request.body(bytes),
        };

        let response = request.send().await?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let headers = response.headers().clone();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if looks_like_html(&text) {
                return Err(HttpError::HtmlResponse {
                    status,
                    preview: preview(&text),
                });
            }
            return Err(HttpError::Status {
                status,
                preview: preview(&text),
            });
        }

        let body = match kind {
            ResponseKind::Bytes => RawBody::Bytes(response.bytes().await?.to_vec()),
            ResponseKind::Json | ResponseKind::Text => RawBody::Text(response.text().await?),
        };

        Ok(RawResponse {
            status,
            status_text,
            headers,
            body,
        })
    }

    /// Resolve base + path and append percent-encoded query pairs
    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path).map_err(|e| HttpError::InvalidUrl(format!("{path}: {e}")))?
        } else {
            let base = self.config.base_url.as_deref().ok_or_else(|| {
                HttpError::InvalidUrl(format!("relative path {path:?} without a base URL"))
            })?;
            Url::parse(base)
                .and_then(|base| base.join(path))
                .map_err(|e| HttpError::InvalidUrl(format!("{base}{path}: {e}", base = base)))?
        };

        if !query.is_empty() {
            let mut encoded = String::new();
            for (key, value) in query {
                if !encoded.is_empty() {
                    encoded.push('&');
                }
                encoded.push_str(&urlencoding::encode(key));
                encoded.push('=');
                encoded.push_str(&urlencoding::encode(value));
            }
            match url.query() {
                Some(existing) if !existing.is_empty() => {
                    let merged = format!("{existing}&{encoded}");
                    url.set_query(Some(&merged));
                }
                _ => url.set_query(Some(&encoded)),
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn request_value(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<serde_json::Value>> {
        self.request_json(path, options).await
    }
}

/// Case-insensitive sniff for an HTML document at the start of a body
pub(crate) fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim_start();
    let lower: String = trimmed
        .chars()
        .take("<!doctype".len())
        .flat_map(char::to_lowercase)
        .collect();
    lower.starts_with("<!doctype") || lower.starts_with("<html")
}

fn header_map(pairs: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpError::Header(format!("{name}: {e}")))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| HttpError::Header(e.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_with_defaults() {
        assert!(HttpClient::with_defaults().is_ok());
    }

    #[test]
    fn test_build_url_percent_encodes_query() {
        let client = HttpClient::new(
            HttpConfig::default().with_base_url("https://api.marketops.test"),
        )
        .unwrap();

        let url = client
            .build_url(
                "/items",
                &[
                    ("q".to_string(), "a b".to_string()),
                    ("page".to_string(), "2".to_string()),
                ],
            )
            .unwrap();

        assert_eq!(url.as_str(), "https://api.marketops.test/items?q=a%20b&page=2");
    }

    #[test]
    fn test_build_url_absolute_path_ignores_base() {
        let client = HttpClient::new(
            HttpConfig::default().with_base_url("https://api.marketops.test"),
        )
        .unwrap();

        let url = client.build_url("https://other.test/ping", &[]).unwrap();
        assert_eq!(url.as_str(), "https://other.test/ping");
    }

    #[test]
    fn test_build_url_relative_without_base_fails() {
        let client = HttpClient::with_defaults().unwrap();
        let result = client.build_url("/items", &[]);
        assert!(matches!(result, Err(HttpError::InvalidUrl(_))));
    }

    #[test]
    fn test_html_sniffing() {
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
        assert!(looks_like_html("  <!doctype HTML>"));
        assert!(looks_like_html("<HTML lang=\"en\">"));
        assert!(looks_like_html("<html>"));
        assert!(!looks_like_html("{\"code\":\"500\"}"));
        assert!(!looks_like_html("plain text error"));
        assert!(!looks_like_html(""));
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let mut headers = HashMap::new();
        headers.insert("bad header\n".to_string(), "x".to_string());
        assert!(matches!(header_map(&headers), Err(HttpError::Header(_))));
    }
}
