//! Business API client
//!
//! Thin layer over the HTTP client that unwraps the `{code, data, msg,
//! total}` envelope. Success returns the payload directly; a non-success
//! code raises [`ApiError::Business`] carrying the server's `msg` and the
//! numeric form of `code`. Aborted calls pass through as the sentinel.

use std::sync::Arc;

use marketops_http::{
    HttpClientTrait, HttpResponse, Method, Outcome, RequestOptions,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::envelope::Envelope;
use crate::error::{ApiError, Result};

/// One page of a listing endpoint
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Envelope-unwrapping client over [`HttpClientTrait`]
#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClientTrait>,
}

impl ApiClient {
    pub fn new(http: Arc<dyn HttpClientTrait>) -> Self {
        Self { http }
    }

    /// GET a business payload
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.call(path, options.with_method(Method::GET)).await
    }

    /// POST a JSON body, returning the business payload
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.call(path, options.with_method(Method::POST).with_json(body))
            .await
    }

    /// PUT a JSON body, returning the business payload
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.call(path, options.with_method(Method::PUT).with_json(body))
            .await
    }

    /// DELETE, returning the business payload
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.call(path, options.with_method(Method::DELETE)).await
    }

    /// PATCH a JSON body, returning the business payload
    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        self.call(path, options.with_method(Method::PATCH).with_json(body))
            .await
    }

    /// GET a listing endpoint, honoring the envelope's `total` field.
    ///
    /// When the envelope carries no `total`, the page length is used.
    pub async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<Page<T>>> {
        let outcome = self
            .call_optional::<Vec<T>>(path, options.with_method(Method::GET))
            .await?;
        Ok(match outcome {
            Outcome::Aborted(info) => Outcome::Aborted(info),
            Outcome::Completed(response) => Outcome::Completed(response.map(|(data, total)| {
                let items = data.unwrap_or_default();
                let total = total.unwrap_or(items.len() as u64);
                Page { items, total }
            })),
        })
    }

    /// Unwrap the envelope, requiring a payload
    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<T>> {
        let outcome = self.call_optional::<T>(path, options).await?;
        Ok(match outcome {
            Outcome::Aborted(info) => Outcome::Aborted(info),
            Outcome::Completed(response) => {
                let HttpResponse {
                    data: (data, _total),
                    status,
                    status_text,
                    headers,
                } = response;
                Outcome::Completed(HttpResponse {
                    data: data.ok_or(ApiError::MissingData)?,
                    status,
                    status_text,
                    headers,
                })
            }
        })
    }

    /// Unwrap the envelope, keeping absent payloads and the `total` field
    async fn call_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Outcome<(Option<T>, Option<u64>)>> {
        match self.http.request_value(path, options).await? {
            Outcome::Aborted(info) => Ok(Outcome::Aborted(info)),
            Outcome::Completed(response) => {
                let HttpResponse {
                    data,
                    status,
                    status_text,
                    headers,
                } = response;

                let envelope: Envelope<T> = serde_json::from_value(data)
                    .map_err(|e| ApiError::Envelope(e.to_string()))?;

                if !envelope.is_success() {
                    let code = envelope.numeric_code();
                    let message = envelope
                        .msg
                        .unwrap_or_else(|| "business request failed".to_string());
                    warn!(path, code, %message, "business failure");
                    return Err(ApiError::Business { code, message });
                }

                Ok(Outcome::Completed(HttpResponse {
                    data: (envelope.data, envelope.total),
                    status,
                    status_text,
                    headers,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use marketops_http::{AbortInfo, HttpError, StatusCode};
    use serde_json::json;

    /// Stub transport answering every request with a canned body
    struct StubHttp {
        body: serde_json::Value,
    }

    #[async_trait]
    impl HttpClientTrait for StubHttp {
        async fn request_value(
            &self,
            _path: &str,
            _options: RequestOptions,
        ) -> marketops_http::Result<Outcome<serde_json::Value>> {
            Ok(Outcome::Completed(HttpResponse {
                data: self.body.clone(),
                status: StatusCode::OK,
                status_text: "OK".to_string(),
                headers: Default::default(),
            }))
        }
    }

    struct AbortingHttp;

    #[async_trait]
    impl HttpClientTrait for AbortingHttp {
        async fn request_value(
            &self,
            _path: &str,
            _options: RequestOptions,
        ) -> marketops_http::Result<Outcome<serde_json::Value>> {
            Ok(Outcome::Aborted(AbortInfo::new("GET_/items#0")))
        }
    }

    fn client(body: serde_json::Value) -> ApiClient {
        ApiClient::new(Arc::new(StubHttp { body }))
    }

    #[tokio::test]
    async fn test_success_returns_data_directly() {
        let api = client(json!({"code": "200", "data": {"foo": 1}, "msg": "ok"}));
        let outcome = api
            .get::<serde_json::Value>("/items", RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(outcome.into_data().unwrap(), json!({"foo": 1}));
    }

    #[tokio::test]
    async fn test_zero_code_is_success() {
        let api = client(json!({"code": "0", "data": [1, 2, 3]}));
        let outcome = api
            .get::<Vec<u32>>("/items", RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(outcome.into_data().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_business_failure_carries_msg_and_code() {
        let api = client(json!({"code": "403", "data": null, "msg": "forbidden"}));
        let error = api
            .get::<serde_json::Value>("/items", RequestOptions::new())
            .await
            .unwrap_err();
        match error {
            ApiError::Business { code, message } => {
                assert_eq!(code, 403);
                assert_eq!(message, "forbidden");
            }
            other => panic!("expected business error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_code_falls_back_to_400() {
        let api = client(json!({"code": "SESSION_EXPIRED", "msg": "expired"}));
        let error = api
            .get::<serde_json::Value>("/me", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Business { code: 400, .. }));
    }

    #[tokio::test]
    async fn test_missing_msg_gets_default_message() {
        let api = client(json!({"code": "500"}));
        let error = api
            .get::<serde_json::Value>("/items", RequestOptions::new())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "business request failed");
    }

    #[tokio::test]
    async fn test_success_without_data_is_missing_data() {
        let api = client(json!({"code": "200", "msg": "ok"}));
        let error = api
            .get::<serde_json::Value>("/items", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::MissingData));
    }

    #[tokio::test]
    async fn test_non_envelope_body_is_rejected() {
        let api = client(json!(["not", "an", "envelope"]));
        let error = api
            .get::<serde_json::Value>("/items", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Envelope(_)));
    }

    #[tokio::test]
    async fn test_abort_sentinel_passes_through() {
        let api = ApiClient::new(Arc::new(AbortingHttp));
        let outcome = api
            .get::<serde_json::Value>("/items", RequestOptions::new())
            .await
            .unwrap();
        assert!(outcome.is_aborted());
    }

    #[tokio::test]
    async fn test_paged_listing() {
        let api = client(json!({"code": "200", "data": [10, 20], "total": 57}));
        let page = api
            .get_paged::<u32>("/items", RequestOptions::new())
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 57);
    }

    #[tokio::test]
    async fn test_paged_listing_without_total() {
        let api = client(json!({"code": "200", "data": [10, 20]}));
        let page = api
            .get_paged::<u32>("/items", RequestOptions::new())
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_http_error_wrapped() {
        struct FailingHttp;

        #[async_trait]
        impl HttpClientTrait for FailingHttp {
            async fn request_value(
                &self,
                _path: &str,
                _options: RequestOptions,
            ) -> marketops_http::Result<Outcome<serde_json::Value>> {
                Err(HttpError::InvalidUrl("bad".to_string()))
            }
        }

        let api = ApiClient::new(Arc::new(FailingHttp));
        let error = api
            .get::<serde_json::Value>("/items", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Http(HttpError::InvalidUrl(_))));
    }
}
