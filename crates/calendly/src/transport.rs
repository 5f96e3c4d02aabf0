//! HTTP transport
//!
//! The client builds an [`ApiRequest`], resolves it into a
//! [`PreparedRequest`] (absolute URL plus the merged header set) and hands it
//! to a [`Transport`]. [`ReqwestTransport`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::{CalendlyError, Result};

/// Which Calendly host a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// REST resources (`api.calendly.com`)
    Api,
    /// OAuth endpoints (`auth.calendly.com`)
    Auth,
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(JsonValue),
    Form(Vec<(String, String)>),
}

/// A request relative to one of the Calendly hosts.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub host: Host,
    pub path: String,
    /// Appended to `path` one escaped segment each
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Per-call headers, applied last
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            host: Host::Api,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn on_auth_host(mut self) -> Self {
        self.host = Host::Auth;
        self
    }

    /// Append a caller supplied identifier as a single path segment
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Serialize `body` as the JSON payload
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Form-encoded payload; also switches the content type
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A fully resolved request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Status, content type and raw body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: &JsonValue) -> Self {
        Self::new(status, Some("application/json"), body.to_string())
    }

    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, None, String::new())
    }
}

/// Sends prepared requests
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CalendlyError::Http)?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                builder.body(encoded)
            }
        };

        let response = builder.send().await.map_err(CalendlyError::Http)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(CalendlyError::Http)?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prepared(server: &MockServer, method: Method, path: &str, body: RequestBody) -> PreparedRequest {
        PreparedRequest {
            method,
            url: Url::parse(&format!("{}/{}", server.uri(), path)).unwrap(),
            headers: HeaderMap::new(),
            body,
        }
    }

    #[test]
    fn test_api_request_builder() {
        let request = ApiRequest::get("webhook_subscriptions")
            .query([("scope", "user"), ("organization", "org")])
            .header(AUTHORIZATION, HeaderValue::from_static("Bearer x"));

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.host, Host::Api);
        assert_eq!(request.query.len(), 2);
        assert_eq!(request.query[0], ("scope".to_string(), "user".to_string()));
        assert_eq!(request.body, RequestBody::Empty);
        assert!(request.headers.contains_key(AUTHORIZATION));
        assert!(request.segments.is_empty());

        let request = ApiRequest::delete("webhook_subscriptions").segment("HOOK1");
        assert_eq!(request.path, "webhook_subscriptions");
        assert_eq!(request.segments, vec!["HOOK1".to_string()]);
    }

    #[test]
    fn test_form_sets_content_type() {
        let request = ApiRequest::post("oauth/token")
            .on_auth_host()
            .form([("grant_type", "authorization_code")]);

        assert_eq!(request.host, Host::Auth);
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            request.body,
            RequestBody::Form(vec![("grant_type".to_string(), "authorization_code".to_string())])
        );
    }

    #[tokio::test]
    async fn test_reqwest_transport_json_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook_subscriptions"))
            .and(body_json(json!({"url": "https://example.com/hook"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_raw(r#"{"resource":{}}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .send(prepared(
                &server,
                Method::POST,
                "webhook_subscriptions",
                RequestBody::Json(json!({"url": "https://example.com/hook"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(response.body, r#"{"resource":{}}"#);
    }

    #[tokio::test]
    async fn test_reqwest_transport_form_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(query_param("client_id", "id"))
            .and(body_string("grant_type=authorization_code&code=a+b"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = prepared(
            &server,
            Method::POST,
            "oauth/token?client_id=id",
            RequestBody::Form(vec![
                ("grant_type".to_string(), "authorization_code".to_string()),
                ("code".to_string(), "a b".to_string()),
            ]),
        );
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport.send(request).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reqwest_transport_forwards_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = prepared(&server, Method::GET, "users/me", RequestBody::Empty);
        request
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));

        let client = Client::builder().timeout(Duration::from_secs(5)).build().unwrap();
        let transport = ReqwestTransport::from_client(client);
        let response = transport.send(request).await.unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
    }
}
