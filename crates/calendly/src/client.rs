//! Calendly REST API client

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CalendlyConfig;
use crate::error::{CalendlyError, ResponseBody, Result};
use crate::models::{
    CachedIdentity, Collection, CurrentUser, NewWebhookSubscription, Resource, ScheduledEvent,
    ScheduledEventsQuery, TokenResponse, WebhookEvent, WebhookScope, WebhookSubscription,
};
use crate::transport::{ApiRequest, Host, PreparedRequest, RawResponse, ReqwestTransport, Transport};

const AUTHORIZE_ENDPOINT: &str = "oauth/authorize";
const TOKEN_ENDPOINT: &str = "oauth/token";

/// Calendly API client
#[derive(Clone)]
pub struct CalendlyClient {
    transport: Arc<dyn Transport>,
    config: CalendlyConfig,
    api_base: Url,
    auth_base: Url,
    access_token: Option<String>,
    identity: Option<CachedIdentity>,
}

impl CalendlyClient {
    /// Create a client backed by reqwest.
    ///
    /// When the config carries an access token it is installed with
    /// [`set_token`](Self::set_token), which fetches the current user.
    pub async fn new(config: CalendlyConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Create a client over a custom transport
    pub async fn with_transport(config: CalendlyConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let mut client = Self {
            transport,
            api_base: parse_base_url(&config.api_base_url)?,
            auth_base: parse_base_url(&config.auth_base_url)?,
            access_token: None,
            identity: None,
            config,
        };

        if let Some(token) = client.config.access_token.clone() {
            client.set_token(token).await?;
        }

        info!("Calendly client initialized for: {}", client.api_base);
        Ok(client)
    }

    // ------------------------------------------------------------------------
    // OAuth
    // ------------------------------------------------------------------------

    /// OAuth consent URL the user should be redirected to.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String> {
        let client_id = require(&self.config.client_id, "client_id")?;
        let redirect_uri = require(&self.config.redirect_uri, "redirect_uri")?;

        let mut url = self.auth_base.join(AUTHORIZE_ENDPOINT)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code");
            if let Some(state) = state.filter(|s| !s.is_empty()) {
                pairs.append_pair("state", state);
            }
        }

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens
    pub async fn get_access_token(&self, code: &str) -> Result<TokenResponse> {
        let redirect_uri = require(&self.config.redirect_uri, "redirect_uri")?;

        let form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        self.token_request(form).await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// `redirect_uri` is added to the form when configured; Calendly accepts
    /// and ignores it on refresh.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let mut form = vec![("grant_type", "refresh_token"), ("refresh_token", refresh_token)];
        if let Some(ref redirect_uri) = self.config.redirect_uri {
            form.push(("redirect_uri", redirect_uri.as_str()));
        }
        self.token_request(form).await
    }

    async fn token_request(&self, form: Vec<(&str, &str)>) -> Result<TokenResponse> {
        let client_id = require(&self.config.client_id, "client_id")?;
        let client_secret = require(&self.config.client_secret, "client_secret")?;

        let request = ApiRequest::post(TOKEN_ENDPOINT)
            .on_auth_host()
            .query([("client_id", client_id), ("client_secret", client_secret)])
            .form(form);

        let token = expect_body(self.send(request).await?)?;
        info!("Obtained Calendly OAuth token");
        Ok(token)
    }

    /// Install the bearer token.
    ///
    /// The first successful call fetches the current user and caches its
    /// identity; later calls only replace the token.
    pub async fn set_token(&mut self, access_token: impl Into<String>) -> Result<()> {
        self.access_token = Some(access_token.into());

        if self.identity.is_none() {
            let user = self.get_current_user().await?.resource;
            let identity = CachedIdentity::from(&user);
            info!(
                "Cached Calendly identity: user={} organization={}",
                identity.user_uuid, identity.organization_uuid
            );
            self.identity = Some(identity);
        }

        Ok(())
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn identity(&self) -> Option<&CachedIdentity> {
        self.identity.as_ref()
    }

    pub fn user_uri(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.user_uri.as_str())
    }

    pub fn user_uuid(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.user_uuid.as_str())
    }

    pub fn organization_uri(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.organization_uri.as_str())
    }

    pub fn organization_uuid(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.organization_uuid.as_str())
    }

    // ------------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------------

    pub async fn get_current_user(&self) -> Result<Resource<CurrentUser>> {
        expect_body(self.get("users/me", None).await?)
    }

    pub async fn get_scheduled_event(&self, event_uuid: &str) -> Result<Resource<ScheduledEvent>> {
        expect_body(self.send(ApiRequest::get("scheduled_events").segment(event_uuid)).await?)
    }

    /// First page of scheduled events
    pub async fn list_scheduled_events(&self, query: &ScheduledEventsQuery) -> Result<Collection<ScheduledEvent>> {
        let query = query.to_query()?;
        let events: Collection<ScheduledEvent> = expect_body(self.get("scheduled_events", Some(query)).await?)?;

        debug!("Fetched {} scheduled events", events.collection.len());
        Ok(events)
    }

    /// Subscribe `url` to `events`.
    ///
    /// A user-scoped subscription without `user_uri` falls back to the cached
    /// user.
    pub async fn create_webhook(
        &self,
        url: &str,
        events: &[WebhookEvent],
        organization_uri: &str,
        user_uri: Option<&str>,
        scope: WebhookScope,
    ) -> Result<WebhookSubscription> {
        let user = match scope {
            WebhookScope::User => Some(self.scoped_user(user_uri)?.to_string()),
            WebhookScope::Organization => user_uri.map(str::to_string),
        };

        let body = NewWebhookSubscription {
            url: url.to_string(),
            events: events.to_vec(),
            organization: organization_uri.to_string(),
            user,
            scope,
        };

        let created: Resource<WebhookSubscription> =
            expect_body(self.post("webhook_subscriptions", &body).await?)?;

        info!("Created webhook subscription: {}", created.resource.uuid());
        Ok(created.resource)
    }

    /// Webhook subscriptions visible for `scope` (first page).
    pub async fn list_webhooks(
        &self,
        scope: WebhookScope,
        organization_uri: &str,
        user_uri: Option<&str>,
    ) -> Result<Vec<WebhookSubscription>> {
        let mut query = vec![
            ("scope".to_string(), scope.as_str().to_string()),
            ("organization".to_string(), organization_uri.to_string()),
        ];
        if scope == WebhookScope::User {
            query.push(("user".to_string(), self.scoped_user(user_uri)?.to_string()));
        }

        let webhooks: Collection<WebhookSubscription> =
            expect_body(self.get("webhook_subscriptions", Some(query)).await?)?;

        debug!("Fetched {} webhook subscriptions", webhooks.collection.len());
        Ok(webhooks.collection)
    }

    pub async fn get_webhook(&self, webhook_uuid: &str) -> Result<WebhookSubscription> {
        let request = ApiRequest::get("webhook_subscriptions").segment(webhook_uuid);
        let webhook: Resource<WebhookSubscription> = expect_body(self.send(request).await?)?;
        Ok(webhook.resource)
    }

    pub async fn delete_webhook(&self, webhook_uuid: &str) -> Result<()> {
        let request = ApiRequest::delete("webhook_subscriptions").segment(webhook_uuid);
        self.send::<JsonValue>(request).await?;

        info!("Deleted webhook subscription: {}", webhook_uuid);
        Ok(())
    }

    fn scoped_user<'a>(&'a self, user_uri: Option<&'a str>) -> Result<&'a str> {
        user_uri
            .or_else(|| self.user_uri())
            .ok_or(CalendlyError::MissingParameter("user"))
    }

    // ------------------------------------------------------------------------
    // Generic request path
    // ------------------------------------------------------------------------

    /// GET `path` on the API host. `Ok(None)` means an empty success.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<Vec<(String, String)>>,
    ) -> Result<Option<T>> {
        let request = ApiRequest::get(path).query(query.unwrap_or_default());
        self.send(request).await
    }

    /// POST a JSON body to `path` on the API host
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>> {
        let request = ApiRequest::post(path).json(body)?;
        self.send(request).await
    }

    /// Issue `request` and parse the response
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Option<T>> {
        let response = self.request(request).await?;
        parse(response)
    }

    /// Resolve and issue `request`, returning the raw response
    pub async fn request(&self, request: ApiRequest) -> Result<RawResponse> {
        let prepared = self.prepare(request)?;
        self.transport.send(prepared).await
    }

    fn prepare(&self, request: ApiRequest) -> Result<PreparedRequest> {
        let base = match request.host {
            Host::Api => &self.api_base,
            Host::Auth => &self.auth_base,
        };

        let mut url = base.join(&request.path)?;
        if !request.segments.is_empty() {
            if let Some(bad) = request
                .segments
                .iter()
                .find(|s| matches!(s.as_str(), "" | "." | ".."))
            {
                return Err(CalendlyError::InvalidPathSegment(bad.clone()));
            }
            // extend() percent-encodes '/', '?' and '#' inside each segment
            url.path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
                .pop_if_empty()
                .extend(request.segments.iter());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        // query strings may carry the client secret
        debug!(
            "Calendly request: {} {}{}",
            request.method,
            url.origin().ascii_serialization(),
            url.path()
        );

        Ok(PreparedRequest {
            method: request.method,
            url,
            headers: self.headers(&request.headers)?,
            body: request.body,
        })
    }

    /// Defaults, then the bearer token, then per-call overrides.
    fn headers(&self, overrides: &HeaderMap) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(ref token) = self.access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| CalendlyError::Config("access token is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in overrides {
            headers.insert(name.clone(), value.clone());
        }

        Ok(headers)
    }
}

/// Map a raw response onto the typed result.
///
/// 204 and empty 2xx bodies yield `None`; 400/401/406 map to their named
/// errors, 5xx to [`CalendlyError::Server`], anything else non-2xx to
/// [`CalendlyError::UnexpectedStatus`].
pub fn parse<T: DeserializeOwned>(response: RawResponse) -> Result<Option<T>> {
    let status = response.status;

    if status.is_success() {
        if status == StatusCode::NO_CONTENT || response.body.trim().is_empty() {
            return Ok(None);
        }

        return serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| CalendlyError::Decode {
                message: e.to_string(),
                body: ResponseBody::parse(response.content_type.as_deref(), &response.body),
            });
    }

    let body = ResponseBody::parse(response.content_type.as_deref(), &response.body);
    warn!("Calendly request failed: {} - {}", status, body);
    Err(CalendlyError::from_status(status, body))
}

fn expect_body<T>(value: Option<T>) -> Result<T> {
    value.ok_or_else(|| CalendlyError::Decode {
        message: "expected a response body".to_string(),
        body: ResponseBody::Text(String::new()),
    })
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(CalendlyError::MissingCredential(name))
}

/// Base URLs always end in `/` so that joins keep any path prefix.
fn parse_base_url(base: &str) -> Result<Url> {
    if base.ends_with('/') {
        Ok(Url::parse(base)?)
    } else {
        Ok(Url::parse(&format!("{}/", base))?)
    }
}
