//! Data models for the Calendly REST API

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{CalendlyError, Result};

/// Last `/`-segment of a resource URI.
pub fn uuid_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Single-resource envelope: `{"resource": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource<T> {
    pub resource: T,
}

/// Collection envelope: `{"collection": [...], "pagination": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection<T> {
    pub collection: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Pagination block of a collection response (first page only is followed)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub previous_page: Option<String>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub previous_page_token: Option<String>,
}

/// The authenticated user (`GET users/me`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentUser {
    pub uri: String,
    pub current_organization: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub scheduling_url: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CurrentUser {
    pub fn uuid(&self) -> &str {
        uuid_from_uri(&self.uri)
    }

    pub fn organization_uuid(&self) -> &str {
        uuid_from_uri(&self.current_organization)
    }
}

/// User and organization identifiers cached after the first `set_token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedIdentity {
    pub user_uri: String,
    pub user_uuid: String,
    pub organization_uri: String,
    pub organization_uuid: String,
}

impl From<&CurrentUser> for CachedIdentity {
    fn from(user: &CurrentUser) -> Self {
        Self {
            user_uri: user.uri.clone(),
            user_uuid: user.uuid().to_string(),
            organization_uri: user.current_organization.clone(),
            organization_uuid: user.organization_uuid().to_string(),
        }
    }
}

/// Scheduled event status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Canceled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
        }
    }
}

/// A scheduled event.
///
/// Only the commonly used fields are typed; everything else the API sends is
/// kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledEvent {
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub location: Option<JsonValue>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ScheduledEvent {
    pub fn uuid(&self) -> &str {
        uuid_from_uri(&self.uri)
    }
}

/// Query for `GET scheduled_events`
#[derive(Debug, Clone, Default)]
pub struct ScheduledEventsQuery {
    pub user: Option<String>,
    pub organization: Option<String>,
    pub status: Option<EventStatus>,
    pub count: Option<u32>,
}

impl ScheduledEventsQuery {
    pub fn for_user(user_uri: impl Into<String>) -> Self {
        Self {
            user: Some(user_uri.into()),
            ..Default::default()
        }
    }

    pub fn for_organization(organization_uri: impl Into<String>) -> Self {
        Self {
            organization: Some(organization_uri.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub(crate) fn to_query(&self) -> Result<Vec<(String, String)>> {
        if self.user.is_none() && self.organization.is_none() {
            return Err(CalendlyError::MissingParameter("user or organization"));
        }

        let mut query = Vec::new();
        if let Some(ref user) = self.user {
            query.push(("user".to_string(), user.clone()));
        }
        if let Some(ref organization) = self.organization {
            query.push(("organization".to_string(), organization.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(count) = self.count {
            query.push(("count".to_string(), count.to_string()));
        }
        Ok(query)
    }
}

/// Webhook subscription breadth
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WebhookScope {
    User,
    Organization,
}

impl WebhookScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for WebhookScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookScope {
    type Err = CalendlyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "organization" => Ok(Self::Organization),
            other => Err(CalendlyError::Config(format!("unknown webhook scope: {}", other))),
        }
    }
}

/// Events a webhook subscription can listen to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WebhookEvent {
    #[serde(rename = "invitee.created")]
    InviteeCreated,
    #[serde(rename = "invitee.canceled")]
    InviteeCanceled,
    #[serde(rename = "invitee_no_show.created")]
    InviteeNoShowCreated,
    #[serde(rename = "invitee_no_show.deleted")]
    InviteeNoShowDeleted,
    #[serde(rename = "routing_form_submission.created")]
    RoutingFormSubmissionCreated,
}

impl WebhookEvent {
    pub const ALL: [WebhookEvent; 5] = [
        Self::InviteeCreated,
        Self::InviteeCanceled,
        Self::InviteeNoShowCreated,
        Self::InviteeNoShowDeleted,
        Self::RoutingFormSubmissionCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InviteeCreated => "invitee.created",
            Self::InviteeCanceled => "invitee.canceled",
            Self::InviteeNoShowCreated => "invitee_no_show.created",
            Self::InviteeNoShowDeleted => "invitee_no_show.deleted",
            Self::RoutingFormSubmissionCreated => "routing_form_submission.created",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = CalendlyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| CalendlyError::Config(format!("unknown webhook event: {}", s)))
    }
}

/// Body of `POST webhook_subscriptions`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewWebhookSubscription {
    pub url: String,
    pub events: Vec<WebhookEvent>,
    pub organization: String,
    pub user: Option<String>,
    pub scope: WebhookScope,
}

/// A webhook subscription.
///
/// `events` and `scope` hold whatever the server sent, so names this crate
/// does not know yet still decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookSubscription {
    pub uri: String,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retry_started_at: Option<DateTime<Utc>>,
}

impl WebhookSubscription {
    pub fn uuid(&self) -> &str {
        uuid_from_uri(&self.uri)
    }

    /// Typed scope, `None` for scopes outside [`WebhookScope`]
    pub fn scope_kind(&self) -> Option<WebhookScope> {
        self.scope.parse().ok()
    }

    /// Events this crate knows about; unknown names are skipped
    pub fn known_events(&self) -> Vec<WebhookEvent> {
        self.events.iter().filter_map(|e| e.parse().ok()).collect()
    }
}

/// OAuth token endpoint payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}
