//! calendly: Calendly REST API client
//!
//! Thin async wrapper over the Calendly REST and OAuth endpoints.
//!
//! ## Features
//!
//! - OAuth authorization URL, code exchange and token refresh
//! - Current user lookup with a one-time identity cache
//! - Scheduled event retrieval
//! - Webhook subscription create/list/get/delete
//!
//! ## Usage
//!
//! ```rust,ignore
//! use calendly::{CalendlyClient, CalendlyConfig, WebhookEvent, WebhookScope};
//!
//! let config = CalendlyConfig::new("personal-access-token");
//! let client = CalendlyClient::new(config).await?;
//!
//! let organization = client.organization_uri().unwrap_or_default().to_string();
//! let webhook = client
//!     .create_webhook(
//!         "https://example.com/calendly",
//!         &[WebhookEvent::InviteeCreated, WebhookEvent::InviteeCanceled],
//!         &organization,
//!         None,
//!         WebhookScope::User,
//!     )
//!     .await?;
//!
//! for hook in client.list_webhooks(WebhookScope::User, &organization, None).await? {
//!     println!("{} -> {:?}", hook.uuid(), hook.callback_url);
//! }
//!
//! client.delete_webhook(webhook.uuid()).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod transport;

pub use client::CalendlyClient;
pub use config::CalendlyConfig;
pub use error::{CalendlyError, ResponseBody, Result};
pub use models::{
    CachedIdentity, Collection, CurrentUser, EventStatus, Resource, ScheduledEvent,
    ScheduledEventsQuery, TokenResponse, WebhookEvent, WebhookScope, WebhookSubscription,
};
pub use transport::{ApiRequest, RawResponse, ReqwestTransport, Transport};

/// Re-export the most used types
pub mod prelude {
    pub use super::{CalendlyClient, CalendlyConfig, CalendlyError, WebhookEvent, WebhookScope};
}
