//! Command parsing and execution

use calendly::{
    CalendlyClient, CalendlyConfig, EventStatus, ScheduledEventsQuery, WebhookEvent, WebhookScope,
};
use serde::Serialize;
use tracing::info;

use crate::error::{Result, UsageError};

/// Parsed command line
#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Version,
    Whoami,
    Event { uuid: String },
    Events { status: Option<EventStatus>, count: Option<u32> },
    WebhooksList { scope: WebhookScope },
    WebhooksCreate { url: String, events: Vec<WebhookEvent>, scope: WebhookScope },
    WebhooksGet { uuid: String },
    WebhooksDelete { uuid: String },
    AuthUrl { state: Option<String> },
    AuthToken { code: String },
    AuthRefresh { refresh_token: String },
}

impl Command {
    /// Whether the command talks to the REST API with a bearer token
    pub fn needs_token(&self) -> bool {
        !matches!(
            self,
            Self::Help | Self::Version | Self::AuthUrl { .. } | Self::AuthToken { .. } | Self::AuthRefresh { .. }
        )
    }
}

/// Parse arguments (without the program name)
pub fn parse_args(args: &[String]) -> Result<Command> {
    let mut positional = Vec::new();
    let mut scope = None;
    let mut status = None;
    let mut count = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-v" => return Ok(Command::Version),
            "--scope" => {
                let value = iter.next().ok_or_else(|| UsageError::MissingFlagValue(arg.clone()))?;
                scope = Some(parse_scope(value)?);
            }
            "--status" => {
                let value = iter.next().ok_or_else(|| UsageError::MissingFlagValue(arg.clone()))?;
                status = Some(parse_status(value)?);
            }
            "--count" => {
                let value = iter.next().ok_or_else(|| UsageError::MissingFlagValue(arg.clone()))?;
                count = Some(value.parse().map_err(|_| UsageError::InvalidValue {
                    name: "count",
                    value: value.clone(),
                })?);
            }
            _ => positional.push(arg.as_str()),
        }
    }

    let scope = scope.unwrap_or(WebhookScope::User);

    match positional.as_slice() {
        [] => Err(UsageError::MissingCommand),
        ["help"] => Ok(Command::Help),
        ["whoami"] => Ok(Command::Whoami),
        ["event", uuid] => Ok(Command::Event { uuid: uuid.to_string() }),
        ["event"] => Err(UsageError::MissingArgument("uuid")),
        ["events"] => Ok(Command::Events { status, count }),
        ["webhooks", "list"] => Ok(Command::WebhooksList { scope }),
        ["webhooks", "create", url, events] => Ok(Command::WebhooksCreate {
            url: url.to_string(),
            events: parse_events(events)?,
            scope,
        }),
        ["webhooks", "create", _] => Err(UsageError::MissingArgument("events")),
        ["webhooks", "create"] => Err(UsageError::MissingArgument("url")),
        ["webhooks", "get", uuid] => Ok(Command::WebhooksGet { uuid: uuid.to_string() }),
        ["webhooks", "delete", uuid] => Ok(Command::WebhooksDelete { uuid: uuid.to_string() }),
        ["webhooks", "get" | "delete"] => Err(UsageError::MissingArgument("uuid")),
        ["auth", "url"] => Ok(Command::AuthUrl { state: None }),
        ["auth", "url", state] => Ok(Command::AuthUrl { state: Some(state.to_string()) }),
        ["auth", "token", code] => Ok(Command::AuthToken { code: code.to_string() }),
        ["auth", "token"] => Err(UsageError::MissingArgument("code")),
        ["auth", "refresh", token] => Ok(Command::AuthRefresh { refresh_token: token.to_string() }),
        ["auth", "refresh"] => Err(UsageError::MissingArgument("refresh_token")),
        other => Err(UsageError::UnknownCommand(other.join(" "))),
    }
}

fn parse_scope(value: &str) -> Result<WebhookScope> {
    value.parse().map_err(|_| UsageError::InvalidValue {
        name: "scope",
        value: value.to_string(),
    })
}

fn parse_status(value: &str) -> Result<EventStatus> {
    match value {
        "active" => Ok(EventStatus::Active),
        "canceled" => Ok(EventStatus::Canceled),
        other => Err(UsageError::InvalidValue {
            name: "status",
            value: other.to_string(),
        }),
    }
}

fn parse_events(value: &str) -> Result<Vec<WebhookEvent>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| UsageError::InvalidValue {
                name: "event",
                value: s.to_string(),
            })
        })
        .collect()
}

/// Execute `command` against the API
pub async fn run(command: Command, mut config: CalendlyConfig) -> anyhow::Result<()> {
    if !command.needs_token() {
        // OAuth commands must not trigger the current-user lookup
        config.access_token = None;
    } else if config.access_token.is_none() {
        anyhow::bail!("CALENDLY_ACCESS_TOKEN is not set");
    }

    let client = CalendlyClient::new(config).await?;

    match command {
        Command::Help | Command::Version => {}
        Command::Whoami => print_json(&client.get_current_user().await?)?,
        Command::Event { uuid } => print_json(&client.get_scheduled_event(&uuid).await?)?,
        Command::Events { status, count } => {
            let mut query = ScheduledEventsQuery::for_user(cached(client.user_uri(), "user")?);
            query.status = status;
            query.count = count;
            print_json(&client.list_scheduled_events(&query).await?)?;
        }
        Command::WebhooksList { scope } => {
            let organization = cached(client.organization_uri(), "organization")?;
            let webhooks = client.list_webhooks(scope, organization, None).await?;
            info!("{} webhook subscriptions", webhooks.len());
            print_json(&webhooks)?;
        }
        Command::WebhooksCreate { url, events, scope } => {
            let organization = cached(client.organization_uri(), "organization")?;
            let webhook = client
                .create_webhook(&url, &events, organization, None, scope)
                .await?;
            print_json(&webhook)?;
        }
        Command::WebhooksGet { uuid } => print_json(&client.get_webhook(&uuid).await?)?,
        Command::WebhooksDelete { uuid } => {
            client.delete_webhook(&uuid).await?;
            println!("Deleted webhook subscription {}", uuid);
        }
        Command::AuthUrl { state } => println!("{}", client.authorization_url(state.as_deref())?),
        Command::AuthToken { code } => print_json(&client.get_access_token(&code).await?)?,
        Command::AuthRefresh { refresh_token } => {
            print_json(&client.refresh_access_token(&refresh_token).await?)?
        }
    }

    Ok(())
}

fn cached<'a>(value: Option<&'a str>, what: &str) -> anyhow::Result<&'a str> {
    value.ok_or_else(|| anyhow::anyhow!("current {} is not cached", what))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
