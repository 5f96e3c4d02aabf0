//! calendly: command line client for the Calendly API
//!
//! Usage:
//!   calendly whoami
//!   calendly webhooks list [--scope user|organization]
//!   calendly auth url [state]
//!   calendly --help

mod cli;
mod error;

use calendly::CalendlyConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(2);
        }
    };

    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("calendly {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let config = CalendlyConfig::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::debug!("Calendly API: {}", config.api_base_url);

    cli::run(command, config).await
}

/// Print help message
fn print_help() {
    println!("calendly - Calendly API client");
    println!();
    println!("Usage:");
    println!("  calendly whoami                                Show the authenticated user");
    println!("  calendly event <uuid>                          Show a scheduled event");
    println!("  calendly events [--status S] [--count N]       List your scheduled events (first page)");
    println!("  calendly webhooks list [--scope SCOPE]         List webhook subscriptions");
    println!("  calendly webhooks create <url> <event,...> [--scope SCOPE]");
    println!("  calendly webhooks get <uuid>                   Show a webhook subscription");
    println!("  calendly webhooks delete <uuid>                Delete a webhook subscription");
    println!("  calendly auth url [state]                      Print the OAuth consent URL");
    println!("  calendly auth token <code>                     Exchange an authorization code");
    println!("  calendly auth refresh <refresh_token>          Refresh an access token");
    println!("  calendly --help | --version");
    println!();
    println!("SCOPE is user (default) or organization.");
    println!();
    println!("Environment Variables (or calendly.toml):");
    println!("  CALENDLY_ACCESS_TOKEN    Personal access or OAuth token");
    println!("  CALENDLY_CLIENT_ID       OAuth client id");
    println!("  CALENDLY_CLIENT_SECRET   OAuth client secret");
    println!("  CALENDLY_REDIRECT_URI    OAuth redirect URI");
    println!("  CALENDLY_API_BASE_URL    API host (default: https://api.calendly.com/)");
    println!("  CALENDLY_AUTH_BASE_URL   OAuth host (default: https://auth.calendly.com/)");
    println!("  CALENDLY_TIMEOUT_SECS    Request timeout (default: 30)");
    println!("  RUST_LOG                 Log filter (default: info)");
}
