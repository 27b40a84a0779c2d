//! site-admin: command-line access to the site API.
//!
//! Reads `.env`, then `API_BASE_URL`, `API_TIMEOUT_SECS` and `SESSION_FILE`.
//! The session (token and visitor id) is kept in a JSON file so `login`
//! carries over to later invocations.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use site_core::types::{Analytics, ContactMessage, ContactSubmission};
use site_core::{ApiError, ClientConfig, SiteClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "site-admin")]
#[command(about = "Manage the agency site content from the terminal")]
struct Cli {
    /// API base URL, including the `/api` suffix [env: API_BASE_URL]
    #[arg(long)]
    api_base_url: Option<String>,

    /// Overall request timeout in seconds, 0 for none [env: API_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Session file, defaults to the user data directory [env: SESSION_FILE]
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the token in the session file
    Login {
        #[arg(long, env = "ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Show whether a token is stored and the visitor id
    Status,
    /// Print a public resource as JSON
    Get {
        #[arg(value_enum)]
        resource: Resource,
    },
    /// List contact messages, newest first
    Contacts,
    /// Number of unread contact messages
    Unread,
    /// Mark a contact message as read
    Read { id: String },
    /// Reply to a contact message
    Reply { id: String, message: String },
    /// Delete a contact message
    DeleteContact { id: String },
    /// Send a message through the public contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        message: String,
    },
    /// Record a page view for this machine's visitor id
    Track { path: Option<String> },
    /// Dashboard summary
    Analytics {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Resolve a stored asset path to a full URL
    Asset { path: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Resource {
    About,
    Values,
    Testimonials,
    ServiceCards,
    ServiceDetails,
    Clients,
    Hero,
    Settings,
}

impl Cli {
    /// Flags override the environment read by `ClientConfig::from_env`.
    fn client_config(&self, env: ClientConfig) -> ClientConfig {
        let mut config = match &self.api_base_url {
            Some(url) => ClientConfig {
                api_base_url: ClientConfig::new(url).api_base_url,
                ..env
            },
            None => env,
        };
        match self.timeout_secs {
            Some(0) => config.timeout = None,
            Some(secs) => config = config.with_timeout(Duration::from_secs(secs)),
            None => {}
        }
        if let Some(path) = &self.session_file {
            config.session_file = Some(path.clone());
        }
        if config.session_file.is_none() {
            config.session_file = Some(default_session_path());
        }
        config
    }
}

fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("site-admin")
        .join("session.json")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_analytics(analytics: &Analytics) {
    let t = &analytics.totals;
    println!(
        "clients: {}  testimonials: {}  service cards: {}  service details: {}",
        t.clients, t.testimonials, t.service_cards, t.service_details
    );
    println!("total views: {}", analytics.total_views());
    if let Some(stats) = &analytics.visitor_stats {
        println!("unique visitors: {}", stats.unique_visitors);
    }
    for point in &analytics.traffic {
        println!("{}  {}", point.date, point.count);
    }
}

/// Timestamps are RFC 3339 in UTC, so text order is time order. Undated
/// messages go last.
fn sort_newest_first(contacts: &mut [ContactMessage]) {
    contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

async fn get_resource(client: &SiteClient, resource: Resource) -> anyhow::Result<()> {
    match resource {
        Resource::About => print_json(&client.get_about_us().await?),
        Resource::Values => print_json(&client.get_values().await?),
        Resource::Testimonials => print_json(&client.get_testimonials().await?),
        Resource::ServiceCards => print_json(&client.get_service_cards().await?),
        Resource::ServiceDetails => print_json(&client.get_service_details().await?),
        Resource::Clients => print_json(&client.get_clients().await?),
        Resource::Hero => print_json(&client.get_hero().await?),
        Resource::Settings => print_json(&client.get_settings().await?),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.client_config(ClientConfig::from_env());
    let client = SiteClient::new(&config)?;
    if client.session().is_degraded() {
        tracing::warn!(path = ?config.session_file, "session file unusable, login will not persist");
    }

    match cli.command {
        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            println!("logged in as {email}");
        }
        Command::Logout => {
            client.logout();
            println!("logged out");
        }
        Command::Status => {
            let session = client.session().snapshot();
            println!("api: {}", client.base_url());
            println!("logged in: {}", if session.token.is_some() { "yes" } else { "no" });
            println!("visitor id: {}", session.visitor_id.as_deref().unwrap_or("(none)"));
        }
        Command::Get { resource } => get_resource(&client, resource).await?,
        Command::Contacts => {
            let mut contacts = client.get_contacts().await?;
            sort_newest_first(&mut contacts);
            print_json(&contacts)?;
        }
        Command::Unread => println!("{}", client.get_unread_count().await?),
        Command::Read { id } => print_json(&client.mark_contact_as_read(&id).await?)?,
        Command::Reply { id, message } => print_json(&client.reply_contact(&id, &message).await?)?,
        Command::DeleteContact { id } => {
            client.delete_contact(&id).await?;
            println!("deleted {id}");
        }
        Command::Contact {
            name,
            email,
            phone,
            subject,
            message,
        } => {
            let submission = ContactSubmission {
                name,
                email,
                phone,
                subject,
                message,
            };
            print_json(&client.submit_contact(&submission).await?)?;
        }
        Command::Track { path } => print_json(&client.track_visit(path.as_deref()).await?)?,
        Command::Analytics { days } => print_analytics(&client.get_analytics(days).await?),
        Command::Asset { path } => match client.asset_url(Some(&path)) {
            Some(url) => println!("{url}"),
            None => println!("(none)"),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthenticated)) => {
            Err(e).context("run `site-admin login` first")
        }
        other => other,
    }
}
