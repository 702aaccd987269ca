//! AMS attendance client CLI.

use ams_client::{
    Config, EntityGateway, HttpGateway, JsonFileStore, NavigationRouter, ScreenController,
    SessionStore,
};
use ams_types::{EntityKind, EntitySchema, Session};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// AMS - institutional attendance client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the remote AMS endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Directory holding persisted client data
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a session locally
    Login {
        /// Display name of the signed-in user
        #[arg(long)]
        name: String,
        /// Role label (student gets the student menu; anything else is staff)
        #[arg(long)]
        role: Option<String>,
        /// Bearer token for the remote endpoint
        #[arg(long)]
        token: Option<String>,
    },
    /// Clear the session and reset navigation
    Logout,
    /// Show the current session
    Whoami,
    /// Show the menu for the current role
    Menu,
    /// List records of one kind
    List { kind: String },
    /// Create a record from Field=Value pairs
    Add { kind: String, fields: Vec<String> },
    /// Edit an existing record with Field=Value pairs
    Edit {
        kind: String,
        id: String,
        fields: Vec<String>,
    },
    /// Delete a record
    Delete {
        kind: String,
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Mark a notification as read
    Read { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging - use RUST_LOG env var or default to info
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::load(cli.base_url, cli.data_dir, None)?;

    let sessions = SessionStore::new(Arc::new(JsonFileStore::new(&config.session_path)));
    let session = sessions.get().await?;
    let gateway = Arc::new(HttpGateway::with_auth(
        config.base_url.clone(),
        session.as_ref().and_then(|s| s.auth_token.clone()),
    ));
    let router = NavigationRouter::new(sessions.clone());

    match cli.command {
        Command::Login { name, role, token } => {
            let mut session = Session::new(name, role);
            session.auth_token = token;
            sessions.set(&session).await?;
            info!("Logged in as {}", session.display_name);
            println!(
                "Signed in. Entry route: {}",
                NavigationRouter::entry_route_for(Some(&session)).name()
            );
        }
        Command::Logout => {
            let stack = router.logout().await?;
            println!("Signed out. Entry route: {}", stack.current().name());
        }
        Command::Whoami => match session {
            Some(session) => println!(
                "{} ({})",
                session.display_name,
                session.role.as_deref().unwrap_or("staff")
            ),
            None => println!("Not signed in."),
        },
        Command::Menu => {
            let menu = router.menu().await?;
            if menu.is_empty() {
                println!("Not signed in; only {} is reachable.", ams_client::Route::GetStarted.name());
            } else {
                for entry in menu {
                    println!("{:<18} -> {}", entry.label, entry.route.name());
                }
            }
        }
        Command::List { kind } => {
            let kind = parse_kind(&kind)?;
            let mut controller = ScreenController::new(kind, gateway);
            controller.load().await?;
            print_records(&controller);
        }
        Command::Add { kind, fields } => {
            let kind = parse_kind(&kind)?;
            let mut controller = ScreenController::new(kind, gateway);
            controller.load().await?;
            controller.open_add()?;
            for (field, value) in parse_fields(&fields)? {
                controller.change_field(&field, &value)?;
            }
            controller.submit().await?;
            println!("Created. {} records now cached.", controller.records().len());
        }
        Command::Edit { kind, id, fields } => {
            let kind = parse_kind(&kind)?;
            let mut controller = ScreenController::new(kind, gateway);
            controller.load().await?;
            controller.open_edit(&id)?;
            for (field, value) in parse_fields(&fields)? {
                controller.change_field(&field, &value)?;
            }
            controller.submit().await?;
            println!("Updated {} {}.", kind, id);
        }
        Command::Delete { kind, id, yes } => {
            let kind = parse_kind(&kind)?;
            let mut controller = ScreenController::new(kind, gateway);
            controller.load().await?;
            controller.request_delete(&id)?;
            if yes {
                controller.confirm_delete().await?;
                println!("Deleted {} {}.", kind, id);
            } else {
                controller.decline_delete()?;
                println!("Refusing to delete {} {} without --yes.", kind, id);
            }
        }
        Command::Read { id } => {
            gateway.mark_notification_read(&id).await?;
            println!("Notification {} marked read.", id);
        }
    }

    Ok(())
}

fn parse_kind(name: &str) -> anyhow::Result<EntityKind> {
    EntityKind::from_name(name)
        .with_context(|| format!("unknown entity kind {name:?} (try e.g. students, classes)"))
}

/// Parse `Field=Value` arguments against no particular schema; unknown
/// fields are passed through and ignored by the service.
fn parse_fields(pairs: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    let mut fields = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Some((field, value)) = pair.split_once('=') else {
            bail!("expected Field=Value, got {pair:?}");
        };
        fields.push((field.trim().to_string(), value.to_string()));
    }
    Ok(fields)
}

fn print_records(controller: &ScreenController<HttpGateway>) {
    let schema: &EntitySchema = controller.schema();
    if controller.records().is_empty() {
        println!("No {} records.", controller.kind());
        return;
    }
    for record in controller.records() {
        let id = record.id(schema.id_field).unwrap_or("-");
        let fields: Vec<String> = schema
            .fields
            .iter()
            .map(|f| format!("{}={}", f, record.get(f)))
            .collect();
        println!("{:>6}  {}", id, fields.join("  "));
    }
}
