//! booknook server entry point.

use booknook::{
    auth::AuthService,
    config::{Cli, Command, Config, UserCommand},
    server,
    store::{Store, timestamp_to_datetime},
};
use clap::Parser;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    match cli.command {
        Some(Command::Init { force }) => cmd_init(force),
        Some(Command::User { action }) => cmd_user(action, &config),
        Some(Command::Serve { bind }) => cmd_serve(config, bind).await,
        None => cmd_serve(config, None).await,
    }
}

/// Initialize config and database.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let _store = Store::open(&config.database.path)?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nEdit config.toml to configure your server.");
    println!("Then run: booknook user add admin@example.com --name Admin --role admin");

    Ok(())
}

/// User management commands.
fn cmd_user(action: UserCommand, config: &Config) -> anyhow::Result<()> {
    let store = Store::open(&config.database.path)?;
    let auth = AuthService::new(
        store.clone(),
        config.auth.session_days,
        config.auth.registration_enabled(),
    );

    match action {
        UserCommand::Add {
            email,
            name,
            password,
            role,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("Password: ")?,
            };

            let user = auth.create_user(&email, &password, &name, &role)?;
            println!(
                "Created user: {} (role: {}, id: {})",
                user.email, user.role, user.id
            );
        }

        UserCommand::List => {
            let users = store.list_users()?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!(
                    "{:<30} {:<20} {:<8} {:<36} {:<12} BLOCKED",
                    "EMAIL", "NAME", "ROLE", "ID", "CREATED"
                );
                println!("{}", "-".repeat(112));
                for user in users {
                    let created = timestamp_to_datetime(user.created_at)
                        .format("%Y-%m-%d")
                        .to_string();
                    println!(
                        "{:<30} {:<20} {:<8} {:<36} {:<12} {}",
                        user.email,
                        user.name,
                        user.role,
                        user.id,
                        created,
                        if user.is_blocked { "yes" } else { "no" }
                    );
                }
            }
        }

        UserCommand::Role { email, role } => {
            let Some(user) = store.get_user_by_email(&email)? else {
                anyhow::bail!("User not found: {}", email);
            };
            if role != "admin" && role != "user" {
                anyhow::bail!("Role must be 'admin' or 'user'");
            }
            store.update_user_role(&user.id, &role)?;
            println!("Changed role of {} to {}", email, role);
        }

        UserCommand::Block { email, undo } => {
            let Some(user) = store.get_user_by_email(&email)? else {
                anyhow::bail!("User not found: {}", email);
            };
            store.update_user_block(&user.id, !undo)?;
            println!(
                "{} user {}",
                if undo { "Unblocked" } else { "Blocked" },
                email
            );
        }
    }

    Ok(())
}

/// Start the server.
async fn cmd_serve(mut config: Config, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    if let Some(addr) = bind {
        config.server.bind = addr;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booknook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Open the catalog store. An unreachable database is fatal here:
    // the process exits non-zero instead of serving requests.
    let store = Store::open(&config.database.path)?;

    let auth = AuthService::new(
        store.clone(),
        config.auth.session_days,
        config.auth.registration_enabled(),
    );

    tracing::info!(
        bind = %config.server.bind,
        database = %config.database.path.display(),
        "Starting booknook server"
    );

    store.cleanup_expired_sessions()?;

    let state = server::AppState::new(config.clone(), store, auth);
    let app = server::create_router(state);

    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(address = %config.server.bind, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Prompt for password input.
fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok(password.trim().to_string())
}
