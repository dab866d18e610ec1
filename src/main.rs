use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use infant_info::auth::bootstrap_state;
use infant_info::cli::{
    AdminCommands, UserCommands, run_export, run_status, run_user_add, run_user_list,
    run_user_remove,
};
use infant_info::config::{FileConfig, ServerConfig};
use infant_info::server::{AppState, create_router};
use infant_info::store::{AdminStore, CatalogStore};
use infant_info::types::BootstrapState;

#[derive(Parser)]
#[command(name = "infant-info")]
#[command(about = "A community resource directory for parents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the catalog and admin databases
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// TOML config file; its values override the flags above
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let catalog_path = config.catalog_path();
    let credentials_path = config.credentials_path();
    for path in [&catalog_path, &credentials_path] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }

    let catalog = CatalogStore::open(&catalog_path)?;
    let credentials = AdminStore::open(&credentials_path)?;

    info!("Catalog at {}", catalog_path.display());
    info!("Admin accounts at {}", credentials_path.display());
    if bootstrap_state(&credentials)? == BootstrapState::FirstRun {
        info!(
            "No admin account yet. Create one via POST /api/v1/admin/first-account or 'infant-info admin user add'."
        );
    }

    let state = Arc::new(AppState::new(
        Arc::new(catalog),
        Arc::new(credentials),
        config.session_ttl(),
    ));

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("infant_info=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Status { store, json } => run_status(store, json)?,
            AdminCommands::User { command } => match command {
                UserCommands::Add {
                    store,
                    email,
                    password,
                    non_interactive,
                } => run_user_add(store, email, password, non_interactive)?,
                UserCommands::Remove {
                    store,
                    email,
                    yes,
                    non_interactive,
                } => run_user_remove(store, email, yes, non_interactive)?,
                UserCommands::List { store, json } => run_user_list(store, json)?,
            },
            AdminCommands::Export { store, output } => run_export(store, output)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
        } => {
            let mut server_config = ServerConfig {
                host,
                port,
                data_dir,
                ..ServerConfig::default()
            };
            if let Some(path) = config {
                server_config.merge(FileConfig::load(&path)?)?;
            }

            serve(server_config).await?;
        }
    }

    Ok(())
}
