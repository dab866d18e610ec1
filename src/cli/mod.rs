mod commands;
mod export;
mod status;
mod user;

pub use commands::{AdminCommands, StoreArgs, UserCommands};
pub use export::run_export;
pub use status::run_status;
pub use user::{run_user_add, run_user_list, run_user_remove};

use crate::config::{FileConfig, ServerConfig};
use crate::store::{AdminStore, CatalogStore};

/// Builds the config for an admin command from its flags and optional file.
pub fn load_config(args: &StoreArgs) -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig {
        data_dir: args.data_dir.clone(),
        ..ServerConfig::default()
    };
    if let Some(path) = &args.config {
        config.merge(FileConfig::load(path)?)?;
    }
    Ok(config)
}

/// Opens the admin database, creating the data directory if needed.
pub fn open_credentials(config: &ServerConfig) -> anyhow::Result<AdminStore> {
    let path = config.credentials_path();
    ensure_parent(&path)?;
    AdminStore::open(&path).map_err(Into::into)
}

/// Opens the catalog database, creating the data directory if needed.
pub fn open_catalog(config: &ServerConfig) -> anyhow::Result<CatalogStore> {
    let path = config.catalog_path();
    ensure_parent(&path)?;
    CatalogStore::open(&path).map_err(Into::into)
}

fn ensure_parent(path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn confirm_action(prompt: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    if non_interactive {
        anyhow::bail!("Use --yes to confirm in non-interactive mode");
    }
    Ok(inquire::Confirm::new(prompt).with_default(false).prompt()?)
}
