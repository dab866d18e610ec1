use serde::Serialize;

use crate::auth::bootstrap_state;
use crate::store::{CredentialStore, ResourceStore};
use crate::types::BootstrapState;

use super::{StoreArgs, load_config, open_catalog, open_credentials};

#[derive(Serialize)]
struct StatusOutput {
    state: BootstrapState,
    admins: usize,
    resources: usize,
    catalog_path: String,
    credentials_path: String,
}

pub fn run_status(args: StoreArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let credentials = open_credentials(&config)?;
    let catalog = open_catalog(&config)?;

    let output = StatusOutput {
        state: bootstrap_state(&credentials)?,
        admins: credentials.list_admin_emails()?.len(),
        resources: catalog.list_resources()?.len(),
        catalog_path: catalog.path().display().to_string(),
        credentials_path: credentials.path().display().to_string(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match output.state {
        BootstrapState::FirstRun => {
            println!("No admin account yet. Run 'infant-info admin user add' to create one.");
        }
        BootstrapState::Operational => println!("Admin accounts: {}", output.admins),
    }
    println!("Resources:      {}", output.resources);
    println!("Catalog:        {}", output.catalog_path);
    println!("Credentials:    {}", output.credentials_path);

    Ok(())
}
