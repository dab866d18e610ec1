use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Where the databases live.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Data directory for the catalog and admin databases
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// TOML config file overriding the database locations
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Show whether an admin account has been set up
    Status {
        #[command(flatten)]
        store: StoreArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage admin accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Write a snapshot of the catalog database to a file
    Export {
        #[command(flatten)]
        store: StoreArgs,

        /// Destination file
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add an admin account, or reset the password of an existing one
    Add {
        #[command(flatten)]
        store: StoreArgs,

        /// Email address of the account
        #[arg(long)]
        email: Option<String>,

        /// Password for the account (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Skip interactive prompts (requires --email and --password)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Remove an admin account
    Remove {
        #[command(flatten)]
        store: StoreArgs,

        /// Email address of the account
        #[arg(long)]
        email: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// List admin accounts
    List {
        #[command(flatten)]
        store: StoreArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
