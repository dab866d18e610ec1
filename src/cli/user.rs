use inquire::{Password, Text};

use crate::error::{Error, Result};
use crate::store::CredentialStore;

use super::{StoreArgs, confirm_action, load_config, open_credentials};

/// Whether `email` names an account. Storage failures are passed up rather
/// than read as "no such account".
fn account_known(store: &dyn CredentialStore, email: &str) -> Result<bool> {
    match store.account_exists(email) {
        Ok(()) => Ok(true),
        Err(Error::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn run_user_add(
    args: StoreArgs,
    email: Option<String>,
    password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let store = open_credentials(&config)?;

    let email = match email {
        Some(email) => email,
        None if non_interactive => anyhow::bail!("--email is required in non-interactive mode"),
        None => Text::new("Email:")
            .with_validator(|input: &str| {
                if input.trim().is_empty() {
                    Ok(inquire::validator::Validation::Invalid(
                        "Email cannot be empty".into(),
                    ))
                } else {
                    Ok(inquire::validator::Validation::Valid)
                }
            })
            .prompt()?,
    };
    let email = email.trim().to_string();
    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }

    let password = match password {
        Some(password) => password,
        None if non_interactive => {
            anyhow::bail!("--password is required in non-interactive mode")
        }
        // The prompt asks for confirmation itself.
        None => Password::new("Password:").prompt()?,
    };

    let existed = account_known(&store, &email)?;
    store.upsert_account(&email, &password)?;

    if existed {
        println!("Updated password for \"{email}\"");
    } else {
        println!("Created admin account \"{email}\"");
    }
    Ok(())
}

pub fn run_user_remove(
    args: StoreArgs,
    email: String,
    yes: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let store = open_credentials(&config)?;

    if !account_known(&store, &email)? {
        anyhow::bail!("Admin account '{email}' not found");
    }

    let remaining = store.list_admin_emails()?.len().saturating_sub(1);
    let prompt = if remaining == 0 {
        format!("Delete '{email}'? It is the last admin account.")
    } else {
        format!("Delete '{email}'?")
    };

    if !confirm_action(&prompt, yes, non_interactive)? {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_account(&email)?;
    println!("Removed admin account \"{email}\"");
    Ok(())
}

pub fn run_user_list(args: StoreArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let store = open_credentials(&config)?;
    let emails = store.list_admin_emails()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&emails)?);
    } else if emails.is_empty() {
        println!("No admin accounts.");
    } else {
        for email in emails {
            println!("{email}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordHasher;
    use crate::store::AdminStore;
    use tempfile::TempDir;

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn list_admin_emails(&self) -> Result<Vec<String>> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }
        fn account_exists(&self, _email: &str) -> Result<()> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }
        fn verify_credentials(&self, _email: &str, _password: &str) -> Result<()> {
            Err(Error::InvalidCredentials)
        }
        fn upsert_account(&self, _email: &str, _password: &str) -> Result<()> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }
        fn delete_account(&self, _email: &str) -> Result<()> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }
        fn has_admin_account(&self) -> Result<bool> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }
    }

    #[test]
    fn test_account_known() {
        let temp = TempDir::new().unwrap();
        let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
        let store = AdminStore::open_with_hasher(temp.path().join("admin.db"), hasher).unwrap();

        assert!(!account_known(&store, "a@b.com").unwrap());
        store.upsert_account("a@b.com", "pw").unwrap();
        assert!(account_known(&store, "a@b.com").unwrap());
    }

    #[test]
    fn test_account_known_passes_storage_errors_up() {
        assert!(matches!(
            account_known(&BrokenStore, "a@b.com"),
            Err(Error::Storage(_))
        ));
    }
}
