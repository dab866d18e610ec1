use super::bootstrap::check_first_run;
use crate::error::{Error, Result};
use crate::store::CredentialStore;

/// Who is making a request, as far as the back office is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated { email: String },
}

impl Caller {
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated { email } => Some(email),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Login,
    Logout,
    /// Create the very first account. Open to anyone, but only while no
    /// account exists.
    ClaimFirstAccount,
    ManageAccounts,
    ManageResources,
    ExportCatalog,
}

/// What the web layer must do with the caller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDirective {
    Bind(String),
    Clear,
}

/// Access decisions for the administrative back office.
pub struct AuthGate<'a> {
    credentials: &'a dyn CredentialStore,
}

impl<'a> AuthGate<'a> {
    #[must_use]
    pub fn new(credentials: &'a dyn CredentialStore) -> Self {
        Self { credentials }
    }

    /// Maps a session identity to a caller. An empty identity, or one that
    /// no longer names an account, is anonymous.
    pub fn resolve(&self, session_identity: Option<&str>) -> Result<Caller> {
        let Some(email) = session_identity.filter(|e| !e.is_empty()) else {
            return Ok(Caller::Anonymous);
        };

        match self.credentials.account_exists(email) {
            Ok(()) => Ok(Caller::Authenticated {
                email: email.to_string(),
            }),
            Err(Error::NotFound) => Ok(Caller::Anonymous),
            Err(e) => Err(e),
        }
    }

    pub fn authorize(&self, caller: &Caller, action: AdminAction) -> Result<()> {
        match (caller, action) {
            (_, AdminAction::ClaimFirstAccount) => match check_first_run(self.credentials) {
                Ok(()) => Err(Error::AlreadyInitialized),
                Err(Error::NoAdminAccount) => Ok(()),
                Err(e) => Err(e),
            },
            (_, AdminAction::Login) => Ok(()),
            (Caller::Authenticated { .. }, _) => Ok(()),
            (Caller::Anonymous, _) => Err(Error::Unauthorized),
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<SessionDirective> {
        let email = email.trim();
        self.credentials.verify_credentials(email, password)?;
        tracing::info!("Admin login for {email}");
        Ok(SessionDirective::Bind(email.to_string()))
    }

    #[must_use]
    pub fn logout(&self) -> SessionDirective {
        SessionDirective::Clear
    }

    /// Creates the first administrator account and logs the caller in as it.
    /// Emails are trimmed here and in `login` and `save_account`, so an
    /// account is always stored and looked up under the same key.
    pub fn claim_first_account(
        &self,
        email: &str,
        password: &str,
        repeat: &str,
    ) -> Result<SessionDirective> {
        self.authorize(&Caller::Anonymous, AdminAction::ClaimFirstAccount)?;
        check_confirmation(password, repeat)?;

        let email = email.trim();
        self.credentials.upsert_account(email, password)?;
        tracing::info!("Created first admin account {email}");
        Ok(SessionDirective::Bind(email.to_string()))
    }

    /// Creates or updates an account on behalf of a logged-in administrator.
    pub fn save_account(
        &self,
        caller: &Caller,
        email: &str,
        password: &str,
        repeat: &str,
    ) -> Result<()> {
        self.authorize(caller, AdminAction::ManageAccounts)?;
        check_confirmation(password, repeat)?;
        self.credentials.upsert_account(email.trim(), password)
    }
}

fn check_confirmation(password: &str, repeat: &str) -> Result<()> {
    if password != repeat {
        return Err(Error::InvalidInput("passwords do not match".to_string()));
    }
    Ok(())
}
