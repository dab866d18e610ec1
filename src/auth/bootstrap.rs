use crate::error::{Error, Result};
use crate::store::CredentialStore;
use crate::types::BootstrapState;

/// Succeeds once an administrator account with a password exists; fails with
/// `NoAdminAccount` before that. Always reads the store, so deleting the
/// last account is seen on the next call.
pub fn check_first_run(credentials: &dyn CredentialStore) -> Result<()> {
    if credentials.has_admin_account()? {
        Ok(())
    } else {
        Err(Error::NoAdminAccount)
    }
}

pub fn bootstrap_state(credentials: &dyn CredentialStore) -> Result<BootstrapState> {
    match check_first_run(credentials) {
        Ok(()) => Ok(BootstrapState::Operational),
        Err(Error::NoAdminAccount) => Ok(BootstrapState::FirstRun),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordHasher;
    use crate::store::AdminStore;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, AdminStore) {
        let temp = TempDir::new().unwrap();
        let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
        let store = AdminStore::open_with_hasher(temp.path().join("admin.db"), hasher).unwrap();
        (temp, store)
    }

    #[test]
    fn test_empty_store_is_first_run() {
        let (_temp, store) = open_temp();

        assert!(matches!(check_first_run(&store), Err(Error::NoAdminAccount)));
        assert_eq!(bootstrap_state(&store).unwrap(), BootstrapState::FirstRun);
    }

    #[test]
    fn test_first_account_makes_operational() {
        let (_temp, store) = open_temp();

        store.upsert_account("a@b.com", "pw").unwrap();

        check_first_run(&store).unwrap();
        assert_eq!(bootstrap_state(&store).unwrap(), BootstrapState::Operational);
    }

    #[test]
    fn test_deleting_last_account_reverts() {
        let (_temp, store) = open_temp();

        store.upsert_account("a@b.com", "pw").unwrap();
        store.upsert_account("c@d.com", "pw").unwrap();

        store.delete_account("a@b.com").unwrap();
        assert_eq!(bootstrap_state(&store).unwrap(), BootstrapState::Operational);

        store.delete_account("c@d.com").unwrap();
        assert_eq!(bootstrap_state(&store).unwrap(), BootstrapState::FirstRun);
    }
}
