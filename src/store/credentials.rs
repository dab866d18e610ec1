use std::path::Path;
use std::sync::OnceLock;

use super::CredentialStore;
use super::bucket::{Bucket, Database, Entry, Tx};
use crate::auth::PasswordHasher;
use crate::error::{Error, Result};

// Layout:
//
// users                (bucket)
// |- <email>           (bucket)
// |   \- password      (field, argon2 PHC string)
// \- <email>           (bucket)
const USERS_BUCKET: &str = "users";
const FIELD_PASSWORD: &str = "password";
const DUMMY_PASSWORD: &str = "infant-info-dummy-password";

/// Administrator accounts kept in their own database file.
pub struct AdminStore {
    db: Database,
    hasher: PasswordHasher,
    // Verified against when an account has no usable hash, so a missing
    // account costs as much as a wrong password.
    dummy_hash: OnceLock<String>,
}

impl std::fmt::Debug for AdminStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminStore").field("db", &self.db).finish()
    }
}

impl AdminStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_hasher(path, PasswordHasher::new())
    }

    pub fn open_with_hasher<P: AsRef<Path>>(path: P, hasher: PasswordHasher) -> Result<Self> {
        let db = Database::open(path)?;
        db.update(|tx| tx.create_bucket_if_not_exists(USERS_BUCKET).map(|_| ()))?;
        Ok(Self {
            db,
            hasher,
            dummy_hash: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    fn reject_without_hash(&self, password: &str) -> Error {
        let dummy = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => match self.hasher.hash(DUMMY_PASSWORD) {
                Ok(hash) => self.dummy_hash.get_or_init(|| hash),
                Err(e) => {
                    tracing::warn!("Failed to build dummy password hash: {e}");
                    return Error::InvalidCredentials;
                }
            },
        };
        let _ = self.hasher.verify(password, dummy);
        Error::InvalidCredentials
    }
}

fn users<'a>(tx: &Tx<'a>) -> Result<Option<Bucket<'a>>> {
    tx.bucket(USERS_BUCKET)
}

fn account<'a>(tx: &Tx<'a>, email: &str) -> Result<Option<Bucket<'a>>> {
    match users(tx)? {
        Some(all) => all.bucket(email),
        None => Ok(None),
    }
}

impl CredentialStore for AdminStore {
    fn list_admin_emails(&self) -> Result<Vec<String>> {
        self.db.view(|tx| {
            let Some(all) = users(tx)? else {
                return Ok(Vec::new());
            };

            Ok(all
                .entries()?
                .into_iter()
                .filter_map(|entry| match entry {
                    Entry::Bucket { name, .. } => Some(name),
                    Entry::Field { .. } => None,
                })
                .collect())
        })
    }

    fn account_exists(&self, email: &str) -> Result<()> {
        if self.db.view(|tx| Ok(account(tx, email)?.is_some()))? {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    fn verify_credentials(&self, email: &str, password: &str) -> Result<()> {
        let stored = self.db.view(|tx| match account(tx, email)? {
            Some(bucket) => bucket.get(FIELD_PASSWORD),
            None => Ok(None),
        })?;

        let Some(stored) = stored else {
            return Err(self.reject_without_hash(password));
        };
        let Ok(hash) = std::str::from_utf8(&stored) else {
            tracing::warn!("Stored password hash for an account is not valid UTF-8");
            return Err(self.reject_without_hash(password));
        };

        match self.hasher.verify(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::InvalidCredentials),
            Err(e) => {
                tracing::warn!("Unusable password hash for an account: {e}");
                Err(self.reject_without_hash(password))
            }
        }
    }

    fn upsert_account(&self, email: &str, password: &str) -> Result<()> {
        if email.is_empty() {
            return Err(Error::InvalidInput("email cannot be empty".to_string()));
        }
        if password.is_empty() {
            return Err(Error::InvalidInput("password cannot be empty".to_string()));
        }

        // Hash before taking the write lock; it is deliberately slow.
        let hash = self.hasher.hash(password)?;

        self.db.update(|tx| {
            let all = tx.create_bucket_if_not_exists(USERS_BUCKET)?;
            all.create_bucket_if_not_exists(email)?
                .put(FIELD_PASSWORD, hash.as_bytes())
        })?;

        tracing::info!("Saved admin account {email}");
        Ok(())
    }

    fn delete_account(&self, email: &str) -> Result<()> {
        self.db
            .update(|tx| users(tx)?.ok_or(Error::NotFound)?.delete_bucket(email))?;

        tracing::info!("Deleted admin account {email}");
        Ok(())
    }

    fn has_admin_account(&self) -> Result<bool> {
        self.db.view(|tx| {
            let Some(all) = users(tx)? else {
                return Ok(false);
            };

            for (_, bucket) in all.buckets()? {
                if bucket.get(FIELD_PASSWORD)?.is_some() {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, AdminStore) {
        let temp = TempDir::new().unwrap();
        let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
        let store = AdminStore::open_with_hasher(temp.path().join("admin.db"), hasher).unwrap();
        (temp, store)
    }

    #[test]
    fn test_verify_after_upsert() {
        let (_temp, store) = open_temp();

        store.upsert_account("a@b.com", "right").unwrap();

        store.verify_credentials("a@b.com", "right").unwrap();
        assert!(matches!(
            store.verify_credentials("a@b.com", "wrong"),
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            store.verify_credentials("nobody@b.com", "right"),
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn test_missing_account_still_runs_the_hasher() {
        let (_temp, store) = open_temp();
        store.upsert_account("a@b.com", "right").unwrap();
        assert!(store.dummy_hash.get().is_none());

        assert!(matches!(
            store.verify_credentials("a@b.com", "wrong"),
            Err(Error::InvalidCredentials)
        ));
        assert!(store.dummy_hash.get().is_none());

        assert!(matches!(
            store.verify_credentials("nobody@b.com", "right"),
            Err(Error::InvalidCredentials)
        ));
        let dummy = store.dummy_hash.get().unwrap().clone();
        assert!(dummy.starts_with("$argon2id$"));

        store.verify_credentials("nobody@b.com", "right").unwrap_err();
        assert_eq!(store.dummy_hash.get(), Some(&dummy));
    }

    #[test]
    fn test_missing_account_takes_as_long_as_wrong_password() {
        let temp = TempDir::new().unwrap();
        let hasher = PasswordHasher::with_cost(8 * 1024, 2, 1).unwrap();
        let store = AdminStore::open_with_hasher(temp.path().join("admin.db"), hasher).unwrap();
        store.upsert_account("a@b.com", "right").unwrap();

        // Builds the dummy hash outside the timed runs.
        store.verify_credentials("nobody@b.com", "right").unwrap_err();

        let time = |email: &str, password: &str| {
            let start = std::time::Instant::now();
            for _ in 0..3 {
                store.verify_credentials(email, password).unwrap_err();
            }
            start.elapsed()
        };
        let missing = time("nobody@b.com", "right");
        let wrong = time("a@b.com", "wrong");

        assert!(
            missing * 3 >= wrong,
            "missing account {missing:?}, wrong password {wrong:?}"
        );
    }

    #[test]
    fn test_upsert_replaces_password() {
        let (_temp, store) = open_temp();

        store.upsert_account("a@b.com", "first").unwrap();
        store.upsert_account("a@b.com", "second").unwrap();

        assert!(store.verify_credentials("a@b.com", "first").is_err());
        store.verify_credentials("a@b.com", "second").unwrap();
        assert_eq!(store.list_admin_emails().unwrap(), vec!["a@b.com"]);
    }

    #[test]
    fn test_stored_hash_is_not_plaintext() {
        let (_temp, store) = open_temp();
        store.upsert_account("a@b.com", "secret").unwrap();

        let stored = store
            .db
            .view(|tx| account(tx, "a@b.com")?.ok_or(Error::NotFound)?.get(FIELD_PASSWORD))
            .unwrap()
            .unwrap();
        assert!(stored.starts_with(b"$argon2id$"));
        assert!(!stored.windows(6).any(|w| w == b"secret"));
    }

    #[test]
    fn test_account_without_hash_cannot_log_in() {
        let (_temp, store) = open_temp();

        store
            .db
            .update(|tx| {
                tx.create_bucket_if_not_exists(USERS_BUCKET)?
                    .create_bucket_if_not_exists("empty@b.com")?;
                Ok(())
            })
            .unwrap();

        store.account_exists("empty@b.com").unwrap();
        assert!(matches!(
            store.verify_credentials("empty@b.com", ""),
            Err(Error::InvalidCredentials)
        ));
        assert!(!store.has_admin_account().unwrap());
    }

    #[test]
    fn test_list_skips_stray_fields() {
        let (_temp, store) = open_temp();

        store.upsert_account("b@b.com", "pw").unwrap();
        store.upsert_account("a@b.com", "pw").unwrap();
        store
            .db
            .update(|tx| {
                tx.create_bucket_if_not_exists(USERS_BUCKET)?
                    .put("stray", b"value")
            })
            .unwrap();

        assert_eq!(
            store.list_admin_emails().unwrap(),
            vec!["a@b.com", "b@b.com"]
        );
    }

    #[test]
    fn test_account_exists_and_delete() {
        let (_temp, store) = open_temp();

        assert!(matches!(
            store.account_exists("a@b.com"),
            Err(Error::NotFound)
        ));

        store.upsert_account("a@b.com", "pw").unwrap();
        store.account_exists("a@b.com").unwrap();

        store.delete_account("a@b.com").unwrap();
        assert!(matches!(
            store.account_exists("a@b.com"),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            store.delete_account("a@b.com"),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_has_admin_account_tracks_contents() {
        let (_temp, store) = open_temp();

        assert!(!store.has_admin_account().unwrap());
        store.upsert_account("a@b.com", "pw").unwrap();
        assert!(store.has_admin_account().unwrap());
        store.delete_account("a@b.com").unwrap();
        assert!(!store.has_admin_account().unwrap());
    }

    #[test]
    fn test_upsert_rejects_empty_input() {
        let (_temp, store) = open_temp();

        assert!(matches!(
            store.upsert_account("", "pw"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.upsert_account("a@b.com", ""),
            Err(Error::InvalidInput(_))
        ));
    }
}
