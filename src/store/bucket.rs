//! Hierarchical, ordered bucket storage on top of a single SQLite file.
//!
//! A database is a tree of named buckets. Each bucket holds child buckets
//! and scalar fields; a name is either one or the other within its parent.
//! Names sort by their raw bytes. All access happens inside a transaction
//! obtained from [`Database::view`] or [`Database::update`].

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};

use super::schema::SCHEMA;
use crate::error::{Error, Result};

const ROOT_BUCKET_ID: i64 = 0;

// Discriminant of the `kind` column produced by `Bucket::entries`.
const KIND_BUCKET: i64 = 0;

/// One embedded database file.
///
/// The file is opened once and held for the lifetime of the value. Writes go
/// through a dedicated connection under `BEGIN IMMEDIATE`; reads use a second,
/// read-only connection so a writer never blocks them (WAL mode).
pub struct Database {
    path: PathBuf,
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|e| e.into_inner())
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let writer = Connection::open(&path)?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.execute_batch(SCHEMA)?;

        let reader = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        tracing::debug!("Opened database at {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` inside a read transaction. Every read in `f` sees the same
    /// snapshot of the file.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let mut conn = lock(&self.reader);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&Tx { conn: &tx })?;
        tx.commit()?;
        Ok(out)
    }

    /// Runs `f` inside a write transaction. The transaction commits when `f`
    /// returns `Ok` and rolls back on any error.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let mut conn = lock(&self.writer);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&Tx { conn: &tx })?;
        tx.commit()?;
        Ok(out)
    }

    /// Writes a self-contained copy of the whole file to `sink` and returns
    /// the number of bytes written.
    ///
    /// The copy is taken in a single read transaction, so it reflects the
    /// database as of the start of the export. It can be reopened with
    /// [`Database::open`].
    pub fn snapshot<W: Write + ?Sized>(&self, sink: &mut W) -> Result<u64> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("snapshot.db");
        let target_str = target
            .to_str()
            .ok_or_else(|| Error::Config("snapshot path is not valid UTF-8".to_string()))?;

        lock(&self.writer).execute("VACUUM INTO ?1", params![target_str])?;

        let mut file = File::open(&target)?;
        let written = io::copy(&mut file, sink)?;
        sink.flush()?;

        Ok(written)
    }
}

/// An open transaction. Obtained from [`Database::view`] or
/// [`Database::update`]; it cannot outlive the closure it is passed to.
pub struct Tx<'a> {
    conn: &'a Connection,
}

impl<'a> Tx<'a> {
    fn root(&self) -> Bucket<'a> {
        Bucket {
            conn: self.conn,
            id: ROOT_BUCKET_ID,
        }
    }

    /// Looks up a top-level bucket.
    pub fn bucket(&self, name: &str) -> Result<Option<Bucket<'a>>> {
        self.root().bucket(name)
    }

    pub fn create_bucket_if_not_exists(&self, name: &str) -> Result<Bucket<'a>> {
        self.root().create_bucket_if_not_exists(name)
    }

    #[cfg(test)]
    fn delete_bucket(&self, name: &str) -> Result<()> {
        self.root().delete_bucket(name)
    }
}

/// A child of a bucket: either a nested bucket or a scalar field.
#[derive(Debug)]
pub enum Entry<'a> {
    Bucket { name: String, bucket: Bucket<'a> },
    Field { key: String, value: Vec<u8> },
}

#[cfg(test)]
impl Entry<'_> {
    fn name(&self) -> &str {
        match self {
            Entry::Bucket { name, .. } => name,
            Entry::Field { key, .. } => key,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Bucket<'a> {
    conn: &'a Connection,
    id: i64,
}

impl std::fmt::Debug for Bucket<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket").field("id", &self.id).finish()
    }
}

impl<'a> Bucket<'a> {
    pub fn bucket(&self, name: &str) -> Result<Option<Bucket<'a>>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM buckets WHERE parent_id = ?1 AND name = ?2",
                params![self.id, name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.map(|id| Bucket {
            conn: self.conn,
            id,
        }))
    }

    /// Returns the named child bucket, creating it when absent.
    pub fn create_bucket_if_not_exists(&self, name: &str) -> Result<Bucket<'a>> {
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "bucket name cannot be empty".to_string(),
            ));
        }

        if let Some(existing) = self.bucket(name)? {
            return Ok(existing);
        }

        if self.get(name)?.is_some() {
            return Err(Error::InvalidInput(format!(
                "'{name}' is a field, not a bucket"
            )));
        }

        self.conn.execute(
            "INSERT INTO buckets (parent_id, name) VALUES (?1, ?2)",
            params![self.id, name],
        )?;

        Ok(Bucket {
            conn: self.conn,
            id: self.conn.last_insert_rowid(),
        })
    }

    /// Removes a child bucket together with everything nested below it.
    pub fn delete_bucket(&self, name: &str) -> Result<()> {
        let rows = self.conn.execute(
            "DELETE FROM buckets WHERE parent_id = ?1 AND name = ?2",
            params![self.id, name],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT value FROM fields WHERE bucket_id = ?1 AND key = ?2",
                params![self.id, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::from)
    }

    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidInput("field key cannot be empty".to_string()));
        }

        if self.bucket(key)?.is_some() {
            return Err(Error::InvalidInput(format!(
                "'{key}' is a bucket, not a field"
            )));
        }

        self.conn.execute(
            "INSERT INTO fields (bucket_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (bucket_id, key) DO UPDATE SET value = excluded.value",
            params![self.id, key, value],
        )?;
        Ok(())
    }

    #[cfg(test)]
    fn delete(&self, key: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM fields WHERE bucket_id = ?1 AND key = ?2",
            params![self.id, key],
        )?;
        Ok(rows > 0)
    }

    /// Every child, buckets and fields interleaved, in byte order of name.
    pub fn entries(&self) -> Result<Vec<Entry<'a>>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, 0 AS kind, id, NULL FROM buckets WHERE parent_id = ?1
             UNION ALL
             SELECT key, 1 AS kind, NULL, value FROM fields WHERE bucket_id = ?1
             ORDER BY 1",
        )?;

        let conn = self.conn;
        let rows = stmt.query_map(params![self.id], |row| {
            let name: String = row.get(0)?;
            let kind: i64 = row.get(1)?;
            if kind == KIND_BUCKET {
                Ok(Entry::Bucket {
                    name,
                    bucket: Bucket {
                        conn,
                        id: row.get(2)?,
                    },
                })
            } else {
                Ok(Entry::Field {
                    key: name,
                    value: row.get(3)?,
                })
            }
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Child buckets only, in byte order of name.
    pub fn buckets(&self) -> Result<Vec<(String, Bucket<'a>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, id FROM buckets WHERE parent_id = ?1 ORDER BY name")?;

        let conn = self.conn;
        let rows = stmt.query_map(params![self.id], |row| {
            Ok((row.get(0)?, Bucket { conn, id: row.get(1)? }))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Scalar fields only, in byte order of key.
    pub fn fields(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM fields WHERE bucket_id = ?1 ORDER BY key")?;

        let rows = stmt.query_map(params![self.id], |row| Ok((row.get(0)?, row.get(1)?)))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let temp = TempDir::new().unwrap();
        let db = Database::open(temp.path().join("test.db")).unwrap();
        (temp, db)
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, db) = open_temp();

        let conn = lock(&db.writer);
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"buckets".to_string()));
        assert!(tables.contains(&"fields".to_string()));
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.db");

        let db = Database::open(&path).unwrap();
        db.update(|tx| {
            tx.create_bucket_if_not_exists("top")?.put("k", b"v")?;
            Ok(())
        })
        .unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        let value = db
            .view(|tx| tx.bucket("top")?.ok_or(Error::NotFound)?.get("k"))
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn test_nested_buckets_and_fields() {
        let (_temp, db) = open_temp();

        db.update(|tx| {
            let top = tx.create_bucket_if_not_exists("resources")?;
            let child = top.create_bucket_if_not_exists("Food Bank")?;
            child.put("url", b"http://fb.org")?;
            Ok(())
        })
        .unwrap();

        let url = db
            .view(|tx| {
                let top = tx.bucket("resources")?.ok_or(Error::NotFound)?;
                let child = top.bucket("Food Bank")?.ok_or(Error::NotFound)?;
                child.get("url")
            })
            .unwrap();
        assert_eq!(url.as_deref(), Some(&b"http://fb.org"[..]));
    }

    #[test]
    fn test_create_bucket_is_idempotent() {
        let (_temp, db) = open_temp();

        db.update(|tx| {
            let first = tx.create_bucket_if_not_exists("a")?;
            first.put("k", b"1")?;
            let second = tx.create_bucket_if_not_exists("a")?;
            assert_eq!(second.get("k")?.as_deref(), Some(&b"1"[..]));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_put_overwrites() {
        let (_temp, db) = open_temp();

        db.update(|tx| {
            let b = tx.create_bucket_if_not_exists("a")?;
            b.put("k", b"old")?;
            b.put("k", b"new")?;
            Ok(())
        })
        .unwrap();

        let fields = db
            .view(|tx| tx.bucket("a")?.ok_or(Error::NotFound)?.fields())
            .unwrap();
        assert_eq!(fields, vec![("k".to_string(), b"new".to_vec())]);
    }

    #[test]
    fn test_delete_field() {
        let (_temp, db) = open_temp();

        let (first, second, remaining) = db
            .update(|tx| {
                let b = tx.create_bucket_if_not_exists("a")?;
                b.put("k", b"v")?;
                let first = b.delete("k")?;
                let second = b.delete("k")?;
                Ok((first, second, b.get("k")?))
            })
            .unwrap();

        assert!(first);
        assert!(!second);
        assert!(remaining.is_none());
    }

    #[test]
    fn test_delete_bucket_cascades() {
        let (_temp, db) = open_temp();

        db.update(|tx| {
            let top = tx.create_bucket_if_not_exists("top")?;
            let child = top.create_bucket_if_not_exists("child")?;
            child.put("k", b"v")?;
            child.create_bucket_if_not_exists("grandchild")?.put("x", b"y")?;
            Ok(())
        })
        .unwrap();

        db.update(|tx| tx.bucket("top")?.ok_or(Error::NotFound)?.delete_bucket("child"))
            .unwrap();

        let conn = lock(&db.writer);
        let fields: i64 = conn
            .query_row("SELECT COUNT(*) FROM fields", [], |row| row.get(0))
            .unwrap();
        let buckets: i64 = conn
            .query_row("SELECT COUNT(*) FROM buckets WHERE id != 0", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(fields, 0);
        assert_eq!(buckets, 1);
    }

    #[test]
    fn test_delete_missing_bucket_is_not_found() {
        let (_temp, db) = open_temp();

        let result = db.update(|tx| tx.delete_bucket("nope"));
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn test_entries_are_tagged_and_ordered() {
        let (_temp, db) = open_temp();

        db.update(|tx| {
            let top = tx.create_bucket_if_not_exists("users")?;
            top.create_bucket_if_not_exists("b@x.com")?;
            top.put("stray", b"value")?;
            top.create_bucket_if_not_exists("a@x.com")?;
            Ok(())
        })
        .unwrap();

        let names: Vec<(String, bool)> = db
            .view(|tx| {
                let top = tx.bucket("users")?.ok_or(Error::NotFound)?;
                Ok(top
                    .entries()?
                    .into_iter()
                    .map(|e| (e.name().to_string(), matches!(e, Entry::Bucket { .. })))
                    .collect())
            })
            .unwrap();

        assert_eq!(
            names,
            vec![
                ("a@x.com".to_string(), true),
                ("b@x.com".to_string(), true),
                ("stray".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_bucket_and_field_names_do_not_collide() {
        let (_temp, db) = open_temp();

        let result = db.update(|tx| {
            let top = tx.create_bucket_if_not_exists("top")?;
            top.put("name", b"v")?;
            top.create_bucket_if_not_exists("name")?;
            Ok(())
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = db.update(|tx| {
            let top = tx.create_bucket_if_not_exists("top")?;
            top.create_bucket_if_not_exists("nested")?;
            top.put("nested", b"v")
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let (_temp, db) = open_temp();

        let result: Result<()> = db.update(|tx| {
            tx.create_bucket_if_not_exists("top")?.put("k", b"v")?;
            Err(Error::NotFound)
        });
        assert!(result.is_err());

        let top = db.view(|tx| Ok(tx.bucket("top")?.is_some())).unwrap();
        assert!(!top);
    }

    #[test]
    fn test_view_is_not_blocked_by_open_update() {
        let (_temp, db) = open_temp();
        db.update(|tx| tx.create_bucket_if_not_exists("a")?.put("k", b"old"))
            .unwrap();

        let (written_tx, written_rx) = std::sync::mpsc::channel();
        std::thread::scope(|scope| {
            let writer = scope.spawn(|| {
                db.update(|tx| {
                    tx.bucket("a")?.ok_or(Error::NotFound)?.put("k", b"new")?;
                    written_tx.send(()).unwrap();
                    std::thread::sleep(std::time::Duration::from_millis(800));
                    Ok(())
                })
            });

            written_rx.recv().unwrap();
            let start = std::time::Instant::now();
            let value = db
                .view(|tx| tx.bucket("a")?.ok_or(Error::NotFound)?.get("k"))
                .unwrap();
            let elapsed = start.elapsed();

            assert_eq!(value.as_deref(), Some(&b"old"[..]));
            assert!(
                elapsed < std::time::Duration::from_millis(400),
                "read waited {elapsed:?} for the writer"
            );

            writer.join().unwrap().unwrap();
        });

        let value = db
            .view(|tx| tx.bucket("a")?.ok_or(Error::NotFound)?.get("k"))
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"new"[..]));
    }

    #[test]
    fn test_view_rejects_writes() {
        let (_temp, db) = open_temp();

        let result = db.view(|tx| tx.create_bucket_if_not_exists("top").map(|_| ()));
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_snapshot_reopens_with_same_contents() {
        let (temp, db) = open_temp();

        db.update(|tx| {
            let top = tx.create_bucket_if_not_exists("resources")?;
            top.create_bucket_if_not_exists("A")?.put("url", b"http://a")?;
            top.create_bucket_if_not_exists("B")?.put("url", b"http://b")?;
            Ok(())
        })
        .unwrap();

        let mut bytes = Vec::new();
        let written = db.snapshot(&mut bytes).unwrap();
        assert_eq!(written as usize, bytes.len());
        assert!(bytes.starts_with(b"SQLite format 3\0"));

        let copy_path = temp.path().join("copy.db");
        std::fs::write(&copy_path, &bytes).unwrap();

        let copy = Database::open(&copy_path).unwrap();
        let names: Vec<String> = copy
            .view(|tx| {
                let top = tx.bucket("resources")?.ok_or(Error::NotFound)?;
                Ok(top.buckets()?.into_iter().map(|(name, _)| name).collect())
            })
            .unwrap();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }
}
