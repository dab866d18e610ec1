use std::io::Write;
use std::path::Path;

use super::ResourceStore;
use super::bucket::{Bucket, Database, Entry, Tx};
use super::encoding::{SEPARATOR, decode_list_bytes, encode_list};
use crate::error::{Error, Result};
use crate::types::Resource;

// Layout:
//
// resources            (bucket)
// |- <title>           (bucket)
// |   |- url           (field)
// |   |- tags          (field, comma joined)
// |   \- ...
// \- <title>           (bucket)
const RESOURCES_BUCKET: &str = "resources";

const FIELD_URL: &str = "url";
const FIELD_TAGS: &str = "tags";
const FIELD_DESCRIPTION: &str = "description";
const FIELD_ORG: &str = "org";
const FIELD_ADDRESS: &str = "address";
const FIELD_EMAIL: &str = "email";
const FIELD_PHONE: &str = "phone";
const FIELD_HOURS: &str = "hours";
const FIELD_FEES: &str = "fees";
const FIELD_LANGUAGES: &str = "languages";

/// Resource catalog kept in its own database file.
#[derive(Debug)]
pub struct CatalogStore {
    db: Database,
}

impl CatalogStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Database::open(path)?;
        db.update(|tx| tx.create_bucket_if_not_exists(RESOURCES_BUCKET).map(|_| ()))?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.db.path()
    }
}

fn validate_resource(resource: &Resource) -> Result<()> {
    if resource.title.is_empty() {
        return Err(Error::InvalidInput("title cannot be empty".to_string()));
    }

    let lists = [
        (FIELD_TAGS, &resource.tags),
        (FIELD_FEES, &resource.fees),
        (FIELD_LANGUAGES, &resource.languages),
    ];
    for (field, values) in lists {
        if values.iter().any(String::is_empty) {
            return Err(Error::InvalidInput(format!(
                "{field} cannot contain empty entries"
            )));
        }
        if values.iter().any(|v| v.contains(SEPARATOR)) {
            tracing::warn!(
                "Resource '{}' has a {} entry containing '{}'; it will be split when read back",
                resource.title,
                field,
                SEPARATOR
            );
        }
    }

    Ok(())
}

fn write_resource(bucket: &Bucket<'_>, resource: &Resource) -> Result<()> {
    let scalars = [
        (FIELD_URL, &resource.url),
        (FIELD_DESCRIPTION, &resource.description),
        (FIELD_ORG, &resource.org),
        (FIELD_ADDRESS, &resource.address),
        (FIELD_EMAIL, &resource.email),
        (FIELD_PHONE, &resource.phone),
        (FIELD_HOURS, &resource.hours),
    ];
    for (key, value) in scalars {
        bucket.put(key, value.as_bytes())?;
    }

    let lists = [
        (FIELD_TAGS, &resource.tags),
        (FIELD_FEES, &resource.fees),
        (FIELD_LANGUAGES, &resource.languages),
    ];
    for (key, values) in lists {
        bucket.put(key, encode_list(values).as_bytes())?;
    }

    Ok(())
}

fn read_resource(title: String, bucket: &Bucket<'_>) -> Result<Resource> {
    let mut resource = Resource {
        title,
        ..Resource::default()
    };

    for (key, value) in bucket.fields()? {
        let text = || String::from_utf8_lossy(&value).into_owned();
        match key.as_str() {
            FIELD_URL => resource.url = text(),
            FIELD_DESCRIPTION => resource.description = text(),
            FIELD_ORG => resource.org = text(),
            FIELD_ADDRESS => resource.address = text(),
            FIELD_EMAIL => resource.email = text(),
            FIELD_PHONE => resource.phone = text(),
            FIELD_HOURS => resource.hours = text(),
            FIELD_TAGS => resource.tags = decode_list_bytes(&value),
            FIELD_FEES => resource.fees = decode_list_bytes(&value),
            FIELD_LANGUAGES => resource.languages = decode_list_bytes(&value),
            _ => {}
        }
    }

    Ok(resource)
}

fn resources<'a>(tx: &Tx<'a>) -> Result<Option<Bucket<'a>>> {
    tx.bucket(RESOURCES_BUCKET)
}

impl ResourceStore for CatalogStore {
    fn upsert_resource(&self, resource: &Resource) -> Result<()> {
        validate_resource(resource)?;

        self.db.update(|tx| {
            let all = tx.create_bucket_if_not_exists(RESOURCES_BUCKET)?;
            let bucket = all.create_bucket_if_not_exists(&resource.title)?;
            write_resource(&bucket, resource)
        })?;

        tracing::debug!("Saved resource '{}'", resource.title);
        Ok(())
    }

    fn replace_resource(&self, original_title: &str, resource: &Resource) -> Result<()> {
        self.upsert_resource(resource)?;

        if original_title.is_empty() || original_title == resource.title {
            return Ok(());
        }

        match self.delete_resource(original_title) {
            Ok(()) | Err(Error::NotFound) => Ok(()),
            Err(e) => {
                tracing::error!(
                    "Saved '{}' but failed to remove its old entry '{}': {}",
                    resource.title,
                    original_title,
                    e
                );
                Err(e)
            }
        }
    }

    fn list_resources(&self) -> Result<Vec<Resource>> {
        self.db.view(|tx| {
            let Some(all) = resources(tx)? else {
                return Ok(Vec::new());
            };

            let mut out = Vec::new();
            for entry in all.entries()? {
                match entry {
                    Entry::Bucket { name, bucket } => out.push(read_resource(name, &bucket)?),
                    Entry::Field { key, .. } => {
                        tracing::debug!("Skipping stray field '{key}' in resources");
                    }
                }
            }
            Ok(out)
        })
    }

    fn get_resource(&self, title: &str) -> Result<Resource> {
        self.db.view(|tx| {
            let bucket = match resources(tx)? {
                Some(all) => all.bucket(title)?,
                None => None,
            }
            .ok_or(Error::NotFound)?;
            read_resource(title.to_string(), &bucket)
        })
    }

    fn delete_resource(&self, title: &str) -> Result<()> {
        self.db.update(|tx| {
            resources(tx)?.ok_or(Error::NotFound)?.delete_bucket(title)
        })?;

        tracing::debug!("Deleted resource '{title}'");
        Ok(())
    }

    fn export_snapshot(&self, sink: &mut dyn Write) -> Result<u64> {
        let written = self.db.snapshot(sink)?;
        tracing::info!("Exported catalog snapshot ({written} bytes)");
        Ok(written)
    }
}
