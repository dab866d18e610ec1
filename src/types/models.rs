use serde::{Deserialize, Serialize};

/// A directory entry. `title` is the primary key; every other field may be
/// empty, which is also how records written by older revisions read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub fees: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl Resource {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            tags,
            ..Self::default()
        }
    }
}

/// Whether an administrator account has ever been set up. Derived from the
/// credential store on every check, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    FirstRun,
    Operational,
}
