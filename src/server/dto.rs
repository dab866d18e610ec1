use serde::{Deserialize, Serialize};

use crate::store::encoding::{display_tags, parse_list_input};
use crate::types::{BootstrapState, Resource};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: BootstrapState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    pub repeat: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub password: String,
    pub repeat: String,
}

/// A multi-valued form field, sent either as a JSON array or as comma
/// separated text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    List(Vec<String>),
    Text(String),
}

impl Default for ListInput {
    fn default() -> Self {
        ListInput::List(Vec::new())
    }
}

impl ListInput {
    #[must_use]
    pub fn into_values(self) -> Vec<String> {
        match self {
            ListInput::List(values) => values,
            ListInput::Text(text) => parse_list_input(&text),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResourceRequest {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tags: ListInput,
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
    pub fees: ListInput,
    #[serde(default)]
    pub languages: ListInput,
}

impl From<ResourceRequest> for Resource {
    fn from(req: ResourceRequest) -> Self {
        Resource {
            title: req.title.trim().to_string(),
            url: req.url,
            tags: req.tags.into_values(),
            description: req.description,
            org: req.org,
            address: req.address,
            email: req.email,
            phone: req.phone,
            hours: req.hours,
            fees: req.fees.into_values(),
            languages: req.languages.into_values(),
        }
    }
}

/// A resource as shown in the admin listing.
#[derive(Debug, Serialize)]
pub struct ResourceListing {
    #[serde(flatten)]
    pub resource: Resource,
    pub display_tags: Vec<String>,
}

impl From<Resource> for ResourceListing {
    fn from(resource: Resource) -> Self {
        let display_tags = display_tags(&resource.tags);
        Self {
            resource,
            display_tags,
        }
    }
}
