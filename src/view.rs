//! Read-only projections handed to the presentation layer.
//!
//! Derived values (`short_url`, `followed_by_current_user`) live here and
//! never on the entities, so nothing computed per request can be persisted.

use crate::constants::{SHORT_URL_ELLIPSIS, SHORT_URL_LENGTH};
use crate::orm::{themes, websites};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Display form of a URL: the first 54 characters and an ellipsis once the
/// URL reaches that length.
pub fn short_url(url: &str) -> String {
    if url.chars().count() >= SHORT_URL_LENGTH {
        let mut short: String = url.chars().take(SHORT_URL_LENGTH).collect();
        short.push_str(SHORT_URL_ELLIPSIS);
        short
    } else {
        url.to_owned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Approval {
    Pending,
    Approved,
    Rejected,
}

impl From<Option<bool>> for Approval {
    fn from(approved: Option<bool>) -> Self {
        match approved {
            None => Approval::Pending,
            Some(true) => Approval::Approved,
            Some(false) => Approval::Rejected,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ThemeView {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
    pub private: bool,
    pub open: bool,
    pub approve: bool,
    pub owner_id: i32,
    pub websites_count: i32,
    pub tags: Vec<String>,
    pub followed_by_current_user: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl ThemeView {
    pub fn project(theme: &themes::Model, tags: Vec<String>, followed: bool) -> Self {
        Self {
            id: theme.id,
            title: theme.title.clone(),
            description: theme.description.clone(),
            slug: theme.slug.clone(),
            private: theme.private,
            open: theme.open,
            approve: theme.approve,
            owner_id: theme.owner_id,
            websites_count: theme.websites_count,
            tags,
            followed_by_current_user: followed,
            created_at: theme.created_at,
            updated_at: theme.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct WebsiteView {
    pub id: i32,
    pub url: String,
    pub short_url: String,
    pub comment: Option<String>,
    pub theme_id: i32,
    pub owner_id: i32,
    pub approval: Approval,
    pub created_at: NaiveDateTime,
}

impl From<&websites::Model> for WebsiteView {
    fn from(website: &websites::Model) -> Self {
        Self {
            id: website.id,
            url: website.url.clone(),
            short_url: short_url(&website.url),
            comment: website.comment.clone(),
            theme_id: website.theme_id,
            owner_id: website.owner_id,
            approval: website.approved.into(),
            created_at: website.created_at,
        }
    }
}
