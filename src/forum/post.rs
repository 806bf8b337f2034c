//! Post records.

use crate::error::{ForumError, Result};
use crate::forum::constants::{MAX_NAME_SIZE, MAX_POST_BODY_SIZE};
use serde::{Deserialize, Serialize};

/// A stored post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub thread_id: String,
    pub title: String,
    pub body: String,
    pub user_id: String,
    /// Display name supplied by the caller at creation.
    pub username: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
    pub imported_at: Option<u64>,
    pub deleted: bool,
    pub legacy_id: Option<u64>,
}

fn validate_title(title: &str) -> Result<()> {
    if title.len() > MAX_NAME_SIZE {
        return Err(ForumError::invalid_input(format!(
            "Post title exceeds maximum size of {} bytes",
            MAX_NAME_SIZE
        )));
    }
    Ok(())
}

fn validate_body(body: &str) -> Result<()> {
    if body.len() > MAX_POST_BODY_SIZE {
        return Err(ForumError::invalid_input(format!(
            "Post body exceeds maximum size of {} bytes",
            MAX_POST_BODY_SIZE
        )));
    }
    Ok(())
}

/// Input for creating or importing a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub thread_id: String,
    pub title: String,
    pub body: String,
    pub user_id: String,
    pub username: Option<String>,
}

impl NewPost {
    pub fn new(
        thread_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            title: title.into(),
            body: body.into(),
            user_id: user_id.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.is_empty() {
            return Err(ForumError::invalid_input("Post requires a user_id"));
        }
        validate_title(&self.title)?;
        validate_body(&self.body)
    }
}

/// A partial post update. Absent fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl PostUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(body) = &self.body {
            validate_body(body)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(body) = &self.body {
            post.body = body.clone();
        }
    }
}
