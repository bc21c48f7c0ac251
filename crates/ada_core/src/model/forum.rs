//! Community forum posts and replies.

use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationResult};
use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type ReplyId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub kind: i64,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub created_at: i64,
    pub likes: i64,
}

/// List row: post plus reply count and author nickname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub reply_count: i64,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: ReplyId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: i64,
    pub likes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    #[serde(flatten)]
    pub reply: Reply,
    pub author_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default)]
    pub kind: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NewPost {
    /// Returns trimmed `(title, content)`.
    pub fn validate(&self) -> ValidationResult<(String, String)> {
        let title = require_text("title", self.title.as_deref())?;
        let content = require_text("content", self.content.as_deref())?;
        Ok((title.to_string(), content.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub post_id: PostId,
    pub content: Option<String>,
}
