//! Forum use-case service.
//!
//! # Invariants
//! - Only the author may delete a post or reply.
//! - Replies and reply listings require an existing post.

use crate::model::forum::{NewPost, NewReply, Post, PostId, PostSummary, Reply, ReplyId, ReplyView};
use crate::model::page::{Page, PageRequest};
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use crate::repo::forum_repo::ForumRepository;
use crate::repo::RepoError;
use crate::service::ErrorKind;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ForumError {
    Validation(ValidationError),
    PostNotFound(PostId),
    ReplyNotFound(ReplyId),
    /// Caller is not the author of the target.
    NotAuthor,
    Repo(RepoError),
}

impl ForumError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::PostNotFound(_) | Self::ReplyNotFound(_) => ErrorKind::NotFound,
            Self::NotAuthor => ErrorKind::Forbidden,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for ForumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PostNotFound(id) => write!(f, "post not found: {id}"),
            Self::ReplyNotFound(id) => write!(f, "reply not found: {id}"),
            Self::NotAuthor => write!(f, "only the author may delete this"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ForumError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ForumError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ForumError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "post", id } => Self::PostNotFound(id),
            RepoError::NotFound { entity: "reply", id } => Self::ReplyNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ForumResult<T> = Result<T, ForumError>;

/// Forum service facade over a repository implementation.
pub struct ForumService<R: ForumRepository> {
    repo: R,
}

impl<R: ForumRepository> ForumService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn publish_post(&self, author: UserId, input: &NewPost, now_ms: i64) -> ForumResult<Post> {
        let (title, content) = input.validate()?;
        let post = self
            .repo
            .create_post(author, input.kind, &title, &content, now_ms)?;
        info!(
            "event=post_publish module=forum status=ok post_id={} author_id={}",
            post.id, author
        );
        Ok(post)
    }

    pub fn reply(&self, author: UserId, input: &NewReply, now_ms: i64) -> ForumResult<Reply> {
        let content = require_text("content", input.content.as_deref())?;
        self.require_post(input.post_id)?;
        Ok(self
            .repo
            .create_reply(input.post_id, author, content, now_ms)?)
    }

    pub fn list_posts(
        &self,
        kind: Option<i64>,
        page: PageRequest,
    ) -> ForumResult<Page<PostSummary>> {
        Ok(self.repo.list_posts(kind, page)?)
    }

    pub fn list_replies(&self, post_id: PostId, page: PageRequest) -> ForumResult<Page<ReplyView>> {
        self.require_post(post_id)?;
        Ok(self.repo.list_replies(post_id, page)?)
    }

    pub fn delete_post(&self, caller: UserId, post_id: PostId) -> ForumResult<()> {
        let post = self.require_post(post_id)?;
        if post.author_id != caller {
            return Err(ForumError::NotAuthor);
        }
        self.repo.delete_post(post_id)?;
        info!(
            "event=post_delete module=forum status=ok post_id={} author_id={}",
            post_id, caller
        );
        Ok(())
    }

    pub fn delete_reply(&self, caller: UserId, reply_id: ReplyId) -> ForumResult<()> {
        let reply = self
            .repo
            .get_reply(reply_id)?
            .ok_or(ForumError::ReplyNotFound(reply_id))?;
        if reply.author_id != caller {
            return Err(ForumError::NotAuthor);
        }
        Ok(self.repo.delete_reply(reply_id)?)
    }

    /// Returns the new like count.
    pub fn like_post(&self, post_id: PostId) -> ForumResult<i64> {
        Ok(self.repo.like_post(post_id)?)
    }

    /// Returns the new like count.
    pub fn like_reply(&self, reply_id: ReplyId) -> ForumResult<i64> {
        Ok(self.repo.like_reply(reply_id)?)
    }

    fn require_post(&self, post_id: PostId) -> ForumResult<Post> {
        self.repo
            .get_post(post_id)?
            .ok_or(ForumError::PostNotFound(post_id))
    }
}
