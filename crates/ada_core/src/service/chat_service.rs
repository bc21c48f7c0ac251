//! Per-request chat service.
//!
//! # Invariants
//! - Only the requester and the assigned volunteer can read or post.
//! - Only the sender can delete a message.

use crate::model::chat::{ChatMessage, ChatMessageView, MessageId, NewChatMessage};
use crate::model::request::{HelpRequest, RequestId};
use crate::model::user::UserId;
use crate::model::validation::{require_text, ValidationError};
use crate::repo::chat_repo::ChatRepository;
use crate::repo::request_repo::RequestRepository;
use crate::repo::RepoError;
use crate::service::ErrorKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ChatError {
    Validation(ValidationError),
    RequestNotFound(RequestId),
    MessageNotFound(MessageId),
    NotParticipant,
    NotSender,
    Repo(RepoError),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::RequestNotFound(_) | Self::MessageNotFound(_) => ErrorKind::NotFound,
            Self::NotParticipant | Self::NotSender => ErrorKind::Forbidden,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::RequestNotFound(id) => write!(f, "help request not found: {id}"),
            Self::MessageNotFound(id) => write!(f, "chat message not found: {id}"),
            Self::NotParticipant => write!(f, "only the requester and volunteer can chat here"),
            Self::NotSender => write!(f, "only the sender may delete this message"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ChatError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ChatError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "chat message",
                id,
            } => Self::MessageNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

pub struct ChatService<C: ChatRepository, Q: RequestRepository> {
    messages: C,
    requests: Q,
}

impl<C: ChatRepository, Q: RequestRepository> ChatService<C, Q> {
    pub fn new(messages: C, requests: Q) -> Self {
        Self { messages, requests }
    }

    /// Messages of one request, oldest first.
    pub fn history(
        &self,
        viewer: UserId,
        request_id: RequestId,
    ) -> ChatResult<Vec<ChatMessageView>> {
        self.require_participant(viewer, request_id)?;
        Ok(self.messages.list_for_request(request_id)?)
    }

    pub fn send(
        &self,
        sender: UserId,
        input: &NewChatMessage,
        now_ms: i64,
    ) -> ChatResult<ChatMessage> {
        let content = require_text("content", input.content.as_deref())?;
        self.require_participant(sender, input.request_id)?;
        Ok(self
            .messages
            .create_message(input.request_id, sender, content, now_ms)?)
    }

    pub fn delete(&self, caller: UserId, message_id: MessageId) -> ChatResult<()> {
        let message = self
            .messages
            .get_message(message_id)?
            .ok_or(ChatError::MessageNotFound(message_id))?;
        if message.sender_id != caller {
            return Err(ChatError::NotSender);
        }
        Ok(self.messages.delete_message(message_id)?)
    }

    fn require_participant(&self, user: UserId, request_id: RequestId) -> ChatResult<HelpRequest> {
        let request = self
            .requests
            .get_request(request_id)?
            .ok_or(ChatError::RequestNotFound(request_id))?;
        if request.requester_id != user && request.volunteer_id != Some(user) {
            return Err(ChatError::NotParticipant);
        }
        Ok(request)
    }
}
