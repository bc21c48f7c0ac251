//! Per-request chat between requester and volunteer.

use crate::model::request::RequestId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub request_id: RequestId,
    pub sender_id: UserId,
    pub content: String,
    pub sent_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageView {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub sender_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatMessage {
    pub request_id: RequestId,
    pub content: Option<String>,
}
