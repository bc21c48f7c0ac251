//! Chat message persistence.

use crate::model::chat::{ChatMessage, ChatMessageView, MessageId};
use crate::model::request::RequestId;
use crate::model::user::UserId;
use crate::repo::{expect_changed, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait ChatRepository {
    fn create_message(
        &self,
        request_id: RequestId,
        sender_id: UserId,
        content: &str,
        now_ms: i64,
    ) -> RepoResult<ChatMessage>;
    fn get_message(&self, id: MessageId) -> RepoResult<Option<ChatMessage>>;
    /// All messages of one request, oldest first.
    fn list_for_request(&self, request_id: RequestId) -> RepoResult<Vec<ChatMessageView>>;
    fn delete_message(&self, id: MessageId) -> RepoResult<()>;
}

pub struct SqliteChatRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChatRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ChatRepository for SqliteChatRepository<'_> {
    fn create_message(
        &self,
        request_id: RequestId,
        sender_id: UserId,
        content: &str,
        now_ms: i64,
    ) -> RepoResult<ChatMessage> {
        self.conn.execute(
            "INSERT INTO chat_messages (request_id, sender_id, content, sent_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![request_id, sender_id, content, now_ms],
        )?;
        Ok(ChatMessage {
            id: self.conn.last_insert_rowid(),
            request_id,
            sender_id,
            content: content.to_string(),
            sent_at: now_ms,
        })
    }

    fn get_message(&self, id: MessageId) -> RepoResult<Option<ChatMessage>> {
        let message = self
            .conn
            .query_row(
                "SELECT id, request_id, sender_id, content, sent_at
                 FROM chat_messages WHERE id = ?1;",
                [id],
                parse_message_row,
            )
            .optional()?;
        Ok(message)
    }

    fn list_for_request(&self, request_id: RequestId) -> RepoResult<Vec<ChatMessageView>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.id AS id,
                m.request_id AS request_id,
                m.sender_id AS sender_id,
                m.content AS content,
                m.sent_at AS sent_at,
                COALESCE(u.name, '') AS sender_name
             FROM chat_messages m
             LEFT JOIN users u ON u.id = m.sender_id
             WHERE m.request_id = ?1
             ORDER BY m.sent_at ASC, m.id ASC;",
        )?;
        let messages = stmt
            .query_map([request_id], |row| {
                Ok(ChatMessageView {
                    message: parse_message_row(row)?,
                    sender_name: row.get("sender_name")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    fn delete_message(&self, id: MessageId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM chat_messages WHERE id = ?1;", [id])?;
        expect_changed(changed, "chat message", id)
    }
}

fn parse_message_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get("id")?,
        request_id: row.get("request_id")?,
        sender_id: row.get("sender_id")?,
        content: row.get("content")?,
        sent_at: row.get("sent_at")?,
    })
}
