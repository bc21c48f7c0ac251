use ada_core::clock::now_ms;
use ada_core::model::chat::{ChatMessage, ChatMessageView, MessageId, NewChatMessage};
use ada_core::model::request::RequestId;
use ada_core::repo::chat_repo::SqliteChatRepository;
use ada_core::repo::request_repo::SqliteRequestRepository;
use ada_core::service::chat_service::ChatService;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Router,
};
use rusqlite::Connection;

use crate::{
    extract::{CurrentUser, Payload},
    response::{ApiResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/message", post(send_handler))
        .route("/chat/message/{cid}", delete(delete_handler))
        .route("/chat/{rid}", get(history_handler))
}

fn chat(conn: &Connection) -> ChatService<SqliteChatRepository<'_>, SqliteRequestRepository<'_>> {
    ChatService::new(
        SqliteChatRepository::new(conn),
        SqliteRequestRepository::new(conn),
    )
}

async fn history_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(rid): Path<RequestId>,
) -> ApiResult<Vec<ChatMessageView>> {
    let messages = state
        .run(move |conn| Ok(chat(conn).history(user.id, rid)?))
        .await?;
    Ok(Envelope::ok(messages, "ok"))
}

async fn send_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<NewChatMessage>,
) -> ApiResult<ChatMessage> {
    let message = state
        .run(move |conn| Ok(chat(conn).send(user.id, &body, now_ms())?))
        .await?;
    Ok(Envelope::ok(message, "message sent"))
}

async fn delete_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(cid): Path<MessageId>,
) -> ApiResult<()> {
    state
        .run(move |conn| Ok(chat(conn).delete(user.id, cid)?))
        .await?;
    Ok(Envelope::done("message deleted"))
}
