use ada_core::clock::now_ms;
use ada_core::model::forum::{
    NewPost, NewReply, Post, PostId, PostSummary, Reply, ReplyId, ReplyView,
};
use ada_core::model::page::{Page, PageRequest};
use ada_core::repo::forum_repo::SqliteForumRepository;
use ada_core::service::forum_service::ForumService;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Router,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    extract::{CurrentUser, Params, Payload},
    response::{ApiResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/forum/publish", post(publish_handler))
        .route("/forum/reply", post(reply_handler))
        .route("/forum/list", get(list_handler))
        .route("/forum/replies/{post_id}", get(replies_handler))
        .route("/forum/{post_id}", delete(delete_post_handler))
        .route("/forum/reply/{reply_id}", delete(delete_reply_handler))
        .route("/forum/like/{post_id}", put(like_post_handler))
        .route("/forum/reply/like/{reply_id}", put(like_reply_handler))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(rename = "type")]
    kind: Option<i64>,
    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    page: Option<u32>,
    page_size: Option<u32>,
}

fn forum(conn: &Connection) -> ForumService<SqliteForumRepository<'_>> {
    ForumService::new(SqliteForumRepository::new(conn))
}

async fn publish_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<NewPost>,
) -> ApiResult<Post> {
    let post = state
        .run(move |conn| Ok(forum(conn).publish_post(user.id, &body, now_ms())?))
        .await?;
    Ok(Envelope::ok(post, "post published"))
}

async fn reply_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<NewReply>,
) -> ApiResult<Reply> {
    let reply = state
        .run(move |conn| Ok(forum(conn).reply(user.id, &body, now_ms())?))
        .await?;
    Ok(Envelope::ok(reply, "reply posted"))
}

async fn list_handler(
    State(state): State<AppState>,
    Params(params): Params<ListParams>,
) -> ApiResult<Page<PostSummary>> {
    let page = PageRequest::new(params.page, params.page_size);
    let posts = state
        .run(move |conn| Ok(forum(conn).list_posts(params.kind, page)?))
        .await?;
    Ok(Envelope::ok(posts, "ok"))
}

async fn replies_handler(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Params(params): Params<PageParams>,
) -> ApiResult<Page<ReplyView>> {
    let page = PageRequest::new(params.page, params.page_size);
    let replies = state
        .run(move |conn| Ok(forum(conn).list_replies(post_id, page)?))
        .await?;
    Ok(Envelope::ok(replies, "ok"))
}

async fn delete_post_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<()> {
    state
        .run(move |conn| Ok(forum(conn).delete_post(user.id, post_id)?))
        .await?;
    Ok(Envelope::done("post deleted"))
}

async fn delete_reply_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(reply_id): Path<ReplyId>,
) -> ApiResult<()> {
    state
        .run(move |conn| Ok(forum(conn).delete_reply(user.id, reply_id)?))
        .await?;
    Ok(Envelope::done("reply deleted"))
}

async fn like_post_handler(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<i64> {
    let likes = state
        .run(move |conn| Ok(forum(conn).like_post(post_id)?))
        .await?;
    Ok(Envelope::ok(likes, "liked"))
}

async fn like_reply_handler(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(reply_id): Path<ReplyId>,
) -> ApiResult<i64> {
    let likes = state
        .run(move |conn| Ok(forum(conn).like_reply(reply_id)?))
        .await?;
    Ok(Envelope::ok(likes, "liked"))
}
