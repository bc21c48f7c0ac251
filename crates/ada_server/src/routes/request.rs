use ada_core::clock::now_ms;
use ada_core::model::request::{HelpRequest, NewHelpRequest, RequestId, RequestView};
use ada_core::model::user::UserId;
use ada_core::service::request_service::{RequestListFilter, RequestService};
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

use crate::{
    extract::{CurrentUser, Params, Payload},
    response::{ApiResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/request/publish", post(publish_handler))
        .route("/request/accept/{rid}", put(accept_handler))
        .route("/request/complete/{rid}", put(complete_handler))
        .route("/request/complete/{rid}/{rate}", put(confirm_handler))
        .route("/request/cancel/{rid}", put(cancel_handler))
        .route("/request/list", get(list_handler))
        .route("/request/volunteer/records", get(records_handler))
        .route("/request/volunteer/accepted", get(accepted_handler))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    uid: Option<UserId>,
    query_type: Option<i64>,
    is_online: Option<i64>,
}

async fn publish_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<NewHelpRequest>,
) -> ApiResult<HelpRequest> {
    let request = state
        .run(move |conn| Ok(RequestService::new(conn).publish(&user, &body, now_ms())?))
        .await?;
    Ok(Envelope::ok(request, "request published"))
}

async fn accept_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(rid): Path<RequestId>,
) -> ApiResult<HelpRequest> {
    let request = state
        .run(move |conn| Ok(RequestService::new(conn).accept(&user, rid)?))
        .await?;
    Ok(Envelope::ok(request, "request accepted"))
}

async fn complete_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(rid): Path<RequestId>,
) -> ApiResult<HelpRequest> {
    let request = state
        .run(move |conn| Ok(RequestService::new(conn).volunteer_complete(&user, rid, now_ms())?))
        .await?;
    Ok(Envelope::ok(request, "waiting for requester confirmation"))
}

async fn confirm_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((rid, rate)): Path<(RequestId, i64)>,
) -> ApiResult<HelpRequest> {
    let request = state
        .run(move |conn| Ok(RequestService::new(conn).confirm(&user, rid, rate, now_ms())?))
        .await?;
    Ok(Envelope::ok(request, "request completed"))
}

async fn cancel_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(rid): Path<RequestId>,
) -> ApiResult<HelpRequest> {
    let request = state
        .run(move |conn| Ok(RequestService::new(conn).cancel(&user, rid)?))
        .await?;
    Ok(Envelope::ok(request, "request released"))
}

async fn list_handler(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Params(params): Params<ListParams>,
) -> ApiResult<Vec<RequestView>> {
    let filter = RequestListFilter {
        participant: params.uid,
        query_type: params.query_type,
        is_online: params.is_online,
    };
    let views = state
        .run(move |conn| Ok(RequestService::new(conn).list(filter)?))
        .await?;
    Ok(Envelope::ok(views, "ok"))
}

async fn records_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<RequestView>> {
    let views = state
        .run(move |conn| Ok(RequestService::new(conn).volunteer_records(&user)?))
        .await?;
    Ok(Envelope::ok(views, "ok"))
}

async fn accepted_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<RequestView>> {
    let views = state
        .run(move |conn| Ok(RequestService::new(conn).volunteer_accepted(&user)?))
        .await?;
    Ok(Envelope::ok(views, "ok"))
}
