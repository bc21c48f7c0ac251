use ada_core::clock::now_ms;
use ada_core::model::page::{Page, PageRequest};
use ada_core::model::sign_in::{SignInRecord, SignInStatus};
use ada_core::service::sign_in_service::SignInService;
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::{
    extract::{CurrentUser, Params},
    response::{ApiResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signin", post(sign_in_handler))
        .route("/signin/records", get(records_handler))
        .route("/signin/status", get(status_handler))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordParams {
    page_num: Option<u32>,
    page_size: Option<u32>,
}

async fn sign_in_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<SignInRecord> {
    let record = state
        .run(move |conn| Ok(SignInService::new(conn).sign_in_at(user.id, now_ms())?))
        .await?;
    Ok(Envelope::ok(record, "signed in"))
}

async fn records_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(params): Params<RecordParams>,
) -> ApiResult<Page<SignInRecord>> {
    let page = PageRequest::new(params.page_num, params.page_size);
    let records = state
        .run(move |conn| Ok(SignInService::new(conn).records(user.id, page)?))
        .await?;
    Ok(Envelope::ok(records, "ok"))
}

async fn status_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<SignInStatus> {
    let status = state
        .run(move |conn| Ok(SignInService::new(conn).status(user.id, now_ms())?))
        .await?;
    Ok(Envelope::ok(status, "ok"))
}
