use ada_core::clock::now_ms;
use ada_core::model::page::{Page, PageRequest};
use ada_core::model::store::{Exchange, ItemId, StoreItem};
use ada_core::service::store_service::StoreService;
use axum::{
    extract::{Path, State},
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
        .route("/goods/list", get(list_handler))
        .route("/goods/exchange/{good_id}", post(exchange_handler))
        .route("/goods/exchanges", get(history_handler))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    page: Option<u32>,
    page_size: Option<u32>,
}

async fn list_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<StoreItem>> {
    let items = state
        .run(move |conn| Ok(StoreService::new(conn).list_items(&user)?))
        .await?;
    Ok(Envelope::ok(items, "ok"))
}

async fn exchange_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(good_id): Path<ItemId>,
) -> ApiResult<Exchange> {
    let exchange = state
        .run(move |conn| Ok(StoreService::new(conn).exchange(&user, good_id, now_ms())?))
        .await?;
    Ok(Envelope::ok(exchange, "exchange successful"))
}

async fn history_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(params): Params<PageParams>,
) -> ApiResult<Page<Exchange>> {
    let page = PageRequest::new(params.page, params.page_size);
    let history = state
        .run(move |conn| Ok(StoreService::new(conn).exchange_history(user.id, page)?))
        .await?;
    Ok(Envelope::ok(history, "ok"))
}
