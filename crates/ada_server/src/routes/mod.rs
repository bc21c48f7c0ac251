use axum::{routing::get, Router};
use serde::Serialize;

use crate::{
    response::{ApiResult, Envelope},
    state::AppState,
};

mod chat;
mod feedback;
mod forum;
mod goods;
mod request;
mod sign_in;
mod user;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .merge(user::routes())
        .merge(request::routes())
        .merge(forum::routes())
        .merge(chat::routes())
        .merge(sign_in::routes())
        .merge(goods::routes())
        .merge(feedback::routes())
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> ApiResult<Health> {
    Ok(Envelope::ok(
        Health {
            status: ada_core::ping(),
            version: ada_core::core_version(),
        },
        "ok",
    ))
}
