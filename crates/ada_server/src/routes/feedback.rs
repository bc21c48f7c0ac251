use ada_core::clock::now_ms;
use ada_core::model::feedback::{Feedback, NewFeedback};
use ada_core::model::user::UserId;
use ada_core::repo::feedback_repo::SqliteFeedbackRepository;
use ada_core::service::feedback_service::{FeedbackFilter, FeedbackService};
use axum::{
    extract::{Path, State},
    routing::{get, post},
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
        .route("/feedback/submit", post(submit_handler))
        .route("/feedback/user/{user_id}", get(list_handler))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(rename = "type")]
    kind: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn submit_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<NewFeedback>,
) -> ApiResult<Feedback> {
    let feedback = state
        .run(move |conn| {
            let service = FeedbackService::new(SqliteFeedbackRepository::new(conn));
            Ok(service.submit(user.id, &body, now_ms())?)
        })
        .await?;
    Ok(Envelope::ok(feedback, "feedback submitted"))
}

async fn list_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<UserId>,
    Params(params): Params<ListParams>,
) -> ApiResult<Vec<Feedback>> {
    let filter = FeedbackFilter {
        kind: params.kind,
        start_date: params.start_date,
        end_date: params.end_date,
    };
    let items = state
        .run(move |conn| {
            let service = FeedbackService::new(SqliteFeedbackRepository::new(conn));
            Ok(service.list_for_user(user.id, user_id, &filter)?)
        })
        .await?;
    Ok(Envelope::ok(items, "ok"))
}
