use ada_core::clock::now_ms;
use ada_core::model::user::{ProfilePatch, User, UserId};
use ada_core::service::account_service::{
    AccountService, Credentials, LoginSession, PasswordChange, Registration,
};
use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;

use crate::{
    error::ApiError,
    extract::{CurrentUser, Params, Payload, SessionToken},
    response::{ApiResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/sendLoginCodeMsg", post(send_code_handler))
        .route("/user/codeMsgLogin", post(code_login_handler))
        .route("/user/register", post(register_handler))
        .route("/user/login", post(login_handler))
        .route("/user/is-login", get(is_login_handler))
        .route("/user/logout", post(logout_handler))
        .route("/user/kickout", post(kickout_handler))
        .route("/user/update-password", put(update_password_handler))
        .route("/user/update-info", put(update_info_handler))
        .route("/user/delete", delete(delete_handler))
        .route("/user/current", get(current_handler))
        .route("/user/query", get(query_handler))
}

#[derive(Deserialize)]
struct PhoneBody {
    #[serde(default)]
    phone: String,
}

#[derive(Deserialize)]
struct CodeBody {
    #[serde(default)]
    phone: String,
    #[serde(default)]
    code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdParams {
    user_id: Option<UserId>,
}

#[derive(Deserialize)]
struct IdParams {
    id: Option<UserId>,
}

/// Rejects actions aimed at another account.
fn require_self(caller: &User, target: Option<UserId>) -> Result<UserId, ApiError> {
    match target {
        Some(id) if id != caller.id => Err(ApiError::Forbidden(
            "you can only perform this action on your own account",
        )),
        _ => Ok(caller.id),
    }
}

fn accounts(conn: &rusqlite::Connection, session_ttl_ms: i64) -> AccountService<'_> {
    AccountService::new(conn).with_session_ttl_ms(session_ttl_ms)
}

async fn send_code_handler(
    State(state): State<AppState>,
    Payload(body): Payload<PhoneBody>,
) -> ApiResult<()> {
    state
        .run(move |conn| {
            AccountService::new(conn).send_login_code(&body.phone, now_ms())?;
            Ok(())
        })
        .await?;
    Ok(Envelope::done("verification code sent"))
}

async fn code_login_handler(
    State(state): State<AppState>,
    Payload(body): Payload<CodeBody>,
) -> ApiResult<LoginSession> {
    let ttl = state.config.session_ttl_ms();
    let session = state
        .run(move |conn| Ok(accounts(conn, ttl).code_login(&body.phone, &body.code, now_ms())?))
        .await?;
    Ok(Envelope::ok(session, "login successful"))
}

async fn register_handler(
    State(state): State<AppState>,
    Payload(body): Payload<Registration>,
) -> ApiResult<User> {
    let user = state
        .run(move |conn| Ok(AccountService::new(conn).register(&body)?))
        .await?;
    Ok(Envelope::ok(user, "registration successful"))
}

async fn login_handler(
    State(state): State<AppState>,
    Payload(body): Payload<Credentials>,
) -> ApiResult<LoginSession> {
    let ttl = state.config.session_ttl_ms();
    let session = state
        .run(move |conn| Ok(accounts(conn, ttl).login(&body, now_ms())?))
        .await?;
    Ok(Envelope::ok(session, "login successful"))
}

async fn is_login_handler(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> ApiResult<bool> {
    let logged_in = match token {
        Some(token) => {
            state
                .run(move |conn| Ok(AccountService::new(conn).is_login(&token, now_ms())?))
                .await?
        }
        None => false,
    };
    let msg = if logged_in { "logged in" } else { "not logged in" };
    Ok(Envelope::ok(logged_in, msg))
}

async fn logout_handler(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> ApiResult<()> {
    let token = token.ok_or(ApiError::Unauthenticated)?;
    state
        .run(move |conn| {
            AccountService::new(conn).logout(&token)?;
            Ok(())
        })
        .await?;
    Ok(Envelope::done("logged out"))
}

async fn kickout_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(params): Params<UserIdParams>,
) -> ApiResult<usize> {
    let target = require_self(&user, params.user_id)?;
    let revoked = state
        .run(move |conn| Ok(AccountService::new(conn).kickout(target)?))
        .await?;
    Ok(Envelope::ok(revoked, "sessions revoked"))
}

async fn update_password_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<PasswordChange>,
) -> ApiResult<()> {
    state
        .run(move |conn| Ok(AccountService::new(conn).update_password(user.id, &body)?))
        .await?;
    Ok(Envelope::done("password updated"))
}

async fn update_info_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<ProfilePatch>,
) -> ApiResult<User> {
    let updated = state
        .run(move |conn| Ok(AccountService::new(conn).update_profile(user.id, &body)?))
        .await?;
    Ok(Envelope::ok(updated, "profile updated"))
}

async fn delete_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Params(params): Params<IdParams>,
) -> ApiResult<()> {
    let target = require_self(&user, params.id)?;
    state
        .run(move |conn| Ok(AccountService::new(conn).delete_user(target)?))
        .await?;
    Ok(Envelope::done("account deleted"))
}

async fn current_handler(CurrentUser(user): CurrentUser) -> ApiResult<User> {
    Ok(Envelope::ok(user, "ok"))
}

async fn query_handler(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Params(params): Params<IdParams>,
) -> ApiResult<Vec<User>> {
    let users = state
        .run(move |conn| Ok(AccountService::new(conn).query_users(params.id)?))
        .await?;
    Ok(Envelope::ok(users, "ok"))
}
