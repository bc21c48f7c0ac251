#![allow(dead_code)]

use ada_core::model::user::User;
use ada_core::service::account_service::{AccountService, Registration};
use rusqlite::Connection;

pub const NOW: i64 = 1_700_000_000_000;

pub fn register(conn: &Connection, name: &str, phone: &str, user_type: i64) -> User {
    AccountService::new(conn)
        .register(&Registration {
            name: Some(name.to_string()),
            password: Some("secret".to_string()),
            phone: Some(phone.to_string()),
            user_type: Some(user_type),
        })
        .unwrap()
}

pub fn requester(conn: &Connection) -> User {
    register(conn, "requester", "13800000001", 0)
}

pub fn volunteer(conn: &Connection) -> User {
    register(conn, "volunteer", "13800000002", 1)
}

pub fn score_of(conn: &Connection, user: &User) -> i64 {
    conn.query_row("SELECT score FROM users WHERE id = ?1;", [user.id], |row| {
        row.get(0)
    })
    .unwrap()
}

pub fn set_score(conn: &Connection, user: &User, score: i64) {
    conn.execute(
        "UPDATE users SET score = ?2 WHERE id = ?1;",
        [user.id, score],
    )
    .unwrap();
}
