mod common;

use ada_core::clock::{local_day_start_ms, now_ms};
use ada_core::db::open_db_in_memory;
use ada_core::model::page::PageRequest;
use ada_core::model::store::NewStoreItem;
use ada_core::service::sign_in_service::{SignInError, SignInService};
use ada_core::service::store_service::{StoreError, StoreService};
use ada_core::service::ErrorKind;
use common::{requester, score_of, set_score, volunteer};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn item(name: &str, price: i64, stock: Option<i64>) -> NewStoreItem {
    NewStoreItem {
        name: name.to_string(),
        info: None,
        price,
        stock,
        image: None,
    }
}

#[test]
fn sign_in_once_per_day_with_streak() {
    let conn = open_db_in_memory().unwrap();
    let user = volunteer(&conn);
    let service = SignInService::new(&conn);

    let today_noon = local_day_start_ms(now_ms()) + 12 * 60 * 60 * 1000;
    let yesterday_noon = today_noon - DAY_MS;

    service.sign_in_at(user.id, yesterday_noon).unwrap();
    let status = service.status(user.id, today_noon).unwrap();
    assert!(!status.signed_today);
    assert_eq!(status.streak, 1);

    service.sign_in_at(user.id, today_noon).unwrap();
    let err = service.sign_in_at(user.id, today_noon + 60_000).unwrap_err();
    assert!(matches!(err, SignInError::AlreadySignedIn));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let status = service.status(user.id, today_noon).unwrap();
    assert!(status.signed_today);
    assert_eq!(status.streak, 2);
    assert_eq!(status.score, 2);
    assert_eq!(score_of(&conn, &user), 2);

    let records = service.records(user.id, PageRequest::default()).unwrap();
    assert_eq!(records.total, 2);
    assert_eq!(records.records[0].signed_at, today_noon);
}

#[test]
fn exchange_debits_points_and_stock_in_one_step() {
    let conn = open_db_in_memory().unwrap();
    let buyer = volunteer(&conn);
    set_score(&conn, &buyer, 12);
    let store = StoreService::new(&conn);
    let mug = store.add_item(&item("mug", 5, Some(1))).unwrap();

    let exchange = store.exchange(&buyer, mug.id, 1_000).unwrap();
    assert_eq!(exchange.item_name, "mug");
    assert_eq!(exchange.points, 5);
    assert_eq!(score_of(&conn, &buyer), 7);

    let err = store.exchange(&buyer, mug.id, 2_000).unwrap_err();
    assert!(matches!(err, StoreError::OutOfStock(_)));
    assert_eq!(score_of(&conn, &buyer), 7);

    let history = store
        .exchange_history(buyer.id, PageRequest::default())
        .unwrap();
    assert_eq!(history.total, 1);
}

#[test]
fn exchange_rejects_insufficient_points_and_requesters() {
    let conn = open_db_in_memory().unwrap();
    let buyer = volunteer(&conn);
    let other = requester(&conn);
    set_score(&conn, &buyer, 3);
    let store = StoreService::new(&conn);
    let blanket = store.add_item(&item("blanket", 10, None)).unwrap();

    let err = store.exchange(&buyer, blanket.id, 1).unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientPoints {
            balance: 3,
            price: 10
        }
    ));
    assert_eq!(score_of(&conn, &buyer), 3);

    assert!(matches!(
        store.list_items(&other),
        Err(StoreError::VolunteersOnly)
    ));
    assert!(matches!(
        store.exchange(&buyer, 404, 1),
        Err(StoreError::ItemNotFound(404))
    ));
}

#[test]
fn seeding_only_fills_an_empty_catalog() {
    let conn = open_db_in_memory().unwrap();
    let viewer = volunteer(&conn);
    let store = StoreService::new(&conn);

    let seed = vec![item("cheap", 1, None), item("pricey", 50, Some(3))];
    assert_eq!(store.seed_if_empty(&seed).unwrap(), 2);
    assert_eq!(store.seed_if_empty(&seed).unwrap(), 0);

    let names: Vec<_> = store
        .list_items(&viewer)
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(names, vec!["cheap", "pricey"]);
}
