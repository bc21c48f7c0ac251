mod common;

use ada_core::clock::{local_date_start_ms, parse_date};
use ada_core::db::open_db_in_memory;
use ada_core::model::feedback::NewFeedback;
use ada_core::model::validation::ValidationError;
use ada_core::repo::feedback_repo::SqliteFeedbackRepository;
use ada_core::service::feedback_service::{FeedbackError, FeedbackFilter, FeedbackService};
use common::{requester, volunteer};

fn input(kind: i64, content: &str) -> NewFeedback {
    NewFeedback {
        content: Some(content.to_string()),
        kind: Some(kind),
        phone: Some("13900001111".to_string()),
        name: Some("Lin".to_string()),
    }
}

fn at(date: &str, hour: i64) -> i64 {
    local_date_start_ms(parse_date(date).unwrap()).unwrap() + hour * 60 * 60 * 1000
}

#[test]
fn date_range_covers_whole_end_day() {
    let conn = open_db_in_memory().unwrap();
    let user = requester(&conn);
    let service = FeedbackService::new(SqliteFeedbackRepository::new(&conn));

    service.submit(user.id, &input(0, "before"), at("2024-05-01", 23)).unwrap();
    service.submit(user.id, &input(1, "start"), at("2024-05-02", 0)).unwrap();
    service.submit(user.id, &input(2, "late on end"), at("2024-05-03", 23)).unwrap();
    service.submit(user.id, &input(1, "after"), at("2024-05-04", 0)).unwrap();

    let filter = FeedbackFilter {
        kind: None,
        start_date: Some("2024-05-02".to_string()),
        end_date: Some("2024-05-03".to_string()),
    };
    let found = service.list_for_user(user.id, user.id, &filter).unwrap();
    let contents: Vec<_> = found.iter().map(|item| item.content.as_str()).collect();
    assert_eq!(contents, vec!["late on end", "start"]);

    let kind_one = FeedbackFilter {
        kind: Some(1),
        ..filter
    };
    assert_eq!(
        service.list_for_user(user.id, user.id, &kind_one).unwrap().len(),
        1
    );
}

#[test]
fn half_open_range_is_ignored() {
    let conn = open_db_in_memory().unwrap();
    let user = requester(&conn);
    let service = FeedbackService::new(SqliteFeedbackRepository::new(&conn));

    service.submit(user.id, &input(0, "one"), at("2024-01-01", 8)).unwrap();
    service.submit(user.id, &input(0, "two"), at("2024-06-01", 8)).unwrap();

    let filter = FeedbackFilter {
        start_date: Some("2024-05-01".to_string()),
        ..FeedbackFilter::default()
    };
    assert_eq!(service.list_for_user(user.id, user.id, &filter).unwrap().len(), 2);
}

#[test]
fn viewers_only_read_their_own_feedback() {
    let conn = open_db_in_memory().unwrap();
    let owner = requester(&conn);
    let other = volunteer(&conn);
    let service = FeedbackService::new(SqliteFeedbackRepository::new(&conn));
    service.submit(owner.id, &input(0, "mine"), 1).unwrap();

    assert!(matches!(
        service.list_for_user(other.id, owner.id, &FeedbackFilter::default()),
        Err(FeedbackError::NotOwner)
    ));
}

#[test]
fn submit_validates_input() {
    let conn = open_db_in_memory().unwrap();
    let user = requester(&conn);
    let service = FeedbackService::new(SqliteFeedbackRepository::new(&conn));

    let too_long = input(0, &"x".repeat(201));
    assert!(matches!(
        service.submit(user.id, &too_long, 1),
        Err(FeedbackError::Validation(ValidationError::TooLong { .. }))
    ));

    let bad_date = FeedbackFilter {
        start_date: Some("2024/05/01".to_string()),
        end_date: Some("2024-05-02".to_string()),
        kind: None,
    };
    assert!(matches!(
        service.list_for_user(user.id, user.id, &bad_date),
        Err(FeedbackError::Validation(ValidationError::InvalidDate(_)))
    ));
}
