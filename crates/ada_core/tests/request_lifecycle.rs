mod common;

use ada_core::db::open_db_in_memory;
use ada_core::model::request::{
    HelpRequest, LifecycleError, NewHelpRequest, RequestId, RequestStatus, ServiceMode,
    REQUEST_REWARD_POINTS,
};
use ada_core::model::validation::ValidationError;
use ada_core::repo::request_repo::{RequestRepository, SqliteRequestRepository};
use ada_core::service::account_service::AccountService;
use ada_core::service::request_service::{RequestError, RequestListFilter, RequestService};
use ada_core::service::ErrorKind;
use common::{register, requester, score_of, volunteer, NOW};
use rusqlite::Connection;

fn online(content: &str) -> NewHelpRequest {
    NewHelpRequest {
        kind: 1,
        content: content.to_string(),
        urgency: 2,
        address: None,
        is_online: Some(1),
    }
}

fn stored(conn: &Connection, id: RequestId) -> HelpRequest {
    SqliteRequestRepository::new(conn)
        .get_request(id)
        .unwrap()
        .unwrap()
}

#[test]
fn full_lifecycle_credits_volunteer_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let victor = volunteer(&conn);
    let service = RequestService::new(&conn);

    let published = service.publish(&alice, &online("read my mail"), NOW).unwrap();
    assert_eq!(published.status, RequestStatus::Pending);
    assert_eq!(published.score, REQUEST_REWARD_POINTS);
    assert_eq!(published.mode, ServiceMode::Online);

    let accepted = service.accept(&victor, published.id).unwrap();
    assert_eq!(accepted.volunteer_id, Some(victor.id));
    assert_eq!(accepted.status, RequestStatus::Accepted);

    let done = service
        .volunteer_complete(&victor, published.id, NOW + 10)
        .unwrap();
    assert_eq!(done.status, RequestStatus::AwaitingConfirmation);
    assert_eq!(score_of(&conn, &victor), 0);

    let confirmed = service.confirm(&alice, published.id, 5, NOW + 20).unwrap();
    assert_eq!(confirmed.status, RequestStatus::Completed);
    assert_eq!(confirmed.rating, Some(5));
    assert_eq!(confirmed.solved_at, Some(NOW + 20));
    assert_eq!(score_of(&conn, &victor), REQUEST_REWARD_POINTS);

    let again = service.confirm(&alice, published.id, 5, NOW + 30).unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Conflict);
    assert_eq!(score_of(&conn, &victor), REQUEST_REWARD_POINTS);
}

#[test]
fn publish_enforces_role_and_offline_address() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let victor = volunteer(&conn);
    let service = RequestService::new(&conn);

    assert!(matches!(
        service.publish(&victor, &online("x"), NOW),
        Err(RequestError::WrongRole("requester"))
    ));

    let offline = NewHelpRequest {
        is_online: Some(0),
        ..online("walk to clinic")
    };
    assert!(matches!(
        service.publish(&alice, &offline, NOW),
        Err(RequestError::Validation(ValidationError::MissingAddress))
    ));

    let with_address = NewHelpRequest {
        address: Some(" 3 Elm St ".to_string()),
        ..offline
    };
    let request = service.publish(&alice, &with_address, NOW).unwrap();
    assert_eq!(request.address.as_deref(), Some("3 Elm St"));
    assert_eq!(request.mode, ServiceMode::Offline);
}

#[test]
fn second_volunteer_cannot_take_accepted_request() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let victor = volunteer(&conn);
    let wendy = register(&conn, "wendy", "13800000003", 1);
    let service = RequestService::new(&conn);

    let request = service.publish(&alice, &online("call"), NOW).unwrap();
    service.accept(&victor, request.id).unwrap();

    let err = service.accept(&wendy, request.id).unwrap_err();
    assert!(matches!(
        err,
        RequestError::Lifecycle(LifecycleError::InvalidTransition { action: "accept", .. })
    ));
    assert!(matches!(
        service.volunteer_complete(&wendy, request.id, NOW),
        Err(RequestError::Lifecycle(LifecycleError::NotAssignedVolunteer))
    ));
    assert_eq!(stored(&conn, request.id).volunteer_id, Some(victor.id));
}

#[test]
fn requesters_cannot_accept_and_others_cannot_confirm() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let bella = register(&conn, "bella", "13800000004", 0);
    let victor = volunteer(&conn);
    let service = RequestService::new(&conn);

    let request = service.publish(&alice, &online("call"), NOW).unwrap();
    assert!(matches!(
        service.accept(&bella, request.id),
        Err(RequestError::WrongRole("volunteer"))
    ));

    service.accept(&victor, request.id).unwrap();
    service.volunteer_complete(&victor, request.id, NOW).unwrap();
    let err = service.confirm(&bella, request.id, 4, NOW).unwrap_err();
    assert!(matches!(
        err,
        RequestError::Lifecycle(LifecycleError::NotRequester)
    ));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    assert!(matches!(
        service.confirm(&alice, request.id, 6, NOW),
        Err(RequestError::Validation(ValidationError::OutOfRange { field: "rating", .. }))
    ));
}

#[test]
fn cancel_returns_request_to_pool() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let victor = volunteer(&conn);
    let service = RequestService::new(&conn);

    let request = service.publish(&alice, &online("call"), NOW).unwrap();
    service.accept(&victor, request.id).unwrap();
    let released = service.cancel(&victor, request.id).unwrap();
    assert_eq!(released.status, RequestStatus::Pending);
    assert_eq!(released.volunteer_id, None);

    assert!(matches!(
        service.cancel(&victor, request.id),
        Err(RequestError::Lifecycle(LifecycleError::NotAssignedVolunteer))
    ));
}

#[test]
fn unknown_request_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let victor = volunteer(&conn);
    let err = RequestService::new(&conn).accept(&victor, 404).unwrap_err();
    assert!(matches!(err, RequestError::RequestNotFound(404)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn list_filters_by_participant_status_and_mode() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let bella = register(&conn, "bella", "13800000004", 0);
    let victor = volunteer(&conn);
    let service = RequestService::new(&conn);

    let first = service.publish(&alice, &online("first"), NOW).unwrap();
    let offline = NewHelpRequest {
        is_online: Some(0),
        address: Some("Main St".to_string()),
        ..online("second")
    };
    let second = service.publish(&alice, &offline, NOW + 1).unwrap();
    let third = service.publish(&bella, &online("third"), NOW + 2).unwrap();
    service.accept(&victor, first.id).unwrap();

    let everything = service.list(RequestListFilter::default()).unwrap();
    let ids: Vec<_> = everything.iter().map(|view| view.request.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let mine = service
        .list(RequestListFilter {
            participant: Some(alice.id),
            query_type: Some(3),
            is_online: None,
        })
        .unwrap();
    assert_eq!(mine.len(), 2);

    let pending_online = service
        .list(RequestListFilter {
            participant: None,
            query_type: Some(0),
            is_online: Some(1),
        })
        .unwrap();
    assert_eq!(pending_online.len(), 1);
    assert_eq!(pending_online[0].request.id, third.id);
    assert_eq!(pending_online[0].requester_name, "bella");

    let victors = service
        .list(RequestListFilter {
            participant: Some(victor.id),
            ..RequestListFilter::default()
        })
        .unwrap();
    assert_eq!(victors.len(), 1);
    assert_eq!(victors[0].volunteer_name.as_deref(), Some("volunteer"));

    let unknown_status = service
        .list(RequestListFilter {
            query_type: Some(-1),
            ..RequestListFilter::default()
        })
        .unwrap();
    assert!(unknown_status.is_empty());
}

#[test]
fn volunteer_views_track_accepted_and_history() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let victor = volunteer(&conn);
    let service = RequestService::new(&conn);

    let first = service.publish(&alice, &online("a"), NOW).unwrap();
    let second = service.publish(&alice, &online("b"), NOW + 1).unwrap();
    service.publish(&alice, &online("c"), NOW + 2).unwrap();

    service.accept(&victor, first.id).unwrap();
    service.accept(&victor, second.id).unwrap();
    service.volunteer_complete(&victor, second.id, NOW + 5).unwrap();
    service.confirm(&alice, second.id, 5, NOW + 6).unwrap();

    let in_hand = service.volunteer_accepted(&victor).unwrap();
    assert_eq!(in_hand.len(), 1);
    assert_eq!(in_hand[0].request.id, first.id);

    let records = service.volunteer_records(&victor).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn volunteer_views_are_for_volunteers_only() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let service = RequestService::new(&conn);

    assert!(matches!(
        service.volunteer_records(&alice),
        Err(RequestError::WrongRole("volunteer"))
    ));
    let err = service.volunteer_accepted(&alice).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn deleting_volunteer_returns_open_requests_to_pool() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let victor = volunteer(&conn);
    let wendy = register(&conn, "wendy", "13800000003", 1);
    let service = RequestService::new(&conn);

    let accepted = service.publish(&alice, &online("accepted"), NOW).unwrap();
    let awaiting = service.publish(&alice, &online("awaiting"), NOW + 1).unwrap();
    let finished = service.publish(&alice, &online("finished"), NOW + 2).unwrap();
    for request in [&accepted, &awaiting, &finished] {
        service.accept(&victor, request.id).unwrap();
    }
    service.volunteer_complete(&victor, awaiting.id, NOW + 5).unwrap();
    service.volunteer_complete(&victor, finished.id, NOW + 5).unwrap();
    service.confirm(&alice, finished.id, 4, NOW + 6).unwrap();

    AccountService::new(&conn).delete_user(victor.id).unwrap();

    for id in [accepted.id, awaiting.id] {
        let request = stored(&conn, id);
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.volunteer_id, None);
        assert_eq!(request.solved_at, None);
    }
    assert_eq!(stored(&conn, finished.id).status, RequestStatus::Completed);

    let retaken = service.accept(&wendy, awaiting.id).unwrap();
    assert_eq!(retaken.volunteer_id, Some(wendy.id));
    service.volunteer_complete(&wendy, awaiting.id, NOW + 10).unwrap();
    service.confirm(&alice, awaiting.id, 5, NOW + 11).unwrap();
    assert_eq!(score_of(&conn, &wendy), REQUEST_REWARD_POINTS);
}
