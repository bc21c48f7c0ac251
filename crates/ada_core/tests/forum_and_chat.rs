mod common;

use ada_core::db::open_db_in_memory;
use ada_core::model::chat::NewChatMessage;
use ada_core::model::forum::{NewPost, NewReply};
use ada_core::model::page::PageRequest;
use ada_core::model::request::NewHelpRequest;
use ada_core::model::validation::ValidationError;
use ada_core::repo::chat_repo::SqliteChatRepository;
use ada_core::repo::forum_repo::SqliteForumRepository;
use ada_core::repo::request_repo::SqliteRequestRepository;
use ada_core::service::chat_service::{ChatError, ChatService};
use ada_core::service::forum_service::{ForumError, ForumService};
use ada_core::service::request_service::RequestService;
use common::{register, requester, volunteer, NOW};

fn post(kind: i64, title: &str) -> NewPost {
    NewPost {
        kind,
        title: Some(title.to_string()),
        content: Some("body".to_string()),
    }
}

fn reply(post_id: i64, content: &str) -> NewReply {
    NewReply {
        post_id,
        content: Some(content.to_string()),
    }
}

#[test]
fn posts_list_newest_first_with_counts_and_names() {
    let conn = open_db_in_memory().unwrap();
    let amy = requester(&conn);
    let forum = ForumService::new(SqliteForumRepository::new(&conn));

    let older = forum.publish_post(amy.id, &post(0, "older"), NOW).unwrap();
    let newer = forum.publish_post(amy.id, &post(1, "newer"), NOW + 1).unwrap();
    forum.reply(amy.id, &reply(older.id, "first!"), NOW + 2).unwrap();
    forum.reply(amy.id, &reply(older.id, "second"), NOW + 3).unwrap();

    let page = forum.list_posts(None, PageRequest::default()).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.records[0].post.id, newer.id);
    assert_eq!(page.records[1].reply_count, 2);
    assert_eq!(page.records[1].author_name, "requester");

    let kind_one = forum.list_posts(Some(1), PageRequest::default()).unwrap();
    assert_eq!(kind_one.total, 1);
    assert_eq!(kind_one.records[0].post.title, "newer");

    let second_page = forum
        .list_posts(None, PageRequest::new(Some(2), Some(1)))
        .unwrap();
    assert_eq!(second_page.records.len(), 1);
    assert_eq!(second_page.records[0].post.id, older.id);

    let replies = forum.list_replies(older.id, PageRequest::default()).unwrap();
    let contents: Vec<_> = replies
        .records
        .iter()
        .map(|view| view.reply.content.as_str())
        .collect();
    assert_eq!(contents, vec!["first!", "second"]);
}

#[test]
fn post_validation_and_missing_targets() {
    let conn = open_db_in_memory().unwrap();
    let amy = requester(&conn);
    let forum = ForumService::new(SqliteForumRepository::new(&conn));

    let blank = NewPost {
        title: Some("  ".to_string()),
        ..post(0, "x")
    };
    assert!(matches!(
        forum.publish_post(amy.id, &blank, NOW),
        Err(ForumError::Validation(ValidationError::BlankField("title")))
    ));
    assert!(matches!(
        forum.reply(amy.id, &reply(99, "hi"), NOW),
        Err(ForumError::PostNotFound(99))
    ));
    assert!(matches!(forum.like_post(99), Err(ForumError::PostNotFound(99))));
    assert!(matches!(
        forum.list_replies(99, PageRequest::default()),
        Err(ForumError::PostNotFound(99))
    ));
}

#[test]
fn only_author_deletes_and_post_delete_cascades() {
    let conn = open_db_in_memory().unwrap();
    let amy = requester(&conn);
    let bob = volunteer(&conn);
    let forum = ForumService::new(SqliteForumRepository::new(&conn));

    let created = forum.publish_post(amy.id, &post(0, "hello"), NOW).unwrap();
    let bobs_reply = forum.reply(bob.id, &reply(created.id, "hey"), NOW).unwrap();

    assert!(matches!(
        forum.delete_post(bob.id, created.id),
        Err(ForumError::NotAuthor)
    ));
    assert!(matches!(
        forum.delete_reply(amy.id, bobs_reply.id),
        Err(ForumError::NotAuthor)
    ));

    forum.delete_post(amy.id, created.id).unwrap();
    assert!(matches!(
        forum.delete_reply(bob.id, bobs_reply.id),
        Err(ForumError::ReplyNotFound(_))
    ));
}

#[test]
fn likes_increment_atomically() {
    let conn = open_db_in_memory().unwrap();
    let amy = requester(&conn);
    let forum = ForumService::new(SqliteForumRepository::new(&conn));

    let created = forum.publish_post(amy.id, &post(0, "hello"), NOW).unwrap();
    let created_reply = forum.reply(amy.id, &reply(created.id, "r"), NOW).unwrap();

    assert_eq!(forum.like_post(created.id).unwrap(), 1);
    assert_eq!(forum.like_post(created.id).unwrap(), 2);
    assert_eq!(forum.like_reply(created_reply.id).unwrap(), 1);
}

#[test]
fn chat_is_limited_to_participants() {
    let conn = open_db_in_memory().unwrap();
    let alice = requester(&conn);
    let victor = volunteer(&conn);
    let eve = register(&conn, "eve", "13800000009", 1);

    let requests = RequestService::new(&conn);
    let request = requests
        .publish(
            &alice,
            &NewHelpRequest {
                content: "call".to_string(),
                is_online: Some(1),
                ..NewHelpRequest::default()
            },
            NOW,
        )
        .unwrap();
    requests.accept(&victor, request.id).unwrap();

    let chat = ChatService::new(
        SqliteChatRepository::new(&conn),
        SqliteRequestRepository::new(&conn),
    );
    let message = |content: &str| NewChatMessage {
        request_id: request.id,
        content: Some(content.to_string()),
    };

    chat.send(alice.id, &message("hello"), NOW).unwrap();
    let sent = chat.send(victor.id, &message("on my way"), NOW + 1).unwrap();

    assert!(matches!(
        chat.send(eve.id, &message("hi"), NOW),
        Err(ChatError::NotParticipant)
    ));
    assert!(matches!(
        chat.history(eve.id, request.id),
        Err(ChatError::NotParticipant)
    ));
    assert!(matches!(
        chat.send(alice.id, &message(" "), NOW),
        Err(ChatError::Validation(_))
    ));

    let history = chat.history(alice.id, request.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].sender_name, "volunteer");

    assert!(matches!(
        chat.delete(alice.id, sent.id),
        Err(ChatError::NotSender)
    ));
    chat.delete(victor.id, sent.id).unwrap();
    assert_eq!(chat.history(victor.id, request.id).unwrap().len(), 1);
    assert!(matches!(
        chat.history(alice.id, 999),
        Err(ChatError::RequestNotFound(999))
    ));
}
