//! The remote data source talking to a live gateway over a socket

use papertok_common::{
    clock::SystemClock,
    config::AppConfig,
    errors::ErrorCode,
    models::{KnowledgeBaseDraft, NewPaper, PageRequest, PostFilter},
    DataMode, DataSource, EntityStore, MockDataSource, RemoteDataSource,
};
use papertok_gateway::{create_router, AppState};
use std::sync::Arc;
use std::time::Duration;

async fn spawn_gateway() -> RemoteDataSource {
    let source = MockDataSource::new(EntityStore::seeded(), Arc::new(SystemClock::without_delays()));
    let app = create_router(AppState::new(AppConfig::default(), Arc::new(source)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    RemoteDataSource::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}

fn paper(title: &str) -> NewPaper {
    NewPaper {
        title: title.into(),
        authors: vec!["A. Author".into()],
        abstract_text: String::new(),
        publish_date: "2024".into(),
        doi: None,
        url: None,
    }
}

#[tokio::test]
async fn users_and_follows_over_http() {
    let remote = spawn_gateway().await;
    assert_eq!(remote.mode(), DataMode::Remote);

    assert_eq!(remote.get_current_user().await.unwrap().id, 0);
    assert!(remote.follow_user(2).await.unwrap());
    assert!(remote.is_following(2).await.unwrap());
    assert!(!remote.follow_user(2).await.unwrap());

    let following = remote.get_following_list().await.unwrap();
    assert_eq!(following.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);

    let by_name = remote.get_user_by_username("用户1").await.unwrap();
    assert_eq!(by_name.id, 1);
}

#[tokio::test]
async fn knowledge_bases_over_http() {
    let remote = spawn_gateway().await;

    assert_eq!(remote.get_knowledge_base(999).await.unwrap(), None);

    let err = remote
        .add_paper_to_knowledge_base(999, paper("nowhere"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::KnowledgeBaseNotFound);

    let created = remote
        .create_knowledge_base_with_papers(KnowledgeBaseDraft {
            title: "Remote".into(),
            description: String::new(),
            papers: vec![paper("one"), paper("two")],
            tags: vec![],
        })
        .await
        .unwrap();
    assert_eq!(created.user_id, 0);
    assert_eq!(created.papers.len(), 2);

    let mine = remote.get_user_knowledge_bases(0).await.unwrap();
    assert_eq!(mine.last().unwrap().id, created.id);

    let hits = remote.search_papers("transformers").await.unwrap();
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn blank_search_matches_mock_over_http() {
    let remote = spawn_gateway().await;
    let mock = MockDataSource::new(EntityStore::seeded(), Arc::new(SystemClock::without_delays()));

    for query in ["", "   ", "\t"] {
        let local = mock.search_papers(query).await.unwrap();
        let over_http = remote.search_papers(query).await.unwrap();
        assert!(local.is_empty());
        assert_eq!(over_http, local);
    }

    let local = mock.search_papers("graphs").await.unwrap();
    let over_http = remote.search_papers("graphs").await.unwrap();
    assert_eq!(over_http, local);
}

#[tokio::test]
async fn messages_and_moderation_over_http() {
    let remote = spawn_gateway().await;

    let sent = remote.send_message(0, 1, "hello over http").await.unwrap();
    assert!(!sent.is_read);
    let thread = remote.get_messages(0, 1).await.unwrap();
    assert_eq!(thread.last().unwrap().id, sent.id);

    assert!(remote.mark_messages_as_read(0, 2).await.unwrap());
    let inbox = remote.get_conversations(0).await.unwrap();
    assert!(inbox.iter().all(|c| c.unread_count == 0));

    let err = remote.send_message(0, 1, "").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationFailed);

    let pending = remote
        .list_posts(PostFilter::Pending, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(pending.total, 2);

    let approved = remote.approve_post(2).await.unwrap();
    assert!(approved.is_approved);
    tokio_test::assert_ok!(remote.delete_comment(1).await);
    assert_eq!(remote.get_post_comments(1).await.unwrap().len(), 1);
}
