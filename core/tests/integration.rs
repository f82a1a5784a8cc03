//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `AuthFlow` and
//! `TaskStore` over real HTTP through `ReqwestTransport`. Validates that the
//! request layer, the outcome classification and the merge rules agree with
//! an actual server.

use std::sync::Arc;
use std::time::Duration;

use mock_server::AppState;
use tasks_core::{
    ApiClient, AuthError, AuthFlow, ClientConfig, FileStorage, ReqwestTransport, ServerStatus, SessionStore,
    TaskDraft, TaskError, TaskPriority, TaskStatus, TaskStore,
};

struct Harness {
    auth: AuthFlow,
    tasks: TaskStore,
    session: Arc<SessionStore>,
    server: AppState,
}

/// Start a fresh mock server and wire a client to it.
async fn harness(session: SessionStore) -> Harness {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = AppState::new();
    tokio::spawn(mock_server::serve(listener, server.clone()));

    let config = ClientConfig::default()
        .with_base_url(&format!("http://{addr}"))
        .with_timeout(Duration::from_secs(5));
    let session = Arc::new(session);
    let client = Arc::new(ApiClient::new(
        &config,
        Arc::new(ReqwestTransport::new()),
        Arc::clone(&session),
    ));

    Harness {
        auth: AuthFlow::new(Arc::clone(&client)),
        tasks: TaskStore::new(client),
        session,
        server,
    }
}

async fn signed_in_harness() -> Harness {
    let h = harness(SessionStore::in_memory()).await;
    h.auth.sign_up("u@x.com", "abc1234", "abc1234").await.unwrap();
    h.auth.sign_in("u@x.com", "abc1234").await.unwrap();
    h
}

#[tokio::test]
async fn sign_up_then_sign_in() {
    let h = harness(SessionStore::in_memory()).await;

    h.auth.sign_up("u@x.com", "abc1234", "abc1234").await.unwrap();
    assert!(!h.session.is_authenticated());

    let session = h.auth.sign_in("u@x.com", "abc1234").await.unwrap();
    assert_eq!(h.session.get(), Some(session.token));
    assert_eq!(session.email.as_deref(), Some("u@x.com"));
}

#[tokio::test]
async fn duplicate_sign_up_reports_server_message() {
    let h = harness(SessionStore::in_memory()).await;
    h.auth.sign_up("u@x.com", "abc1234", "abc1234").await.unwrap();

    let err = h.auth.sign_up("u@x.com", "abc1234", "abc1234").await.unwrap_err();
    assert_eq!(
        err,
        AuthError::Rejected {
            status: 400,
            message: "Error: Username is already taken!".to_string()
        }
    );
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let h = harness(SessionStore::in_memory()).await;
    h.auth.sign_up("u@x.com", "abc1234", "abc1234").await.unwrap();

    let err = h.auth.sign_in("u@x.com", "wrong-password").await.unwrap_err();
    assert_eq!(
        err,
        AuthError::Rejected {
            status: 401,
            message: "Bad credentials".to_string()
        }
    );
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn task_lifecycle() {
    let h = signed_in_harness().await;

    h.tasks.initialize().await.unwrap();
    assert_eq!(h.tasks.server_status(), ServerStatus::Online);
    assert!(h.tasks.tasks().is_empty());

    let milk = h.tasks.create("Buy milk", "").await.unwrap().unwrap();
    let dog = h.tasks.create("Walk dog", "before dinner").await.unwrap().unwrap();
    assert_eq!(milk.status, TaskStatus::Pending);
    assert_eq!(milk.priority, TaskPriority::Medium);
    assert_eq!(h.tasks.tasks().ids(), vec![milk.id, dog.id]);

    let toggled = h.tasks.toggle_complete(milk.id).await.unwrap();
    assert_eq!(toggled.status, TaskStatus::Completed);
    assert_eq!(toggled.created_at, milk.created_at);

    let mut draft = TaskDraft::from_task(&h.tasks.task(dog.id).unwrap());
    draft.title = "Walk the dog".to_string();
    draft.priority = TaskPriority::High;
    let edited = h.tasks.commit_draft(&draft).await.unwrap().unwrap();
    assert_eq!(edited.title, "Walk the dog");
    assert_eq!(edited.description, "before dinner");
    assert_eq!(h.tasks.tasks().ids(), vec![milk.id, dog.id]);

    h.tasks.delete(milk.id).await.unwrap();
    assert_eq!(h.tasks.tasks().ids(), vec![dog.id]);

    // The server agrees with the cache.
    let cached = h.tasks.tasks();
    h.tasks.load().await.unwrap();
    assert_eq!(h.tasks.tasks(), cached);
}

#[tokio::test]
async fn revoked_token_signs_the_client_out() {
    let h = signed_in_harness().await;
    h.tasks.create("Buy milk", "").await.unwrap();

    h.server.revoke_tokens().await;
    assert_eq!(h.tasks.load().await, Err(TaskError::AuthExpired));
    assert!(!h.tasks.is_signed_in());
    assert_eq!(h.tasks.tasks().len(), 1);

    assert_eq!(h.tasks.load().await, Err(TaskError::NoSession));

    h.auth.sign_in("u@x.com", "abc1234").await.unwrap();
    h.tasks.load().await.unwrap();
    assert_eq!(h.tasks.tasks().len(), 1);
}

#[tokio::test]
async fn token_survives_client_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::default();
    let h = harness(SessionStore::open(FileStorage::new(dir.path()), &config)).await;
    h.auth.sign_up("u@x.com", "abc1234", "abc1234").await.unwrap();
    let session = h.auth.sign_in("u@x.com", "abc1234").await.unwrap();

    let restored = SessionStore::open(FileStorage::new(dir.path()), &config);
    assert!(dir.path().join("token").exists());
    assert_eq!(restored.get(), Some(session.token));
}

#[tokio::test]
async fn unreachable_server_is_offline() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let session = Arc::new(SessionStore::in_memory());
    session.set("T1");
    let config = ClientConfig::default().with_base_url(&format!("http://{addr}"));
    let client = Arc::new(ApiClient::new(&config, Arc::new(ReqwestTransport::new()), session));
    let store = TaskStore::new(Arc::clone(&client));

    let err = store.initialize().await.unwrap_err();
    assert!(err.is_network_class());
    assert_eq!(store.server_status(), ServerStatus::Offline);

    let err = AuthFlow::new(client).sign_in("u@x.com", "abc1234").await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
}
