use chrono::{Duration, Utc};
use std::sync::Arc;
use todo_store::{
    AccessToken, DatabaseConfig, EnvironmentCredential, InMemoryDatabase, RepoError,
    StaticCredential, StoreError, StoreGateway, TodoItemRepository, TodoListPatch,
    TodoListRepository,
};

#[test]
fn accessors_fail_before_configure() {
    let gateway = StoreGateway::new();
    assert!(!gateway.is_configured());
    assert!(matches!(
        gateway.list_collection(),
        Err(StoreError::Uninitialized)
    ));
    assert!(matches!(
        gateway.item_collection(),
        Err(StoreError::Uninitialized)
    ));
    assert!(matches!(gateway.database(), Err(StoreError::Uninitialized)));

    let err = TodoListRepository::new(&gateway).err().unwrap();
    assert!(matches!(err, RepoError::Store(StoreError::Uninitialized)));
    let err = TodoItemRepository::new(&gateway).err().unwrap();
    assert!(matches!(err, RepoError::Store(StoreError::Uninitialized)));
}

#[tokio::test]
async fn memory_backend_configures_without_credentials() {
    let gateway = StoreGateway::new();
    let credential = EnvironmentCredential::new("TODO_STORE_TOKEN_NEVER_SET_IN_TESTS");
    gateway
        .configure(&DatabaseConfig::memory(), &credential)
        .await
        .unwrap();
    assert!(gateway.is_configured());
    assert_eq!(gateway.list_collection().unwrap().name(), "TodoList");
    assert_eq!(gateway.item_collection().unwrap().name(), "TodoItem");
}

#[tokio::test]
async fn configure_runs_at_most_once() {
    let gateway = StoreGateway::new();
    let credential = StaticCredential::short_lived("token");
    gateway
        .configure(&DatabaseConfig::memory(), &credential)
        .await
        .unwrap();

    let err = gateway
        .configure(&DatabaseConfig::memory(), &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyConfigured));

    let err = gateway
        .attach(Arc::new(InMemoryDatabase::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyConfigured));
}

#[tokio::test]
async fn document_backend_reports_missing_credential() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = StoreGateway::new();
    let config = DatabaseConfig::document(dir.path().to_str().unwrap(), "Todo");
    let credential = EnvironmentCredential::new("TODO_STORE_TOKEN_NEVER_SET_IN_TESTS");

    let err = gateway.configure(&config, &credential).await.unwrap_err();
    assert!(matches!(err, StoreError::CredentialUnavailable(_)));
    assert!(!gateway.is_configured());
    assert!(!dir.path().join("Todo.sqlite3").exists());
}

#[tokio::test]
async fn document_backend_rejects_expired_token() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = StoreGateway::new();
    let config = DatabaseConfig::document(dir.path().to_str().unwrap(), "Todo");
    let expired = StaticCredential::new(AccessToken::new(
        "stale",
        Utc::now() - Duration::minutes(1),
    ));

    let err = gateway.configure(&config, &expired).await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized(_)));
    assert!(!gateway.is_configured());
}

#[tokio::test]
async fn document_backend_persists_across_gateways() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::document(dir.path().to_str().unwrap(), "Todo");
    let credential = StaticCredential::short_lived("token");

    let first = StoreGateway::new();
    first.configure(&config, &credential).await.unwrap();
    assert!(dir.path().join("Todo.sqlite3").exists());
    let created = TodoListRepository::new(&first)
        .unwrap()
        .create(TodoListPatch::named("Groceries"))
        .await
        .unwrap();
    drop(first);

    let second = StoreGateway::new();
    second.configure(&config, &credential).await.unwrap();
    let loaded = TodoListRepository::new(&second)
        .unwrap()
        .find_by_id(&created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn in_memory_gateways_are_isolated() {
    let first = StoreGateway::in_memory();
    let second = StoreGateway::in_memory();

    TodoListRepository::new(&first)
        .unwrap()
        .create(TodoListPatch::named("only here"))
        .await
        .unwrap();

    let lists = TodoListRepository::new(&second)
        .unwrap()
        .find_all()
        .await
        .unwrap();
    assert!(lists.is_empty());
}

#[tokio::test]
async fn repositories_share_one_gateway_state() {
    let gateway = StoreGateway::in_memory();
    let writer = TodoListRepository::new(&gateway).unwrap();
    let reader = TodoListRepository::new(&gateway).unwrap();

    let created = writer.create(TodoListPatch::named("shared")).await.unwrap();
    assert!(reader.find_by_id(&created.id).await.unwrap().is_some());
}
