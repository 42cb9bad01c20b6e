use std::collections::HashSet;
use std::sync::Arc;
use todo_store::{
    InMemoryDatabase, SqliteDocumentDatabase, StoreGateway, TodoListPatch, TodoListRepository,
};

async fn backends() -> Vec<(&'static str, StoreGateway)> {
    let sqlite = SqliteDocumentDatabase::open_in_memory("Todo").await.unwrap();
    vec![
        (
            "memory",
            StoreGateway::with_database(Arc::new(InMemoryDatabase::default())),
        ),
        ("sqlite", StoreGateway::with_database(Arc::new(sqlite))),
    ]
}

#[tokio::test]
async fn create_and_find_roundtrip() {
    for (backend, gateway) in backends().await {
        let repo = TodoListRepository::new(&gateway).unwrap();

        let created = repo
            .create(TodoListPatch::named("Groceries").with_description("weekly run"))
            .await
            .unwrap();
        assert!(!created.id.is_empty(), "{backend}");
        assert_eq!(created.name, "Groceries");
        assert_eq!(created.description.as_deref(), Some("weekly run"));
        assert_eq!(created.created_date, created.updated_date);

        let loaded = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created, "{backend}");
    }
}

#[tokio::test]
async fn create_generates_distinct_ids_and_defaults_name() {
    for (backend, gateway) in backends().await {
        let repo = TodoListRepository::new(&gateway).unwrap();

        let mut ids = HashSet::new();
        for _ in 0..25 {
            let list = repo.create(TodoListPatch::default()).await.unwrap();
            assert_eq!(list.name, "");
            assert!(ids.insert(list.id), "{backend}: duplicate id generated");
        }
        assert_eq!(repo.find_all().await.unwrap().len(), 25);
    }
}

#[tokio::test]
async fn find_all_returns_lists_in_creation_order() {
    for (backend, gateway) in backends().await {
        let repo = TodoListRepository::new(&gateway).unwrap();
        for name in ["a", "b", "c"] {
            repo.create(TodoListPatch::named(name)).await.unwrap();
        }
        let names: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|list| list.name)
            .collect();
        assert_eq!(names, ["a", "b", "c"], "{backend}");
    }
}

#[tokio::test]
async fn find_missing_returns_none() {
    for (backend, gateway) in backends().await {
        let repo = TodoListRepository::new(&gateway).unwrap();
        assert!(repo.find_by_id("missing").await.unwrap().is_none(), "{backend}");
    }
}

#[tokio::test]
async fn update_merges_fields_and_keeps_identity() {
    for (backend, gateway) in backends().await {
        let repo = TodoListRepository::new(&gateway).unwrap();
        let created = repo
            .create(TodoListPatch::named("Groceries").with_description("weekly"))
            .await
            .unwrap();

        let updated = repo
            .update(&created.id, TodoListPatch::named("Errands"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id, "{backend}");
        assert_eq!(updated.name, "Errands");
        assert_eq!(updated.description.as_deref(), Some("weekly"));
        assert_eq!(updated.created_date, created.created_date);
        assert!(updated.updated_date >= created.updated_date);

        let loaded = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded, updated, "{backend}");
    }
}

#[tokio::test]
async fn update_missing_returns_none_and_creates_nothing() {
    for (backend, gateway) in backends().await {
        let repo = TodoListRepository::new(&gateway).unwrap();
        let result = repo
            .update("missing", TodoListPatch::named("ghost"))
            .await
            .unwrap();
        assert!(result.is_none(), "{backend}");
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
        assert!(repo.find_all().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn delete_reports_whether_a_row_was_removed() {
    for (backend, gateway) in backends().await {
        let repo = TodoListRepository::new(&gateway).unwrap();
        let created = repo.create(TodoListPatch::named("tmp")).await.unwrap();

        assert!(repo.delete(&created.id).await.unwrap(), "{backend}");
        assert!(repo.find_by_id(&created.id).await.unwrap().is_none());
        assert!(!repo.delete(&created.id).await.unwrap(), "{backend}");
        assert!(!repo.delete("never-existed").await.unwrap());
    }
}
