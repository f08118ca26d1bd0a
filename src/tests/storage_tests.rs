use crate::core::errors::ExpenseError;
use crate::core::models::{ExpenseChanges, ExpenseFilter, NewExpense};
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::infrastructure::storage::sqlite::SqliteStorage;
use crate::infrastructure::storage::{self, Storage, StorageBackend};
use chrono::{Duration, SubsecRound, Utc};
use std::sync::Arc;

fn new_expense(title: &str, category: &str, minutes_ago: i64) -> NewExpense {
    NewExpense {
        title: title.to_string(),
        amount: 10.0,
        category: category.to_string(),
        created_at: (Utc::now() - Duration::minutes(minutes_ago)).trunc_subsecs(6),
    }
}

fn everything() -> ExpenseFilter {
    ExpenseFilter {
        category: None,
        limit: 100,
        offset: 0,
    }
}

/// Behaviour every backend has to share.
async fn exercise_storage(storage: Arc<dyn Storage>) {
    storage.ping().await.unwrap();

    let ann = storage.create_user("ann@example.com", "hash-a").await.unwrap();
    let bob = storage.create_user("bob@example.com", "hash-b").await.unwrap();
    assert_ne!(ann.id, bob.id);
    assert!(matches!(
        storage.create_user("ann@example.com", "hash-c").await,
        Err(ExpenseError::EmailAlreadyRegistered(_))
    ));

    let by_email = storage.get_user_by_email("ann@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, ann.id);
    assert_eq!(by_email.password_hash, "hash-a");
    assert!(storage.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    assert!(storage.get_user(ann.id).await.unwrap().is_some());

    let old = storage.create_expense(ann.id, new_expense("Old", "Food", 30)).await.unwrap();
    let new = storage.create_expense(ann.id, new_expense("New", "Travel", 1)).await.unwrap();
    let bobs = storage.create_expense(bob.id, new_expense("Bob's", "Food", 5)).await.unwrap();
    assert_eq!(old.user_id, ann.id);
    assert_eq!(old.title, "Old");

    let listed = storage.list_expenses(ann.id, &everything()).await.unwrap();
    assert_eq!(listed.iter().map(|e| e.id).collect::<Vec<_>>(), vec![new.id, old.id]);

    let food = ExpenseFilter {
        category: Some("Food".to_string()),
        ..everything()
    };
    let listed = storage.list_expenses(ann.id, &food).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, old.id);

    let second_page = ExpenseFilter {
        limit: 1,
        offset: 1,
        ..everything()
    };
    let listed = storage.list_expenses(ann.id, &second_page).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, old.id);

    // cross-tenant access behaves like a missing row
    assert!(storage.get_expense(ann.id, bobs.id).await.unwrap().is_none());
    let hijack = ExpenseChanges {
        title: Some("hijacked".to_string()),
        ..Default::default()
    };
    assert!(storage.update_expense(ann.id, bobs.id, hijack).await.unwrap().is_none());
    assert!(!storage.delete_expense(ann.id, bobs.id).await.unwrap());
    assert_eq!(storage.get_expense(bob.id, bobs.id).await.unwrap().unwrap().title, "Bob's");

    let changes = ExpenseChanges {
        amount: Some(12.34),
        category: Some("Groceries".to_string()),
        ..Default::default()
    };
    let updated = storage.update_expense(ann.id, old.id, changes).await.unwrap().unwrap();
    assert_eq!(updated.title, "Old");
    assert_eq!(updated.amount, 12.34);
    assert_eq!(updated.category, "Groceries");
    assert_eq!(updated.created_at, old.created_at);

    assert!(storage.delete_expense(ann.id, old.id).await.unwrap());
    assert!(storage.get_expense(ann.id, old.id).await.unwrap().is_none());
    assert!(!storage.delete_expense(ann.id, old.id).await.unwrap());

    assert!(matches!(
        storage.create_expense(9_999, new_expense("Orphan", "Food", 0)).await,
        Err(ExpenseError::UserNotFound(9_999))
    ));
}

#[tokio::test]
async fn test_in_memory_storage() {
    exercise_storage(Arc::new(InMemoryStorage::new())).await;
}

#[tokio::test]
async fn test_sqlite_in_memory_storage() {
    let storage = SqliteStorage::connect("sqlite::memory:").await.unwrap();
    exercise_storage(Arc::new(storage)).await;
}

#[tokio::test]
async fn test_sqlite_file_storage_persists_across_connections() {
    let path = std::env::temp_dir().join(format!(
        "expense-tracker-{}-{}.db",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}", path.display());

    {
        let storage = SqliteStorage::connect(&url).await.unwrap();
        let user = storage.create_user("ann@example.com", "hash").await.unwrap();
        storage.create_expense(user.id, new_expense("Book", "Education", 0)).await.unwrap();
    }

    let reopened = storage::connect(&url).await.unwrap();
    let user = reopened.get_user_by_email("ann@example.com").await.unwrap().unwrap();
    let expenses = reopened.list_expenses(user.id, &everything()).await.unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].title, "Book");

    drop(reopened);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

#[test]
fn test_backend_from_url() {
    assert_eq!(StorageBackend::from_url("memory").unwrap(), StorageBackend::InMemory);
    assert_eq!(
        StorageBackend::from_url("sqlite://expenses.db").unwrap(),
        StorageBackend::Sqlite("sqlite://expenses.db".to_string())
    );
    assert_eq!(
        StorageBackend::from_url("postgresql://localhost/expenses").unwrap().name(),
        "postgres"
    );
    assert!(matches!(
        StorageBackend::from_url("mysql://localhost/expenses"),
        Err(ExpenseError::UnsupportedDatabase(_))
    ));
}
