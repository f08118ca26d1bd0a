use crate::core::constants::{DEFAULT_CATEGORY, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::core::errors::ExpenseError;
use crate::core::models::User;
use crate::core::services::ExpenseService;
use crate::tests::{TEST_PASSWORD, create_test_service};

async fn two_users(service: &ExpenseService) -> (User, User) {
    let ann = service.register("ann@example.com", TEST_PASSWORD).await.unwrap();
    let bob = service.register("bob@example.com", TEST_PASSWORD).await.unwrap();
    (ann, bob)
}

#[tokio::test]
async fn test_create_expense_defaults_category() {
    let service = create_test_service();
    let (ann, _) = two_users(&service).await;

    let expense = service.create_expense(ann.id, " Coffee ", 3.5, None).await.unwrap();
    assert_eq!(expense.title, "Coffee");
    assert_eq!(expense.amount, 3.5);
    assert_eq!(expense.category, DEFAULT_CATEGORY);
    assert_eq!(expense.user_id, ann.id);

    let groceries = service
        .create_expense(ann.id, "Market", 42.1, Some("Groceries"))
        .await
        .unwrap();
    assert_eq!(groceries.category, "Groceries");
}

#[tokio::test]
async fn test_create_expense_validation() {
    let service = create_test_service();
    let (ann, _) = two_users(&service).await;

    for (title, amount, category, field) in [
        ("", 10.0, None, "title"),
        ("Rent", 0.0, None, "amount"),
        ("Rent", -5.0, None, "amount"),
        ("Rent", 10.001, None, "amount"),
        ("Rent", 10.0, Some("  "), "category"),
        ("Rent", 10.0, Some("Food\u{7}"), "category"),
        ("Rent", 10.0, Some("Line\nBreak"), "category"),
    ] {
        let result = service.create_expense(ann.id, title, amount, category).await;
        assert!(
            matches!(&result, Err(ExpenseError::InvalidInput(f, _)) if f == field),
            "expected {field} to be rejected, got {result:?}"
        );
    }
    assert!(service.list_expenses(ann.id, None, None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_is_newest_first_and_filters_by_category() {
    let service = create_test_service();
    let (ann, _) = two_users(&service).await;

    let first = service.create_expense(ann.id, "Bus", 2.0, Some("Travel")).await.unwrap();
    let second = service.create_expense(ann.id, "Lunch", 12.0, Some("Food")).await.unwrap();
    let third = service.create_expense(ann.id, "Train", 30.0, Some("Travel")).await.unwrap();

    let all = service.list_expenses(ann.id, None, None, None).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let travel = service.list_expenses(ann.id, Some("Travel"), None, None).await.unwrap();
    let ids: Vec<i64> = travel.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);

    // blank filter means no filter
    assert_eq!(service.list_expenses(ann.id, Some(" "), None, None).await.unwrap().len(), 3);

    let page = service.list_expenses(ann.id, None, Some(1), Some(1)).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, second.id);
}

#[tokio::test]
async fn test_expenses_are_scoped_to_owner() {
    let service = create_test_service();
    let (ann, bob) = two_users(&service).await;

    let expense = service.create_expense(ann.id, "Rent", 900.0, Some("Housing")).await.unwrap();
    service.create_expense(bob.id, "Snacks", 4.25, None).await.unwrap();

    let bobs = service.list_expenses(bob.id, None, None, None).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert!(bobs.iter().all(|e| e.user_id == bob.id));

    assert!(matches!(
        service.get_expense(bob.id, expense.id).await,
        Err(ExpenseError::ExpenseNotFound(id)) if id == expense.id
    ));
    assert!(matches!(
        service.update_expense(bob.id, expense.id, Some("Mine now"), None, None).await,
        Err(ExpenseError::ExpenseNotFound(_))
    ));
    assert!(matches!(
        service.delete_expense(bob.id, expense.id).await,
        Err(ExpenseError::ExpenseNotFound(_))
    ));

    let untouched = service.get_expense(ann.id, expense.id).await.unwrap();
    assert_eq!(untouched, expense);
}

#[tokio::test]
async fn test_update_expense_is_partial() {
    let service = create_test_service();
    let (ann, _) = two_users(&service).await;
    let expense = service.create_expense(ann.id, "Dinner", 25.0, Some("Food")).await.unwrap();

    let updated = service
        .update_expense(ann.id, expense.id, None, Some(27.5), None)
        .await
        .unwrap();
    assert_eq!(updated.title, "Dinner");
    assert_eq!(updated.amount, 27.5);
    assert_eq!(updated.category, "Food");
    assert_eq!(updated.created_at, expense.created_at);

    let renamed = service
        .update_expense(ann.id, expense.id, Some("Team dinner"), None, Some("Work"))
        .await
        .unwrap();
    assert_eq!(renamed.title, "Team dinner");
    assert_eq!(renamed.amount, 27.5);
    assert_eq!(renamed.category, "Work");

    assert!(matches!(
        service.update_expense(ann.id, expense.id, None, None, None).await,
        Err(ExpenseError::InvalidInput(_, _))
    ));
    assert!(matches!(
        service.update_expense(ann.id, expense.id, None, Some(0.0), None).await,
        Err(ExpenseError::InvalidInput(field, _)) if field == "amount"
    ));
}

#[tokio::test]
async fn test_delete_expense() {
    let service = create_test_service();
    let (ann, _) = two_users(&service).await;
    let expense = service.create_expense(ann.id, "Gym", 40.0, None).await.unwrap();

    service.delete_expense(ann.id, expense.id).await.unwrap();

    assert!(matches!(
        service.get_expense(ann.id, expense.id).await,
        Err(ExpenseError::ExpenseNotFound(_))
    ));
    assert!(matches!(
        service.delete_expense(ann.id, expense.id).await,
        Err(ExpenseError::ExpenseNotFound(_))
    ));
}

#[tokio::test]
async fn test_list_limit_defaults_and_caps() {
    let service = create_test_service();
    let (ann, _) = two_users(&service).await;

    for i in 0..=MAX_PAGE_LIMIT {
        service
            .create_expense(ann.id, &format!("Item {}", i), 1.0, None)
            .await
            .unwrap();
    }

    let default_page = service.list_expenses(ann.id, None, None, None).await.unwrap();
    assert_eq!(default_page.len(), DEFAULT_PAGE_LIMIT as usize);

    let capped = service.list_expenses(ann.id, None, Some(5000), None).await.unwrap();
    assert_eq!(capped.len(), MAX_PAGE_LIMIT as usize);

    let tail = service
        .list_expenses(ann.id, None, Some(5000), Some(MAX_PAGE_LIMIT))
        .await
        .unwrap();
    assert_eq!(tail.len(), 1);
}
