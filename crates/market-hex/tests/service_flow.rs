use market_hex::application::order_service::OrderService;
use market_hex::application::user_service::UserService;
use market_hex::errors::AppError;
use market_hex::seed::{seed, Fixtures};
use market_repo::memory::InMemoryRepo;
use serde_json::json;

// End-to-end service flow against the in-memory adapter.
#[tokio::test]
async fn seeded_store_counts_follow_creates_and_deletes() {
    let repo = InMemoryRepo::new();
    let report = seed(&repo, &Fixtures::builtin().unwrap()).await.unwrap();
    let users = UserService::new(repo.clone());
    let orders = OrderService::new(repo.clone());

    let input = json!({"first_name": "Eve", "role": "executor"});
    let eve = users
        .create_user(input.as_object().unwrap())
        .await
        .unwrap();
    assert!(eve.id > report.users as i64);
    assert_eq!(users.list_users().await.unwrap().len(), report.users + 1);

    let job = json!({"name": "Fix tap", "customer_id": 1, "executor_id": eve.id});
    let order = orders
        .create_order(job.as_object().unwrap())
        .await
        .unwrap();

    // The executor can go away; the order keeps its dangling reference.
    users.delete_user(eve.id).await.unwrap();
    assert_eq!(users.list_users().await.unwrap().len(), report.users);
    let kept = orders.get_order(order.id).await.unwrap();
    assert_eq!(kept.fields.executor_id, Some(eve.id));

    // But a new write naming the deleted user is refused.
    let update = json!({"executor_id": eve.id});
    let res = orders.patch_order(order.id, update.as_object().unwrap()).await;
    assert!(matches!(res, Err(AppError::ConstraintViolation(_))));

    orders.delete_order(order.id).await.unwrap();
    assert_eq!(orders.list_orders().await.unwrap().len(), report.orders);
}
