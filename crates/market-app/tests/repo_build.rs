use market_hex::seed::{seed, Fixtures};
use market_repo::{build_repo, Repo};
use market_types::ports::offer_repository::OfferRepository;
use market_types::ports::user_repository::UserRepository;

#[tokio::test]
async fn builds_sqlite_repo_from_url() {
    // Use a temp DB path for isolation.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("market-test.db");
    let url = format!("sqlite://{}", db_path.display());

    let repo: Repo = build_repo(Some(&url)).await.expect("build repo");
    // basic sanity: list should succeed and be empty
    let list = repo.list_users().await.expect("list");
    assert!(list.is_empty());
}

#[tokio::test]
async fn default_store_starts_empty_and_seeds_fully() {
    // Two stores built the same way never share rows: a restart resets the data.
    for _ in 0..2 {
        let repo: Repo = build_repo(None).await.expect("build repo");
        assert!(repo.list_users().await.unwrap().is_empty());

        let fixtures = Fixtures::builtin().unwrap();
        let report = seed(&repo, &fixtures).await.expect("seed");
        assert_eq!(repo.list_users().await.unwrap().len(), fixtures.users.len());
        assert_eq!(repo.list_offers().await.unwrap().len(), report.offers);
    }
}

#[tokio::test]
async fn restart_on_a_sqlite_file_keeps_rows_and_skips_seeding() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("market.db").display());
    let fixtures = Fixtures::builtin().unwrap();

    let repo: Repo = build_repo(Some(&url)).await.expect("build repo");
    let first = seed(&repo, &fixtures).await.expect("first seed");
    assert_eq!(first.users, fixtures.users.len());
    drop(repo);

    let repo: Repo = build_repo(Some(&url)).await.expect("reopen repo");
    let second = seed(&repo, &fixtures).await.expect("second start");
    assert_eq!(second.users, 0);
    assert_eq!(second.max_user_id, first.max_user_id);
    assert_eq!(repo.list_users().await.unwrap().len(), fixtures.users.len());
}
