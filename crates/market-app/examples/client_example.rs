///  To run :
///  cargo r --example client_example
use market_client::MarketClient;
use market_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use market_hex::seed::{seed, Fixtures};
use market_repo::build_repo;
use market_types::domain::order::OrderFields;
use market_types::domain::user::UserFields;
use reqwest::StatusCode;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start a seeded server on an ephemeral port.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // File-backed SQLite so the data can be inspected after the run.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("market.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let report = seed(&repo, &Fixtures::builtin()?).await?;
    let server = HttpServer::new(
        AppState::new(repo, None, &report),
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = MarketClient::new(&addr)?;
    println!("Seeded users: {}", client.list_users().await?.len());

    let id = client
        .create_user(&UserFields {
            first_name: Some("Ann".into()),
            last_name: Some("K".into()),
            age: Some(30),
            email: Some("a@x.com".into()),
            role: Some("customer".into()),
            phone: Some("000".into()),
        })
        .await?;
    println!("Created user id={id}");

    let order_id = client
        .create_order(&OrderFields {
            name: Some("Water the plants".into()),
            start_date: Some("08/01/2013".into()),
            end_date: Some("08/14/2013".into()),
            price: Some(1200),
            customer_id: Some(id),
            ..Default::default()
        })
        .await?;
    println!("Created order id={order_id} for customer {id}");

    client
        .patch_order(order_id, &serde_json::json!({ "executor_id": 3 }))
        .await?;
    let order = client.get_order(order_id).await?;
    println!("Order executor={:?}", order.fields.executor_id);

    client.delete_user(id).await?;
    match client.get_user(id).await {
        Ok(_) => println!("user {id} still present?"),
        Err(err)
            if err
                .downcast_ref::<reqwest::Error>()
                .and_then(|e| e.status())
                == Some(StatusCode::NOT_FOUND) =>
        {
            println!("Deleted user {id}; order {order_id} keeps customer_id={id}");
        }
        Err(err) => return Err(err),
    }

    for offer in client.list_offers().await? {
        println!(
            "offer {}: order={:?} executor={:?}",
            offer.id, offer.order_id, offer.executor_id
        );
    }

    handle.abort();
    Ok(())
}
