use market_hex::application::snapshot::SnapshotSettings;
use market_hex::errors::JSON_UTF8;
use market_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use market_hex::seed::{seed, Fixtures, SeedReport};
use market_repo::build_repo;
use market_types::domain::offer::Offer;
use market_types::domain::order::Order;
use market_types::domain::user::User;
use reqwest::StatusCode;
use serde_json::json;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Starts a seeded server and returns its base url plus the seed counts.
async fn start_server() -> (String, SeedReport, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let config = HttpServerConfig {
        port: port.to_string(),
    };

    let repo = build_repo(None).await.expect("build repo");
    let report = seed(&repo, &Fixtures::builtin().unwrap())
        .await
        .expect("seed");
    let state = AppState::new(repo, Some(SnapshotSettings::default()), &report);
    let server = HttpServer::new(state, config).await.unwrap();

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    (format!("http://127.0.0.1:{}", port), report, handle)
}

#[tokio::test]
async fn create_list_update_delete_users_over_http() {
    let (addr, report, handle) = start_server().await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/users", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"],
        "application/json; charset=utf-8"
    );
    let seeded: Vec<User> = res.json().await.unwrap();
    assert_eq!(seeded.len(), report.users);

    let res = client
        .post(format!("{}/users", addr))
        .json(&json!({
            "first_name": "Ann",
            "last_name": "K",
            "age": 30,
            "email": "a@x.com",
            "role": "customer",
            "phone": "000"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let location = res.headers()["location"].to_str().unwrap().to_string();

    let list: Vec<User> = client
        .get(format!("{}/users", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), report.users + 1);
    let ann = list
        .iter()
        .find(|u| u.fields.first_name.as_deref() == Some("Ann"))
        .expect("created user listed");
    assert!(seeded.iter().all(|u| u.id != ann.id));
    assert_eq!(ann.fields.age, Some(30));
    assert_eq!(ann.fields.phone.as_deref(), Some("000"));
    assert_eq!(location, format!("/users/{}", ann.id));

    let fetched: User = client
        .get(format!("{}{}", addr, location))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(&fetched, ann);

    // Full replace: omitted fields become null.
    let res = client
        .put(format!("{}/users/{}", addr, ann.id))
        .json(&json!({"first_name": "Bea", "age": "31"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let replaced: User = client
        .get(format!("{}/users/{}", addr, ann.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replaced.fields.first_name.as_deref(), Some("Bea"));
    assert_eq!(replaced.fields.age, Some(31));
    assert_eq!(replaced.fields.email, None);

    // Partial update through the singular alias.
    let res = client
        .patch(format!("{}/user/{}", addr, ann.id))
        .form(&[("phone", "111")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let patched: User = client
        .get(format!("{}/user/{}", addr, ann.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(patched.fields.first_name.as_deref(), Some("Bea"));
    assert_eq!(patched.fields.phone.as_deref(), Some("111"));

    let res = client
        .delete(format!("{}/users/{}", addr, ann.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/users/{}", addr, ann.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let list: Vec<User> = client
        .get(format!("{}/users", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), report.users);

    handle.abort();
}

#[tokio::test]
async fn form_encoded_order_create_and_replace() {
    let (addr, report, handle) = start_server().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/orders", addr))
        .form(&[
            ("name", "Hang shelves"),
            ("description", "Three shelves in the hall"),
            ("start_date", "07/01/2013"),
            ("end_date", "07/02/2013"),
            ("address", "5 Pine Court"),
            ("price", "2500"),
            ("customer_id", "1"),
            ("executor_id", "3"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let location = res.headers()["location"].to_str().unwrap().to_string();

    let order: Order = client
        .get(format!("{}{}", addr, location))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(order.fields.price, Some(2500));
    assert_eq!(order.fields.customer_id, Some(1));
    assert_eq!(order.fields.start_date.as_deref(), Some("07/01/2013"));

    // POST on the instance path replaces, like PUT.
    let res = client
        .post(format!("{}/orders/{}", addr, order.id))
        .form(&[("name", "Hang two shelves")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let replaced: Order = client
        .get(format!("{}/orders/{}", addr, order.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replaced.fields.name.as_deref(), Some("Hang two shelves"));
    assert_eq!(replaced.fields.price, None);
    assert_eq!(replaced.fields.customer_id, None);

    let orders: Vec<Order> = client
        .get(format!("{}/orders", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.len(), report.orders + 1);

    handle.abort();
}

fn multipart_body(boundary: &str, parts: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (name, value) in parts {
        out.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    out.push_str(&format!("--{boundary}--\r\n"));
    out
}

#[tokio::test]
async fn multipart_form_creates_and_patches_a_user() {
    let (addr, _report, handle) = start_server().await;
    let client = reqwest::Client::new();
    let boundary = "market-boundary";
    let content_type = format!("multipart/form-data; boundary={boundary}");

    let res = client
        .post(format!("{}/users", addr))
        .header("content-type", &content_type)
        .body(multipart_body(boundary, &[("first_name", "Mia"), ("age", "41")]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let location = res.headers()["location"].to_str().unwrap().to_string();

    let res = client
        .patch(format!("{}{}", addr, location))
        .header("content-type", &content_type)
        .body(multipart_body(boundary, &[("role", "executor")]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let user: User = client
        .get(format!("{}{}", addr, location))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user.fields.first_name.as_deref(), Some("Mia"));
    assert_eq!(user.fields.age, Some(41));
    assert_eq!(user.fields.role.as_deref(), Some("executor"));

    let res = client
        .post(format!("{}/users", addr))
        .header("content-type", &content_type)
        .body(multipart_body(boundary, &[("age", "old")]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    handle.abort();
}

#[tokio::test]
async fn offers_are_read_only() {
    let (addr, report, handle) = start_server().await;
    let client = reqwest::Client::new();

    let offers: Vec<Offer> = client
        .get(format!("{}/offers", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(offers.len(), report.offers);

    let first: Offer = client
        .get(format!("{}/offers/{}", addr, offers[0].id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first, offers[0]);

    let res = client
        .post(format!("{}/offers", addr))
        .json(&json!({"order_id": 1, "executor_id": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    handle.abort();
}

#[tokio::test]
async fn error_statuses() {
    let (addr, _report, handle) = start_server().await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], JSON_UTF8);

    let res = client
        .get(format!("{}/users/not-a-number", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["content-type"], JSON_UTF8);

    let res = client
        .get(format!("{}/orders/999999", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["content-type"], JSON_UTF8);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("999999"));

    let res = client
        .delete(format!("{}/users/999999", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(format!("{}/users", addr))
        .json(&json!({"age": "thirty"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .post(format!("{}/users", addr))
        .header("content-type", "application/json")
        .body("[1, 2]")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/orders", addr))
        .json(&json!({"name": "Ghost job", "customer_id": 999999}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    handle.abort();
}
