use std::time::Duration;

use anyhow::Context;
use market_types::domain::offer::{Offer, OfferId};
use market_types::domain::order::{Order, OrderFields, OrderId};
use market_types::domain::user::{User, UserFields, UserId};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::Url;
use serde::Serialize;

#[derive(Clone)]
pub struct MarketClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct MarketClient {
    base: Url,
    client: reqwest::Client,
}

/// Reads the id back out of a `Location: /<collection>/<id>` header.
fn created_id(res: &reqwest::Response) -> anyhow::Result<i64> {
    let location = res
        .headers()
        .get(LOCATION)
        .context("create response has no Location header")?
        .to_str()
        .context("Location header is not ASCII")?;
    location
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .with_context(|| format!("no id in Location {location:?}"))
}

impl MarketClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<MarketClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(MarketClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let res = self
            .client
            .get(self.url(path)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    async fn create<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<i64> {
        let res = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        let id = created_id(&res)?;
        tracing::debug!(path, id, "created");
        Ok(id)
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<()> {
        self.client
            .put(self.url(path)?)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<()> {
        self.client
            .patch(self.url(path)?)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        self.client
            .delete(self.url(path)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        self.get_json("users").await
    }

    pub async fn get_user(&self, id: UserId) -> anyhow::Result<User> {
        self.get_json(&format!("users/{id}")).await
    }

    /// Returns the id the server assigned.
    pub async fn create_user(&self, fields: &UserFields) -> anyhow::Result<UserId> {
        self.create("users", fields).await
    }

    pub async fn replace_user(&self, id: UserId, fields: &UserFields) -> anyhow::Result<()> {
        self.put(&format!("users/{id}"), fields).await
    }

    /// Sends only the keys in `changes`, e.g. `json!({"phone": "555"})`.
    pub async fn patch_user<B: Serialize + ?Sized>(
        &self,
        id: UserId,
        changes: &B,
    ) -> anyhow::Result<()> {
        self.patch(&format!("users/{id}"), changes).await
    }

    pub async fn delete_user(&self, id: UserId) -> anyhow::Result<()> {
        self.delete(&format!("users/{id}")).await
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        self.get_json("orders").await
    }

    pub async fn get_order(&self, id: OrderId) -> anyhow::Result<Order> {
        self.get_json(&format!("orders/{id}")).await
    }

    pub async fn create_order(&self, fields: &OrderFields) -> anyhow::Result<OrderId> {
        self.create("orders", fields).await
    }

    pub async fn replace_order(&self, id: OrderId, fields: &OrderFields) -> anyhow::Result<()> {
        self.put(&format!("orders/{id}"), fields).await
    }

    pub async fn patch_order<B: Serialize + ?Sized>(
        &self,
        id: OrderId,
        changes: &B,
    ) -> anyhow::Result<()> {
        self.patch(&format!("orders/{id}"), changes).await
    }

    pub async fn delete_order(&self, id: OrderId) -> anyhow::Result<()> {
        self.delete(&format!("orders/{id}")).await
    }

    pub async fn list_offers(&self) -> anyhow::Result<Vec<Offer>> {
        self.get_json("offers").await
    }

    pub async fn get_offer(&self, id: OfferId) -> anyhow::Result<Offer> {
        self.get_json(&format!("offers/{id}")).await
    }
}

impl MarketClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<MarketClient> {
        if let Some(client) = self.client {
            return Ok(MarketClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(MarketClient {
            base: self.base,
            client,
        })
    }
}
