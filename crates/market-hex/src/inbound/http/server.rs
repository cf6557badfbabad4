use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    serve, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::payload::Fields;
use crate::application::offer_service::OfferService;
use crate::application::order_service::OrderService;
use crate::application::snapshot::SnapshotSettings;
use crate::application::user_service::UserService;
use crate::errors::{AppError, JSON_UTF8};
use crate::seed::SeedReport;
use market_types::ports::MarketStore;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// Services shared by every handler. Each one holds its own clone of the
/// store handle.
pub struct AppState<R: MarketStore> {
    pub users: Arc<UserService<R>>,
    pub orders: Arc<OrderService<R>>,
    pub offers: Arc<OfferService<R>>,
}

impl<R: MarketStore> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            orders: self.orders.clone(),
            offers: self.offers.clone(),
        }
    }
}

impl<R: MarketStore + Clone> AppState<R> {
    /// `seeded` tells the snapshot hook which rows came from the fixtures.
    pub fn new(repo: R, snapshot: Option<SnapshotSettings>, seeded: &SeedReport) -> Self {
        let mut users = UserService::new(repo.clone());
        let mut orders = OrderService::new(repo.clone());
        if let Some(settings) = snapshot {
            users = users.with_snapshot(settings.seeded_through(seeded.max_user_id));
            orders = orders.with_snapshot(settings.seeded_through(seeded.max_order_id));
        }
        Self {
            users: Arc::new(users),
            orders: Arc::new(orders),
            offers: Arc::new(OfferService::new(repo)),
        }
    }
}

#[derive(Clone)]
pub struct HttpServer<R>
where
    R: MarketStore,
{
    pub state: AppState<R>,
    pub config: HttpServerConfig,
}

impl<R> HttpServer<R>
where
    R: MarketStore,
{
    pub async fn new(state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self { state, config })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        // `/user/{id}` is kept as an alias of `/users/{id}`.
        let user_instance: MethodRouter<AppState<R>> = get(get_user::<R>)
            .put(replace_user::<R>)
            .post(replace_user::<R>)
            .patch(patch_user::<R>)
            .delete(delete_user::<R>);

        Router::new()
            .route("/health", get(health))
            .route("/users", get(list_users::<R>).post(create_user::<R>))
            .route("/users/{id}", user_instance.clone())
            .route("/user/{id}", user_instance)
            .route("/orders", get(list_orders::<R>).post(create_order::<R>))
            .route(
                "/orders/{id}",
                get(get_order::<R>)
                    .put(replace_order::<R>)
                    .post(replace_order::<R>)
                    .patch(patch_order::<R>)
                    .delete(delete_order::<R>),
            )
            .route("/offers", get(list_offers::<R>))
            .route("/offers/{id}", get(get_offer::<R>))
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

fn json_ok<T: Serialize>(body: &T) -> Result<Response, AppError> {
    let bytes = serde_json::to_vec(body).map_err(|e| AppError::Internal(e.into()))?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, JSON_UTF8)], bytes).into_response())
}

fn created(location: String) -> Response {
    (StatusCode::NO_CONTENT, [(header::LOCATION, location)]).into_response()
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {raw}")))
}

async fn health() -> Result<Response, AppError> {
    json_ok(&serde_json::json!({ "status": "ok" }))
}

async fn list_users<R: MarketStore>(
    State(state): State<AppState<R>>,
) -> Result<Response, AppError> {
    json_ok(&state.users.list_users().await?)
}

async fn create_user<R: MarketStore>(
    State(state): State<AppState<R>>,
    Fields(input): Fields,
) -> Result<Response, AppError> {
    let user = state.users.create_user(&input).await?;
    Ok(created(format!("/users/{}", user.id)))
}

async fn get_user<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    json_ok(&state.users.get_user(parse_id(&id)?).await?)
}

async fn replace_user<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Fields(input): Fields,
) -> Result<StatusCode, AppError> {
    state.users.replace_user(parse_id(&id)?, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn patch_user<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Fields(input): Fields,
) -> Result<StatusCode, AppError> {
    state.users.patch_user(parse_id(&id)?, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.users.delete_user(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_orders<R: MarketStore>(
    State(state): State<AppState<R>>,
) -> Result<Response, AppError> {
    json_ok(&state.orders.list_orders().await?)
}

async fn create_order<R: MarketStore>(
    State(state): State<AppState<R>>,
    Fields(input): Fields,
) -> Result<Response, AppError> {
    let order = state.orders.create_order(&input).await?;
    Ok(created(format!("/orders/{}", order.id)))
}

async fn get_order<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    json_ok(&state.orders.get_order(parse_id(&id)?).await?)
}

async fn replace_order<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Fields(input): Fields,
) -> Result<StatusCode, AppError> {
    state.orders.replace_order(parse_id(&id)?, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn patch_order<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Fields(input): Fields,
) -> Result<StatusCode, AppError> {
    state.orders.patch_order(parse_id(&id)?, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_order<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.orders.delete_order(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_offers<R: MarketStore>(
    State(state): State<AppState<R>>,
) -> Result<Response, AppError> {
    json_ok(&state.offers.list_offers().await?)
}

async fn get_offer<R: MarketStore>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    json_ok(&state.offers.get_offer(parse_id(&id)?).await?)
}
