use crate::application::snapshot::{SnapshotSettings, SNAPSHOT_TARGET};
use crate::errors::AppError;
use market_types::domain::fields::FieldMap;
use market_types::domain::order::{Order, OrderFields, OrderId};
use market_types::ports::order_repository::OrderRepository;

pub struct OrderService<R: OrderRepository> {
    repo: R,
    snapshot: Option<SnapshotSettings>,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, settings: SnapshotSettings) -> Self {
        self.snapshot = Some(settings);
        self
    }

    pub async fn create_order(&self, input: &FieldMap) -> Result<Order, AppError> {
        let fields = OrderFields::from_map(input)?;
        let order = self.repo.create_order(fields).await?;
        tracing::info!(order_id = order.id, "order created");
        self.log_snapshot().await;
        Ok(order)
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, AppError> {
        match self.repo.get_order(id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list_orders().await?)
    }

    pub async fn replace_order(&self, id: OrderId, input: &FieldMap) -> Result<Order, AppError> {
        let fields = OrderFields::from_map(input)?;
        self.store(id, fields).await
    }

    pub async fn patch_order(&self, id: OrderId, input: &FieldMap) -> Result<Order, AppError> {
        let mut fields = self.get_order(id).await?.fields;
        fields.apply(input)?;
        self.store(id, fields).await
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<(), AppError> {
        let deleted = self.repo.delete_order(id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("order {}", id)));
        }
        tracing::info!(order_id = id, "order deleted");
        self.log_snapshot().await;
        Ok(())
    }

    async fn store(&self, id: OrderId, fields: OrderFields) -> Result<Order, AppError> {
        match self.repo.replace_order(id, fields).await? {
            Some(o) => {
                tracing::info!(order_id = id, "order updated");
                self.log_snapshot().await;
                Ok(o)
            }
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    async fn log_snapshot(&self) {
        let Some(settings) = &self.snapshot else {
            return;
        };
        match self.repo.list_orders().await {
            Ok(orders) => {
                let table = settings.table(&orders);
                tracing::debug!(target: SNAPSHOT_TARGET, rows = table.len(), "recent orders\n{}", table.render());
            }
            Err(e) => tracing::warn!(error = %e, "order snapshot skipped"),
        }
    }
}
