use crate::application::snapshot::{SnapshotSettings, SNAPSHOT_TARGET};
use crate::errors::AppError;
use market_types::domain::fields::FieldMap;
use market_types::domain::user::{User, UserFields, UserId};
use market_types::ports::user_repository::UserRepository;

pub struct UserService<R: UserRepository> {
    repo: R,
    snapshot: Option<SnapshotSettings>,
}

impl<R: UserRepository> UserService<R> {
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

    pub async fn create_user(&self, input: &FieldMap) -> Result<User, AppError> {
        let fields = UserFields::from_map(input)?;
        let user = self.repo.create_user(fields).await?;
        tracing::info!(user_id = user.id, "user created");
        self.log_snapshot().await;
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        match self.repo.get_user(id).await? {
            Some(u) => Ok(u),
            None => Err(AppError::NotFound(format!("user {}", id))),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list_users().await?)
    }

    /// Every column is rewritten; columns absent from `input` become null.
    pub async fn replace_user(&self, id: UserId, input: &FieldMap) -> Result<User, AppError> {
        let fields = UserFields::from_map(input)?;
        self.store(id, fields).await
    }

    /// Only columns present in `input` change.
    pub async fn patch_user(&self, id: UserId, input: &FieldMap) -> Result<User, AppError> {
        let mut fields = self.get_user(id).await?.fields;
        fields.apply(input)?;
        self.store(id, fields).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        if !self.repo.delete_user(id).await? {
            return Err(AppError::NotFound(format!("user {}", id)));
        }
        tracing::info!(user_id = id, "user deleted");
        self.log_snapshot().await;
        Ok(())
    }

    async fn store(&self, id: UserId, fields: UserFields) -> Result<User, AppError> {
        let user = self
            .repo
            .replace_user(id, fields)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;
        tracing::info!(user_id = id, "user updated");
        self.log_snapshot().await;
        Ok(user)
    }

    async fn log_snapshot(&self) {
        let Some(settings) = &self.snapshot else {
            return;
        };
        match self.repo.list_users().await {
            Ok(users) => {
                let table = settings.table(&users);
                tracing::debug!(target: SNAPSHOT_TARGET, rows = table.len(), "recent users\n{}", table.render());
            }
            Err(e) => tracing::warn!(error = %e, "user snapshot skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(v: serde_json::Value) -> FieldMap {
        v.as_object().cloned().unwrap()
    }

    fn ann() -> FieldMap {
        input(json!({
            "first_name": "Ann",
            "last_name": "K",
            "age": 30,
            "email": "a@x.com",
            "role": "customer",
            "phone": "000"
        }))
    }

    #[tokio::test]
    async fn create_and_get_user_in_memory() {
        let repo = market_repo::memory::InMemoryRepo::new();
        let svc = UserService::new(repo.clone());
        let user = svc.create_user(&ann()).await.unwrap();
        let got = svc.get_user(user.id).await.unwrap();
        assert_eq!(got.fields.first_name.as_deref(), Some("Ann"));
        assert_eq!(got.fields.age, Some(30));
    }

    #[tokio::test]
    async fn replace_nulls_omitted_fields_but_patch_keeps_them() {
        let repo = market_repo::memory::InMemoryRepo::new();
        let svc = UserService::new(repo.clone()).with_snapshot(SnapshotSettings::default());
        let user = svc.create_user(&ann()).await.unwrap();

        let patched = svc
            .patch_user(user.id, &input(json!({"phone": "111"})))
            .await
            .unwrap();
        assert_eq!(patched.fields.phone.as_deref(), Some("111"));
        assert_eq!(patched.fields.email.as_deref(), Some("a@x.com"));

        let replaced = svc
            .replace_user(user.id, &input(json!({"first_name": "Bea"})))
            .await
            .unwrap();
        assert_eq!(replaced.fields.first_name.as_deref(), Some("Bea"));
        assert_eq!(replaced.fields.phone, None);
        assert_eq!(svc.get_user(user.id).await.unwrap(), replaced);
    }

    #[tokio::test]
    async fn validation_errors_propagate() {
        let repo = market_repo::memory::InMemoryRepo::new();
        let svc = UserService::new(repo.clone());
        let res = svc.create_user(&input(json!({"age": "old"}))).await;
        assert!(matches!(res, Err(AppError::Validation(_))));
        assert!(svc.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_found_paths() {
        let repo = market_repo::memory::InMemoryRepo::new();
        let svc = UserService::new(repo.clone());
        assert!(matches!(svc.get_user(9).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.replace_user(9, &ann()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.patch_user(9, &ann()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(svc.delete_user(9).await, Err(AppError::NotFound(_))));
    }
}
