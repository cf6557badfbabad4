use async_trait::async_trait;

use super::RepoError;
use crate::domain::user::{User, UserFields, UserId};

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Inserts a row under a freshly allocated id.
    async fn create_user(&self, fields: UserFields) -> Result<User, RepoError>;
    /// Inserts a row under the caller's id; a taken id is a constraint error.
    async fn insert_user(&self, user: User) -> Result<User, RepoError>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError>;
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    async fn replace_user(
        &self,
        id: UserId,
        fields: UserFields,
    ) -> Result<Option<User>, RepoError>;
    async fn delete_user(&self, id: UserId) -> Result<bool, RepoError>;
}
