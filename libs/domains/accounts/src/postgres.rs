use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity,
    error::{AccountError, AccountResult},
    models::{LinkedAccount, UpsertLinkedAccount},
    repository::LinkedAccountRepository,
};

/// PostgreSQL-backed linked-account store.
///
/// Upserts use `INSERT .. ON CONFLICT (remote_account_id) DO UPDATE`, so `id`
/// and `created_at` survive a re-link.
#[derive(Clone)]
pub struct PgLinkedAccountRepository {
    db: DatabaseConnection,
}

impl PgLinkedAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LinkedAccountRepository for PgLinkedAccountRepository {
    async fn upsert(&self, input: UpsertLinkedAccount) -> AccountResult<LinkedAccount> {
        let remote_account_id = input.remote_account_id.clone();
        let active_model: entity::ActiveModel = input.into();

        entity::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(entity::Column::RemoteAccountId)
                    .update_columns([
                        entity::Column::UserId,
                        entity::Column::Handle,
                        entity::Column::DisplayName,
                        entity::Column::AvatarUrl,
                        entity::Column::AccessToken,
                        entity::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let model = entity::Entity::find()
            .filter(entity::Column::RemoteAccountId.eq(remote_account_id.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AccountError::Internal(format!(
                    "Upserted account {} not found",
                    remote_account_id
                ))
            })?;

        tracing::info!(
            account_id = %model.id,
            remote_account_id = %model.remote_account_id,
            "Upserted linked account"
        );
        Ok(model.into())
    }

    async fn list_by_user(&self, user_id: Uuid) -> AccountResult<Vec<LinkedAccount>> {
        let models = entity::Entity::find()
            .filter(entity::Column::UserId.eq(user_id))
            .order_by_desc(entity::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<LinkedAccount>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn delete(&self, id: Uuid) -> AccountResult<bool> {
        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(account_id = %id, "Deleted linked account");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
