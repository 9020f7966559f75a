use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{LinkedAccount, UpsertLinkedAccount};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "linked_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub remote_account_id: String,
    pub handle: String,
    pub display_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub avatar_url: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub access_token: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LinkedAccount {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            remote_account_id: model.remote_account_id,
            handle: model.handle,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            access_token: model.access_token,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

// created_at is only written on insert; the upsert's update list omits it.
impl From<UpsertLinkedAccount> for ActiveModel {
    fn from(input: UpsertLinkedAccount) -> Self {
        ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(input.user_id),
            remote_account_id: Set(input.remote_account_id),
            handle: Set(input.handle),
            display_name: Set(input.display_name),
            avatar_url: Set(input.avatar_url),
            access_token: Set(input.access_token),
            created_at: Set(input.updated_at.into()),
            updated_at: Set(input.updated_at.into()),
        }
    }
}
