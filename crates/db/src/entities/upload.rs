//! Upload entity (stored evidence images and avatars).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The uploading user
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Original file name
    pub name: String,

    pub content_type: String,

    /// File size in bytes
    pub size: i64,

    /// Backend storage key
    pub storage_key: String,

    /// Public URL the file is served from
    pub url: String,

    /// MD5 hash of the contents
    pub md5: String,

    /// Image width in pixels
    #[sea_orm(nullable)]
    pub width: Option<i32>,

    /// Image height in pixels
    #[sea_orm(nullable)]
    pub height: Option<i32>,

    /// Blurhash placeholder string
    #[sea_orm(nullable)]
    pub blurhash: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
