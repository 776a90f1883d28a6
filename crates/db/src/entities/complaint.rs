//! Complaint entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Complaint categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Category {
    #[sea_orm(string_value = "WiFi")]
    WiFi,
    #[sea_orm(string_value = "Food")]
    Food,
    #[sea_orm(string_value = "Cleanliness")]
    Cleanliness,
    #[sea_orm(string_value = "Academics")]
    Academics,
    #[sea_orm(string_value = "Other")]
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 5] = [
        Self::WiFi,
        Self::Food,
        Self::Cleanliness,
        Self::Academics,
        Self::Other,
    ];

    /// String form used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WiFi => "WiFi",
            Self::Food => "Food",
            Self::Cleanliness => "Cleanliness",
            Self::Academics => "Academics",
            Self::Other => "Other",
        }
    }
}

/// Complaint lifecycle status. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Status {
    #[sea_orm(string_value = "Open")]
    Open,
    #[sea_orm(string_value = "In_Progress")]
    #[serde(rename = "In_Progress")]
    InProgress,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
}

impl Status {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Resolved];

    /// String form used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In_Progress",
            Self::Resolved => "Resolved",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Filing user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub category: Category,

    pub status: Status,

    /// Branch the complaint was filed under (denormalized from the filer)
    #[sea_orm(indexed)]
    pub branch: String,

    /// Evidence image URL
    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// Net community score (likes - dislikes), maintained by atomic deltas
    #[sea_orm(default_value = 0)]
    pub score: i32,

    /// Post-resolution rating (1-5), set once by the owner
    #[sea_orm(nullable)]
    pub rating: Option<i32>,

    /// Post-resolution comment from the owner
    #[sea_orm(column_type = "Text", nullable)]
    pub review_comment: Option<String>,

    /// Note the resolving admin attached
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_remark: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    /// Set on edits and status changes; None means never touched
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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

    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
