//! Garment entity - a single piece of clothing moving through the workflow.
//!
//! Garments are never deleted; they end in the terminal [`GarmentStage::Done`] stage.
//! `progress` is derived from the garment's services and rewritten whenever one of
//! them is marked done or removed.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Position of a garment in the fixed workflow `New -> In Progress -> Ready For Pickup -> Done`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum GarmentStage {
    /// Checked in, no work started
    #[sea_orm(string_value = "New")]
    #[serde(rename = "New")]
    New,
    /// Being worked on
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    /// Finished and waiting for the client
    #[sea_orm(string_value = "Ready For Pickup")]
    #[serde(rename = "Ready For Pickup")]
    ReadyForPickup,
    /// Picked up; terminal
    #[sea_orm(string_value = "Done")]
    #[serde(rename = "Done")]
    Done,
}

impl GarmentStage {
    /// All stages in workflow order.
    pub const ALL: [Self; 4] = [Self::New, Self::InProgress, Self::ReadyForPickup, Self::Done];

    /// Display name, identical to the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In Progress",
            Self::ReadyForPickup => "Ready For Pickup",
            Self::Done => "Done",
        }
    }

    /// The next stage in the workflow, or `None` for [`GarmentStage::Done`].
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::New => Some(Self::InProgress),
            Self::InProgress => Some(Self::ReadyForPickup),
            Self::ReadyForPickup => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Whether the garment still belongs on active lists.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Done)
    }
}

impl std::fmt::Display for GarmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Garment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "garments")]
pub struct Model {
    /// Unique identifier for the garment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning shop
    pub shop_id: i64,
    /// Order this garment was dropped off with
    pub order_id: i64,
    /// Short description (e.g. "Navy suit jacket")
    pub name: String,
    /// Workflow stage
    pub stage: GarmentStage,
    /// Promised pickup date, a calendar date with no time
    pub due_date: Option<Date>,
    /// Share of active services completed, 0-100
    pub progress: Option<i32>,
    /// When the garment was checked in
    pub created_at: DateTimeUtc,
    /// When the garment was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Garment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each garment belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    /// One garment has many services
    #[sea_orm(has_many = "super::garment_service::Entity")]
    Services,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::garment_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Services.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
