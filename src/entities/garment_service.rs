//! Garment service entity - a billable line item on a garment (hem, take in, ...).
//!
//! Removed services are soft-deleted: kept for history, excluded from totals and progress.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Garment service database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "garment_services")]
pub struct Model {
    /// Unique identifier for the service
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Garment this service is performed on
    pub garment_id: i64,
    /// Name of the service (e.g. "Hem trousers")
    pub name: String,
    /// Number of units
    pub quantity: i32,
    /// Price per unit in cents
    pub unit_price_cents: i64,
    /// Work on this service is finished
    pub is_done: bool,
    /// Soft delete flag - if true, the line item is inactive but retained
    pub is_removed: bool,
    /// When the service was added
    pub created_at: DateTimeUtc,
}

impl Model {
    /// `quantity * unit_price_cents`, or `None` if that overflows.
    #[must_use]
    pub fn line_total_cents(&self) -> Option<i64> {
        i64::from(self.quantity).checked_mul(self.unit_price_cents)
    }
}

/// Defines relationships between `GarmentService` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each service belongs to one garment
    #[sea_orm(
        belongs_to = "super::garment::Entity",
        from = "Column::GarmentId",
        to = "super::garment::Column::Id"
    )]
    Garment,
}

impl Related<super::garment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Garment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
