//! Shop entity - the tenant every other record is scoped to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shop database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shops")]
pub struct Model {
    /// Unique identifier for the shop
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the shop
    pub name: String,
    /// IANA timezone used to decide the shop's "today" (e.g. `"America/Chicago"`)
    pub timezone: String,
    /// Sales tax in basis points (825 = 8.25%)
    pub tax_rate_bps: i32,
    /// When the shop was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Shop and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One shop has many clients
    #[sea_orm(has_many = "super::client::Entity")]
    Clients,
    /// One shop has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
