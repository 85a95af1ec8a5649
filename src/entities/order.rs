//! Order entity - a client's drop-off, holding garments and the money totals.
//!
//! All amounts are integer cents. `total_cents = subtotal - discount + tax`, and the
//! discount never exceeds the subtotal computed from the garments' active services.

use crate::core::payments::PaymentStatus;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Lifecycle of an order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Just created
    #[sea_orm(string_value = "new")]
    New,
    /// Work has started on at least one garment
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Everything is ready for pickup
    #[sea_orm(string_value = "ready")]
    Ready,
    /// Picked up and settled
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled; hidden from lists and pipelines
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning shop
    pub shop_id: i64,
    /// Client who dropped the order off
    pub client_id: i64,
    /// Shop-facing order number (e.g. `"T-0042"`)
    pub order_number: String,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Sum of active line items
    pub subtotal_cents: i64,
    /// Discount applied against the subtotal
    pub discount_cents: i64,
    /// Tax on the discounted subtotal
    pub tax_cents: i64,
    /// Amount the client owes in total
    pub total_cents: i64,
    /// Cached result of the payment status calculator
    pub payment_status: PaymentStatus,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one shop
    #[sea_orm(
        belongs_to = "super::shop::Entity",
        from = "Column::ShopId",
        to = "super::shop::Column::Id"
    )]
    Shop,
    /// Each order belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// One order has many garments
    #[sea_orm(has_many = "super::garment::Entity")]
    Garments,
    /// One order has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::garment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Garments.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
