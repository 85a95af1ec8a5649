//! Payment entity - money received against an order.
//!
//! Payments are immutable once recorded except for refund bookkeeping
//! (`refunded_amount_cents` and `status`).

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Processing state of a single payment
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    /// Authorized but not captured
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Captured in full
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Captured, part of it refunded
    #[sea_orm(string_value = "partially_refunded")]
    PartiallyRefunded,
    /// Captured, then refunded in full
    #[sea_orm(string_value = "refunded")]
    Refunded,
    /// Declined or errored
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl PaymentRecordStatus {
    /// Whether the payment's amounts belong in an order balance.
    ///
    /// Refunded payments still count: their `refunded_amount_cents` cancels the amount.
    #[must_use]
    pub const fn counts_toward_balance(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::PartiallyRefunded | Self::Refunded
        )
    }
}

/// Payment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning shop
    pub shop_id: i64,
    /// Order the payment was made against
    pub order_id: i64,
    /// Amount received in cents
    pub amount_cents: i64,
    /// Amount refunded so far in cents
    pub refunded_amount_cents: i64,
    /// Processing state
    pub status: PaymentRecordStatus,
    /// How the client paid (`"card"`, `"cash"`, ...)
    pub method: String,
    /// Identifier assigned by the payment processor, if any
    pub external_id: Option<String>,
    /// When the payment was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
