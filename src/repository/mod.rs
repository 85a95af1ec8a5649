//! Tenant-scoped data access.
//!
//! Business logic depends on these traits rather than on `SeaORM` query chains. Every
//! method takes the shop id as an explicit argument; a record belonging to another
//! shop is indistinguishable from a missing one.
//!
//! Writes that change money or derived columns on more than one row (a payment and
//! the order's payment status, a service and the order totals) are single methods
//! that commit or roll back as a unit.

mod query;
mod seaorm;

pub use query::{GarmentQuery, GarmentSort, OrderQuery, OrderSort, Page, SortDirection};
pub use seaorm::SeaOrmRepository;

use crate::{
    core::payments::{PaymentSummary, RefundOutcome},
    entities::{
        GarmentStage, OrderStatus, PaymentRecordStatus, client, garment, garment_service, order,
        payment,
    },
    errors::Result,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Fields for a new garment; it always starts in [`GarmentStage::New`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGarment {
    /// Order the garment belongs to
    pub order_id: i64,
    /// Short description
    pub name: String,
    /// Promised pickup date
    pub due_date: Option<NaiveDate>,
}

/// Fields for a new service line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewService {
    /// Garment the service is performed on
    pub garment_id: i64,
    /// Service name
    pub name: String,
    /// Number of units
    pub quantity: i32,
    /// Price per unit in cents
    pub unit_price_cents: i64,
}

/// Partial update of a service's flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceUpdate {
    /// New done flag
    pub is_done: Option<bool>,
    /// New removed flag
    pub is_removed: Option<bool>,
}

/// A change to one service line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceChange {
    /// Book a new service
    Add(NewService),
    /// Flip flags on an existing service
    Update {
        /// Service to change
        service_id: i64,
        /// New flags
        update: ServiceUpdate,
    },
}

/// An order row as stored after a write, with the payment summary it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWrite {
    /// The stored order
    pub order: order::Model,
    /// Payment summary behind the stored `payment_status`
    pub payments: PaymentSummary,
}

/// Rows written by [`GarmentRepository::apply_service_change`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceWrite {
    /// The added or updated service
    pub service: garment_service::Model,
    /// Its garment with recomputed progress
    pub garment: garment::Model,
    /// Its order with recomputed totals and payment status
    pub order: OrderWrite,
}

/// Fields for a new order; totals start at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Client placing the order
    pub client_id: i64,
    /// Shop-facing order number
    pub order_number: String,
}

/// Fields for a newly recorded payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Order paid against
    pub order_id: i64,
    /// Amount in cents
    pub amount_cents: i64,
    /// Processing state
    pub status: PaymentRecordStatus,
    /// Payment method
    pub method: String,
    /// Processor reference
    pub external_id: Option<String>,
}

/// Fields for a new client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
}

/// Garments and their services.
#[async_trait]
pub trait GarmentRepository: Send + Sync {
    /// Paginated, filtered garment listing. Garments of cancelled orders are excluded.
    async fn find_garments(&self, shop_id: i64, query: &GarmentQuery)
    -> Result<Page<garment::Model>>;

    /// Every garment of the shop that is not `Done`, excluding cancelled orders.
    async fn find_active_garments(&self, shop_id: i64) -> Result<Vec<garment::Model>>;

    /// Every garment of the shop, excluding cancelled orders.
    async fn find_all_garments(&self, shop_id: i64) -> Result<Vec<garment::Model>>;

    /// A single garment.
    async fn find_garment(&self, shop_id: i64, garment_id: i64) -> Result<Option<garment::Model>>;

    /// Adds a garment to an order of this shop.
    async fn insert_garment(&self, shop_id: i64, new: NewGarment) -> Result<garment::Model>;

    /// Moves a garment to `stage`.
    async fn update_garment_stage(
        &self,
        shop_id: i64,
        garment_id: i64,
        stage: GarmentStage,
    ) -> Result<garment::Model>;

    /// All services of a garment, removed ones included.
    async fn find_services(
        &self,
        shop_id: i64,
        garment_id: i64,
    ) -> Result<Vec<garment_service::Model>>;

    /// A single service.
    async fn find_service(
        &self,
        shop_id: i64,
        service_id: i64,
    ) -> Result<Option<garment_service::Model>>;

    /// Adds a service row to a garment of this shop, leaving progress and totals untouched.
    async fn insert_service(&self, shop_id: i64, new: NewService)
    -> Result<garment_service::Model>;

    /// Flips a service's done/removed flags, leaving progress and totals untouched.
    async fn update_service(
        &self,
        shop_id: i64,
        service_id: i64,
        update: ServiceUpdate,
    ) -> Result<garment_service::Model>;

    /// Applies a service change, then stores the garment's progress and the order's
    /// totals and payment status, all in one transaction.
    async fn apply_service_change(
        &self,
        shop_id: i64,
        change: ServiceChange,
        tax_rate_bps: i32,
    ) -> Result<ServiceWrite>;
}

/// Orders and their money totals.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Paginated, filtered order listing.
    async fn find_orders(&self, shop_id: i64, query: &OrderQuery) -> Result<Page<order::Model>>;

    /// A single order, cancelled ones included.
    async fn find_order(&self, shop_id: i64, order_id: i64) -> Result<Option<order::Model>>;

    /// Creates an order for a client of this shop.
    async fn insert_order(&self, shop_id: i64, new: NewOrder) -> Result<order::Model>;

    /// Recomputes totals from the line items with `discount_cents`, and stores them
    /// together with the payment status in one transaction.
    async fn recalculate_order(
        &self,
        shop_id: i64,
        order_id: i64,
        discount_cents: i64,
        tax_rate_bps: i32,
    ) -> Result<OrderWrite>;

    /// Moves an order through its lifecycle.
    async fn set_order_status(
        &self,
        shop_id: i64,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<order::Model>;

    /// Line items of an order grouped per garment, removed ones included.
    async fn find_order_line_items(
        &self,
        shop_id: i64,
        order_id: i64,
    ) -> Result<Vec<Vec<garment_service::Model>>>;
}

/// Payments against orders.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Every payment of an order, oldest first, whatever its status.
    async fn find_payments(&self, shop_id: i64, order_id: i64) -> Result<Vec<payment::Model>>;

    /// A single payment.
    async fn find_payment(&self, shop_id: i64, payment_id: i64) -> Result<Option<payment::Model>>;

    /// Inserts a payment row as given, leaving the order untouched.
    async fn insert_payment(&self, shop_id: i64, new: NewPayment) -> Result<payment::Model>;

    /// Inserts a payment and stores the order's new payment status in one transaction.
    async fn record_payment(
        &self,
        shop_id: i64,
        new: NewPayment,
    ) -> Result<(payment::Model, OrderWrite)>;

    /// Stores refund bookkeeping and the order's new payment status in one transaction.
    async fn record_refund(
        &self,
        shop_id: i64,
        payment_id: i64,
        outcome: RefundOutcome,
    ) -> Result<(payment::Model, OrderWrite)>;
}

/// Clients of the shop.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Clients whose name contains `search` (all clients when `None`), by last name.
    async fn find_clients(&self, shop_id: i64, search: Option<&str>)
    -> Result<Vec<client::Model>>;

    /// Creates a client.
    async fn insert_client(&self, shop_id: i64, new: NewClient) -> Result<client::Model>;
}

/// Everything the service layer needs, as one object-safe trait.
pub trait ShopRepository:
    GarmentRepository + OrderRepository + PaymentRepository + ClientRepository
{
}

impl<T> ShopRepository for T where
    T: GarmentRepository + OrderRepository + PaymentRepository + ClientRepository
{
}
