//! `SeaORM` implementation of the repository traits.
//!
//! Garment listings always go through [`scoped_garments`] and order listings through
//! [`scoped_orders`], so the shop filter and the cancelled-order policy live in one place.
//!
//! Row helpers are generic over [`ConnectionTrait`] so the same code runs on the
//! pooled connection and inside a transaction.

use super::query::{page_size, search_term};
use super::{
    ClientRepository, GarmentQuery, GarmentRepository, GarmentSort, NewClient, NewGarment,
    NewOrder, NewPayment, NewService, OrderQuery, OrderRepository, OrderSort, OrderWrite, Page,
    PaymentRepository, ServiceChange, ServiceUpdate, ServiceWrite, SortDirection,
};
use crate::{
    core::{
        discount::{calculate_order_subtotal, calculate_order_totals},
        payments::{PaymentStatus, RefundOutcome, calculate_payment_status, countable_payments},
        progress::calculate_garment_progress,
    },
    entities::{
        Client, Garment, GarmentService, GarmentStage, Order, OrderStatus, Payment, client,
        garment, garment_service, order, payment,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::NullOrdering;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

/// Repository backed by a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    /// Wraps a connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

const fn sort_order(direction: SortDirection) -> sea_orm::Order {
    match direction {
        SortDirection::Asc => sea_orm::Order::Asc,
        SortDirection::Desc => sea_orm::Order::Desc,
    }
}

/// Garments of one shop whose order is not cancelled.
fn scoped_garments(shop_id: i64) -> Select<Garment> {
    Garment::find()
        .inner_join(Order)
        .filter(garment::Column::ShopId.eq(shop_id))
        .filter(order::Column::Status.ne(OrderStatus::Cancelled))
}

/// Orders of one shop, cancelled ones only when asked for.
fn scoped_orders(shop_id: i64, include_cancelled: bool) -> Select<Order> {
    let select = Order::find().filter(order::Column::ShopId.eq(shop_id));
    if include_cancelled {
        select
    } else {
        select.filter(order::Column::Status.ne(OrderStatus::Cancelled))
    }
}

async fn fetch_page<E>(
    db: &DatabaseConnection,
    filtered: Select<E>,
    sorted: Select<E>,
    cursor: Option<u64>,
    limit: Option<u64>,
) -> Result<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
{
    let total = filtered.count(db).await?;
    let offset = cursor.unwrap_or(0);
    let limit = page_size(limit);
    let items = sorted.offset(offset).limit(limit + 1).all(db).await?;
    Ok(Page::from_lookahead(items, offset, limit, total))
}

async fn find_order_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    order_id: i64,
) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id)
        .filter(order::Column::ShopId.eq(shop_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_order_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    order_id: i64,
) -> Result<order::Model> {
    find_order_row(db, shop_id, order_id)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))
}

async fn find_garment_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    garment_id: i64,
) -> Result<Option<garment::Model>> {
    Garment::find_by_id(garment_id)
        .filter(garment::Column::ShopId.eq(shop_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_garment_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    garment_id: i64,
) -> Result<garment::Model> {
    find_garment_row(db, shop_id, garment_id)
        .await?
        .ok_or_else(|| Error::not_found("garment", garment_id))
}

async fn find_service_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    service_id: i64,
) -> Result<Option<garment_service::Model>> {
    GarmentService::find_by_id(service_id)
        .inner_join(Garment)
        .filter(garment::Column::ShopId.eq(shop_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_payment_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    payment_id: i64,
) -> Result<Option<payment::Model>> {
    Payment::find_by_id(payment_id)
        .filter(payment::Column::ShopId.eq(shop_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_payment_rows<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    order_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::ShopId.eq(shop_id))
        .filter(payment::Column::OrderId.eq(order_id))
        .order_by_asc(payment::Column::CreatedAt)
        .order_by_asc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_line_item_rows<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    order_id: i64,
) -> Result<Vec<Vec<garment_service::Model>>> {
    let garments = Garment::find()
        .filter(garment::Column::ShopId.eq(shop_id))
        .filter(garment::Column::OrderId.eq(order_id))
        .order_by_asc(garment::Column::Id)
        .find_with_related(GarmentService)
        .all(db)
        .await?;

    Ok(garments.into_iter().map(|(_, services)| services).collect())
}

async fn insert_service_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    new: NewService,
) -> Result<garment_service::Model> {
    if new.quantity <= 0 {
        return Err(Error::InvalidAmount {
            cents: i64::from(new.quantity),
        });
    }
    if new.unit_price_cents < 0 {
        return Err(Error::InvalidAmount {
            cents: new.unit_price_cents,
        });
    }
    require_garment_row(db, shop_id, new.garment_id).await?;

    let model = garment_service::ActiveModel {
        garment_id: Set(new.garment_id),
        name: Set(new.name),
        quantity: Set(new.quantity),
        unit_price_cents: Set(new.unit_price_cents),
        is_done: Set(false),
        is_removed: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

async fn update_service_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    service_id: i64,
    update: ServiceUpdate,
) -> Result<garment_service::Model> {
    let found = find_service_row(db, shop_id, service_id)
        .await?
        .ok_or_else(|| Error::not_found("service", service_id))?;

    let mut active: garment_service::ActiveModel = found.into();
    if let Some(is_done) = update.is_done {
        active.is_done = Set(is_done);
    }
    if let Some(is_removed) = update.is_removed {
        active.is_removed = Set(is_removed);
    }
    active.update(db).await.map_err(Into::into)
}

async fn insert_payment_row<C: ConnectionTrait>(
    db: &C,
    shop_id: i64,
    new: NewPayment,
) -> Result<payment::Model> {
    require_order_row(db, shop_id, new.order_id).await?;

    let model = payment::ActiveModel {
        shop_id: Set(shop_id),
        order_id: Set(new.order_id),
        amount_cents: Set(new.amount_cents),
        refunded_amount_cents: Set(0),
        status: Set(new.status),
        method: Set(new.method),
        external_id: Set(new.external_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Stores the progress implied by the garment's services.
async fn store_progress<C: ConnectionTrait>(
    db: &C,
    garment: garment::Model,
) -> Result<garment::Model> {
    let services = GarmentService::find()
        .filter(garment_service::Column::GarmentId.eq(garment.id))
        .all(db)
        .await?;

    let mut active: garment::ActiveModel = garment.into();
    active.progress = Set(calculate_garment_progress(&services));
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Stores the payment status implied by the order's countable payments.
async fn store_payment_status<C: ConnectionTrait>(
    db: &C,
    order: order::Model,
) -> Result<OrderWrite> {
    let payments = find_payment_rows(db, order.shop_id, order.id).await?;
    let summary = calculate_payment_status(order.total_cents, countable_payments(&payments))?;

    let mut active: order::ActiveModel = order.into();
    active.payment_status = Set(summary.payment_status);
    active.updated_at = Set(Utc::now());
    let order = active.update(db).await?;
    Ok(OrderWrite {
        order,
        payments: summary,
    })
}

/// Stores totals recomputed from the order's line items, then its payment status.
async fn store_totals<C: ConnectionTrait>(
    db: &C,
    order: order::Model,
    discount_cents: i64,
    tax_rate_bps: i32,
) -> Result<OrderWrite> {
    let line_items = find_line_item_rows(db, order.shop_id, order.id).await?;
    let subtotal = calculate_order_subtotal(&line_items)?;
    let totals = calculate_order_totals(subtotal, discount_cents, tax_rate_bps)?;

    let mut active: order::ActiveModel = order.into();
    active.subtotal_cents = Set(totals.subtotal_cents);
    active.discount_cents = Set(totals.discount_cents);
    active.tax_cents = Set(totals.tax_cents);
    active.total_cents = Set(totals.total_cents);
    active.updated_at = Set(Utc::now());
    let order = active.update(db).await?;
    store_payment_status(db, order).await
}

#[async_trait]
impl GarmentRepository for SeaOrmRepository {
    #[instrument(skip(self, query))]
    async fn find_garments(
        &self,
        shop_id: i64,
        query: &GarmentQuery,
    ) -> Result<Page<garment::Model>> {
        let mut filtered = scoped_garments(shop_id);
        if let Some(stage) = query.stage {
            filtered = filtered.filter(garment::Column::Stage.eq(stage));
        } else if !query.include_done {
            filtered = filtered.filter(garment::Column::Stage.ne(GarmentStage::Done));
        }
        if let Some(order_id) = query.order_id {
            filtered = filtered.filter(garment::Column::OrderId.eq(order_id));
        }
        if let Some(term) = search_term(query.search.as_ref()) {
            filtered = filtered.filter(garment::Column::Name.contains(term));
        }

        let order = sort_order(query.direction);
        let sorted = match query.sort {
            GarmentSort::DueDate => filtered.clone().order_by_with_nulls(
                garment::Column::DueDate,
                order.clone(),
                NullOrdering::Last,
            ),
            GarmentSort::CreatedAt => filtered
                .clone()
                .order_by(garment::Column::CreatedAt, order.clone()),
            GarmentSort::Name => filtered.clone().order_by(garment::Column::Name, order.clone()),
        }
        .order_by(garment::Column::Id, order);

        fetch_page(&self.db, filtered, sorted, query.cursor, query.limit).await
    }

    async fn find_active_garments(&self, shop_id: i64) -> Result<Vec<garment::Model>> {
        scoped_garments(shop_id)
            .filter(garment::Column::Stage.ne(GarmentStage::Done))
            .order_by_asc(garment::Column::Id)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn find_all_garments(&self, shop_id: i64) -> Result<Vec<garment::Model>> {
        scoped_garments(shop_id)
            .order_by_asc(garment::Column::Id)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn find_garment(&self, shop_id: i64, garment_id: i64) -> Result<Option<garment::Model>> {
        find_garment_row(&self.db, shop_id, garment_id).await
    }

    #[instrument(skip(self, new), fields(order_id = new.order_id))]
    async fn insert_garment(&self, shop_id: i64, new: NewGarment) -> Result<garment::Model> {
        if new.name.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "Garment name cannot be empty".to_string(),
            });
        }
        require_order_row(&self.db, shop_id, new.order_id).await?;

        let now = Utc::now();
        let model = garment::ActiveModel {
            shop_id: Set(shop_id),
            order_id: Set(new.order_id),
            name: Set(new.name.trim().to_string()),
            stage: Set(GarmentStage::New),
            due_date: Set(new.due_date),
            progress: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model.insert(&self.db).await?;
        debug!("Inserted garment {} '{}'", inserted.id, inserted.name);
        Ok(inserted)
    }

    async fn update_garment_stage(
        &self,
        shop_id: i64,
        garment_id: i64,
        stage: GarmentStage,
    ) -> Result<garment::Model> {
        let found = require_garment_row(&self.db, shop_id, garment_id).await?;

        let mut active: garment::ActiveModel = found.into();
        active.stage = Set(stage);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(Into::into)
    }

    async fn find_services(
        &self,
        shop_id: i64,
        garment_id: i64,
    ) -> Result<Vec<garment_service::Model>> {
        GarmentService::find()
            .inner_join(Garment)
            .filter(garment_service::Column::GarmentId.eq(garment_id))
            .filter(garment::Column::ShopId.eq(shop_id))
            .order_by_asc(garment_service::Column::Id)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn find_service(
        &self,
        shop_id: i64,
        service_id: i64,
    ) -> Result<Option<garment_service::Model>> {
        find_service_row(&self.db, shop_id, service_id).await
    }

    async fn insert_service(
        &self,
        shop_id: i64,
        new: NewService,
    ) -> Result<garment_service::Model> {
        insert_service_row(&self.db, shop_id, new).await
    }

    async fn update_service(
        &self,
        shop_id: i64,
        service_id: i64,
        update: ServiceUpdate,
    ) -> Result<garment_service::Model> {
        update_service_row(&self.db, shop_id, service_id, update).await
    }

    #[instrument(skip(self, change))]
    async fn apply_service_change(
        &self,
        shop_id: i64,
        change: ServiceChange,
        tax_rate_bps: i32,
    ) -> Result<ServiceWrite> {
        self.db
            .transaction::<_, ServiceWrite, Error>(|txn| {
                Box::pin(async move {
                    let service = match change {
                        ServiceChange::Add(new) => insert_service_row(txn, shop_id, new).await?,
                        ServiceChange::Update { service_id, update } => {
                            update_service_row(txn, shop_id, service_id, update).await?
                        }
                    };
                    let garment = require_garment_row(txn, shop_id, service.garment_id).await?;
                    let garment = store_progress(txn, garment).await?;

                    let order = require_order_row(txn, shop_id, garment.order_id).await?;
                    let discount_cents = order.discount_cents;
                    let order = store_totals(txn, order, discount_cents, tax_rate_bps).await?;
                    Ok(ServiceWrite {
                        service,
                        garment,
                        order,
                    })
                })
            })
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl OrderRepository for SeaOrmRepository {
    #[instrument(skip(self, query))]
    async fn find_orders(&self, shop_id: i64, query: &OrderQuery) -> Result<Page<order::Model>> {
        let mut filtered = match query.status {
            Some(status) => {
                scoped_orders(shop_id, true).filter(order::Column::Status.eq(status))
            }
            None => scoped_orders(shop_id, query.include_cancelled),
        };
        if let Some(client_id) = query.client_id {
            filtered = filtered.filter(order::Column::ClientId.eq(client_id));
        }
        if let Some(term) = search_term(query.search.as_ref()) {
            filtered = filtered.filter(order::Column::OrderNumber.contains(term));
        }

        let order = sort_order(query.direction);
        let sort_column = match query.sort {
            OrderSort::CreatedAt => order::Column::CreatedAt,
            OrderSort::OrderNumber => order::Column::OrderNumber,
            OrderSort::Total => order::Column::TotalCents,
        };
        let sorted = filtered
            .clone()
            .order_by(sort_column, order.clone())
            .order_by(order::Column::Id, order);

        fetch_page(&self.db, filtered, sorted, query.cursor, query.limit).await
    }

    async fn find_order(&self, shop_id: i64, order_id: i64) -> Result<Option<order::Model>> {
        find_order_row(&self.db, shop_id, order_id).await
    }

    #[instrument(skip(self, new), fields(client_id = new.client_id))]
    async fn insert_order(&self, shop_id: i64, new: NewOrder) -> Result<order::Model> {
        Client::find_by_id(new.client_id)
            .filter(client::Column::ShopId.eq(shop_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("client", new.client_id))?;

        let now = Utc::now();
        let model = order::ActiveModel {
            shop_id: Set(shop_id),
            client_id: Set(new.client_id),
            order_number: Set(new.order_number),
            status: Set(OrderStatus::New),
            subtotal_cents: Set(0),
            discount_cents: Set(0),
            tax_cents: Set(0),
            total_cents: Set(0),
            payment_status: Set(PaymentStatus::Unpaid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model.insert(&self.db).await?;
        info!("Created order {} ({})", inserted.id, inserted.order_number);
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn recalculate_order(
        &self,
        shop_id: i64,
        order_id: i64,
        discount_cents: i64,
        tax_rate_bps: i32,
    ) -> Result<OrderWrite> {
        self.db
            .transaction::<_, OrderWrite, Error>(|txn| {
                Box::pin(async move {
                    let order = require_order_row(txn, shop_id, order_id).await?;
                    store_totals(txn, order, discount_cents, tax_rate_bps).await
                })
            })
            .await
            .map_err(Into::into)
    }

    async fn set_order_status(
        &self,
        shop_id: i64,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<order::Model> {
        let found = require_order_row(&self.db, shop_id, order_id).await?;

        let mut active: order::ActiveModel = found.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(Into::into)
    }

    async fn find_order_line_items(
        &self,
        shop_id: i64,
        order_id: i64,
    ) -> Result<Vec<Vec<garment_service::Model>>> {
        find_line_item_rows(&self.db, shop_id, order_id).await
    }
}

#[async_trait]
impl PaymentRepository for SeaOrmRepository {
    async fn find_payments(&self, shop_id: i64, order_id: i64) -> Result<Vec<payment::Model>> {
        find_payment_rows(&self.db, shop_id, order_id).await
    }

    async fn find_payment(&self, shop_id: i64, payment_id: i64) -> Result<Option<payment::Model>> {
        find_payment_row(&self.db, shop_id, payment_id).await
    }

    #[instrument(skip(self, new), fields(order_id = new.order_id, amount = new.amount_cents))]
    async fn insert_payment(&self, shop_id: i64, new: NewPayment) -> Result<payment::Model> {
        insert_payment_row(&self.db, shop_id, new).await
    }

    #[instrument(skip(self, new), fields(order_id = new.order_id, amount = new.amount_cents))]
    async fn record_payment(
        &self,
        shop_id: i64,
        new: NewPayment,
    ) -> Result<(payment::Model, OrderWrite)> {
        self.db
            .transaction::<_, (payment::Model, OrderWrite), Error>(|txn| {
                Box::pin(async move {
                    let payment = insert_payment_row(txn, shop_id, new).await?;
                    let order = require_order_row(txn, shop_id, payment.order_id).await?;
                    let write = store_payment_status(txn, order).await?;
                    Ok((payment, write))
                })
            })
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, outcome))]
    async fn record_refund(
        &self,
        shop_id: i64,
        payment_id: i64,
        outcome: RefundOutcome,
    ) -> Result<(payment::Model, OrderWrite)> {
        self.db
            .transaction::<_, (payment::Model, OrderWrite), Error>(|txn| {
                Box::pin(async move {
                    let found = find_payment_row(txn, shop_id, payment_id)
                        .await?
                        .ok_or_else(|| Error::not_found("payment", payment_id))?;

                    let mut active: payment::ActiveModel = found.into();
                    active.refunded_amount_cents = Set(outcome.refunded_amount_cents);
                    active.status = Set(outcome.status);
                    let payment = active.update(txn).await?;

                    let order = require_order_row(txn, shop_id, payment.order_id).await?;
                    let write = store_payment_status(txn, order).await?;
                    Ok((payment, write))
                })
            })
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl ClientRepository for SeaOrmRepository {
    async fn find_clients(
        &self,
        shop_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<client::Model>> {
        let mut select = Client::find().filter(client::Column::ShopId.eq(shop_id));
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(client::Column::FirstName.contains(term))
                    .add(client::Column::LastName.contains(term)),
            );
        }
        select
            .order_by_asc(client::Column::LastName)
            .order_by_asc(client::Column::FirstName)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn insert_client(&self, shop_id: i64, new: NewClient) -> Result<client::Model> {
        if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "Client first and last name are required".to_string(),
            });
        }

        let model = client::ActiveModel {
            shop_id: Set(shop_id),
            first_name: Set(new.first_name.trim().to_string()),
            last_name: Set(new.last_name.trim().to_string()),
            email: Set(new.email),
            phone: Set(new.phone),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(Into::into)
    }
}
