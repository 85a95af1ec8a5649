//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod client;
pub mod garment;
pub mod garment_service;
pub mod order;
pub mod payment;
pub mod shop;

// Re-export specific types to avoid conflicts
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use garment::{Column as GarmentColumn, Entity as Garment, GarmentStage, Model as GarmentModel};
pub use garment_service::{
    Column as GarmentServiceColumn, Entity as GarmentService, Model as GarmentServiceModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use payment::{
    Column as PaymentColumn, Entity as Payment, Model as PaymentModel, PaymentRecordStatus,
};
pub use shop::{Column as ShopColumn, Entity as Shop, Model as ShopModel};
