//! Core business rules - framework-agnostic calculations shared by every surface.
//!
//! Nothing in here performs I/O; the service layer fetches records and hands them in.

/// Due-date labels and predicates in the shop's local calendar
pub mod dates;
/// Order subtotal, discount validation and totals
pub mod discount;
/// Cents formatting and dollar parsing at the display edge
pub mod money;
/// Payment status calculation and refund bookkeeping
pub mod payments;
/// Garment priority comparator and stage pipeline counts
pub mod priority;
/// Garment progress derived from services
pub mod progress;
/// Field-keyed validation errors and action results
pub mod validation;
