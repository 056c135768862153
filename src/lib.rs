//! medstock-core
//!
//! Inventory consistency core for a medical supply warehouse. Tracks on-hand
//! quantities of medicines and medical devices at the main warehouse and at
//! branch locations, and fulfills multi-line shipments against those
//! quantities without ever overselling: every decrement is an atomic
//! conditional write, and a shipment either commits in full or leaves every
//! counter exactly where it started.
//!
//! The crate is a library-level component. Persisting shipment documents,
//! rendering waybills, and the HTTP surface that calls into this crate are
//! the embedding application's concern.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod stock;

pub use errors::ServiceError;
pub use models::{
    FulfillShipmentCommand, FulfillmentOutcome, FulfillmentValidation, ItemCategory, LineShortage,
    ShipmentLine, StockKey,
};
pub use services::fulfillment::FulfillmentService;
pub use stock::{DatabaseStockStore, InMemoryStockStore, StockError, StockOnHand, StockStore};
