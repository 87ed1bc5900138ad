#![forbid(unsafe_code)]
//! Stockroom domain model SSOT.
//!
//! Row types and field validators for every entity the service persists.
//! Validators return `ValidationError` with a human-readable field message;
//! the HTTP layer maps them onto the wire error contract.

mod category;
mod inventory;
mod product;
mod role;
mod transaction;
mod user;
mod validate;
mod warehouse;

pub use category::{validate_category_name, Category};
pub use inventory::Inventory;
pub use product::{
    validate_product_code, validate_product_name, validate_unit, Product, PRODUCT_CODE_MAX_LEN,
    PRODUCT_NAME_MAX_LEN,
};
pub use role::Role;
pub use transaction::{
    reference_number, StockTransaction, TransactionKind, TransactionStatus,
};
pub use user::{
    validate_email, validate_password, validate_person_name, validate_username, User,
};
pub use validate::ValidationError;
pub use warehouse::{validate_warehouse_code, validate_warehouse_name, Warehouse};

pub const CRATE_NAME: &str = "stockroom-model";
