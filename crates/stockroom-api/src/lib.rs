#![forbid(unsafe_code)]
//! Wire surface of the stockroom service.
//!
//! Everything a client can send or receive lives here: the machine error
//! contract, request body DTOs, and query-string parsing. The server crate
//! maps these onto handlers; the store crate never sees them.

mod dto;
mod errors;
mod params;

pub use dto::{
    ChangePasswordRequest, CreateCategoryRequest, CreateProductRequest, CreateTransactionRequest,
    CreateWarehouseRequest, LoginRequest, RegisterRequest, UpdateCategoryRequest,
    UpdateProductRequest, UpdateProfileRequest, UpdateWarehouseRequest,
};
pub use errors::{api_error_status, ApiError, ApiErrorCode};
pub use params::{
    parse_date_range, parse_inventory_params, parse_page_params, parse_product_params,
    parse_report_format, parse_transaction_params, parse_trend_days, InventoryParams, PageParams,
    Pagination, ProductParams, ReportFormat, TransactionParams, DEFAULT_PAGE_LIMIT,
    MAX_PRODUCT_PAGE_LIMIT, MAX_TRANSACTION_PAGE_LIMIT,
};

pub const CRATE_NAME: &str = "stockroom-api";
