// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stockroom_model::TransactionKind;
use uuid::Uuid;

use crate::errors::ApiError;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PRODUCT_PAGE_LIMIT: usize = 10_000;
pub const MAX_TRANSACTION_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: usize,
    pub limit: usize,
}

impl PageParams {
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

/// Pagination envelope returned alongside every list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    #[must_use]
    pub fn new(page: &PageParams, total: usize) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: total.div_ceil(page.limit),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductParams {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionParams {
    pub kind: Option<TransactionKind>,
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryParams {
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Excel,
}

pub fn parse_page_params(
    query: &BTreeMap<String, String>,
    max_limit: usize,
) -> Result<PageParams, ApiError> {
    let page = match query.get("page") {
        Some(raw) => {
            let value: usize = raw
                .parse()
                .map_err(|_| ApiError::invalid_param("page", raw))?;
            if value == 0 {
                return Err(ApiError::invalid_param("page", raw));
            }
            value
        }
        None => 1,
    };
    let limit = match query.get("limit") {
        Some(raw) => {
            let value: usize = raw
                .parse()
                .map_err(|_| ApiError::invalid_param("limit", raw))?;
            if value == 0 || value > max_limit {
                return Err(ApiError::invalid_param("limit", raw));
            }
            value
        }
        None => DEFAULT_PAGE_LIMIT,
    };
    Ok(PageParams { page, limit })
}

pub fn parse_product_params(query: &BTreeMap<String, String>) -> Result<ProductParams, ApiError> {
    Ok(ProductParams {
        search: query.get("search").filter(|s| !s.is_empty()).cloned(),
        category_id: parse_uuid_param(query, "categoryId")?,
        is_active: parse_bool_param(query, "isActive")?,
    })
}

pub fn parse_transaction_params(
    query: &BTreeMap<String, String>,
) -> Result<TransactionParams, ApiError> {
    let kind = match query.get("type") {
        Some(raw) => Some(
            raw.parse::<TransactionKind>()
                .map_err(|_| ApiError::invalid_param("type", raw))?,
        ),
        None => None,
    };
    let (start_date, end_date) = parse_date_range(query)?;
    Ok(TransactionParams {
        kind,
        warehouse_id: parse_uuid_param(query, "warehouseId")?,
        product_id: parse_uuid_param(query, "productId")?,
        start_date,
        end_date,
    })
}

pub fn parse_inventory_params(
    query: &BTreeMap<String, String>,
) -> Result<InventoryParams, ApiError> {
    Ok(InventoryParams {
        warehouse_id: parse_uuid_param(query, "warehouseId")?,
        product_id: parse_uuid_param(query, "productId")?,
        category_id: parse_uuid_param(query, "categoryId")?,
        low_stock: parse_bool_param(query, "lowStock")?.unwrap_or(false),
    })
}

pub fn parse_report_format(query: &BTreeMap<String, String>) -> Result<ReportFormat, ApiError> {
    match query.get("format").map(String::as_str) {
        None | Some("json") => Ok(ReportFormat::Json),
        Some("excel") => Ok(ReportFormat::Excel),
        Some(other) => Err(ApiError::invalid_param("format", other)),
    }
}

pub fn parse_trend_days(query: &BTreeMap<String, String>) -> Result<i64, ApiError> {
    match query.get("days") {
        Some(raw) => {
            let value: i64 = raw
                .parse()
                .map_err(|_| ApiError::invalid_param("days", raw))?;
            if value < 1 || value > 365 {
                return Err(ApiError::invalid_param("days", raw));
            }
            Ok(value)
        }
        None => Ok(30),
    }
}

/// Start/end dates are RFC 3339; an inverted range is rejected up front.
pub fn parse_date_range(
    query: &BTreeMap<String, String>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ApiError> {
    let start = parse_date_param(query, "startDate")?;
    let end = parse_date_param(query, "endDate")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(ApiError::validation("startDate must not be after endDate"));
        }
    }
    Ok((start, end))
}

fn parse_date_param(
    query: &BTreeMap<String, String>,
    name: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match query.get(name) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| ApiError::invalid_param(name, raw)),
        None => Ok(None),
    }
}

fn parse_uuid_param(
    query: &BTreeMap<String, String>,
    name: &str,
) -> Result<Option<Uuid>, ApiError> {
    match query.get(name) {
        Some(raw) => raw
            .parse::<Uuid>()
            .map(Some)
            .map_err(|_| ApiError::invalid_param(name, raw)),
        None => Ok(None),
    }
}

fn parse_bool_param(
    query: &BTreeMap<String, String>,
    name: &str,
) -> Result<Option<bool>, ApiError> {
    match query.get(name).map(String::as_str) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(ApiError::invalid_param(name, other)),
    }
}
