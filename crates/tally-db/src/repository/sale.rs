//! # Sale Repository
//!
//! Database operations for sales, sale items and sales metrics.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_sale(request)                              │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── store exists?                    no → NotFound("Store")          │
//! │   ├── per item:                                                        │
//! │   │     subtotal = price_line(price, qty, modifiers, discounts)        │
//! │   │                out of range → AmountOutOfRange("items[i]")     │
//! │   │     name     = current product name (if the product exists)        │
//! │   ├── Σ subtotal ≠ request.total?      → warn, keep request.total      │
//! │   ├── INSERT sales (status completed, timestamps assigned here)        │
//! │   └── INSERT sale_items (position keeps cart order)                    │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are never updated by this repository.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tally_core::cart::price_line;
use tally_core::{
    DateRange, Money, PaymentMethod, Sale, SaleItem, SaleRequest, SaleStatus, SalesMetrics,
};
use tracing::{debug, warn};

use super::{format_timestamp, from_json, new_id, now, parse_money, parse_timestamp, to_json};
use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: String,
    store: String,
    total: String,
    payment_method: PaymentMethod,
    status: SaleStatus,
    created_at: String,
    updated_at: String,
}

#[derive(sqlx::FromRow)]
struct SaleItemRow {
    sale_id: String,
    product: String,
    name: Option<String>,
    quantity: i64,
    price: String,
    modifiers: String,
    discounts: String,
    subtotal: String,
}

impl TryFrom<SaleItemRow> for SaleItem {
    type Error = DbError;

    fn try_from(row: SaleItemRow) -> DbResult<Self> {
        Ok(SaleItem {
            price: parse_money("price", &row.price)?,
            modifiers: from_json("modifiers", &row.modifiers)?,
            discounts: from_json("discounts", &row.discounts)?,
            subtotal: parse_money("subtotal", &row.subtotal)?,
            product: row.product,
            name: row.name,
            quantity: row.quantity,
        })
    }
}

fn assemble(row: SaleRow, items: Vec<SaleItem>) -> DbResult<Sale> {
    Ok(Sale {
        total: parse_money("total", &row.total)?,
        created_at: parse_timestamp("created_at", &row.created_at)?,
        updated_at: parse_timestamp("updated_at", &row.updated_at)?,
        id: row.id,
        store: row.store,
        items,
        payment_method: row.payment_method,
        status: row.status,
    })
}

/// Range bounds as stored-timestamp strings; `None` means unbounded.
fn range_bounds(range: &DateRange) -> (Option<String>, Option<String>) {
    (
        range.start.map(format_timestamp),
        range.end.map(format_timestamp),
    )
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a validated sale request as a completed sale.
    ///
    /// ## Errors
    /// `NotFound` if the store does not exist; `AmountOutOfRange` if a line
    /// prices outside the supported money range.
    pub async fn create_sale(&self, request: &SaleRequest) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let store_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores WHERE id = ?1")
            .bind(&request.store)
            .fetch_one(&mut *tx)
            .await?;
        if store_exists == 0 {
            return Err(DbError::not_found("Store", &request.store));
        }

        let mut items = Vec::with_capacity(request.items.len());
        for (index, item) in request.items.iter().enumerate() {
            let subtotal = price_line(item.price, item.quantity, &item.modifiers, &item.discounts)
                .map_err(|_| DbError::amount_out_of_range(format!("items[{index}]")))?;

            let name: Option<String> =
                sqlx::query_scalar("SELECT name FROM products WHERE id = ?1 AND store = ?2")
                    .bind(&item.product)
                    .bind(&request.store)
                    .fetch_optional(&mut *tx)
                    .await?;

            items.push(SaleItem {
                product: item.product.clone(),
                name,
                quantity: item.quantity,
                price: item.price,
                modifiers: item.modifiers.clone(),
                discounts: item.discounts.clone(),
                subtotal,
            });
        }

        match Money::checked_sum(items.iter().map(|i| i.subtotal)) {
            Some(computed) if computed != request.total => warn!(
                store = %request.store,
                submitted = %request.total.amount(),
                computed = %computed.amount(),
                "Submitted sale total differs from line subtotals"
            ),
            Some(_) => {}
            None => warn!(
                store = %request.store,
                submitted = %request.total.amount(),
                "Line subtotals overflow; keeping submitted total"
            ),
        }

        let at = now();
        let sale = Sale {
            id: new_id(),
            store: request.store.clone(),
            items,
            total: request.total,
            payment_method: request.payment_method,
            status: SaleStatus::Completed,
            created_at: at,
            updated_at: at,
        };

        debug!(id = %sale.id, store = %sale.store, items = sale.items.len(), "Creating sale");

        sqlx::query(
            r#"
            INSERT INTO sales (id, store, total, payment_method, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.store)
        .bind(sale.total.amount().to_string())
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(format_timestamp(at))
        .execute(&mut *tx)
        .await?;

        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, position, product, name,
                    quantity, price, modifiers, discounts, subtotal
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(new_id())
            .bind(&sale.id)
            .bind(position as i64)
            .bind(&item.product)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.price.amount().to_string())
            .bind(to_json("modifiers", &item.modifiers)?)
            .bind(to_json("discounts", &item.discounts)?)
            .bind(item.subtotal.amount().to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(sale)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Sale> {
        let row: Option<SaleRow> = sqlx::query_as(
            r#"
            SELECT id, store, total, payment_method, status, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let row = row.ok_or_else(|| DbError::not_found("Sale", id))?;

        let items: Vec<SaleItemRow> = sqlx::query_as(
            r#"
            SELECT sale_id, product, name, quantity, price, modifiers, discounts, subtotal
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let items = items
            .into_iter()
            .map(SaleItem::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        assemble(row, items)
    }

    /// Lists a store's sales in `range`, newest first.
    pub async fn list_by_store(&self, store_id: &str, range: &DateRange) -> DbResult<Vec<Sale>> {
        if range.is_inverted() {
            return Ok(Vec::new());
        }
        let (start, end) = range_bounds(range);

        let rows: Vec<SaleRow> = sqlx::query_as(
            r#"
            SELECT id, store, total, payment_method, status, created_at, updated_at
            FROM sales
            WHERE store = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(store_id)
        .bind(&start)
        .bind(&end)
        .fetch_all(&self.pool)
        .await?;

        let item_rows: Vec<SaleItemRow> = sqlx::query_as(
            r#"
            SELECT si.sale_id, si.product, si.name, si.quantity, si.price,
                   si.modifiers, si.discounts, si.subtotal
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.store = ?1
              AND (?2 IS NULL OR s.created_at >= ?2)
              AND (?3 IS NULL OR s.created_at <= ?3)
            ORDER BY si.sale_id, si.position
            "#,
        )
        .bind(store_id)
        .bind(&start)
        .bind(&end)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in item_rows {
            let sale_id = row.sale_id.clone();
            items_by_sale
                .entry(sale_id)
                .or_default()
                .push(SaleItem::try_from(row)?);
        }

        debug!(store = %store_id, count = rows.len(), "Listed sales");

        rows.into_iter()
            .map(|row| {
                let items = items_by_sale.remove(&row.id).unwrap_or_default();
                assemble(row, items)
            })
            .collect()
    }

    /// Totals, order count and average order value for a store's sales in
    /// `range`. Summed in decimal, not in SQL, so amounts stay exact.
    pub async fn metrics(&self, store_id: &str, range: &DateRange) -> DbResult<SalesMetrics> {
        if range.is_inverted() {
            return Ok(SalesMetrics::from_totals(Money::zero(), 0));
        }
        let (start, end) = range_bounds(range);

        let totals: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT total
            FROM sales
            WHERE store = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            "#,
        )
        .bind(store_id)
        .bind(&start)
        .bind(&end)
        .fetch_all(&self.pool)
        .await?;

        let amounts = totals
            .iter()
            .map(|raw| parse_money("total", raw))
            .collect::<DbResult<Vec<Money>>>()?;
        let sum = Money::checked_sum(amounts)
            .ok_or_else(|| DbError::amount_out_of_range("total"))?;

        Ok(SalesMetrics::from_totals(sum, totals.len() as u64))
    }
}
