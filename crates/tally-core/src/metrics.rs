//! # Sales Metrics
//!
//! Reporting aggregates over a store's sales in a date range.
//!
//! ```text
//! sales ──► filter createdAt ∈ [start, end] ──► totalSales   = Σ total
//!                                               totalOrders  = count
//!                                               averageOrder = totalSales / totalOrders
//!                                                              (0 when no orders)
//! ```
//!
//! Refunded sales are counted like any other sale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Sale;

/// An inclusive time window. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub start: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// A range covering all time.
    pub fn all() -> Self {
        DateRange::default()
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }

    /// True when the start lies after the end; such a range matches nothing.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesMetrics {
    pub total_sales: Money,
    pub total_orders: u64,
    pub average_order_value: Money,
}

impl SalesMetrics {
    /// Aggregates the sales whose `created_at` falls inside `range`.
    ///
    /// ## Errors
    /// `AmountOverflow` if the totals do not fit in a `Money`.
    pub fn from_sales<'a, I>(sales: I, range: &DateRange) -> CoreResult<Self>
    where
        I: IntoIterator<Item = &'a Sale>,
    {
        let (total, count) = sales
            .into_iter()
            .filter(|s| range.contains(s.created_at))
            .try_fold((Money::zero(), 0u64), |(total, count), s| {
                Some((total.checked_add(s.total)?, count + 1))
            })
            .ok_or(CoreError::AmountOverflow)?;

        Ok(SalesMetrics::from_totals(total, count))
    }

    /// Builds metrics from a precomputed sum and count.
    pub fn from_totals(total_sales: Money, total_orders: u64) -> Self {
        let average_order_value = if total_orders == 0 {
            Money::zero()
        } else {
            Money::new(total_sales.amount() / Decimal::from(total_orders))
        };

        SalesMetrics {
            total_sales,
            total_orders,
            average_order_value,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
