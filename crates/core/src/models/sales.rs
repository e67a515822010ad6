use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single order as returned by the sales platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Creation timestamp with the shop's UTC offset
    pub created_at: DateTime<FixedOffset>,

    /// Order total in the shop currency
    pub total_price: f64,
}

impl Order {
    pub fn new(created_at: DateTime<FixedOffset>, total_price: f64) -> Self {
        Self {
            created_at,
            total_price,
        }
    }

    /// Calendar date in the shop's own timezone, which is how the shop reports sales.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Sales totals for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,

    /// Sum of order totals
    pub revenue: f64,

    pub order_count: u64,
}

impl SalesRecord {
    pub fn new(date: NaiveDate, revenue: f64, order_count: u64) -> Self {
        Self {
            date,
            revenue,
            order_count,
        }
    }

    /// Bucket orders by shop-local date. Output is sorted by date, one record per day with orders.
    pub fn from_orders(orders: &[Order]) -> Vec<SalesRecord> {
        let mut by_day: BTreeMap<NaiveDate, SalesRecord> = BTreeMap::new();
        for order in orders {
            let date = order.date();
            let record = by_day
                .entry(date)
                .or_insert_with(|| SalesRecord::new(date, 0.0, 0));
            record.revenue += order.total_price;
            record.order_count += 1;
        }
        by_day.into_values().collect()
    }

    /// Average order value for the day, undefined without orders.
    #[must_use]
    pub fn average_order_value(&self) -> Option<f64> {
        (self.order_count > 0).then(|| self.revenue / self.order_count as f64)
    }
}
