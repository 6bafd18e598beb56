//! Read-only rollups behind the dashboard.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::clock::{Clock, DayCalendar};
use crate::models::{
    Caliber, CaliberId, Client, Consumption, Product, ProductId, Store, StoreId, Tool,
};
use crate::store::{EntityStore, SharedStore};

/// Chart colours handed to calibers by position, wrapping around.
pub const CALIBER_PALETTE: [&str; 4] = ["#1976D2", "#388E3C", "#F57C00", "#D32F2F"];

// Growth figures need creation timestamps the catalog does not keep.
const PRODUCT_INCREASE: &str = "12%";
const CLIENT_INCREASE: &str = "8%";
const TOOL_INCREASE: &str = "5%";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub total_clients: usize,
    pub total_tools: usize,
    /// Today's total, e.g. `"50 kg"`
    #[schema(example = "50 kg")]
    pub daily_consumption: String,
    pub product_increase: String,
    pub client_increase: String,
    pub tool_increase: String,
    /// Drop of today's total against yesterday's; negative when usage grew
    #[schema(example = "3%")]
    pub consumption_decrease: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreConsumption {
    pub store_id: StoreId,
    pub store_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub consumption: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaliberConsumption {
    pub caliber_id: CaliberId,
    pub caliber_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub consumption: Decimal,
    /// Share of the window's total, 0 to 100
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub percentage: Decimal,
    pub color: String,
}

fn total_on(store: &EntityStore, calendar: &DayCalendar, day: chrono::NaiveDate) -> Decimal {
    store
        .list_where(|c: &Consumption| calendar.date_of(c.date) == day)
        .iter()
        .map(|c| c.quantity)
        .sum()
}

pub fn dashboard_stats(
    store: &EntityStore,
    calendar: &DayCalendar,
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = calendar.date_of(now);
    let today_total = total_on(store, calendar, today);
    let yesterday_total = today
        .pred_opt()
        .map(|day| total_on(store, calendar, day))
        .unwrap_or_default();

    DashboardStats {
        total_products: store.count::<Product>(),
        total_clients: store.count::<Client>(),
        total_tools: store.count::<Tool>(),
        daily_consumption: format!("{} kg", today_total.normalize()),
        product_increase: PRODUCT_INCREASE.to_string(),
        client_increase: CLIENT_INCREASE.to_string(),
        tool_increase: TOOL_INCREASE.to_string(),
        consumption_decrease: format!("{}%", decrease_pct(yesterday_total, today_total)),
    }
}

fn decrease_pct(before: Decimal, after: Decimal) -> Decimal {
    (before - after)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(before))
        .map(|pct| pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or_default()
        .normalize()
}

/// Consumptions in `[now - days, now]`; nothing when `days <= 0`.
fn window(store: &EntityStore, now: DateTime<Utc>, days: i64) -> Vec<Consumption> {
    if days <= 0 {
        return Vec::new();
    }
    let start = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    store.consumptions_between(start, now)
}

/// One row per store, zero rows included, in store order.
pub fn consumption_by_store(
    store: &EntityStore,
    now: DateTime<Utc>,
    days: i64,
) -> Vec<StoreConsumption> {
    let mut totals: HashMap<StoreId, Decimal> = HashMap::new();
    for consumption in window(store, now, days) {
        *totals.entry(consumption.store_id).or_default() += consumption.quantity;
    }

    store
        .list::<Store>()
        .into_iter()
        .map(|shop| StoreConsumption {
            consumption: totals.get(&shop.id).copied().unwrap_or_default(),
            store_id: shop.id,
            store_name: shop.name,
        })
        .collect()
}

/// One row per caliber with its share of the window.
///
/// Shares are taken over every consumption in the window. Consumptions whose
/// product no longer exists land in no bucket but still count toward the
/// total, so shares only add up to 100 when everything is attributed.
pub fn consumption_by_caliber(
    store: &EntityStore,
    now: DateTime<Utc>,
    days: i64,
) -> Vec<CaliberConsumption> {
    let caliber_of: HashMap<ProductId, CaliberId> = store
        .list::<Product>()
        .into_iter()
        .map(|p| (p.id, p.caliber_id))
        .collect();

    let mut totals: HashMap<CaliberId, Decimal> = HashMap::new();
    let mut grand_total = Decimal::ZERO;
    for consumption in window(store, now, days) {
        grand_total += consumption.quantity;
        if let Some(caliber) = caliber_of.get(&consumption.product_id) {
            *totals.entry(*caliber).or_default() += consumption.quantity;
        }
    }

    store
        .list::<Caliber>()
        .into_iter()
        .enumerate()
        .map(|(index, caliber)| {
            let consumption = totals.get(&caliber.id).copied().unwrap_or_default();
            let percentage = consumption
                .checked_mul(Decimal::ONE_HUNDRED)
                .and_then(|scaled| scaled.checked_div(grand_total))
                .unwrap_or_default();
            CaliberConsumption {
                caliber_id: caliber.id,
                caliber_name: caliber.name,
                consumption,
                percentage,
                color: CALIBER_PALETTE[index % CALIBER_PALETTE.len()].to_string(),
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    calendar: DayCalendar,
}

impl AnalyticsService {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, calendar: DayCalendar) -> Self {
        Self {
            store,
            clock,
            calendar,
        }
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        dashboard_stats(&*self.store.read().await, &self.calendar, self.clock.now())
    }

    pub async fn consumption_by_store(&self, days: i64) -> Vec<StoreConsumption> {
        consumption_by_store(&*self.store.read().await, self.clock.now(), days)
    }

    pub async fn consumption_by_caliber(&self, days: i64) -> Vec<CaliberConsumption> {
        consumption_by_caliber(&*self.store.read().await, self.clock.now(), days)
    }
}
