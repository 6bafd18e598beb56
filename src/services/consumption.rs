//! Recording of consumption events.
//!
//! [`record`] is the whole workflow: cap check, persistence, activity entry,
//! threshold alerts and stock decrement. It runs against a `&mut EntityStore`,
//! so whoever holds the write guard holds the critical section for every
//! (tool, product) pair at once. [`ConsumptionService`] takes that guard, then
//! publishes events and metrics after releasing it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::notifications::{log_activity, raise_alert};
use crate::clock::{Clock, DayCalendar};
use crate::config::{CapBreachTarget, ConsumptionPolicy};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::metrics::BUSINESS_METRICS;
use crate::models::{
    Activity, ActivityKind, Alert, AlertKind, Caliber, Client, ClientId, Consumption,
    ConsumptionId, EntityRef, NewConsumption, Product, ProductId, Store, StoreId, Tool, ToolId,
};
use crate::store::{EntityStore, SharedStore};

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("quantity");
        err.message = Some("quantity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// A usage event as submitted by callers.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordConsumption {
    pub client_id: ClientId,
    pub product_id: ProductId,
    pub tool_id: ToolId,
    pub store_id: StoreId,
    #[validate(custom = "validate_positive")]
    #[schema(value_type = String, example = "15")]
    pub quantity: Decimal,
    /// Defaults to the time of recording
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Everything one call to [`record`] wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedConsumption {
    pub consumption: Consumption,
    pub activity: Option<Activity>,
    pub alerts: Vec<Alert>,
    /// Tool total for the event's day, including this event. `None` without a tool.
    pub daily_total: Option<Decimal>,
    pub previous_stock: Option<Decimal>,
    pub remaining_stock: Option<Decimal>,
    /// The client, product or tool did not resolve, so only the record was written.
    pub effects_skipped: bool,
}

/// Records one consumption event against `store`.
///
/// Rejections (invalid quantity, capacity, unknown references in strict mode)
/// leave the store untouched.
pub fn record(
    store: &mut EntityStore,
    request: RecordConsumption,
    policy: &ConsumptionPolicy,
    calendar: &DayCalendar,
    now: DateTime<Utc>,
) -> Result<RecordedConsumption, ServiceError> {
    if request.quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "quantity must be greater than 0".into(),
        ));
    }
    let date = request.date.unwrap_or(now);
    let day = calendar.date_of(date);

    if policy.strict_references {
        ensure_exists::<Client>(store, request.client_id)?;
        ensure_exists::<Product>(store, request.product_id)?;
        ensure_exists::<Tool>(store, request.tool_id)?;
    }

    // No tool means no cap to enforce.
    if let Some(tool) = store.get::<Tool>(request.tool_id) {
        let current = store.daily_consumption_by_tool(tool.id, day, calendar);
        if current + request.quantity > tool.max_daily_consumption {
            return Err(ServiceError::CapacityExceeded {
                tool_id: tool.id,
                tool_code: tool.code.clone(),
                limit: tool.max_daily_consumption,
                current,
                requested: request.quantity,
            });
        }
    }

    let consumption: Consumption = store.create(NewConsumption {
        date,
        client_id: request.client_id,
        product_id: request.product_id,
        tool_id: request.tool_id,
        store_id: request.store_id,
        quantity: request.quantity,
    });

    let client = store.get::<Client>(request.client_id).cloned();
    let product = store.get::<Product>(request.product_id).cloned();
    let tool = store.get::<Tool>(request.tool_id).cloned();
    let (client, product, tool) = match (client, product, tool) {
        (Some(client), Some(product), Some(tool)) => (client, product, tool),
        (client, product, tool) => {
            warn!(
                consumption_id = %consumption.id,
                client_missing = client.is_none(),
                product_missing = product.is_none(),
                tool_missing = tool.is_none(),
                "consumption references unknown records; activity, alerts and stock update skipped"
            );
            let daily_total = tool.map(|t| store.daily_consumption_by_tool(t.id, day, calendar));
            return Ok(RecordedConsumption {
                consumption,
                activity: None,
                alerts: Vec::new(),
                daily_total,
                previous_stock: None,
                remaining_stock: None,
                effects_skipped: true,
            });
        }
    };

    let activity = log_activity(
        store,
        ActivityKind::Consumption,
        format!(
            "{} consumed {} {} of {} using tool {}",
            client.name, consumption.quantity, product.unit, product.name, tool.code
        ),
        Some(EntityRef::Client(client.id)),
        now,
    );

    let mut alerts = Vec::new();
    let daily_total = store.daily_consumption_by_tool(tool.id, day, calendar);
    if let Some(pct) = usage_pct(daily_total, tool.max_daily_consumption) {
        debug!(tool_id = %tool.id, %daily_total, %pct, "daily tool usage");
        if pct >= policy.critical_threshold_pct {
            let entity = match policy.cap_breach_alert_target {
                CapBreachTarget::Client => EntityRef::Client(client.id),
                CapBreachTarget::Tool => EntityRef::Tool(tool.id),
            };
            alerts.push(raise_alert(
                store,
                AlertKind::Critical,
                format!(
                    "{} exceeded the consumption limit of tool {}",
                    client.name, tool.code
                ),
                entity,
                now,
            ));
        } else if pct >= policy.warning_threshold_pct {
            alerts.push(raise_alert(
                store,
                AlertKind::Warning,
                format!(
                    "Tool {} at {}% of its daily limit",
                    tool.code,
                    pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                ),
                EntityRef::Tool(tool.id),
                now,
            ));
        }
    }

    let remaining_stock = store.decrement_stock(product.id, consumption.quantity);
    if let Some(stock) = remaining_stock {
        if stock <= policy.low_stock_threshold {
            let caliber = store.get::<Caliber>(product.caliber_id).cloned();
            let shop = store.get::<Store>(product.store_id).cloned();
            if let (Some(caliber), Some(shop)) = (caliber, shop) {
                alerts.push(raise_alert(
                    store,
                    AlertKind::Critical,
                    format!(
                        "Critical stock - Product {} - {} ({} {} left)",
                        caliber.name, shop.name, stock, product.unit
                    ),
                    EntityRef::Product(product.id),
                    now,
                ));
            }
        }
    }

    Ok(RecordedConsumption {
        consumption,
        activity: Some(activity),
        alerts,
        daily_total: Some(daily_total),
        previous_stock: Some(product.stock),
        remaining_stock,
        effects_skipped: false,
    })
}

/// `total` as a percentage of `limit`; `None` when the limit is zero.
fn usage_pct(total: Decimal, limit: Decimal) -> Option<Decimal> {
    total
        .checked_mul(Decimal::ONE_HUNDRED)?
        .checked_div(limit)
}

fn ensure_exists<T: crate::store::Entity>(
    store: &EntityStore,
    id: T::Id,
) -> Result<(), ServiceError> {
    store
        .get::<T>(id)
        .map(|_| ())
        .ok_or_else(|| ServiceError::not_found(T::LABEL, id))
}

/// Query filters for listing consumptions. The first present one wins, in
/// field order.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConsumptionFilter {
    #[param(value_type = Option<u64>)]
    pub client_id: Option<ClientId>,
    #[param(value_type = Option<u64>)]
    pub tool_id: Option<ToolId>,
    #[param(value_type = Option<u64>)]
    pub store_id: Option<StoreId>,
    #[param(value_type = Option<u64>)]
    pub product_id: Option<ProductId>,
    /// Inclusive lower bound, used when no id filter is given
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound, used when no id filter is given
    pub end: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ConsumptionService {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    policy: Arc<ConsumptionPolicy>,
    calendar: DayCalendar,
    events: EventSender,
}

impl ConsumptionService {
    pub fn new(
        store: SharedStore,
        clock: Arc<dyn Clock>,
        policy: ConsumptionPolicy,
        events: EventSender,
    ) -> Self {
        let calendar = policy.calendar();
        Self {
            store,
            clock,
            policy: Arc::new(policy),
            calendar,
            events,
        }
    }

    pub fn calendar(&self) -> DayCalendar {
        self.calendar
    }

    /// The current local day.
    pub fn today(&self) -> NaiveDate {
        self.calendar.date_of(self.clock.now())
    }

    #[instrument(skip(self), fields(tool_id = %request.tool_id, quantity = %request.quantity))]
    pub async fn record(
        &self,
        request: RecordConsumption,
    ) -> Result<RecordedConsumption, ServiceError> {
        request.validate()?;
        let now = self.clock.now();

        let outcome = {
            let mut store = self.store.write().await;
            record(&mut store, request, &self.policy, &self.calendar, now)
        };

        match &outcome {
            Ok(recorded) => self.after_commit(recorded),
            Err(ServiceError::CapacityExceeded {
                tool_id,
                limit,
                current,
                requested,
                ..
            }) => {
                BUSINESS_METRICS.consumptions_rejected.inc();
                warn!(%tool_id, %limit, %current, %requested, "consumption rejected");
                self.events.publish(Event::ConsumptionRejected {
                    tool_id: *tool_id,
                    limit: *limit,
                    current: *current,
                    requested: *requested,
                });
            }
            Err(_) => {}
        }

        outcome
    }

    fn after_commit(&self, recorded: &RecordedConsumption) {
        let consumption = &recorded.consumption;
        BUSINESS_METRICS.consumptions_recorded.inc();
        if recorded.effects_skipped {
            BUSINESS_METRICS.consumption_effects_skipped.inc();
        }
        info!(
            consumption_id = %consumption.id,
            alerts = recorded.alerts.len(),
            "consumption recorded"
        );

        self.events.publish(Event::ConsumptionRecorded {
            consumption_id: consumption.id,
            tool_id: consumption.tool_id,
            product_id: consumption.product_id,
            quantity: consumption.quantity,
            daily_total: recorded.daily_total,
        });
        if let (Some(old_stock), Some(new_stock)) =
            (recorded.previous_stock, recorded.remaining_stock)
        {
            self.events.publish(Event::StockAdjusted {
                product_id: consumption.product_id,
                old_stock,
                new_stock,
            });
        }
        for alert in &recorded.alerts {
            self.events.publish(Event::AlertRaised {
                alert_id: alert.id,
                kind: alert.kind,
                entity: alert.entity,
            });
        }
    }

    pub async fn list(&self, filter: &ConsumptionFilter) -> Vec<Consumption> {
        let store = self.store.read().await;
        if let Some(id) = filter.client_id {
            store.consumptions_by_client(id)
        } else if let Some(id) = filter.tool_id {
            store.consumptions_by_tool(id)
        } else if let Some(id) = filter.store_id {
            store.consumptions_by_store(id)
        } else if let Some(id) = filter.product_id {
            store.consumptions_by_product(id)
        } else if filter.start.is_some() || filter.end.is_some() {
            store.consumptions_between(
                filter.start.unwrap_or(DateTime::<Utc>::MIN_UTC),
                filter.end.unwrap_or(DateTime::<Utc>::MAX_UTC),
            )
        } else {
            store.list::<Consumption>()
        }
    }

    pub async fn get(&self, id: ConsumptionId) -> Result<Consumption, ServiceError> {
        self.store
            .read()
            .await
            .get::<Consumption>(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Consumption", id))
    }

    pub async fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Consumption> {
        self.store.read().await.consumptions_between(start, end)
    }

    pub async fn daily_total(&self, tool: ToolId, day: NaiveDate) -> Decimal {
        self.store
            .read()
            .await
            .daily_consumption_by_tool(tool, day, &self.calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCaliber, NewClient, NewProduct, NewStore, NewTool};
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: EntityStore,
        client: ClientId,
        product: ProductId,
        tool: ToolId,
        shop: StoreId,
    }

    fn fixture(cap: Decimal, stock: Decimal) -> Fixture {
        let mut store = EntityStore::new();
        let shop: Store = store.create(NewStore {
            name: "Magasin 1".into(),
            location: Some("Paris".into()),
            manager: None,
        });
        let caliber: Caliber = store.create(NewCaliber {
            name: "Calibre A".into(),
            description: None,
        });
        let tool: Tool = store.create(NewTool {
            code: "XYZ-123".into(),
            name: "Tool XYZ".into(),
            description: None,
            max_daily_consumption: cap,
        });
        let client: Client = store.create(NewClient {
            name: "Client A".into(),
            email: None,
            phone: None,
            store_id: shop.id,
        });
        let product: Product = store.create(NewProduct {
            name: "Product A1".into(),
            caliber_id: caliber.id,
            store_id: shop.id,
            description: None,
            unit: "kg".into(),
            stock,
        });
        Fixture {
            store,
            client: client.id,
            product: product.id,
            tool: tool.id,
            shop: shop.id,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn request(f: &Fixture, quantity: Decimal) -> RecordConsumption {
        RecordConsumption {
            client_id: f.client,
            product_id: f.product,
            tool_id: f.tool,
            store_id: f.shop,
            quantity,
            date: None,
        }
    }

    fn run(f: &mut Fixture, quantity: Decimal) -> Result<RecordedConsumption, ServiceError> {
        let req = request(f, quantity);
        record(
            &mut f.store,
            req,
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        )
    }

    #[test]
    fn over_capacity_is_rejected_without_mutation() {
        let mut f = fixture(dec!(100), dec!(1000));
        run(&mut f, dec!(60)).unwrap();
        let alerts_before = f.store.count::<Alert>();
        let activities_before = f.store.count::<Activity>();

        let err = run(&mut f, dec!(50)).unwrap_err();
        assert_matches!(
            err,
            ServiceError::CapacityExceeded { limit, current, requested, ref tool_code, .. }
                if limit == dec!(100) && current == dec!(60) && requested == dec!(50) && tool_code == "XYZ-123"
        );

        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            f.store
                .daily_consumption_by_tool(f.tool, day, &DayCalendar::utc()),
            dec!(60)
        );
        assert_eq!(f.store.count::<Consumption>(), 1);
        assert_eq!(f.store.count::<Alert>(), alerts_before);
        assert_eq!(f.store.count::<Activity>(), activities_before);
        assert_eq!(
            f.store.get::<Product>(f.product).unwrap().stock,
            dec!(940)
        );
    }

    #[test]
    fn ninety_two_percent_warns_on_the_tool() {
        let mut f = fixture(dec!(100), dec!(1000));
        let recorded = run(&mut f, dec!(92)).unwrap();

        assert_eq!(recorded.alerts.len(), 1);
        let alert = &recorded.alerts[0];
        assert_eq!(alert.kind, AlertKind::Warning);
        assert_eq!(alert.entity, EntityRef::Tool(f.tool));
        assert_eq!(alert.message, "Tool XYZ-123 at 92% of its daily limit");
        assert_eq!(recorded.daily_total, Some(dec!(92)));
    }

    #[test]
    fn reaching_the_cap_raises_critical_on_the_client() {
        let mut f = fixture(dec!(100), dec!(1000));
        let recorded = run(&mut f, dec!(100)).unwrap();

        assert_eq!(recorded.alerts.len(), 1);
        let alert = &recorded.alerts[0];
        assert_eq!(alert.kind, AlertKind::Critical);
        assert_eq!(alert.entity, EntityRef::Client(f.client));
        assert!(alert.message.contains("Client A"));
        assert!(alert.message.contains("XYZ-123"));
    }

    #[test]
    fn cap_breach_target_can_be_the_tool() {
        let mut f = fixture(dec!(100), dec!(1000));
        let policy = ConsumptionPolicy {
            cap_breach_alert_target: CapBreachTarget::Tool,
            ..ConsumptionPolicy::default()
        };
        let req = request(&f, dec!(100));
        let recorded = record(&mut f.store, req, &policy, &DayCalendar::utc(), now()).unwrap();
        assert_eq!(recorded.alerts[0].entity, EntityRef::Tool(f.tool));
    }

    #[rstest]
    #[case(dec!(89), None)]
    #[case(dec!(90), Some(AlertKind::Warning))]
    #[case(dec!(99.5), Some(AlertKind::Warning))]
    #[case(dec!(100), Some(AlertKind::Critical))]
    fn threshold_bands(#[case] quantity: Decimal, #[case] expected: Option<AlertKind>) {
        let mut f = fixture(dec!(100), dec!(1000));
        let recorded = run(&mut f, quantity).unwrap();
        let kinds: Vec<_> = recorded.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn low_stock_alert_names_caliber_and_store() {
        let mut f = fixture(dec!(100), dec!(60));
        let recorded = run(&mut f, dec!(15)).unwrap();

        assert_eq!(recorded.remaining_stock, Some(dec!(45)));
        assert_eq!(f.store.get::<Product>(f.product).unwrap().stock, dec!(45));

        let stock_alerts: Vec<_> = recorded
            .alerts
            .iter()
            .filter(|a| a.entity == EntityRef::Product(f.product))
            .collect();
        assert_eq!(stock_alerts.len(), 1);
        assert_eq!(stock_alerts[0].kind, AlertKind::Critical);
        assert!(stock_alerts[0].message.contains("Calibre A"));
        assert!(stock_alerts[0].message.contains("Magasin 1"));
    }

    #[test]
    fn healthy_stock_raises_nothing() {
        let mut f = fixture(dec!(100), dec!(200));
        let recorded = run(&mut f, dec!(10)).unwrap();
        assert!(recorded.alerts.is_empty());
        assert_eq!(recorded.remaining_stock, Some(dec!(190)));
    }

    #[test]
    fn stock_may_go_negative() {
        let mut f = fixture(dec!(100), dec!(10));
        let recorded = run(&mut f, dec!(15)).unwrap();
        assert_eq!(recorded.remaining_stock, Some(dec!(-5)));
    }

    #[test]
    fn yesterday_does_not_count_toward_today() {
        let mut f = fixture(dec!(100), dec!(1000));
        let mut earlier = request(&f, dec!(80));
        earlier.date = Some(now() - Duration::days(1));
        record(
            &mut f.store,
            earlier,
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        )
        .unwrap();

        let recorded = run(&mut f, dec!(80)).unwrap();
        assert_eq!(recorded.daily_total, Some(dec!(80)));
    }

    #[test]
    fn backdated_event_is_checked_against_its_own_day() {
        let mut f = fixture(dec!(100), dec!(1000));
        let mut earlier = request(&f, dec!(80));
        earlier.date = Some(now() - Duration::days(1));
        record(
            &mut f.store,
            earlier.clone(),
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        )
        .unwrap();

        earlier.quantity = dec!(30);
        let result = record(
            &mut f.store,
            earlier,
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        );
        assert_matches!(result, Err(ServiceError::CapacityExceeded { current, .. }) if current == dec!(80));
    }

    #[test]
    fn activity_describes_who_used_what() {
        let mut f = fixture(dec!(100), dec!(1000));
        let recorded = run(&mut f, dec!(15)).unwrap();
        let activity = recorded.activity.unwrap();
        assert_eq!(activity.kind, ActivityKind::Consumption);
        assert_eq!(activity.entity, Some(EntityRef::Client(f.client)));
        assert_eq!(
            activity.message,
            "Client A consumed 15 kg of Product A1 using tool XYZ-123"
        );
    }

    #[test]
    fn dangling_client_keeps_record_but_skips_effects() {
        let mut f = fixture(dec!(100), dec!(60));
        let mut req = request(&f, dec!(15));
        req.client_id = ClientId(99);
        let recorded = record(
            &mut f.store,
            req,
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        )
        .unwrap();

        assert!(recorded.effects_skipped);
        assert!(recorded.activity.is_none());
        assert!(recorded.alerts.is_empty());
        assert_eq!(f.store.count::<Consumption>(), 1);
        assert_eq!(f.store.count::<Activity>(), 0);
        assert_eq!(f.store.get::<Product>(f.product).unwrap().stock, dec!(60));
    }

    #[test]
    fn missing_tool_means_no_cap() {
        let mut f = fixture(dec!(100), dec!(5000));
        let mut req = request(&f, dec!(1000));
        req.tool_id = ToolId(77);
        let recorded = record(
            &mut f.store,
            req,
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        )
        .unwrap();
        assert!(recorded.effects_skipped);
        assert_eq!(recorded.daily_total, None);
    }

    #[test]
    fn strict_references_reject_before_writing() {
        let mut f = fixture(dec!(100), dec!(60));
        let policy = ConsumptionPolicy {
            strict_references: true,
            ..ConsumptionPolicy::default()
        };
        let mut req = request(&f, dec!(15));
        req.product_id = ProductId(99);

        let result = record(&mut f.store, req, &policy, &DayCalendar::utc(), now());
        assert_matches!(result, Err(ServiceError::NotFound(msg)) if msg.contains("Product"));
        assert_eq!(f.store.count::<Consumption>(), 0);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-3))]
    fn non_positive_quantity_is_invalid(#[case] quantity: Decimal) {
        let mut f = fixture(dec!(100), dec!(60));
        assert_matches!(run(&mut f, quantity), Err(ServiceError::ValidationError(_)));
        assert_eq!(f.store.count::<Consumption>(), 0);
    }

    #[test]
    fn zero_cap_rejects_everything() {
        let mut f = fixture(dec!(0), dec!(60));
        assert_matches!(
            run(&mut f, dec!(0.1)),
            Err(ServiceError::CapacityExceeded { .. })
        );
    }

    #[test]
    fn explicit_date_is_kept() {
        let mut f = fixture(dec!(100), dec!(60));
        let when = Utc.with_ymd_and_hms(2024, 4, 30, 8, 15, 0).unwrap();
        let mut req = request(&f, dec!(5));
        req.date = Some(when);
        let recorded = record(
            &mut f.store,
            req,
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        )
        .unwrap();
        assert_eq!(recorded.consumption.date, when);
        // the activity is stamped with the recording time
        assert_eq!(recorded.activity.unwrap().date, now());
    }

    #[tokio::test]
    async fn service_publishes_events_after_commit() {
        let f = fixture(dec!(100), dec!(60));
        let req = request(&f, dec!(15));
        let (events, mut rx) = EventSender::channel(16);
        let service = ConsumptionService::new(
            crate::store::shared(f.store),
            Arc::new(crate::clock::ManualClock::new(now())),
            ConsumptionPolicy::default(),
            events,
        );

        service.record(req).await.unwrap();

        assert_matches!(rx.recv().await, Some(Event::ConsumptionRecorded { quantity, .. }) if quantity == dec!(15));
        assert_matches!(rx.recv().await, Some(Event::StockAdjusted { new_stock, .. }) if new_stock == dec!(45));
        assert_matches!(rx.recv().await, Some(Event::AlertRaised { kind: AlertKind::Critical, .. }));
    }

    #[tokio::test]
    async fn list_filter_order_is_client_tool_store_product() {
        let mut f = fixture(dec!(1000), dec!(1000));
        run(&mut f, dec!(1)).unwrap();
        let mut other = request(&f, dec!(2));
        other.client_id = ClientId(50);
        record(
            &mut f.store,
            other,
            &ConsumptionPolicy::default(),
            &DayCalendar::utc(),
            now(),
        )
        .unwrap();

        let (events, _rx) = EventSender::channel(4);
        let client = f.client;
        let tool = f.tool;
        let service = ConsumptionService::new(
            crate::store::shared(f.store),
            Arc::new(crate::clock::ManualClock::new(now())),
            ConsumptionPolicy::default(),
            events,
        );

        let by_client = service
            .list(&ConsumptionFilter {
                client_id: Some(client),
                tool_id: Some(tool),
                ..Default::default()
            })
            .await;
        assert_eq!(by_client.len(), 1);

        let by_tool = service
            .list(&ConsumptionFilter {
                tool_id: Some(tool),
                ..Default::default()
            })
            .await;
        assert_eq!(by_tool.len(), 2);

        let upcoming = service
            .list(&ConsumptionFilter {
                start: Some(now() + Duration::minutes(1)),
                ..Default::default()
            })
            .await;
        assert!(upcoming.is_empty());
        let up_to_now = service
            .list(&ConsumptionFilter {
                end: Some(now()),
                ..Default::default()
            })
            .await;
        assert_eq!(up_to_now.len(), 2);

        assert_matches!(
            service.get(ConsumptionId(3)).await,
            Err(ServiceError::NotFound(_))
        );
    }
}
