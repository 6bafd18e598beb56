//! Alerts and the activity feed.
//!
//! The free functions work on a borrowed [`EntityStore`] so the consumption
//! recorder can emit alerts inside its own critical section. The service wraps
//! them for callers that hold no lock.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::clock::Clock;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::metrics::BUSINESS_METRICS;
use crate::models::{
    Activity, ActivityKind, Alert, AlertId, AlertKind, EntityKind, EntityRef, NewActivity,
    NewAlert,
};
use crate::store::{EntityStore, SharedStore};

/// Stores an unresolved alert stamped with `now`.
pub fn raise_alert(
    store: &mut EntityStore,
    kind: AlertKind,
    message: impl Into<String>,
    entity: EntityRef,
    now: DateTime<Utc>,
) -> Alert {
    let alert: Alert = store.create(NewAlert {
        date: now,
        kind,
        message: message.into(),
        entity,
    });
    BUSINESS_METRICS.alerts_raised.inc();
    info!(alert_id = %alert.id, kind = %alert.kind, entity = %alert.entity, "alert raised");
    alert
}

/// Appends an entry to the activity feed stamped with `now`.
pub fn log_activity(
    store: &mut EntityStore,
    kind: ActivityKind,
    message: impl Into<String>,
    entity: Option<EntityRef>,
    now: DateTime<Utc>,
) -> Activity {
    store.create(NewActivity {
        date: now,
        kind,
        message: message.into(),
        entity,
    })
}

/// Body of a manually raised alert.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[validate(length(min = 1, max = 500))]
    pub message: String,
    pub entity_type: EntityKind,
    pub entity_id: u64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[validate(length(min = 1, max = 500))]
    pub message: String,
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<u64>,
}

#[derive(Clone)]
pub struct NotificationService {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    events: EventSender,
}

impl NotificationService {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, events: EventSender) -> Self {
        Self {
            store,
            clock,
            events,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_alert(&self, request: CreateAlertRequest) -> Result<Alert, ServiceError> {
        request.validate()?;
        let entity = EntityRef::new(request.entity_type, request.entity_id);
        let alert = {
            let mut store = self.store.write().await;
            raise_alert(
                &mut store,
                request.kind,
                request.message,
                entity,
                self.clock.now(),
            )
        };
        self.events.publish(Event::AlertRaised {
            alert_id: alert.id,
            kind: alert.kind,
            entity: alert.entity,
        });
        Ok(alert)
    }

    /// Marks the alert resolved. Resolving twice is not an error.
    #[instrument(skip(self))]
    pub async fn resolve_alert(&self, id: AlertId) -> Result<Alert, ServiceError> {
        let (alert, changed) = self
            .store
            .write()
            .await
            .resolve_alert(id)
            .ok_or_else(|| ServiceError::not_found("Alert", id))?;
        if changed {
            BUSINESS_METRICS.alerts_resolved.inc();
            info!(alert_id = %id, "alert resolved");
            self.events.publish(Event::AlertResolved(id));
        }
        Ok(alert)
    }

    pub async fn alerts(&self, active_only: bool) -> Vec<Alert> {
        let store = self.store.read().await;
        if active_only {
            store.active_alerts()
        } else {
            store.list::<Alert>()
        }
    }

    #[instrument(skip(self))]
    pub async fn create_activity(
        &self,
        request: CreateActivityRequest,
    ) -> Result<Activity, ServiceError> {
        request.validate()?;
        let entity = match (request.entity_type, request.entity_id) {
            (Some(kind), Some(id)) => Some(EntityRef::new(kind, id)),
            (None, None) => None,
            _ => {
                return Err(ServiceError::InvalidInput(
                    "entityType and entityId must be given together".into(),
                ))
            }
        };
        let mut store = self.store.write().await;
        Ok(log_activity(
            &mut store,
            request.kind,
            request.message,
            entity,
            self.clock.now(),
        ))
    }

    /// Newest first, truncated to `limit` when given.
    pub async fn activities(&self, limit: Option<usize>) -> Vec<Activity> {
        self.store.read().await.recent_activities(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{ClientId, ToolId};
    use crate::store::shared;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    fn setup() -> (NotificationService, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let (events, _rx) = EventSender::channel(16);
        let service = NotificationService::new(
            shared(EntityStore::new()),
            Arc::new(clock.clone()),
            events,
        );
        (service, clock)
    }

    #[tokio::test]
    async fn manual_alert_is_unresolved_and_stamped() {
        let (service, clock) = setup();
        let alert = service
            .create_alert(CreateAlertRequest {
                kind: AlertKind::Info,
                message: "Maintenance planned for XYZ-123".into(),
                entity_type: EntityKind::Tool,
                entity_id: 1,
            })
            .await
            .unwrap();

        assert!(!alert.resolved);
        assert_eq!(alert.date, clock.now());
        assert_eq!(alert.entity, EntityRef::Tool(ToolId(1)));
    }

    #[tokio::test]
    async fn resolve_filters_alert_from_active_list() {
        let (service, _clock) = setup();
        let alert = service
            .create_alert(CreateAlertRequest {
                kind: AlertKind::Warning,
                message: "close to limit".into(),
                entity_type: EntityKind::Tool,
                entity_id: 3,
            })
            .await
            .unwrap();

        assert_eq!(service.alerts(true).await.len(), 1);
        let resolved = service.resolve_alert(alert.id).await.unwrap();
        assert!(resolved.resolved);
        assert!(service.alerts(true).await.is_empty());
        assert_eq!(service.alerts(false).await.len(), 1);

        // second resolve is harmless
        assert!(service.resolve_alert(alert.id).await.unwrap().resolved);
    }

    #[tokio::test]
    async fn resolving_unknown_alert_is_not_found() {
        let (service, _clock) = setup();
        assert_matches!(
            service.resolve_alert(AlertId(9)).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn activities_come_back_newest_first_and_truncated() {
        let (service, clock) = setup();
        for message in ["first", "second", "third"] {
            service
                .create_activity(CreateActivityRequest {
                    kind: ActivityKind::Other,
                    message: message.into(),
                    entity_type: None,
                    entity_id: None,
                })
                .await
                .unwrap();
            clock.advance(Duration::minutes(5));
        }

        let messages: Vec<_> = service
            .activities(Some(2))
            .await
            .into_iter()
            .map(|a| a.message)
            .collect();
        assert_eq!(messages, ["third", "second"]);
        assert_eq!(service.activities(None).await.len(), 3);
    }

    #[tokio::test]
    async fn activity_entity_pair_must_be_complete() {
        let (service, _clock) = setup();
        let result = service
            .create_activity(CreateActivityRequest {
                kind: ActivityKind::Order,
                message: "Client A ordered 50kg".into(),
                entity_type: Some(EntityKind::Client),
                entity_id: None,
            })
            .await;
        assert_matches!(result, Err(ServiceError::InvalidInput(_)));

        let ok = service
            .create_activity(CreateActivityRequest {
                kind: ActivityKind::Order,
                message: "Client A ordered 50kg".into(),
                entity_type: Some(EntityKind::Client),
                entity_id: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(ok.entity, Some(EntityRef::Client(ClientId(1))));
    }
}
