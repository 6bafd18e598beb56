//! Demo data loaded at startup in development.
//!
//! Everything goes through the services, so the two sample consumptions run
//! the real recorder (cap check, activity entry, stock decrement).

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::models::{
    ActivityKind, AlertKind, Caliber, Client, EntityKind, NewCaliber, NewClient, NewProduct,
    NewStore, NewTool, NewUser, Product, Store, Tool,
};
use crate::services::consumption::RecordConsumption;
use crate::services::notifications::{CreateActivityRequest, CreateAlertRequest};
use crate::AppState;

/// What [`seed_sample_data`] created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub stores: usize,
    pub calibers: usize,
    pub tools: usize,
    pub clients: usize,
    pub products: usize,
    pub consumptions: usize,
}

/// Seeds the demo dataset unless the admin account already exists.
#[instrument(skip_all)]
pub async fn seed_sample_data(state: &AppState) -> Result<Option<SeedSummary>, ServiceError> {
    if state.users.get_user_by_username("admin").await.is_some() {
        info!("sample data already present");
        return Ok(None);
    }

    state
        .users
        .create_user(NewUser {
            username: "admin".into(),
            password: "admin".into(),
            name: "Admin User".into(),
            role: "admin".into(),
        })
        .await?;

    let mut stores = Vec::new();
    for (name, location, manager) in [
        ("Magasin 1", "Paris", "Manager 1"),
        ("Magasin 2", "Lyon", "Manager 2"),
        ("Magasin 3", "Marseille", "Manager 3"),
    ] {
        let store: Store = state
            .catalog
            .create(NewStore {
                name: name.into(),
                location: Some(location.into()),
                manager: Some(manager.into()),
            })
            .await?;
        stores.push(store);
    }

    let mut calibers = Vec::new();
    for (name, description) in [
        ("Calibre A", "Small size product"),
        ("Calibre B", "Medium size product"),
        ("Calibre C", "Large size product"),
        ("Calibre D", "Extra large size product"),
    ] {
        let caliber: Caliber = state
            .catalog
            .create(NewCaliber {
                name: name.into(),
                description: Some(description.into()),
            })
            .await?;
        calibers.push(caliber);
    }

    let mut tools = Vec::new();
    for (code, name, cap) in [
        ("XYZ-123", "Tool XYZ", dec!(100)),
        ("ABC-456", "Tool ABC", dec!(150)),
        ("DEF-789", "Tool DEF", dec!(200)),
    ] {
        let tool: Tool = state
            .catalog
            .create(NewTool {
                code: code.into(),
                name: name.into(),
                description: None,
                max_daily_consumption: cap,
            })
            .await?;
        tools.push(tool);
    }

    let mut clients = Vec::new();
    for (index, letter) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
        let client: Client = state
            .catalog
            .create(NewClient {
                name: format!("Client {}", letter),
                email: Some(format!("client{}@example.com", letter.to_lowercase())),
                phone: Some(format!("123-456-789{}", index)),
                store_id: stores[index / 2].id,
            })
            .await?;
        clients.push(client);
    }

    let mut products = Vec::new();
    for (name, caliber, store, stock) in [
        ("Product A1", 0, 0, dec!(200)),
        ("Product B1", 1, 0, dec!(300)),
        ("Product A2", 0, 1, dec!(250)),
        ("Product C2", 2, 1, dec!(180)),
        ("Product B3", 1, 2, dec!(210)),
        ("Product D3", 3, 2, dec!(170)),
    ] {
        let product: Product = state
            .catalog
            .create(NewProduct {
                name: name.into(),
                caliber_id: calibers[caliber].id,
                store_id: stores[store].id,
                description: None,
                unit: "kg".into(),
                stock,
            })
            .await?;
        products.push(product);
    }

    let now = state.clock.now();
    let samples: [(usize, usize, usize, usize, Decimal, Duration); 2] = [
        (0, 0, 0, 0, dec!(50), Duration::zero()),
        (2, 2, 1, 1, dec!(120), Duration::days(1)),
    ];
    for (client, product, tool, store, quantity, ago) in samples {
        state
            .consumption
            .record(RecordConsumption {
                client_id: clients[client].id,
                product_id: products[product].id,
                tool_id: tools[tool].id,
                store_id: stores[store].id,
                quantity,
                date: Some(now - ago),
            })
            .await?;
    }

    let alerts = [
        (
            AlertKind::Critical,
            "Critical stock - Product Calibre A - Magasin 1",
            EntityKind::Product,
            products[0].id.get(),
        ),
        (
            AlertKind::Warning,
            "Tool DEF-789 at 92% of its daily limit",
            EntityKind::Tool,
            tools[2].id.get(),
        ),
        (
            AlertKind::Info,
            "Maintenance planned - Tool XYZ-123 - tomorrow",
            EntityKind::Tool,
            tools[0].id.get(),
        ),
    ];
    for (kind, message, entity_type, entity_id) in alerts {
        state
            .notifications
            .create_alert(CreateAlertRequest {
                kind,
                message: message.into(),
                entity_type,
                entity_id,
            })
            .await?;
    }

    let activities = [
        (
            ActivityKind::Order,
            "Client A ordered 50kg of product (Calibre B)",
            EntityKind::Client,
            clients[0].id.get(),
        ),
        (
            ActivityKind::Consumption,
            "Tool XYZ-123 reached 85% of its daily limit",
            EntityKind::Tool,
            tools[0].id.get(),
        ),
        (
            ActivityKind::Alert,
            "Magasin 2 low stock for Calibre A",
            EntityKind::Store,
            stores[1].id.get(),
        ),
        (
            ActivityKind::Alert,
            "Client C exceeded the consumption limit for tool ABC-456",
            EntityKind::Client,
            clients[2].id.get(),
        ),
    ];
    for (kind, message, entity_type, entity_id) in activities {
        state
            .notifications
            .create_activity(CreateActivityRequest {
                kind,
                message: message.into(),
                entity_type: Some(entity_type),
                entity_id: Some(entity_id),
            })
            .await?;
    }

    let summary = SeedSummary {
        stores: stores.len(),
        calibers: calibers.len(),
        tools: tools.len(),
        clients: clients.len(),
        products: products.len(),
        consumptions: samples.len(),
    };
    info!(?summary, "sample data seeded");
    Ok(Some(summary))
}
