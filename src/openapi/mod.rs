use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockdash API",
        version = "0.1.0",
        description = r#"
# Stockdash API

Backend of the stock and consumption dashboard.

## Features

- **Catalog**: stores, calibers, tools, clients and products
- **Consumption tracking**: every usage event is checked against the tool's daily cap
- **Alerts**: raised automatically on cap pressure and low stock, resolved by hand
- **Activity feed**: newest-first log of what happened
- **Dashboard**: counters, per-store and per-caliber rollups

## Conventions

Field names are camelCase. Stock levels, quantities and caps travel as decimal
strings; dashboard sums and percentages are plain numbers.

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "Tool XYZ-123 would exceed its daily limit of 100 (already used 60, requested 50)",
  "request_id": "8d6d5c59-62a4-4b8f-8a53-5d7c7b7f0f4e",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "dashboard", description = "Dashboard rollups"),
        (name = "stores", description = "Store management"),
        (name = "calibers", description = "Caliber management"),
        (name = "tools", description = "Tool management and daily usage"),
        (name = "clients", description = "Client management"),
        (name = "products", description = "Product management"),
        (name = "consumptions", description = "Consumption recording"),
        (name = "alerts", description = "Alerts"),
        (name = "activities", description = "Activity feed"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        // Dashboard
        crate::handlers::dashboard::dashboard_stats,
        crate::handlers::dashboard::consumption_by_store,
        crate::handlers::dashboard::consumption_by_caliber,

        // Catalog
        crate::handlers::catalog::list_stores,
        crate::handlers::catalog::get_store,
        crate::handlers::catalog::create_store,
        crate::handlers::catalog::update_store,
        crate::handlers::catalog::delete_store,
        crate::handlers::catalog::list_calibers,
        crate::handlers::catalog::get_caliber,
        crate::handlers::catalog::create_caliber,
        crate::handlers::catalog::update_caliber,
        crate::handlers::catalog::delete_caliber,
        crate::handlers::catalog::list_tools,
        crate::handlers::catalog::get_tool,
        crate::handlers::catalog::create_tool,
        crate::handlers::catalog::update_tool,
        crate::handlers::catalog::delete_tool,
        crate::handlers::catalog::tool_daily_usage,
        crate::handlers::catalog::list_clients,
        crate::handlers::catalog::get_client,
        crate::handlers::catalog::create_client,
        crate::handlers::catalog::update_client,
        crate::handlers::catalog::delete_client,
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product,
        crate::handlers::catalog::create_product,
        crate::handlers::catalog::update_product,
        crate::handlers::catalog::delete_product,

        // Consumptions
        crate::handlers::consumptions::list_consumptions,
        crate::handlers::consumptions::get_consumption,
        crate::handlers::consumptions::record_consumption,

        // Alerts & activities
        crate::handlers::alerts::list_alerts,
        crate::handlers::alerts::create_alert,
        crate::handlers::alerts::resolve_alert,
        crate::handlers::activities::list_activities,
        crate::handlers::activities::create_activity,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::liveness_check,
    ),
    components(
        schemas(
            crate::models::EntityKind,
            crate::models::EntityRef,
            crate::models::AlertKind,
            crate::models::ActivityKind,
            crate::services::analytics::DashboardStats,
            crate::services::analytics::StoreConsumption,
            crate::services::analytics::CaliberConsumption,
            crate::handlers::catalog::ToolDailyUsage,
            crate::handlers::health::HealthResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
