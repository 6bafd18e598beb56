pub mod activities;
pub mod alerts;
pub mod catalog;
pub mod common;
pub mod consumptions;
pub mod dashboard;
pub mod health;

use axum::Router;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Everything served under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dashboard", dashboard::dashboard_routes())
        .nest("/stores", catalog::stores_routes())
        .nest("/calibers", catalog::calibers_routes())
        .nest("/tools", catalog::tools_routes())
        .nest("/clients", catalog::clients_routes())
        .nest("/products", catalog::products_routes())
        .nest("/consumptions", consumptions::consumptions_routes())
        .nest("/alerts", alerts::alerts_routes())
        .nest("/activities", activities::activities_routes())
}
