//! CRUD endpoints for the reference data.
//!
//! Every catalog collection exposes the same get / create / update / delete
//! shape, generated by [`crud_handlers!`]. Listing differs per collection and
//! is written out below.

use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::{created_response, no_content_response};
use crate::errors::{ErrorResponse, ServiceError};
use crate::models::{
    Caliber, CaliberId, CaliberPatch, Client, ClientId, ClientPatch, NewCaliber, NewClient,
    NewProduct, NewStore, NewTool, Product, ProductId, ProductPatch, Store, StoreId, StorePatch,
    Tool, ToolId, ToolPatch,
};
use crate::AppState;

macro_rules! crud_handlers {
    (
        entity: $entity:ident,
        id: $id:ident,
        new: $new:ident,
        patch: $patch:ident,
        tag: $tag:tt,
        collection_path: $collection_path:tt,
        item_path: $item_path:tt,
        handlers: [$get:ident, $create:ident, $update:ident, $delete:ident] $(,)?
    ) => {
        #[utoipa::path(
            get,
            path = $item_path,
            params(("id" = u64, Path, description = "Record id")),
            responses(
                (status = 200, description = "Record found", body = $entity),
                (status = 404, description = "Record not found", body = ErrorResponse)
            ),
            tag = $tag
        )]
        pub async fn $get(
            State(state): State<AppState>,
            Path(id): Path<$id>,
        ) -> Result<Json<$entity>, ServiceError> {
            Ok(Json(state.catalog.get::<$entity>(id).await?))
        }

        #[utoipa::path(
            post,
            path = $collection_path,
            request_body = $new,
            responses(
                (status = 201, description = "Record created", body = $entity),
                (status = 400, description = "Invalid input", body = ErrorResponse),
                (status = 409, description = "Duplicate natural key", body = ErrorResponse)
            ),
            tag = $tag
        )]
        pub async fn $create(
            State(state): State<AppState>,
            Json(payload): Json<$new>,
        ) -> Result<Response, ServiceError> {
            let created = state.catalog.create::<$entity>(payload).await?;
            Ok(created_response(created))
        }

        #[utoipa::path(
            put,
            path = $item_path,
            params(("id" = u64, Path, description = "Record id")),
            request_body = $patch,
            responses(
                (status = 200, description = "Record updated", body = $entity),
                (status = 400, description = "Invalid input", body = ErrorResponse),
                (status = 404, description = "Record not found", body = ErrorResponse),
                (status = 409, description = "Duplicate natural key", body = ErrorResponse)
            ),
            tag = $tag
        )]
        pub async fn $update(
            State(state): State<AppState>,
            Path(id): Path<$id>,
            Json(payload): Json<$patch>,
        ) -> Result<Json<$entity>, ServiceError> {
            Ok(Json(state.catalog.update::<$entity>(id, payload).await?))
        }

        #[utoipa::path(
            delete,
            path = $item_path,
            params(("id" = u64, Path, description = "Record id")),
            responses(
                (status = 204, description = "Record deleted"),
                (status = 404, description = "Record not found", body = ErrorResponse)
            ),
            tag = $tag
        )]
        pub async fn $delete(
            State(state): State<AppState>,
            Path(id): Path<$id>,
        ) -> Result<Response, ServiceError> {
            if state.catalog.delete::<$entity>(id).await {
                Ok(no_content_response())
            } else {
                Err(ServiceError::not_found(
                    <$entity as crate::store::Entity>::LABEL,
                    id,
                ))
            }
        }
    };
}

crud_handlers! {
    entity: Store,
    id: StoreId,
    new: NewStore,
    patch: StorePatch,
    tag: "stores",
    collection_path: "/api/stores",
    item_path: "/api/stores/{id}",
    handlers: [get_store, create_store, update_store, delete_store],
}

crud_handlers! {
    entity: Caliber,
    id: CaliberId,
    new: NewCaliber,
    patch: CaliberPatch,
    tag: "calibers",
    collection_path: "/api/calibers",
    item_path: "/api/calibers/{id}",
    handlers: [get_caliber, create_caliber, update_caliber, delete_caliber],
}

crud_handlers! {
    entity: Tool,
    id: ToolId,
    new: NewTool,
    patch: ToolPatch,
    tag: "tools",
    collection_path: "/api/tools",
    item_path: "/api/tools/{id}",
    handlers: [get_tool, create_tool, update_tool, delete_tool],
}

crud_handlers! {
    entity: Client,
    id: ClientId,
    new: NewClient,
    patch: ClientPatch,
    tag: "clients",
    collection_path: "/api/clients",
    item_path: "/api/clients/{id}",
    handlers: [get_client, create_client, update_client, delete_client],
}

crud_handlers! {
    entity: Product,
    id: ProductId,
    new: NewProduct,
    patch: ProductPatch,
    tag: "products",
    collection_path: "/api/products",
    item_path: "/api/products/{id}",
    handlers: [get_product, create_product, update_product, delete_product],
}

#[utoipa::path(
    get,
    path = "/api/stores",
    responses((status = 200, description = "All stores", body = [Store])),
    tag = "stores"
)]
pub async fn list_stores(State(state): State<AppState>) -> Json<Vec<Store>> {
    Json(state.catalog.list::<Store>().await)
}

#[utoipa::path(
    get,
    path = "/api/calibers",
    responses((status = 200, description = "All calibers", body = [Caliber])),
    tag = "calibers"
)]
pub async fn list_calibers(State(state): State<AppState>) -> Json<Vec<Caliber>> {
    Json(state.catalog.list::<Caliber>().await)
}

#[utoipa::path(
    get,
    path = "/api/tools",
    responses((status = 200, description = "All tools", body = [Tool])),
    tag = "tools"
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<Tool>> {
    Json(state.catalog.list::<Tool>().await)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientListQuery {
    #[param(value_type = Option<u64>)]
    pub store_id: Option<StoreId>,
}

#[utoipa::path(
    get,
    path = "/api/clients",
    params(ClientListQuery),
    responses((status = 200, description = "Clients, optionally of one store", body = [Client])),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> Json<Vec<Client>> {
    Json(state.catalog.clients(query.store_id).await)
}

/// `storeId` takes precedence over `caliberId`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    #[param(value_type = Option<u64>)]
    pub store_id: Option<StoreId>,
    #[param(value_type = Option<u64>)]
    pub caliber_id: Option<CaliberId>,
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses((status = 200, description = "Products, optionally of one store or caliber", body = [Product])),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Json<Vec<Product>> {
    Json(state.catalog.products(query.store_id, query.caliber_id).await)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyUsageQuery {
    /// Local calendar day, today when omitted
    #[param(value_type = Option<String>, example = "2024-05-10")]
    pub date: Option<NaiveDate>,
}

/// A tool's usage on one local day against its cap
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolDailyUsage {
    pub tool_id: ToolId,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "60")]
    pub total: Decimal,
    #[schema(value_type = String, example = "100")]
    pub max_daily_consumption: Decimal,
    /// Never below zero
    #[schema(value_type = String, example = "40")]
    pub remaining: Decimal,
}

#[utoipa::path(
    get,
    path = "/api/tools/{id}/daily-consumption",
    params(("id" = u64, Path, description = "Tool id"), DailyUsageQuery),
    responses(
        (status = 200, description = "Usage for the day", body = ToolDailyUsage),
        (status = 404, description = "Tool not found", body = ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn tool_daily_usage(
    State(state): State<AppState>,
    Path(id): Path<ToolId>,
    Query(query): Query<DailyUsageQuery>,
) -> Result<Json<ToolDailyUsage>, ServiceError> {
    let tool = state.catalog.get::<Tool>(id).await?;
    let date = query.date.unwrap_or_else(|| state.consumption.today());
    let total = state.consumption.daily_total(id, date).await;
    Ok(Json(ToolDailyUsage {
        tool_id: id,
        date,
        total,
        max_daily_consumption: tool.max_daily_consumption,
        remaining: (tool.max_daily_consumption - total).max(Decimal::ZERO),
    }))
}

pub fn stores_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stores).post(create_store))
        .route("/:id", get(get_store).put(update_store).delete(delete_store))
}

pub fn calibers_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_calibers).post(create_caliber))
        .route(
            "/:id",
            get(get_caliber).put(update_caliber).delete(delete_caliber),
        )
}

pub fn tools_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tools).post(create_tool))
        .route("/:id", get(get_tool).put(update_tool).delete(delete_tool))
        .route("/:id/daily-consumption", get(tool_daily_usage))
}

pub fn clients_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}
