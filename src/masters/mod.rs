//! Read-only lookup endpoints over the master tables. Master data is
//! maintained outside this service; nothing here writes.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::{
    accounts, categories, category_details, request_channels, response_categories, statuses, users,
};
use crate::shared::state::AppState;
use crate::tickets::error::TicketError;

#[derive(Debug, Clone, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i32,
    pub is_terminal: bool,
}

#[derive(Debug, Clone, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct RequestChannel {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Queryable)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCategory {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetailQuery {
    pub category_id: Option<Uuid>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, TicketError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        users::table
            .filter(users::is_active.eq(true))
            .order(users::name.asc())
            .load(&mut conn)
            .map_err(TicketError::from)
    })
    .await??;
    Ok(Json(rows))
}

pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, TicketError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        accounts::table
            .filter(accounts::is_active.eq(true))
            .order(accounts::name.asc())
            .load(&mut conn)
            .map_err(TicketError::from)
    })
    .await??;
    Ok(Json(rows))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, TicketError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        categories::table
            .order(categories::sort_order.asc())
            .load(&mut conn)
            .map_err(TicketError::from)
    })
    .await??;
    Ok(Json(rows))
}

pub async fn list_category_details(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryDetailQuery>,
) -> Result<Json<Vec<CategoryDetail>>, TicketError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let mut q = category_details::table.into_boxed();
        if let Some(category_id) = query.category_id {
            q = q.filter(category_details::category_id.eq(category_id));
        }
        q.order(category_details::sort_order.asc())
            .load(&mut conn)
            .map_err(TicketError::from)
    })
    .await??;
    Ok(Json(rows))
}

pub async fn list_statuses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Status>>, TicketError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        statuses::table
            .order(statuses::sort_order.asc())
            .load(&mut conn)
            .map_err(TicketError::from)
    })
    .await??;
    Ok(Json(rows))
}

pub async fn list_request_channels(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RequestChannel>>, TicketError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        request_channels::table
            .order(request_channels::name.asc())
            .load(&mut conn)
            .map_err(TicketError::from)
    })
    .await??;
    Ok(Json(rows))
}

pub async fn list_response_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResponseCategory>>, TicketError> {
    let pool = state.conn.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        response_categories::table
            .order(response_categories::name.asc())
            .load(&mut conn)
            .map_err(TicketError::from)
    })
    .await??;
    Ok(Json(rows))
}

pub fn configure_masters_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/masters/users", get(list_users))
        .route("/api/masters/accounts", get(list_accounts))
        .route("/api/masters/categories", get(list_categories))
        .route("/api/masters/category-details", get(list_category_details))
        .route("/api/masters/statuses", get(list_statuses))
        .route("/api/masters/request-channels", get(list_request_channels))
        .route(
            "/api/masters/response-categories",
            get(list_response_categories),
        )
}
