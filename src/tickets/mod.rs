pub mod diff;
pub mod error;
pub mod lookup;
pub mod models;
pub mod reader;
pub mod writer;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;
use error::TicketError;
use models::{
    AddHistoryRequest, CreateTicketRequest, HistoryEntryWithChanges, HistoryIdResponse, ListQuery,
    TicketDetail, TicketIdResponse, TicketSummary, UpdateTicketRequest,
};

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketIdResponse>), TicketError> {
    let pool = state.conn.clone();
    let id = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        writer::create_ticket(&mut conn, &req)
    })
    .await??;
    Ok((StatusCode::CREATED, Json(TicketIdResponse { id })))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<TicketIdResponse>, TicketError> {
    let pool = state.conn.clone();
    let id = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        writer::update_ticket(&mut conn, &id, &req)
    })
    .await??;
    Ok(Json(TicketIdResponse { id }))
}

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TicketSummary>>, TicketError> {
    let pool = state.conn.clone();
    let tickets = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        reader::list_tickets(&mut conn, &query)
    })
    .await??;
    Ok(Json(tickets))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketDetail>, TicketError> {
    let pool = state.conn.clone();
    let detail = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        reader::get_ticket(&mut conn, &id)
    })
    .await??;
    Ok(Json(detail))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntryWithChanges>>, TicketError> {
    let pool = state.conn.clone();
    let history = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        reader::get_history(&mut conn, &id)
    })
    .await??;
    Ok(Json(history))
}

pub async fn add_history_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddHistoryRequest>,
) -> Result<(StatusCode, Json<HistoryIdResponse>), TicketError> {
    let pool = state.conn.clone();
    let history_id = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        writer::add_history_entry(&mut conn, &id, req.author_id, &req.comment)
    })
    .await??;
    Ok((StatusCode::CREATED, Json(HistoryIdResponse { id: history_id })))
}

pub fn configure_ticket_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/:id", get(get_ticket).put(update_ticket))
        .route(
            "/api/tickets/:id/history",
            get(get_history).post(add_history_entry),
        )
}
