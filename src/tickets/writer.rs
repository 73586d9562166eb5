use crate::shared::schema::{history_changed_fields, statuses, ticket_history, tickets, users};
use crate::tickets::diff::compute_diff;
use crate::tickets::error::TicketError;
use crate::tickets::lookup::{ensure_resolved, resolve_names, LookupIds, ResolvedNames};
use crate::tickets::models::{
    ChangedFieldRow, CreateTicketRequest, HistoryEntry, Ticket, UpdateTicketRequest,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::define_sql_function;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use log::info;
use uuid::Uuid;

define_sql_function! {
    fn nextval(sequence_name: Text) -> BigInt;
}

const TICKET_SEQUENCE: &str = "ticket_number_seq";
const CREATED_COMMENT: &str = "Ticket created.";
const UPDATED_COMMENT: &str = "Ticket updated.";

/// `TCK-` plus the sequence value zero-padded to at least four digits. The
/// format is the primary key, not a display convenience; values past 9999
/// simply widen.
pub fn format_ticket_id(sequence_value: i64) -> String {
    format!("TCK-{sequence_value:04}")
}

/// Creates a ticket and its "created" history entry in one transaction.
/// Nothing is written when any mandatory reference fails to resolve.
pub fn create_ticket(
    conn: &mut PgConnection,
    req: &CreateTicketRequest,
) -> Result<String, TicketError> {
    if req.summary.trim().is_empty() {
        return Err(TicketError::Validation(
            "summary must not be blank".to_string(),
        ));
    }

    let ticket_id = conn.transaction::<_, TicketError, _>(|conn| {
        let sequence_value: i64 =
            diesel::select(nextval(TICKET_SEQUENCE)).get_result(conn)?;
        let id = format_ticket_id(sequence_value);

        let status_id = match req.status_id {
            Some(status_id) => status_id,
            None => default_status_id(conn)?,
        };

        let ids = LookupIds {
            requestor_id: Some(req.requestor_id),
            account_id: Some(req.account_id),
            category_id: Some(req.category_id),
            category_detail_id: Some(req.category_detail_id),
            request_channel_id: Some(req.request_channel_id),
            person_in_charge_id: Some(req.person_in_charge_id),
            status_id: Some(status_id),
            response_category_id: req.response_category_id,
        };
        let names = resolve_names(conn, &ids)?;
        ensure_resolved(&ids, &names)?;

        let now = Utc::now();
        let person_in_charge_name =
            required(names.person_in_charge_name.clone(), "personInChargeId")?;
        let ticket = Ticket {
            id: id.clone(),
            requestor_id: req.requestor_id,
            requestor_name: required(names.requestor_name.clone(), "requestorId")?,
            account_id: req.account_id,
            account_name: required(names.account_name.clone(), "accountId")?,
            category_id: req.category_id,
            category_name: required(names.category_name.clone(), "categoryId")?,
            category_detail_id: req.category_detail_id,
            category_detail_name: required(
                names.category_detail_name.clone(),
                "categoryDetailId",
            )?,
            request_channel_id: req.request_channel_id,
            request_channel_name: required(
                names.request_channel_name.clone(),
                "requestChannelId",
            )?,
            summary: req.summary.clone(),
            description: req.description.clone(),
            person_in_charge_id: req.person_in_charge_id,
            person_in_charge_name: person_in_charge_name.clone(),
            status_id,
            status_name: required(names.status_name.clone(), "statusId")?,
            scheduled_completion_date: req.scheduled_completion_date,
            completion_date: req.completion_date,
            actual_effort_hours: req.actual_effort_hours.clone(),
            response_category_id: req.response_category_id,
            response_category_name: names.response_category_name.clone(),
            response_details: req.response_details.clone(),
            has_defect: req.has_defect,
            external_ticket_id: req.external_ticket_id.clone(),
            remarks: req.remarks.clone(),
            created_at: now,
            updated_at: now,
        };
        diesel::insert_into(tickets::table)
            .values(&ticket)
            .execute(conn)?;

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            ticket_id: id.clone(),
            author_id: req.person_in_charge_id,
            author_name: person_in_charge_name,
            comment: CREATED_COMMENT.to_string(),
            created_at: now,
        };
        diesel::insert_into(ticket_history::table)
            .values(&entry)
            .execute(conn)?;

        Ok(id)
    })?;

    info!("created ticket {ticket_id}");
    Ok(ticket_id)
}

/// Applies a partial update, records one history entry, and persists one
/// changed-field row per field the diff engine found different. The whole
/// sequence commits or rolls back as a unit.
pub fn update_ticket(
    conn: &mut PgConnection,
    id: &str,
    req: &UpdateTicketRequest,
) -> Result<String, TicketError> {
    if let Some(summary) = &req.summary {
        if summary.trim().is_empty() {
            return Err(TicketError::Validation(
                "summary must not be blank".to_string(),
            ));
        }
    }

    let ticket_id = conn.transaction::<_, TicketError, _>(|conn| {
        let prior: Ticket = tickets::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;

        let ids = LookupIds {
            requestor_id: req.requestor_id,
            account_id: req.account_id,
            category_id: req.category_id,
            category_detail_id: req.category_detail_id,
            request_channel_id: req.request_channel_id,
            person_in_charge_id: req.person_in_charge_id,
            status_id: req.status_id,
            response_category_id: req.response_category_id.flatten(),
        };
        let names = resolve_names(conn, &ids)?;
        ensure_resolved(&ids, &names)?;

        let changes = compute_diff(&prior, req, &names);
        let now = Utc::now();

        let changeset = build_changeset(req, &names, now);
        diesel::update(tickets::table.find(id))
            .set(&changeset)
            .execute(conn)?;

        // attribute the entry to the incoming person in charge when the
        // update reassigns the ticket, otherwise to the stored one
        let (author_id, author_name) =
            match (req.person_in_charge_id, names.person_in_charge_name.clone()) {
                (Some(author_id), Some(author_name)) => (author_id, author_name),
                _ => (prior.person_in_charge_id, prior.person_in_charge_name.clone()),
            };
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            ticket_id: prior.id.clone(),
            author_id,
            author_name,
            comment: req
                .comment
                .clone()
                .unwrap_or_else(|| UPDATED_COMMENT.to_string()),
            created_at: now,
        };
        diesel::insert_into(ticket_history::table)
            .values(&entry)
            .execute(conn)?;

        if !changes.is_empty() {
            let rows: Vec<ChangedFieldRow> = changes
                .into_iter()
                .map(|change| ChangedFieldRow {
                    id: Uuid::new_v4(),
                    history_id: entry.id,
                    field_name: change.field_name.to_string(),
                    old_value: change.old_value,
                    new_value: change.new_value,
                })
                .collect();
            diesel::insert_into(history_changed_fields::table)
                .values(&rows)
                .execute(conn)?;
        }

        Ok(prior.id)
    })?;

    info!("updated ticket {ticket_id}");
    Ok(ticket_id)
}

/// Records a comment-only history entry with no field diff.
pub fn add_history_entry(
    conn: &mut PgConnection,
    id: &str,
    author_id: Uuid,
    comment: &str,
) -> Result<Uuid, TicketError> {
    if comment.trim().is_empty() {
        return Err(TicketError::Validation(
            "comment must not be blank".to_string(),
        ));
    }

    conn.transaction::<_, TicketError, _>(|conn| {
        let ticket_exists: Option<String> = tickets::table
            .find(id)
            .select(tickets::id)
            .first(conn)
            .optional()?;
        if ticket_exists.is_none() {
            return Err(TicketError::NotFound(id.to_string()));
        }

        let author_name: String = users::table
            .find(author_id)
            .select(users::name)
            .first(conn)
            .optional()?
            .ok_or(TicketError::ReferenceNotFound { field: "authorId" })?;

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            ticket_id: id.to_string(),
            author_id,
            author_name,
            comment: comment.to_string(),
            created_at: Utc::now(),
        };
        diesel::insert_into(ticket_history::table)
            .values(&entry)
            .execute(conn)?;
        Ok(entry.id)
    })
}

/// Partial changeset: `None` leaves the column alone, `Some(None)` clears a
/// nullable column, `Some(Some(v))` overwrites. Name columns move in lockstep
/// with their id column.
#[derive(AsChangeset)]
#[diesel(table_name = tickets)]
struct TicketChangeset {
    requestor_id: Option<Uuid>,
    requestor_name: Option<String>,
    account_id: Option<Uuid>,
    account_name: Option<String>,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    category_detail_id: Option<Uuid>,
    category_detail_name: Option<String>,
    request_channel_id: Option<Uuid>,
    request_channel_name: Option<String>,
    summary: Option<String>,
    description: Option<Option<String>>,
    person_in_charge_id: Option<Uuid>,
    person_in_charge_name: Option<String>,
    status_id: Option<Uuid>,
    status_name: Option<String>,
    scheduled_completion_date: Option<Option<NaiveDate>>,
    completion_date: Option<Option<NaiveDate>>,
    actual_effort_hours: Option<Option<BigDecimal>>,
    response_category_id: Option<Option<Uuid>>,
    response_category_name: Option<Option<String>>,
    response_details: Option<Option<String>>,
    has_defect: Option<bool>,
    external_ticket_id: Option<Option<String>>,
    remarks: Option<Option<String>>,
    updated_at: DateTime<Utc>,
}

fn build_changeset(
    req: &UpdateTicketRequest,
    names: &ResolvedNames,
    now: DateTime<Utc>,
) -> TicketChangeset {
    TicketChangeset {
        requestor_id: req.requestor_id,
        requestor_name: req.requestor_id.and(names.requestor_name.clone()),
        account_id: req.account_id,
        account_name: req.account_id.and(names.account_name.clone()),
        category_id: req.category_id,
        category_name: req.category_id.and(names.category_name.clone()),
        category_detail_id: req.category_detail_id,
        category_detail_name: req
            .category_detail_id
            .and(names.category_detail_name.clone()),
        request_channel_id: req.request_channel_id,
        request_channel_name: req
            .request_channel_id
            .and(names.request_channel_name.clone()),
        summary: req.summary.clone(),
        description: req.description.clone(),
        person_in_charge_id: req.person_in_charge_id,
        person_in_charge_name: req
            .person_in_charge_id
            .and(names.person_in_charge_name.clone()),
        status_id: req.status_id,
        status_name: req.status_id.and(names.status_name.clone()),
        scheduled_completion_date: req.scheduled_completion_date,
        completion_date: req.completion_date,
        actual_effort_hours: req.actual_effort_hours.clone(),
        response_category_id: req.response_category_id,
        response_category_name: req
            .response_category_id
            .as_ref()
            .map(|inner| inner.and_then(|_| names.response_category_name.clone())),
        response_details: req.response_details.clone(),
        has_defect: req.has_defect,
        external_ticket_id: req.external_ticket_id.clone(),
        remarks: req.remarks.clone(),
        updated_at: now,
    }
}

/// The first workflow state, used when a create payload omits the status.
fn default_status_id(conn: &mut PgConnection) -> Result<Uuid, TicketError> {
    statuses::table
        .select(statuses::id)
        .order(statuses::sort_order.asc())
        .first(conn)
        .optional()?
        .ok_or_else(|| TicketError::Validation("no workflow statuses configured".to_string()))
}

fn required(name: Option<String>, field: &'static str) -> Result<String, TicketError> {
    name.ok_or(TicketError::ReferenceNotFound { field })
}
