use crate::shared::schema::{attachments, history_changed_fields, ticket_history, tickets};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Persisted ticket row. Foreign keys are stored together with the display
/// name that was current when the reference was last written; the pair is
/// always written together.
#[derive(Debug, Clone, Serialize, Queryable, Insertable, Identifiable)]
#[diesel(table_name = tickets)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub requestor_id: Uuid,
    pub requestor_name: String,
    pub account_id: Uuid,
    pub account_name: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_detail_id: Uuid,
    pub category_detail_name: String,
    pub request_channel_id: Uuid,
    pub request_channel_name: String,
    pub summary: String,
    pub description: Option<String>,
    pub person_in_charge_id: Uuid,
    pub person_in_charge_name: String,
    pub status_id: Uuid,
    pub status_name: String,
    pub scheduled_completion_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub actual_effort_hours: Option<BigDecimal>,
    pub response_category_id: Option<Uuid>,
    pub response_category_name: Option<String>,
    pub response_details: Option<String>,
    pub has_defect: bool,
    pub external_ticket_id: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record of one mutation event.
#[derive(Debug, Clone, Serialize, Queryable, Insertable, Identifiable)]
#[diesel(table_name = ticket_history)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub ticket_id: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// One (field, old, new) triple recorded against a history entry.
#[derive(Debug, Clone, Serialize, Queryable, Insertable, Identifiable, Associations)]
#[diesel(table_name = history_changed_fields)]
#[diesel(belongs_to(HistoryEntry, foreign_key = history_id))]
#[serde(rename_all = "camelCase")]
pub struct ChangedFieldRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub history_id: Uuid,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// File metadata attached to a ticket; read-only in this crate.
#[derive(Debug, Clone, Serialize, Queryable, Identifiable, Associations)]
#[diesel(table_name = attachments)]
#[diesel(belongs_to(Ticket, foreign_key = ticket_id))]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub ticket_id: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub requestor_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub category_detail_id: Uuid,
    pub request_channel_id: Uuid,
    pub summary: String,
    pub description: Option<String>,
    pub person_in_charge_id: Uuid,
    /// Defaults to the first workflow status when omitted.
    pub status_id: Option<Uuid>,
    pub scheduled_completion_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub actual_effort_hours: Option<BigDecimal>,
    pub response_category_id: Option<Uuid>,
    pub response_details: Option<String>,
    #[serde(default)]
    pub has_defect: bool,
    pub external_ticket_id: Option<String>,
    pub remarks: Option<String>,
}

/// Partial-update payload. An omitted field leaves the stored value alone;
/// a field present as `null` explicitly clears it. The outer `Option` tracks
/// presence, the inner one the value, so the two cases stay distinguishable
/// through deserialization and the Diesel changeset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub requestor_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub category_detail_id: Option<Uuid>,
    pub request_channel_id: Option<Uuid>,
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    pub person_in_charge_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub scheduled_completion_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub completion_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub actual_effort_hours: Option<Option<BigDecimal>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub response_category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub response_details: Option<Option<String>>,
    pub has_defect: Option<bool>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub external_ticket_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub remarks: Option<Option<String>>,
    /// History comment; a default is recorded when omitted.
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddHistoryRequest {
    pub author_id: Uuid,
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Summary,
    Status,
    ScheduledCompletionDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub person_in_charge_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub scheduled_from: Option<NaiveDate>,
    pub scheduled_to: Option<NaiveDate>,
    /// Default true; false hides tickets in a terminal status.
    pub show_completed: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortDirection>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    #[serde(flatten)]
    pub ticket: Ticket,
    /// Whole days until the scheduled completion date; derived at read time.
    pub remaining_days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryWithChanges {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub changed_fields: Vec<ChangedFieldRow>,
}

#[derive(Debug, Serialize)]
pub struct TicketIdResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryIdResponse {
    pub id: Uuid,
}

/// Deserializes a present-but-null JSON field as `Some(None)` so it stays
/// distinguishable from an omitted field (`None` via `#[serde(default)]`).
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
