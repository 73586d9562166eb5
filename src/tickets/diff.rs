use crate::tickets::lookup::ResolvedNames;
use crate::tickets::models::{Ticket, UpdateTicketRequest};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

/// Canonical diff order. Changed-field rows are emitted in exactly this
/// order, independent of payload key order.
pub const FIELD_ORDER: [&str; 17] = [
    "requestor",
    "account",
    "category",
    "categoryDetail",
    "requestChannel",
    "summary",
    "description",
    "personInCharge",
    "status",
    "scheduledCompletionDate",
    "completionDate",
    "actualEffortHours",
    "responseCategory",
    "responseDetails",
    "hasDefect",
    "externalTicketId",
    "remarks",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field_name: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Computes the field-level diff between the stored ticket and an update
/// payload. Omitted payload fields never appear in the result. Id-backed
/// fields are compared and recorded by display name so the audit trail stays
/// human-readable.
pub fn compute_diff(
    prior: &Ticket,
    update: &UpdateTicketRequest,
    names: &ResolvedNames,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if update.requestor_id.is_some() {
        push_if_changed(
            &mut changes,
            "requestor",
            Some(prior.requestor_name.clone()),
            names.requestor_name.clone(),
        );
    }
    if update.account_id.is_some() {
        push_if_changed(
            &mut changes,
            "account",
            Some(prior.account_name.clone()),
            names.account_name.clone(),
        );
    }
    if update.category_id.is_some() {
        push_if_changed(
            &mut changes,
            "category",
            Some(prior.category_name.clone()),
            names.category_name.clone(),
        );
    }
    if update.category_detail_id.is_some() {
        push_if_changed(
            &mut changes,
            "categoryDetail",
            Some(prior.category_detail_name.clone()),
            names.category_detail_name.clone(),
        );
    }
    if update.request_channel_id.is_some() {
        push_if_changed(
            &mut changes,
            "requestChannel",
            Some(prior.request_channel_name.clone()),
            names.request_channel_name.clone(),
        );
    }
    if let Some(summary) = &update.summary {
        push_if_changed(
            &mut changes,
            "summary",
            Some(prior.summary.clone()),
            Some(summary.clone()),
        );
    }
    if let Some(description) = &update.description {
        push_if_changed(
            &mut changes,
            "description",
            prior.description.clone(),
            description.clone(),
        );
    }
    if update.person_in_charge_id.is_some() {
        push_if_changed(
            &mut changes,
            "personInCharge",
            Some(prior.person_in_charge_name.clone()),
            names.person_in_charge_name.clone(),
        );
    }
    if update.status_id.is_some() {
        push_if_changed(
            &mut changes,
            "status",
            Some(prior.status_name.clone()),
            names.status_name.clone(),
        );
    }
    if let Some(date) = &update.scheduled_completion_date {
        push_if_changed(
            &mut changes,
            "scheduledCompletionDate",
            fmt_date(prior.scheduled_completion_date),
            fmt_date(*date),
        );
    }
    if let Some(date) = &update.completion_date {
        push_if_changed(
            &mut changes,
            "completionDate",
            fmt_date(prior.completion_date),
            fmt_date(*date),
        );
    }
    if let Some(hours) = &update.actual_effort_hours {
        push_if_changed(
            &mut changes,
            "actualEffortHours",
            fmt_hours(prior.actual_effort_hours.as_ref()),
            fmt_hours(hours.as_ref()),
        );
    }
    if let Some(inner) = &update.response_category_id {
        let new_name = inner.and_then(|_| names.response_category_name.clone());
        push_if_changed(
            &mut changes,
            "responseCategory",
            prior.response_category_name.clone(),
            new_name,
        );
    }
    if let Some(details) = &update.response_details {
        push_if_changed(
            &mut changes,
            "responseDetails",
            prior.response_details.clone(),
            details.clone(),
        );
    }
    if let Some(has_defect) = update.has_defect {
        push_if_changed(
            &mut changes,
            "hasDefect",
            Some(prior.has_defect.to_string()),
            Some(has_defect.to_string()),
        );
    }
    if let Some(external_id) = &update.external_ticket_id {
        push_if_changed(
            &mut changes,
            "externalTicketId",
            prior.external_ticket_id.clone(),
            external_id.clone(),
        );
    }
    if let Some(remarks) = &update.remarks {
        push_if_changed(
            &mut changes,
            "remarks",
            prior.remarks.clone(),
            remarks.clone(),
        );
    }

    changes
}

fn push_if_changed(
    changes: &mut Vec<FieldChange>,
    field_name: &'static str,
    old_value: Option<String>,
    new_value: Option<String>,
) {
    if old_value != new_value {
        changes.push(FieldChange {
            field_name,
            old_value,
            new_value,
        });
    }
}

fn fmt_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Normalized form so `1.50` and `1.5` compare and record identically.
fn fmt_hours(hours: Option<&BigDecimal>) -> Option<String> {
    hours.map(|h| h.normalized().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn stored_ticket() -> Ticket {
        let now = Utc::now();
        Ticket {
            id: "TCK-0001".into(),
            requestor_id: Uuid::new_v4(),
            requestor_name: "Sato".into(),
            account_id: Uuid::new_v4(),
            account_name: "Acme".into(),
            category_id: Uuid::new_v4(),
            category_name: "Incident".into(),
            category_detail_id: Uuid::new_v4(),
            category_detail_name: "Login failure".into(),
            request_channel_id: Uuid::new_v4(),
            request_channel_name: "Email".into(),
            summary: "Cannot sign in".into(),
            description: None,
            person_in_charge_id: Uuid::new_v4(),
            person_in_charge_name: "Tanaka".into(),
            status_id: Uuid::new_v4(),
            status_name: "Received".into(),
            scheduled_completion_date: NaiveDate::from_ymd_opt(2026, 9, 1),
            completion_date: None,
            actual_effort_hours: Some("1.50".parse().unwrap()),
            response_category_id: None,
            response_category_name: None,
            response_details: None,
            has_defect: false,
            external_ticket_id: None,
            remarks: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_only_update_yields_one_triple() {
        let prior = stored_ticket();
        let update = UpdateTicketRequest {
            status_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let names = ResolvedNames {
            status_name: Some("In Progress".into()),
            ..Default::default()
        };
        let diff = compute_diff(&prior, &update, &names);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].field_name, "status");
        assert_eq!(diff[0].old_value.as_deref(), Some("Received"));
        assert_eq!(diff[0].new_value.as_deref(), Some("In Progress"));
    }

    #[test]
    fn remarks_set_from_null_records_null_old_value() {
        let prior = stored_ticket();
        let update = UpdateTicketRequest {
            remarks: Some(Some("urgent".into())),
            ..Default::default()
        };
        let diff = compute_diff(&prior, &update, &ResolvedNames::default());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].field_name, "remarks");
        assert_eq!(diff[0].old_value, None);
        assert_eq!(diff[0].new_value.as_deref(), Some("urgent"));
    }

    #[test]
    fn empty_update_yields_no_triples() {
        let diff = compute_diff(
            &stored_ticket(),
            &UpdateTicketRequest::default(),
            &ResolvedNames::default(),
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn unchanged_values_are_not_recorded() {
        let prior = stored_ticket();
        let update = UpdateTicketRequest {
            summary: Some("Cannot sign in".into()),
            scheduled_completion_date: Some(NaiveDate::from_ymd_opt(2026, 9, 1)),
            // numerically equal to the stored 1.50
            actual_effort_hours: Some(Some("1.5".parse().unwrap())),
            has_defect: Some(false),
            ..Default::default()
        };
        let diff = compute_diff(&prior, &update, &ResolvedNames::default());
        assert!(diff.is_empty());
    }

    #[test]
    fn explicit_clear_records_null_new_value() {
        let mut prior = stored_ticket();
        prior.description = Some("long text".into());
        let update = UpdateTicketRequest {
            description: Some(None),
            ..Default::default()
        };
        let diff = compute_diff(&prior, &update, &ResolvedNames::default());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].field_name, "description");
        assert_eq!(diff[0].old_value.as_deref(), Some("long text"));
        assert_eq!(diff[0].new_value, None);
    }

    #[test]
    fn triples_follow_canonical_field_order() {
        let prior = stored_ticket();
        let update = UpdateTicketRequest {
            remarks: Some(Some("check with vendor".into())),
            status_id: Some(Uuid::new_v4()),
            summary: Some("Cannot sign in at all".into()),
            has_defect: Some(true),
            requestor_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let names = ResolvedNames {
            requestor_name: Some("Suzuki".into()),
            status_name: Some("In Progress".into()),
            ..Default::default()
        };
        let diff = compute_diff(&prior, &update, &names);
        let emitted: Vec<&str> = diff.iter().map(|c| c.field_name).collect();
        assert_eq!(
            emitted,
            vec!["requestor", "summary", "status", "hasDefect", "remarks"]
        );
        // emitted order is a subsequence of the canonical order
        let mut cursor = FIELD_ORDER.iter();
        for field in &emitted {
            assert!(cursor.any(|f| f == field), "{field} out of order");
        }
    }

    #[test]
    fn date_change_is_recorded_as_calendar_date() {
        let prior = stored_ticket();
        let update = UpdateTicketRequest {
            scheduled_completion_date: Some(NaiveDate::from_ymd_opt(2026, 9, 15)),
            ..Default::default()
        };
        let diff = compute_diff(&prior, &update, &ResolvedNames::default());
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].old_value.as_deref(), Some("2026-09-01"));
        assert_eq!(diff[0].new_value.as_deref(), Some("2026-09-15"));
    }
}
