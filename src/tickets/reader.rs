use crate::shared::schema::{attachments, statuses, ticket_history, tickets};
use crate::tickets::error::TicketError;
use crate::tickets::models::{
    Attachment, ChangedFieldRow, HistoryEntry, HistoryEntryWithChanges, ListQuery, SortDirection,
    SortField, Ticket, TicketDetail, TicketSummary,
};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Filtered, sorted, paginated ticket list. All predicates are composed on a
/// boxed query with bound parameters; nothing is string-concatenated.
pub fn list_tickets(
    conn: &mut PgConnection,
    query: &ListQuery,
) -> Result<Vec<TicketSummary>, TicketError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut q = tickets::table.into_boxed();

    if let Some(person_in_charge_id) = query.person_in_charge_id {
        q = q.filter(tickets::person_in_charge_id.eq(person_in_charge_id));
    }
    if let Some(account_id) = query.account_id {
        q = q.filter(tickets::account_id.eq(account_id));
    }
    if let Some(status_id) = query.status_id {
        q = q.filter(tickets::status_id.eq(status_id));
    }
    if let Some(from) = query.scheduled_from {
        q = q.filter(tickets::scheduled_completion_date.ge(from));
    }
    if let Some(to) = query.scheduled_to {
        q = q.filter(tickets::scheduled_completion_date.le(to));
    }
    if !query.show_completed.unwrap_or(true) {
        let terminal = statuses::table
            .filter(statuses::is_terminal.eq(true))
            .select(statuses::id);
        q = q.filter(tickets::status_id.ne_all(terminal));
    }
    if let Some(search) = query.search.as_deref() {
        let search = search.trim();
        if !search.is_empty() {
            let pattern = format!("%{}%", escape_like(search));
            q = q.filter(
                tickets::summary
                    .ilike(pattern.clone())
                    .or(tickets::account_name.ilike(pattern.clone()))
                    .or(tickets::requestor_name.ilike(pattern)),
            );
        }
    }

    q = apply_sort(q, query);

    let rows: Vec<Ticket> = q.limit(limit).offset(offset).load(conn)?;
    let today = Utc::now().date_naive();
    Ok(rows
        .into_iter()
        .map(|ticket| TicketSummary {
            remaining_days: remaining_days(ticket.scheduled_completion_date, today),
            ticket,
        })
        .collect())
}

/// Ticket plus its attachments, newest attachment first.
pub fn get_ticket(conn: &mut PgConnection, id: &str) -> Result<TicketDetail, TicketError> {
    let ticket: Ticket = tickets::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| TicketError::NotFound(id.to_string()))?;

    let attachments: Vec<Attachment> = Attachment::belonging_to(&ticket)
        .order(attachments::uploaded_at.desc())
        .load(conn)?;

    Ok(TicketDetail {
        ticket,
        attachments,
    })
}

/// Full audit trail, newest entry first, with each entry's changed fields
/// nested. Changed fields carry no ordering within an entry.
pub fn get_history(
    conn: &mut PgConnection,
    id: &str,
) -> Result<Vec<HistoryEntryWithChanges>, TicketError> {
    let ticket_exists: Option<String> = tickets::table
        .find(id)
        .select(tickets::id)
        .first(conn)
        .optional()?;
    if ticket_exists.is_none() {
        return Err(TicketError::NotFound(id.to_string()));
    }

    let entries: Vec<HistoryEntry> = ticket_history::table
        .filter(ticket_history::ticket_id.eq(id))
        .order(ticket_history::created_at.desc())
        .load(conn)?;

    let changed_fields: Vec<ChangedFieldRow> =
        ChangedFieldRow::belonging_to(&entries).load(conn)?;
    let grouped = changed_fields.grouped_by(&entries);

    Ok(entries
        .into_iter()
        .zip(grouped)
        .map(|(entry, changed_fields)| HistoryEntryWithChanges {
            entry,
            changed_fields,
        })
        .collect())
}

type BoxedTicketQuery<'a> = tickets::BoxedQuery<'a, diesel::pg::Pg>;

fn apply_sort<'a>(q: BoxedTicketQuery<'a>, query: &ListQuery) -> BoxedTicketQuery<'a> {
    // an explicit sort field defaults ascending; no sort means newest first
    let direction = query.sort_order.unwrap_or(match query.sort_by {
        Some(_) => SortDirection::Asc,
        None => SortDirection::Desc,
    });
    let ascending = matches!(direction, SortDirection::Asc);
    match query.sort_by.clone().unwrap_or(SortField::CreatedAt) {
        SortField::Id => {
            if ascending {
                q.order(tickets::id.asc())
            } else {
                q.order(tickets::id.desc())
            }
        }
        SortField::Summary => {
            if ascending {
                q.order(tickets::summary.asc())
            } else {
                q.order(tickets::summary.desc())
            }
        }
        SortField::Status => {
            if ascending {
                q.order(tickets::status_name.asc())
            } else {
                q.order(tickets::status_name.desc())
            }
        }
        SortField::ScheduledCompletionDate => {
            if ascending {
                q.order(tickets::scheduled_completion_date.asc())
            } else {
                q.order(tickets::scheduled_completion_date.desc())
            }
        }
        SortField::CreatedAt => {
            if ascending {
                q.order(tickets::created_at.asc())
            } else {
                q.order(tickets::created_at.desc())
            }
        }
        SortField::UpdatedAt => {
            if ascending {
                q.order(tickets::updated_at.asc())
            } else {
                q.order(tickets::updated_at.desc())
            }
        }
    }
}

/// Escapes LIKE metacharacters so user input matches as a literal substring
/// rather than a wildcard pattern.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Whole days between today and the scheduled completion date; `None` when
/// the ticket has no schedule. Negative once the date is past.
pub fn remaining_days(scheduled: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    scheduled.map(|date| (date - today).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn remaining_days_counts_whole_days_forward() {
        assert_eq!(
            remaining_days(Some(day(2026, 8, 28)), day(2026, 8, 25)),
            Some(3)
        );
    }

    #[test]
    fn remaining_days_is_zero_on_the_due_date() {
        assert_eq!(
            remaining_days(Some(day(2026, 8, 25)), day(2026, 8, 25)),
            Some(0)
        );
    }

    #[test]
    fn remaining_days_goes_negative_when_overdue() {
        assert_eq!(
            remaining_days(Some(day(2026, 8, 20)), day(2026, 8, 25)),
            Some(-5)
        );
    }

    #[test]
    fn remaining_days_is_null_without_a_schedule() {
        assert_eq!(remaining_days(None, day(2026, 8, 25)), None);
    }

    #[test]
    fn search_input_metacharacters_match_literally() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("ACME_EU"), "ACME\\_EU");
        assert_eq!(escape_like(r"c:\share"), r"c:\\share");
        assert_eq!(escape_like("plain words"), "plain words");
    }

    #[test]
    fn page_size_defaults_and_caps() {
        let query = ListQuery::default();
        assert_eq!(query.limit.unwrap_or(DEFAULT_PAGE_SIZE), 20);
        let oversized = ListQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(
            oversized
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            MAX_PAGE_SIZE
        );
    }
}
