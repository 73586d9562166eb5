//! Integration tests against a disposable Postgres. Gated behind the
//! `pg-tests` feature; point TEST_DATABASE_URL at a database that may be
//! freely written to:
//!
//!   TEST_DATABASE_URL=postgres://... cargo test --features pg-tests
//!
//! Each test installs the schema into its own Postgres schema namespace so
//! the tests can run in parallel on one database.
#![cfg(feature = "pg-tests")]

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use uuid::Uuid;

use ticketserver::shared::schema::{history_changed_fields, ticket_history};
use ticketserver::tickets::error::TicketError;
use ticketserver::tickets::models::{CreateTicketRequest, ListQuery, UpdateTicketRequest};
use ticketserver::tickets::{reader, writer};

struct Masters {
    requestor: Uuid,
    assignee: Uuid,
    account: Uuid,
    category: Uuid,
    category_detail: Uuid,
    channel: Uuid,
    status_received: Uuid,
    status_in_progress: Uuid,
    status_completed: Uuid,
}

fn setup(schema: &str) -> (PgConnection, Masters) {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a disposable Postgres");
    let mut conn = PgConnection::establish(&url).expect("failed to connect to test database");

    conn.batch_execute(&format!(
        "DROP SCHEMA IF EXISTS {schema} CASCADE; \
         CREATE SCHEMA {schema}; \
         SET search_path TO {schema};"
    ))
    .expect("failed to create test schema");
    conn.batch_execute(include_str!("../sql/schema.sql"))
        .expect("failed to install schema");

    let masters = Masters {
        requestor: Uuid::new_v4(),
        assignee: Uuid::new_v4(),
        account: Uuid::new_v4(),
        category: Uuid::new_v4(),
        category_detail: Uuid::new_v4(),
        channel: Uuid::new_v4(),
        status_received: Uuid::new_v4(),
        status_in_progress: Uuid::new_v4(),
        status_completed: Uuid::new_v4(),
    };
    conn.batch_execute(&format!(
        "INSERT INTO users (id, name, email) VALUES \
           ('{}', 'Sato', 'sato@example.com'), \
           ('{}', 'Tanaka', 'tanaka@example.com'); \
         INSERT INTO accounts (id, name) VALUES ('{}', 'Acme'); \
         INSERT INTO categories (id, name, sort_order) VALUES ('{}', 'Incident', 1); \
         INSERT INTO category_details (id, category_id, name, sort_order) VALUES \
           ('{}', '{}', 'Login failure', 1); \
         INSERT INTO statuses (id, name, sort_order, is_terminal) VALUES \
           ('{}', 'Received', 1, FALSE), \
           ('{}', 'In Progress', 2, FALSE), \
           ('{}', 'Completed', 3, TRUE); \
         INSERT INTO request_channels (id, name) VALUES ('{}', 'Email');",
        masters.requestor,
        masters.assignee,
        masters.account,
        masters.category,
        masters.category_detail,
        masters.category,
        masters.status_received,
        masters.status_in_progress,
        masters.status_completed,
        masters.channel,
    ))
    .expect("failed to seed master data");

    (conn, masters)
}

fn create_request(masters: &Masters) -> CreateTicketRequest {
    CreateTicketRequest {
        requestor_id: masters.requestor,
        account_id: masters.account,
        category_id: masters.category,
        category_detail_id: masters.category_detail,
        request_channel_id: masters.channel,
        summary: "Cannot sign in".to_string(),
        description: None,
        person_in_charge_id: masters.assignee,
        status_id: Some(masters.status_received),
        scheduled_completion_date: None,
        completion_date: None,
        actual_effort_hours: None,
        response_category_id: None,
        response_details: None,
        has_defect: false,
        external_ticket_id: None,
        remarks: None,
    }
}

fn history_count(conn: &mut PgConnection, id: &str) -> i64 {
    ticket_history::table
        .filter(ticket_history::ticket_id.eq(id))
        .count()
        .get_result(conn)
        .unwrap()
}

fn changed_field_total(conn: &mut PgConnection) -> i64 {
    history_changed_fields::table
        .count()
        .get_result(conn)
        .unwrap()
}

#[test]
fn ticket_ids_are_sequential_from_a_fresh_sequence() {
    let (mut conn, masters) = setup("tkt_sequence");
    let ids: Vec<String> = (0..3)
        .map(|_| writer::create_ticket(&mut conn, &create_request(&masters)).unwrap())
        .collect();
    assert_eq!(ids, vec!["TCK-0001", "TCK-0002", "TCK-0003"]);
}

#[test]
fn status_update_records_exactly_one_changed_field() {
    let (mut conn, masters) = setup("tkt_status_diff");
    let id = writer::create_ticket(&mut conn, &create_request(&masters)).unwrap();

    let update = UpdateTicketRequest {
        status_id: Some(masters.status_in_progress),
        ..Default::default()
    };
    writer::update_ticket(&mut conn, &id, &update).unwrap();

    let history = reader::get_history(&mut conn, &id).unwrap();
    assert_eq!(history.len(), 2);
    // newest first: the update entry, then the creation entry
    assert_eq!(history[0].changed_fields.len(), 1);
    let change = &history[0].changed_fields[0];
    assert_eq!(change.field_name, "status");
    assert_eq!(change.old_value.as_deref(), Some("Received"));
    assert_eq!(change.new_value.as_deref(), Some("In Progress"));
    assert!(history[1].changed_fields.is_empty());

    let detail = reader::get_ticket(&mut conn, &id).unwrap();
    assert_eq!(detail.ticket.status_name, "In Progress");
}

#[test]
fn dangling_reference_aborts_before_any_write() {
    let (mut conn, masters) = setup("tkt_dangling");
    let id = writer::create_ticket(&mut conn, &create_request(&masters)).unwrap();
    let entries_before = history_count(&mut conn, &id);

    let update = UpdateTicketRequest {
        person_in_charge_id: Some(Uuid::new_v4()),
        remarks: Some(Some("urgent".to_string())),
        ..Default::default()
    };
    let err = writer::update_ticket(&mut conn, &id, &update).unwrap_err();
    assert!(matches!(
        err,
        TicketError::ReferenceNotFound {
            field: "personInChargeId"
        }
    ));

    let detail = reader::get_ticket(&mut conn, &id).unwrap();
    assert_eq!(detail.ticket.remarks, None);
    assert_eq!(detail.ticket.person_in_charge_name, "Tanaka");
    assert_eq!(history_count(&mut conn, &id), entries_before);
    assert_eq!(changed_field_total(&mut conn), 0);
}

#[test]
fn failure_at_the_changed_field_step_rolls_back_the_whole_update() {
    let (mut conn, masters) = setup("tkt_rollback");
    let id = writer::create_ticket(&mut conn, &create_request(&masters)).unwrap();
    let entries_before = history_count(&mut conn, &id);

    // make the changed-field insert fail after the ticket row and history
    // entry have already been written inside the transaction
    conn.batch_execute(
        "ALTER TABLE history_changed_fields \
         ADD CONSTRAINT reject_remarks CHECK (field_name <> 'remarks')",
    )
    .unwrap();

    let update = UpdateTicketRequest {
        remarks: Some(Some("urgent".to_string())),
        ..Default::default()
    };
    let err = writer::update_ticket(&mut conn, &id, &update).unwrap_err();
    assert!(matches!(err, TicketError::Storage(_)));

    let detail = reader::get_ticket(&mut conn, &id).unwrap();
    assert_eq!(detail.ticket.remarks, None);
    assert_eq!(history_count(&mut conn, &id), entries_before);
    assert_eq!(changed_field_total(&mut conn), 0);
}

#[test]
fn hiding_completed_excludes_terminal_status_tickets() {
    let (mut conn, masters) = setup("tkt_show_completed");
    let open_id = writer::create_ticket(&mut conn, &create_request(&masters)).unwrap();
    let done_id = writer::create_ticket(&mut conn, &create_request(&masters)).unwrap();

    let update = UpdateTicketRequest {
        status_id: Some(masters.status_completed),
        ..Default::default()
    };
    writer::update_ticket(&mut conn, &done_id, &update).unwrap();

    let all = reader::list_tickets(&mut conn, &ListQuery::default()).unwrap();
    assert_eq!(all.len(), 2);

    let open_only = reader::list_tickets(
        &mut conn,
        &ListQuery {
            show_completed: Some(false),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(open_only.len(), 1);
    assert_eq!(open_only[0].ticket.id, open_id);
}
