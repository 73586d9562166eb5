use crate::tickets::error::TicketError;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text, Uuid as SqlUuid};
use uuid::Uuid;

/// Bundle of foreign-key ids to resolve. An absent slot is skipped and its
/// name comes back `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupIds {
    pub requestor_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub category_detail_id: Option<Uuid>,
    pub request_channel_id: Option<Uuid>,
    pub person_in_charge_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub response_category_id: Option<Uuid>,
}

/// Display names current in the master tables at resolution time. `None`
/// either because the slot was not requested or because no row matched.
#[derive(Debug, Clone, Default, QueryableByName)]
pub struct ResolvedNames {
    #[diesel(sql_type = Nullable<Text>)]
    pub requestor_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub account_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub category_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub category_detail_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub request_channel_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub person_in_charge_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub status_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub response_category_name: Option<String>,
}

/// Resolves the whole id bundle in one round trip via scalar subselects.
/// A `NULL` bind short-circuits its subselect to `NULL`.
pub fn resolve_names(
    conn: &mut PgConnection,
    ids: &LookupIds,
) -> Result<ResolvedNames, TicketError> {
    let resolved = diesel::sql_query(
        "SELECT \
           (SELECT name FROM users WHERE id = $1) AS requestor_name, \
           (SELECT name FROM accounts WHERE id = $2) AS account_name, \
           (SELECT name FROM categories WHERE id = $3) AS category_name, \
           (SELECT name FROM category_details WHERE id = $4) AS category_detail_name, \
           (SELECT name FROM request_channels WHERE id = $5) AS request_channel_name, \
           (SELECT name FROM users WHERE id = $6) AS person_in_charge_name, \
           (SELECT name FROM statuses WHERE id = $7) AS status_name, \
           (SELECT name FROM response_categories WHERE id = $8) AS response_category_name",
    )
    .bind::<Nullable<SqlUuid>, _>(ids.requestor_id)
    .bind::<Nullable<SqlUuid>, _>(ids.account_id)
    .bind::<Nullable<SqlUuid>, _>(ids.category_id)
    .bind::<Nullable<SqlUuid>, _>(ids.category_detail_id)
    .bind::<Nullable<SqlUuid>, _>(ids.request_channel_id)
    .bind::<Nullable<SqlUuid>, _>(ids.person_in_charge_id)
    .bind::<Nullable<SqlUuid>, _>(ids.status_id)
    .bind::<Nullable<SqlUuid>, _>(ids.response_category_id)
    .get_result(conn)?;
    Ok(resolved)
}

/// Fails with `ReferenceNotFound` when a supplied id did not resolve. Ids
/// that were not supplied are not validated; the optional response-category
/// slot is only checked when its id was given.
pub fn ensure_resolved(ids: &LookupIds, names: &ResolvedNames) -> Result<(), TicketError> {
    let slots: [(bool, bool, &'static str); 8] = [
        (
            ids.requestor_id.is_some(),
            names.requestor_name.is_some(),
            "requestorId",
        ),
        (
            ids.account_id.is_some(),
            names.account_name.is_some(),
            "accountId",
        ),
        (
            ids.category_id.is_some(),
            names.category_name.is_some(),
            "categoryId",
        ),
        (
            ids.category_detail_id.is_some(),
            names.category_detail_name.is_some(),
            "categoryDetailId",
        ),
        (
            ids.request_channel_id.is_some(),
            names.request_channel_name.is_some(),
            "requestChannelId",
        ),
        (
            ids.person_in_charge_id.is_some(),
            names.person_in_charge_name.is_some(),
            "personInChargeId",
        ),
        (
            ids.status_id.is_some(),
            names.status_name.is_some(),
            "statusId",
        ),
        (
            ids.response_category_id.is_some(),
            names.response_category_name.is_some(),
            "responseCategoryId",
        ),
    ];
    for (given, found, field) in slots {
        if given && !found {
            return Err(TicketError::ReferenceNotFound { field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_names() -> ResolvedNames {
        ResolvedNames {
            requestor_name: Some("Sato".into()),
            account_name: Some("Acme".into()),
            category_name: Some("Incident".into()),
            category_detail_name: Some("Login failure".into()),
            request_channel_name: Some("Email".into()),
            person_in_charge_name: Some("Tanaka".into()),
            status_name: Some("Received".into()),
            response_category_name: None,
        }
    }

    #[test]
    fn absent_slots_are_not_validated() {
        let ids = LookupIds::default();
        assert!(ensure_resolved(&ids, &ResolvedNames::default()).is_ok());
    }

    #[test]
    fn resolved_slots_pass() {
        let ids = LookupIds {
            requestor_id: Some(Uuid::new_v4()),
            status_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(ensure_resolved(&ids, &full_names()).is_ok());
    }

    #[test]
    fn dangling_mandatory_reference_names_the_field() {
        let ids = LookupIds {
            person_in_charge_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let mut names = full_names();
        names.person_in_charge_name = None;
        match ensure_resolved(&ids, &names) {
            Err(TicketError::ReferenceNotFound { field }) => {
                assert_eq!(field, "personInChargeId");
            }
            other => panic!("expected ReferenceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn dangling_optional_reference_is_still_an_error() {
        let ids = LookupIds {
            response_category_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let err = ensure_resolved(&ids, &full_names());
        assert!(matches!(
            err,
            Err(TicketError::ReferenceNotFound {
                field: "responseCategoryId"
            })
        ));
    }
}
