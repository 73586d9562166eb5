diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    accounts (id) {
        id -> Uuid,
        name -> Text,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    categories (id) {
        id -> Uuid,
        name -> Text,
        sort_order -> Int4,
    }
}

diesel::table! {
    category_details (id) {
        id -> Uuid,
        category_id -> Uuid,
        name -> Text,
        sort_order -> Int4,
    }
}

diesel::table! {
    statuses (id) {
        id -> Uuid,
        name -> Text,
        sort_order -> Int4,
        is_terminal -> Bool,
    }
}

diesel::table! {
    request_channels (id) {
        id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    response_categories (id) {
        id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    tickets (id) {
        id -> Text,
        requestor_id -> Uuid,
        requestor_name -> Text,
        account_id -> Uuid,
        account_name -> Text,
        category_id -> Uuid,
        category_name -> Text,
        category_detail_id -> Uuid,
        category_detail_name -> Text,
        request_channel_id -> Uuid,
        request_channel_name -> Text,
        summary -> Text,
        description -> Nullable<Text>,
        person_in_charge_id -> Uuid,
        person_in_charge_name -> Text,
        status_id -> Uuid,
        status_name -> Text,
        scheduled_completion_date -> Nullable<Date>,
        completion_date -> Nullable<Date>,
        actual_effort_hours -> Nullable<Numeric>,
        response_category_id -> Nullable<Uuid>,
        response_category_name -> Nullable<Text>,
        response_details -> Nullable<Text>,
        has_defect -> Bool,
        external_ticket_id -> Nullable<Text>,
        remarks -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    attachments (id) {
        id -> Uuid,
        ticket_id -> Text,
        file_name -> Text,
        content_type -> Text,
        file_size -> Int8,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_history (id) {
        id -> Uuid,
        ticket_id -> Text,
        author_id -> Uuid,
        author_name -> Text,
        comment -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    history_changed_fields (id) {
        id -> Uuid,
        history_id -> Uuid,
        field_name -> Text,
        old_value -> Nullable<Text>,
        new_value -> Nullable<Text>,
    }
}

diesel::joinable!(category_details -> categories (category_id));
diesel::joinable!(attachments -> tickets (ticket_id));
diesel::joinable!(ticket_history -> tickets (ticket_id));
diesel::joinable!(history_changed_fields -> ticket_history (history_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    accounts,
    categories,
    category_details,
    statuses,
    request_channels,
    response_categories,
    tickets,
    attachments,
    ticket_history,
    history_changed_fields,
);
