// Kept in step with migrations/; regenerate with `diesel print-schema`.

diesel::table! {
    audit_logs (id) {
        id -> Int8,
        center_id -> Int8,
        actor -> Text,
        action -> Text,
        target_type -> Text,
        target_id -> Nullable<Int8>,
        payload -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    center_holidays (id) {
        id -> Int8,
        center_id -> Int8,
        holiday_date -> Date,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    centers (id) {
        id -> Int8,
        name -> Text,
        timezone -> Text,
        settings -> Nullable<Text>,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    offerings (id) {
        id -> Int8,
        center_id -> Int8,
        name -> Text,
        default_room_id -> Nullable<Int8>,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    schedule_exceptions (id) {
        id -> Int8,
        center_id -> Int8,
        rule_id -> Nullable<Int8>,
        offering_id -> Int8,
        exception_date -> Date,
        kind -> Text,
        status -> Text,
        new_start_time -> Nullable<Time>,
        new_end_time -> Nullable<Time>,
        new_room_id -> Nullable<Int8>,
        new_teacher_id -> Nullable<Int8>,
        reason -> Text,
        recurrence -> Nullable<Text>,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    schedule_rules (id) {
        id -> Int8,
        center_id -> Int8,
        offering_id -> Int8,
        weekday -> Int2,
        start_time -> Time,
        end_time -> Time,
        room_id -> Int8,
        teacher_id -> Nullable<Int8>,
        effective_range -> Nullable<Text>,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
        lock_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(audit_logs -> centers (center_id));
diesel::joinable!(center_holidays -> centers (center_id));
diesel::joinable!(offerings -> centers (center_id));
diesel::joinable!(schedule_exceptions -> offerings (offering_id));
diesel::joinable!(schedule_rules -> offerings (offering_id));

diesel::allow_tables_to_appear_in_same_query!(
    audit_logs,
    center_holidays,
    centers,
    offerings,
    schedule_exceptions,
    schedule_rules,
);
