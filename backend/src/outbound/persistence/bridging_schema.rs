//! Diesel table definition for the bridging database.
//!
//! Must match `bridging_migrations/`. The table mirrors `glucosa_tests`
//! without `patient_id`; `id` is copied from the canonical row and doubles as
//! the idempotency key of the mirror.

diesel::table! {
    glucosa_test (id) {
        id -> Int8,
        date_time -> Timestamp,
        glucos_value -> Float8,
        unit -> Varchar,
        device_name -> Nullable<Varchar>,
        metode -> Varchar,
        is_validation -> Int2,
        is_status -> Int2,
        user_validation -> Nullable<Varchar>,
        note -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
