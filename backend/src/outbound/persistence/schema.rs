//! Diesel table definitions for the canonical PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. When a migration
//! changes a table, update the matching block here (or regenerate it with
//! `diesel print-schema`).

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Int8,
        name -> Varchar,
        /// Unique login key.
        email -> Varchar,
        /// bcrypt hash; never serialised.
        password_hash -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    roles (id) {
        id -> Int8,
        name -> Varchar,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    permissions (id) {
        id -> Int8,
        /// Unique permission name checked by the authorization gate.
        name -> Varchar,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    /// Role to permission grants. Primary key on the pair.
    role_permissions (role_id, permission_id) {
        role_id -> Int8,
        permission_id -> Int8,
    }
}

diesel::table! {
    /// Role assignment. `user_id` is unique: one active role per user.
    user_roles (user_id) {
        user_id -> Int8,
        role_id -> Int8,
    }
}

diesel::table! {
    patients (id) {
        id -> Int8,
        name -> Varchar,
        patient_code -> Nullable<Varchar>,
        barcode -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Canonical glucose test records.
    ///
    /// `patient_id` is `0` for unlinked rows and carries no foreign key.
    glucosa_tests (id) {
        id -> Int8,
        /// Wall-clock measurement time as entered on the device.
        date_time -> Timestamp,
        glucos_value -> Float8,
        unit -> Varchar,
        patient_id -> Int8,
        device_name -> Nullable<Varchar>,
        metode -> Varchar,
        /// 0 = unvalidated, 1 = validated.
        is_validation -> Int2,
        /// 1 once the row has been reported to the partner.
        is_status -> Int2,
        user_validation -> Nullable<Varchar>,
        note -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Best-effort request audit trail.
    activity_logs (id) {
        id -> Int8,
        user_id -> Nullable<Int8>,
        name -> Nullable<Varchar>,
        method -> Varchar,
        endpoint -> Text,
        request_body -> Nullable<Jsonb>,
        ip_address -> Nullable<Varchar>,
        status_code -> Int4,
        user_agent -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(role_permissions -> roles (role_id));
diesel::joinable!(role_permissions -> permissions (permission_id));
diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(user_roles -> roles (role_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    roles,
    permissions,
    role_permissions,
    user_roles,
    patients,
    glucosa_tests,
    activity_logs,
);
