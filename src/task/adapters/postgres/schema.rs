//! Diesel schema for case task persistence.

diesel::table! {
    /// Case tasks with their business attributes and audit columns.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Jurisdiction of the owning case.
        #[max_length = 100]
        jurisdiction -> Varchar,
        /// Case type of the owning case.
        #[max_length = 100]
        case_type -> Varchar,
        /// External case reference.
        #[max_length = 100]
        case_id -> Varchar,
        /// Task type from the workflow definition.
        #[max_length = 255]
        task_type -> Varchar,
        /// Task lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Current assignee.
        #[max_length = 255]
        assignee -> Nullable<Varchar>,
        /// Case security classification.
        #[max_length = 50]
        security_classification -> Varchar,
        /// Display title.
        title -> Text,
        /// Free-text description.
        description -> Nullable<Text>,
        /// Case name.
        case_name -> Nullable<Text>,
        /// Case management category.
        case_category -> Nullable<Text>,
        /// Work type.
        work_type -> Nullable<Text>,
        /// Expected role category.
        #[max_length = 50]
        role_category -> Nullable<Varchar>,
        /// Region.
        region -> Nullable<Text>,
        /// Location.
        location -> Nullable<Text>,
        /// Location name.
        location_name -> Nullable<Text>,
        /// Major priority.
        major_priority -> Int4,
        /// Minor priority.
        minor_priority -> Int4,
        /// Priority date.
        priority_date -> Nullable<Timestamptz>,
        /// Next hearing identifier.
        next_hearing_id -> Nullable<Text>,
        /// Next hearing date.
        next_hearing_date -> Nullable<Timestamptz>,
        /// Due date.
        due_date -> Nullable<Timestamptz>,
        /// Set while the task awaits reconfiguration.
        reconfigure_request_time -> Nullable<Timestamptz>,
        /// Last successful reconfiguration.
        last_reconfiguration_time -> Nullable<Timestamptz>,
        /// Actor behind the latest mutation.
        #[max_length = 255]
        last_updated_user -> Nullable<Varchar>,
        /// Latest audited action.
        #[max_length = 50]
        last_updated_action -> Nullable<Varchar>,
        /// Reason recorded on termination.
        termination_reason -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Role grants owned by a task, in evaluation order.
    task_roles (task_id, position) {
        /// Owning task.
        task_id -> Uuid,
        /// Position within the task's grant list.
        position -> Int4,
        /// Role name.
        #[max_length = 255]
        role_name -> Varchar,
        /// Role category restriction.
        #[max_length = 50]
        role_category -> Nullable<Varchar>,
        /// Permission flag names.
        permissions -> Array<Text>,
        /// Authorisation tags.
        authorisations -> Array<Text>,
        /// Whether holders may be auto-assigned.
        auto_assignable -> Bool,
        /// Auto-assignment priority, lower wins.
        assignment_priority -> Nullable<Int4>,
        /// Case access category.
        case_access_category -> Nullable<Text>,
    }
}

diesel::joinable!(task_roles -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_roles);
