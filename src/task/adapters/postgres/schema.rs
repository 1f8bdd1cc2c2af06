//! Diesel schema for task and participation persistence.

diesel::table! {
    /// Posted tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 200]
        title -> Varchar,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Optional location.
        #[max_length = 255]
        location -> Nullable<Varchar>,
        /// Scheduled start.
        scheduled_at -> Timestamptz,
        /// Participant limit.
        max_participants -> Int4,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// External identifier of the creator.
        #[max_length = 255]
        creator_id -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Revision counter checked by conditional updates.
        revision -> Int8,
    }
}

diesel::table! {
    /// Participation records, active and left.
    participations (id) {
        /// Participation identifier.
        id -> Uuid,
        /// Task reference.
        task_id -> Uuid,
        /// External identifier of the participant.
        #[max_length = 255]
        participant_id -> Varchar,
        /// Participation status.
        #[max_length = 20]
        status -> Varchar,
        /// Optional note left by the participant.
        note -> Nullable<Text>,
        /// Join timestamp.
        joined_at -> Timestamptz,
        /// Leave timestamp.
        left_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(participations -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(participations, tasks);
