/// All database primary keys are UUIDs (`gen_random_uuid()`).
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary amounts are stored as integer euro cents.
pub type Cents = i64;
