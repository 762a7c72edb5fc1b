// Identity ids are UUIDv7 generated app-side so that both stores hand out
// the same, creation-ordered id format.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a new UUIDv7 rendered as a hyphenated string.
pub fn new_identity_id() -> String {
    uuidv7().to_string()
}
