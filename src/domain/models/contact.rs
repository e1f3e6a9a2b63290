use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub account_id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(account_id: Uuid, phone_number: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            phone_number,
            name,
            created_at: Utc::now(),
        }
    }
}

/// Strips a raw sender address down to digits plus a single leading `+`,
/// capped at 20 characters. Returns an empty string for unusable input.
pub fn sanitize_phone_number(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if raw.contains('+') {
        digits.insert(0, '+');
    }
    digits.truncate(20);
    digits
}
