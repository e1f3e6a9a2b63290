use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("State conflict: {0}")]
    StateConflict(String),
    #[error("Retry limit reached: {retry_count} of {max_retries}")]
    RetryExhausted { retry_count: i32, max_retries: i32 },
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error (HTTP {status}): {body}")]
    Api {
        status: u16,
        code: Option<i64>,
        body: String,
    },
}

impl DeliveryError {
    /// True when the provider rejected the template itself (missing or
    /// unapproved), which is the only failure a fallback template can cure.
    pub fn is_template_unavailable(&self) -> bool {
        match self {
            DeliveryError::Api { status, code, body } => {
                *status == 404 || *code == Some(132001) || body.contains("132001")
            }
            _ => false,
        }
    }
}
