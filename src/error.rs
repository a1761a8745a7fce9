use thiserror::Error;

#[derive(Debug, Error)]
pub enum BarkyError {
    #[error("bookmark {0} was not found")]
    NotFound(i64),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store error")]
    Store(#[from] libsql::Error),
    #[error("failed to decode bookmark row: {0}")]
    Decode(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl BarkyError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        BarkyError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BarkyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        assert_eq!(BarkyError::NotFound(7).to_string(), "bookmark 7 was not found");
        assert_eq!(
            BarkyError::invalid("unknown field: colour").to_string(),
            "invalid input: unknown field: colour"
        );
    }
}
