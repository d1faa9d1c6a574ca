use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
}

impl ModelError {
    pub fn invalid_name(kind: &str, name: &str, reason: &str) -> Self {
        Self::Validation(format!("invalid {kind} name {name:?}: {reason}"))
    }
}
