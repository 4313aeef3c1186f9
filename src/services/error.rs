use thiserror::Error;

/// Failures shared by the domain services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller proved who they are but may not do this.
    #[error("{0}")]
    Forbidden(String),

    /// The caller failed a credential re-check, e.g. a wrong current password.
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// The change would break a rule that must always hold, such as keeping
    /// one admin account.
    #[error("{0}")]
    Invariant(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_facing_variants_display_bare_message() {
        assert_eq!(
            ServiceError::invariant("Cannot delete the last admin user").to_string(),
            "Cannot delete the last admin user"
        );
        assert_eq!(
            ServiceError::Database("locked".to_string()).to_string(),
            "Database error: locked"
        );
    }
}
