//! Error types for provider operations

use thiserror::Error;

/// Errors that can occur while using or mocking a provider
#[derive(Error, Debug)]
pub enum DiError {
    /// `get` was re-entered while the provider's own factory was still running
    #[error("Circular dependency detected while resolving: {type_name}")]
    CircularDependency { type_name: &'static str },

    /// `mock` was called after the provider already produced a real instance
    #[error("Provider already initialized, reset it before mocking: {type_name}")]
    AlreadyInitialized { type_name: &'static str },

    /// Fallible factory returned an error
    #[error("Failed to create service {type_name}: {reason}")]
    CreationFailed {
        type_name: &'static str,
        reason: String,
    },
}

impl DiError {
    /// Create a CircularDependency error
    #[inline]
    pub fn circular<T: 'static>() -> Self {
        Self::CircularDependency {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create an AlreadyInitialized error
    #[inline]
    pub fn already_initialized<T: 'static>() -> Self {
        Self::AlreadyInitialized {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed<T: 'static>(reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Name of the provided type the error refers to
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CircularDependency { type_name }
            | Self::AlreadyInitialized { type_name }
            | Self::CreationFailed { type_name, .. } => type_name,
        }
    }
}

impl Clone for DiError {
    fn clone(&self) -> Self {
        match self {
            Self::CircularDependency { type_name } => Self::CircularDependency { type_name },
            Self::AlreadyInitialized { type_name } => Self::AlreadyInitialized { type_name },
            Self::CreationFailed { type_name, reason } => Self::CreationFailed {
                type_name,
                reason: reason.clone(),
            },
        }
    }
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;

    #[test]
    fn test_messages_name_the_type() {
        let err = DiError::circular::<Database>();
        assert!(err.to_string().contains("Database"));
        assert!(err.to_string().starts_with("Circular dependency"));

        let err = DiError::creation_failed::<Database>("connection refused");
        assert_eq!(
            err.to_string(),
            format!(
                "Failed to create service {}: connection refused",
                std::any::type_name::<Database>()
            )
        );
    }

    #[test]
    fn test_clone_keeps_variant() {
        let err = DiError::already_initialized::<Database>();
        let cloned = err.clone();
        assert!(matches!(cloned, DiError::AlreadyInitialized { .. }));
        assert_eq!(cloned.type_name(), err.type_name());
    }
}
