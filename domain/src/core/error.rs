//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No active crew could be resolved from configuration")]
    NoActiveCrew,

    #[error("Crew '{0}' has no enabled agents")]
    NoEnabledAgents(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid step transition for '{step}': {from} -> {to}")]
    InvalidStepTransition {
        step: String,
        from: &'static str,
        to: &'static str,
    },
}

impl DomainError {
    /// Whether this error means the run cannot even start.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DomainError::NoActiveCrew
                | DomainError::NoEnabledAgents(_)
                | DomainError::InvalidConfiguration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_active_crew_display() {
        assert_eq!(
            DomainError::NoActiveCrew.to_string(),
            "No active crew could be resolved from configuration"
        );
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = DomainError::InvalidStepTransition {
            step: "s1".to_string(),
            from: "done",
            to: "running",
        };
        assert_eq!(
            err.to_string(),
            "Invalid step transition for 's1': done -> running"
        );
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(DomainError::NoActiveCrew.is_configuration_error());
        assert!(DomainError::InvalidConfiguration("x".into()).is_configuration_error());
        assert!(!DomainError::UnknownAgent("a".into()).is_configuration_error());
    }
}
