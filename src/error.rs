use thiserror::Error;

use crate::attributes::Field;

/// Failure reported by an [`AttributeStore`](crate::attributes::AttributeStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("field {0} does not exist on this host")]
    FieldNotFound(Field),
    #[error("field {0} is not writable")]
    AccessDenied(Field),
    #[error("field {0} rejected a value of the wrong type")]
    TypeMismatch(Field),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpoofError {
    #[error("profile unavailable: {reason}")]
    ProfileUnavailable { reason: String },

    #[error("profile '{name}' is malformed: {reason}")]
    ProfileMalformed { name: String, reason: String },

    #[error("failed to set {field}")]
    FieldWriteFailed {
        field: Field,
        #[source]
        source: AttributeError,
    },

    /// Key attestation refused while the device identity is substituted.
    #[error("operation not supported")]
    UnsupportedOperation,
}

impl SpoofError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::ProfileUnavailable {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProfileMalformed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Only a deliberate attestation block is fatal to the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedOperation)
    }
}
