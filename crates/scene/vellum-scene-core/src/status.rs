use crate::ids::ComponentId;
use thiserror::Error;

/// Outcome of linking, validating or querying components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatusCode {
    /// A referenced parent or target id does not exist, or names a null slot.
    #[error("component {id} references missing {what} {reference}")]
    MissingObject {
        id: ComponentId,
        what: &'static str,
        reference: ComponentId,
    },

    /// A reference resolved to a component of the wrong kind.
    #[error("component {id} is invalid: {reason}")]
    InvalidObject { id: ComponentId, reason: String },

    #[error("transform of component {id} is not invertible")]
    FailedInversion { id: ComponentId },
}

impl StatusCode {
    pub fn category(&self) -> &'static str {
        match self {
            StatusCode::MissingObject { .. } => "missing_object",
            StatusCode::InvalidObject { .. } => "invalid_object",
            StatusCode::FailedInversion { .. } => "failed_inversion",
        }
    }

    pub(crate) fn invalid(id: ComponentId, reason: impl Into<String>) -> Self {
        StatusCode::InvalidObject {
            id,
            reason: reason.into(),
        }
    }
}

pub type Status = Result<(), StatusCode>;

/// Errors raised while turning serialized data into a live artboard.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("artboard json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artboard has no objects")]
    Empty,

    #[error(transparent)]
    Status(#[from] StatusCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_and_messages() {
        let e = StatusCode::MissingObject {
            id: ComponentId(4),
            what: "parent",
            reference: ComponentId(9),
        };
        assert_eq!(e.category(), "missing_object");
        assert_eq!(e.to_string(), "component #4 references missing parent #9");

        let wrapped: ImportError = StatusCode::invalid(ComponentId(1), "bad").into();
        assert!(matches!(wrapped, ImportError::Status(_)));
    }
}
