//! Error types for the map editor core.

use thiserror::Error;

use crate::models::{ClassificationId, ZoneId};

/// Why a drawn or edited shape was rejected by the constraint engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Shape lies entirely outside the selected boundary")]
    OutsideBoundary,

    #[error("Shape is fully covered by existing zones")]
    FullyCovered,
}

impl ConstraintError {
    /// Stable machine-readable kind, used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ConstraintError::InvalidGeometry(_) => "invalid_geometry",
            ConstraintError::OutsideBoundary => "outside_boundary",
            ConstraintError::FullyCovered => "fully_covered",
        }
    }
}

/// Failures talking to the zoning backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Message suitable for showing to the operator
    pub fn operator_message(&self) -> String {
        match self {
            ApiError::Remote { message, .. } => message.clone(),
            _ => GENERIC_REMOTE_MESSAGE.to_string(),
        }
    }
}

pub const GENERIC_REMOTE_MESSAGE: &str = "The server could not complete the request";

/// Errors surfaced by the editor to the operator. None of them are fatal;
/// the editor is always left in a state from which the action can be retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error("Select a {0} first")]
    MissingSelection(&'static str),

    #[error("{0}")]
    RemoteFailure(String),

    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("A save is already in progress")]
    Busy,

    #[error("Unknown zone {0}")]
    UnknownZone(ZoneId),

    #[error("Zone {0} has no geometry")]
    NoGeometry(ZoneId),

    #[error("Zone {0} cannot be shown for editing")]
    NotDrawable(ZoneId),

    #[error("Unknown or inactive classification {0}")]
    UnknownClassification(ClassificationId),
}

impl From<ApiError> for EditorError {
    fn from(err: ApiError) -> Self {
        EditorError::RemoteFailure(err.operator_message())
    }
}

pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = ApiError::Remote {
            status: 422,
            message: "The geometry field is required.".to_string(),
        };
        let editor: EditorError = err.into();
        assert_eq!(editor.to_string(), "The geometry field is required.");
    }

    #[test]
    fn test_decode_failure_uses_generic_message() {
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let editor: EditorError = ApiError::Decode(decode).into();
        assert_eq!(
            editor,
            EditorError::RemoteFailure(GENERIC_REMOTE_MESSAGE.to_string())
        );
    }
}
