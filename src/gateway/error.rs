use std::collections::BTreeMap;

use tracing::debug;

use crate::validation::{ErrorMap, Field};

/// Fallback shown when the gateway gives no usable message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors from the listing gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("Listing service unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx status.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        /// Field-level messages keyed by the gateway's field names.
        field_errors: BTreeMap<String, String>,
    },

    /// The response body could not be understood.
    #[error("{0}")]
    Malformed(String),

    #[error("Listing not found")]
    NotFound,

    /// A staged image could not be turned into an upload part.
    #[error("{file_name} has an unsupported media type {media_type:?}")]
    InvalidUpload { file_name: String, media_type: String },
}

impl GatewayError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// One-line message for the phase-level error slot.
    ///
    /// Rejections carry the gateway's own wording; everything else falls
    /// back to a generic line.
    pub fn user_message(&self) -> String {
        self.message_or(GENERIC_FAILURE)
    }

    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::NotFound | Self::InvalidUpload { .. } => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Field messages mapped onto the form's fields. Unknown keys are
    /// dropped; they are still part of the top-level message.
    pub fn field_errors(&self) -> ErrorMap {
        let mut errors = ErrorMap::new();
        if let Self::Rejected { field_errors, .. } = self {
            for (name, message) in field_errors {
                match Field::from_wire(name) {
                    Some(field) => errors.record(field, Err(message.clone())),
                    None if name == "images" => errors.set_images(Some(message.clone())),
                    None => debug!("Gateway reported error for unknown field {}", name),
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_is_passed_through() {
        let err = GatewayError::rejected(400, "Listing name already taken");
        assert_eq!(err.user_message(), "Listing name already taken");

        let err = GatewayError::rejected(500, "  ");
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = GatewayError::Malformed("Invalid JSON response".into());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn field_errors_map_onto_form_fields() {
        let mut field_errors = BTreeMap::new();
        field_errors.insert("discountPrice".to_string(), "Too high".to_string());
        field_errors.insert("images".to_string(), "Missing".to_string());
        field_errors.insert("somethingElse".to_string(), "Ignored".to_string());
        let err = GatewayError::Rejected {
            status: 422,
            message: "Validation failed".into(),
            field_errors,
        };

        let errors = err.field_errors();
        assert_eq!(errors.get(Field::DiscountPrice), Some("Too high"));
        assert_eq!(errors.images(), Some("Missing"));
        assert_eq!(errors.len(), 2);
    }
}
