use thiserror::Error;

use crate::form::field_errors::FieldErrors;
use crate::page::PageMode;

/// Everything that can go wrong while loading or submitting a CV page.
///
/// Fetch-path errors are terminal for the current page load. `ValidationFailed`
/// is recoverable in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PageError {
    #[error("No bearer token available")]
    AuthMissing,

    /// 401. Carries the server's `message`, if it sent one.
    #[error("Unauthorized")]
    Unauthorized(Option<String>),

    #[error("Forbidden")]
    Forbidden(Option<String>),

    /// 404, or an empty CV record (no server message).
    #[error("Not found: {}", .0.as_deref().unwrap_or("CV data not found or empty"))]
    NotFound(Option<String>),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(FieldErrors),

    #[error("Server error (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("Invalid CV ID")]
    InvalidId,

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl PageError {
    /// Maps a non-2xx status to the taxonomy. `message` is the server's own text, if any.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => PageError::Unauthorized(message),
            403 => PageError::Forbidden(message),
            404 => PageError::NotFound(message),
            _ => PageError::Server { status, message },
        }
    }

    /// The page has to hand control to the login flow.
    pub fn requires_login(&self) -> bool {
        matches!(self, PageError::AuthMissing | PageError::Unauthorized(_))
    }

    /// Text for the page-level error view.
    pub fn user_message(&self, mode: PageMode) -> String {
        match self {
            PageError::AuthMissing => "You are not logged in. Please log in.".to_string(),
            PageError::Unauthorized(_) => "Unauthorized access. Please log in again.".to_string(),
            PageError::Forbidden(_) => format!("You don't have permission to {} this CV.", mode.verb()),
            PageError::NotFound(_) => {
                "CV not found. It may have been deleted or does not exist.".to_string()
            }
            PageError::Network(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            PageError::ValidationFailed(_) => {
                "Please fix all validation errors before submitting.".to_string()
            }
            PageError::Server { status, message } => format!(
                "Failed to fetch data: {}",
                message
                    .clone()
                    .unwrap_or_else(|| format!("Request failed with status code {status}"))
            ),
            PageError::InvalidId => "Invalid CV ID".to_string(),
            PageError::Decode(msg) => format!("Error: {msg}"),
        }
    }

    /// The `message` the server put in an error body, for any non-2xx status.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            PageError::Unauthorized(message)
            | PageError::Forbidden(message)
            | PageError::NotFound(message)
            | PageError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text for the transient notice shown when a submit fails.
    pub fn submit_message(&self) -> String {
        self.server_message()
            .map(String::from)
            .unwrap_or_else(|| "Failed to update CV. Please try again.".to_string())
    }
}

impl From<reqwest::Error> for PageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PageError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            PageError::from_status(status.as_u16(), None)
        } else {
            PageError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PageError::from_status(401, None), PageError::Unauthorized(None));
        assert_eq!(
            PageError::from_status(403, Some("nope".into())),
            PageError::Forbidden(Some("nope".into()))
        );
        assert_eq!(PageError::from_status(404, None), PageError::NotFound(None));
        assert_eq!(
            PageError::from_status(500, Some("db down".into())),
            PageError::Server {
                status: 500,
                message: Some("db down".into())
            }
        );
    }

    #[test]
    fn test_user_message_depends_on_mode() {
        assert_eq!(
            PageError::Forbidden(None).user_message(PageMode::View),
            "You don't have permission to view this CV."
        );
        assert_eq!(
            PageError::Forbidden(Some("not yours".into())).user_message(PageMode::Edit),
            "You don't have permission to edit this CV."
        );
    }

    #[test]
    fn test_server_message_falls_back_to_status() {
        let err = PageError::Server {
            status: 502,
            message: None,
        };
        assert_eq!(
            err.user_message(PageMode::Edit),
            "Failed to fetch data: Request failed with status code 502"
        );
        assert_eq!(err.submit_message(), "Failed to update CV. Please try again.");
    }

    #[test]
    fn test_submit_message_prefers_server_text() {
        let err = PageError::Server {
            status: 422,
            message: Some("NIC already registered".into()),
        };
        assert_eq!(err.submit_message(), "NIC already registered");
    }

    #[test]
    fn test_submit_message_uses_server_text_for_every_status() {
        let forbidden = PageError::from_status(403, Some("You can only edit your own CV".into()));
        assert_eq!(forbidden.submit_message(), "You can only edit your own CV");

        let gone = PageError::from_status(404, Some("CV was deleted".into()));
        assert_eq!(gone.submit_message(), "CV was deleted");

        let expired = PageError::from_status(401, Some("jwt expired".into()));
        assert_eq!(expired.submit_message(), "jwt expired");

        assert_eq!(
            PageError::from_status(403, None).submit_message(),
            "Failed to update CV. Please try again."
        );
        assert_eq!(
            PageError::Network("refused".into()).submit_message(),
            "Failed to update CV. Please try again."
        );
    }

    #[test]
    fn test_empty_record_not_found_has_no_server_message() {
        let err = PageError::NotFound(None);
        assert!(err.server_message().is_none());
        assert_eq!(err.to_string(), "Not found: CV data not found or empty");
    }

    #[test]
    fn test_requires_login() {
        assert!(PageError::AuthMissing.requires_login());
        assert!(PageError::Unauthorized(None).requires_login());
        assert!(!PageError::Forbidden(None).requires_login());
    }
}
