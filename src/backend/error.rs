use thiserror::Error;

/// Why the identity service refused a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AuthFailure {
    InvalidCredentials,
    TooManyAttempts,
    UserDisabled,
    SessionExpired,
    Other(String),
}

impl AuthFailure {
    /// Maps identity-service error codes. Codes may carry a trailing
    /// explanation (`"TOO_MANY_ATTEMPTS_TRY_LATER : Access to ..."`).
    pub fn from_code(code: &str) -> Self {
        let code = code.split_whitespace().next().unwrap_or_default();
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_EMAIL" | "MISSING_PASSWORD" => Self::InvalidCredentials,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "USER_DISABLED" => Self::UserDisabled,
            "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
                Self::SessionExpired
            }
            other => Self::Other(other.to_string()),
        }
    }

    /// Message shown on the login form.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Correo o contraseña incorrectos.",
            Self::TooManyAttempts => "Demasiados intentos. Inténtalo más tarde.",
            Self::UserDisabled => "La cuenta está deshabilitada.",
            Self::SessionExpired => "La sesión expiró. Inicia sesión de nuevo.",
            Self::Other(_) => "Error de autenticación",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum BackendError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{context} ({status}): {message}")]
    Http {
        status: u16,
        context: &'static str,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("{}", .0.message())]
    Auth(AuthFailure),

    #[error("Missing backend configuration: {0}")]
    Config(&'static str),

    #[error("Browser API error: {0}")]
    Browser(String),
}

pub(crate) type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    pub(crate) fn browser(e: wasm_bindgen::JsValue) -> Self {
        Self::Browser(format!("{e:?}"))
    }

    /// Classifies a non-success response from any of the hosted services.
    pub(crate) fn from_status(status: u16, body: &str, context: &'static str) -> Self {
        let message = error_message(body).unwrap_or_else(|| body.trim().to_string());
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound(message),
            _ => Self::Http {
                status,
                context,
                message,
            },
        }
    }

    /// True when a fresh ID token might make the call succeed.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::Auth(AuthFailure::SessionExpired)
        )
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Extracts `error.message` from a hosted-service error body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_from_code_strips_explanation() {
        assert_eq!(
            AuthFailure::from_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled"),
            AuthFailure::TooManyAttempts
        );
        assert_eq!(
            AuthFailure::from_code("INVALID_LOGIN_CREDENTIALS"),
            AuthFailure::InvalidCredentials
        );
        assert_eq!(
            AuthFailure::from_code("SOMETHING_NEW"),
            AuthFailure::Other("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn test_auth_error_displays_user_message() {
        let e = BackendError::Auth(AuthFailure::InvalidCredentials);
        assert_eq!(e.to_string(), "Correo o contraseña incorrectos.");
        let e = BackendError::Auth(AuthFailure::Other("X".to_string()));
        assert_eq!(e.to_string(), "Error de autenticación");
    }

    #[test]
    fn test_from_status_classifies() {
        let body = r#"{"error": {"code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED"}}"#;
        assert_eq!(
            BackendError::from_status(401, body, "List failed"),
            BackendError::Unauthorized
        );

        let body = r#"{"error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}}"#;
        match BackendError::from_status(403, body, "List failed") {
            BackendError::Http {
                status, message, ..
            } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            BackendError::from_status(404, "not json", "Patch failed"),
            BackendError::NotFound(m) if m == "not json"
        ));
    }

    #[test]
    fn test_needs_reauth() {
        assert!(BackendError::Unauthorized.needs_reauth());
        assert!(BackendError::Auth(AuthFailure::SessionExpired).needs_reauth());
        assert!(!BackendError::Network("offline".to_string()).needs_reauth());
    }
}
