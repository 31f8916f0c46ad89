//! Error type shared by every remote API port.

use crate::domain::{DomainError, ErrorCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by adapters that talk to the loan backend.
    pub enum GatewayError {
        /// The refresh token was missing or rejected. The local session has
        /// already been cleared.
        SessionExpired => "your session has expired, please sign in again",
        /// The backend rejected the credentials on an unauthenticated call.
        Unauthorized { message: String } => "{message}",
        /// The signed-in user may not perform this action.
        Forbidden { message: String } => "{message}",
        /// The addressed resource does not exist.
        NotFound { message: String } => "{message}",
        /// Any other 4xx response.
        Rejected { status: u16, message: String } => "{message}",
        /// 5xx response.
        Server { status: u16, message: String } => "{message}",
        /// The fixed client timeout elapsed.
        Timeout { message: String } => "request timed out: {message}",
        /// Connection-level failure.
        Transport { message: String } => "network error: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } => "unexpected response from server: {message}",
    }
}

impl GatewayError {
    /// Whether this error ended the session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl From<GatewayError> for DomainError {
    fn from(value: GatewayError) -> Self {
        let code = match &value {
            GatewayError::SessionExpired | GatewayError::Unauthorized { .. } => {
                ErrorCode::Unauthorized
            }
            GatewayError::Forbidden { .. } => ErrorCode::Forbidden,
            GatewayError::NotFound { .. } => ErrorCode::NotFound,
            GatewayError::Rejected { status: 409, .. } => ErrorCode::Conflict,
            GatewayError::Rejected { .. } => ErrorCode::InvalidRequest,
            GatewayError::Timeout { .. } | GatewayError::Transport { .. } => {
                ErrorCode::ServiceUnavailable
            }
            GatewayError::Server { .. } | GatewayError::Decode { .. } => ErrorCode::InternalError,
        };
        Self::new(code, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GatewayError::session_expired(), ErrorCode::Unauthorized)]
    #[case(GatewayError::forbidden("admins only"), ErrorCode::Forbidden)]
    #[case(GatewayError::rejected(409_u16, "already submitted"), ErrorCode::Conflict)]
    #[case(GatewayError::rejected(422_u16, "bad amount"), ErrorCode::InvalidRequest)]
    #[case(GatewayError::timeout("30s"), ErrorCode::ServiceUnavailable)]
    #[case(GatewayError::server(502_u16, "bad gateway"), ErrorCode::InternalError)]
    fn maps_onto_domain_codes(#[case] error: GatewayError, #[case] expected: ErrorCode) {
        assert_eq!(DomainError::from(error).code(), expected);
    }

    #[rstest]
    fn backend_messages_pass_through_verbatim() {
        let error = GatewayError::rejected(400_u16, "Loan amount exceeds limit");
        assert_eq!(error.to_string(), "Loan amount exceeds limit");
        assert_eq!(DomainError::from(error).message(), "Loan amount exceeds limit");
    }
}
