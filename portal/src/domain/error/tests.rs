//! Tests for error construction.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn base_error() -> DomainError {
    DomainError::invalid_request("bad")
}

#[rstest]
fn invalid_request_constructor_sets_code(base_error: DomainError) {
    assert_eq!(base_error.code(), ErrorCode::InvalidRequest);
    assert_eq!(base_error.message(), "bad");
    assert!(base_error.details().is_none());
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_messages_fall_back_to_generic_text(#[case] message: &str) {
    let err = DomainError::new(ErrorCode::InternalError, message);
    assert_eq!(err.message(), FALLBACK_MESSAGE);
    assert_eq!(err.to_string(), FALLBACK_MESSAGE);
}

#[rstest]
#[case(DomainError::unauthorized("x"), ErrorCode::Unauthorized)]
#[case(DomainError::forbidden("x"), ErrorCode::Forbidden)]
#[case(DomainError::not_found("x"), ErrorCode::NotFound)]
#[case(DomainError::conflict("x"), ErrorCode::Conflict)]
#[case(DomainError::service_unavailable("x"), ErrorCode::ServiceUnavailable)]
#[case(DomainError::internal("x"), ErrorCode::InternalError)]
fn convenience_constructors_map_codes(#[case] err: DomainError, #[case] expected: ErrorCode) {
    assert_eq!(err.code(), expected);
}

#[rstest]
fn details_are_kept_alongside_the_message(base_error: DomainError) {
    let err = base_error.with_details(json!({"field": "loanAmount"}));
    assert_eq!(err.details(), Some(&json!({"field": "loanAmount"})));
    assert_eq!(err.message(), "bad");
}
