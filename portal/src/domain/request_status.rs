//! Loading flag and last error shared by the data stores.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use super::DomainError;
use super::ports::GatewayError;

/// In-flight counter plus the message of the most recent failure.
///
/// The error stays until a caller clears it, so a failed attempt remains
/// visible until the user tries again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatus {
    in_flight: u32,
    last_error: Option<String>,
}

impl RequestStatus {
    /// Whether any request is running.
    pub const fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Human-readable message of the last failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn begin(&mut self) {
        self.in_flight = self.in_flight.saturating_add(1);
    }

    pub(crate) fn finish(&mut self, error: Option<String>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if error.is_some() {
            self.last_error = error;
        }
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }
}

/// State types that carry a [`RequestStatus`].
pub(crate) trait HasRequestStatus {
    fn status_mut(&mut self) -> &mut RequestStatus;
}

/// Lock helper that tolerates poisoning; store state stays usable after a
/// panicking test thread.
pub(crate) fn with_state<S, R>(state: &Mutex<S>, f: impl FnOnce(&mut S) -> R) -> R {
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Run `call` with the loading flag raised, recording any failure.
///
/// The lock is released before awaiting.
pub(crate) async fn tracked<S, T, Fut>(state: &Mutex<S>, call: Fut) -> Result<T, DomainError>
where
    S: HasRequestStatus,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    with_state(state, |s| s.status_mut().begin());
    let result = call.await;
    let error = result.as_ref().err().map(ToString::to_string);
    with_state(state, |s| s.status_mut().finish(error));
    result.map_err(DomainError::from)
}
