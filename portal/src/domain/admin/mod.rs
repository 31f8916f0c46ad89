//! Admin review workflow.
//!
//! [`AdminQuery`] holds the list filters, [`Debouncer`] collapses rapid
//! filter edits into one fetch, and [`AdminBoard`] drives the list,
//! selection, bulk actions, status changes and optimistic field edits.

mod board;
mod bulk;
mod debounce;
mod field_edit;
mod query;
mod status_change;

pub use board::{AdminBoard, AdminState, RefreshOutcome};
pub use bulk::{
    BulkAction, BulkOutcome, BulkStatusRequest, BulkStatusResult, PARTIAL_FAILURE_WARNING,
};
pub use debounce::{DEFAULT_DEBOUNCE, Debouncer, Sleeper, TokioSleeper};
pub use field_edit::FieldEdit;
pub use query::{AdminQuery, SortColumn, SortDirection, SortOrder};
pub use status_change::{ReasonCode, StatusChange, StatusChangeForm};
