//! File-backed persistence for client state.

mod file_draft_store;
mod file_session_store;
mod state_dir;

pub use file_draft_store::FileDraftStore;
pub use file_session_store::FileSessionStore;
pub use state_dir::StateDir;
