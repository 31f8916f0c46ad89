//! Trailing-edge debounce keyed by a generation counter.
//!
//! Each change takes a ticket. After the quiet window only the holder of the
//! newest ticket proceeds; every earlier ticket is superseded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// Default quiet window for admin list re-fetches.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Async sleeping abstraction so tests can control time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the Tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Ticket-based debouncer.
pub struct Debouncer {
    sleeper: Arc<dyn Sleeper>,
    window: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    /// Debouncer with the given quiet window.
    pub fn new(sleeper: Arc<dyn Sleeper>, window: Duration) -> Self {
        Self {
            sleeper,
            window,
            generation: AtomicU64::new(0),
        }
    }

    /// Record a change and return its ticket.
    pub fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    /// Whether `ticket` is still the newest.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Wait out the window; `true` when no newer change arrived meanwhile.
    pub async fn settle(&self, ticket: u64) -> bool {
        self.sleeper.sleep(self.window).await;
        self.is_current(ticket)
    }
}
