//! Cooperative cancellation for long runs
//!
//! Drivers check the token between pairs. A pair already in flight runs to
//! completion; its result stays recorded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::warn;

/// A cooperative cancellation token.
///
/// The CLI sets the token on Ctrl-C; drivers check it between pairs.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Record one interrupt: the first cancels, any later one asks to exit.
    pub fn interrupt(&self) -> Interrupt {
        if self.cancelled.swap(true, Ordering::Relaxed) {
            Interrupt::Exit
        } else {
            Interrupt::Cancel
        }
    }

    /// Cancel this token on Ctrl-C; exit with status 130 on a second one.
    ///
    /// Must be called inside a tokio runtime.
    pub fn cancel_on_ctrl_c(&self) -> JoinHandle<()> {
        let token = self.clone();
        tokio::spawn(async move {
            while signal::ctrl_c().await.is_ok() {
                match token.interrupt() {
                    Interrupt::Cancel => {
                        warn!("interrupt received, stopping after the current pair");
                        warn!("press Ctrl-C again to quit immediately");
                    }
                    Interrupt::Exit => {
                        warn!("second interrupt, exiting");
                        std::process::exit(INTERRUPT_EXIT_CODE);
                    }
                }
            }
        })
    }
}

/// Exit status after a second Ctrl-C (128 + SIGINT)
pub const INTERRUPT_EXIT_CODE: i32 = 130;

/// What an interrupt should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Stop after the pair in flight
    Cancel,
    /// Quit now
    Exit,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_uncancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cloned_token_shares_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn first_interrupt_cancels_and_second_exits() {
        let token = CancellationToken::new();
        let watcher = token.clone();
        assert_eq!(watcher.interrupt(), Interrupt::Cancel);
        assert!(token.is_cancelled());
        assert_eq!(watcher.interrupt(), Interrupt::Exit);
        assert_eq!(watcher.interrupt(), Interrupt::Exit);
    }

    #[test]
    fn interrupt_after_programmatic_cancel_exits() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(token.interrupt(), Interrupt::Exit);
    }

    #[tokio::test]
    async fn cancel_from_another_task_is_seen() {
        let token = CancellationToken::new();
        let remote = token.clone();
        tokio::spawn(async move { remote.cancel() }).await.unwrap();
        assert!(token.is_cancelled());
    }
}
