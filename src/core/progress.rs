//! Coarse-grained progress reporting.
//!
//! A request owns one sink; whichever stage is active overwrites the current
//! status. The text is for humans polling the request and is never read by
//! control flow.

use std::sync::Mutex;

use tracing::info;

/// Receives status messages from the active stage
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Holds the most recent status message (last write wins)
#[derive(Debug, Default)]
pub struct StatusBoard {
    current: Mutex<String>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest reported message, or an empty string if none yet
    pub fn current(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProgressSink for StatusBoard {
    fn report(&self, message: &str) {
        info!(status = message, "Progress");
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.clear();
        current.push_str(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_last_write_wins() {
        let board = StatusBoard::new();
        assert_eq!(board.current(), "");

        board.report("Finding hype moments...");
        board.report("Downloading clip 1...");
        assert_eq!(board.current(), "Downloading clip 1...");
    }

    #[test]
    fn test_concurrent_writers() {
        let board = Arc::new(StatusBoard::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let board = board.clone();
                std::thread::spawn(move || board.report(&format!("Clip {} processed", i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let current = board.current();
        assert!(current.starts_with("Clip ") && current.ends_with(" processed"));
    }
}
