//! Request throttling for the DEX aggregator.
//!
//! Two limits apply per HTTP client: a minimum gap between consecutive
//! requests and an optional cap on requests per sliding window. Callers that
//! hit either limit wait; nothing is ever rejected.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct ThrottleState {
    last: Option<Instant>,
    timestamps: VecDeque<Instant>,
}

/// Spacing + sliding-window limiter shared by every request of one client.
#[derive(Debug)]
pub struct RequestThrottle {
    min_spacing: Duration,
    /// Zero disables the window cap.
    max_per_window: u32,
    window: Duration,
    state: Mutex<ThrottleState>,
}

impl RequestThrottle {
    /// Create a throttle.
    ///
    /// # Arguments
    /// * `min_spacing` - Minimum gap between two requests
    /// * `max_per_window` - Maximum requests per window (0 = unlimited)
    /// * `window` - Window length
    pub fn new(min_spacing: Duration, max_per_window: u32, window: Duration) -> Self {
        Self {
            min_spacing,
            max_per_window,
            window,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    /// Throttle with spacing only.
    pub fn spacing(min_spacing: Duration) -> Self {
        Self::new(min_spacing, 0, Duration::ZERO)
    }

    /// Take a slot now, or report how long to wait for one.
    pub fn try_acquire(&self) -> Option<Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let window = self.window;
        while state
            .timestamps
            .front()
            .is_some_and(|&t| now.duration_since(t) >= window)
        {
            state.timestamps.pop_front();
        }

        let spacing_wait = state
            .last
            .map(|last| self.min_spacing.saturating_sub(now.duration_since(last)))
            .unwrap_or(Duration::ZERO);

        let window_wait = match state.timestamps.front() {
            Some(&oldest)
                if self.max_per_window > 0
                    && state.timestamps.len() >= self.max_per_window as usize =>
            {
                window.saturating_sub(now.duration_since(oldest))
            }
            _ => Duration::ZERO,
        };

        let wait = spacing_wait.max(window_wait);
        if !wait.is_zero() {
            return Some(wait);
        }

        state.last = Some(now);
        if self.max_per_window > 0 {
            state.timestamps.push_back(now);
        }
        None
    }

    /// Wait until a slot is free and take it.
    ///
    /// Concurrent callers race for the slot under the lock, so each one gets
    /// its own spacing gap.
    pub async fn acquire(&self) {
        while let Some(wait) = self.try_acquire() {
            if !self.window.is_zero() && wait > self.min_spacing {
                warn!(wait_ms = wait.as_millis() as u64, "Request window full, waiting");
            } else {
                debug!(wait_ms = wait.as_millis() as u64, "Throttling request");
            }
            tokio::time::sleep(wait).await;
        }
    }

    /// Requests recorded in the current window.
    pub fn recent_count(&self) -> usize {
        self.state.lock().timestamps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_request_is_free() {
        let throttle = RequestThrottle::spacing(Duration::from_secs(1));
        assert!(throttle.try_acquire().is_none());
    }

    #[test]
    fn test_spacing_enforced() {
        let throttle = RequestThrottle::spacing(Duration::from_secs(1));
        assert!(throttle.try_acquire().is_none());

        let wait = throttle.try_acquire().expect("second request must wait");
        assert!(wait <= Duration::from_secs(1));
        assert!(wait > Duration::from_millis(900));
    }

    #[test]
    fn test_window_cap() {
        let throttle = RequestThrottle::new(Duration::ZERO, 2, Duration::from_secs(60));
        assert!(throttle.try_acquire().is_none());
        assert!(throttle.try_acquire().is_none());
        assert_eq!(throttle.recent_count(), 2);

        let wait = throttle.try_acquire().expect("window is full");
        assert!(wait > Duration::from_secs(59));
    }

    #[tokio::test]
    async fn test_acquire_spaces_sequential_calls() {
        let throttle = RequestThrottle::spacing(Duration::from_millis(30));
        let start = Instant::now();
        for _ in 0..3 {
            throttle.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_acquire_spaces_concurrent_calls() {
        let throttle = Arc::new(RequestThrottle::spacing(Duration::from_millis(30)));
        let start = Instant::now();

        let tasks = (0..3).map(|_| {
            let throttle = Arc::clone(&throttle);
            async move { throttle.acquire().await }
        });
        futures_util::future::join_all(tasks).await;

        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
