//! Rate Limiter — sliding-window admission control for `Reconcile`.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    history: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Evict timestamps older than the window, then admit iff under the
    /// limit, recording the new timestamp on admission. Never held across
    /// an `.await` point by callers — this is a short synchronous section.
    pub fn is_allowed(&self) -> bool {
        let now = Instant::now();
        let mut history = self.history.lock().expect("rate limiter mutex poisoned");

        while let Some(&oldest) = history.front() {
            if now.duration_since(oldest) >= self.window {
                history.pop_front();
            } else {
                break;
            }
        }

        if (history.len() as u32) < self.max_requests {
            history.push_back(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn admits_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(3, 60);
        assert!(limiter.is_allowed());
        assert!(limiter.is_allowed());
        assert!(limiter.is_allowed());
        assert!(!limiter.is_allowed());
    }

    #[test]
    fn admits_again_after_the_window_elapses() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.is_allowed());
        sleep(Duration::from_millis(5));
        assert!(limiter.is_allowed());
    }
}
