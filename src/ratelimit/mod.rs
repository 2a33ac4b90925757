use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Sliding-window rate limiter: at most `calls` admissions within any
/// trailing `window`. `acquire` blocks (async) until the call may proceed;
/// nothing is ever rejected. One instance guards one logical outbound
/// operation and is shared by every worker in that stage via `Arc`.
pub struct RateLimiter {
    calls: usize,
    window: Duration,
    history: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(calls: usize, window: Duration) -> Self {
        Self {
            calls,
            window,
            history: Mutex::new(VecDeque::with_capacity(calls)),
        }
    }

    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut history = self.history.lock().await;
                let now = Instant::now();

                while let Some(oldest) = history.front() {
                    if now.duration_since(*oldest) >= self.window {
                        history.pop_front();
                    } else {
                        break;
                    }
                }

                if history.len() < self.calls {
                    history.push_back(now);
                    return;
                }

                // Window is full; sleep until the oldest admission ages out
                // and contend again.
                self.window - now.duration_since(*history.front().unwrap())
            };

            debug!(?wait, "Rate limit reached, waiting for quota");
            sleep(wait).await;
        }
    }
}
