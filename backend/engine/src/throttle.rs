//! Process-wide token budget over a rolling 60-second window.
//!
//! One instance is shared by every session; the ceiling is a deliberate
//! global cap on upstream spend, not a fairness mechanism. A caller that
//! would push the window over the ceiling is suspended (cooperatively, the
//! scheduler keeps running other tasks) until the window rolls over.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

pub const DEFAULT_TOKENS_PER_MINUTE: u64 = 1_000_000;

const WINDOW: Duration = Duration::from_secs(60);

/// Character-count heuristic for pre-call token estimation. Callers must
/// use this consistently: the throttle never sees true token counts.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4) as u64
}

struct WindowState {
    tokens_used: u64,
    window_start: Instant,
}

/// Shared rolling-window token limiter.
pub struct TokenThrottle {
    ceiling: u64,
    state: Mutex<WindowState>,
}

impl TokenThrottle {
    pub fn new(tokens_per_minute: u64) -> Self {
        Self {
            ceiling: tokens_per_minute,
            state: Mutex::new(WindowState {
                tokens_used: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Record `estimated` tokens against the current window, waiting for a
    /// rollover first if the budget is exhausted. The state lock is held
    /// across the wait: admission is strictly ordered and nothing slips
    /// past the ceiling while a caller is queued.
    pub async fn admit(&self, estimated: u64) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if now.duration_since(state.window_start) > WINDOW {
            state.tokens_used = 0;
            state.window_start = now;
        }

        state.tokens_used += estimated;
        if state.tokens_used > self.ceiling {
            let wait = WINDOW.saturating_sub(now.duration_since(state.window_start));
            warn!(
                wait_secs = wait.as_secs_f64(),
                estimated, "token budget exhausted; waiting for window rollover"
            );
            tokio::time::sleep(wait).await;
            state.tokens_used = estimated;
            state.window_start = Instant::now();
        }
    }
}

impl Default for TokenThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_TOKENS_PER_MINUTE)
    }
}
