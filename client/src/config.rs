//! Client runtime settings

use shared::framing::DEFAULT_MAX_FRAME_LEN;
use shared::DEFAULT_SERVER;
use std::path::PathBuf;
use std::time::Duration;

/// Bounded reconnect policy with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Pause before the attempt that follows failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }

    /// A policy of at least one attempt, whatever was configured.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    /// Bounds the TCP connect and the preamble read of one attempt.
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
    pub max_frame_len: usize,
    pub width: f32,
    pub height: f32,
    pub assets_dir: PathBuf,
    pub volume: f32,
    pub muted: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            connect_timeout: Duration::from_secs(3),
            retry: RetryPolicy::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            width: shared::WORLD_WIDTH,
            height: shared::WORLD_HEIGHT,
            assets_dir: PathBuf::from("assets/sounds"),
            volume: 0.8,
            muted: false,
        }
    }
}
