use std::time::Duration;

use async_trait::async_trait;

/// Source of monotonic time and delays.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since some fixed origin.
    fn now(&self) -> Duration;

    async fn sleep(&self, dur: Duration);
}

#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await
    }
}
