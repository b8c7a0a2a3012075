//! Transient, auto-dismissing user notices

use std::time::Duration;

use tokio::time::Instant;

/// How long a notice stays on screen
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            duration: NOTICE_DURATION,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.shown_at + self.duration
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    /// Resolves when the notice should be dismissed
    pub async fn dismissed(&self) {
        tokio::time::sleep_until(self.expires_at()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires_after_three_seconds() {
        let notice = Notice::new("No record found");
        assert_eq!(notice.duration, Duration::from_secs(3));
        assert!(!notice.is_expired(Instant::now()));

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(!notice.is_expired(Instant::now()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(notice.is_expired(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_resolves_at_expiry() {
        let notice = Notice::new("gone soon");
        notice.dismissed().await;
        assert!(notice.is_expired(Instant::now()));
    }
}
