use std::fmt;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page budget reached zero
    BudgetExhausted,
    /// No pending or in-flight URLs remained
    FrontierDrained,
    /// Every worker left its loop (faults or empty-retry limit) before either of the above
    WorkersExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BudgetExhausted => "budget exhausted",
            Self::FrontierDrained => "frontier drained",
            Self::WorkersExhausted => "workers exhausted",
        };
        write!(f, "{}", text)
    }
}

/// One-way stop latch shared by all workers
///
/// Cloning shares the latch. The first [`StopSignal::stop`] call records its
/// reason; later calls are no-ops.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
    reason: std::sync::Arc<OnceLock<StopReason>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch; the first reason wins
    pub fn stop(&self, reason: StopReason) {
        if self.reason.set(reason).is_ok() {
            tracing::info!("Stop signal set: {}", reason);
        }
        self.token.cancel();
    }

    pub fn is_set(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    /// Resolves once the latch is set
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initially_unset() {
        let signal = StopSignal::new();
        assert!(!signal.is_set());
        assert_eq!(signal.reason(), None);
    }

    #[test]
    fn test_first_reason_wins() {
        let signal = StopSignal::new();
        signal.stop(StopReason::FrontierDrained);
        signal.stop(StopReason::BudgetExhausted);

        assert!(signal.is_set());
        assert_eq!(signal.reason(), Some(StopReason::FrontierDrained));
    }

    #[test]
    fn test_clones_share_latch() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        clone.stop(StopReason::BudgetExhausted);
        assert!(signal.is_set());
        assert_eq!(signal.reason(), Some(StopReason::BudgetExhausted));
    }

    #[tokio::test]
    async fn test_stopped_resolves() {
        let signal = StopSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.stopped().await })
        };

        signal.stop(StopReason::BudgetExhausted);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("stopped() did not resolve")
            .unwrap();
    }
}
