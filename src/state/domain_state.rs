use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Tracks the scheduling state of one domain (origin)
///
/// The gate keeps one of these per origin behind a mutex. Every request to
/// the origin first reserves a start time through [`DomainState::reserve`],
/// so request starts are spaced by at least the crawl delay no matter how
/// many workers target the origin at once.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of request slots reserved for this domain
    pub request_count: u32,

    /// Earliest instant at which the next request may start
    pub next_allowed_at: Option<Instant>,

    /// Wall-clock time of the last completed fetch
    pub last_fetch_at: Option<DateTime<Utc>>,
}

impl DomainState {
    /// Creates a new DomainState with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next request slot for this domain
    ///
    /// Returns how long the caller must wait before sending its request. The
    /// slot after this one is pushed `spacing` past the reserved start.
    pub fn reserve(&mut self, now: Instant, spacing: Duration) -> Duration {
        let start = match self.next_allowed_at {
            Some(next) if next > now => next,
            _ => now,
        };

        self.next_allowed_at = Some(start + spacing);
        self.request_count += 1;

        start - now
    }

    /// Records the completion time of a fetch
    pub fn record_fetch(&mut self, at: DateTime<Utc>) {
        self.last_fetch_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_domain_state() {
        let state = DomainState::new();
        assert_eq!(state.request_count, 0);
        assert!(state.next_allowed_at.is_none());
        assert!(state.last_fetch_at.is_none());
    }

    #[test]
    fn test_first_reservation_is_immediate() {
        let mut state = DomainState::new();
        let now = Instant::now();

        let wait = state.reserve(now, Duration::from_millis(500));

        assert_eq!(wait, Duration::ZERO);
        assert_eq!(state.request_count, 1);
        assert_eq!(state.next_allowed_at, Some(now + Duration::from_millis(500)));
    }

    #[test]
    fn test_back_to_back_reservations_are_spaced() {
        let mut state = DomainState::new();
        let now = Instant::now();
        let spacing = Duration::from_millis(1000);

        let waits: Vec<Duration> = (0..3).map(|_| state.reserve(now, spacing)).collect();

        assert_eq!(
            waits,
            vec![
                Duration::ZERO,
                Duration::from_millis(1000),
                Duration::from_millis(2000)
            ]
        );
        assert_eq!(state.request_count, 3);
    }

    #[test]
    fn test_reservation_after_quiet_period() {
        let mut state = DomainState::new();
        let now = Instant::now();
        let spacing = Duration::from_millis(100);

        state.reserve(now, spacing);
        let later = now + Duration::from_millis(250);
        assert_eq!(state.reserve(later, spacing), Duration::ZERO);
        assert_eq!(state.next_allowed_at, Some(later + spacing));
    }

    #[test]
    fn test_record_fetch() {
        let mut state = DomainState::new();
        let at = Utc::now();
        state.record_fetch(at);
        assert_eq!(state.last_fetch_at, Some(at));
    }
}
