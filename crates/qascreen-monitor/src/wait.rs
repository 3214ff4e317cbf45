//! Periodic "still waiting" progress messages.

use std::time::Duration;

use tokio::time::Instant;

/// Logs how long we have been waiting on a task, at most once per `every`.
#[derive(Debug)]
pub struct WaitReporter {
    name: String,
    started: Instant,
    every: Duration,
    next_report: Duration,
}

impl WaitReporter {
    pub fn new(name: impl Into<String>, every: Duration) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
            every,
            next_report: every,
        }
    }

    /// Logs the elapsed time when a report is due and returns it.
    pub fn tick(&mut self) -> Option<Duration> {
        if self.every.is_zero() {
            return None;
        }

        let elapsed = self.started.elapsed();
        if elapsed < self.next_report {
            return None;
        }

        // Start of the current period, then one period on.
        let into_period = elapsed.as_nanos() % self.every.as_nanos();
        let into_period = Duration::from_nanos(u64::try_from(into_period).unwrap_or(u64::MAX));
        self.next_report = elapsed.saturating_sub(into_period).saturating_add(self.every);

        tracing::info!(
            task = %self.name,
            elapsed_secs = elapsed.as_secs(),
            "Waiting on {} for: {}",
            self.name,
            format_elapsed(elapsed)
        );
        Some(elapsed)
    }
}

/// `HH hours, MM min, SS sec`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02} hours, {:02} min, {:02} sec",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00 hours, 00 min, 00 sec");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "01 hours, 02 min, 05 sec");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_once_per_period() {
        let mut reporter = WaitReporter::new("cassandra-stress", Duration::from_secs(30));
        assert!(reporter.tick().is_none());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(reporter.tick().is_some());
        assert!(reporter.tick().is_none());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(reporter.tick().is_none());

        // Skipping several periods produces a single report.
        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(reporter.tick().is_some());
        assert!(reporter.tick().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_millisecond_period() {
        let mut reporter = WaitReporter::new("x", Duration::from_micros(500));

        tokio::time::advance(Duration::from_millis(5)).await;
        assert!(reporter.tick().is_some());
        assert!(reporter.tick().is_none());

        tokio::time::advance(Duration::from_micros(500)).await;
        assert!(reporter.tick().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_period_count_beyond_u32() {
        let mut reporter = WaitReporter::new("x", Duration::from_nanos(1));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(reporter.tick().is_some());
        assert!(reporter.tick().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_disables_reports() {
        let mut reporter = WaitReporter::new("x", Duration::ZERO);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(reporter.tick().is_none());
    }
}
