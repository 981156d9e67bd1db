use crate::cycle::{CycleOutcome, FetchCycle};
use crate::ledger::SeenPosts;
use crate::notify::NotificationChannel;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopTiming {
    pub interval: Duration,
    /// Maximum deviation from `interval`, applied in both directions.
    pub jitter: Duration,
    /// Pause after a failed cycle.
    pub cooldown: Duration,
}

impl LoopTiming {
    /// `interval` shifted by a uniform offset in `-jitter..=jitter`, never below zero.
    pub fn next_interval(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let offset = rand::thread_rng().gen_range(Duration::ZERO..=self.jitter * 2);
        (self.interval + offset).saturating_sub(self.jitter)
    }
}

/// Runs fetch cycles one after another until cancelled.
pub struct Monitor<C> {
    cycle: FetchCycle<C>,
    seen: SeenPosts,
    timing: LoopTiming,
    state: MonitorState,
}

impl<C: NotificationChannel> Monitor<C> {
    pub fn new(cycle: FetchCycle<C>, seen: SeenPosts, timing: LoopTiming) -> Self {
        Monitor {
            cycle,
            seen,
            timing,
            state: MonitorState::Running,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn seen(&self) -> &SeenPosts {
        &self.seen
    }

    /// Loops until `cancel` fires. A failed cycle never stops the loop.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(
            "Monitoring {} every {:?} (jitter {:?}), {} posts already seen",
            self.cycle.settings().target_url,
            self.timing.interval,
            self.timing.jitter,
            self.seen.len()
        );

        while self.state == MonitorState::Running {
            if cancel.is_cancelled() {
                self.state = MonitorState::Terminated;
                break;
            }

            let delay = match self.cycle.run(&mut self.seen, &cancel).await {
                Ok(CycleOutcome::Completed(report)) => {
                    info!("Check finished: {}", report);
                    self.timing.next_interval()
                }
                Ok(CycleOutcome::Cancelled) => {
                    info!("Cycle interrupted by cancellation");
                    self.state = MonitorState::Terminated;
                    break;
                }
                Err(e) => {
                    error!(
                        "Cycle failed: {}; retrying in {:?}",
                        e, self.timing.cooldown
                    );
                    self.timing.cooldown
                }
            };

            info!("Waiting {:?} before next check", delay);
            tokio::select! {
                _ = cancel.cancelled() => self.state = MonitorState::Terminated,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Monitor terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_stays_within_jitter() {
        let timing = LoopTiming {
            interval: Duration::from_secs(300),
            jitter: Duration::from_secs(10),
            cooldown: Duration::from_secs(60),
        };
        for _ in 0..100 {
            let next = timing.next_interval();
            assert!(next >= Duration::from_secs(290) && next <= Duration::from_secs(310));
        }
    }

    #[test]
    fn test_interval_is_clamped_at_zero() {
        let timing = LoopTiming {
            interval: Duration::from_secs(2),
            jitter: Duration::from_secs(10),
            cooldown: Duration::from_secs(60),
        };
        for _ in 0..100 {
            assert!(timing.next_interval() <= Duration::from_secs(12));
        }

        let fixed = LoopTiming {
            jitter: Duration::ZERO,
            ..timing
        };
        assert_eq!(fixed.next_interval(), Duration::from_secs(2));
    }
}
