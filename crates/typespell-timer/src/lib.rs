//! Epoch-stamped intermission timer for Typespell.
//!
//! Between rounds a room shows the scoreboard for a fixed window and
//! then auto-advances. The advance can be preempted — a manual
//! `next_round`, or a `start_game` restart — and pending deadlines are
//! never cancelled when that happens. Instead every deadline carries
//! the room's *round epoch* at the moment it was armed, and the room
//! actor compares that stamp against the current epoch when the timer
//! fires. A mismatch means something already advanced the room; the
//! fire is stale and must be ignored. This makes double advancement
//! impossible without any cancellation bookkeeping.
//!
//! # Integration
//!
//! The timer is designed to sit inside a room actor's
//! `tokio::select!` loop. While disarmed, [`IntermissionTimer::fired`]
//! pends forever, so the branch simply never wins the select:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = inbox.recv() => { /* handle commands */ }
//!         epoch = timer.fired() => actor.handle_timer_fire(epoch),
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

/// Timer settings.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// How long the scoreboard is shown before the next round starts.
    pub intermission: Duration,
}

impl TimerConfig {
    /// The production intermission window.
    pub const DEFAULT_INTERMISSION: Duration = Duration::from_secs(15);

    /// Config with a custom intermission (tests use short ones).
    pub fn with_intermission(intermission: Duration) -> Self {
        Self { intermission }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            intermission: Self::DEFAULT_INTERMISSION,
        }
    }
}

/// One armed deadline and the epoch it was stamped with.
#[derive(Debug, Clone, Copy)]
struct Armed {
    deadline: Instant,
    epoch: u64,
}

/// A one-shot, re-armable deadline owned by a single room actor.
#[derive(Debug)]
pub struct IntermissionTimer {
    config: TimerConfig,
    armed: Option<Armed>,
}

impl IntermissionTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            armed: None,
        }
    }

    /// Arms the timer to fire one intermission from now, stamped with
    /// `epoch`. Re-arming replaces any previous deadline.
    pub fn arm(&mut self, epoch: u64) {
        let deadline = Instant::now() + self.config.intermission;
        self.armed = Some(Armed { deadline, epoch });
        debug!(epoch, intermission_ms = self.config.intermission.as_millis() as u64, "intermission timer armed");
    }

    /// Drops any pending deadline. Idempotent.
    pub fn disarm(&mut self) {
        if self.armed.take().is_some() {
            debug!("intermission timer disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The epoch the pending deadline is stamped with, if any.
    pub fn armed_epoch(&self) -> Option<u64> {
        self.armed.map(|a| a.epoch)
    }

    /// Waits for the deadline and returns its epoch stamp, disarming
    /// the timer. While disarmed this future pends forever — inside a
    /// `select!` the other branches still run, and cancelling this
    /// future (losing the select) leaves the deadline intact.
    pub async fn fired(&mut self) -> u64 {
        let Some(armed) = self.armed else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        time::sleep_until(armed.deadline).await;
        self.armed = None;
        armed.epoch
    }
}

impl Default for IntermissionTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intermission_is_fifteen_seconds() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.intermission, Duration::from_secs(15));
    }

    #[test]
    fn test_new_timer_is_disarmed() {
        let timer = IntermissionTimer::default();
        assert!(!timer.is_armed());
        assert_eq!(timer.armed_epoch(), None);
    }

    #[test]
    fn test_arm_and_disarm() {
        let mut timer = IntermissionTimer::default();
        timer.arm(3);
        assert!(timer.is_armed());
        assert_eq!(timer.armed_epoch(), Some(3));

        timer.disarm();
        assert!(!timer.is_armed());

        // Disarming twice is fine.
        timer.disarm();
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_rearm_replaces_epoch_stamp() {
        let mut timer = IntermissionTimer::default();
        timer.arm(1);
        timer.arm(2);
        assert_eq!(timer.armed_epoch(), Some(2));
    }
}
